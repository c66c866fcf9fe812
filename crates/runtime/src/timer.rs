use std::cell::RefCell;
use std::future::Future;
use std::pin::Pin;
use std::rc::Rc;
use std::task::{Context, Poll};
use std::time::Duration;

/// Source of delays on the host event loop.
pub trait Timer {
    fn sleep(&self, duration: Duration) -> impl Future<Output = ()>;
}

/// Timer that does not wait on a wall clock.
///
/// Each sleep yields to the executor once, then completes and is logged.
/// Sleeps that are dropped before completing are not logged.
#[derive(Debug, Clone, Default)]
pub struct VirtualTimer {
    elapsed: Rc<RefCell<Vec<Duration>>>,
}

impl VirtualTimer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Completed sleeps, in order.
    pub fn completed(&self) -> Vec<Duration> {
        self.elapsed.borrow().clone()
    }

    pub fn total(&self) -> Duration {
        self.elapsed.borrow().iter().sum()
    }
}

impl Timer for VirtualTimer {
    fn sleep(&self, duration: Duration) -> impl Future<Output = ()> {
        VirtualSleep {
            duration,
            yielded: false,
            log: Rc::clone(&self.elapsed),
        }
    }
}

struct VirtualSleep {
    duration: Duration,
    yielded: bool,
    log: Rc<RefCell<Vec<Duration>>>,
}

impl Future for VirtualSleep {
    type Output = ();

    fn poll(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<()> {
        if !self.yielded {
            self.yielded = true;
            cx.waker().wake_by_ref();
            return Poll::Pending;
        }
        self.log.borrow_mut().push(self.duration);
        Poll::Ready(())
    }
}
