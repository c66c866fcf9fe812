use std::future::Future;
use std::time::Duration;

use runtime::Timer;

/// `setTimeout`-backed delays on the page's event loop.
#[derive(Debug, Default, Copy, Clone)]
pub struct BrowserTimer;

impl Timer for BrowserTimer {
    fn sleep(&self, duration: Duration) -> impl Future<Output = ()> {
        gloo_timers::future::sleep(duration)
    }
}
