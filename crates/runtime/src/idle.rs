use std::future::Future;
use std::pin::pin;
use std::time::Duration;

use futures::future::{Either, select};

use crate::timer::Timer;

/// Fallback used when the map never reports idle for a frame.
pub const DEFAULT_IDLE_TIMEOUT: Duration = Duration::from_millis(1500);

#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum IdleOutcome {
    Idle,
    TimedOut,
}

/// Race the map's idle signal against `timeout`.
///
/// Whichever loses is dropped before this returns, which releases its
/// listener or timer.
pub async fn wait_for_idle<I, T>(idle: I, timer: &T, timeout: Duration) -> IdleOutcome
where
    I: Future<Output = ()>,
    T: Timer,
{
    let idle = pin!(idle);
    let deadline = pin!(timer.sleep(timeout));
    match select(idle, deadline).await {
        Either::Left(_) => IdleOutcome::Idle,
        Either::Right(_) => IdleOutcome::TimedOut,
    }
}
