use std::time::Duration;

use foundation::CalendarDate;
use layers::MapHost;
use tracing::{debug, info};

use crate::cancel::CancellationToken;
use crate::frame::FrameProgress;
use crate::idle::{DEFAULT_IDLE_TIMEOUT, IdleOutcome, wait_for_idle};
use crate::pacing::FramePacing;
use crate::timer::Timer;

/// Outcome of one pass over a date sequence.
#[derive(Debug, Default, Copy, Clone, PartialEq, Eq)]
pub struct RunReport {
    /// Dates actually bound and shown.
    pub frames: usize,
    /// Dates the host could not bind; not reported as progress.
    pub skipped: usize,
    /// Frames where the idle fallback fired instead of the map's signal.
    pub idle_timeouts: usize,
    pub cancelled: bool,
}

/// Steps a map through a date sequence at a paced rate.
pub struct AnimationDriver<'a, H, T> {
    host: &'a H,
    timer: &'a T,
    pacing: FramePacing,
    idle_timeout: Duration,
}

impl<'a, H, T> AnimationDriver<'a, H, T>
where
    H: MapHost,
    T: Timer,
{
    pub fn new(host: &'a H, timer: &'a T, pacing: FramePacing) -> Self {
        Self {
            host,
            timer,
            pacing,
            idle_timeout: DEFAULT_IDLE_TIMEOUT,
        }
    }

    pub fn with_idle_timeout(mut self, timeout: Duration) -> Self {
        self.idle_timeout = timeout;
        self
    }

    /// Show each date in order until the sequence ends or `cancel` fires.
    ///
    /// Per frame: bind imagery, report progress, wait for idle (bounded by the
    /// idle timeout), then sleep the pacing delay. Cancellation is checked
    /// before each frame only. A date the host did not bind is skipped
    /// without progress, idle wait or pacing.
    pub async fn run<F>(
        &self,
        dates: &[CalendarDate],
        cancel: &CancellationToken,
        mut on_frame: F,
    ) -> RunReport
    where
        F: FnMut(&FrameProgress),
    {
        let total = dates.len();
        let delay = self.pacing.frame_delay();
        let mut report = RunReport::default();
        info!(total, fps = self.pacing.fps(), "animation started");

        for (index, date) in dates.iter().copied().enumerate() {
            if cancel.is_cancelled() {
                report.cancelled = true;
                break;
            }

            if !self.host.show_date(date) {
                report.skipped += 1;
                debug!(%date, "date not bound, frame skipped");
                continue;
            }
            report.frames += 1;
            on_frame(&FrameProgress { index, total, date });

            let outcome = wait_for_idle(self.host.idle(), self.timer, self.idle_timeout).await;
            if outcome == IdleOutcome::TimedOut {
                report.idle_timeouts += 1;
                debug!(%date, "idle fallback fired");
            }

            if !delay.is_zero() {
                self.timer.sleep(delay).await;
            }
        }

        info!(
            frames = report.frames,
            skipped = report.skipped,
            idle_timeouts = report.idle_timeouts,
            cancelled = report.cancelled,
            "animation finished"
        );
        report
    }
}

#[cfg(test)]
mod tests {
    use super::{AnimationDriver, RunReport};
    use crate::cancel::CancellationToken;
    use crate::idle::DEFAULT_IDLE_TIMEOUT;
    use crate::pacing::FramePacing;
    use crate::timer::VirtualTimer;
    use foundation::{CalendarDate, DEFAULT_EMBARGO_DAYS, DateSequence};
    use layers::{IdleBehavior, MemoryHost};
    use pretty_assertions::assert_eq;
    use std::time::Duration;

    fn dates(days: u32) -> DateSequence {
        DateSequence::ending_before(
            CalendarDate::from_ymd(2024, 6, 30).unwrap(),
            days,
            DEFAULT_EMBARGO_DAYS,
        )
    }

    #[test]
    fn visits_every_date_in_order() {
        let host = MemoryHost::default();
        let timer = VirtualTimer::new();
        let seq = dates(30);
        let driver = AnimationDriver::new(&host, &timer, FramePacing::new(30));

        let mut seen = Vec::new();
        let report = pollster::block_on(driver.run(
            seq.as_slice(),
            &CancellationToken::new(),
            |p| seen.push((p.index, p.total)),
        ));

        assert_eq!(host.shown(), seq.as_slice().to_vec());
        assert_eq!(seen.len(), 30);
        assert_eq!(seen[0], (0, 30));
        assert_eq!(seen[29], (29, 30));
        assert_eq!(
            report,
            RunReport {
                frames: 30,
                skipped: 0,
                idle_timeouts: 0,
                cancelled: false
            }
        );
        assert_eq!(timer.completed(), vec![Duration::from_millis(29); 30]);
        assert_eq!(host.surface().layer_count(), 1);
    }

    #[test]
    fn cancel_between_frames_stops_before_next_bind() {
        let host = MemoryHost::default();
        let timer = VirtualTimer::new();
        let seq = dates(10);
        let cancel = CancellationToken::new();
        let driver = AnimationDriver::new(&host, &timer, FramePacing::new(60));

        let report = pollster::block_on(driver.run(seq.as_slice(), &cancel, |p| {
            if p.ordinal() == 3 {
                cancel.cancel();
            }
        }));

        assert_eq!(report.frames, 3);
        assert!(report.cancelled);
        assert_eq!(host.shown().len(), 3);
    }

    #[test]
    fn cancelled_before_start_shows_nothing() {
        let host = MemoryHost::default();
        let timer = VirtualTimer::new();
        let cancel = CancellationToken::new();
        cancel.cancel();
        let driver = AnimationDriver::new(&host, &timer, FramePacing::new(30));

        let report = pollster::block_on(driver.run(dates(7).as_slice(), &cancel, |_| {}));
        assert_eq!(report.frames, 0);
        assert!(report.cancelled);
        assert!(host.shown().is_empty());
    }

    #[test]
    fn stalled_map_is_bounded_by_timeout() {
        let host = MemoryHost::default().with_idle(IdleBehavior::Never);
        let timer = VirtualTimer::new();
        let driver = AnimationDriver::new(&host, &timer, FramePacing::new(5))
            .with_idle_timeout(Duration::from_millis(300));

        let report =
            pollster::block_on(driver.run(dates(7).as_slice(), &CancellationToken::new(), |_| {}));

        assert_eq!(report.frames, 7);
        assert_eq!(report.idle_timeouts, 7);
        let per_frame = Duration::from_millis(300) + Duration::from_millis(196);
        assert_eq!(timer.total(), per_frame * 7);
    }

    #[test]
    fn slow_idle_still_counts_as_idle() {
        let host = MemoryHost::default().with_idle(IdleBehavior::AfterPolls(1));
        let timer = VirtualTimer::new();
        let driver = AnimationDriver::new(&host, &timer, FramePacing::new(30));

        let report =
            pollster::block_on(driver.run(dates(7).as_slice(), &CancellationToken::new(), |_| {}));
        assert_eq!(report.idle_timeouts, 0);
        assert!(!timer.completed().contains(&DEFAULT_IDLE_TIMEOUT));
    }

    #[test]
    fn unbound_dates_are_not_reported_as_frames() {
        let host = MemoryHost::default().with_idle(IdleBehavior::Never);
        let timer = VirtualTimer::new();
        let seq = dates(7);
        let driver = AnimationDriver::new(&host, &timer, FramePacing::new(10));

        let mut reported = Vec::new();
        let report = pollster::block_on(driver.run(
            seq.as_slice(),
            &CancellationToken::new(),
            |p| {
                reported.push(p.date);
                if p.ordinal() == 3 {
                    host.set_style_ready(false);
                }
            },
        ));

        assert_eq!(report.frames, 3);
        assert_eq!(report.skipped, 4);
        assert_eq!(reported, host.shown());
        assert_eq!(reported, seq.as_slice()[..3].to_vec());
    }

    #[test]
    fn empty_sequence_is_a_no_op() {
        let host = MemoryHost::default();
        let timer = VirtualTimer::new();
        let driver = AnimationDriver::new(&host, &timer, FramePacing::new(30));

        let report = pollster::block_on(driver.run(&[], &CancellationToken::new(), |_| {}));
        assert_eq!(report, RunReport::default());
        assert!(timer.completed().is_empty());
    }
}
