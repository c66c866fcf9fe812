use std::cell::{Cell, RefCell};
use std::time::Duration;

use foundation::{DEFAULT_EMBARGO_DAYS, DateSequence};
use layers::MapHost;
use runtime::{
    AnimationDriver, CancellationToken, ControlPolicy, DAY_BOUNDS, DEFAULT_IDLE_TIMEOUT,
    FPS_BOUNDS, FramePacing, RunReport, Session, SessionId, SessionKind, SessionState, Timer,
};
use tracing::{debug, info, warn};

use crate::artifact::{ArtifactSink, ArtifactSummary};
use crate::controller::CaptureController;
use crate::encoder::MediaEncoder;
use crate::error::CaptureError;

/// User-adjustable parameters plus the tuning knobs behind them.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub struct TransportSettings {
    pub days: u32,
    pub fps: u32,
    pub embargo_days: u32,
    pub idle_timeout: Duration,
}

impl Default for TransportSettings {
    fn default() -> Self {
        Self {
            days: 30,
            fps: 10,
            embargo_days: DEFAULT_EMBARGO_DAYS,
            idle_timeout: DEFAULT_IDLE_TIMEOUT,
        }
    }
}

/// What the controls need to render.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionSnapshot {
    pub state: SessionState,
    pub policy: ControlPolicy,
    pub status: String,
}

pub type StatusListener = Box<dyn Fn(&SessionSnapshot)>;

/// Preview, record and stop over one map host and one capture pipeline.
///
/// Everything runs on one thread; `stop` may be called between any two
/// suspension points of a running `preview` or `record`.
pub struct Transport<H, T, E, S>
where
    E: MediaEncoder,
{
    host: H,
    timer: T,
    capture: CaptureController<E, S>,
    session: RefCell<Session>,
    settings: Cell<TransportSettings>,
    dates: RefCell<DateSequence>,
    cancel: RefCell<CancellationToken>,
    listener: RefCell<Option<StatusListener>>,
}

impl<H, T, E, S> Transport<H, T, E, S>
where
    H: MapHost,
    T: Timer,
    E: MediaEncoder,
    S: ArtifactSink<Chunk = E::Chunk>,
{
    pub fn new(host: H, timer: T, capture: CaptureController<E, S>, settings: TransportSettings) -> Self {
        let settings = TransportSettings {
            days: DAY_BOUNDS.clamp(settings.days),
            fps: FPS_BOUNDS.clamp(settings.fps),
            ..settings
        };
        Self {
            host,
            timer,
            capture,
            session: RefCell::new(Session::new()),
            dates: RefCell::new(DateSequence::last_days(settings.days, settings.embargo_days)),
            settings: Cell::new(settings),
            cancel: RefCell::new(CancellationToken::new()),
            listener: RefCell::new(None),
        }
    }

    pub fn host(&self) -> &H {
        &self.host
    }

    pub fn capture(&self) -> &CaptureController<E, S> {
        &self.capture
    }

    pub fn settings(&self) -> TransportSettings {
        self.settings.get()
    }

    pub fn dates(&self) -> DateSequence {
        self.dates.borrow().clone()
    }

    pub fn snapshot(&self) -> SessionSnapshot {
        let session = self.session.borrow();
        SessionSnapshot {
            state: session.state(),
            policy: session.policy(),
            status: session.status().to_string(),
        }
    }

    pub fn with_session<R>(&self, f: impl FnOnce(&Session) -> R) -> R {
        f(&self.session.borrow())
    }

    pub fn set_listener(&self, listener: StatusListener) {
        *self.listener.borrow_mut() = Some(listener);
        self.notify();
    }

    pub fn clear_listener(&self) {
        self.listener.borrow_mut().take();
    }

    /// Clamp and apply a new day count, recomputing the date sequence.
    pub fn set_days(&self, days: u32) -> u32 {
        let mut settings = self.settings.get();
        settings.days = DAY_BOUNDS.clamp(days);
        self.settings.set(settings);
        self.refresh_dates();
        settings.days
    }

    /// Clamp and apply a new frame rate. Takes effect on the next session.
    pub fn set_fps(&self, fps: u32) -> u32 {
        let mut settings = self.settings.get();
        settings.fps = FPS_BOUNDS.clamp(fps);
        self.settings.set(settings);
        settings.fps
    }

    pub fn refresh_dates(&self) {
        let settings = self.settings.get();
        let seq = DateSequence::last_days(settings.days, settings.embargo_days);
        debug!(
            days = seq.len(),
            first = ?seq.first().map(|d| d.to_string()),
            last = ?seq.last().map(|d| d.to_string()),
            "date sequence recomputed"
        );
        *self.dates.borrow_mut() = seq;
    }

    /// Play the sequence on the map without recording.
    ///
    /// Returns `None` when nothing ran: no map, no dates, or a session is
    /// already active.
    pub async fn preview(&self) -> Option<RunReport> {
        let (id, dates, cancel) = self.begin(SessionKind::Preview)?;
        let report = self.drive(id, &dates, &cancel).await;
        self.session.borrow_mut().finish(id, None);
        self.notify();
        Some(report)
    }

    /// Play the sequence while encoding the map canvas, then deliver the file.
    ///
    /// `Ok(None)` means nothing ran. Encoder setup and delivery failures end
    /// the session with an error status and are returned.
    pub async fn record(&self) -> Result<Option<ArtifactSummary>, CaptureError> {
        let Some((id, dates, cancel)) = self.begin(SessionKind::Record) else {
            return Ok(None);
        };

        let recorder = match self.capture.start(self.settings.get().fps) {
            Ok(recorder) => recorder,
            Err(err) => {
                warn!(%err, "recording could not start");
                self.session.borrow_mut().fail(id, &err);
                self.notify();
                return Err(err);
            }
        };

        self.drive(id, &dates, &cancel).await;

        self.session.borrow_mut().set_status(id, "Finalizing…");
        self.notify();

        let result = self.capture.finish(recorder).await;
        match &result {
            Ok(summary) => self.session.borrow_mut().finish(
                id,
                Some(format!("Saved {} ({} bytes)", summary.filename, summary.bytes)),
            ),
            Err(err) => {
                warn!(%err, "recording could not be delivered");
                self.session.borrow_mut().fail(id, err);
            }
        }
        self.notify();
        result.map(Some)
    }

    /// Cancel whatever is running and stop an active encoder.
    ///
    /// The running loop exits after its current step. Idempotent.
    pub fn stop(&self) -> bool {
        self.cancel.borrow().cancel();
        let was_running = self.session.borrow_mut().stop();
        if self.capture.stop() {
            debug!("encoder stop requested");
        }
        if was_running {
            info!("stop requested");
        }
        self.notify();
        was_running
    }

    fn begin(&self, kind: SessionKind) -> Option<(SessionId, DateSequence, CancellationToken)> {
        if !self.host.is_ready() {
            debug!(?kind, "map not ready, ignoring");
            return None;
        }
        let dates = self.dates();
        if dates.is_empty() {
            debug!(?kind, "no dates to show, ignoring");
            return None;
        }
        let id = match self.session.borrow_mut().begin(kind) {
            Ok(id) => id,
            Err(err) => {
                debug!(?kind, %err, "session not started");
                return None;
            }
        };
        let cancel = CancellationToken::new();
        *self.cancel.borrow_mut() = cancel.clone();
        self.notify();
        Some((id, dates, cancel))
    }

    async fn drive(&self, id: SessionId, dates: &DateSequence, cancel: &CancellationToken) -> RunReport {
        let settings = self.settings.get();
        let driver = AnimationDriver::new(&self.host, &self.timer, FramePacing::new(settings.fps))
            .with_idle_timeout(settings.idle_timeout);
        driver
            .run(dates.as_slice(), cancel, |progress| {
                self.session.borrow_mut().report_frame(id, progress);
                self.notify();
            })
            .await
    }

    fn notify(&self) {
        let snapshot = self.snapshot();
        if let Some(listener) = self.listener.borrow().as_ref() {
            listener(&snapshot);
        }
    }
}
