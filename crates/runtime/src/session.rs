use thiserror::Error;
use tracing::{debug, info};

use crate::event_bus::{EventBus, EventKind};
use crate::frame::FrameProgress;

/// What the view is doing. Recording always drives frames too, so there is no
/// "recording but not animating" value.
#[derive(Debug, Default, Copy, Clone, PartialEq, Eq)]
pub enum SessionState {
    #[default]
    Idle,
    Animating,
    Recording,
}

impl SessionState {
    pub fn is_animating(&self) -> bool {
        *self != SessionState::Idle
    }

    pub fn is_recording(&self) -> bool {
        *self == SessionState::Recording
    }
}

#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum SessionKind {
    Preview,
    Record,
}

impl SessionKind {
    fn state(self) -> SessionState {
        match self {
            SessionKind::Preview => SessionState::Animating,
            SessionKind::Record => SessionState::Recording,
        }
    }

    fn label(self) -> &'static str {
        match self {
            SessionKind::Preview => "preview",
            SessionKind::Record => "record",
        }
    }
}

#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub struct SessionId(u64);

impl SessionId {
    pub fn get(&self) -> u64 {
        self.0
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SessionError {
    #[error("a session is already running")]
    Busy,
    #[error("the previous session is still finishing")]
    Draining,
}

/// Which controls are usable in the current state.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub struct ControlPolicy {
    pub preview: bool,
    pub record: bool,
    pub stop: bool,
    /// Day count and frame rate inputs.
    pub inputs: bool,
}

/// Process-local UI state: the session state value plus a status line.
///
/// A session that has been stopped keeps its id until its async tail calls
/// [`Session::finish`]; no new session can begin until then.
#[derive(Debug, Default)]
pub struct Session {
    state: SessionState,
    status: String,
    current: Option<SessionId>,
    next_id: u64,
    events: EventBus,
}

impl Session {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn state(&self) -> SessionState {
        self.state
    }

    pub fn status(&self) -> &str {
        &self.status
    }

    pub fn events(&self) -> &EventBus {
        &self.events
    }

    /// Stopped, but the last session's tail has not finished yet.
    pub fn is_draining(&self) -> bool {
        self.state == SessionState::Idle && self.current.is_some()
    }

    pub fn can_start(&self) -> bool {
        self.state == SessionState::Idle && self.current.is_none()
    }

    /// Whether `id` is running and has not been stopped.
    pub fn is_live(&self, id: SessionId) -> bool {
        self.current == Some(id) && self.state != SessionState::Idle
    }

    pub fn begin(&mut self, kind: SessionKind) -> Result<SessionId, SessionError> {
        if self.state != SessionState::Idle {
            return Err(SessionError::Busy);
        }
        if self.current.is_some() {
            return Err(SessionError::Draining);
        }
        let id = SessionId(self.next_id);
        self.next_id += 1;
        self.current = Some(id);
        self.state = kind.state();
        self.status.clear();
        self.events.emit(id.0, EventKind::Start, kind.label());
        info!(session = id.0, kind = kind.label(), "session started");
        Ok(id)
    }

    /// Status text for a live session. Ignored once the session was stopped.
    pub fn set_status(&mut self, id: SessionId, status: impl Into<String>) {
        if self.is_live(id) {
            self.status = status.into();
        }
    }

    pub fn report_frame(&mut self, id: SessionId, progress: &FrameProgress) {
        if !self.is_live(id) {
            return;
        }
        let verb = if self.state.is_recording() {
            "Recording"
        } else {
            "Frame"
        };
        self.status = format!(
            "{verb} {}/{} · {}",
            progress.ordinal(),
            progress.total,
            progress.date
        );
        self.events.emit(id.0, EventKind::Frame, progress.date.to_string());
    }

    /// Return to `Idle` with the status cleared. Safe to call at any time.
    ///
    /// Returns whether a session was running.
    pub fn stop(&mut self) -> bool {
        self.status.clear();
        if self.state == SessionState::Idle {
            return false;
        }
        self.state = SessionState::Idle;
        if let Some(id) = self.current {
            self.events.emit(id.0, EventKind::Stop, "");
            debug!(session = id.0, "session stop requested");
        }
        true
    }

    /// End session `id`, leaving `status` (or an empty line) behind.
    pub fn finish(&mut self, id: SessionId, status: Option<String>) {
        if self.current != Some(id) {
            return;
        }
        self.current = None;
        self.state = SessionState::Idle;
        self.status = status.unwrap_or_default();
        self.events.emit(id.0, EventKind::Finish, self.status.clone());
        info!(session = id.0, "session finished");
    }

    pub fn fail(&mut self, id: SessionId, message: impl std::fmt::Display) {
        if self.current != Some(id) {
            return;
        }
        self.events.emit(id.0, EventKind::Error, message.to_string());
        self.finish(id, Some(format!("Error: {message}")));
    }

    pub fn policy(&self) -> ControlPolicy {
        let free = self.can_start();
        ControlPolicy {
            preview: free,
            record: free,
            stop: self.state != SessionState::Idle,
            inputs: free,
        }
    }
}
