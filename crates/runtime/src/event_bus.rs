use std::collections::VecDeque;
use std::fmt;

/// Events kept by [`EventBus::new`]; older ones are dropped first.
pub const DEFAULT_EVENT_LIMIT: usize = 512;

/// Session lifecycle steps worth recording.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub enum EventKind {
    Start,
    Frame,
    Stop,
    Finish,
    Error,
}

impl fmt::Display for EventKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            EventKind::Start => "start",
            EventKind::Frame => "frame",
            EventKind::Stop => "stop",
            EventKind::Finish => "finish",
            EventKind::Error => "error",
        })
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Event {
    pub session: u64,
    pub kind: EventKind,
    /// Kind-specific detail: the session kind, a date, a final status line.
    pub detail: String,
}

/// Bounded in-memory log of session events, newest last.
#[derive(Debug)]
pub struct EventBus {
    events: VecDeque<Event>,
    limit: usize,
}

impl Default for EventBus {
    fn default() -> Self {
        Self::with_limit(DEFAULT_EVENT_LIMIT)
    }
}

impl EventBus {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_limit(limit: usize) -> Self {
        let limit = limit.max(1);
        Self {
            events: VecDeque::with_capacity(limit.min(DEFAULT_EVENT_LIMIT)),
            limit,
        }
    }

    pub fn emit(&mut self, session: u64, kind: EventKind, detail: impl Into<String>) {
        if self.events.len() == self.limit {
            self.events.pop_front();
        }
        self.events.push_back(Event {
            session,
            kind,
            detail: detail.into(),
        });
    }

    pub fn len(&self) -> usize {
        self.events.len()
    }

    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }

    pub fn events(&self) -> impl Iterator<Item = &Event> {
        self.events.iter()
    }

    pub fn kinds(&self) -> Vec<EventKind> {
        self.events.iter().map(|e| e.kind).collect()
    }

    pub fn for_session(&self, session: u64) -> impl Iterator<Item = &Event> {
        self.events.iter().filter(move |e| e.session == session)
    }

    pub fn drain(&mut self) -> Vec<Event> {
        self.events.drain(..).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::{EventBus, EventKind};
    use pretty_assertions::assert_eq;

    #[test]
    fn groups_by_session() {
        let mut bus = EventBus::new();
        bus.emit(1, EventKind::Start, "preview");
        bus.emit(2, EventKind::Start, "record");
        bus.emit(1, EventKind::Finish, "");
        let first: Vec<_> = bus.for_session(1).map(|e| e.kind).collect();
        assert_eq!(first, vec![EventKind::Start, EventKind::Finish]);
        assert_eq!(bus.for_session(2).next().map(|e| e.detail.as_str()), Some("record"));
    }

    #[test]
    fn kinds_display_lowercase() {
        assert_eq!(EventKind::Error.to_string(), "error");
    }

    #[test]
    fn drain_empties_the_log() {
        let mut bus = EventBus::new();
        bus.emit(0, EventKind::Stop, "");
        assert_eq!(bus.drain().len(), 1);
        assert!(bus.is_empty());
    }

    #[test]
    fn oldest_events_fall_off_past_the_limit() {
        let mut bus = EventBus::with_limit(3);
        for session in 0..5 {
            bus.emit(session, EventKind::Frame, "");
        }
        assert_eq!(bus.len(), 3);
        let sessions: Vec<u64> = bus.events().map(|e| e.session).collect();
        assert_eq!(sessions, vec![2, 3, 4]);
    }
}
