use std::cell::Cell;
use std::rc::Rc;

/// Cooperative stop flag shared by the controls and a running session.
///
/// Loops check it at iteration boundaries; nothing is interrupted mid-step.
#[derive(Debug, Clone, Default)]
pub struct CancellationToken {
    cancelled: Rc<Cell<bool>>,
}

impl CancellationToken {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.cancelled.set(true);
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancelled.get()
    }
}

#[cfg(test)]
mod tests {
    use super::CancellationToken;

    #[test]
    fn clones_share_state() {
        let a = CancellationToken::new();
        let b = a.clone();
        assert!(!b.is_cancelled());
        a.cancel();
        assert!(b.is_cancelled());
    }

    #[test]
    fn fresh_tokens_are_independent() {
        let a = CancellationToken::new();
        a.cancel();
        assert!(!CancellationToken::new().is_cancelled());
    }
}
