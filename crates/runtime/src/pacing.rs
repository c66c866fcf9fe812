use std::time::Duration;

/// Fixed per-step cost subtracted from the frame interval.
pub const PACING_OVERHEAD_MS: u64 = 4;

/// Inclusive integer range a user parameter is held to.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub struct Bounds {
    pub min: u32,
    pub max: u32,
}

impl Bounds {
    pub const fn new(min: u32, max: u32) -> Self {
        Self { min, max }
    }

    pub fn clamp(&self, value: u32) -> u32 {
        value.clamp(self.min, self.max)
    }
}

pub const DAY_BOUNDS: Bounds = Bounds::new(7, 120);
pub const FPS_BOUNDS: Bounds = Bounds::new(5, 60);

/// Delay inserted after each frame to approximate a target frame rate.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub struct FramePacing {
    fps: u32,
}

impl FramePacing {
    pub fn new(fps: u32) -> Self {
        Self { fps: fps.max(1) }
    }

    pub fn fps(&self) -> u32 {
        self.fps
    }

    /// `round(1000 / fps)` in milliseconds.
    pub fn frame_interval_ms(&self) -> u64 {
        (1000.0 / f64::from(self.fps)).round() as u64
    }

    /// `max(0, round(1000 / fps) - 4)` milliseconds.
    pub fn frame_delay(&self) -> Duration {
        Duration::from_millis(self.frame_interval_ms().saturating_sub(PACING_OVERHEAD_MS))
    }
}

#[cfg(test)]
mod tests {
    use super::{DAY_BOUNDS, FPS_BOUNDS, FramePacing};
    use std::time::Duration;

    #[test]
    fn delay_matches_reference_rates() {
        assert_eq!(FramePacing::new(30).frame_delay(), Duration::from_millis(29));
        assert_eq!(FramePacing::new(60).frame_delay(), Duration::from_millis(13));
        assert_eq!(FramePacing::new(5).frame_delay(), Duration::from_millis(196));
    }

    #[test]
    fn very_high_rates_never_go_negative() {
        assert_eq!(FramePacing::new(500).frame_delay(), Duration::ZERO);
    }

    #[test]
    fn zero_fps_is_treated_as_one() {
        assert_eq!(FramePacing::new(0).fps(), 1);
    }

    #[test]
    fn bounds_clamp_user_input() {
        assert_eq!(DAY_BOUNDS.clamp(3), 7);
        assert_eq!(DAY_BOUNDS.clamp(500), 120);
        assert_eq!(FPS_BOUNDS.clamp(24), 24);
        assert_eq!(FPS_BOUNDS.clamp(61), 60);
    }
}
