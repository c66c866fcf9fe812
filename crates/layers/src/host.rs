use std::cell::{Cell, RefCell};
use std::future::Future;
use std::pin::Pin;
use std::task::{Context, Poll};

use foundation::CalendarDate;
use tracing::warn;

use crate::layer::MapSurface;
use crate::raster::{RasterBinding, TileSourceDescriptor};
use crate::surface::MemorySurface;

/// The single map instance a time-lapse is rendered on.
///
/// Methods take `&self`: the host is shared between the running session and
/// the controls on one thread.
pub trait MapHost {
    /// Whether the map exists and can show imagery.
    fn is_ready(&self) -> bool;

    /// Point the map's imagery at `date`. Returns before tiles arrive.
    ///
    /// `false` when nothing was bound: no map, or its style never loaded.
    fn show_date(&self, date: CalendarDate) -> bool;

    /// Resolves when the map next reports that pending tiles have rendered.
    ///
    /// The listener is registered when this is called and released when the
    /// returned future is dropped.
    fn idle(&self) -> impl Future<Output = ()>;
}

/// How a [`MemoryHost`] answers [`MapHost::idle`].
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum IdleBehavior {
    Immediate,
    /// Stay pending for this many polls, then resolve.
    AfterPolls(u32),
    Never,
}

/// Headless map host over a [`MemorySurface`].
#[derive(Debug)]
pub struct MemoryHost {
    surface: RefCell<MemorySurface>,
    binding: RefCell<RasterBinding>,
    shown: RefCell<Vec<CalendarDate>>,
    idle_behavior: Cell<IdleBehavior>,
}

impl MemoryHost {
    pub fn new(descriptor: TileSourceDescriptor) -> Self {
        Self {
            surface: RefCell::new(MemorySurface::ready()),
            binding: RefCell::new(RasterBinding::new(descriptor)),
            shown: RefCell::new(Vec::new()),
            idle_behavior: Cell::new(IdleBehavior::Immediate),
        }
    }

    pub fn with_idle(self, behavior: IdleBehavior) -> Self {
        self.idle_behavior.set(behavior);
        self
    }

    pub fn set_idle(&self, behavior: IdleBehavior) {
        self.idle_behavior.set(behavior);
    }

    pub fn set_style_ready(&self, ready: bool) {
        self.surface.borrow_mut().set_style_ready(ready);
    }

    /// Dates successfully shown, in call order.
    pub fn shown(&self) -> Vec<CalendarDate> {
        self.shown.borrow().clone()
    }

    pub fn surface(&self) -> MemorySurface {
        self.surface.borrow().clone()
    }
}

impl Default for MemoryHost {
    fn default() -> Self {
        Self::new(TileSourceDescriptor::default())
    }
}

impl MapHost for MemoryHost {
    fn is_ready(&self) -> bool {
        self.surface.borrow().is_style_ready()
    }

    fn show_date(&self, date: CalendarDate) -> bool {
        let mut surface = self.surface.borrow_mut();
        match self.binding.borrow_mut().set_date(&mut *surface, date) {
            Ok(true) => {
                self.shown.borrow_mut().push(date);
                true
            }
            Ok(false) => false,
            Err(err) => {
                warn!(%date, %err, "imagery swap failed");
                false
            }
        }
    }

    fn idle(&self) -> impl Future<Output = ()> {
        let behavior = self.idle_behavior.get();
        if behavior == IdleBehavior::Immediate {
            self.surface.borrow_mut().settle_tiles();
        }
        MemoryIdle {
            remaining: match behavior {
                IdleBehavior::Immediate => Some(0),
                IdleBehavior::AfterPolls(n) => Some(n),
                IdleBehavior::Never => None,
            },
        }
    }
}

#[derive(Debug)]
struct MemoryIdle {
    remaining: Option<u32>,
}

impl Future for MemoryIdle {
    type Output = ();

    fn poll(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<()> {
        match self.remaining {
            None => Poll::Pending,
            Some(0) => Poll::Ready(()),
            Some(n) => {
                self.remaining = Some(n - 1);
                cx.waker().wake_by_ref();
                Poll::Pending
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::{IdleBehavior, MapHost, MemoryHost};
    use foundation::CalendarDate;

    #[test]
    fn show_date_records_and_installs() {
        let host = MemoryHost::default();
        let d = CalendarDate::from_ymd(2024, 2, 1).unwrap();
        assert!(host.show_date(d));
        assert_eq!(host.shown(), vec![d]);
        assert_eq!(host.surface().layer_count(), 1);
    }

    #[test]
    fn not_ready_host_ignores_dates() {
        let host = MemoryHost::default();
        host.set_style_ready(false);
        assert!(!host.is_ready());
        assert!(!host.show_date(CalendarDate::from_ymd(2024, 2, 1).unwrap()));
        assert!(host.shown().is_empty());
    }

    #[test]
    fn stalled_tiles_keep_the_host_ready() {
        let host = MemoryHost::default().with_idle(IdleBehavior::Never);
        assert!(host.show_date(CalendarDate::from_ymd(2024, 2, 1).unwrap()));
        drop(host.idle());
        assert!(host.surface().tiles_loading());
        assert!(host.is_ready());
        assert!(host.show_date(CalendarDate::from_ymd(2024, 2, 2).unwrap()));
        assert_eq!(host.shown().len(), 2);
    }

    #[test]
    fn idle_after_polls_eventually_resolves() {
        let host = MemoryHost::default().with_idle(IdleBehavior::AfterPolls(3));
        pollster::block_on(host.idle());
    }
}
