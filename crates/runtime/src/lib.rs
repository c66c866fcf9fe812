pub mod cancel;
pub mod driver;
pub mod event_bus;
pub mod frame;
pub mod idle;
pub mod pacing;
pub mod session;
pub mod timer;

pub use cancel::*;
pub use driver::*;
pub use event_bus::*;
pub use frame::*;
pub use idle::*;
pub use pacing::*;
pub use session::*;
pub use timer::*;
