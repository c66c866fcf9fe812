pub mod dates;
pub mod geo;
pub mod time;

// Foundation crate: small, well-tested primitives only.
pub use dates::*;
pub use geo::*;
pub use time::*;
