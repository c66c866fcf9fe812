pub mod artifact;
pub mod chunks;
pub mod controller;
pub mod encoder;
pub mod error;
pub mod mime;
pub mod transport;

#[cfg(test)]
mod testing;

pub use artifact::*;
pub use chunks::*;
pub use controller::*;
pub use encoder::*;
pub use error::*;
pub use mime::*;
pub use transport::*;
