pub mod host;
pub mod layer;
pub mod raster;
pub mod surface;
pub mod symbology;

pub use host::*;
pub use layer::*;
pub use raster::*;
pub use surface::*;
