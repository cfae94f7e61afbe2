//! Backend-owned data model for map layers and their display configuration.
//!
//! Everything here crosses the REST boundary as JSON; the client holds an
//! immutable-per-fetch copy and mutates it locally only when the user edits
//! style (persisting back through the API collaborator).

pub mod filter;
pub mod layer;
pub mod netcdf;
pub mod raster;
pub mod style;
pub mod video;

pub use filter::*;
pub use layer::*;
pub use netcdf::*;
pub use raster::*;
pub use style::*;
pub use video::*;
