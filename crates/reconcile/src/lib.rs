//! Layer reconcilers.
//!
//! Each reconciler diffs desired state (selected and visible layers in the
//! store) against what it previously materialized on the render surface and
//! issues the minimal add/remove/update operations. Render-surface
//! inconsistencies are tolerated and self-heal on the next pass; network
//! failures leave the affected layer un-rendered and are logged, never
//! retried.

pub mod interaction;
pub mod names;
pub mod netcdf;
pub mod raster;
pub mod service;
pub mod vector;
pub mod video;

pub use interaction::*;
pub use netcdf::*;
pub use raster::*;
pub use service::*;
pub use vector::*;
pub use video::*;
