//! Central application state.
//!
//! One [`AppState`] instance is constructed by the composition root and
//! passed by reference to reconcilers and UI glue; nothing in this workspace
//! reaches for a global. Mutations queue invalidations instead of recomputing
//! synchronously, so bursts of changes collapse into one recompute.

pub mod netcdf;
pub mod selection;
pub mod sidebar;
pub mod state;

pub use netcdf::*;
pub use selection::*;
pub use sidebar::*;
pub use state::*;
