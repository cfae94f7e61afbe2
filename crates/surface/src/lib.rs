//! Render surface abstraction.
//!
//! Reconcilers talk to the map renderer only through [`RenderSurface`]; the
//! in-memory implementation backs tests and mirrors the live renderer's
//! tolerances (missing targets are no-ops, orphaned-sub-layer source removal
//! is rejected).

pub mod memory;
pub mod render;

pub use memory::*;
pub use render::*;
