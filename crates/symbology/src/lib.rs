//! Compiles declarative style and filter configuration into render-surface
//! expression trees.
//!
//! Expressions are built as a typed AST and serialized to the surface's JSON
//! array form only at the boundary, so malformed trees are unrepresentable.

pub mod color;
pub mod expr;
pub mod filter;
pub mod heatmap;
pub mod scale;
pub mod size;

pub use color::*;
pub use expr::*;
pub use filter::*;
