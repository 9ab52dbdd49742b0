//! Umbrella crate for the `cellgrid` workspace.
//!
//! Re-exports the raster and geometry primitives, projective rectification,
//! per-cell color sampling and the fountain-coded packet framing.

pub use cg_core::*;
pub use cg_fountain::*;
pub use cg_rectify::*;
pub use cg_sample::*;
