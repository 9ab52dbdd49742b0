//! Projective grid rectification.
//!
//! A photographed grid is seen under perspective, so averaging two corners
//! does not land on the true edge midpoint. The midpoints here are built from
//! the quad's two vanishing points instead:
//! - the diagonals meet at the projected center;
//! - the left/right edges meet at one vanishing point, the top/bottom edges at
//!   the other;
//! - the line from the center to a vanishing point crosses the remaining pair
//!   of edges at their projected midpoints.
//!
//! When a pair of opposite edges is exactly parallel their vanishing point lies
//! at infinity, and the construction line runs through the center along the
//! shared edge direction.
//!
//! Degenerate geometry is never an error: [`calculate_midpoints`] returns
//! `None` when no construction is possible, and individual [`Midpoints`] slots
//! are `None` when only that slot's intersection failed.
//!
//! [`Midpoints`]: cg_core::Midpoints

mod intersection;
mod midpoints;

pub use intersection::{PARALLEL_EPS, line_intersection};
pub use midpoints::{calculate_midpoints, quad_center, subdivide};
