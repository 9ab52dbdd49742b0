use cg_core::{Corners, Line2d, Midpoints, Point2d};
use tracing::trace;

use crate::intersection::{PARALLEL_EPS, line_intersection};

/// Shortest edge that still has a usable direction.
const MIN_EDGE_LEN: f64 = 1e-6;

/// Projected center of the quad: where its diagonals cross.
pub fn quad_center(corners: &Corners) -> Option<Point2d> {
    let cross1 = Line2d::new(corners.top_left, corners.bottom_right);
    let cross2 = Line2d::new(corners.top_right, corners.bottom_left);
    line_intersection(cross1, cross2)
}

/// Computes the projective edge midpoints of a quad.
///
/// Returns `None` when the center or either vanishing direction cannot be
/// constructed. Once those exist, all four slots are reported; a slot is
/// `None` only if its own edge runs parallel to the construction line.
pub fn calculate_midpoints(corners: &Corners) -> Option<Midpoints> {
    let Some(center) = quad_center(corners) else {
        trace!(?corners, "diagonals do not cross");
        return None;
    };

    let (top, bottom) = (corners.top(), corners.bottom());
    let (left, right) = (corners.left(), corners.right());

    let Some(vertical) = construction_line(center, right, left) else {
        trace!(?corners, "no left/right vanishing direction");
        return None;
    };
    let Some(horizontal) = construction_line(center, top, bottom) else {
        trace!(?corners, "no top/bottom vanishing direction");
        return None;
    };

    Some(Midpoints {
        top: line_intersection(top, vertical),
        bottom: line_intersection(bottom, vertical),
        left: line_intersection(left, horizontal),
        right: line_intersection(right, horizontal),
    })
}

/// Line from `center` toward the point where `edge_a` and `edge_b` converge.
///
/// Edges that are parallel to within `PARALLEL_EPS` (relative to their
/// lengths) converge at infinity, so the line follows their direction instead.
/// Any other failed intersection, including a collapsed edge, yields `None`.
fn construction_line(center: Point2d, edge_a: Line2d, edge_b: Line2d) -> Option<Line2d> {
    if let Some(vanishing) = line_intersection(edge_a, edge_b) {
        return Some(Line2d::new(center, vanishing));
    }

    let (dir_a, dir_b) = (edge_a.direction(), edge_b.direction());
    let (len_a, len_b) = (dir_a.norm(), dir_b.norm());
    if len_a < MIN_EDGE_LEN || len_b < MIN_EDGE_LEN {
        return None;
    }
    if dir_a.cross(dir_b).abs() > PARALLEL_EPS * len_a * len_b {
        return None;
    }
    Some(Line2d::new(center, center + dir_a))
}

/// Splits a quad into its four projective quadrants.
///
/// Children are ordered top-left, top-right, bottom-left, bottom-right; each
/// shares the parent's center as one corner. Returns `None` unless every
/// midpoint could be constructed.
pub fn subdivide(corners: &Corners) -> Option<[Corners; 4]> {
    let center = quad_center(corners)?;
    let mids = calculate_midpoints(corners)?;
    let (top, bottom, left, right) = (mids.top?, mids.bottom?, mids.left?, mids.right?);

    Some([
        Corners::new(corners.top_left, top, left, center),
        Corners::new(top, corners.top_right, center, right),
        Corners::new(left, center, corners.bottom_left, bottom),
        Corners::new(center, right, bottom, corners.bottom_right),
    ])
}
