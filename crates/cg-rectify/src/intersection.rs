use cg_core::{Line2d, Point2d};

/// Determinant magnitude below which two lines count as parallel.
///
/// Existing detectors depend on this exact value.
pub const PARALLEL_EPS: f64 = 1e-8;

/// Intersects two infinite lines given by two points each.
pub fn line_intersection(line_a: Line2d, line_b: Line2d) -> Option<Point2d> {
    let (ax, ay, adet) = coefficients(line_a);
    let (bx, by, bdet) = coefficients(line_b);

    let d = ay * bx - ax * by;
    if d.abs() < PARALLEL_EPS {
        return None;
    }

    let dx = adet * bx - ax * bdet;
    let dy = ay * bdet - adet * by;
    Some(Point2d::new(dx / d, dy / d))
}

#[inline]
fn coefficients(line: Line2d) -> (f64, f64, f64) {
    let (p, q) = (line.a, line.b);
    let xdiff = q.x - p.x;
    let ydiff = p.y - q.y;
    let det = q.x * p.y - p.x * q.y;
    (xdiff, ydiff, det)
}
