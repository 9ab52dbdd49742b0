use core::ops::{Add, Sub};

#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Point2d {
    pub x: f64,
    pub y: f64,
}

impl Point2d {
    pub const fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }

    /// Truncates both coordinates toward zero.
    pub fn to_int(self) -> Point2i {
        Point2i {
            x: self.x as i32,
            y: self.y as i32,
        }
    }

    pub fn round(self) -> Point2i {
        Point2i {
            x: self.x.round() as i32,
            y: self.y.round() as i32,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct Point2i {
    pub x: i32,
    pub y: i32,
}

impl Point2i {
    /// Marks a coordinate that could not be determined.
    pub const NONE: Self = Self {
        x: i32::MIN,
        y: i32::MIN,
    };

    pub const fn new(x: i32, y: i32) -> Self {
        Self { x, y }
    }

    pub fn is_none(self) -> bool {
        self == Self::NONE
    }

    pub fn to_float(self) -> Point2d {
        Point2d {
            x: f64::from(self.x),
            y: f64::from(self.y),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Vec2d {
    pub x: f64,
    pub y: f64,
}

impl Vec2d {
    pub fn norm(self) -> f64 {
        self.x.hypot(self.y)
    }

    pub fn cross(self, rhs: Self) -> f64 {
        self.x * rhs.y - self.y * rhs.x
    }

    pub fn is_zero(self) -> bool {
        self.x == 0.0 && self.y == 0.0
    }
}

impl Add<Vec2d> for Point2d {
    type Output = Point2d;

    fn add(self, rhs: Vec2d) -> Self::Output {
        Point2d {
            x: self.x + rhs.x,
            y: self.y + rhs.y,
        }
    }
}

impl Sub<Point2d> for Point2d {
    type Output = Vec2d;

    fn sub(self, rhs: Point2d) -> Self::Output {
        Vec2d {
            x: self.x - rhs.x,
            y: self.y - rhs.y,
        }
    }
}

/// Infinite line through two points.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Line2d {
    pub a: Point2d,
    pub b: Point2d,
}

impl Line2d {
    pub const fn new(a: Point2d, b: Point2d) -> Self {
        Self { a, b }
    }

    pub fn direction(self) -> Vec2d {
        self.b - self.a
    }
}

/// Four detected corners of a possibly skewed quadrilateral.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Corners {
    pub top_left: Point2d,
    pub top_right: Point2d,
    pub bottom_left: Point2d,
    pub bottom_right: Point2d,
}

impl Corners {
    pub const fn new(
        top_left: Point2d,
        top_right: Point2d,
        bottom_left: Point2d,
        bottom_right: Point2d,
    ) -> Self {
        Self {
            top_left,
            top_right,
            bottom_left,
            bottom_right,
        }
    }

    pub fn top(&self) -> Line2d {
        Line2d::new(self.top_left, self.top_right)
    }

    pub fn bottom(&self) -> Line2d {
        Line2d::new(self.bottom_left, self.bottom_right)
    }

    pub fn left(&self) -> Line2d {
        Line2d::new(self.top_left, self.bottom_left)
    }

    pub fn right(&self) -> Line2d {
        Line2d::new(self.top_right, self.bottom_right)
    }

    /// Axis-aligned integer bounds `(x, y, width, height)` enclosing all corners.
    ///
    /// Coordinates saturate to the `i32` range. Returns `None` if any corner is
    /// not finite.
    pub fn bounding_box(&self) -> Option<(i32, i32, u32, u32)> {
        let pts = [
            self.top_left,
            self.top_right,
            self.bottom_left,
            self.bottom_right,
        ];
        if !pts.iter().all(|p| p.x.is_finite() && p.y.is_finite()) {
            return None;
        }
        let min_x = pts.iter().map(|p| p.x).fold(f64::INFINITY, f64::min);
        let min_y = pts.iter().map(|p| p.y).fold(f64::INFINITY, f64::min);
        let max_x = pts.iter().map(|p| p.x).fold(f64::NEG_INFINITY, f64::max);
        let max_y = pts.iter().map(|p| p.y).fold(f64::NEG_INFINITY, f64::max);

        // float to int casts saturate
        let x0 = min_x.floor() as i32;
        let y0 = min_y.floor() as i32;
        let x1 = max_x.ceil() as i32;
        let y1 = max_y.ceil() as i32;
        let extent = |lo: i32, hi: i32| (i64::from(hi) - i64::from(lo)) as u32;
        Some((x0, y0, extent(x0, x1), extent(y0, y1)))
    }
}

/// Edge midpoints of a quad, in projective (not affine) terms.
///
/// A slot is `None` when its construction line ran parallel to the edge.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Midpoints {
    pub top: Option<Point2d>,
    pub bottom: Option<Point2d>,
    pub left: Option<Point2d>,
    pub right: Option<Point2d>,
}

impl Midpoints {
    /// Slots in wire order: top, bottom, left, right.
    pub fn as_array(&self) -> [Option<Point2d>; 4] {
        [self.top, self.bottom, self.left, self.right]
    }

    pub fn to_int(&self) -> [Point2i; 4] {
        self.as_array()
            .map(|slot| slot.map_or(Point2i::NONE, Point2d::to_int))
    }

    pub fn is_complete(&self) -> bool {
        self.as_array().iter().all(Option::is_some)
    }
}
