//! Geometry primitives
//!
//! Points, axis-aligned rectangles and directed segments, together with the
//! intersection and clipping tests the placement checks are built from.
//! Coordinates use the drawing surface convention: `y` grows downward, so the
//! rectangle origin is its top-left corner.

pub mod placement;

use serde::{Deserialize, Serialize};

/// A point on the drawing surface
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Point {
    pub x: f64,
    pub y: f64,
}

impl Point {
    pub const fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }

    /// Euclidean distance to another point
    pub fn distance(&self, other: &Point) -> f64 {
        (self.x - other.x).hypot(self.y - other.y)
    }
}

/// Axis-aligned rectangle described by its top-left corner and extent
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Rect {
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
}

impl Rect {
    pub const fn new(x: f64, y: f64, width: f64, height: f64) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }

    /// Build the rectangle spanned by two opposite corners, in any order
    pub fn from_corners(a: Point, b: Point) -> Self {
        Self {
            x: a.x.min(b.x),
            y: a.y.min(b.y),
            width: (a.x - b.x).abs(),
            height: (a.y - b.y).abs(),
        }
    }

    pub fn min_x(&self) -> f64 {
        self.x
    }

    pub fn min_y(&self) -> f64 {
        self.y
    }

    pub fn max_x(&self) -> f64 {
        self.x + self.width
    }

    pub fn max_y(&self) -> f64 {
        self.y + self.height
    }

    /// A rectangle with no area (or non-finite coordinates) can never be placed
    pub fn is_degenerate(&self) -> bool {
        !(self.width > 0.0 && self.height > 0.0)
            || !self.x.is_finite()
            || !self.y.is_finite()
            || !self.width.is_finite()
            || !self.height.is_finite()
    }

    /// Corners in top-left, top-right, bottom-left, bottom-right order
    pub fn corners(&self) -> [Point; 4] {
        [
            Point::new(self.min_x(), self.min_y()),
            Point::new(self.max_x(), self.min_y()),
            Point::new(self.min_x(), self.max_y()),
            Point::new(self.max_x(), self.max_y()),
        ]
    }

    /// True when the point lies in the open interior (not on the border)
    pub fn contains_strict(&self, p: &Point) -> bool {
        p.x > self.min_x() && p.x < self.max_x() && p.y > self.min_y() && p.y < self.max_y()
    }

    /// True when the point lies inside or on the border
    pub fn contains_closed(&self, p: &Point) -> bool {
        p.x >= self.min_x() && p.x <= self.max_x() && p.y >= self.min_y() && p.y <= self.max_y()
    }

    /// Interiors overlap with positive area. Rectangles that only share an
    /// edge or a corner do not overlap.
    pub fn overlaps(&self, other: &Rect) -> bool {
        if self.is_degenerate() || other.is_degenerate() {
            return false;
        }
        self.min_x() < other.max_x()
            && other.min_x() < self.max_x()
            && self.min_y() < other.max_y()
            && other.min_y() < self.max_y()
    }

    /// Clip a segment to the closed rectangle (Liang–Barsky).
    ///
    /// Returns the part of the segment inside the rectangle, keeping its
    /// direction, or `None` when the segment misses the rectangle entirely.
    pub fn clip_segment(&self, segment: &Segment) -> Option<Segment> {
        let dx = segment.dx();
        let dy = segment.dy();
        let tail = segment.tail;

        let mut t0 = 0.0_f64;
        let mut t1 = 1.0_f64;

        let bounds = [
            (-dx, tail.x - self.min_x()),
            (dx, self.max_x() - tail.x),
            (-dy, tail.y - self.min_y()),
            (dy, self.max_y() - tail.y),
        ];

        for (p, q) in bounds {
            if p == 0.0 {
                // Parallel to this edge: outside if beyond it
                if q < 0.0 {
                    return None;
                }
                continue;
            }
            let r = q / p;
            if p < 0.0 {
                if r > t1 {
                    return None;
                }
                t0 = t0.max(r);
            } else {
                if r < t0 {
                    return None;
                }
                t1 = t1.min(r);
            }
        }

        Some(Segment::new(segment.point_at(t0), segment.point_at(t1)))
    }

    /// True when some part of the segment passes through the open interior.
    ///
    /// A segment running flush along one edge, or touching the border at a
    /// single point, does not cross the interior.
    pub fn crosses_interior(&self, segment: &Segment) -> bool {
        match self.clip_segment(segment) {
            // The clipped chord is convex with the rectangle: its midpoint is on
            // the border only when the whole chord lies on one edge.
            Some(chord) => self.contains_strict(&chord.midpoint()),
            None => false,
        }
    }
}

/// Directed line segment from `tail` to `head`
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Segment {
    pub tail: Point,
    pub head: Point,
}

impl Segment {
    pub const fn new(tail: Point, head: Point) -> Self {
        Self { tail, head }
    }

    pub fn from_coords(x1: f64, y1: f64, x2: f64, y2: f64) -> Self {
        Self::new(Point::new(x1, y1), Point::new(x2, y2))
    }

    pub fn dx(&self) -> f64 {
        self.head.x - self.tail.x
    }

    pub fn dy(&self) -> f64 {
        self.head.y - self.tail.y
    }

    pub fn length(&self) -> f64 {
        self.tail.distance(&self.head)
    }

    pub fn is_degenerate(&self) -> bool {
        !(self.length() > 0.0)
    }

    /// Point at parameter `t` along the segment (`0.0` is the tail, `1.0` the head)
    pub fn point_at(&self, t: f64) -> Point {
        Point::new(self.tail.x + self.dx() * t, self.tail.y + self.dy() * t)
    }

    pub fn midpoint(&self) -> Point {
        self.point_at(0.5)
    }

    /// Closed-segment intersection test. Touching endpoints and collinear
    /// overlap both count as intersecting.
    pub fn intersects(&self, other: &Segment) -> bool {
        let (a, b) = (self.tail, self.head);
        let (c, d) = (other.tail, other.head);

        let d1 = cross(c, d, a);
        let d2 = cross(c, d, b);
        let d3 = cross(a, b, c);
        let d4 = cross(a, b, d);

        if ((d1 > 0.0 && d2 < 0.0) || (d1 < 0.0 && d2 > 0.0))
            && ((d3 > 0.0 && d4 < 0.0) || (d3 < 0.0 && d4 > 0.0))
        {
            return true;
        }

        (d1 == 0.0 && within_bounds(c, d, a))
            || (d2 == 0.0 && within_bounds(c, d, b))
            || (d3 == 0.0 && within_bounds(a, b, c))
            || (d4 == 0.0 && within_bounds(a, b, d))
    }
}

/// Z component of (b - a) x (p - a)
fn cross(a: Point, b: Point, p: Point) -> f64 {
    (b.x - a.x) * (p.y - a.y) - (b.y - a.y) * (p.x - a.x)
}

/// For `p` collinear with `a`-`b`: whether it falls within their bounding box
fn within_bounds(a: Point, b: Point, p: Point) -> bool {
    p.x >= a.x.min(b.x) && p.x <= a.x.max(b.x) && p.y >= a.y.min(b.y) && p.y <= a.y.max(b.y)
}
