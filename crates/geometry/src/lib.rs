//! Geometry kernel for annotation hit testing and layout.
//!
//! Pure functions over document-space coordinates (PDF points). Nothing
//! here knows about zoom, pixels, or annotation kinds; callers supply
//! tolerances already converted into document units.

use serde::{Deserialize, Serialize};

/// A point in document space (PDF points).
///
/// Document space is zoom-independent: (0, 0) is the top-left of the
/// page at 100% and units are points (1/72 inch).
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Point {
    pub x: f32,
    pub y: f32,
}

impl Point {
    pub fn new(x: f32, y: f32) -> Self {
        Self { x, y }
    }

    /// Euclidean distance to another point.
    pub fn distance_to(&self, other: &Point) -> f32 {
        let dx = self.x - other.x;
        let dy = self.y - other.y;
        (dx * dx + dy * dy).sqrt()
    }

    /// A copy of this point shifted by (dx, dy).
    pub fn translated(&self, dx: f32, dy: f32) -> Point {
        Point::new(self.x + dx, self.y + dy)
    }
}

/// Axis-aligned bounding box in document space.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BoundingBox {
    pub min_x: f32,
    pub min_y: f32,
    pub max_x: f32,
    pub max_y: f32,
}

impl BoundingBox {
    /// Build from two corners in any order.
    ///
    /// Rectangle and line endpoints are stored in draw order, so either
    /// corner may be the min or max on either axis.
    pub fn from_corners(a: Point, b: Point) -> Self {
        Self {
            min_x: a.x.min(b.x),
            min_y: a.y.min(b.y),
            max_x: a.x.max(b.x),
            max_y: a.y.max(b.y),
        }
    }

    /// Build from a point sequence; `None` when the sequence is empty.
    pub fn from_points<'a, I>(points: I) -> Option<Self>
    where
        I: IntoIterator<Item = &'a Point>,
    {
        let mut iter = points.into_iter();
        let first = iter.next()?;
        let mut bounds = Self::from_corners(*first, *first);
        for point in iter {
            bounds.min_x = bounds.min_x.min(point.x);
            bounds.min_y = bounds.min_y.min(point.y);
            bounds.max_x = bounds.max_x.max(point.x);
            bounds.max_y = bounds.max_y.max(point.y);
        }
        Some(bounds)
    }

    pub fn width(&self) -> f32 {
        self.max_x - self.min_x
    }

    pub fn height(&self) -> f32 {
        self.max_y - self.min_y
    }

    /// A copy grown by `pad` on every side.
    pub fn expanded(&self, pad: f32) -> Self {
        Self {
            min_x: self.min_x - pad,
            min_y: self.min_y - pad,
            max_x: self.max_x + pad,
            max_y: self.max_y + pad,
        }
    }

    pub fn contains(&self, point: Point) -> bool {
        point.x >= self.min_x
            && point.x <= self.max_x
            && point.y >= self.min_y
            && point.y <= self.max_y
    }

    pub fn contains_with_tolerance(&self, point: Point, tolerance: f32) -> bool {
        self.expanded(tolerance).contains(point)
    }
}

/// Distance from `point` to the segment `a`..`b`.
///
/// The projection parameter is clamped to [0, 1] before measuring, so
/// the result is the distance to the segment itself, not to the
/// infinite line through it. Degenerate segments fall back to point
/// distance.
pub fn distance_to_segment(point: Point, a: Point, b: Point) -> f32 {
    let dx = b.x - a.x;
    let dy = b.y - a.y;
    let length_sq = dx * dx + dy * dy;

    if length_sq < 1e-6 {
        return point.distance_to(&a);
    }

    let t = ((point.x - a.x) * dx + (point.y - a.y) * dy) / length_sq;
    let t = t.clamp(0.0, 1.0);

    let closest = Point::new(a.x + t * dx, a.y + t * dy);
    point.distance_to(&closest)
}

/// Whether `point` lies within `tolerance` of the segment `a`..`b`.
pub fn near_segment(point: Point, a: Point, b: Point, tolerance: f32) -> bool {
    distance_to_segment(point, a, b) <= tolerance
}
