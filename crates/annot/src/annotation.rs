//! Annotation variants, bounding boxes, and hit testing.

use inkmark_geometry::{near_segment, BoundingBox, Point};
use serde::{Deserialize, Serialize};

/// RGB stroke/fill color.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Color {
    pub r: u8,
    pub g: u8,
    pub b: u8,
}

impl Color {
    pub const BLACK: Color = Color { r: 0, g: 0, b: 0 };
    pub const WHITE: Color = Color { r: 255, g: 255, b: 255 };
    pub const RED: Color = Color { r: 220, g: 38, b: 38 };
    /// Default pen color, matching the original tool's blue.
    pub const BLUE: Color = Color { r: 37, g: 99, b: 235 };

    pub fn rgb(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b }
    }

    /// Parse a `#rrggbb` value, as used by the annotation sidecar format.
    pub fn from_hex(hex: &str) -> Option<Self> {
        let hex = hex.strip_prefix('#')?;
        if hex.len() != 6 {
            return None;
        }
        let r = u8::from_str_radix(&hex[0..2], 16).ok()?;
        let g = u8::from_str_radix(&hex[2..4], 16).ok()?;
        let b = u8::from_str_radix(&hex[4..6], 16).ok()?;
        Some(Self { r, g, b })
    }

    pub fn to_hex(&self) -> String {
        format!("#{:02x}{:02x}{:02x}", self.r, self.g, self.b)
    }
}

/// Raster compositing mode for freehand strokes.
///
/// `Paint` is ordinary source-over ink; `Erase` is destination-out and
/// removes previously painted annotation pixels (the eraser tool).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StrokeMode {
    Paint,
    Erase,
}

/// A committed markup shape.
///
/// Immutable once in the store: moving an annotation produces a new
/// value via [`Annotation::translated`] which replaces the stored one,
/// so an aborted drag can restore the original captured at drag start.
///
/// `width` is in document units and scaled at render time. Text width
/// is estimated (`max(10, chars * font_size * 0.6)`) rather than
/// measured; exact metrics would need a font round-trip.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Annotation {
    Freehand {
        points: Vec<Point>,
        color: Color,
        width: f32,
        mode: StrokeMode,
    },
    Line {
        start: Point,
        end: Point,
        color: Color,
        width: f32,
    },
    Arrow {
        start: Point,
        end: Point,
        color: Color,
        width: f32,
    },
    Rectangle {
        start: Point,
        end: Point,
        color: Color,
        width: f32,
        filled: bool,
    },
    Circle {
        center: Point,
        radius: f32,
        color: Color,
        width: f32,
        filled: bool,
    },
    Text {
        position: Point,
        body: String,
        color: Color,
        font_size: f32,
    },
}

impl Annotation {
    /// Bounding box in document space.
    pub fn bounding_box(&self) -> BoundingBox {
        match self {
            Annotation::Freehand { points, .. } => BoundingBox::from_points(points)
                .unwrap_or_else(|| BoundingBox::from_corners(Point::new(0.0, 0.0), Point::new(0.0, 0.0))),
            Annotation::Line { start, end, .. }
            | Annotation::Arrow { start, end, .. }
            | Annotation::Rectangle { start, end, .. } => BoundingBox::from_corners(*start, *end),
            Annotation::Circle { center, radius, .. } => BoundingBox::from_corners(
                Point::new(center.x - radius, center.y - radius),
                Point::new(center.x + radius, center.y + radius),
            ),
            Annotation::Text {
                position,
                body,
                font_size,
                ..
            } => {
                let width = estimated_text_width(body, *font_size);
                BoundingBox::from_corners(
                    *position,
                    Point::new(position.x + width, position.y + font_size * 1.2),
                )
            }
        }
    }

    /// Whether `point` hits this annotation.
    ///
    /// Filled shapes hit anywhere inside; unfilled shapes only within
    /// `tolerance` of the stroke. Callers derive the tolerance from a
    /// fixed device-pixel radius divided by the current zoom scale, so
    /// the on-screen hit area stays constant across zoom levels.
    pub fn hit_test(&self, point: Point, tolerance: f32) -> bool {
        match self {
            Annotation::Freehand { points, .. } => match points.as_slice() {
                [] => false,
                [only] => point.distance_to(only) <= tolerance,
                _ => points
                    .windows(2)
                    .any(|pair| near_segment(point, pair[0], pair[1], tolerance)),
            },
            Annotation::Line { start, end, .. } | Annotation::Arrow { start, end, .. } => {
                near_segment(point, *start, *end, tolerance)
            }
            Annotation::Rectangle {
                start, end, filled, ..
            } => {
                let bounds = BoundingBox::from_corners(*start, *end);
                if *filled {
                    return bounds.contains_with_tolerance(point, tolerance);
                }
                // Unfilled: only the four edges hit, not the interior.
                let tl = Point::new(bounds.min_x, bounds.min_y);
                let tr = Point::new(bounds.max_x, bounds.min_y);
                let br = Point::new(bounds.max_x, bounds.max_y);
                let bl = Point::new(bounds.min_x, bounds.max_y);
                near_segment(point, tl, tr, tolerance)
                    || near_segment(point, tr, br, tolerance)
                    || near_segment(point, br, bl, tolerance)
                    || near_segment(point, bl, tl, tolerance)
            }
            Annotation::Circle {
                center,
                radius,
                filled,
                ..
            } => {
                let distance = point.distance_to(center);
                if *filled {
                    distance <= radius + tolerance
                } else {
                    (distance - radius).abs() <= tolerance
                }
            }
            Annotation::Text { .. } => self.bounding_box().contains_with_tolerance(point, tolerance),
        }
    }

    /// A copy shifted by (dx, dy).
    ///
    /// Structural per-variant copy; never serialize-and-reparse, which
    /// the original tool used and which loses float fidelity.
    pub fn translated(&self, dx: f32, dy: f32) -> Annotation {
        match self {
            Annotation::Freehand {
                points,
                color,
                width,
                mode,
            } => Annotation::Freehand {
                points: points.iter().map(|p| p.translated(dx, dy)).collect(),
                color: *color,
                width: *width,
                mode: *mode,
            },
            Annotation::Line {
                start,
                end,
                color,
                width,
            } => Annotation::Line {
                start: start.translated(dx, dy),
                end: end.translated(dx, dy),
                color: *color,
                width: *width,
            },
            Annotation::Arrow {
                start,
                end,
                color,
                width,
            } => Annotation::Arrow {
                start: start.translated(dx, dy),
                end: end.translated(dx, dy),
                color: *color,
                width: *width,
            },
            Annotation::Rectangle {
                start,
                end,
                color,
                width,
                filled,
            } => Annotation::Rectangle {
                start: start.translated(dx, dy),
                end: end.translated(dx, dy),
                color: *color,
                width: *width,
                filled: *filled,
            },
            Annotation::Circle {
                center,
                radius,
                color,
                width,
                filled,
            } => Annotation::Circle {
                center: center.translated(dx, dy),
                radius: *radius,
                color: *color,
                width: *width,
                filled: *filled,
            },
            Annotation::Text {
                position,
                body,
                color,
                font_size,
            } => Annotation::Text {
                position: position.translated(dx, dy),
                body: body.clone(),
                color: *color,
                font_size: *font_size,
            },
        }
    }

    /// Compositing mode used when rasterizing this annotation.
    pub fn stroke_mode(&self) -> StrokeMode {
        match self {
            Annotation::Freehand { mode, .. } => *mode,
            _ => StrokeMode::Paint,
        }
    }

    pub fn color(&self) -> Color {
        match self {
            Annotation::Freehand { color, .. }
            | Annotation::Line { color, .. }
            | Annotation::Arrow { color, .. }
            | Annotation::Rectangle { color, .. }
            | Annotation::Circle { color, .. }
            | Annotation::Text { color, .. } => *color,
        }
    }

    /// Stroke width in document units (font size for text).
    pub fn width(&self) -> f32 {
        match self {
            Annotation::Freehand { width, .. }
            | Annotation::Line { width, .. }
            | Annotation::Arrow { width, .. }
            | Annotation::Rectangle { width, .. }
            | Annotation::Circle { width, .. } => *width,
            Annotation::Text { font_size, .. } => *font_size,
        }
    }
}

/// Estimated text run width in document units.
///
/// An approximation, not glyph metrics: good enough for hit testing
/// and selection outlines.
pub fn estimated_text_width(body: &str, font_size: f32) -> f32 {
    let chars = body.chars().count().max(1) as f32;
    (chars * font_size * 0.6).max(10.0)
}
