//! tiny-skia drawing for the individual annotation kinds.
//!
//! All functions take document-space geometry plus the zoom scale and
//! map to device pixels internally. Stroke widths arrive already
//! scaled.

use std::f32::consts::PI;

use inkmark_annot::{Annotation, Color};
use inkmark_geometry::Point;
use tiny_skia::{
    BlendMode, FillRule, LineCap, LineJoin, Paint, PathBuilder, Pixmap, Rect, Stroke, StrokeDash,
    Transform,
};

use crate::SELECTION_PADDING_PX;

/// Arrow head wings sit at this angle off the shaft.
const ARROW_HEAD_ANGLE: f32 = PI / 7.0;

fn solid_paint(color: Color, blend: BlendMode) -> Paint<'static> {
    let mut paint = Paint::default();
    paint.set_color_rgba8(color.r, color.g, color.b, 255);
    paint.anti_alias = false;
    paint.blend_mode = blend;
    paint
}

fn round_stroke(width: f32) -> Stroke {
    Stroke {
        width: width.max(0.1),
        line_cap: LineCap::Round,
        line_join: LineJoin::Round,
        ..Stroke::default()
    }
}

pub(crate) fn draw_polyline(
    surface: &mut Pixmap,
    points: &[Point],
    color: Color,
    stroke_width: f32,
    scale: f32,
    blend: BlendMode,
) {
    let paint = solid_paint(color, blend);
    match points {
        [] => {}
        [only] => {
            // A tap with no movement still leaves a dot.
            let mut builder = PathBuilder::new();
            builder.push_circle(only.x * scale, only.y * scale, stroke_width / 2.0);
            if let Some(path) = builder.finish() {
                surface.fill_path(&path, &paint, FillRule::Winding, Transform::identity(), None);
            }
        }
        [first, rest @ ..] => {
            let mut builder = PathBuilder::new();
            builder.move_to(first.x * scale, first.y * scale);
            for point in rest {
                builder.line_to(point.x * scale, point.y * scale);
            }
            if let Some(path) = builder.finish() {
                surface.stroke_path(
                    &path,
                    &paint,
                    &round_stroke(stroke_width),
                    Transform::identity(),
                    None,
                );
            }
        }
    }
}

pub(crate) fn draw_segment(
    surface: &mut Pixmap,
    start: Point,
    end: Point,
    color: Color,
    stroke_width: f32,
    scale: f32,
) {
    draw_polyline(
        surface,
        &[start, end],
        color,
        stroke_width,
        scale,
        BlendMode::SourceOver,
    );
}

pub(crate) fn draw_arrow(
    surface: &mut Pixmap,
    start: Point,
    end: Point,
    color: Color,
    width: f32,
    scale: f32,
) {
    draw_segment(surface, start, end, color, width * scale, scale);

    let dx = end.x - start.x;
    let dy = end.y - start.y;
    if dx.abs() < f32::EPSILON && dy.abs() < f32::EPSILON {
        return;
    }

    let angle = dy.atan2(dx);
    // Head length grows with stroke width but never collapses on thin
    // strokes.
    let head = (width * 3.0).max(10.0) * scale;
    let tip_x = end.x * scale;
    let tip_y = end.y * scale;

    let paint = solid_paint(color, BlendMode::SourceOver);
    let stroke = round_stroke(width * scale);
    for wing in [angle - ARROW_HEAD_ANGLE, angle + ARROW_HEAD_ANGLE] {
        let mut builder = PathBuilder::new();
        builder.move_to(tip_x, tip_y);
        builder.line_to(tip_x - head * wing.cos(), tip_y - head * wing.sin());
        if let Some(path) = builder.finish() {
            surface.stroke_path(&path, &paint, &stroke, Transform::identity(), None);
        }
    }
}

pub(crate) fn draw_rectangle(
    surface: &mut Pixmap,
    start: Point,
    end: Point,
    color: Color,
    stroke_width: f32,
    filled: bool,
    scale: f32,
) {
    let left = start.x.min(end.x) * scale;
    let top = start.y.min(end.y) * scale;
    let right = start.x.max(end.x) * scale;
    let bottom = start.y.max(end.y) * scale;
    let Some(rect) = Rect::from_ltrb(left, top, right, bottom) else {
        return;
    };
    let path = PathBuilder::from_rect(rect);

    let paint = solid_paint(color, BlendMode::SourceOver);
    if filled {
        surface.fill_path(&path, &paint, FillRule::Winding, Transform::identity(), None);
    }
    surface.stroke_path(
        &path,
        &paint,
        &round_stroke(stroke_width),
        Transform::identity(),
        None,
    );
}

pub(crate) fn draw_circle(
    surface: &mut Pixmap,
    center: Point,
    radius: f32,
    color: Color,
    stroke_width: f32,
    filled: bool,
    scale: f32,
) {
    if radius <= 0.0 {
        return;
    }
    let mut builder = PathBuilder::new();
    builder.push_circle(center.x * scale, center.y * scale, radius * scale);
    let Some(path) = builder.finish() else {
        return;
    };

    let paint = solid_paint(color, BlendMode::SourceOver);
    if filled {
        surface.fill_path(&path, &paint, FillRule::Winding, Transform::identity(), None);
    }
    surface.stroke_path(
        &path,
        &paint,
        &round_stroke(stroke_width),
        Transform::identity(),
        None,
    );
}

/// Dashed outline around a selected annotation.
///
/// Padding is in device pixels so the gap between shape and outline
/// looks the same at every zoom level.
pub(crate) fn draw_selection_outline(surface: &mut Pixmap, annotation: &Annotation, scale: f32) {
    let bounds = annotation.bounding_box();
    let left = bounds.min_x * scale - SELECTION_PADDING_PX;
    let top = bounds.min_y * scale - SELECTION_PADDING_PX;
    let right = bounds.max_x * scale + SELECTION_PADDING_PX;
    let bottom = bounds.max_y * scale + SELECTION_PADDING_PX;
    let Some(rect) = Rect::from_ltrb(left, top, right, bottom) else {
        return;
    };

    let paint = solid_paint(Color::BLUE, BlendMode::SourceOver);
    let mut stroke = round_stroke(1.5);
    stroke.dash = StrokeDash::new(vec![6.0, 4.0], 0.0);

    surface.stroke_path(
        &PathBuilder::from_rect(rect),
        &paint,
        &stroke,
        Transform::identity(),
        None,
    );
}
