//! Text annotation rasterization.
//!
//! tiny-skia has no text support, so glyphs are laid out with rusttype
//! and their coverage masks blended into the pixmap by hand. Pixmap
//! data is premultiplied RGBA.

use inkmark_annot::Color;
use inkmark_geometry::Point;
use rusttype::{point, Font, Scale};
use tiny_skia::Pixmap;

pub(crate) fn draw_text(
    surface: &mut Pixmap,
    font: &Font<'static>,
    position: Point,
    body: &str,
    color: Color,
    font_size: f32,
    scale: f32,
) {
    let px_size = font_size * scale;
    let glyph_scale = Scale::uniform(px_size);
    let ascent = font.v_metrics(glyph_scale).ascent;
    // position is the top-left of the run; rusttype wants the baseline.
    let origin = point(position.x * scale, position.y * scale + ascent);

    let width = surface.width() as i32;
    let height = surface.height() as i32;

    for glyph in font.layout(body, glyph_scale, origin) {
        let Some(bounds) = glyph.pixel_bounding_box() else {
            continue;
        };
        glyph.draw(|gx, gy, coverage| {
            let x = bounds.min.x + gx as i32;
            let y = bounds.min.y + gy as i32;
            if x < 0 || y < 0 || x >= width || y >= height {
                return;
            }
            blend_pixel(surface, x as u32, y as u32, color, coverage);
        });
    }
}

/// Source-over blend of a solid color at `coverage` opacity.
fn blend_pixel(surface: &mut Pixmap, x: u32, y: u32, color: Color, coverage: f32) {
    let alpha = (coverage.clamp(0.0, 1.0) * 255.0).round() as u16;
    if alpha == 0 {
        return;
    }
    let inverse = 255 - alpha;
    let idx = ((y * surface.width() + x) * 4) as usize;
    let data = surface.data_mut();

    // Premultiplied source-over: out = src * a + dst * (1 - a).
    let src = [color.r as u16, color.g as u16, color.b as u16, 255];
    for channel in 0..4 {
        let dst = data[idx + channel] as u16;
        data[idx + channel] = ((src[channel] * alpha + dst * inverse) / 255) as u8;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn full_coverage_overwrites_pixel() {
        let mut surface = Pixmap::new(4, 4).unwrap();
        blend_pixel(&mut surface, 1, 1, Color::RED, 1.0);

        let idx = (1 * 4 + 1) * 4;
        let px = &surface.data()[idx..idx + 4];
        assert_eq!(px[0], Color::RED.r);
        assert_eq!(px[3], 255);
    }

    #[test]
    fn zero_coverage_leaves_pixel_untouched() {
        let mut surface = Pixmap::new(4, 4).unwrap();
        blend_pixel(&mut surface, 2, 2, Color::RED, 0.0);
        assert!(surface.data().iter().all(|byte| *byte == 0));
    }
}
