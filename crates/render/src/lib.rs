//! Annotation layer rasterizer.
//!
//! Draws a page's annotations into an RGBA pixmap at a given zoom
//! scale. The layer is transparent where nothing is drawn so it can be
//! composited over a page raster, both on screen and during export.
//!
//! Anti-aliasing is off throughout. Rendering the same inputs twice
//! must produce byte-identical pixels, which the tests rely on and
//! which keeps exports reproducible.

pub mod shapes;
pub mod text;

use inkmark_annot::{Annotation, StrokeMode};
use thiserror::Error;
use tiny_skia::{BlendMode, Pixmap};

pub use rusttype::Font;

#[derive(Debug, Error)]
pub enum RenderError {
    #[error("invalid layer dimensions {0}x{1}")]
    InvalidDimensions(u32, u32),
    #[error("failed to parse font data")]
    InvalidFont,
}

/// Device-pixel padding around a selected annotation's outline.
pub const SELECTION_PADDING_PX: f32 = 6.0;

/// Rasterizes annotations for one page.
///
/// The font is optional: without one, text annotations draw nothing
/// (with a warning) but every other shape still renders. Embedders
/// that need text supply TTF bytes via [`Renderer::with_font`].
#[derive(Default)]
pub struct Renderer {
    font: Option<Font<'static>>,
}

impl Renderer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_font(font_data: Vec<u8>) -> Result<Self, RenderError> {
        let font = Font::try_from_vec(font_data).ok_or(RenderError::InvalidFont)?;
        Ok(Self { font: Some(font) })
    }

    pub fn has_font(&self) -> bool {
        self.font.is_some()
    }

    /// Allocate a transparent layer sized for a page at `scale`.
    pub fn new_layer(width: u32, height: u32) -> Result<Pixmap, RenderError> {
        Pixmap::new(width, height).ok_or(RenderError::InvalidDimensions(width, height))
    }

    /// Redraw the full annotation layer.
    ///
    /// Clears to transparent, draws committed annotations in z-order,
    /// then the selection outline, then the in-progress draft on top
    /// of everything.
    pub fn render_layer(
        &self,
        layer: &mut Pixmap,
        annotations: &[Annotation],
        scale: f32,
        selected: Option<usize>,
        draft: Option<&Annotation>,
    ) {
        layer.fill(tiny_skia::Color::TRANSPARENT);
        self.composite_onto(layer, annotations, scale);

        if let Some(index) = selected {
            if let Some(annotation) = annotations.get(index) {
                shapes::draw_selection_outline(layer, annotation, scale);
            }
        }

        if let Some(draft) = draft {
            self.draw_annotation(layer, draft, scale);
        }
    }

    /// Draw annotations over whatever the surface already holds,
    /// without clearing. Export uses this to stamp annotations onto a
    /// rasterized page.
    pub fn composite_onto(&self, surface: &mut Pixmap, annotations: &[Annotation], scale: f32) {
        for annotation in annotations {
            self.draw_annotation(surface, annotation, scale);
        }
    }

    fn draw_annotation(&self, surface: &mut Pixmap, annotation: &Annotation, scale: f32) {
        let blend = match annotation.stroke_mode() {
            StrokeMode::Paint => BlendMode::SourceOver,
            StrokeMode::Erase => BlendMode::Clear,
        };

        match annotation {
            Annotation::Freehand { points, color, width, .. } => {
                shapes::draw_polyline(surface, points, *color, width * scale, scale, blend);
            }
            Annotation::Line { start, end, color, width } => {
                shapes::draw_segment(surface, *start, *end, *color, width * scale, scale);
            }
            Annotation::Arrow { start, end, color, width } => {
                shapes::draw_arrow(surface, *start, *end, *color, *width, scale);
            }
            Annotation::Rectangle { start, end, color, width, filled } => {
                shapes::draw_rectangle(surface, *start, *end, *color, width * scale, *filled, scale);
            }
            Annotation::Circle { center, radius, color, width, filled } => {
                shapes::draw_circle(surface, *center, *radius, *color, width * scale, *filled, scale);
            }
            Annotation::Text { position, body, color, font_size } => match &self.font {
                Some(font) => {
                    text::draw_text(surface, font, *position, body, *color, *font_size, scale);
                }
                None => {
                    tracing::warn!(body = %body, "no font loaded, skipping text annotation");
                }
            },
        }
    }
}
