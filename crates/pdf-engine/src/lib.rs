//! PDF boundary: page sizing, rasterization, and export.
//!
//! Page painting is an external-collaborator concern behind the
//! [`PageRasterizer`] trait. The default [`LopdfRasterizer`] parses
//! page geometry with `lopdf` and produces blank page rasters; a real
//! renderer backend implements the same trait.

pub mod export;

use std::fs;
use std::path::Path;

use inkmark_view::CancellationToken;
use lopdf::Document;
use tiny_skia::Pixmap;

pub use export::{export_document, export_file_name};

/// Page dimensions in PDF points (1/72 inch).
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PageSizePt {
    pub width_pt: f32,
    pub height_pt: f32,
}

pub const US_LETTER: PageSizePt = PageSizePt { width_pt: 612.0, height_pt: 792.0 };

#[derive(Debug, thiserror::Error)]
pub enum PdfError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
    #[error("PDF parse error: {0}")]
    Parse(#[from] lopdf::Error),
    #[error("page {page} out of range (page_count={page_count})")]
    PageOutOfRange { page: u32, page_count: u32 },
    #[error("encrypted PDFs are not supported")]
    Encrypted,
    #[error("operation cancelled")]
    Cancelled,
    #[error("image encoding failed: {0}")]
    Encode(String),
    #[error("document has no pages")]
    NoPages,
}

/// Produces page bitmaps for display and export.
///
/// Pages are 1-based. `rasterize` is cooperative: implementations
/// check the token between units of work and bail out with
/// [`PdfError::Cancelled`], which callers treat as silence rather than
/// failure.
pub trait PageRasterizer {
    fn page_count(&self) -> u32;
    fn page_size(&self, page: u32) -> Result<PageSizePt, PdfError>;
    fn rasterize(
        &self,
        page: u32,
        scale: f32,
        cancel: &CancellationToken,
    ) -> Result<Pixmap, PdfError>;
}

/// Placeholder backend: real page geometry, blank page pixels.
///
/// `lopdf` gives us page counts and MediaBoxes but no content
/// painting, so pages render as white sheets with a light border.
#[derive(Debug, Clone)]
pub struct LopdfRasterizer {
    sizes: Vec<PageSizePt>,
}

impl LopdfRasterizer {
    pub fn from_file(path: &Path) -> Result<Self, PdfError> {
        Self::from_bytes(&fs::read(path)?)
    }

    pub fn from_bytes(bytes: &[u8]) -> Result<Self, PdfError> {
        // Encrypted documents would parse but produce garbage page
        // geometry; reject them up front.
        if bytes.windows("/Encrypt".len()).any(|window| window == b"/Encrypt") {
            return Err(PdfError::Encrypted);
        }

        let doc = Document::load_mem(bytes)?;
        let pages = doc.get_pages();
        let mut sizes = Vec::with_capacity(pages.len());

        for (_, object_id) in pages {
            let dict = doc.get_dictionary(object_id)?;
            let size = dict
                .get(b"MediaBox")
                .ok()
                .and_then(|object| object.as_array().ok())
                .and_then(|array| {
                    if array.len() != 4 {
                        return None;
                    }
                    let x0 = array[0].as_float().ok()?;
                    let y0 = array[1].as_float().ok()?;
                    let x1 = array[2].as_float().ok()?;
                    let y1 = array[3].as_float().ok()?;
                    Some(PageSizePt {
                        width_pt: (x1 - x0).abs(),
                        height_pt: (y1 - y0).abs(),
                    })
                })
                .unwrap_or(US_LETTER);
            sizes.push(size);
        }

        if sizes.is_empty() {
            return Err(PdfError::NoPages);
        }

        Ok(Self { sizes })
    }
}

impl PageRasterizer for LopdfRasterizer {
    fn page_count(&self) -> u32 {
        self.sizes.len() as u32
    }

    fn page_size(&self, page: u32) -> Result<PageSizePt, PdfError> {
        page.checked_sub(1)
            .and_then(|index| self.sizes.get(index as usize))
            .copied()
            .ok_or(PdfError::PageOutOfRange {
                page,
                page_count: self.page_count(),
            })
    }

    fn rasterize(
        &self,
        page: u32,
        scale: f32,
        cancel: &CancellationToken,
    ) -> Result<Pixmap, PdfError> {
        if cancel.is_cancelled() {
            return Err(PdfError::Cancelled);
        }

        let size = self.page_size(page)?;
        let scale = if scale <= 0.0 { 1.0 } else { scale };
        let width = (size.width_pt * scale).round().max(1.0) as u32;
        let height = (size.height_pt * scale).round().max(1.0) as u32;

        let mut pixmap =
            Pixmap::new(width, height).ok_or(PdfError::Encode(format!("{width}x{height} raster")))?;
        pixmap.fill(tiny_skia::Color::WHITE);

        if width >= 4 && height >= 4 {
            let border = [220u8, 220, 220, 255];
            let data = pixmap.data_mut();
            for x in 0..width as usize {
                let top = x * 4;
                let bottom = ((height as usize - 1) * width as usize + x) * 4;
                data[top..top + 4].copy_from_slice(&border);
                data[bottom..bottom + 4].copy_from_slice(&border);
            }
            for y in 0..height as usize {
                let left = y * width as usize * 4;
                let right = (y * width as usize + width as usize - 1) * 4;
                data[left..left + 4].copy_from_slice(&border);
                data[right..right + 4].copy_from_slice(&border);
            }
        }

        if cancel.is_cancelled() {
            return Err(PdfError::Cancelled);
        }
        Ok(pixmap)
    }
}


#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn reads_page_count_and_sizes() {
        let bytes = test_pdf::blank_document(3, 612.0, 792.0);
        let rasterizer = LopdfRasterizer::from_bytes(&bytes).expect("open");

        assert_eq!(rasterizer.page_count(), 3);
        let size = rasterizer.page_size(2).expect("page 2");
        assert_eq!(size.width_pt, 612.0);
        assert_eq!(size.height_pt, 792.0);
    }

    #[test]
    fn page_numbers_are_one_based() {
        let bytes = test_pdf::blank_document(1, 612.0, 792.0);
        let rasterizer = LopdfRasterizer::from_bytes(&bytes).expect("open");

        assert!(rasterizer.page_size(1).is_ok());
        assert!(matches!(
            rasterizer.page_size(0),
            Err(PdfError::PageOutOfRange { page: 0, page_count: 1 })
        ));
        assert!(matches!(
            rasterizer.page_size(2),
            Err(PdfError::PageOutOfRange { page: 2, .. })
        ));
    }

    #[test]
    fn rejects_encrypted_documents() {
        let mut bytes = test_pdf::blank_document(1, 612.0, 792.0);
        bytes.extend_from_slice(b"/Encrypt");
        assert!(matches!(
            LopdfRasterizer::from_bytes(&bytes),
            Err(PdfError::Encrypted)
        ));
    }

    #[test]
    fn rejects_garbage_bytes() {
        assert!(matches!(
            LopdfRasterizer::from_bytes(b"not a pdf at all"),
            Err(PdfError::Parse(_))
        ));
    }

    #[test]
    fn rasterizes_white_page_at_scale() {
        let bytes = test_pdf::blank_document(1, 100.0, 50.0);
        let rasterizer = LopdfRasterizer::from_bytes(&bytes).expect("open");

        let pixmap = rasterizer
            .rasterize(1, 2.0, &CancellationToken::new())
            .expect("raster");
        assert_eq!(pixmap.width(), 200);
        assert_eq!(pixmap.height(), 100);

        // Interior is white, border is the light gray frame.
        let center = ((50 * 200 + 100) * 4) as usize;
        assert_eq!(&pixmap.data()[center..center + 3], &[255, 255, 255]);
        assert_eq!(&pixmap.data()[0..3], &[220, 220, 220]);
    }

    #[test]
    fn cancelled_token_stops_rasterization() {
        let bytes = test_pdf::blank_document(1, 612.0, 792.0);
        let rasterizer = LopdfRasterizer::from_bytes(&bytes).expect("open");

        let cancel = CancellationToken::new();
        cancel.cancel();
        assert!(matches!(
            rasterizer.rasterize(1, 1.0, &cancel),
            Err(PdfError::Cancelled)
        ));
    }
}
