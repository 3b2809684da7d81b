//! Annotated-document export.
//!
//! Pages are processed strictly sequentially: rasterize the page,
//! stamp the annotation layer on top, flatten to opaque RGB, encode as
//! JPEG, and embed the JPEG as an image XObject on a page with the
//! original point dimensions. Sequential processing keeps peak memory
//! at one page raster regardless of document length.

use std::io::Cursor;
use std::path::Path;

use image::codecs::jpeg::JpegEncoder;
use image::ExtendedColorType;
use inkmark_annot::AnnotationStore;
use inkmark_render::Renderer;
use inkmark_view::CancellationToken;
use lopdf::content::{Content, Operation};
use lopdf::{dictionary, Document, Object, Stream};
use tiny_skia::Pixmap;

use crate::{PageRasterizer, PdfError};

/// JPEG quality used for embedded page images.
const JPEG_QUALITY: u8 = 95;

/// Raster, annotate, and reassemble every page into a new PDF.
///
/// `scale` is the raster oversampling factor (2.0 by default upstream,
/// so a US Letter page becomes a 1224x1584 image). Annotations are
/// baked into the page pixels; the output has no live annotation
/// objects.
pub fn export_document(
    rasterizer: &dyn PageRasterizer,
    store: &AnnotationStore,
    renderer: &Renderer,
    scale: f32,
    cancel: &CancellationToken,
) -> Result<Vec<u8>, PdfError> {
    let page_count = rasterizer.page_count();
    if page_count == 0 {
        return Err(PdfError::NoPages);
    }

    let mut doc = Document::with_version("1.5");
    let pages_id = doc.new_object_id();
    let mut kids = Vec::with_capacity(page_count as usize);

    for page in 1..=page_count {
        if cancel.is_cancelled() {
            return Err(PdfError::Cancelled);
        }

        let size = rasterizer.page_size(page)?;
        let mut pixmap = rasterizer.rasterize(page, scale, cancel)?;
        renderer.composite_onto(&mut pixmap, store.page_annotations(page), scale);

        let jpeg = encode_jpeg(&pixmap)?;
        tracing::debug!(page, bytes = jpeg.len(), "encoded page image");

        let image_id = doc.add_object(Stream::new(
            dictionary! {
                "Type" => "XObject",
                "Subtype" => "Image",
                "Width" => pixmap.width() as i64,
                "Height" => pixmap.height() as i64,
                "ColorSpace" => "DeviceRGB",
                "BitsPerComponent" => 8,
                "Filter" => "DCTDecode",
            },
            jpeg,
        ));

        // Stretch the image over the full page box.
        let content = Content {
            operations: vec![
                Operation::new("q", vec![]),
                Operation::new(
                    "cm",
                    vec![
                        Object::Real(size.width_pt),
                        Object::Real(0.0),
                        Object::Real(0.0),
                        Object::Real(size.height_pt),
                        Object::Real(0.0),
                        Object::Real(0.0),
                    ],
                ),
                Operation::new("Do", vec![Object::Name(b"Im0".to_vec())]),
                Operation::new("Q", vec![]),
            ],
        };
        let content_id = doc.add_object(Stream::new(dictionary! {}, content.encode()?));

        let page_id = doc.add_object(dictionary! {
            "Type" => "Page",
            "Parent" => pages_id,
            "MediaBox" => vec![
                0.into(),
                0.into(),
                Object::Real(size.width_pt),
                Object::Real(size.height_pt),
            ],
            "Contents" => content_id,
            "Resources" => dictionary! {
                "XObject" => dictionary! { "Im0" => image_id },
            },
        });
        kids.push(Object::Reference(page_id));
    }

    doc.objects.insert(
        pages_id,
        Object::Dictionary(dictionary! {
            "Type" => "Pages",
            "Kids" => kids,
            "Count" => page_count as i64,
        }),
    );
    let catalog_id = doc.add_object(dictionary! {
        "Type" => "Catalog",
        "Pages" => pages_id,
    });
    doc.trailer.set("Root", catalog_id);

    let mut bytes = Vec::new();
    doc.save_to(&mut bytes)?;
    Ok(bytes)
}

/// Flatten a premultiplied RGBA pixmap over white and JPEG-encode it.
///
/// JPEG has no alpha channel; erased regions must come out white, not
/// black, so transparency is resolved against a white backdrop first.
fn encode_jpeg(pixmap: &Pixmap) -> Result<Vec<u8>, PdfError> {
    let data = pixmap.data();
    let mut rgb = Vec::with_capacity((pixmap.width() * pixmap.height() * 3) as usize);
    for pixel in data.chunks_exact(4) {
        let alpha = pixel[3] as u16;
        // Premultiplied source over white: c + 255 * (1 - a).
        for channel in &pixel[..3] {
            rgb.push((*channel as u16 + (255 - alpha)).min(255) as u8);
        }
    }

    let mut out = Cursor::new(Vec::new());
    JpegEncoder::new_with_quality(&mut out, JPEG_QUALITY)
        .encode(&rgb, pixmap.width(), pixmap.height(), ExtendedColorType::Rgb8)
        .map_err(|error| PdfError::Encode(error.to_string()))?;
    Ok(out.into_inner())
}

/// Suggested output name for an exported document.
pub fn export_file_name(original: &Path) -> String {
    match original.file_name().and_then(|name| name.to_str()) {
        Some(name) => format!("edited_{name}"),
        None => "edited_document.pdf".to_owned(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_pdf;
    use crate::LopdfRasterizer;
    use inkmark_annot::{Annotation, Color};
    use inkmark_geometry::Point;

    fn sample_store() -> AnnotationStore {
        let mut store = AnnotationStore::new();
        store.append(
            1,
            Annotation::Rectangle {
                start: Point::new(50.0, 50.0),
                end: Point::new(200.0, 120.0),
                color: Color::RED,
                width: 3.0,
                filled: true,
            },
        );
        store
    }

    #[test]
    fn export_reparses_with_expected_page_count() {
        let source = test_pdf::blank_document(2, 612.0, 792.0);
        let rasterizer = LopdfRasterizer::from_bytes(&source).expect("open");

        let bytes = export_document(
            &rasterizer,
            &sample_store(),
            &Renderer::new(),
            2.0,
            &CancellationToken::new(),
        )
        .expect("export");

        let reparsed = Document::load_mem(&bytes).expect("exported PDF must parse");
        assert_eq!(reparsed.get_pages().len(), 2);
    }

    #[test]
    fn exported_pages_embed_jpeg_images() {
        let source = test_pdf::blank_document(1, 612.0, 792.0);
        let rasterizer = LopdfRasterizer::from_bytes(&source).expect("open");

        let bytes = export_document(
            &rasterizer,
            &sample_store(),
            &Renderer::new(),
            1.0,
            &CancellationToken::new(),
        )
        .expect("export");

        let haystack = bytes.windows("DCTDecode".len()).any(|w| w == b"DCTDecode");
        assert!(haystack, "page image must be DCTDecode encoded");
    }

    #[test]
    fn landscape_pages_keep_their_orientation() {
        let source = test_pdf::blank_document(1, 792.0, 612.0);
        let rasterizer = LopdfRasterizer::from_bytes(&source).expect("open");

        let bytes = export_document(
            &rasterizer,
            &AnnotationStore::new(),
            &Renderer::new(),
            1.0,
            &CancellationToken::new(),
        )
        .expect("export");

        let reparsed = Document::load_mem(&bytes).expect("parse");
        let (_, page_id) = reparsed.get_pages().into_iter().next().expect("one page");
        let media_box = reparsed
            .get_dictionary(page_id)
            .expect("page dict")
            .get(b"MediaBox")
            .expect("media box")
            .as_array()
            .expect("array")
            .iter()
            .map(|object| object.as_float().expect("number"))
            .collect::<Vec<_>>();
        assert_eq!(media_box, vec![0.0, 0.0, 792.0, 612.0]);
    }

    #[test]
    fn cancelled_export_returns_cancelled() {
        let source = test_pdf::blank_document(3, 612.0, 792.0);
        let rasterizer = LopdfRasterizer::from_bytes(&source).expect("open");

        let cancel = CancellationToken::new();
        cancel.cancel();
        let result = export_document(
            &rasterizer,
            &sample_store(),
            &Renderer::new(),
            1.0,
            &cancel,
        );
        assert!(matches!(result, Err(PdfError::Cancelled)));
    }

    #[test]
    fn export_file_name_prefixes_original() {
        assert_eq!(export_file_name(Path::new("report.pdf")), "edited_report.pdf");
        assert_eq!(
            export_file_name(Path::new("/tmp/nested/scan 1.pdf")),
            "edited_scan 1.pdf"
        );
    }
}
