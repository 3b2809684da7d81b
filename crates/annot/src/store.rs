//! Per-page annotation store.
//!
//! Insertion order is z-order: later entries draw over earlier ones,
//! and hit testing walks pages back-to-front so the topmost shape
//! wins.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::annotation::Annotation;

/// 1-based page number, matching PDF page numbering.
pub type PageNumber = u32;

/// A selected annotation, addressed by page and position in that
/// page's draw order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Selection {
    pub page: PageNumber,
    pub index: usize,
}

/// All annotations for a document, keyed by page.
///
/// Pages with no annotations have no entry; removing the last
/// annotation on a page removes the entry so `annotated_pages` stays
/// accurate.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AnnotationStore {
    pages: BTreeMap<PageNumber, Vec<Annotation>>,
}

impl AnnotationStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append an annotation at the top of a page's z-order.
    pub fn append(&mut self, page: PageNumber, annotation: Annotation) {
        self.pages.entry(page).or_default().push(annotation);
    }

    /// Remove the most recently added annotation on a page (undo).
    /// No-op when the page has none.
    pub fn remove_last(&mut self, page: PageNumber) -> Option<Annotation> {
        let annotations = self.pages.get_mut(&page)?;
        let removed = annotations.pop();
        if annotations.is_empty() {
            self.pages.remove(&page);
        }
        removed
    }

    /// Remove every annotation on a page.
    pub fn clear_page(&mut self, page: PageNumber) {
        self.pages.remove(&page);
    }

    /// Remove every annotation in the document.
    pub fn clear(&mut self) {
        self.pages.clear();
    }

    /// Replace the annotation at `index` on `page`, keeping its
    /// z-order position. Returns false (and changes nothing) when the
    /// page or index does not exist.
    pub fn replace_at(&mut self, page: PageNumber, index: usize, annotation: Annotation) -> bool {
        match self.pages.get_mut(&page).and_then(|list| list.get_mut(index)) {
            Some(slot) => {
                *slot = annotation;
                true
            }
            None => false,
        }
    }

    /// Annotations on a page in draw order. Empty slice for untouched
    /// pages.
    pub fn page_annotations(&self, page: PageNumber) -> &[Annotation] {
        self.pages.get(&page).map(Vec::as_slice).unwrap_or(&[])
    }

    pub fn get(&self, page: PageNumber, index: usize) -> Option<&Annotation> {
        self.pages.get(&page).and_then(|list| list.get(index))
    }

    /// Pages that currently carry at least one annotation, ascending.
    pub fn annotated_pages(&self) -> impl Iterator<Item = PageNumber> + '_ {
        self.pages.keys().copied()
    }

    pub fn is_empty(&self) -> bool {
        self.pages.is_empty()
    }

    /// Topmost annotation hit by `point` on `page`, if any.
    ///
    /// Walks draw order back to front so overlapping shapes resolve to
    /// the one drawn last.
    pub fn hit_test(&self, page: PageNumber, point: inkmark_geometry::Point, tolerance: f32) -> Option<Selection> {
        let annotations = self.pages.get(&page)?;
        annotations
            .iter()
            .enumerate()
            .rev()
            .find(|(_, annotation)| annotation.hit_test(point, tolerance))
            .map(|(index, _)| Selection { page, index })
    }
}
