//! Annotation model and per-page store.
//!
//! The data model for the markup layer: six annotation kinds with inline
//! styling, stored per page in draw order. All coordinates are document
//! space, so committed annotations stay correct under any zoom level.

pub mod annotation;
pub mod store;

pub use annotation::{Annotation, Color, StrokeMode};
pub use store::{AnnotationStore, PageNumber, Selection};
