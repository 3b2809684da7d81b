//! Editor session state: active tool, style settings, store, selection.

use inkmark_annot::{AnnotationStore, Color, PageNumber, Selection};
use inkmark_view::ZoomLimits;
use serde::{Deserialize, Serialize};

use crate::controller::Interaction;

/// Active drawing tool.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Tool {
    Select,
    Pan,
    Pen,
    Eraser,
    Line,
    Arrow,
    Rectangle,
    Circle,
    Text,
}

/// Tunable defaults for a session.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct EditorConfig {
    pub stroke_width: f32,
    pub font_size: f32,
    /// The eraser ignores the pen width and always uses this.
    pub eraser_width: f32,
    pub hit_tolerance_px: f32,
    pub export_scale: f32,
    pub zoom: ZoomLimits,
}

impl Default for EditorConfig {
    fn default() -> Self {
        Self {
            stroke_width: 3.0,
            font_size: 16.0,
            eraser_width: 20.0,
            hit_tolerance_px: inkmark_view::DEFAULT_HIT_TOLERANCE_PX,
            export_scale: 2.0,
            zoom: ZoomLimits::default(),
        }
    }
}

/// Everything the controller needs to interpret pointer events.
///
/// One session per open document. No globals: hosts own the session
/// and thread it through event handlers.
pub struct EditorSession {
    pub config: EditorConfig,
    tool: Tool,
    color: Color,
    stroke_width: f32,
    font_size: f32,
    filled: bool,
    scale: f32,
    page: PageNumber,
    store: AnnotationStore,
    selection: Option<Selection>,
    pub(crate) interaction: Interaction,
}

impl EditorSession {
    pub fn new(config: EditorConfig) -> Self {
        Self {
            tool: Tool::Pen,
            color: Color::BLUE,
            stroke_width: config.stroke_width,
            font_size: config.font_size,
            filled: false,
            scale: 1.0,
            page: 1,
            store: AnnotationStore::new(),
            selection: None,
            interaction: Interaction::Idle,
            config,
        }
    }

    pub fn tool(&self) -> Tool {
        self.tool
    }

    /// Switch tools. Commits an open text draft and drops any other
    /// in-progress interaction.
    pub fn set_tool(&mut self, tool: Tool) {
        if matches!(self.interaction, Interaction::EditingText { .. }) {
            self.commit_text_draft();
        }
        self.interaction = Interaction::Idle;
        self.tool = tool;
    }

    pub fn color(&self) -> Color {
        self.color
    }

    pub fn set_color(&mut self, color: Color) {
        self.color = color;
    }

    pub fn stroke_width(&self) -> f32 {
        self.stroke_width
    }

    pub fn set_stroke_width(&mut self, width: f32) {
        self.stroke_width = width.max(0.5);
    }

    pub fn font_size(&self) -> f32 {
        self.font_size
    }

    pub fn set_font_size(&mut self, size: f32) {
        self.font_size = size.max(1.0);
    }

    pub fn filled(&self) -> bool {
        self.filled
    }

    pub fn set_filled(&mut self, filled: bool) {
        self.filled = filled;
    }

    pub fn scale(&self) -> f32 {
        self.scale
    }

    pub fn set_scale(&mut self, scale: f32) {
        self.scale = self.config.zoom.clamp(scale);
    }

    pub fn zoom_in(&mut self) {
        self.scale = self.config.zoom.step_in(self.scale);
    }

    pub fn zoom_out(&mut self) {
        self.scale = self.config.zoom.step_out(self.scale);
    }

    pub fn page(&self) -> PageNumber {
        self.page
    }

    /// Change pages. Drops drafts and clears the selection; a selected
    /// index is only meaningful on the page it was made.
    pub fn set_page(&mut self, page: PageNumber) {
        if page == self.page {
            return;
        }
        if matches!(self.interaction, Interaction::EditingText { .. }) {
            self.commit_text_draft();
        }
        self.interaction = Interaction::Idle;
        self.selection = None;
        self.page = page.max(1);
    }

    pub fn store(&self) -> &AnnotationStore {
        &self.store
    }

    pub(crate) fn store_mut(&mut self) -> &mut AnnotationStore {
        &mut self.store
    }

    pub fn selection(&self) -> Option<Selection> {
        self.selection
    }

    pub(crate) fn set_selection(&mut self, selection: Option<Selection>) {
        self.selection = selection;
    }

    /// Index to highlight when rendering the current page, if any.
    pub fn selected_index(&self) -> Option<usize> {
        self.selection
            .filter(|selection| selection.page == self.page)
            .map(|selection| selection.index)
    }

    /// Remove the most recent annotation on the current page.
    pub fn undo_last(&mut self) {
        self.store.remove_last(self.page);
        self.selection = None;
    }

    /// Remove every annotation on the current page.
    pub fn clear_current_page(&mut self) {
        self.store.clear_page(self.page);
        self.selection = None;
        self.interaction = Interaction::Idle;
    }

    /// Reset for a newly opened document.
    pub fn reset_document(&mut self) {
        self.store.clear();
        self.selection = None;
        self.interaction = Interaction::Idle;
        self.page = 1;
        self.scale = 1.0;
    }
}

impl Default for EditorSession {
    fn default() -> Self {
        Self::new(EditorConfig::default())
    }
}
