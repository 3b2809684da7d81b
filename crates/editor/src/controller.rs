//! Pointer event handling.
//!
//! Device positions arrive in CSS units relative to the canvas origin
//! and are mapped to document space through [`CanvasMetrics`] before
//! any geometry runs. Drag translation is incremental: each move
//! applies only the delta since the previous sample, so intermediate
//! rounding never accumulates into drift.

use inkmark_annot::{Annotation, Color, StrokeMode};
use inkmark_geometry::Point;
use inkmark_view::CanvasMetrics;

use crate::session::{EditorSession, Tool};

/// Pointer button pressed at pointer-down.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PointerButton {
    Primary,
    Middle,
    Secondary,
}

/// Scroll adjustment the host should apply, in CSS pixels.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PanDelta {
    pub dx: f32,
    pub dy: f32,
}

/// Current pointer interaction.
#[derive(Debug, Clone, PartialEq)]
pub enum Interaction {
    Idle,
    /// Two-point shape being dragged out (line, arrow, rect, circle).
    DraftingShape {
        tool: Tool,
        anchor: Point,
        current: Point,
    },
    /// Pen or eraser stroke in progress.
    DraftingFreehand { points: Vec<Point>, erase: bool },
    /// Open text draft anchored at a document point.
    EditingText { anchor: Point, body: String },
    /// Selected annotation following the pointer.
    DraggingSelection {
        index: usize,
        last_sample: Point,
        original: Annotation,
    },
    /// Middle/secondary drag or the pan tool; samples are CSS units.
    Panning { last_css: (f32, f32) },
}

impl EditorSession {
    pub fn interaction(&self) -> &Interaction {
        &self.interaction
    }

    /// Begin an interaction for a pointer press at CSS position (x, y).
    pub fn pointer_down(&mut self, x: f32, y: f32, metrics: &CanvasMetrics, button: PointerButton) {
        if button != PointerButton::Primary || self.tool() == Tool::Pan {
            // Panning ends the current interaction like any other
            // transition, so an open text draft commits rather than
            // vanishing.
            if matches!(self.interaction, Interaction::EditingText { .. }) {
                self.commit_text_draft();
            }
            self.interaction = Interaction::Panning { last_css: (x, y) };
            return;
        }

        let point = metrics.device_to_document(x, y);
        match self.tool() {
            Tool::Pan => {}
            Tool::Select => self.begin_select_or_drag(point, metrics.hit_tolerance()),
            Tool::Text => {
                // A press elsewhere commits the open draft before
                // starting a new one.
                if matches!(self.interaction, Interaction::EditingText { .. }) {
                    self.commit_text_draft();
                }
                self.interaction = Interaction::EditingText {
                    anchor: point,
                    body: String::new(),
                };
            }
            Tool::Pen => {
                self.interaction = Interaction::DraftingFreehand {
                    points: vec![point],
                    erase: false,
                };
            }
            Tool::Eraser => {
                self.interaction = Interaction::DraftingFreehand {
                    points: vec![point],
                    erase: true,
                };
            }
            tool @ (Tool::Line | Tool::Arrow | Tool::Rectangle | Tool::Circle) => {
                self.interaction = Interaction::DraftingShape {
                    tool,
                    anchor: point,
                    current: point,
                };
            }
        }
    }

    fn begin_select_or_drag(&mut self, point: Point, tolerance: f32) {
        let page = self.page();
        match self.store().hit_test(page, point, tolerance) {
            Some(selection) => {
                // Capture the annotation as it is now so an aborted
                // drag can restore it exactly.
                let Some(original) = self.store().get(page, selection.index).cloned() else {
                    return;
                };
                self.set_selection(Some(selection));
                self.interaction = Interaction::DraggingSelection {
                    index: selection.index,
                    last_sample: point,
                    original,
                };
            }
            None => {
                self.set_selection(None);
                self.interaction = Interaction::Idle;
            }
        }
    }

    /// Advance the current interaction. Returns a pan delta when the
    /// session is panning, `None` otherwise.
    pub fn pointer_move(&mut self, x: f32, y: f32, metrics: &CanvasMetrics) -> Option<PanDelta> {
        if matches!(self.interaction, Interaction::DraggingSelection { .. }) {
            let point = metrics.device_to_document(x, y);
            self.drag_to(point);
            return None;
        }
        match &mut self.interaction {
            Interaction::Panning { last_css } => {
                let delta = PanDelta {
                    dx: x - last_css.0,
                    dy: y - last_css.1,
                };
                *last_css = (x, y);
                return Some(delta);
            }
            Interaction::DraftingFreehand { points, .. } => {
                points.push(metrics.device_to_document(x, y));
            }
            Interaction::DraftingShape { current, .. } => {
                *current = metrics.device_to_document(x, y);
            }
            Interaction::Idle
            | Interaction::EditingText { .. }
            | Interaction::DraggingSelection { .. } => {}
        }
        None
    }

    fn drag_to(&mut self, point: Point) {
        let page = self.page();
        let Interaction::DraggingSelection { index, last_sample, .. } = &mut self.interaction
        else {
            return;
        };
        let dx = point.x - last_sample.x;
        let dy = point.y - last_sample.y;
        *last_sample = point;
        let index = *index;

        let Some(moved) = self.store().get(page, index).map(|a| a.translated(dx, dy)) else {
            return;
        };
        self.store_mut().replace_at(page, index, moved);
    }

    /// Finish the current interaction, committing drafts to the store.
    pub fn pointer_up(&mut self, x: f32, y: f32, metrics: &CanvasMetrics) {
        let point = metrics.device_to_document(x, y);
        let finished = std::mem::replace(&mut self.interaction, Interaction::Idle);
        match finished {
            Interaction::Idle | Interaction::Panning { .. } => {}
            Interaction::DraggingSelection { .. } => {
                // Selection stays; the drag origin is dropped.
            }
            Interaction::EditingText { anchor, body } => {
                // Text commits through the keyboard path, not pointer-up.
                self.interaction = Interaction::EditingText { anchor, body };
            }
            Interaction::DraftingFreehand { points, erase } => {
                self.commit_freehand(points, erase);
            }
            Interaction::DraftingShape { tool, anchor, .. } => {
                self.commit_shape(tool, anchor, point);
            }
        }
    }

    fn commit_freehand(&mut self, points: Vec<Point>, erase: bool) {
        if points.is_empty() {
            tracing::debug!("dropping freehand draft with no samples");
            return;
        }
        let annotation = if erase {
            Annotation::Freehand {
                points,
                color: Color::WHITE,
                width: self.config.eraser_width,
                mode: StrokeMode::Erase,
            }
        } else {
            Annotation::Freehand {
                points,
                color: self.color(),
                width: self.stroke_width(),
                mode: StrokeMode::Paint,
            }
        };
        let page = self.page();
        self.store_mut().append(page, annotation);
    }

    fn commit_shape(&mut self, tool: Tool, anchor: Point, release: Point) {
        let color = self.color();
        let width = self.stroke_width();
        let filled = self.filled();
        let annotation = match tool {
            Tool::Line => Annotation::Line { start: anchor, end: release, color, width },
            Tool::Arrow => Annotation::Arrow { start: anchor, end: release, color, width },
            Tool::Rectangle => Annotation::Rectangle {
                start: anchor,
                end: release,
                color,
                width,
                filled,
            },
            Tool::Circle => Annotation::Circle {
                center: anchor,
                radius: anchor.distance_to(&release),
                color,
                width,
                filled,
            },
            _ => return,
        };
        let page = self.page();
        self.store_mut().append(page, annotation);
    }

    /// Cancel an in-progress drag, restoring the annotation captured
    /// at drag start.
    pub fn abort_drag(&mut self) {
        let page = self.page();
        match std::mem::replace(&mut self.interaction, Interaction::Idle) {
            Interaction::DraggingSelection { index, original, .. } => {
                self.store_mut().replace_at(page, index, original);
            }
            other => self.interaction = other,
        }
    }

    /// The in-progress annotation for the renderer's preview pass.
    pub fn draft_annotation(&self) -> Option<Annotation> {
        match &self.interaction {
            Interaction::DraftingFreehand { points, erase } => Some(Annotation::Freehand {
                points: points.clone(),
                color: if *erase { Color::WHITE } else { self.color() },
                width: if *erase {
                    self.config.eraser_width
                } else {
                    self.stroke_width()
                },
                mode: if *erase { StrokeMode::Erase } else { StrokeMode::Paint },
            }),
            Interaction::DraftingShape { tool, anchor, current } => {
                let color = self.color();
                let width = self.stroke_width();
                let filled = self.filled();
                Some(match tool {
                    Tool::Line => Annotation::Line { start: *anchor, end: *current, color, width },
                    Tool::Arrow => Annotation::Arrow { start: *anchor, end: *current, color, width },
                    Tool::Rectangle => Annotation::Rectangle {
                        start: *anchor,
                        end: *current,
                        color,
                        width,
                        filled,
                    },
                    Tool::Circle => Annotation::Circle {
                        center: *anchor,
                        radius: anchor.distance_to(current),
                        color,
                        width,
                        filled,
                    },
                    _ => return None,
                })
            }
            Interaction::EditingText { anchor, body } => Some(Annotation::Text {
                position: *anchor,
                body: body.clone(),
                color: self.color(),
                font_size: self.font_size(),
            }),
            Interaction::Idle | Interaction::DraggingSelection { .. } | Interaction::Panning { .. } => {
                None
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use inkmark_annot::Selection;

    fn metrics() -> CanvasMetrics {
        CanvasMetrics::unscaled_display(612.0, 792.0, 1.0)
    }

    fn session_with(tool: Tool) -> EditorSession {
        let mut session = EditorSession::default();
        session.set_tool(tool);
        session
    }

    #[test]
    fn rectangle_drag_commits_one_unfilled_rectangle() {
        let mut session = session_with(Tool::Rectangle);
        let m = metrics();
        session.pointer_down(10.0, 10.0, &m, PointerButton::Primary);
        session.pointer_move(60.0, 40.0, &m);
        session.pointer_up(110.0, 60.0, &m);

        let annotations = session.store().page_annotations(1);
        assert_eq!(annotations.len(), 1);
        match &annotations[0] {
            Annotation::Rectangle { start, end, filled, .. } => {
                assert_eq!(*start, Point::new(10.0, 10.0));
                assert_eq!(*end, Point::new(110.0, 60.0));
                assert!(!filled);
            }
            other => panic!("expected rectangle, got {other:?}"),
        }
        assert_eq!(*session.interaction(), Interaction::Idle);
    }

    #[test]
    fn unfilled_rectangle_interior_click_selects_nothing() {
        let mut session = session_with(Tool::Rectangle);
        let m = metrics();
        session.pointer_down(10.0, 10.0, &m, PointerButton::Primary);
        session.pointer_up(110.0, 60.0, &m);

        session.set_tool(Tool::Select);
        session.pointer_down(60.0, 35.0, &m, PointerButton::Primary);
        assert!(session.selection().is_none());

        // The edge does select.
        session.pointer_down(60.0, 11.0, &m, PointerButton::Primary);
        assert_eq!(session.selection(), Some(Selection { page: 1, index: 0 }));
    }

    #[test]
    fn circle_radius_is_euclidean_release_distance() {
        let mut session = session_with(Tool::Circle);
        let m = metrics();
        session.pointer_down(100.0, 100.0, &m, PointerButton::Primary);
        session.pointer_up(103.0, 104.0, &m);

        match &session.store().page_annotations(1)[0] {
            Annotation::Circle { center, radius, .. } => {
                assert_eq!(*center, Point::new(100.0, 100.0));
                assert!((radius - 5.0).abs() < 1e-4);
            }
            other => panic!("expected circle, got {other:?}"),
        }
    }

    #[test]
    fn eraser_forces_width_and_erase_mode() {
        let mut session = session_with(Tool::Eraser);
        session.set_stroke_width(3.0);
        let m = metrics();
        session.pointer_down(10.0, 10.0, &m, PointerButton::Primary);
        session.pointer_move(30.0, 30.0, &m);
        session.pointer_up(30.0, 30.0, &m);

        match &session.store().page_annotations(1)[0] {
            Annotation::Freehand { width, mode, color, points } => {
                assert_eq!(*width, 20.0);
                assert_eq!(*mode, StrokeMode::Erase);
                assert_eq!(*color, Color::WHITE);
                assert_eq!(points.len(), 2);
            }
            other => panic!("expected freehand, got {other:?}"),
        }
    }

    #[test]
    fn freehand_draft_without_samples_is_dropped() {
        let mut session = session_with(Tool::Pen);
        session.interaction = Interaction::DraftingFreehand { points: Vec::new(), erase: false };
        session.pointer_up(0.0, 0.0, &metrics());
        assert!(session.store().is_empty());
    }

    #[test]
    fn overlapping_shapes_select_topmost() {
        let mut session = session_with(Tool::Circle);
        session.set_filled(true);
        let m = metrics();
        session.pointer_down(100.0, 100.0, &m, PointerButton::Primary);
        session.pointer_up(120.0, 100.0, &m);
        session.pointer_down(110.0, 100.0, &m, PointerButton::Primary);
        session.pointer_up(130.0, 100.0, &m);

        session.set_tool(Tool::Select);
        session.pointer_down(105.0, 100.0, &m, PointerButton::Primary);
        assert_eq!(session.selection(), Some(Selection { page: 1, index: 1 }));
    }

    #[test]
    fn drag_applies_incremental_deltas_without_drift() {
        let mut session = session_with(Tool::Rectangle);
        session.set_filled(true);
        let m = metrics();
        session.pointer_down(10.0, 10.0, &m, PointerButton::Primary);
        session.pointer_up(50.0, 50.0, &m);

        session.set_tool(Tool::Select);
        session.pointer_down(30.0, 30.0, &m, PointerButton::Primary);
        // Many tiny moves should sum to exactly the pointer travel.
        for step in 1..=40 {
            session.pointer_move(30.0 + step as f32 * 0.5, 30.0, &m);
        }
        session.pointer_up(50.0, 30.0, &m);

        match &session.store().page_annotations(1)[0] {
            Annotation::Rectangle { start, end, .. } => {
                assert!((start.x - 30.0).abs() < 1e-3);
                assert!((start.y - 10.0).abs() < 1e-3);
                assert!((end.x - 70.0).abs() < 1e-3);
            }
            other => panic!("expected rectangle, got {other:?}"),
        }
        assert_eq!(session.selection(), Some(Selection { page: 1, index: 0 }));
    }

    #[test]
    fn abort_drag_restores_original_exactly() {
        let mut session = session_with(Tool::Line);
        let m = metrics();
        session.pointer_down(10.0, 10.0, &m, PointerButton::Primary);
        session.pointer_up(90.0, 90.0, &m);
        let before = session.store().page_annotations(1)[0].clone();

        session.set_tool(Tool::Select);
        session.pointer_down(50.0, 50.0, &m, PointerButton::Primary);
        session.pointer_move(57.3, 41.9, &m);
        session.pointer_move(63.1, 38.2, &m);
        session.abort_drag();

        assert_eq!(session.store().page_annotations(1)[0], before);
        assert_eq!(*session.interaction(), Interaction::Idle);
    }

    #[test]
    fn select_miss_clears_selection() {
        let mut session = session_with(Tool::Line);
        let m = metrics();
        session.pointer_down(10.0, 10.0, &m, PointerButton::Primary);
        session.pointer_up(90.0, 10.0, &m);

        session.set_tool(Tool::Select);
        session.pointer_down(50.0, 10.0, &m, PointerButton::Primary);
        assert!(session.selection().is_some());

        session.pointer_down(400.0, 400.0, &m, PointerButton::Primary);
        assert!(session.selection().is_none());
    }

    #[test]
    fn middle_button_pans_regardless_of_tool() {
        let mut session = session_with(Tool::Pen);
        let m = metrics();
        session.pointer_down(100.0, 100.0, &m, PointerButton::Middle);
        let delta = session.pointer_move(110.0, 95.0, &m).expect("pan delta");
        assert_eq!(delta, PanDelta { dx: 10.0, dy: -5.0 });

        let delta = session.pointer_move(115.0, 95.0, &m).expect("pan delta");
        assert_eq!(delta, PanDelta { dx: 5.0, dy: 0.0 });

        session.pointer_up(115.0, 95.0, &m);
        assert!(session.store().is_empty());
    }

    #[test]
    fn hit_tolerance_scales_with_zoom() {
        let mut session = session_with(Tool::Line);
        let m = metrics();
        session.pointer_down(10.0, 100.0, &m, PointerButton::Primary);
        session.pointer_up(90.0, 100.0, &m);

        session.set_tool(Tool::Select);
        // At 4x zoom, tolerance shrinks to 2.5 document units, so a
        // click 5 units off the line misses.
        let zoomed = CanvasMetrics::unscaled_display(2448.0, 3168.0, 4.0);
        session.pointer_down(50.0 * 4.0, 105.0 * 4.0, &zoomed, PointerButton::Primary);
        assert!(session.selection().is_none());

        session.pointer_down(50.0 * 4.0, 101.0 * 4.0, &zoomed, PointerButton::Primary);
        assert!(session.selection().is_some());
    }

    #[test]
    fn draft_preview_tracks_pointer() {
        let mut session = session_with(Tool::Arrow);
        let m = metrics();
        session.pointer_down(10.0, 10.0, &m, PointerButton::Primary);
        session.pointer_move(40.0, 50.0, &m);

        match session.draft_annotation() {
            Some(Annotation::Arrow { start, end, .. }) => {
                assert_eq!(start, Point::new(10.0, 10.0));
                assert_eq!(end, Point::new(40.0, 50.0));
            }
            other => panic!("expected arrow draft, got {other:?}"),
        }
        assert!(session.store().is_empty(), "draft is not committed");
    }
}
