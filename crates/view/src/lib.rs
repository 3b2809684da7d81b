//! Viewport state shared by the editor and renderer.
//!
//! Two coordinate spaces are in play. Document space is PDF points,
//! origin top-left of the page; everything stored in an annotation is
//! document space. Device space is backing-store pixels of the raster
//! the page is drawn into. The raster is `page_size * scale` pixels,
//! and may additionally be displayed at a different CSS size, so the
//! device transform folds in both ratios.

use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::{Arc, Mutex, PoisonError};

use inkmark_geometry::Point;
use serde::{Deserialize, Serialize};

/// Hit radius in device pixels, before dividing by zoom.
pub const DEFAULT_HIT_TOLERANCE_PX: f32 = 10.0;

/// Additive zoom increment per zoom-in/out step.
pub const ZOOM_STEP: f32 = 0.15;

/// Inclusive zoom bounds.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ZoomLimits {
    pub min: f32,
    pub max: f32,
}

impl Default for ZoomLimits {
    fn default() -> Self {
        Self { min: 0.25, max: 4.0 }
    }
}

impl ZoomLimits {
    pub fn clamp(&self, scale: f32) -> f32 {
        scale.clamp(self.min, self.max)
    }

    pub fn step_in(&self, scale: f32) -> f32 {
        self.clamp(scale + ZOOM_STEP)
    }

    pub fn step_out(&self, scale: f32) -> f32 {
        self.clamp(scale - ZOOM_STEP)
    }
}

/// Geometry of the raster a page is currently drawn into.
///
/// `backing_width`/`backing_height` are the raster's pixel dimensions;
/// `css_width`/`css_height` are the size it occupies on screen. For a
/// plain unscaled surface the two pairs are equal.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CanvasMetrics {
    pub backing_width: f32,
    pub backing_height: f32,
    pub css_width: f32,
    pub css_height: f32,
    /// Current zoom scale (document point -> backing pixel factor).
    pub scale: f32,
}

impl CanvasMetrics {
    /// Metrics for a raster displayed at its native pixel size.
    pub fn unscaled_display(backing_width: f32, backing_height: f32, scale: f32) -> Self {
        Self {
            backing_width,
            backing_height,
            css_width: backing_width,
            css_height: backing_height,
            scale,
        }
    }

    /// Map an on-screen position (relative to the canvas origin, in
    /// CSS units) to document space.
    pub fn device_to_document(&self, x: f32, y: f32) -> Point {
        let backing_x = x * (self.backing_width / self.css_width);
        let backing_y = y * (self.backing_height / self.css_height);
        Point::new(backing_x / self.scale, backing_y / self.scale)
    }

    /// Map a document-space point to on-screen CSS units.
    pub fn document_to_device(&self, point: Point) -> (f32, f32) {
        let backing_x = point.x * self.scale;
        let backing_y = point.y * self.scale;
        (
            backing_x * (self.css_width / self.backing_width),
            backing_y * (self.css_height / self.backing_height),
        )
    }

    /// Document-space hit tolerance for the current zoom.
    ///
    /// Fixed in device pixels so zooming in tightens the document-space
    /// radius and zooming out loosens it, keeping the finger target
    /// constant on screen.
    pub fn hit_tolerance(&self) -> f32 {
        DEFAULT_HIT_TOLERANCE_PX / self.scale
    }
}

/// Cooperative cancellation flag shared between a raster request and
/// the worker servicing it.
#[derive(Debug, Clone, Default)]
pub struct CancellationToken {
    cancelled: Arc<AtomicBool>,
}

impl CancellationToken {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.cancelled.store(true, Ordering::Release);
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancelled.load(Ordering::Acquire)
    }

    pub fn reset(&self) {
        self.cancelled.store(false, Ordering::Release);
    }
}

/// Monotonic ticket dispenser for page raster requests.
///
/// Every request takes a fresh id; when a result arrives, only the
/// holder of the latest id may present it. Results for superseded ids
/// are discarded, so rapid zoom or page flips never paint out of
/// order, whatever order the rasters complete in.
#[derive(Debug, Default)]
pub struct RasterRequestTracker {
    next_id: AtomicU64,
    latest: AtomicU64,
    active: Mutex<CancellationToken>,
}

impl RasterRequestTracker {
    pub fn new() -> Self {
        Self::default()
    }

    /// Issue a new request id, superseding and cancelling the
    /// outstanding request.
    ///
    /// The id draw and the `latest` publish happen under the token
    /// lock, so concurrent callers cannot leave `latest` pointing at
    /// an older id than the one they handed out.
    pub fn begin_request(&self) -> (u64, CancellationToken) {
        let token = CancellationToken::new();
        let mut active = self.active.lock().unwrap_or_else(PoisonError::into_inner);

        let id = self.next_id.fetch_add(1, Ordering::Relaxed) + 1;
        self.latest.store(id, Ordering::Release);
        let superseded = std::mem::replace(&mut *active, token.clone());
        superseded.cancel();

        (id, token)
    }

    /// Whether a completed request with this id is still the one the
    /// viewport wants.
    pub fn is_current(&self, id: u64) -> bool {
        let latest = self.latest.load(Ordering::Acquire);
        if id != latest {
            tracing::debug!(id, latest, "discarding stale raster result");
            return false;
        }
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn device_document_round_trip() {
        let samples = [(0.0, 0.0), (612.0, 792.0), (123.5, 456.25), (1.0, 791.0)];
        for scale in [0.25, 1.0, 1.45, 2.0, 4.0] {
            let metrics = CanvasMetrics {
                backing_width: 612.0 * scale * 2.0,
                backing_height: 792.0 * scale * 2.0,
                css_width: 612.0 * scale,
                css_height: 792.0 * scale,
                scale,
            };
            for (x, y) in samples {
                let doc = metrics.device_to_document(x, y);
                let (back_x, back_y) = metrics.document_to_device(doc);
                assert!((back_x - x).abs() < 1e-2, "scale {scale}, x: {back_x} vs {x}");
                assert!((back_y - y).abs() < 1e-2, "scale {scale}, y: {back_y} vs {y}");
            }
        }
    }

    #[test]
    fn transform_folds_backing_ratio_then_scale() {
        // Raster is 2x the CSS size and zoom is 1.5: a click at CSS
        // (100, 50) lands at backing (200, 100), document (133.33, 66.67).
        let metrics = CanvasMetrics {
            backing_width: 1600.0,
            backing_height: 1200.0,
            css_width: 800.0,
            css_height: 600.0,
            scale: 1.5,
        };
        let doc = metrics.device_to_document(100.0, 50.0);
        assert!((doc.x - 200.0 / 1.5).abs() < 1e-3);
        assert!((doc.y - 100.0 / 1.5).abs() < 1e-3);
    }

    #[test]
    fn hit_tolerance_is_zoom_invariant_on_screen() {
        let zoomed_out = CanvasMetrics::unscaled_display(306.0, 396.0, 0.5);
        let zoomed_in = CanvasMetrics::unscaled_display(2448.0, 3168.0, 4.0);

        // Same on-screen radius, so document radius shrinks with zoom.
        assert!((zoomed_out.hit_tolerance() - 20.0).abs() < 1e-4);
        assert!((zoomed_in.hit_tolerance() - 2.5).abs() < 1e-4);
        assert!(
            (zoomed_out.hit_tolerance() * 0.5 - zoomed_in.hit_tolerance() * 4.0).abs() < 1e-4
        );
    }

    #[test]
    fn zoom_limits_clamp_and_step() {
        let limits = ZoomLimits::default();
        assert_eq!(limits.clamp(10.0), 4.0);
        assert_eq!(limits.clamp(0.01), 0.25);
        assert!((limits.step_in(1.0) - 1.15).abs() < 1e-6);
        assert!((limits.step_out(0.3) - 0.25).abs() < 1e-6);
        assert_eq!(limits.step_in(4.0), 4.0);
    }

    #[test]
    fn stale_request_ids_are_discarded() {
        let tracker = RasterRequestTracker::new();
        let (first, _first_token) = tracker.begin_request();
        let (second, _second_token) = tracker.begin_request();

        assert!(tracker.is_current(second));
        assert!(!tracker.is_current(first));

        let (third, _) = tracker.begin_request();
        assert!(!tracker.is_current(second));
        assert!(tracker.is_current(third));
    }

    #[test]
    fn concurrent_requests_agree_on_the_newest_id() {
        let tracker = RasterRequestTracker::new();

        let ids = std::thread::scope(|scope| {
            let handles: Vec<_> = (0..8)
                .map(|_| {
                    scope.spawn(|| {
                        let mut issued = Vec::new();
                        for _ in 0..50 {
                            issued.push(tracker.begin_request().0);
                        }
                        issued
                    })
                })
                .collect();
            handles
                .into_iter()
                .flat_map(|handle| handle.join().expect("tracker thread"))
                .collect::<Vec<_>>()
        });

        // Exactly the newest id ever issued survives as current.
        let newest = ids.iter().copied().max().expect("ids issued");
        assert_eq!(newest, 8 * 50);
        assert!(tracker.is_current(newest));
        for id in ids {
            if id != newest {
                assert!(!tracker.is_current(id));
            }
        }
    }

    #[test]
    fn superseded_request_token_is_cancelled() {
        let tracker = RasterRequestTracker::new();
        let (_, first_token) = tracker.begin_request();
        assert!(!first_token.is_cancelled());

        let (_, second_token) = tracker.begin_request();
        assert!(first_token.is_cancelled());
        assert!(!second_token.is_cancelled());
    }

    #[test]
    fn cancellation_token_resets() {
        let token = CancellationToken::new();
        assert!(!token.is_cancelled());

        let shared = token.clone();
        token.cancel();
        assert!(shared.is_cancelled());

        token.reset();
        assert!(!shared.is_cancelled());
    }
}
