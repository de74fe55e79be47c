//! The selection manager: one live selection over a fixed canvas.
//!
//! Every shape operation runs the same pipeline:
//!
//! 1. map view-space input to image space ([`CoordinateMapper`])
//! 2. rasterize into a canvas-sized mask ([`ShapeRasterizer`])
//! 3. merge with the current selection ([`algebra::combine`])
//! 4. store the result as the current selection
//!
//! The canvas is sized once from [`SelectionConfig`] and is independent
//! of viewport zoom, so selections are never clipped by what happens to
//! be visible.
//!
//! All operations run synchronously to completion. A later call always
//! sees the full effect of an earlier one.

use image::{Rgba, RgbaImage};
use serde::{Deserialize, Serialize};

use crate::algebra;
use crate::boundary::{BoundaryTracer, BoundaryTracerKind};
use crate::coords::{CoordinateMapper, MappingWarning, ReferenceImage};
use crate::mask::SELECTION_THRESHOLD;
use crate::ops::SelectionOp;
use crate::outline::shape_outline;
use crate::raster::{Rasterized, ShapeRasterizer};
use crate::selection::Selection;
use crate::types::{
    Affine, Bounds, CombinationMode, Dimensions, EngineError, PathDescriptor, Point, Polyline,
};

/// Default canvas edge length in pixels.
pub const DEFAULT_CANVAS_SIZE: u32 = 2048;

/// Configuration for a [`SelectionManager`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SelectionConfig {
    /// Extent of every mask the manager creates.
    pub canvas: Dimensions,
    /// Alpha above which a cell counts as selected.
    pub threshold: u8,
}

impl Default for SelectionConfig {
    fn default() -> Self {
        Self {
            canvas: Dimensions::new(DEFAULT_CANVAS_SIZE, DEFAULT_CANVAS_SIZE),
            threshold: SELECTION_THRESHOLD,
        }
    }
}

/// Result of [`SelectionManager::restore_selection`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum RestoreOutcome {
    /// The selection matched the canvas and was restored as-is.
    Restored,
    /// The selection was sized for another canvas and was cropped or
    /// padded (anchored top-left) to fit.
    Resized {
        /// Extent of the stored mask.
        from: Dimensions,
        /// Extent of this manager's canvas.
        to: Dimensions,
    },
}

/// Pixels copied out of a source image through the selection mask.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SelectedPixels {
    /// Left edge of the patch in image space.
    pub origin_x: u32,
    /// Top edge of the patch in image space.
    pub origin_y: u32,
    /// The patch; alpha is source alpha scaled by mask alpha.
    pub image: RgbaImage,
}

/// Owns the current selection and the canvas it lives on.
#[derive(Debug, Clone)]
pub struct SelectionManager {
    config: SelectionConfig,
    rasterizer: ShapeRasterizer,
    mapper: CoordinateMapper,
    selection: Option<Selection>,
}

impl Default for SelectionManager {
    fn default() -> Self {
        Self::new(SelectionConfig::default())
    }
}

impl SelectionManager {
    /// A manager with no selection and an identity view mapping.
    #[must_use]
    pub const fn new(config: SelectionConfig) -> Self {
        Self {
            config,
            rasterizer: ShapeRasterizer::new(config.canvas),
            mapper: CoordinateMapper::IDENTITY,
            selection: None,
        }
    }

    /// The active configuration.
    #[must_use]
    pub const fn config(&self) -> &SelectionConfig {
        &self.config
    }

    /// Extent of the selection canvas.
    #[must_use]
    pub const fn canvas(&self) -> Dimensions {
        self.config.canvas
    }

    /// Current view-to-image mapping.
    #[must_use]
    pub const fn mapper(&self) -> &CoordinateMapper {
        &self.mapper
    }

    /// Update the view mapping after a reference image change, pan or
    /// zoom.
    ///
    /// Returns the warning if the mapping fell back to identity. Not
    /// fatal: subsequent gestures still work in unscaled view space.
    pub fn set_reference(&mut self, reference: Option<&ReferenceImage>) -> Option<MappingWarning> {
        let mapping = CoordinateMapper::from_reference(reference);
        self.mapper = mapping.mapper;
        mapping.warning
    }

    /// Set the view mapping directly.
    pub const fn set_mapper(&mut self, mapper: CoordinateMapper) {
        self.mapper = mapper;
    }

    // --- shape creation ---

    /// Select a view-space rectangle.
    ///
    /// # Errors
    ///
    /// Returns [`EngineError::MaskSize`] if the current selection does
    /// not match the canvas (only possible through direct field access).
    pub fn create_rectangle(&mut self, rect: Bounds, mode: CombinationMode) -> Result<(), EngineError> {
        let r = self.mapper.to_image_rect(rect);
        let incoming = self.rasterizer.rectangle(r.x, r.y, r.width, r.height);
        self.merge(incoming, mode)
    }

    /// Select a view-space ellipse. Non-positive radii are a no-op.
    ///
    /// # Errors
    ///
    /// See [`create_rectangle`](Self::create_rectangle).
    pub fn create_ellipse(
        &mut self,
        center: Point,
        rx: f64,
        ry: f64,
        mode: CombinationMode,
    ) -> Result<(), EngineError> {
        let c = self.mapper.to_image_point(center);
        let (rx, ry) = (rx * self.mapper.scale_x(), ry * self.mapper.scale_y());
        self.rasterizer.ellipse(c.x, c.y, rx, ry).map_or_else(
            || {
                log::debug!("ellipse with radii {rx}x{ry} ignored");
                Ok(())
            },
            |incoming| self.merge(incoming, mode),
        )
    }

    /// Select a filled freeform path. The path's own transform is
    /// applied before the view-to-image mapping. A path without
    /// geometry is a no-op.
    ///
    /// # Errors
    ///
    /// Returns [`EngineError::PathData`] if the path data cannot be
    /// parsed. The current selection is left untouched.
    pub fn create_from_path(
        &mut self,
        path: &PathDescriptor,
        mode: CombinationMode,
    ) -> Result<(), EngineError> {
        let transform = Affine::from_components(&path.transform).then(&self.mapper.affine());
        self.rasterizer.path(&path.data, &transform)?.map_or_else(
            || {
                log::debug!("path without geometry ignored");
                Ok(())
            },
            |incoming| self.merge(incoming, mode),
        )
    }

    fn merge(&mut self, incoming: Rasterized, mode: CombinationMode) -> Result<(), EngineError> {
        let merged = algebra::combine(self.selection.as_ref(), incoming, mode)?;
        log::debug!(
            "{mode:?}: {} cells selected, bounds {:?}",
            merged.selected_count(self.config.threshold),
            merged.bounds,
        );
        self.selection = Some(merged);
        Ok(())
    }

    // --- morphology ---

    /// Dilate the selection by `n` cells. No-op without a selection.
    pub fn expand(&mut self, n: u32) {
        self.transform("expand", |s| algebra::expand(s, n));
    }

    /// Erode the selection by `n` cells. No-op without a selection.
    pub fn contract(&mut self, n: u32) {
        self.transform("contract", |s| algebra::contract(s, n));
    }

    /// Feather the selection edge. No-op without a selection.
    pub fn feather(&mut self, radius: f64) {
        self.transform("feather", |s| algebra::feather(s, radius));
    }

    fn transform(&mut self, name: &str, f: impl FnOnce(&Selection) -> Selection) {
        let Some(current) = &self.selection else {
            log::debug!("{name}: no selection");
            return;
        };
        let next = f(current);
        log::debug!("{name}: bounds {:?} -> {:?}", current.bounds, next.bounds);
        self.selection = Some(next);
    }

    /// Invert the selection; with no selection, select everything.
    pub fn invert(&mut self) {
        log::debug!("invert");
        self.selection = Some(algebra::invert(self.selection.as_ref(), self.canvas()));
    }

    /// Select the whole canvas.
    pub fn select_all(&mut self) {
        log::debug!("select all");
        self.selection = Some(algebra::select_all(self.canvas()));
    }

    /// Drop the current selection.
    pub fn clear(&mut self) {
        if self.selection.take().is_some() {
            log::debug!("selection cleared");
        }
    }

    /// Release the selection buffer. The manager stays usable.
    pub fn dispose(&mut self) {
        self.clear();
    }

    // --- queries ---

    /// Returns `true` if a selection exists.
    #[must_use]
    pub const fn has_selection(&self) -> bool {
        self.selection.is_some()
    }

    /// The current selection.
    ///
    /// Borrowed: clone it (or use [`snapshot`](Self::snapshot)) to keep
    /// it across a later mutating call.
    #[must_use]
    pub const fn selection(&self) -> Option<&Selection> {
        self.selection.as_ref()
    }

    /// Cached bounds of the current selection.
    #[must_use]
    pub fn bounds(&self) -> Option<Bounds> {
        self.selection.as_ref().map(|s| s.bounds)
    }

    /// An owned copy for undo stacks and persistence.
    #[must_use]
    pub fn snapshot(&self) -> Option<Selection> {
        self.selection.clone()
    }

    /// Mask alpha at the nearest cell to an image-space point; `0` when
    /// there is no selection or the point is off the canvas.
    #[allow(clippy::cast_possible_truncation)]
    #[must_use]
    pub fn alpha_at(&self, x: f64, y: f64) -> u8 {
        let Some(selection) = &self.selection else {
            return 0;
        };
        if !x.is_finite() || !y.is_finite() {
            return 0;
        }
        selection
            .mask
            .alpha_or_zero(x.round() as i64, y.round() as i64)
    }

    /// Whether the nearest cell to an image-space point is selected
    /// (alpha above the configured threshold).
    #[must_use]
    pub fn is_pixel_selected(&self, x: f64, y: f64) -> bool {
        self.alpha_at(x, y) > self.config.threshold
    }

    /// Copy the selected region out of an image-space source image.
    ///
    /// The patch covers the selection bounds clipped to both the canvas
    /// and the source. Each pixel keeps its color; its alpha is scaled by
    /// `mask / 255`, so feathered edges fade out.
    ///
    /// Returns `None` without a selection or when the clipped bounds are
    /// empty.
    #[allow(clippy::cast_possible_truncation)]
    #[must_use]
    pub fn selected_pixels(&self, source: &RgbaImage) -> Option<SelectedPixels> {
        let selection = self.selection.as_ref()?;
        let extent = Dimensions::new(
            source.width().min(selection.mask.width()),
            source.height().min(selection.mask.height()),
        );
        let (x0, y0, x1, y1) = selection.bounds.cell_range(extent);
        if x0 >= x1 || y0 >= y1 {
            return None;
        }

        let image = RgbaImage::from_fn(x1 - x0, y1 - y0, |px, py| {
            let (sx, sy) = (x0 + px, y0 + py);
            let Rgba([r, g, b, a]) = *source.get_pixel(sx, sy);
            let m = u16::from(selection.mask.alpha(sx, sy));
            let scaled = (u16::from(a) * m + 127) / 255;
            Rgba([r, g, b, scaled as u8])
        });

        Some(SelectedPixels {
            origin_x: x0,
            origin_y: y0,
            image,
        })
    }

    /// Rehydrate a previously serialized selection.
    ///
    /// A selection sized for another canvas is a recoverable
    /// inconsistency: its mask is cropped or padded (anchored top-left),
    /// its bounds are clipped, its shape is kept only as a hint, and the
    /// condition is logged and reported.
    pub fn restore_selection(&mut self, selection: Selection) -> RestoreOutcome {
        let canvas = self.canvas();
        let from = selection.dimensions();
        if from == canvas {
            log::debug!("selection restored");
            self.selection = Some(selection);
            return RestoreOutcome::Restored;
        }

        log::warn!(
            "restored selection is {}x{}, canvas is {}x{}; resizing",
            from.width,
            from.height,
            canvas.width,
            canvas.height,
        );
        self.selection = Some(Selection {
            mask: selection.mask.resized(canvas),
            bounds: selection.bounds.clip_to(canvas),
            shape: selection.shape,
            shape_exact: false,
        });
        RestoreOutcome::Resized { from, to: canvas }
    }

    /// Outline of the current selection, in image space.
    ///
    /// Uses the exact shape outline while the selection is still the
    /// primitive it was created from, and traces the mask with `tracer`
    /// otherwise. Empty without a selection.
    #[must_use]
    pub fn outline(&self, tracer: BoundaryTracerKind) -> Vec<Polyline> {
        let Some(selection) = &self.selection else {
            return Vec::new();
        };
        selection.trusted_shape().map_or_else(
            || tracer.trace(&selection.mask, self.config.threshold),
            shape_outline,
        )
    }

    /// Apply a scripted operation.
    ///
    /// # Errors
    ///
    /// Propagates errors from the shape operations.
    pub fn apply(&mut self, op: &SelectionOp) -> Result<(), EngineError> {
        match op {
            SelectionOp::Rectangle {
                x,
                y,
                width,
                height,
                mode,
            } => self.create_rectangle(Bounds::new(*x, *y, *width, *height), *mode),
            SelectionOp::Ellipse {
                cx,
                cy,
                rx,
                ry,
                mode,
            } => self.create_ellipse(Point::new(*cx, *cy), *rx, *ry, *mode),
            SelectionOp::Path {
                data,
                transform,
                mode,
            } => self.create_from_path(
                &PathDescriptor {
                    data: data.clone(),
                    transform: *transform,
                },
                *mode,
            ),
            SelectionOp::Expand { pixels } => {
                self.expand(*pixels);
                Ok(())
            }
            SelectionOp::Contract { pixels } => {
                self.contract(*pixels);
                Ok(())
            }
            SelectionOp::Feather { radius } => {
                self.feather(*radius);
                Ok(())
            }
            SelectionOp::Invert => {
                self.invert();
                Ok(())
            }
            SelectionOp::SelectAll => {
                self.select_all();
                Ok(())
            }
            SelectionOp::Clear => {
                self.clear();
                Ok(())
            }
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::types::{PathTransform, ShapeDescriptor};

    fn manager() -> SelectionManager {
        SelectionManager::new(SelectionConfig {
            canvas: Dimensions::new(200, 150),
            threshold: SELECTION_THRESHOLD,
        })
    }

    fn rect(m: &mut SelectionManager, x: f64, y: f64, w: f64, h: f64, mode: CombinationMode) {
        m.create_rectangle(Bounds::new(x, y, w, h), mode).unwrap();
    }

    #[test]
    fn default_config() {
        let config = SelectionConfig::default();
        assert_eq!(config.canvas, Dimensions::new(2048, 2048));
        assert_eq!(config.threshold, 128);
    }

    #[test]
    fn config_fields_default_individually() {
        let config: SelectionConfig = serde_json::from_str(r#"{"threshold":10}"#).unwrap();
        assert_eq!(config.canvas, Dimensions::new(2048, 2048));
        assert_eq!(config.threshold, 10);
    }

    // Scenario: rectangle hit testing.
    #[test]
    fn rectangle_hit_test() {
        let mut m = manager();
        rect(&mut m, 10.0, 10.0, 50.0, 50.0, CombinationMode::Replace);
        assert!(m.is_pixel_selected(30.0, 30.0));
        assert!(!m.is_pixel_selected(5.0, 5.0));
    }

    // Scenario: subtract punches a hole.
    #[test]
    fn subtract_punches_hole() {
        let mut m = manager();
        rect(&mut m, 0.0, 0.0, 100.0, 100.0, CombinationMode::Replace);
        rect(&mut m, 40.0, 40.0, 20.0, 20.0, CombinationMode::Subtract);
        assert!(!m.is_pixel_selected(50.0, 50.0));
        assert!(m.is_pixel_selected(10.0, 10.0));
    }

    // Scenario: invert an ellipse.
    #[test]
    fn invert_ellipse() {
        let mut m = manager();
        m.create_ellipse(Point::new(50.0, 50.0), 30.0, 20.0, CombinationMode::Replace)
            .unwrap();
        assert!(m.is_pixel_selected(50.0, 50.0));
        m.invert();
        assert_eq!(m.bounds(), Some(m.canvas().full_bounds()));
        assert!(!m.is_pixel_selected(50.0, 50.0));
    }

    // Scenario: expand a single pixel.
    #[test]
    fn expand_single_pixel() {
        let mut m = manager();
        rect(&mut m, 20.0, 20.0, 1.0, 1.0, CombinationMode::Replace);
        m.expand(3);
        assert!(m.is_pixel_selected(22.0, 22.0));
        assert!(!m.is_pixel_selected(25.0, 25.0));
    }

    // Scenario: feather softens the boundary.
    #[test]
    fn feather_rectangle_boundary() {
        let mut m = manager();
        rect(&mut m, 20.0, 20.0, 60.0, 60.0, CombinationMode::Replace);
        m.feather(2.0);
        let a = m.alpha_at(20.0, 50.0);
        assert!(a > 0 && a < 255, "alpha {a}");
    }

    #[test]
    fn replace_is_idempotent() {
        let mut m = manager();
        rect(&mut m, 10.0, 10.0, 30.0, 30.0, CombinationMode::Replace);
        let once = m.snapshot();
        rect(&mut m, 10.0, 10.0, 30.0, 30.0, CombinationMode::Replace);
        assert_eq!(m.snapshot(), once);
    }

    #[test]
    fn morphology_without_selection_is_noop() {
        let mut m = manager();
        m.expand(3);
        m.contract(3);
        m.feather(2.0);
        assert!(!m.has_selection());
    }

    #[test]
    fn invert_without_selection_selects_all() {
        let mut m = manager();
        m.invert();
        assert!(m.is_pixel_selected(0.0, 0.0));
        assert!(m.is_pixel_selected(199.0, 149.0));
    }

    #[test]
    fn clear_and_dispose_drop_selection() {
        let mut m = manager();
        m.select_all();
        m.clear();
        assert!(!m.has_selection());
        assert_eq!(m.bounds(), None);
        m.select_all();
        m.dispose();
        assert!(m.selection().is_none());
    }

    #[test]
    fn is_pixel_selected_rounds_to_nearest() {
        let mut m = manager();
        rect(&mut m, 10.0, 10.0, 5.0, 5.0, CombinationMode::Replace);
        assert!(m.is_pixel_selected(9.6, 10.0));
        assert!(!m.is_pixel_selected(9.4, 10.0));
        assert!(!m.is_pixel_selected(f64::NAN, 10.0));
        assert!(!m.is_pixel_selected(-1.0, 10.0));
    }

    #[test]
    fn view_mapping_applies_to_shapes() {
        let mut m = manager();
        let warning = m.set_reference(Some(&ReferenceImage {
            natural: Dimensions::new(200, 150),
            display: Bounds::new(100.0, 50.0, 100.0, 75.0),
        }));
        assert_eq!(warning, None);
        // View (110, 60)-(120, 70) is image (20, 20)-(40, 40).
        rect(&mut m, 110.0, 60.0, 10.0, 10.0, CombinationMode::Replace);
        assert_eq!(m.bounds(), Some(Bounds::new(20.0, 20.0, 20.0, 20.0)));

        m.create_ellipse(Point::new(150.0, 87.5), 10.0, 10.0, CombinationMode::Replace)
            .unwrap();
        assert_eq!(m.bounds(), Some(Bounds::new(80.0, 55.0, 40.0, 40.0)));
    }

    #[test]
    fn missing_reference_warns_and_uses_identity() {
        let mut m = manager();
        assert_eq!(m.set_reference(None), Some(MappingWarning::NoReferenceImage));
        assert!(m.mapper().is_identity());
    }

    #[test]
    fn degenerate_ellipse_is_noop() {
        let mut m = manager();
        rect(&mut m, 10.0, 10.0, 5.0, 5.0, CombinationMode::Replace);
        let before = m.snapshot();
        m.create_ellipse(Point::new(50.0, 50.0), 0.0, 20.0, CombinationMode::Replace)
            .unwrap();
        assert_eq!(m.snapshot(), before);
    }

    #[test]
    fn path_transform_then_mapping() {
        let mut m = manager();
        m.set_mapper(CoordinateMapper::new(2.0, 2.0, 0.0, 0.0));
        let path = PathDescriptor {
            data: "M0 0 L10 0 L10 10 L0 10 Z".to_owned(),
            transform: PathTransform {
                translate_x: 5.0,
                translate_y: 5.0,
                ..PathTransform::default()
            },
        };
        m.create_from_path(&path, CombinationMode::Replace).unwrap();
        // Path (0..10) -> translate (5..15) -> scale x2 (10..30).
        assert!(m.is_pixel_selected(20.0, 20.0));
        assert!(!m.is_pixel_selected(8.0, 8.0));
        assert!(!m.is_pixel_selected(32.0, 32.0));
        let Some(ShapeDescriptor::Path { data, .. }) = m.selection().and_then(|s| s.shape.clone())
        else {
            unreachable!("path selection keeps its shape");
        };
        assert_eq!(data, path.data);
    }

    #[test]
    fn bad_path_leaves_selection_untouched() {
        let mut m = manager();
        m.select_all();
        let before = m.snapshot();
        let result = m.create_from_path(&PathDescriptor::new("M 10 banana"), CombinationMode::Add);
        assert!(matches!(result, Err(EngineError::PathData(_))));
        assert_eq!(m.snapshot(), before);
    }

    #[test]
    fn selected_pixels_scale_alpha() {
        let mut m = manager();
        rect(&mut m, 10.0, 10.0, 40.0, 40.0, CombinationMode::Replace);
        m.feather(1.0);
        let source = RgbaImage::from_pixel(100, 100, Rgba([10, 20, 30, 200]));
        let patch = m.selected_pixels(&source).unwrap();
        assert_eq!((patch.origin_x, patch.origin_y), (9, 9));
        assert_eq!(patch.image.dimensions(), (42, 42));
        // Deep inside: full mask, source alpha kept.
        assert_eq!(*patch.image.get_pixel(20, 20), Rgba([10, 20, 30, 200]));
        // Just outside the original edge: alpha 85 -> 200 * 85 / 255.
        assert_eq!(patch.image.get_pixel(0, 20).0[3], 67);
    }

    #[test]
    fn selected_pixels_clip_to_source() {
        let mut m = manager();
        rect(&mut m, 50.0, 50.0, 100.0, 100.0, CombinationMode::Replace);
        let source = RgbaImage::from_pixel(80, 60, Rgba([255, 255, 255, 255]));
        let patch = m.selected_pixels(&source).unwrap();
        assert_eq!(patch.image.dimensions(), (30, 10));
    }

    #[test]
    fn selected_pixels_without_selection_is_none() {
        let source = RgbaImage::new(10, 10);
        assert!(manager().selected_pixels(&source).is_none());
    }

    #[test]
    fn selected_pixels_of_grown_empty_selection_is_none() {
        let mut m = manager();
        rect(&mut m, 0.0, 0.0, 10.0, 10.0, CombinationMode::Replace);
        rect(&mut m, 50.0, 50.0, 10.0, 10.0, CombinationMode::Intersect);
        m.expand(3);
        let source = RgbaImage::from_pixel(100, 100, Rgba([1, 2, 3, 255]));
        assert!(m.selected_pixels(&source).is_none());
    }

    #[test]
    fn restore_round_trip() {
        let mut m = manager();
        m.create_ellipse(Point::new(60.0, 60.0), 25.0, 15.0, CombinationMode::Replace)
            .unwrap();
        m.expand(2);
        let saved = m.snapshot().unwrap();
        m.clear();
        assert_eq!(m.restore_selection(saved.clone()), RestoreOutcome::Restored);
        assert_eq!(m.selection(), Some(&saved));
    }

    #[test]
    fn restore_mismatched_size_resizes() {
        let mut other = SelectionManager::new(SelectionConfig {
            canvas: Dimensions::new(300, 100),
            threshold: SELECTION_THRESHOLD,
        });
        other.select_all();
        let saved = other.snapshot().unwrap();

        let mut m = manager();
        let outcome = m.restore_selection(saved);
        assert_eq!(
            outcome,
            RestoreOutcome::Resized {
                from: Dimensions::new(300, 100),
                to: Dimensions::new(200, 150),
            }
        );
        let restored = m.selection().unwrap();
        assert_eq!(restored.dimensions(), m.canvas());
        assert!(m.is_pixel_selected(199.0, 99.0));
        assert!(!m.is_pixel_selected(10.0, 120.0));
        assert!(restored.trusted_shape().is_none());
    }

    #[test]
    fn outline_prefers_trusted_shape() {
        let mut m = manager();
        rect(&mut m, 10.0, 10.0, 20.0, 20.0, CombinationMode::Replace);
        let exact = m.outline(BoundaryTracerKind::EdgeWalk);
        assert_eq!(exact.len(), 1);
        assert_eq!(exact[0].len(), 5);

        rect(&mut m, 50.0, 50.0, 20.0, 20.0, CombinationMode::Add);
        let traced = m.outline(BoundaryTracerKind::EdgeWalk);
        assert_eq!(traced.len(), 8);
    }

    #[test]
    fn outline_without_selection_is_empty() {
        assert!(manager().outline(BoundaryTracerKind::EdgeWalk).is_empty());
    }

    #[test]
    fn apply_dispatches_ops() {
        let mut m = manager();
        let ops = [
            SelectionOp::Rectangle {
                x: 0.0,
                y: 0.0,
                width: 100.0,
                height: 100.0,
                mode: CombinationMode::Replace,
            },
            SelectionOp::Rectangle {
                x: 40.0,
                y: 40.0,
                width: 20.0,
                height: 20.0,
                mode: CombinationMode::Subtract,
            },
            SelectionOp::Contract { pixels: 1 },
        ];
        for op in &ops {
            m.apply(op).unwrap();
        }
        assert!(!m.is_pixel_selected(50.0, 50.0));
        assert!(m.is_pixel_selected(10.0, 10.0));
        assert!(!m.is_pixel_selected(0.0, 0.0));
        m.apply(&SelectionOp::Clear).unwrap();
        assert!(!m.has_selection());
    }
}
