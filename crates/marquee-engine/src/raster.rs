//! Shape rasterization: vector primitives to masks.
//!
//! Every shape is rasterized into a mask covering the whole working
//! canvas. The canvas is a large, stable extent chosen independently of
//! the current zoom level, so selections are never clipped by what
//! happens to be visible.
//!
//! Rectangles and ellipses are rasterized directly with the cell tests
//! below. Freeform paths are filled with `tiny-skia` (non-zero winding,
//! no anti-aliasing) and the fill's alpha channel becomes the mask.

use tiny_skia::{FillRule, Paint, PathBuilder, Pixmap, Transform};

use crate::mask::MaskBuffer;
use crate::path::{self, PathCommand};
use crate::types::{Affine, Bounds, Dimensions, EngineError, ShapeDescriptor};

/// A freshly rasterized shape.
#[derive(Debug, Clone, PartialEq)]
pub struct Rasterized {
    /// Canvas-sized mask with the shape at full opacity.
    pub mask: MaskBuffer,
    /// The shape's own bounding rectangle in image space, before clipping.
    pub bounds: Bounds,
    /// The primitive the mask was produced from.
    pub shape: ShapeDescriptor,
}

/// Converts shape descriptions into canvas-sized masks.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ShapeRasterizer {
    canvas: Dimensions,
}

impl ShapeRasterizer {
    /// Create a rasterizer for the given canvas extent.
    #[must_use]
    pub const fn new(canvas: Dimensions) -> Self {
        Self { canvas }
    }

    /// The canvas extent every mask is sized to.
    #[must_use]
    pub const fn canvas(&self) -> Dimensions {
        self.canvas
    }

    /// Rasterize an axis-aligned rectangle given in image space.
    ///
    /// Selects every cell in `[floor(x), ceil(x + w)) x [floor(y),
    /// ceil(y + h))`, clipped to the canvas. A non-positive width or
    /// height yields an all-zero mask.
    #[must_use = "returns the rasterized rectangle"]
    pub fn rectangle(&self, x: f64, y: f64, width: f64, height: f64) -> Rasterized {
        let bounds = Bounds::new(x, y, width, height);
        let mut mask = MaskBuffer::new(self.canvas);

        if !bounds.is_empty() {
            let (x0, y0, x1, y1) = bounds.cell_range(self.canvas);
            for row in y0..y1 {
                mask.fill_span(row, x0, x1, u8::MAX);
            }
        }

        Rasterized {
            mask,
            bounds,
            shape: ShapeDescriptor::Rectangle {
                x,
                y,
                width,
                height,
            },
        }
    }

    /// Rasterize an axis-aligned ellipse given in image space.
    ///
    /// Selects every cell `(px, py)` with
    /// `((px - cx) / rx)^2 + ((py - cy) / ry)^2 <= 1`. Returns `None` for
    /// a non-positive radius.
    #[must_use = "returns the rasterized ellipse"]
    pub fn ellipse(&self, cx: f64, cy: f64, rx: f64, ry: f64) -> Option<Rasterized> {
        if rx.is_nan() || ry.is_nan() || rx <= 0.0 || ry <= 0.0 {
            return None;
        }

        let bounds = Bounds::new(cx - rx, cy - ry, 2.0 * rx, 2.0 * ry);
        let mut mask = MaskBuffer::new(self.canvas);
        // Cells exactly on the right/bottom extreme pass the test too.
        let (x0, y0, x1, y1) = bounds.inflate(1.0).cell_range(self.canvas);

        for py in y0..y1 {
            let ny = (f64::from(py) - cy) / ry;
            let ny2 = ny * ny;
            if ny2 > 1.0 {
                continue;
            }
            for px in x0..x1 {
                let nx = (f64::from(px) - cx) / rx;
                if nx.mul_add(nx, ny2) <= 1.0 {
                    mask.set_alpha(px, py, u8::MAX);
                }
            }
        }

        Some(Rasterized {
            mask,
            bounds,
            shape: ShapeDescriptor::Ellipse { cx, cy, rx, ry },
        })
    }

    /// Rasterize a filled freeform path.
    ///
    /// `data` is compact SVG path data; `transform` maps path coordinates
    /// to image space (the path's own transform followed by the
    /// view-to-image mapping). The data string is kept verbatim in the
    /// returned [`ShapeDescriptor::Path`].
    ///
    /// Returns `Ok(None)` when the path has no drawable geometry.
    ///
    /// # Errors
    ///
    /// Returns [`EngineError::PathData`] if `data` cannot be parsed.
    pub fn path(&self, data: &str, transform: &Affine) -> Result<Option<Rasterized>, EngineError> {
        let commands = path::transform(&path::parse(data)?, transform);
        let Some(bounds) = path::bounds(&commands) else {
            return Ok(None);
        };

        let mask = self.fill(&commands);

        Ok(Some(Rasterized {
            mask,
            bounds,
            shape: ShapeDescriptor::Path {
                data: data.to_owned(),
                transform: *transform,
            },
        }))
    }

    /// Fill image-space commands into a canvas-sized mask.
    fn fill(&self, commands: &[PathCommand]) -> MaskBuffer {
        let empty = || MaskBuffer::new(self.canvas);

        let Some(skia_path) = build_skia_path(commands) else {
            return empty();
        };
        let Some(mut pixmap) = Pixmap::new(self.canvas.width, self.canvas.height) else {
            // Zero-sized canvas.
            return empty();
        };

        let mut paint = Paint::default();
        paint.set_color_rgba8(255, 255, 255, 255);
        paint.anti_alias = false;
        pixmap.fill_path(
            &skia_path,
            &paint,
            FillRule::Winding,
            Transform::identity(),
            None,
        );

        let alpha: Vec<u8> = pixmap.data().chunks_exact(4).map(|px| px[3]).collect();
        MaskBuffer::from_raw(self.canvas.width, self.canvas.height, alpha).unwrap_or_else(|_| empty())
    }
}

/// Build a `tiny-skia` path from absolute commands.
///
/// Returns `None` for paths `tiny-skia` considers empty (no area, or
/// only move commands).
#[allow(clippy::cast_possible_truncation)]
fn build_skia_path(commands: &[PathCommand]) -> Option<tiny_skia::Path> {
    let narrow = |v: f64| v as f32;
    let mut pb = PathBuilder::new();
    for command in commands {
        match *command {
            PathCommand::MoveTo(to) => pb.move_to(narrow(to.x), narrow(to.y)),
            PathCommand::LineTo(to) => pb.line_to(narrow(to.x), narrow(to.y)),
            PathCommand::QuadTo(ctrl, to) => {
                pb.quad_to(narrow(ctrl.x), narrow(ctrl.y), narrow(to.x), narrow(to.y));
            }
            PathCommand::CubicTo(ctrl1, ctrl2, to) => pb.cubic_to(
                narrow(ctrl1.x),
                narrow(ctrl1.y),
                narrow(ctrl2.x),
                narrow(ctrl2.y),
                narrow(to.x),
                narrow(to.y),
            ),
            PathCommand::Close => pb.close(),
        }
    }
    pb.finish()
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::panic)]
mod tests {
    use super::*;
    use crate::mask::SELECTION_THRESHOLD;

    const CANVAS: Dimensions = Dimensions::new(100, 80);

    fn rasterizer() -> ShapeRasterizer {
        ShapeRasterizer::new(CANVAS)
    }

    #[test]
    fn mask_is_canvas_sized() {
        let r = rasterizer().rectangle(10.0, 10.0, 5.0, 5.0);
        assert_eq!(r.mask.dimensions(), CANVAS);
    }

    #[test]
    fn rectangle_covers_half_open_cell_range() {
        let r = rasterizer().rectangle(10.0, 20.0, 5.0, 3.0);
        assert_eq!(r.mask.selected_count(SELECTION_THRESHOLD), 15);
        assert_eq!(r.mask.alpha(10, 20), 255);
        assert_eq!(r.mask.alpha(14, 22), 255);
        assert_eq!(r.mask.alpha(15, 22), 0);
        assert_eq!(r.mask.alpha(14, 23), 0);
    }

    #[test]
    fn fractional_rectangle_rounds_outward() {
        let r = rasterizer().rectangle(10.5, 10.5, 1.0, 1.0);
        // floor(10.5)=10 .. ceil(11.5)=12
        assert_eq!(r.mask.selected_count(0), 4);
        assert_eq!(r.mask.alpha(10, 10), 255);
        assert_eq!(r.mask.alpha(11, 11), 255);
    }

    #[test]
    fn degenerate_rectangle_is_empty() {
        assert!(rasterizer().rectangle(10.0, 10.0, 0.0, 5.0).mask.is_empty());
        assert!(rasterizer().rectangle(10.0, 10.0, 5.0, -3.0).mask.is_empty());
    }

    #[test]
    fn rectangle_bounds_are_unclipped() {
        let r = rasterizer().rectangle(90.0, -10.0, 40.0, 20.0);
        assert_eq!(r.bounds, Bounds::new(90.0, -10.0, 40.0, 20.0));
        // Only the in-canvas part is selected: x 90..100, y 0..10.
        assert_eq!(r.mask.selected_count(0), 100);
    }

    #[test]
    fn rectangle_outside_canvas_is_empty() {
        let r = rasterizer().rectangle(500.0, 500.0, 10.0, 10.0);
        assert!(r.mask.is_empty());
    }

    #[test]
    fn ellipse_contains_centre_and_respects_radii() {
        let r = rasterizer().ellipse(50.0, 40.0, 30.0, 20.0).unwrap();
        assert_eq!(r.mask.alpha(50, 40), 255);
        assert_eq!(r.mask.alpha(80, 40), 255); // on the x extreme
        assert_eq!(r.mask.alpha(81, 40), 0);
        assert_eq!(r.mask.alpha(50, 60), 255); // on the y extreme
        assert_eq!(r.mask.alpha(50, 61), 0);
        assert_eq!(r.mask.alpha(75, 55), 0); // corner of the bbox
        assert_eq!(r.bounds, Bounds::new(20.0, 20.0, 60.0, 40.0));
    }

    #[test]
    fn ellipse_rejects_non_positive_radius() {
        assert!(rasterizer().ellipse(50.0, 40.0, 0.0, 20.0).is_none());
        assert!(rasterizer().ellipse(50.0, 40.0, 10.0, -1.0).is_none());
        assert!(rasterizer().ellipse(50.0, 40.0, f64::NAN, 1.0).is_none());
    }

    #[test]
    fn ellipse_partially_off_canvas_is_clipped() {
        let r = rasterizer().ellipse(0.0, 0.0, 10.0, 10.0).unwrap();
        assert_eq!(r.mask.alpha(0, 0), 255);
        assert!(r.mask.selected_count(0) > 0);
        assert_eq!(r.bounds, Bounds::new(-10.0, -10.0, 20.0, 20.0));
    }

    #[test]
    fn path_square_fills_interior() {
        let r = rasterizer()
            .path("M10 10 L30 10 L30 30 L10 30 Z", &Affine::IDENTITY)
            .unwrap()
            .unwrap();
        assert_eq!(r.mask.alpha(20, 20), 255);
        assert_eq!(r.mask.alpha(5, 5), 0);
        assert_eq!(r.mask.alpha(35, 20), 0);
        assert_eq!(r.bounds, Bounds::new(10.0, 10.0, 20.0, 20.0));
        // Hard edged: no partial alpha.
        assert!(r.mask.as_raw().iter().all(|&a| a == 0 || a == 255));
    }

    #[test]
    fn open_path_is_filled_as_if_closed() {
        let r = rasterizer()
            .path("M10 10 L30 10 L30 30 L10 30", &Affine::IDENTITY)
            .unwrap()
            .unwrap();
        assert_eq!(r.mask.alpha(20, 20), 255);
    }

    #[test]
    fn path_transform_is_applied_before_sampling() {
        let t = Affine::scale_translate(2.0, 2.0, 40.0, 0.0);
        let r = rasterizer()
            .path("M0 10 L10 10 L10 20 L0 20 Z", &t)
            .unwrap()
            .unwrap();
        // Square lands at x 40..60, y 20..40.
        assert_eq!(r.mask.alpha(50, 30), 255);
        assert_eq!(r.mask.alpha(5, 15), 0);
        assert_eq!(r.bounds, Bounds::new(40.0, 20.0, 20.0, 20.0));
    }

    #[test]
    fn path_data_is_preserved_verbatim() {
        let data = "m10,10 h20 v20 h-20 z";
        let r = rasterizer().path(data, &Affine::IDENTITY).unwrap().unwrap();
        match r.shape {
            ShapeDescriptor::Path { data: kept, transform } => {
                assert_eq!(kept, data);
                assert_eq!(transform, Affine::IDENTITY);
            }
            other => panic!("expected path shape, got {other:?}"),
        }
    }

    #[test]
    fn empty_path_is_none() {
        assert!(rasterizer().path("", &Affine::IDENTITY).unwrap().is_none());
    }

    #[test]
    fn zero_area_path_gives_empty_mask() {
        let r = rasterizer()
            .path("M10 10 L30 10", &Affine::IDENTITY)
            .unwrap()
            .unwrap();
        assert!(r.mask.is_empty());
    }

    #[test]
    fn malformed_path_is_an_error() {
        let result = rasterizer().path("M 10 banana", &Affine::IDENTITY);
        assert!(matches!(result, Err(EngineError::PathData(_))));
    }
}
