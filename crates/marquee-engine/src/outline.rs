//! Exact vector outlines for pristine shape descriptors.
//!
//! While a selection is still the primitive it was created from, its
//! outline is drawn from the descriptor instead of traced from pixels.

use std::f64::consts::TAU;

use crate::path;
use crate::types::{Point, Polyline, ShapeDescriptor};

/// Longest chord, in image pixels, of an ellipse outline polygon.
const MAX_CHORD: f64 = 2.0;

/// Fewest and most vertices used for an ellipse outline.
const MIN_ELLIPSE_VERTICES: usize = 16;
const MAX_ELLIPSE_VERTICES: usize = 1024;

/// Convert a shape descriptor into closed outline polylines.
///
/// Degenerate rectangles and ellipses produce nothing. Path data that
/// fails to parse produces nothing and logs a warning, since the
/// descriptor was already rasterized successfully once.
#[must_use]
pub fn shape_outline(shape: &ShapeDescriptor) -> Vec<Polyline> {
    match shape {
        ShapeDescriptor::Rectangle {
            x,
            y,
            width,
            height,
        } => rectangle_outline(*x, *y, *width, *height).into_iter().collect(),
        ShapeDescriptor::Ellipse { cx, cy, rx, ry } => {
            ellipse_outline(*cx, *cy, *rx, *ry).into_iter().collect()
        }
        ShapeDescriptor::Path { data, transform } => match path::parse(data) {
            Ok(commands) => path::flatten(&path::transform(&commands, transform))
                .into_iter()
                .map(close)
                .collect(),
            Err(e) => {
                log::warn!("cannot outline stored path: {e}");
                Vec::new()
            }
        },
    }
}

fn rectangle_outline(x: f64, y: f64, width: f64, height: f64) -> Option<Polyline> {
    if width.is_nan() || height.is_nan() || width <= 0.0 || height <= 0.0 {
        return None;
    }
    let (right, bottom) = (x + width, y + height);
    Some(Polyline::new(vec![
        Point::new(x, y),
        Point::new(right, y),
        Point::new(right, bottom),
        Point::new(x, bottom),
        Point::new(x, y),
    ]))
}

/// Polygon approximation with chords no longer than [`MAX_CHORD`].
#[allow(
    clippy::cast_possible_truncation,
    clippy::cast_sign_loss,
    clippy::cast_precision_loss
)]
fn ellipse_outline(cx: f64, cy: f64, rx: f64, ry: f64) -> Option<Polyline> {
    if rx.is_nan() || ry.is_nan() || rx <= 0.0 || ry <= 0.0 {
        return None;
    }
    let vertices = ((TAU * rx.max(ry) / MAX_CHORD).ceil() as usize)
        .clamp(MIN_ELLIPSE_VERTICES, MAX_ELLIPSE_VERTICES);

    let mut points: Vec<Point> = (0..vertices)
        .map(|i| {
            let (sin, cos) = (TAU * i as f64 / vertices as f64).sin_cos();
            Point::new(rx.mul_add(cos, cx), ry.mul_add(sin, cy))
        })
        .collect();
    points.push(points[0]);
    Some(Polyline::new(points))
}

/// Filled paths are implicitly closed; make the outline say so.
fn close(polyline: Polyline) -> Polyline {
    if polyline.is_closed() {
        return polyline;
    }
    let mut points = polyline.into_points();
    if let Some(&first) = points.first() {
        points.push(first);
    }
    Polyline::new(points)
}
