//! Boundary tracing: polylines along a mask's inside/outside transitions.
//!
//! This module defines the [`BoundaryTracer`] trait for pluggable tracing
//! algorithms and the [`BoundaryTracerKind`] enum for selecting one at
//! runtime. Output is in image space and is meant to be drawn as a
//! dashed overlay at display scale, so staircase approximation of
//! diagonal edges is acceptable.

use image::{GrayImage, Luma};
use serde::{Deserialize, Serialize};

use crate::mask::MaskBuffer;
use crate::types::{Point, Polyline};

/// Selects which boundary tracing algorithm to use.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum BoundaryTracerKind {
    /// Single-direction transition walk on pixel corners.
    ///
    /// Horizontal transitions (cell above vs. below) are scanned row by
    /// row, then vertical transitions (cell left vs. right) column by
    /// column. Each maximal run with constant polarity becomes one
    /// 2-point polyline. A filled rectangle yields exactly four segments.
    #[default]
    EdgeWalk,

    /// Suzuki-Abe border following via `imageproc::contours::find_contours`
    /// on the thresholded mask.
    ///
    /// Produces one closed polyline per border, on cell coordinates
    /// rather than pixel corners.
    BorderFollowing,
}

/// Trait for boundary tracing strategies.
///
/// A cell is inside when its alpha is strictly greater than `threshold`.
/// Cells outside the mask count as outside.
pub trait BoundaryTracer {
    /// Trace the selection boundary of `mask`.
    fn trace(&self, mask: &MaskBuffer, threshold: u8) -> Vec<Polyline>;
}

impl BoundaryTracer for BoundaryTracerKind {
    fn trace(&self, mask: &MaskBuffer, threshold: u8) -> Vec<Polyline> {
        match *self {
            Self::EdgeWalk => trace_edge_walk(mask, threshold),
            Self::BorderFollowing => trace_border_following(mask, threshold),
        }
    }
}

/// Polarity of a transition: which side of the edge is inside.
#[derive(Clone, Copy, PartialEq, Eq)]
enum Side {
    Before,
    After,
}

const fn transition(before: bool, after: bool) -> Option<Side> {
    match (before, after) {
        (true, false) => Some(Side::Before),
        (false, true) => Some(Side::After),
        _ => None,
    }
}

fn trace_edge_walk(mask: &MaskBuffer, threshold: u8) -> Vec<Polyline> {
    let (w, h) = (i64::from(mask.width()), i64::from(mask.height()));
    let inside = |x: i64, y: i64| mask.alpha_or_zero(x, y) > threshold;
    let mut out = Vec::new();

    // Horizontal edges lie on row lines y = 0..=h.
    for y in 0..=h {
        walk_line(w, |x| transition(inside(x, y - 1), inside(x, y)), |x0, x1| {
            out.push(segment(x0, y, x1, y));
        });
    }

    // Vertical edges lie on column lines x = 0..=w.
    for x in 0..=w {
        walk_line(h, |y| transition(inside(x - 1, y), inside(x, y)), |y0, y1| {
            out.push(segment(x, y0, x, y1));
        });
    }

    out
}

/// Walk positions `0..len`, calling `emit(start, end)` for every maximal
/// run of equal, present transitions.
fn walk_line(
    len: i64,
    mut at: impl FnMut(i64) -> Option<Side>,
    mut emit: impl FnMut(i64, i64),
) {
    let mut pos = 0;
    while pos < len {
        let Some(side) = at(pos) else {
            pos += 1;
            continue;
        };
        let start = pos;
        while pos < len && at(pos) == Some(side) {
            pos += 1;
        }
        emit(start, pos);
    }
}

#[allow(clippy::cast_precision_loss)]
fn segment(x0: i64, y0: i64, x1: i64, y1: i64) -> Polyline {
    Polyline::new(vec![
        Point::new(x0 as f64, y0 as f64),
        Point::new(x1 as f64, y1 as f64),
    ])
}

fn trace_border_following(mask: &MaskBuffer, threshold: u8) -> Vec<Polyline> {
    let binary = GrayImage::from_fn(mask.width(), mask.height(), |x, y| {
        Luma([if mask.alpha(x, y) > threshold { 255 } else { 0 }])
    });
    let contours: Vec<imageproc::contours::Contour<u32>> =
        imageproc::contours::find_contours(&binary);

    contours
        .into_iter()
        .filter(|c| c.points.len() >= 2)
        .map(|c| {
            let mut points: Vec<Point> = c
                .points
                .into_iter()
                .map(|p| Point::new(f64::from(p.x), f64::from(p.y)))
                .collect();
            if let Some(&first) = points.first() {
                points.push(first);
            }
            Polyline::new(points)
        })
        .collect()
}
