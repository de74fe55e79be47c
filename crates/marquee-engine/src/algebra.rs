//! Selection algebra: boolean combination and morphology.
//!
//! Every operation here is copy-on-write: it reads its inputs and
//! returns a freshly allocated [`Selection`]. Nothing is mutated, so a
//! selection held by an undo snapshot is never affected by later edits.
//!
//! Only the alpha channel takes part; there is no color in the model.
//!
//! | Operation          | Mask                                   | Bounds                         |
//! |--------------------|----------------------------------------|--------------------------------|
//! | `combine` add      | `max(a, b)`                            | union                          |
//! | `combine` subtract | `a.saturating_sub(b)`                  | existing, unchanged            |
//! | `combine` intersect| `min(a, b)`                            | intersection (may be empty)    |
//! | `expand(n)`        | square-window max (Chebyshev dilation) | grown by `n`, clipped          |
//! | `contract(n)`      | square-window min, outside reads `0`   | shrunk by `n`, clipped         |
//! | `feather(r)`       | `ceil(r)` passes of a 3x3 box mean     | grown by `ceil(r)`, clipped    |
//! | `invert`           | `255 - a`                              | full canvas                    |

use crate::mask::MaskBuffer;
use crate::raster::Rasterized;
use crate::selection::Selection;
use crate::types::{CombinationMode, Dimensions, EngineError, ShapeDescriptor};

/// Merge a freshly rasterized shape into the current selection.
///
/// With [`CombinationMode::Replace`], or when there is no current
/// selection, the result is exactly `incoming`. Otherwise masks are
/// combined per cell and the prior shape descriptor is kept as a hint.
///
/// # Errors
///
/// Returns [`EngineError::MaskSize`] if the two masks have different
/// extents.
pub fn combine(
    existing: Option<&Selection>,
    incoming: Rasterized,
    mode: CombinationMode,
) -> Result<Selection, EngineError> {
    let Some(existing) = existing else {
        return Ok(Selection::from(incoming));
    };

    let (op, bounds): (fn(u8, u8) -> u8, _) = match mode {
        CombinationMode::Replace => return Ok(Selection::from(incoming)),
        CombinationMode::Add => (u8::max, existing.bounds.union(&incoming.bounds)),
        CombinationMode::Subtract => (u8::saturating_sub, existing.bounds),
        CombinationMode::Intersect => (u8::min, existing.bounds.intersection(&incoming.bounds)),
    };

    if existing.dimensions() != incoming.mask.dimensions() {
        return Err(EngineError::MaskSize {
            expected: existing.dimensions(),
            actual: incoming.mask.dimensions(),
        });
    }

    let mut mask = existing.mask.clone();
    for (a, &b) in mask.as_raw_mut().iter_mut().zip(incoming.mask.as_raw()) {
        *a = op(*a, b);
    }

    Ok(existing.derived(mask, bounds))
}

/// Dilate: a cell becomes selected if any cell within Chebyshev
/// distance `n` is selected. With partial alpha this is the maximum
/// over the `(2n+1)^2` window.
#[must_use = "returns the expanded selection"]
pub fn expand(selection: &Selection, n: u32) -> Selection {
    if n == 0 {
        return selection.clone();
    }
    let mask = square_filter(&selection.mask, n, Extremum::Max);
    let bounds = selection
        .bounds
        .inflate(f64::from(n))
        .clip_to(selection.dimensions());
    selection.derived(mask, bounds)
}

/// Erode: a cell stays selected only if every cell within Chebyshev
/// distance `n` is selected. Cells outside the buffer count as
/// unselected, so everything within `n` of the canvas edge is cleared.
#[must_use = "returns the contracted selection"]
pub fn contract(selection: &Selection, n: u32) -> Selection {
    if n == 0 {
        return selection.clone();
    }
    let mask = square_filter(&selection.mask, n, Extremum::Min);
    let bounds = selection
        .bounds
        .inflate(-f64::from(n))
        .clip_to(selection.dimensions());
    selection.derived(mask, bounds)
}

/// Soften the selection edge with `ceil(radius)` passes of a 3x3 box
/// blur.
///
/// Each pass replaces a cell with the rounded mean of its in-bounds 3x3
/// neighbourhood (4 cells in a corner, 6 on an edge, 9 inside). This is
/// an approximation of a Gaussian, and the visible box character at
/// large radii is part of the expected look. A non-positive or
/// non-finite radius returns the selection unchanged. The pass count is
/// capped at the longest canvas side.
#[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
#[must_use = "returns the feathered selection"]
pub fn feather(selection: &Selection, radius: f64) -> Selection {
    if !radius.is_finite() || radius <= 0.0 {
        return selection.clone();
    }
    let dims = selection.dimensions();
    let passes = (radius.ceil() as u32).min(dims.width.max(dims.height));

    let mut mask = selection.mask.clone();
    for _ in 0..passes {
        mask = box_blur_3x3(&mask);
    }

    let bounds = selection
        .bounds
        .inflate(f64::from(passes))
        .clip_to(selection.dimensions());
    selection.derived(mask, bounds)
}

/// Invert every cell. With no selection this is [`select_all`].
///
/// Inversion has no compact bounding box in general, so bounds cover the
/// whole canvas.
#[must_use = "returns the inverted selection"]
pub fn invert(selection: Option<&Selection>, canvas: Dimensions) -> Selection {
    let Some(selection) = selection else {
        return select_all(canvas);
    };
    let mut mask = selection.mask.clone();
    for a in mask.as_raw_mut() {
        *a = u8::MAX - *a;
    }
    selection.derived(mask, selection.dimensions().full_bounds())
}

/// Select every cell of the canvas.
#[must_use = "returns the full-canvas selection"]
pub fn select_all(canvas: Dimensions) -> Selection {
    let bounds = canvas.full_bounds();
    Selection {
        mask: MaskBuffer::filled(canvas, u8::MAX),
        bounds,
        shape: Some(ShapeDescriptor::Rectangle {
            x: bounds.x,
            y: bounds.y,
            width: bounds.width,
            height: bounds.height,
        }),
        shape_exact: true,
    }
}

#[derive(Clone, Copy)]
enum Extremum {
    Max,
    Min,
}

#[derive(Clone, Copy)]
enum Axis {
    Horizontal,
    Vertical,
}

/// Max/min over a `(2n+1)^2` square window, done as a horizontal then a
/// vertical 1-D pass. The square window is separable for both max and
/// min, including the "outside reads 0" rule for min.
fn square_filter(mask: &MaskBuffer, n: u32, extremum: Extremum) -> MaskBuffer {
    let dims = mask.dimensions();
    // A radius beyond the longest side reaches every cell already.
    let radius = n.min(dims.width.max(dims.height)) as usize;
    let horizontal = line_filter(mask.as_raw(), dims, radius, extremum, Axis::Horizontal);
    let both = line_filter(&horizontal, dims, radius, extremum, Axis::Vertical);
    let mut out = MaskBuffer::new(dims);
    out.as_raw_mut().copy_from_slice(&both);
    out
}

/// One 1-D max/min pass along `axis`.
fn line_filter(
    src: &[u8],
    dims: Dimensions,
    radius: usize,
    extremum: Extremum,
    axis: Axis,
) -> Vec<u8> {
    let (w, h) = (dims.width as usize, dims.height as usize);
    let (lines, line_len) = match axis {
        Axis::Horizontal => (h, w),
        Axis::Vertical => (w, h),
    };
    let index = |line: usize, pos: usize| match axis {
        Axis::Horizontal => line * w + pos,
        Axis::Vertical => pos * w + line,
    };

    let mut out = vec![0u8; src.len()];
    for line in 0..lines {
        for pos in 0..line_len {
            let lo = pos.saturating_sub(radius);
            let hi = (pos + radius).min(line_len - 1);
            let window = (lo..=hi).map(|p| src[index(line, p)]);
            out[index(line, pos)] = match extremum {
                Extremum::Max => window.max().unwrap_or(0),
                Extremum::Min => {
                    let clipped = pos < radius || pos + radius >= line_len;
                    if clipped { 0 } else { window.min().unwrap_or(0) }
                }
            };
        }
    }
    out
}

/// One pass of a 3x3 mean over in-bounds neighbours, rounded to nearest.
#[allow(clippy::cast_possible_truncation)]
fn box_blur_3x3(mask: &MaskBuffer) -> MaskBuffer {
    let dims = mask.dimensions();
    let (w, h) = (dims.width as usize, dims.height as usize);
    let src = mask.as_raw();
    let mut out = MaskBuffer::new(dims);
    let dst = out.as_raw_mut();

    for y in 0..h {
        let (y0, y1) = (y.saturating_sub(1), (y + 1).min(h - 1));
        for x in 0..w {
            let (x0, x1) = (x.saturating_sub(1), (x + 1).min(w - 1));
            let mut sum = 0u32;
            for row in y0..=y1 {
                sum += src[row * w + x0..=row * w + x1]
                    .iter()
                    .map(|&a| u32::from(a))
                    .sum::<u32>();
            }
            let count = ((y1 - y0 + 1) * (x1 - x0 + 1)) as u32;
            dst[y * w + x] = ((sum + count / 2) / count) as u8;
        }
    }
    out
}
