//! Single-channel selection mask.
//!
//! A [`MaskBuffer`] stores one alpha value per cell of a fixed extent:
//! `0` is unselected, `255` fully selected, anything in between a
//! partial (feathered) selection. The buffer is always dense; its length
//! equals `width * height`.
//!
//! Storage is an [`image::GrayImage`], which gives direct interop with
//! the rest of the `image`/`imageproc` ecosystem (PNG export, contour
//! following) without a conversion step.

use image::{GrayImage, Luma};
use serde::{Deserialize, Serialize};

use crate::types::{Bounds, Dimensions, EngineError};

/// Alpha above which a cell counts as "inside" the selection.
///
/// A majority threshold rather than `> 0`, so faint feathered fringes do
/// not register as selected.
pub const SELECTION_THRESHOLD: u8 = 128;

/// Dense per-cell alpha buffer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MaskBuffer {
    image: GrayImage,
}

impl MaskBuffer {
    /// An all-zero mask.
    #[must_use]
    pub fn new(extent: Dimensions) -> Self {
        Self {
            image: GrayImage::new(extent.width, extent.height),
        }
    }

    /// A mask with every cell set to `alpha`.
    #[must_use]
    pub fn filled(extent: Dimensions, alpha: u8) -> Self {
        Self {
            image: GrayImage::from_pixel(extent.width, extent.height, Luma([alpha])),
        }
    }

    /// Wrap raw row-major alpha bytes.
    ///
    /// # Errors
    ///
    /// Returns [`EngineError::InvalidMask`] if `data.len() != width * height`.
    pub fn from_raw(width: u32, height: u32, data: Vec<u8>) -> Result<Self, EngineError> {
        let len = data.len();
        if len != Dimensions::new(width, height).pixel_count() {
            return Err(EngineError::InvalidMask { width, height, len });
        }
        GrayImage::from_raw(width, height, data)
            .map(|image| Self { image })
            .ok_or(EngineError::InvalidMask { width, height, len })
    }

    /// Wrap an existing grayscale image.
    #[must_use]
    pub const fn from_image(image: GrayImage) -> Self {
        Self { image }
    }

    /// Extent of the buffer.
    #[must_use]
    pub fn dimensions(&self) -> Dimensions {
        Dimensions::new(self.image.width(), self.image.height())
    }

    /// Width in cells.
    #[must_use]
    pub fn width(&self) -> u32 {
        self.image.width()
    }

    /// Height in cells.
    #[must_use]
    pub fn height(&self) -> u32 {
        self.image.height()
    }

    /// Alpha at `(x, y)`, or `0` when the coordinate is outside the buffer.
    #[must_use]
    pub fn alpha(&self, x: u32, y: u32) -> u8 {
        self.image.get_pixel_checked(x, y).map_or(0, |p| p.0[0])
    }

    /// Alpha at a signed coordinate; outside the buffer reads as `0`.
    #[must_use]
    pub fn alpha_or_zero(&self, x: i64, y: i64) -> u8 {
        match (u32::try_from(x), u32::try_from(y)) {
            (Ok(x), Ok(y)) => self.alpha(x, y),
            _ => 0,
        }
    }

    /// Set the alpha at `(x, y)`. Out-of-range writes are ignored.
    pub fn set_alpha(&mut self, x: u32, y: u32, alpha: u8) {
        if let Some(p) = self.image.get_pixel_mut_checked(x, y) {
            p.0[0] = alpha;
        }
    }

    /// Set `alpha` on cells `x0..x1` of row `y`, clipped to the buffer.
    pub fn fill_span(&mut self, y: u32, x0: u32, x1: u32, alpha: u8) {
        if y >= self.height() {
            return;
        }
        let width = self.width();
        let (x0, x1) = (x0.min(width), x1.min(width));
        if x0 >= x1 {
            return;
        }
        let row_start = y as usize * width as usize;
        let raw: &mut [u8] = &mut self.image;
        raw[row_start + x0 as usize..row_start + x1 as usize].fill(alpha);
    }

    /// Returns `true` if `(x, y)` is inside the selection at `threshold`.
    #[must_use]
    pub fn is_selected(&self, x: u32, y: u32, threshold: u8) -> bool {
        self.alpha(x, y) > threshold
    }

    /// Row-major alpha bytes.
    #[must_use]
    pub fn as_raw(&self) -> &[u8] {
        self.image.as_raw()
    }

    /// Mutable row-major alpha bytes.
    pub fn as_raw_mut(&mut self) -> &mut [u8] {
        &mut self.image
    }

    /// Consume the mask and return its row-major bytes.
    #[must_use]
    pub fn into_raw(self) -> Vec<u8> {
        self.image.into_raw()
    }

    /// Borrow the backing image.
    #[must_use]
    pub const fn as_image(&self) -> &GrayImage {
        &self.image
    }

    /// Returns `true` if no cell has a non-zero alpha.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.as_raw().iter().all(|&a| a == 0)
    }

    /// Number of cells with alpha above `threshold`.
    #[must_use]
    pub fn selected_count(&self, threshold: u8) -> usize {
        self.as_raw().iter().filter(|&&a| a > threshold).count()
    }

    /// Bounding box of all non-zero cells, or `None` for an empty mask.
    #[must_use]
    #[allow(clippy::cast_precision_loss)]
    pub fn nonzero_bounds(&self) -> Option<Bounds> {
        let width = self.width() as usize;
        if width == 0 {
            return None;
        }

        let mut min_x = usize::MAX;
        let mut min_y = usize::MAX;
        let mut max_x = 0;
        let mut max_y = 0;
        for (y, row) in self.as_raw().chunks_exact(width).enumerate() {
            let Some(first) = row.iter().position(|&a| a != 0) else {
                continue;
            };
            let last = row.iter().rposition(|&a| a != 0).unwrap_or(first);
            min_x = min_x.min(first);
            max_x = max_x.max(last);
            min_y = min_y.min(y);
            max_y = y;
        }

        if min_x == usize::MAX {
            return None;
        }

        Some(Bounds::from_edges(
            min_x as f64,
            min_y as f64,
            (max_x + 1) as f64,
            (max_y + 1) as f64,
        ))
    }

    /// Copy into a buffer of a different extent, anchored at the top-left.
    ///
    /// Cells outside the old extent become `0`; cells outside the new
    /// extent are dropped.
    #[must_use]
    pub fn resized(&self, extent: Dimensions) -> Self {
        let mut out = Self::new(extent);
        let copy_w = self.width().min(extent.width) as usize;
        let copy_h = self.height().min(extent.height) as usize;
        let (src_w, dst_w) = (self.width() as usize, extent.width as usize);
        let src = self.as_raw();
        let dst = out.as_raw_mut();
        for y in 0..copy_h {
            dst[y * dst_w..y * dst_w + copy_w].copy_from_slice(&src[y * src_w..y * src_w + copy_w]);
        }
        out
    }
}

/// Serde-compatible proxy for [`MaskBuffer`].
///
/// `image::ImageBuffer` does not implement serde traits, so the mask is
/// represented as `(width, height, raw_bytes)`.
#[derive(Serialize, Deserialize)]
struct MaskBufferProxy(u32, u32, Vec<u8>);

impl Serialize for MaskBuffer {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        MaskBufferProxy(self.width(), self.height(), self.as_raw().to_vec()).serialize(serializer)
    }
}

impl<'de> Deserialize<'de> for MaskBuffer {
    fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let MaskBufferProxy(width, height, data) = MaskBufferProxy::deserialize(deserializer)?;
        Self::from_raw(width, height, data).map_err(serde::de::Error::custom)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const EXTENT: Dimensions = Dimensions::new(8, 6);

    #[test]
    fn new_mask_is_empty_and_dense() {
        let mask = MaskBuffer::new(EXTENT);
        assert!(mask.is_empty());
        assert_eq!(mask.as_raw().len(), EXTENT.pixel_count());
        assert_eq!(mask.nonzero_bounds(), None);
    }

    #[test]
    fn from_raw_rejects_wrong_length() {
        let result = MaskBuffer::from_raw(4, 4, vec![0; 15]);
        assert!(matches!(
            result,
            Err(EngineError::InvalidMask {
                width: 4,
                height: 4,
                len: 15
            })
        ));
    }

    #[test]
    fn from_raw_accepts_exact_length() {
        let mask = MaskBuffer::from_raw(4, 2, vec![7; 8]);
        assert!(mask.is_ok());
    }

    #[test]
    fn outside_reads_zero() {
        let mask = MaskBuffer::filled(EXTENT, 255);
        assert_eq!(mask.alpha(8, 0), 0);
        assert_eq!(mask.alpha_or_zero(-1, 0), 0);
        assert_eq!(mask.alpha_or_zero(0, 6), 0);
        assert_eq!(mask.alpha_or_zero(7, 5), 255);
    }

    #[test]
    fn out_of_range_write_is_ignored() {
        let mut mask = MaskBuffer::new(EXTENT);
        mask.set_alpha(100, 100, 255);
        assert!(mask.is_empty());
    }

    #[test]
    fn fill_span_clips_to_row() {
        let mut mask = MaskBuffer::new(EXTENT);
        mask.fill_span(2, 5, 50, 200);
        assert_eq!(mask.selected_count(0), 3);
        assert_eq!(mask.alpha(4, 2), 0);
        assert_eq!(mask.alpha(5, 2), 200);
        assert_eq!(mask.alpha(7, 2), 200);
        mask.fill_span(9, 0, 8, 255);
        assert_eq!(mask.selected_count(0), 3);
    }

    #[test]
    fn threshold_is_strictly_greater() {
        let mut mask = MaskBuffer::new(EXTENT);
        mask.set_alpha(1, 1, SELECTION_THRESHOLD);
        mask.set_alpha(2, 1, SELECTION_THRESHOLD + 1);
        assert!(!mask.is_selected(1, 1, SELECTION_THRESHOLD));
        assert!(mask.is_selected(2, 1, SELECTION_THRESHOLD));
    }

    #[test]
    fn nonzero_bounds_covers_partial_cells() {
        let mut mask = MaskBuffer::new(EXTENT);
        mask.set_alpha(2, 1, 1);
        mask.set_alpha(5, 4, 255);
        assert_eq!(
            mask.nonzero_bounds(),
            Some(Bounds::new(2.0, 1.0, 4.0, 4.0))
        );
    }

    #[test]
    fn resized_keeps_top_left_content() {
        let mut mask = MaskBuffer::new(EXTENT);
        mask.set_alpha(1, 1, 255);
        mask.set_alpha(7, 5, 255);

        let smaller = mask.resized(Dimensions::new(4, 4));
        assert_eq!(smaller.dimensions(), Dimensions::new(4, 4));
        assert_eq!(smaller.alpha(1, 1), 255);
        assert_eq!(smaller.selected_count(0), 1);

        let larger = mask.resized(Dimensions::new(10, 10));
        assert_eq!(larger.alpha(1, 1), 255);
        assert_eq!(larger.alpha(7, 5), 255);
        assert_eq!(larger.selected_count(0), 2);
    }

    #[test]
    #[allow(clippy::unwrap_used)]
    fn serde_round_trip() {
        let mut mask = MaskBuffer::new(EXTENT);
        mask.fill_span(3, 1, 6, 90);
        let json = serde_json::to_string(&mask).unwrap();
        let back: MaskBuffer = serde_json::from_str(&json).unwrap();
        assert_eq!(back, mask);
    }

    #[test]
    fn deserialize_rejects_inconsistent_length() {
        let result: Result<MaskBuffer, _> = serde_json::from_str("[2,2,[0,0,0]]");
        assert!(result.is_err());
    }
}
