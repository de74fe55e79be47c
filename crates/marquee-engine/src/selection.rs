//! The selection aggregate: mask, cached bounds and originating shape.

use serde::{Deserialize, Serialize};

use crate::mask::MaskBuffer;
use crate::raster::Rasterized;
use crate::types::{Bounds, Dimensions, ShapeDescriptor};

/// The current selection.
///
/// `bounds` is a cached summary used to limit rendering and copy-out
/// work; see the individual operations in [`crate::algebra`] for how
/// each one updates it.
///
/// `shape` is the vector primitive the selection was last created from.
/// It is only an exact description of the mask while `shape_exact` is
/// `true`; any combination or morphology turns it into a hint and pixel
/// tracing becomes the authority for the outline.
///
/// Serializes as the mask (`[width, height, bytes]`) plus bounds and the
/// optional shape, which is what undo journals and save files store.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Selection {
    /// Per-cell selection strength.
    pub mask: MaskBuffer,
    /// Cached bounds in image space.
    pub bounds: Bounds,
    /// Originating primitive, if any.
    pub shape: Option<ShapeDescriptor>,
    /// Whether `shape` still describes `mask` exactly.
    #[serde(default)]
    pub shape_exact: bool,
}

impl Selection {
    /// Build a selection from explicit parts.
    ///
    /// The shape is trusted as exact only if one is supplied.
    #[must_use]
    pub const fn new(mask: MaskBuffer, bounds: Bounds, shape: Option<ShapeDescriptor>) -> Self {
        let shape_exact = shape.is_some();
        Self {
            mask,
            bounds,
            shape,
            shape_exact,
        }
    }

    /// Extent of the underlying mask.
    #[must_use]
    pub fn dimensions(&self) -> Dimensions {
        self.mask.dimensions()
    }

    /// Returns `true` if no cell carries any selection weight.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.mask.is_empty()
    }

    /// Number of cells above `threshold`.
    #[must_use]
    pub fn selected_count(&self, threshold: u8) -> usize {
        self.mask.selected_count(threshold)
    }

    /// The originating shape, but only while it is still exact.
    #[must_use]
    pub fn trusted_shape(&self) -> Option<&ShapeDescriptor> {
        self.shape.as_ref().filter(|_| self.shape_exact)
    }

    /// Same mask and bounds, shape demoted to a hint.
    #[must_use]
    pub(crate) fn derived(&self, mask: MaskBuffer, bounds: Bounds) -> Self {
        Self {
            mask,
            bounds,
            shape: self.shape.clone(),
            shape_exact: false,
        }
    }
}

impl From<Rasterized> for Selection {
    fn from(r: Rasterized) -> Self {
        Self {
            mask: r.mask,
            bounds: r.bounds,
            shape: Some(r.shape),
            shape_exact: true,
        }
    }
}
