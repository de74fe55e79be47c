//! Serializable selection operations.
//!
//! A [`SelectionOp`] is one user-level edit expressed as data. Gesture
//! handlers, undo journals and the bench CLI all drive a
//! [`SelectionManager`](crate::SelectionManager) through
//! [`apply`](crate::SelectionManager::apply), so a recorded sequence of
//! ops replays to the same selection.
//!
//! Shape coordinates are in view space; the manager maps them to image
//! space with its current reference image.

use serde::{Deserialize, Serialize};

use crate::types::{CombinationMode, PathTransform};

/// One selection edit.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "op", rename_all = "snake_case")]
pub enum SelectionOp {
    /// Axis-aligned rectangle.
    Rectangle {
        x: f64,
        y: f64,
        width: f64,
        height: f64,
        #[serde(default)]
        mode: CombinationMode,
    },
    /// Axis-aligned ellipse.
    Ellipse {
        cx: f64,
        cy: f64,
        rx: f64,
        ry: f64,
        #[serde(default)]
        mode: CombinationMode,
    },
    /// Filled freeform path.
    Path {
        data: String,
        #[serde(default)]
        transform: PathTransform,
        #[serde(default)]
        mode: CombinationMode,
    },
    /// Grow by `pixels` (Chebyshev).
    Expand { pixels: u32 },
    /// Shrink by `pixels` (Chebyshev).
    Contract { pixels: u32 },
    /// Soften edges.
    Feather { radius: f64 },
    /// Swap selected and unselected.
    Invert,
    /// Select the whole canvas.
    SelectAll,
    /// Drop the selection.
    Clear,
}

impl SelectionOp {
    /// Short name used in logs and diagnostics.
    #[must_use]
    pub const fn name(&self) -> &'static str {
        match self {
            Self::Rectangle { .. } => "rectangle",
            Self::Ellipse { .. } => "ellipse",
            Self::Path { .. } => "path",
            Self::Expand { .. } => "expand",
            Self::Contract { .. } => "contract",
            Self::Feather { .. } => "feather",
            Self::Invert => "invert",
            Self::SelectAll => "select_all",
            Self::Clear => "clear",
        }
    }
}
