//! marquee-export: Pure serializers for selections (sans-IO).
//!
//! Converts engine output into formats other components consume:
//!
//! - SVG two-tone dashed overlay of the selection outline, for renderers
//! - 8-bit grayscale PNG of the mask, and RGBA PNG of copied-out pixels
//! - JSON documents of a whole selection, for undo journals and save files

pub mod json;
pub mod png;
pub mod svg;

pub use json::{selection_from_json, selection_to_json};
pub use png::{mask_to_png, selected_pixels_to_png};
pub use svg::{OverlayStyle, SvgMetadata, build_path_data, to_overlay_svg};

/// Errors from the export serializers.
#[derive(Debug, thiserror::Error)]
pub enum ExportError {
    /// PNG encoding failed.
    #[error("PNG encoding failed: {0}")]
    Png(#[from] image::ImageError),

    /// JSON (de)serialization failed.
    #[error("selection JSON: {0}")]
    Json(#[from] serde_json::Error),
}
