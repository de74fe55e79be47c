//! View space <-> image space coordinate mapping.
//!
//! Pointer gestures arrive in the editor's view space, which is subject
//! to zoom and pan. Masks are indexed in the reference image's pixel
//! space. The mapping between the two is a per-axis scale plus an offset
//! derived from the image's natural size and its displayed rectangle.
//!
//! No clamping happens here: out-of-range results are valid and are
//! clipped at rasterization time.

use serde::{Deserialize, Serialize};

use crate::types::{Affine, Bounds, Dimensions, Point};

/// The reference image a selection is drawn over.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ReferenceImage {
    /// Natural pixel dimensions of the image.
    pub natural: Dimensions,
    /// Where the image is currently displayed, in view space.
    pub display: Bounds,
}

/// Why a mapper fell back to the identity transform.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum MappingWarning {
    /// No reference image is loaded.
    NoReferenceImage,
    /// The displayed rectangle has zero or negative size.
    DegenerateDisplay,
}

/// A mapper together with the non-fatal condition that produced it, if any.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Mapping {
    /// The mapper to use; identity when a warning is present.
    pub mapper: CoordinateMapper,
    /// Why the identity fallback was taken.
    pub warning: Option<MappingWarning>,
}

/// Per-axis scale and offset from view space to image space.
///
/// `image = (view - offset) * scale`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CoordinateMapper {
    scale_x: f64,
    scale_y: f64,
    offset_x: f64,
    offset_y: f64,
}

impl Default for CoordinateMapper {
    fn default() -> Self {
        Self::IDENTITY
    }
}

impl CoordinateMapper {
    /// Scale 1, offset 0.
    pub const IDENTITY: Self = Self {
        scale_x: 1.0,
        scale_y: 1.0,
        offset_x: 0.0,
        offset_y: 0.0,
    };

    /// Create a mapper from explicit parameters.
    #[must_use]
    pub const fn new(scale_x: f64, scale_y: f64, offset_x: f64, offset_y: f64) -> Self {
        Self {
            scale_x,
            scale_y,
            offset_x,
            offset_y,
        }
    }

    /// Derive the mapping for a reference image.
    ///
    /// `scale = natural / displayed` per axis, offset = displayed
    /// top-left. Without a usable reference image the mapping is the
    /// identity and the returned [`Mapping::warning`] says why.
    #[must_use]
    pub fn from_reference(reference: Option<&ReferenceImage>) -> Mapping {
        let Some(reference) = reference else {
            log::warn!("no reference image; mapping view coordinates 1:1");
            return Mapping {
                mapper: Self::IDENTITY,
                warning: Some(MappingWarning::NoReferenceImage),
            };
        };

        let display = reference.display;
        if display.is_empty() {
            log::warn!(
                "reference image displayed at degenerate size {}x{}; mapping view coordinates 1:1",
                display.width,
                display.height,
            );
            return Mapping {
                mapper: Self::IDENTITY,
                warning: Some(MappingWarning::DegenerateDisplay),
            };
        }

        Mapping {
            mapper: Self {
                scale_x: f64::from(reference.natural.width) / display.width,
                scale_y: f64::from(reference.natural.height) / display.height,
                offset_x: display.x,
                offset_y: display.y,
            },
            warning: None,
        }
    }

    /// Horizontal scale (image pixels per view unit).
    #[must_use]
    pub const fn scale_x(&self) -> f64 {
        self.scale_x
    }

    /// Vertical scale (image pixels per view unit).
    #[must_use]
    pub const fn scale_y(&self) -> f64 {
        self.scale_y
    }

    /// View-space position of the image's top-left corner.
    #[must_use]
    pub const fn offset(&self) -> Point {
        Point::new(self.offset_x, self.offset_y)
    }

    /// Returns `true` for scale 1 and offset 0.
    #[must_use]
    #[allow(clippy::float_cmp)]
    pub fn is_identity(&self) -> bool {
        *self == Self::IDENTITY
    }

    /// Map a view-space point into image space.
    #[must_use]
    pub fn to_image_point(&self, p: Point) -> Point {
        Point::new(
            (p.x - self.offset_x) * self.scale_x,
            (p.y - self.offset_y) * self.scale_y,
        )
    }

    /// Map a view-space rectangle into image space.
    #[must_use]
    pub fn to_image_rect(&self, r: Bounds) -> Bounds {
        let origin = self.to_image_point(Point::new(r.x, r.y));
        Bounds::new(
            origin.x,
            origin.y,
            r.width * self.scale_x,
            r.height * self.scale_y,
        )
    }

    /// Map an image-space point back into view space.
    ///
    /// Meaningful only when both scales are non-zero.
    #[must_use]
    pub fn to_view_point(&self, p: Point) -> Point {
        Point::new(
            p.x / self.scale_x + self.offset_x,
            p.y / self.scale_y + self.offset_y,
        )
    }

    /// Map an image-space rectangle back into view space.
    #[must_use]
    pub fn to_view_rect(&self, r: Bounds) -> Bounds {
        let origin = self.to_view_point(Point::new(r.x, r.y));
        Bounds::new(
            origin.x,
            origin.y,
            r.width / self.scale_x,
            r.height / self.scale_y,
        )
    }

    /// The view-to-image mapping as an affine transform.
    #[must_use]
    pub fn affine(&self) -> Affine {
        Affine::scale_translate(
            self.scale_x,
            self.scale_y,
            -self.offset_x * self.scale_x,
            -self.offset_y * self.scale_y,
        )
    }
}
