//! Shared types for the marquee selection engine.

use serde::{Deserialize, Serialize};

/// Re-export `GrayImage` so downstream crates can reference mask storage
/// without depending on `image` directly.
pub use image::GrayImage;

/// Re-export `RgbaImage` so downstream crates can hand source images to
/// [`SelectionManager::selected_pixels`](crate::SelectionManager::selected_pixels)
/// without depending on `image` directly.
pub use image::RgbaImage;

/// A 2D point. Image space unless documented otherwise.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Point {
    /// Horizontal position (pixels from left edge).
    pub x: f64,
    /// Vertical position (pixels from top edge).
    pub y: f64,
}

impl Point {
    /// Create a new point.
    #[must_use]
    pub const fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }

    /// Squared Euclidean distance to another point.
    ///
    /// Avoids the square root for comparison purposes.
    #[must_use]
    pub fn distance_squared(self, other: Self) -> f64 {
        let dx = self.x - other.x;
        let dy = self.y - other.y;
        dx.mul_add(dx, dy * dy)
    }

    /// Euclidean distance to another point.
    #[must_use]
    pub fn distance(self, other: Self) -> f64 {
        self.distance_squared(other).sqrt()
    }
}

/// A sequence of connected points forming an outline segment.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Polyline(Vec<Point>);

impl Polyline {
    /// Create a new polyline from a vector of points.
    #[must_use]
    pub const fn new(points: Vec<Point>) -> Self {
        Self(points)
    }

    /// Returns `true` if the polyline has no points.
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Returns the number of points in the polyline.
    #[must_use]
    pub const fn len(&self) -> usize {
        self.0.len()
    }

    /// Returns the first point, if any.
    #[must_use]
    pub fn first(&self) -> Option<&Point> {
        self.0.first()
    }

    /// Returns the last point, if any.
    #[must_use]
    pub fn last(&self) -> Option<&Point> {
        self.0.last()
    }

    /// Returns a slice of all points.
    #[must_use]
    pub fn points(&self) -> &[Point] {
        &self.0
    }

    /// Consumes the polyline and returns the underlying vector of points.
    #[must_use]
    pub fn into_points(self) -> Vec<Point> {
        self.0
    }

    /// Returns `true` when the polyline has at least three points and
    /// ends where it starts.
    #[must_use]
    pub fn is_closed(&self) -> bool {
        self.0.len() >= 3 && self.0.first() == self.0.last()
    }
}

/// Buffer or image dimensions in pixels.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Dimensions {
    /// Width in pixels.
    pub width: u32,
    /// Height in pixels.
    pub height: u32,
}

impl Dimensions {
    /// Create new dimensions.
    #[must_use]
    pub const fn new(width: u32, height: u32) -> Self {
        Self { width, height }
    }

    /// Total number of cells (`width * height`).
    #[must_use]
    pub const fn pixel_count(self) -> usize {
        self.width as usize * self.height as usize
    }

    /// Bounds covering the whole extent, anchored at the origin.
    #[must_use]
    pub fn full_bounds(self) -> Bounds {
        Bounds::new(0.0, 0.0, f64::from(self.width), f64::from(self.height))
    }
}

/// Axis-aligned rectangle in image-pixel space.
///
/// A bounds with zero (or negative) width or height is *empty*. Empty
/// bounds are legal values: they are what an intersection of disjoint
/// selections or a fully eroded selection reports.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Bounds {
    /// Left edge.
    pub x: f64,
    /// Top edge.
    pub y: f64,
    /// Horizontal extent.
    pub width: f64,
    /// Vertical extent.
    pub height: f64,
}

impl Bounds {
    /// Create new bounds.
    #[must_use]
    pub const fn new(x: f64, y: f64, width: f64, height: f64) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }

    /// Zero-area bounds at the origin.
    #[must_use]
    pub const fn empty() -> Self {
        Self::new(0.0, 0.0, 0.0, 0.0)
    }

    /// Build bounds from edge coordinates. Inverted edges collapse to
    /// zero width/height at `left`/`top`.
    #[must_use]
    pub fn from_edges(left: f64, top: f64, right: f64, bottom: f64) -> Self {
        Self::new(left, top, (right - left).max(0.0), (bottom - top).max(0.0))
    }

    /// Right edge (`x + width`).
    #[must_use]
    pub const fn right(&self) -> f64 {
        self.x + self.width
    }

    /// Bottom edge (`y + height`).
    #[must_use]
    pub const fn bottom(&self) -> f64 {
        self.y + self.height
    }

    /// Returns `true` when the bounds cover no area.
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.width <= 0.0 || self.height <= 0.0
    }

    /// Smallest bounds containing both operands. Empty operands do not
    /// contribute.
    #[must_use]
    pub fn union(&self, other: &Self) -> Self {
        match (self.is_empty(), other.is_empty()) {
            (true, true) => Self::empty(),
            (true, false) => *other,
            (false, true) => *self,
            (false, false) => Self::from_edges(
                self.x.min(other.x),
                self.y.min(other.y),
                self.right().max(other.right()),
                self.bottom().max(other.bottom()),
            ),
        }
    }

    /// Overlap of both operands; zero-area when they are disjoint.
    #[must_use]
    pub fn intersection(&self, other: &Self) -> Self {
        Self::from_edges(
            self.x.max(other.x),
            self.y.max(other.y),
            self.right().min(other.right()),
            self.bottom().min(other.bottom()),
        )
    }

    /// Grow by `amount` on every side. Negative amounts shrink; the
    /// result never has negative size. Empty bounds stay empty.
    #[must_use]
    pub fn inflate(&self, amount: f64) -> Self {
        if self.is_empty() {
            return *self;
        }
        Self::from_edges(
            self.x - amount,
            self.y - amount,
            self.right() + amount,
            self.bottom() + amount,
        )
    }

    /// Clip to a buffer extent anchored at the origin.
    #[must_use]
    pub fn clip_to(&self, extent: Dimensions) -> Self {
        self.intersection(&extent.full_bounds())
    }

    /// Returns `true` if `p` lies inside (left/top inclusive,
    /// right/bottom exclusive).
    #[must_use]
    pub fn contains(&self, p: Point) -> bool {
        p.x >= self.x && p.y >= self.y && p.x < self.right() && p.y < self.bottom()
    }

    /// Integer cell range `(x0, y0, x1, y1)` covered by these bounds,
    /// clipped to `extent`. End coordinates are exclusive.
    #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
    #[must_use]
    pub fn cell_range(&self, extent: Dimensions) -> (u32, u32, u32, u32) {
        let clamp_x = |v: f64| v.clamp(0.0, f64::from(extent.width)) as u32;
        let clamp_y = |v: f64| v.clamp(0.0, f64::from(extent.height)) as u32;
        let x0 = clamp_x(self.x.floor());
        let y0 = clamp_y(self.y.floor());
        let x1 = clamp_x(self.right().ceil()).max(x0);
        let y1 = clamp_y(self.bottom().ceil()).max(y0);
        (x0, y0, x1, y1)
    }
}

/// How a newly drawn shape is merged with the current selection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CombinationMode {
    /// Discard the current selection.
    #[default]
    Replace,
    /// Union: per-cell maximum.
    Add,
    /// Difference: per-cell saturating subtraction.
    Subtract,
    /// Intersection: per-cell minimum.
    Intersect,
}

/// 2x3 affine matrix.
///
/// Maps `(x, y)` to `(a*x + c*y + e, b*x + d*y + f)`, the same layout as
/// SVG's `matrix(a b c d e f)`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Affine {
    /// X scale component.
    pub a: f64,
    /// Y shear component.
    pub b: f64,
    /// X shear component.
    pub c: f64,
    /// Y scale component.
    pub d: f64,
    /// X translation.
    pub e: f64,
    /// Y translation.
    pub f: f64,
}

impl Default for Affine {
    fn default() -> Self {
        Self::IDENTITY
    }
}

impl Affine {
    /// The identity transform.
    pub const IDENTITY: Self = Self {
        a: 1.0,
        b: 0.0,
        c: 0.0,
        d: 1.0,
        e: 0.0,
        f: 0.0,
    };

    /// Axis-aligned scale followed by a translation.
    #[must_use]
    pub const fn scale_translate(sx: f64, sy: f64, tx: f64, ty: f64) -> Self {
        Self {
            a: sx,
            b: 0.0,
            c: 0.0,
            d: sy,
            e: tx,
            f: ty,
        }
    }

    /// Scale, then rotate (degrees, clockwise in y-down space), then
    /// translate.
    #[must_use]
    pub fn from_components(transform: &PathTransform) -> Self {
        let (sin, cos) = transform.rotation.to_radians().sin_cos();
        Self {
            a: transform.scale_x * cos,
            b: transform.scale_x * sin,
            c: -transform.scale_y * sin,
            d: transform.scale_y * cos,
            e: transform.translate_x,
            f: transform.translate_y,
        }
    }

    /// Returns the transform that applies `self` first, then `next`.
    #[must_use]
    pub fn then(&self, next: &Self) -> Self {
        Self {
            a: next.a.mul_add(self.a, next.c * self.b),
            b: next.b.mul_add(self.a, next.d * self.b),
            c: next.a.mul_add(self.c, next.c * self.d),
            d: next.b.mul_add(self.c, next.d * self.d),
            e: next.a.mul_add(self.e, next.c.mul_add(self.f, next.e)),
            f: next.b.mul_add(self.e, next.d.mul_add(self.f, next.f)),
        }
    }

    /// Apply the transform to a point.
    #[must_use]
    pub fn apply(&self, p: Point) -> Point {
        Point::new(
            self.a.mul_add(p.x, self.c.mul_add(p.y, self.e)),
            self.b.mul_add(p.x, self.d.mul_add(p.y, self.f)),
        )
    }

    /// Returns `true` when the matrix has a non-zero determinant.
    #[must_use]
    pub fn is_invertible(&self) -> bool {
        self.a.mul_add(self.d, -(self.b * self.c)).abs() > f64::EPSILON
    }
}

/// Translation, rotation and scale carried by a freeform path.
///
/// Applied in the order scale, rotate, translate (see
/// [`Affine::from_components`]).
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PathTransform {
    /// Horizontal translation.
    pub translate_x: f64,
    /// Vertical translation.
    pub translate_y: f64,
    /// Rotation in degrees.
    pub rotation: f64,
    /// Horizontal scale factor.
    pub scale_x: f64,
    /// Vertical scale factor.
    pub scale_y: f64,
}

impl Default for PathTransform {
    fn default() -> Self {
        Self {
            translate_x: 0.0,
            translate_y: 0.0,
            rotation: 0.0,
            scale_x: 1.0,
            scale_y: 1.0,
        }
    }
}

/// A freeform path as handed over by the drawing layer, in view space.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PathDescriptor {
    /// Compact SVG path command data (`"M0 0 L10 0 ..."`), kept verbatim.
    pub data: String,
    /// The path object's own transform.
    #[serde(default)]
    pub transform: PathTransform,
}

impl PathDescriptor {
    /// Create a descriptor with an identity transform.
    #[must_use]
    pub fn new(data: impl Into<String>) -> Self {
        Self {
            data: data.into(),
            transform: PathTransform::default(),
        }
    }
}

/// The vector primitive a selection was created from, in image space.
///
/// Retained so the outline can be drawn exactly instead of traced from
/// pixels while the selection is still a pristine primitive.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ShapeDescriptor {
    /// Axis-aligned rectangle.
    Rectangle {
        x: f64,
        y: f64,
        width: f64,
        height: f64,
    },
    /// Axis-aligned ellipse given by centre and radii.
    Ellipse { cx: f64, cy: f64, rx: f64, ry: f64 },
    /// Freeform path: verbatim command data plus the full
    /// path-to-image transform.
    Path { data: String, transform: Affine },
}

/// Errors reported by the selection engine.
///
/// Degenerate geometry is never an error (it yields empty masks); these
/// cover malformed input and buffer inconsistencies.
#[derive(Debug, thiserror::Error)]
pub enum EngineError {
    /// Path command data could not be parsed.
    #[error("invalid path data: {0}")]
    PathData(String),

    /// Two masks with different extents were combined.
    #[error(
        "mask size mismatch: expected {}x{}, got {}x{}",
        expected.width, expected.height, actual.width, actual.height
    )]
    MaskSize {
        /// Extent of the existing mask.
        expected: Dimensions,
        /// Extent of the incoming mask.
        actual: Dimensions,
    },

    /// Raw mask bytes do not match the declared extent.
    #[error("mask data has {len} bytes, expected {width}x{height}")]
    InvalidMask {
        /// Declared width.
        width: u32,
        /// Declared height.
        height: u32,
        /// Actual byte count.
        len: usize,
    },
}

#[cfg(test)]
mod tests {
    use super::*;

    // --- Point / Polyline ---

    #[test]
    fn point_distance() {
        let a = Point::new(0.0, 0.0);
        let b = Point::new(3.0, 4.0);
        assert!((a.distance(b) - 5.0).abs() < f64::EPSILON);
        assert!((a.distance_squared(b) - 25.0).abs() < f64::EPSILON);
    }

    #[test]
    fn polyline_closed_detection() {
        let open = Polyline::new(vec![Point::new(0.0, 0.0), Point::new(1.0, 0.0)]);
        assert!(!open.is_closed());
        let closed = Polyline::new(vec![
            Point::new(0.0, 0.0),
            Point::new(1.0, 0.0),
            Point::new(1.0, 1.0),
            Point::new(0.0, 0.0),
        ]);
        assert!(closed.is_closed());
    }

    // --- Bounds ---

    #[test]
    fn union_ignores_empty_operand() {
        let a = Bounds::new(10.0, 10.0, 5.0, 5.0);
        assert_eq!(a.union(&Bounds::empty()), a);
        assert_eq!(Bounds::empty().union(&a), a);
    }

    #[test]
    fn union_covers_both() {
        let a = Bounds::new(0.0, 0.0, 10.0, 10.0);
        let b = Bounds::new(20.0, 5.0, 10.0, 10.0);
        assert_eq!(a.union(&b), Bounds::new(0.0, 0.0, 30.0, 15.0));
    }

    #[test]
    fn disjoint_intersection_is_empty() {
        let a = Bounds::new(0.0, 0.0, 10.0, 10.0);
        let b = Bounds::new(20.0, 20.0, 10.0, 10.0);
        assert!(a.intersection(&b).is_empty());
    }

    #[test]
    fn overlapping_intersection() {
        let a = Bounds::new(0.0, 0.0, 10.0, 10.0);
        let b = Bounds::new(5.0, 5.0, 10.0, 10.0);
        assert_eq!(a.intersection(&b), Bounds::new(5.0, 5.0, 5.0, 5.0));
    }

    #[test]
    fn inflate_negative_never_goes_below_zero() {
        let a = Bounds::new(10.0, 10.0, 4.0, 4.0);
        let shrunk = a.inflate(-3.0);
        assert!(shrunk.is_empty());
        assert!(shrunk.width >= 0.0 && shrunk.height >= 0.0);
    }

    #[test]
    fn inflate_empty_stays_empty() {
        let empty = Bounds::new(50.0, 50.0, 0.0, 0.0);
        assert_eq!(empty.inflate(3.0), empty);
        assert_eq!(empty.inflate(-3.0), empty);
    }

    #[test]
    fn clip_to_extent() {
        let a = Bounds::new(-5.0, 90.0, 20.0, 20.0);
        let clipped = a.clip_to(Dimensions::new(100, 100));
        assert_eq!(clipped, Bounds::new(0.0, 90.0, 15.0, 10.0));
    }

    #[test]
    fn cell_range_rounds_outward_and_clips() {
        let b = Bounds::new(1.5, 2.2, 3.0, 3.0);
        assert_eq!(b.cell_range(Dimensions::new(100, 100)), (1, 2, 5, 6));
        let off = Bounds::new(-10.0, -10.0, 5.0, 5.0);
        assert_eq!(off.cell_range(Dimensions::new(100, 100)), (0, 0, 0, 0));
    }

    // --- Affine ---

    #[test]
    fn affine_components_order_is_scale_rotate_translate() {
        let t = Affine::from_components(&PathTransform {
            translate_x: 10.0,
            translate_y: 20.0,
            rotation: 90.0,
            scale_x: 2.0,
            scale_y: 2.0,
        });
        let p = t.apply(Point::new(1.0, 0.0));
        // (1,0) -> scale (2,0) -> rotate 90deg (0,2) -> translate (10,22)
        assert!((p.x - 10.0).abs() < 1e-9, "x = {}", p.x);
        assert!((p.y - 22.0).abs() < 1e-9, "y = {}", p.y);
    }

    #[test]
    fn affine_then_composes_in_order() {
        let scale = Affine::scale_translate(2.0, 3.0, 0.0, 0.0);
        let shift = Affine::scale_translate(1.0, 1.0, 5.0, -5.0);
        let p = scale.then(&shift).apply(Point::new(1.0, 1.0));
        assert_eq!(p, Point::new(7.0, -2.0));
    }

    #[test]
    fn degenerate_scale_is_not_invertible() {
        assert!(!Affine::scale_translate(0.0, 1.0, 0.0, 0.0).is_invertible());
        assert!(Affine::IDENTITY.is_invertible());
    }

    // --- serde ---

    #[test]
    #[allow(clippy::unwrap_used)]
    fn shape_descriptor_is_tagged() {
        let shape = ShapeDescriptor::Ellipse {
            cx: 1.0,
            cy: 2.0,
            rx: 3.0,
            ry: 4.0,
        };
        let json = serde_json::to_string(&shape).unwrap();
        assert!(json.contains(r#""kind":"ellipse""#), "got {json}");
        let back: ShapeDescriptor = serde_json::from_str(&json).unwrap();
        assert_eq!(back, shape);
    }

    #[test]
    #[allow(clippy::unwrap_used)]
    fn combination_mode_serializes_lowercase() {
        let json = serde_json::to_string(&CombinationMode::Intersect).unwrap();
        assert_eq!(json, r#""intersect""#);
    }

    #[test]
    #[allow(clippy::unwrap_used)]
    fn path_descriptor_transform_defaults_to_identity() {
        let desc: PathDescriptor = serde_json::from_str(r#"{"data":"M0 0 L1 0 L1 1 Z"}"#).unwrap();
        assert_eq!(desc.transform, PathTransform::default());
    }
}
