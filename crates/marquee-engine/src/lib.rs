//! marquee-engine: Pixel selection engine for raster editors (sans-IO).
//!
//! Turns pointer gestures into per-pixel selection masks and back into
//! outlines:
//!
//! view-space gesture -> coordinate mapping -> rasterization ->
//! combination with the current selection -> stored selection ->
//! boundary outline (on demand).
//!
//! This crate has **no I/O dependencies**. It operates on in-memory
//! masks and images and returns structured data. Drawing the outline,
//! animating it and persisting selections is left to the caller; see
//! `marquee-export` for serializers.
//!
//! # Example
//!
//! ```
//! use marquee_engine::{Bounds, CombinationMode, Dimensions, SelectionConfig, SelectionManager};
//!
//! let mut manager = SelectionManager::new(SelectionConfig {
//!     canvas: Dimensions::new(256, 256),
//!     ..SelectionConfig::default()
//! });
//! manager.create_rectangle(Bounds::new(10.0, 10.0, 50.0, 50.0), CombinationMode::Replace)?;
//! manager.create_rectangle(Bounds::new(20.0, 20.0, 10.0, 10.0), CombinationMode::Subtract)?;
//! assert!(manager.is_pixel_selected(12.0, 12.0));
//! assert!(!manager.is_pixel_selected(25.0, 25.0));
//! # Ok::<(), marquee_engine::EngineError>(())
//! ```

pub mod algebra;
pub mod boundary;
pub mod coords;
pub mod diagnostics;
pub mod manager;
pub mod mask;
pub mod ops;
pub mod outline;
pub mod path;
pub mod raster;
pub mod selection;
pub mod types;

pub use boundary::{BoundaryTracer, BoundaryTracerKind};
pub use coords::{CoordinateMapper, Mapping, MappingWarning, ReferenceImage};
pub use diagnostics::{Clock, OpDiagnostics, SessionDiagnostics};
pub use manager::{RestoreOutcome, SelectedPixels, SelectionConfig, SelectionManager};
pub use mask::{MaskBuffer, SELECTION_THRESHOLD};
pub use ops::SelectionOp;
pub use raster::{Rasterized, ShapeRasterizer};
pub use selection::Selection;
pub use types::{
    Affine, Bounds, CombinationMode, Dimensions, EngineError, GrayImage, PathDescriptor,
    PathTransform, Point, Polyline, RgbaImage, ShapeDescriptor,
};
