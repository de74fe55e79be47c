//! Operation diagnostics: timing and selection metrics per edit.
//!
//! Permanent instrumentation for tuning morphology radii and canvas
//! sizes. Timing goes through the [`Clock`] trait so the engine stays
//! platform-agnostic; callers supply an implementation backed by
//! whatever monotonic timer their platform has.
//!
//! Durations are serialized as fractional seconds (`f64`) for JSON
//! compatibility, since `std::time::Duration` does not implement serde
//! traits.

use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::manager::SelectionManager;
use crate::ops::SelectionOp;
use crate::types::{Bounds, Dimensions, EngineError};

/// Serde support for `std::time::Duration` as fractional seconds.
mod duration_serde {
    use std::time::Duration;

    use serde::{Deserialize, Deserializer, Serialize, Serializer};

    pub fn serialize<S: Serializer>(duration: &Duration, serializer: S) -> Result<S::Ok, S::Error> {
        duration.as_secs_f64().serialize(serializer)
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Duration, D::Error> {
        let secs = f64::deserialize(deserializer)?;
        Duration::try_from_secs_f64(secs).map_err(|_| {
            serde::de::Error::custom(
                "duration seconds must be finite, non-negative, and representable as a Duration",
            )
        })
    }
}

/// A monotonic time source.
pub trait Clock {
    /// Opaque point in time.
    type Instant;

    /// The current instant.
    fn now(&self) -> Self::Instant;

    /// Time elapsed since `since`.
    fn elapsed(&self, since: &Self::Instant) -> Duration;
}

/// Diagnostics for one applied [`SelectionOp`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OpDiagnostics {
    /// Operation name (see [`SelectionOp::name`]).
    pub op: String,
    /// Wall-clock duration of the operation (seconds).
    #[serde(with = "duration_serde")]
    pub duration: Duration,
    /// Cells above the manager's threshold afterwards.
    pub selected_pixels: usize,
    /// Cached bounds afterwards; `None` without a selection.
    pub bounds: Option<Bounds>,
    /// Whether the outline can be drawn from the shape descriptor.
    pub shape_exact: bool,
}

/// Diagnostics for a replayed sequence of operations.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SessionDiagnostics {
    /// Canvas the operations ran on.
    pub canvas: Dimensions,
    /// One entry per operation, in order.
    pub ops: Vec<OpDiagnostics>,
    /// Sum of all operation durations (seconds).
    #[serde(with = "duration_serde")]
    pub total_duration: Duration,
}

/// Apply `op` and measure it.
///
/// # Errors
///
/// Propagates the error from [`SelectionManager::apply`].
pub fn apply_with_diagnostics<C: Clock>(
    manager: &mut SelectionManager,
    op: &SelectionOp,
    clock: &C,
) -> Result<OpDiagnostics, EngineError> {
    let start = clock.now();
    manager.apply(op)?;
    let duration = clock.elapsed(&start);

    let threshold = manager.config().threshold;
    let selection = manager.selection();
    Ok(OpDiagnostics {
        op: op.name().to_owned(),
        duration,
        selected_pixels: selection.map_or(0, |s| s.selected_count(threshold)),
        bounds: selection.map(|s| s.bounds),
        shape_exact: selection.is_some_and(|s| s.trusted_shape().is_some()),
    })
}

/// Apply every op in order, stopping at the first error.
///
/// # Errors
///
/// Propagates the first error from [`SelectionManager::apply`]; ops
/// before it stay applied.
pub fn run_script<C: Clock>(
    manager: &mut SelectionManager,
    ops: &[SelectionOp],
    clock: &C,
) -> Result<SessionDiagnostics, EngineError> {
    let ops = ops
        .iter()
        .map(|op| apply_with_diagnostics(manager, op, clock))
        .collect::<Result<Vec<_>, _>>()?;
    let total_duration = ops.iter().map(|d| d.duration).sum();
    Ok(SessionDiagnostics {
        canvas: manager.canvas(),
        ops,
        total_duration,
    })
}

impl SessionDiagnostics {
    /// Format diagnostics as a human-readable report.
    #[must_use]
    pub fn report(&self) -> String {
        let mut lines = Vec::new();

        lines.push(format!("Selection Diagnostics Report\n{}", "=".repeat(60)));
        lines.push(format!(
            "Canvas: {}x{} ({} pixels)",
            self.canvas.width,
            self.canvas.height,
            self.canvas.pixel_count(),
        ));
        lines.push(format!(
            "Total duration: {:.3}ms",
            duration_ms(self.total_duration),
        ));
        lines.push(String::new());

        lines.push(format!(
            "{:<4} {:<12} {:>10} {:>10}  {}",
            "#", "Op", "Duration", "Selected", "Bounds"
        ));
        lines.push("-".repeat(80));

        for (i, diag) in self.ops.iter().enumerate() {
            let ms = duration_ms(diag.duration);
            let bounds = format_bounds(diag.bounds);
            let exact = if diag.shape_exact { "  (exact shape)" } else { "" };
            lines.push(format!(
                "{i:<4} {:<12} {ms:>8.3}ms {:>10}  {bounds}{exact}",
                diag.op, diag.selected_pixels,
            ));
        }

        lines.join("\n")
    }
}

/// Convert a `Duration` to milliseconds as `f64`.
fn duration_ms(d: Duration) -> f64 {
    d.as_secs_f64() * 1000.0
}

fn format_bounds(bounds: Option<Bounds>) -> String {
    match bounds {
        None => "none".to_owned(),
        Some(b) if b.is_empty() => "empty".to_owned(),
        Some(b) => format!("{:.1},{:.1} {:.1}x{:.1}", b.x, b.y, b.width, b.height),
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::manager::SelectionConfig;
    use crate::mask::SELECTION_THRESHOLD;
    use crate::types::CombinationMode;

    /// Every measurement takes exactly one millisecond.
    struct FixedClock;

    impl Clock for FixedClock {
        type Instant = ();

        fn now(&self) {}

        fn elapsed(&self, _since: &()) -> Duration {
            Duration::from_millis(1)
        }
    }

    fn manager() -> SelectionManager {
        SelectionManager::new(SelectionConfig {
            canvas: Dimensions::new(64, 48),
            threshold: SELECTION_THRESHOLD,
        })
    }

    fn script() -> Vec<SelectionOp> {
        vec![
            SelectionOp::Rectangle {
                x: 4.0,
                y: 4.0,
                width: 10.0,
                height: 10.0,
                mode: CombinationMode::Replace,
            },
            SelectionOp::Expand { pixels: 1 },
            SelectionOp::Clear,
        ]
    }

    #[test]
    fn duration_ms_converts_correctly() {
        assert!((duration_ms(Duration::from_micros(1500)) - 1.5).abs() < 1e-9);
    }

    #[test]
    fn single_op_metrics() {
        let mut m = manager();
        let diag = apply_with_diagnostics(&mut m, &script()[0], &FixedClock).unwrap();
        assert_eq!(diag.op, "rectangle");
        assert_eq!(diag.selected_pixels, 100);
        assert_eq!(diag.bounds, Some(Bounds::new(4.0, 4.0, 10.0, 10.0)));
        assert!(diag.shape_exact);
    }

    #[test]
    fn script_collects_every_op() {
        let mut m = manager();
        let session = run_script(&mut m, &script(), &FixedClock).unwrap();
        assert_eq!(session.ops.len(), 3);
        assert_eq!(session.ops[1].selected_pixels, 144);
        assert!(!session.ops[1].shape_exact);
        assert_eq!(session.ops[2].bounds, None);
        assert_eq!(session.total_duration, Duration::from_millis(3));
    }

    #[test]
    fn script_stops_at_first_error() {
        let mut m = manager();
        let ops = vec![
            SelectionOp::SelectAll,
            SelectionOp::Path {
                data: "M 10 banana".to_owned(),
                transform: crate::types::PathTransform::default(),
                mode: CombinationMode::Add,
            },
            SelectionOp::Clear,
        ];
        assert!(run_script(&mut m, &ops, &FixedClock).is_err());
        assert!(m.has_selection());
    }

    #[test]
    fn json_durations_are_seconds() {
        let mut m = manager();
        let session = run_script(&mut m, &script(), &FixedClock).unwrap();
        let json = serde_json::to_value(&session).unwrap();
        assert!((json["total_duration"].as_f64().unwrap() - 0.003).abs() < 1e-12);
        let back: SessionDiagnostics = serde_json::from_value(json).unwrap();
        assert_eq!(back.ops.len(), session.ops.len());
        assert_eq!(back.ops[0].op, "rectangle");
    }

    #[test]
    fn report_lists_ops() {
        let mut m = manager();
        let report = run_script(&mut m, &script(), &FixedClock).unwrap().report();
        assert!(report.contains("Selection Diagnostics Report"));
        assert!(report.contains("rectangle"));
        assert!(report.contains("(exact shape)"));
        assert!(report.contains("none"));
    }
}
