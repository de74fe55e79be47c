//! marquee-bench: CLI tool for replaying selection scripts and collecting
//! diagnostics.
//!
//! Applies a JSON list of selection operations to a fresh canvas,
//! printing per-operation timing and selection metrics. Useful for:
//!
//! - Measuring morphology cost against canvas size and radius
//! - Comparing boundary tracers on the same selection
//! - Producing overlay SVGs, mask PNGs and copy-out patches for
//!   visual inspection
//!
//! # Usage
//!
//! ```text
//! cargo run --release --bin marquee-bench -- [OPTIONS] (--ops-json <JSON> | --ops-file <PATH>)
//! ```
//!
//! Example script:
//!
//! ```text
//! [{"op":"ellipse","cx":400,"cy":300,"rx":200,"ry":120},
//!  {"op":"rectangle","x":350,"y":250,"width":100,"height":100,"mode":"subtract"},
//!  {"op":"feather","radius":3}]
//! ```

#![allow(clippy::print_stdout, clippy::print_stderr)]

use std::path::{Path, PathBuf};
use std::process::ExitCode;
use std::time::{Duration, Instant};

use clap::{Parser, ValueEnum};
use marquee_engine::diagnostics::{Clock, SessionDiagnostics, run_script};
use marquee_engine::{
    BoundaryTracerKind, Dimensions, RgbaImage, SelectionConfig, SelectionManager, SelectionOp,
};

/// Selection script replay and diagnostics for marquee.
///
/// Replays selection operations on a fresh canvas and prints detailed
/// per-operation timing and selection metrics.
#[derive(Parser)]
#[command(name = "marquee-bench", version)]
struct Cli {
    /// Operations as an inline JSON array.
    #[arg(long, conflicts_with = "ops_file", required_unless_present = "ops_file")]
    ops_json: Option<String>,

    /// Read the JSON operation array from a file.
    #[arg(long)]
    ops_file: Option<PathBuf>,

    /// Canvas width in pixels (defaults to the source image width, or
    /// the engine default without one).
    #[arg(long, value_parser = clap::builder::RangedU64ValueParser::<u32>::new().range(1..))]
    width: Option<u32>,

    /// Canvas height in pixels (defaults to the source image height, or
    /// the engine default without one).
    #[arg(long, value_parser = clap::builder::RangedU64ValueParser::<u32>::new().range(1..))]
    height: Option<u32>,

    /// Selection threshold (alpha strictly above counts as selected).
    #[arg(long, default_value_t = marquee_engine::SELECTION_THRESHOLD)]
    threshold: u8,

    /// Full selection config as a JSON string.
    ///
    /// When provided, `--width`, `--height` and `--threshold` are
    /// ignored. The JSON must be a valid `SelectionConfig`
    /// serialization; missing fields take their defaults.
    #[arg(long)]
    config_json: Option<String>,

    /// Source image (PNG, JPEG, BMP, WebP) to copy selected pixels from.
    #[arg(long)]
    image: Option<PathBuf>,

    /// Write the copied-out patch as PNG (requires `--image`).
    #[arg(long, requires = "image")]
    patch: Option<PathBuf>,

    /// Write the outline overlay as SVG.
    #[arg(long)]
    svg: Option<PathBuf>,

    /// Write the final mask as grayscale PNG.
    #[arg(long)]
    mask_png: Option<PathBuf>,

    /// Boundary tracer used for non-primitive selections.
    #[arg(long, value_enum, default_value_t = Tracer::EdgeWalk)]
    tracer: Tracer,

    /// Number of runs for averaging.
    #[arg(long, default_value_t = 1, value_parser = clap::builder::RangedU64ValueParser::<usize>::new().range(1..))]
    runs: usize,

    /// Output diagnostics as JSON instead of human-readable report.
    #[arg(long)]
    json: bool,
}

/// Boundary tracer selection.
#[derive(Clone, Copy, ValueEnum)]
enum Tracer {
    /// Single-direction transition walk on pixel corners.
    EdgeWalk,
    /// Suzuki-Abe border following.
    BorderFollowing,
}

impl From<Tracer> for BoundaryTracerKind {
    fn from(t: Tracer) -> Self {
        match t {
            Tracer::EdgeWalk => Self::EdgeWalk,
            Tracer::BorderFollowing => Self::BorderFollowing,
        }
    }
}

/// Build a [`SelectionConfig`] from CLI arguments.
///
/// If `--config-json` is provided, the JSON is parsed directly and the
/// individual flags are ignored. Otherwise the canvas comes from
/// `--width`/`--height`, falling back to the source image extent and
/// then to the engine default per axis.
fn config_from_cli(cli: &Cli, source: Option<&RgbaImage>) -> Result<SelectionConfig, String> {
    if let Some(ref json) = cli.config_json {
        return serde_json::from_str(json).map_err(|e| format!("Error parsing --config-json: {e}"));
    }

    let default = SelectionConfig::default();
    let fallback = source.map_or(default.canvas, |img| {
        Dimensions::new(img.width(), img.height())
    });
    Ok(SelectionConfig {
        canvas: Dimensions::new(
            cli.width.unwrap_or(fallback.width),
            cli.height.unwrap_or(fallback.height),
        ),
        threshold: cli.threshold,
    })
}

/// Load the operation list from `--ops-json` or `--ops-file`.
fn ops_from_cli(cli: &Cli) -> Result<Vec<SelectionOp>, String> {
    let json = match (&cli.ops_json, &cli.ops_file) {
        (Some(json), _) => json.clone(),
        (None, Some(path)) => std::fs::read_to_string(path)
            .map_err(|e| format!("Error reading {}: {e}", path.display()))?,
        (None, None) => return Err("one of --ops-json or --ops-file is required".to_owned()),
    };
    serde_json::from_str(&json).map_err(|e| format!("Error parsing operations: {e}"))
}

fn load_source(path: &Path) -> Result<RgbaImage, String> {
    image::open(path)
        .map(|img| img.to_rgba8())
        .map_err(|e| format!("Error reading image {}: {e}", path.display()))
}

fn write_output(path: &Path, bytes: &[u8], what: &str) {
    match std::fs::write(path, bytes) {
        Ok(()) => log::info!("{what} written to {} ({} bytes)", path.display(), bytes.len()),
        Err(e) => eprintln!("Error writing {what} to {}: {e}", path.display()),
    }
}

/// Write every requested output for the final selection.
fn write_outputs(cli: &Cli, manager: &SelectionManager, source: Option<&RgbaImage>) {
    if let Some(ref svg_path) = cli.svg {
        let outlines = manager.outline(cli.tracer.into());
        let title = cli
            .ops_file
            .as_deref()
            .and_then(Path::file_stem)
            .and_then(|s| s.to_str())
            .unwrap_or("selection");
        let metadata = marquee_export::SvgMetadata {
            title: Some(title),
            description: None,
        };
        let svg = marquee_export::to_overlay_svg(
            &outlines,
            manager.canvas(),
            &marquee_export::OverlayStyle::default(),
            &metadata,
        );
        write_output(svg_path, svg.as_bytes(), "SVG");
    }

    let Some(selection) = manager.selection() else {
        if cli.mask_png.is_some() || cli.patch.is_some() {
            eprintln!("No selection after the last operation; skipping PNG outputs");
        }
        return;
    };

    if let Some(ref mask_path) = cli.mask_png {
        match marquee_export::mask_to_png(&selection.mask) {
            Ok(bytes) => write_output(mask_path, &bytes, "Mask PNG"),
            Err(e) => eprintln!("Error encoding mask: {e}"),
        }
    }

    if let (Some(patch_path), Some(source)) = (&cli.patch, source) {
        match manager.selected_pixels(source) {
            Some(pixels) => match marquee_export::selected_pixels_to_png(&pixels) {
                Ok(bytes) => {
                    log::info!("Patch origin: ({}, {})", pixels.origin_x, pixels.origin_y);
                    write_output(patch_path, &bytes, "Patch PNG");
                }
                Err(e) => eprintln!("Error encoding patch: {e}"),
            },
            None => eprintln!("Selection does not overlap the source image; no patch written"),
        }
    }
}

fn main() -> ExitCode {
    env_logger::Builder::from_default_env()
        .filter_level(log::LevelFilter::Info)
        .init();

    let cli = Cli::parse();

    let source = match cli.image.as_deref().map(load_source).transpose() {
        Ok(source) => source,
        Err(msg) => {
            eprintln!("{msg}");
            return ExitCode::FAILURE;
        }
    };

    let config = match config_from_cli(&cli, source.as_ref()) {
        Ok(c) => c,
        Err(msg) => {
            eprintln!("{msg}");
            return ExitCode::FAILURE;
        }
    };

    let ops = match ops_from_cli(&cli) {
        Ok(ops) => ops,
        Err(msg) => {
            eprintln!("{msg}");
            return ExitCode::FAILURE;
        }
    };

    log::info!(
        "Canvas: {}x{}, threshold {}, {} operations, {} runs",
        config.canvas.width,
        config.canvas.height,
        config.threshold,
        ops.len(),
        cli.runs,
    );

    let mut all_diagnostics = Vec::with_capacity(cli.runs);

    for run in 0..cli.runs {
        if cli.runs > 1 {
            eprintln!("--- Run {}/{} ---", run + 1, cli.runs);
        }

        let mut manager = SelectionManager::new(config);
        let diagnostics = match run_script(&mut manager, &ops, &StdClock) {
            Ok(d) => d,
            Err(e) => {
                eprintln!("Operation error: {e}");
                return ExitCode::FAILURE;
            }
        };

        if cli.json {
            match serde_json::to_string_pretty(&diagnostics) {
                Ok(json) => println!("{json}"),
                Err(e) => {
                    eprintln!("Error serializing diagnostics: {e}");
                    return ExitCode::FAILURE;
                }
            }
        } else {
            println!("{}", diagnostics.report());
        }

        // Write outputs on the first run only.
        if run == 0 {
            write_outputs(&cli, &manager, source.as_ref());
        }

        all_diagnostics.push(diagnostics);

        if cli.runs > 1 {
            eprintln!();
        }
    }

    if cli.runs > 1 {
        print_multi_run_summary(&all_diagnostics);
    }

    ExitCode::SUCCESS
}

/// [`Clock`] implementation backed by [`std::time::Instant`].
struct StdClock;

impl Clock for StdClock {
    type Instant = Instant;

    fn now(&self) -> Instant {
        Instant::now()
    }

    fn elapsed(&self, since: &Instant) -> Duration {
        since.elapsed()
    }
}

/// Print aggregated statistics across multiple runs.
#[allow(clippy::cast_precision_loss)]
fn print_multi_run_summary(all_diagnostics: &[SessionDiagnostics]) {
    println!();
    println!(
        "Summary ({} runs)\n{}",
        all_diagnostics.len(),
        "=".repeat(60),
    );

    let Some(first) = all_diagnostics.first() else {
        println!("Warning: no diagnostics to summarize");
        return;
    };

    let durations: Vec<f64> = all_diagnostics
        .iter()
        .map(|d| d.total_duration.as_secs_f64() * 1000.0)
        .collect();

    let min = durations.iter().copied().reduce(f64::min).unwrap_or(0.0);
    let max = durations.iter().copied().reduce(f64::max).unwrap_or(0.0);
    let mean = durations.iter().sum::<f64>() / durations.len() as f64;

    println!("Total duration: min={min:.3}ms  mean={mean:.3}ms  max={max:.3}ms");

    // Per-operation means; every run replays the same script.
    println!();
    println!("{:<4} {:<12} {:>12}", "#", "Op", "Mean (ms)");
    println!("{}", "-".repeat(40));

    for (i, op) in first.ops.iter().enumerate() {
        let op_durations: Vec<f64> = all_diagnostics
            .iter()
            .filter_map(|d| d.ops.get(i))
            .map(|o| o.duration.as_secs_f64() * 1000.0)
            .collect();
        let op_mean = op_durations.iter().sum::<f64>() / op_durations.len() as f64;
        println!("{i:<4} {:<12} {op_mean:>10.3}ms", op.op);
    }
}
