//! Freeform path command data.
//!
//! Freeform selections arrive as compact SVG path data (`M`, `L`, `H`,
//! `V`, `C`, `S`, `Q`, `T`, `A`, `Z` and their relative forms). The
//! [`svg`] crate tokenizes the string; this module normalizes the result
//! into absolute [`PathCommand`]s made of lines and Bézier curves only,
//! which both the rasterizer (via `tiny-skia`) and the outline builder
//! can consume directly.
//!
//! Elliptical arcs are converted to cubic Béziers using the
//! endpoint-to-center parameterization from the SVG implementation
//! notes, split into segments of at most 90 degrees.

use std::f64::consts::{FRAC_PI_2, TAU};

use svg::node::element::path::{Command, Data, Position};

use crate::types::{Affine, Bounds, EngineError, Point, Polyline};

/// Line segments used per Bézier curve when flattening.
pub const CURVE_SEGMENTS: usize = 16;

/// One absolute drawing command.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum PathCommand {
    /// Start a new subpath.
    MoveTo(Point),
    /// Straight line to a point.
    LineTo(Point),
    /// Quadratic Bézier: control point, end point.
    QuadTo(Point, Point),
    /// Cubic Bézier: two control points, end point.
    CubicTo(Point, Point, Point),
    /// Close the current subpath.
    Close,
}

impl PathCommand {
    /// Apply an affine transform to every point of the command.
    ///
    /// Béziers are affine-invariant, so transforming control points is exact.
    #[must_use]
    pub fn transformed(self, t: &Affine) -> Self {
        match self {
            Self::MoveTo(p) => Self::MoveTo(t.apply(p)),
            Self::LineTo(p) => Self::LineTo(t.apply(p)),
            Self::QuadTo(c, p) => Self::QuadTo(t.apply(c), t.apply(p)),
            Self::CubicTo(c1, c2, p) => Self::CubicTo(t.apply(c1), t.apply(c2), t.apply(p)),
            Self::Close => Self::Close,
        }
    }
}

/// Which kind of control point the previous command left behind, for
/// the smooth (`S`/`T`) variants.
#[derive(Clone, Copy)]
enum LastControl {
    None,
    Cubic(Point),
    Quad(Point),
}

/// Parser state while walking the tokenized commands.
struct Normalizer {
    out: Vec<PathCommand>,
    current: Point,
    subpath_start: Point,
    last_control: LastControl,
}

impl Normalizer {
    const fn new() -> Self {
        Self {
            out: Vec::new(),
            current: Point::new(0.0, 0.0),
            subpath_start: Point::new(0.0, 0.0),
            last_control: LastControl::None,
        }
    }

    fn resolve(&self, position: Position, x: f32, y: f32) -> Point {
        let (x, y) = (f64::from(x), f64::from(y));
        match position {
            Position::Absolute => Point::new(x, y),
            Position::Relative => Point::new(self.current.x + x, self.current.y + y),
        }
    }

    fn reflected(&self, control: Option<Point>) -> Point {
        control.map_or(self.current, |c| {
            Point::new(2.0f64.mul_add(self.current.x, -c.x), 2.0f64.mul_add(self.current.y, -c.y))
        })
    }

    fn move_to(&mut self, p: Point) {
        self.out.push(PathCommand::MoveTo(p));
        self.current = p;
        self.subpath_start = p;
        self.last_control = LastControl::None;
    }

    fn line_to(&mut self, p: Point) {
        self.out.push(PathCommand::LineTo(p));
        self.current = p;
        self.last_control = LastControl::None;
    }

    fn quad_to(&mut self, c: Point, p: Point) {
        self.out.push(PathCommand::QuadTo(c, p));
        self.current = p;
        self.last_control = LastControl::Quad(c);
    }

    fn cubic_to(&mut self, c1: Point, c2: Point, p: Point) {
        self.out.push(PathCommand::CubicTo(c1, c2, p));
        self.current = p;
        self.last_control = LastControl::Cubic(c2);
    }

    fn close(&mut self) {
        self.out.push(PathCommand::Close);
        self.current = self.subpath_start;
        self.last_control = LastControl::None;
    }

    fn command(&mut self, command: &Command) {
        match command {
            Command::Move(pos, params) => {
                for (i, pair) in params.chunks_exact(2).enumerate() {
                    let p = self.resolve(*pos, pair[0], pair[1]);
                    // Extra coordinate pairs after a moveto are implicit linetos.
                    if i == 0 {
                        self.move_to(p);
                    } else {
                        self.line_to(p);
                    }
                }
            }
            Command::Line(pos, params) => {
                for pair in params.chunks_exact(2) {
                    let p = self.resolve(*pos, pair[0], pair[1]);
                    self.line_to(p);
                }
            }
            Command::HorizontalLine(pos, params) => {
                for &x in params.iter() {
                    let x = match pos {
                        Position::Absolute => f64::from(x),
                        Position::Relative => self.current.x + f64::from(x),
                    };
                    self.line_to(Point::new(x, self.current.y));
                }
            }
            Command::VerticalLine(pos, params) => {
                for &y in params.iter() {
                    let y = match pos {
                        Position::Absolute => f64::from(y),
                        Position::Relative => self.current.y + f64::from(y),
                    };
                    self.line_to(Point::new(self.current.x, y));
                }
            }
            Command::CubicCurve(pos, params) => {
                for six in params.chunks_exact(6) {
                    let c1 = self.resolve(*pos, six[0], six[1]);
                    let c2 = self.resolve(*pos, six[2], six[3]);
                    let p = self.resolve(*pos, six[4], six[5]);
                    self.cubic_to(c1, c2, p);
                }
            }
            Command::SmoothCubicCurve(pos, params) => {
                for four in params.chunks_exact(4) {
                    let previous = match self.last_control {
                        LastControl::Cubic(c) => Some(c),
                        _ => None,
                    };
                    let c1 = self.reflected(previous);
                    let c2 = self.resolve(*pos, four[0], four[1]);
                    let p = self.resolve(*pos, four[2], four[3]);
                    self.cubic_to(c1, c2, p);
                }
            }
            Command::QuadraticCurve(pos, params) => {
                for four in params.chunks_exact(4) {
                    let c = self.resolve(*pos, four[0], four[1]);
                    let p = self.resolve(*pos, four[2], four[3]);
                    self.quad_to(c, p);
                }
            }
            Command::SmoothQuadraticCurve(pos, params) => {
                for pair in params.chunks_exact(2) {
                    let previous = match self.last_control {
                        LastControl::Quad(c) => Some(c),
                        _ => None,
                    };
                    let c = self.reflected(previous);
                    let p = self.resolve(*pos, pair[0], pair[1]);
                    self.quad_to(c, p);
                }
            }
            Command::EllipticalArc(pos, params) => {
                for seven in params.chunks_exact(7) {
                    let to = self.resolve(*pos, seven[5], seven[6]);
                    let arc = Arc {
                        rx: f64::from(seven[0]),
                        ry: f64::from(seven[1]),
                        rotation: f64::from(seven[2]),
                        large_arc: seven[3] != 0.0,
                        sweep: seven[4] != 0.0,
                    };
                    self.arc_to(&arc, to);
                }
            }
            Command::Close => self.close(),
        }
    }

    fn arc_to(&mut self, arc: &Arc, to: Point) {
        let from = self.current;
        if from == to {
            return;
        }
        if arc.rx == 0.0 || arc.ry == 0.0 {
            self.line_to(to);
            return;
        }
        for (c1, c2, p) in arc.to_cubics(from, to) {
            self.cubic_to(c1, c2, p);
        }
    }
}

/// SVG elliptical arc parameters (the part of an `A` command before
/// the end point).
struct Arc {
    rx: f64,
    ry: f64,
    /// x-axis rotation in degrees.
    rotation: f64,
    large_arc: bool,
    sweep: bool,
}

impl Arc {
    /// Cubic segments approximating the arc from `from` to `to`.
    #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
    fn to_cubics(&self, from: Point, to: Point) -> Vec<(Point, Point, Point)> {
        let (sin_phi, cos_phi) = self.rotation.to_radians().sin_cos();
        let mut rx = self.rx.abs();
        let mut ry = self.ry.abs();

        // Midpoint in the ellipse's rotated frame.
        let dx2 = (from.x - to.x) / 2.0;
        let dy2 = (from.y - to.y) / 2.0;
        let x1p = cos_phi.mul_add(dx2, sin_phi * dy2);
        let y1p = (-sin_phi).mul_add(dx2, cos_phi * dy2);

        // Radii too small to reach the end point are scaled up uniformly.
        let lambda = (x1p / rx).powi(2) + (y1p / ry).powi(2);
        if lambda > 1.0 {
            let s = lambda.sqrt();
            rx *= s;
            ry *= s;
        }

        let rx2 = rx * rx;
        let ry2 = ry * ry;
        let den = (rx2 * y1p).mul_add(y1p, ry2 * x1p * x1p);
        let num = rx2.mul_add(ry2, -den);
        let sign = if self.large_arc == self.sweep { -1.0 } else { 1.0 };
        let coef = if den > 0.0 {
            sign * (num / den).max(0.0).sqrt()
        } else {
            0.0
        };
        let cxp = coef * rx * y1p / ry;
        let cyp = -coef * ry * x1p / rx;

        let cx = cos_phi.mul_add(cxp, -sin_phi * cyp) + f64::midpoint(from.x, to.x);
        let cy = sin_phi.mul_add(cxp, cos_phi * cyp) + f64::midpoint(from.y, to.y);

        let theta1 = vector_angle((1.0, 0.0), ((x1p - cxp) / rx, (y1p - cyp) / ry));
        let mut dtheta = vector_angle(
            ((x1p - cxp) / rx, (y1p - cyp) / ry),
            ((-x1p - cxp) / rx, (-y1p - cyp) / ry),
        );
        if !self.sweep && dtheta > 0.0 {
            dtheta -= TAU;
        } else if self.sweep && dtheta < 0.0 {
            dtheta += TAU;
        }

        let segments = (dtheta.abs() / FRAC_PI_2).ceil().max(1.0) as usize;
        #[allow(clippy::cast_precision_loss)]
        let delta = dtheta / segments as f64;
        let handle = 4.0 / 3.0 * (delta / 4.0).tan();

        let map = |u: f64, v: f64| {
            Point::new(
                cx + (rx * u).mul_add(cos_phi, -(ry * v * sin_phi)),
                cy + (rx * u).mul_add(sin_phi, ry * v * cos_phi),
            )
        };

        let mut cubics = Vec::with_capacity(segments);
        let mut a1 = theta1;
        for i in 0..segments {
            let a2 = a1 + delta;
            let (s1, c1) = a1.sin_cos();
            let (s2, c2) = a2.sin_cos();
            let cp1 = map(handle.mul_add(-s1, c1), handle.mul_add(c1, s1));
            let cp2 = map(handle.mul_add(s2, c2), handle.mul_add(-c2, s2));
            let end = if i + 1 == segments { to } else { map(c2, s2) };
            cubics.push((cp1, cp2, end));
            a1 = a2;
        }
        cubics
    }
}

/// Signed angle from vector `u` to vector `v`.
fn vector_angle(u: (f64, f64), v: (f64, f64)) -> f64 {
    let cross = u.0.mul_add(v.1, -(u.1 * v.0));
    let dot = u.0.mul_add(v.0, u.1 * v.1);
    cross.atan2(dot)
}

/// Parse compact SVG path data into absolute commands.
///
/// An empty string yields an empty command list.
///
/// # Errors
///
/// Returns [`EngineError::PathData`] if the data cannot be tokenized.
pub fn parse(data: &str) -> Result<Vec<PathCommand>, EngineError> {
    let parsed = Data::parse(data).map_err(|e| EngineError::PathData(e.to_string()))?;
    let mut normalizer = Normalizer::new();
    for command in parsed.iter() {
        normalizer.command(command);
    }
    Ok(normalizer.out)
}

/// Apply a transform to a whole command list.
#[must_use]
pub fn transform(commands: &[PathCommand], t: &Affine) -> Vec<PathCommand> {
    commands.iter().map(|c| c.transformed(t)).collect()
}

/// Flatten commands into polylines, one per subpath.
///
/// Curves are subdivided into [`CURVE_SEGMENTS`] line segments. Closed
/// subpaths end on their starting point. Subpaths with fewer than two
/// points are dropped.
#[must_use]
pub fn flatten(commands: &[PathCommand]) -> Vec<Polyline> {
    let mut polylines = Vec::new();
    let mut current: Vec<Point> = Vec::new();
    let mut start = Point::new(0.0, 0.0);

    let flush = |current: &mut Vec<Point>, polylines: &mut Vec<Polyline>| {
        if current.len() >= 2 {
            polylines.push(Polyline::new(std::mem::take(current)));
        } else {
            current.clear();
        }
    };

    for &command in commands {
        match command {
            PathCommand::MoveTo(p) => {
                flush(&mut current, &mut polylines);
                current.push(p);
                start = p;
            }
            PathCommand::LineTo(p) => {
                if current.is_empty() {
                    current.push(start);
                }
                current.push(p);
            }
            PathCommand::QuadTo(c, p) => {
                let from = *current.last().unwrap_or(&start);
                if current.is_empty() {
                    current.push(from);
                }
                current.extend((1..=CURVE_SEGMENTS).map(|i| quad_point(from, c, p, step(i))));
            }
            PathCommand::CubicTo(c1, c2, p) => {
                let from = *current.last().unwrap_or(&start);
                if current.is_empty() {
                    current.push(from);
                }
                current.extend((1..=CURVE_SEGMENTS).map(|i| cubic_point(from, c1, c2, p, step(i))));
            }
            PathCommand::Close => {
                if current.len() >= 2 && current.last() != Some(&start) {
                    current.push(start);
                }
                flush(&mut current, &mut polylines);
            }
        }
    }
    flush(&mut current, &mut polylines);
    polylines
}

/// Bounding box of the flattened geometry, or `None` for no points.
#[must_use]
pub fn bounds(commands: &[PathCommand]) -> Option<Bounds> {
    let polylines = flatten(commands);
    let mut points = polylines.iter().flat_map(Polyline::points);
    let first = points.next()?;
    let (mut min_x, mut min_y, mut max_x, mut max_y) = (first.x, first.y, first.x, first.y);
    for p in points {
        min_x = min_x.min(p.x);
        min_y = min_y.min(p.y);
        max_x = max_x.max(p.x);
        max_y = max_y.max(p.y);
    }
    Some(Bounds::from_edges(min_x, min_y, max_x, max_y))
}

#[allow(clippy::cast_precision_loss)]
fn step(i: usize) -> f64 {
    i as f64 / CURVE_SEGMENTS as f64
}

fn quad_point(p0: Point, c: Point, p1: Point, t: f64) -> Point {
    let mt = 1.0 - t;
    Point::new(
        (mt * mt).mul_add(p0.x, (2.0 * mt * t).mul_add(c.x, t * t * p1.x)),
        (mt * mt).mul_add(p0.y, (2.0 * mt * t).mul_add(c.y, t * t * p1.y)),
    )
}

fn cubic_point(p0: Point, c1: Point, c2: Point, p1: Point, t: f64) -> Point {
    let mt = 1.0 - t;
    let (a, b, c, d) = (mt * mt * mt, 3.0 * mt * mt * t, 3.0 * mt * t * t, t * t * t);
    Point::new(
        a.mul_add(p0.x, b.mul_add(c1.x, c.mul_add(c2.x, d * p1.x))),
        a.mul_add(p0.y, b.mul_add(c1.y, c.mul_add(c2.y, d * p1.y))),
    )
}
