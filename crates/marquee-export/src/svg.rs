//! SVG marching-ants overlay serializer.
//!
//! Converts selection outlines into an SVG document using the [`svg`]
//! crate for document construction, XML escaping and path data
//! formatting.
//!
//! Every outline is drawn twice: a light solid stroke underneath and a
//! dark dashed stroke on top, which reads as the usual two-tone
//! "marching ants" border on any background. Animation is the
//! renderer's concern; it advances [`OverlayStyle::dash_offset`] per
//! frame and re-renders.
//!
//! This is a pure function with no I/O -- it returns a `String`.

use svg::Document;
use svg::node::element::path::Data;
use svg::node::element::{Description, Group, Path, Title};
use svg::node::{Text, Value};

use marquee_engine::{Dimensions, Polyline};

/// Stroke styling for the overlay.
#[derive(Debug, Clone, PartialEq)]
pub struct OverlayStyle {
    /// Color of the solid underlay stroke.
    pub light: String,
    /// Color of the dashed stroke.
    pub dark: String,
    /// Stroke width in image pixels.
    pub stroke_width: f64,
    /// Length of each dash and each gap.
    pub dash_length: f64,
    /// Animation phase; emitted as `stroke-dashoffset`.
    pub dash_offset: f64,
}

impl Default for OverlayStyle {
    fn default() -> Self {
        Self {
            light: "white".to_owned(),
            dark: "black".to_owned(),
            stroke_width: 1.0,
            dash_length: 4.0,
            dash_offset: 0.0,
        }
    }
}

/// Metadata to embed in the SVG document.
///
/// Both fields are optional. When present, a `<title>` and/or `<desc>`
/// element is emitted immediately after the opening `<svg>` tag. Text is
/// XML-escaped by the `svg` crate.
#[derive(Debug, Clone, Copy, Default)]
pub struct SvgMetadata<'a> {
    /// Document title, emitted as `<title>`.
    pub title: Option<&'a str>,
    /// Document description, emitted as `<desc>`.
    pub description: Option<&'a str>,
}

/// Build an SVG path `d` attribute string from a polyline.
///
/// Uses `M` for the first point and `L` for the rest. A closed polyline
/// ends with a close command instead of repeating its first point.
/// Returns an empty string for polylines with fewer than 2 points.
///
/// # Examples
///
/// ```
/// use marquee_engine::{Point, Polyline};
/// use marquee_export::build_path_data;
///
/// let polyline = Polyline::new(vec![
///     Point::new(10.0, 20.0),
///     Point::new(30.0, 40.0),
/// ]);
/// assert_eq!(build_path_data(&polyline), "M10,20 L30,40");
/// ```
#[must_use]
pub fn build_path_data(polyline: &Polyline) -> String {
    let points = polyline.points();
    if points.len() < 2 {
        return String::new();
    }

    let (body, closed) = if polyline.is_closed() {
        (&points[1..points.len() - 1], true)
    } else {
        (&points[1..], false)
    };

    let first = &points[0];
    let mut data = Data::new().move_to((first.x, first.y));
    for p in body {
        data = data.line_to((p.x, p.y));
    }
    if closed {
        data = data.close();
    }
    String::from(Value::from(data))
}

/// Serialize selection outlines as a two-tone dashed overlay.
///
/// The document's `viewBox` is the image extent, so outlines in image
/// space line up with the image when both are drawn at the same size.
/// Polylines with fewer than 2 points are skipped. With no drawable
/// outline the document contains no groups.
#[must_use]
pub fn to_overlay_svg(
    outlines: &[Polyline],
    dimensions: Dimensions,
    style: &OverlayStyle,
    metadata: &SvgMetadata<'_>,
) -> String {
    let w = dimensions.width;
    let h = dimensions.height;
    let mut doc = Document::new()
        .set("width", w)
        .set("height", h)
        .set("viewBox", (0, 0, w, h));

    if let Some(title) = metadata.title {
        doc = doc.add(Title::new(title));
    }
    if let Some(description) = metadata.description {
        doc = doc.add(Description::new().add(Text::new(description)));
    }

    let paths: Vec<String> = outlines
        .iter()
        .map(build_path_data)
        .filter(|d| !d.is_empty())
        .collect();

    if !paths.is_empty() {
        let mut light = Group::new()
            .set("class", "marching-ants-light")
            .set("fill", "none")
            .set("stroke", style.light.as_str())
            .set("stroke-width", style.stroke_width);
        let mut dark = Group::new()
            .set("class", "marching-ants-dark")
            .set("fill", "none")
            .set("stroke", style.dark.as_str())
            .set("stroke-width", style.stroke_width)
            .set("stroke-dasharray", (style.dash_length, style.dash_length))
            .set("stroke-dashoffset", style.dash_offset);

        for d in &paths {
            light = light.add(Path::new().set("d", d.as_str()));
            dark = dark.add(Path::new().set("d", d.as_str()));
        }
        doc = doc.add(light).add(dark);
    }

    // The svg crate omits the XML declaration, so we prepend it.
    format!("<?xml version=\"1.0\" encoding=\"UTF-8\"?>\n{doc}\n")
}
