//! Text produced by the write path. Everything here renders into a
//! `String`; the layer writes each rendered feature with a single call.

use super::escape::{escape, quote_if_needed};
use crate::conversions::{field_type_to_str, format_g, geometry_kind_to_str};
use crate::geometry::{Coord, Geometry, LineString, Polygon};
use crate::spatial_ref::SpatialRef;
use crate::types::{Envelope, FieldSpec, FieldType, GeometryKind, Value};
use std::fmt::Write as _;

/// Byte width of the `# REGION_STUB` line written for new layers. Wide
/// enough for four `%.12g` numbers in exponent notation.
pub(crate) const REGION_STUB_WIDTH: usize = 100;

const COORD_PRECISION: usize = 15;
const REGION_PRECISION: usize = 12;

/// First lines of a newly created file: version and kind, the region
/// placeholder and the coordinate system.
pub(crate) fn preamble(kind: GeometryKind, spatial_ref: Option<&SpatialRef>) -> String {
    let mut out = String::from("# @VGMT1.0");
    if let Some(name) = geometry_kind_to_str(kind) {
        out.push_str(" @G");
        out.push_str(name);
    }
    out.push('\n');

    out.push_str(&format!("{:<REGION_STUB_WIDTH$}\n", "# REGION_STUB"));

    match spatial_ref {
        Some(SpatialRef::Epsg(code)) => out.push_str(&format!("# @Je{code}\n")),
        Some(SpatialRef::Proj4(proj4)) => out.push_str(&format!("# @Jp\"{}\"\n", escape(proj4))),
        Some(SpatialRef::Wkt(wkt)) => out.push_str(&format!("# @Jw\"{}\"\n", escape(wkt))),
        None => {}
    }
    out
}

/// Lines emitted once, before the first feature.
///
/// `declare_kind` is set when the geometry kind was fixed by that feature
/// rather than by the existing header.
pub(crate) fn header_completion(declare_kind: Option<GeometryKind>, fields: &[FieldSpec]) -> String {
    let mut out = String::new();
    if let Some(kind) = declare_kind {
        match geometry_kind_to_str(kind) {
            Some(name) => out.push_str(&format!("# @G{name}\n")),
            None => out.push_str("#\n"),
        }
    }

    if !fields.is_empty() {
        let names: Vec<String> = fields.iter().map(|f| quote_if_needed(&f.name)).collect();
        let types: Vec<&str> = fields.iter().map(|f| field_type_to_str(f.field_type)).collect();
        out.push_str(&format!("# @N{}\n", names.join("|")));
        out.push_str(&format!("# @T{}\n", types.join("|")));
    }

    out.push_str("# FEATURE_DATA\n");
    out
}

/// The `# @D` line for one feature.
pub(crate) fn attribute_line(fields: &[FieldSpec], values: &[Value]) -> String {
    let data: Vec<String> = fields
        .iter()
        .zip(values)
        .map(|(field, value)| quote_if_needed(&field_text(field.field_type, value)))
        .collect();
    format!("# @D{}\n", data.join("|"))
}

/// String form of `value` stored in a field of `field_type`.
fn field_text(field_type: FieldType, value: &Value) -> String {
    match (field_type, value) {
        (_, Value::Null) => String::new(),
        (FieldType::Integer, Value::Real(v)) => (v.trunc() as i64).to_string(),
        (_, Value::Integer(v)) => v.to_string(),
        (_, Value::Real(v)) => format_g(*v, COORD_PRECISION),
        (FieldType::Integer | FieldType::Real, Value::Text(text)) => {
            text.trim_start_matches(' ').to_string()
        }
        (_, Value::Text(text)) => text.clone(),
    }
}

/// Render the geometry body of a feature. `have_angle` tells whether a `>`
/// line was already written for this feature.
pub(crate) fn push_geometry(out: &mut String, geometry: &Geometry, separator: char, have_angle: bool) {
    let three_d = geometry.has_z();
    let mut vertices = VertexWriter {
        out,
        separator,
        three_d,
    };

    match geometry {
        Geometry::Point(coord) => vertices.push(coord),
        Geometry::MultiPoint(points) => points.iter().for_each(|c| vertices.push(c)),
        Geometry::LineString(line) => vertices.push_line(line, have_angle),
        Geometry::Polygon(polygon) => vertices.push_polygon(polygon, have_angle),
        Geometry::MultiLineString(lines) => {
            for (idx, line) in lines.iter().enumerate() {
                vertices.push_line(line, have_angle && idx == 0);
            }
        }
        Geometry::MultiPolygon(polygons) => {
            for (idx, polygon) in polygons.iter().enumerate() {
                vertices.push_polygon(polygon, have_angle && idx == 0);
            }
        }
    }
}

struct VertexWriter<'a> {
    out: &'a mut String,
    separator: char,
    three_d: bool,
}

impl VertexWriter<'_> {
    fn push(&mut self, coord: &Coord) {
        let sep = self.separator;
        let _ = write!(
            self.out,
            "{}{sep}{}",
            format_g(coord.x, COORD_PRECISION),
            format_g(coord.y, COORD_PRECISION)
        );
        if self.three_d {
            let _ = write!(
                self.out,
                "{sep}{}",
                format_g(coord.z.unwrap_or(0.0), COORD_PRECISION)
            );
        }
        self.out.push('\n');
    }

    fn push_line(&mut self, line: &LineString, have_angle: bool) {
        if !have_angle {
            self.out.push_str(">\n");
        }
        line.coords().iter().for_each(|c| self.push(c));
    }

    fn push_polygon(&mut self, polygon: &Polygon, mut have_angle: bool) {
        for (idx, ring) in polygon.rings().enumerate() {
            if !have_angle {
                self.out.push_str(">\n");
            }
            self.out.push_str(if idx == 0 { "# @P\n" } else { "# @H\n" });
            ring.coords().iter().for_each(|c| self.push(c));
            have_angle = false;
        }
    }
}

/// `# @R` line padded to `width`, or `None` when it does not fit.
pub(crate) fn region_line(envelope: &Envelope, width: usize) -> Option<String> {
    let line = format!(
        "# @R{}/{}/{}/{}",
        format_g(envelope.min_x, REGION_PRECISION),
        format_g(envelope.max_x, REGION_PRECISION),
        format_g(envelope.min_y, REGION_PRECISION),
        format_g(envelope.max_y, REGION_PRECISION)
    );
    if line.len() > width {
        return None;
    }
    Some(format!("{line:<width$}"))
}
