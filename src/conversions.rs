use crate::types::{FieldType, GeometryKind};

/// Name used by the `@G` header key. `Unknown` has no name.
#[inline]
pub(crate) fn geometry_kind_to_str(kind: GeometryKind) -> Option<&'static str> {
    match kind {
        GeometryKind::Point => Some("POINT"),
        GeometryKind::LineString => Some("LINESTRING"),
        GeometryKind::Polygon => Some("POLYGON"),
        GeometryKind::MultiPoint => Some("MULTIPOINT"),
        GeometryKind::MultiLineString => Some("MULTILINESTRING"),
        GeometryKind::MultiPolygon => Some("MULTIPOLYGON"),
        GeometryKind::Unknown => None,
    }
}

#[inline]
pub(crate) fn geometry_kind_from_str(geometry_kind_str: &str) -> GeometryKind {
    let s = geometry_kind_str;
    if s.eq_ignore_ascii_case("POINT") {
        GeometryKind::Point
    } else if s.eq_ignore_ascii_case("LINESTRING") {
        GeometryKind::LineString
    } else if s.eq_ignore_ascii_case("POLYGON") {
        GeometryKind::Polygon
    } else if s.eq_ignore_ascii_case("MULTIPOINT") {
        GeometryKind::MultiPoint
    } else if s.eq_ignore_ascii_case("MULTILINESTRING") {
        GeometryKind::MultiLineString
    } else if s.eq_ignore_ascii_case("MULTIPOLYGON") {
        GeometryKind::MultiPolygon
    } else {
        GeometryKind::Unknown
    }
}

/// Name used by the `@T` header key. Types that cannot be stored are
/// written as strings.
#[inline]
pub(crate) fn field_type_to_str(field_type: FieldType) -> &'static str {
    match field_type {
        FieldType::Integer => "integer",
        FieldType::Real => "double",
        FieldType::DateTime => "datetime",
        _ => "string",
    }
}

#[inline]
pub(crate) fn field_type_from_str(field_type_str: &str) -> FieldType {
    let s = field_type_str;
    if s.eq_ignore_ascii_case("integer") {
        FieldType::Integer
    } else if s.eq_ignore_ascii_case("double") {
        FieldType::Real
    } else if s.eq_ignore_ascii_case("datetime") {
        FieldType::DateTime
    } else {
        FieldType::String
    }
}

/// Format `value` like C's `%.{precision}g`.
pub(crate) fn format_g(value: f64, precision: usize) -> String {
    if value.is_nan() {
        return "nan".to_string();
    }
    if value.is_infinite() {
        return if value > 0.0 { "inf" } else { "-inf" }.to_string();
    }
    if value == 0.0 {
        return if value.is_sign_negative() { "-0" } else { "0" }.to_string();
    }

    let precision = precision.max(1);
    // Round to the requested significant digits first, then pick a notation
    // from the decimal exponent of the rounded value.
    let scientific = format!("{:.*e}", precision - 1, value);
    let (mantissa, exponent) = match scientific.split_once('e') {
        Some(parts) => parts,
        None => return scientific,
    };
    let exponent: i32 = exponent.parse().unwrap_or(0);

    if exponent < -4 || exponent >= precision as i32 {
        let mantissa = trim_fraction(mantissa);
        let sign = if exponent < 0 { '-' } else { '+' };
        format!("{mantissa}e{sign}{:02}", exponent.unsigned_abs())
    } else {
        let decimals = (precision as i32 - 1 - exponent).max(0) as usize;
        trim_fraction(&format!("{:.*}", decimals, value)).to_string()
    }
}

fn trim_fraction(s: &str) -> &str {
    if s.contains('.') {
        s.trim_end_matches('0').trim_end_matches('.')
    } else {
        s
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn geometry_kind_names_roundtrip() {
        for kind in [
            GeometryKind::Point,
            GeometryKind::LineString,
            GeometryKind::Polygon,
            GeometryKind::MultiPoint,
            GeometryKind::MultiLineString,
            GeometryKind::MultiPolygon,
        ] {
            let name = geometry_kind_to_str(kind).expect("named kind");
            assert_eq!(geometry_kind_from_str(name), kind);
        }
        assert_eq!(geometry_kind_to_str(GeometryKind::Unknown), None);
        assert_eq!(geometry_kind_from_str("TIN"), GeometryKind::Unknown);
    }

    #[test]
    fn field_types_fall_back_to_string() {
        assert_eq!(field_type_from_str("INTEGER"), FieldType::Integer);
        assert_eq!(field_type_from_str("double"), FieldType::Real);
        assert_eq!(field_type_from_str("datetime"), FieldType::DateTime);
        assert_eq!(field_type_from_str("boolean"), FieldType::String);
        assert_eq!(field_type_to_str(FieldType::Binary), "string");
    }

    #[test]
    fn formats_like_printf_g() {
        assert_eq!(format_g(1.0, 15), "1");
        assert_eq!(format_g(-2.5, 15), "-2.5");
        assert_eq!(format_g(0.1, 15), "0.1");
        assert_eq!(format_g(123456.789, 15), "123456.789");
        assert_eq!(format_g(1e20, 15), "1e+20");
        assert_eq!(format_g(0.00001234, 15), "1.234e-05");
        assert_eq!(format_g(0.0001, 12), "0.0001");
        assert_eq!(format_g(1.0 / 3.0, 12), "0.333333333333");
        assert_eq!(format_g(0.0, 12), "0");
    }
}
