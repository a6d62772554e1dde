use super::escape::{tokenize, unquote};
use super::reader::LineReader;
use crate::conversions::{field_type_from_str, geometry_kind_from_str};
use crate::error::Result;
use crate::spatial_ref::SpatialRef;
use crate::types::{Envelope, FieldSpec, FieldType, GeometryKind};
use std::io::{Read, Seek};
use tracing::warn;

/// Location of the `# REGION_STUB` placeholder line.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) struct RegionStub {
    pub(crate) offset: u64,
    /// Byte length of the line, excluding the line terminator.
    pub(crate) width: usize,
}

/// Everything recovered from the leading comment block of a GMT file.
#[derive(Debug, Default)]
pub(crate) struct Header {
    pub(crate) fields: Vec<FieldSpec>,
    pub(crate) geometry_kind: GeometryKind,
    pub(crate) region: Option<Envelope>,
    /// An `@R` key was present, even if it could not be parsed.
    pub(crate) region_declared: bool,
    pub(crate) spatial_ref: Option<SpatialRef>,
    pub(crate) region_stub: Option<RegionStub>,
    pub(crate) version: Option<String>,
    /// `FEATURE_DATA` was found.
    pub(crate) complete: bool,
}

/// Raw header values, before interpretation.
#[derive(Default)]
struct RawHeader {
    field_names: String,
    field_types: String,
    geometry_kind: String,
    region: String,
    wkt: String,
    proj4: String,
    epsg: String,
}

/// Parse the header from the start of the stream.
///
/// On return the reader's current line is the first line after the
/// header: the line following `FEATURE_DATA`, the first non-comment line,
/// or the end-of-stream placeholder.
pub(crate) fn read_header<R: Read + Seek>(reader: &mut LineReader<R>) -> Result<Header> {
    let mut header = Header::default();
    let mut raw = RawHeader::default();

    reader.seek(0);
    while reader.advance()? {
        let line = reader.current();
        if !line.is_comment() {
            break;
        }

        if line.text.contains("FEATURE_DATA") {
            header.complete = true;
            reader.advance()?;
            break;
        }

        // A region line left by an earlier close can be rewritten in place
        // like the placeholder it replaced.
        if starts_with_ignore_ascii_case(&line.text, "# REGION_STUB ")
            || (line.text.starts_with("# @R") && header.region_stub.is_none())
        {
            header.region_stub = Some(RegionStub {
                offset: line.offset,
                width: line.text.len(),
            });
        }

        for (key, value) in line.keyed.iter() {
            match key {
                'N' => raw.field_names = value.to_string(),
                'T' => raw.field_types = value.to_string(),
                'G' => raw.geometry_kind = value.to_string(),
                'R' => raw.region = value.to_string(),
                'V' => header.version = Some(value.to_string()),
                'J' => {
                    let mut chars = value.chars();
                    let selector = chars.next();
                    let arg = chars.as_str();
                    if arg.is_empty() {
                        continue;
                    }
                    let arg = unquote(arg);
                    match selector {
                        Some('e') => raw.epsg = arg,
                        Some('p') => raw.proj4 = arg,
                        Some('w') => raw.wkt = arg,
                        _ => {}
                    }
                }
                _ => {}
            }
        }
    }

    header.spatial_ref = parse_spatial_ref(&raw);
    header.geometry_kind = geometry_kind_from_str(&raw.geometry_kind);

    if !raw.region.is_empty() {
        header.region_declared = true;
        header.region = parse_region(&raw.region);
        if header.region.is_none() {
            warn!(region = %raw.region, "Ignoring malformed GMT region");
        }
    }

    header.fields = parse_fields(&raw.field_names, &raw.field_types);

    Ok(header)
}

/// WKT wins over EPSG, which wins over PROJ. Only the winner is tried.
fn parse_spatial_ref(raw: &RawHeader) -> Option<SpatialRef> {
    let parsed = if !raw.wkt.is_empty() {
        SpatialRef::from_wkt(&raw.wkt)
    } else if !raw.epsg.is_empty() {
        SpatialRef::from_epsg(&raw.epsg)
    } else if !raw.proj4.is_empty() {
        SpatialRef::from_proj4(&raw.proj4)
    } else {
        return None;
    };

    match parsed {
        Ok(srs) => Some(srs),
        Err(err) => {
            warn!(error = %err, "Ignoring coordinate system in GMT header");
            None
        }
    }
}

fn parse_region(region: &str) -> Option<Envelope> {
    let tokens: Vec<&str> = region.split('/').filter(|t| !t.is_empty()).collect();
    if tokens.len() != 4 {
        return None;
    }
    let mut values = [0.0_f64; 4];
    for (value, token) in values.iter_mut().zip(&tokens) {
        *value = token.trim().parse().ok()?;
    }
    Some(Envelope::new(values[0], values[1], values[2], values[3]))
}

fn parse_fields(names: &str, types: &str) -> Vec<FieldSpec> {
    let names = tokenize(names, '|');
    let types = tokenize(types, '|');
    let count = names.len().max(types.len());

    (0..count)
        .map(|idx| {
            let name = names
                .get(idx)
                .cloned()
                .unwrap_or_else(|| format!("Field_{}", idx + 1));
            let field_type = types
                .get(idx)
                .map(|t| field_type_from_str(t))
                .unwrap_or(FieldType::String);
            FieldSpec { name, field_type }
        })
        .collect()
}

fn starts_with_ignore_ascii_case(text: &str, prefix: &str) -> bool {
    text.len() >= prefix.len()
        && text.as_bytes()[..prefix.len()].eq_ignore_ascii_case(prefix.as_bytes())
}

#[cfg(test)]
mod tests {
    use super::{RegionStub, read_header};
    use crate::Result;
    use crate::gmt::reader::LineReader;
    use crate::spatial_ref::SpatialRef;
    use crate::types::{Envelope, FieldSpec, FieldType, GeometryKind};
    use std::io::Cursor;

    fn reader(data: &str) -> LineReader<Cursor<Vec<u8>>> {
        LineReader::new(Cursor::new(data.as_bytes().to_vec()))
    }

    #[test]
    fn parses_full_header() -> Result<()> {
        let data = "\
# @VGMT1.0 @GPOLYGON
# @R0/10/-5/5
# @Je4326
# @Nname|\"pop count\"|area
# @Tstring|integer|double
# FEATURE_DATA
>
";
        let mut reader = reader(data);
        let header = read_header(&mut reader)?;

        assert!(header.complete);
        assert_eq!(header.version.as_deref(), Some("GMT1.0"));
        assert_eq!(header.geometry_kind, GeometryKind::Polygon);
        assert_eq!(header.region, Some(Envelope::new(0.0, 10.0, -5.0, 5.0)));
        assert!(header.region_declared);
        assert_eq!(header.spatial_ref, Some(SpatialRef::Epsg(4326)));
        assert_eq!(
            header.fields,
            vec![
                FieldSpec::new("name", FieldType::String),
                FieldSpec::new("pop count", FieldType::Integer),
                FieldSpec::new("area", FieldType::Real),
            ]
        );
        assert_eq!(reader.current().text, ">");
        Ok(())
    }

    #[test]
    fn synthesizes_missing_names_and_types() -> Result<()> {
        let mut reader = reader("# @Na\n# @Tinteger|datetime|double\n# @Nx|y|z|w\n");
        let header = read_header(&mut reader)?;

        // The last @N wins.
        assert_eq!(
            header.fields,
            vec![
                FieldSpec::new("x", FieldType::Integer),
                FieldSpec::new("y", FieldType::DateTime),
                FieldSpec::new("z", FieldType::Real),
                FieldSpec::new("w", FieldType::String),
            ]
        );

        let mut reader = self::reader("# @Tinteger|integer\n");
        let header = read_header(&mut reader)?;
        assert_eq!(header.fields[0].name, "Field_1");
        assert_eq!(header.fields[1].name, "Field_2");
        assert!(!header.complete);
        Ok(())
    }

    #[test]
    fn wkt_takes_precedence() -> Result<()> {
        let data = "\
# @Jp\"+proj=longlat +datum=WGS84\"
# @Je4326
# @Jw\"GEOGCS[\\\"WGS 84\\\",DATUM[\\\"WGS_1984\\\",SPHEROID[\\\"WGS 84\\\",6378137,298.257223563]]]\"
# FEATURE_DATA
";
        let header = read_header(&mut reader(data))?;
        assert_eq!(
            header.spatial_ref,
            Some(SpatialRef::Wkt(
                r#"GEOGCS["WGS 84",DATUM["WGS_1984",SPHEROID["WGS 84",6378137,298.257223563]]]"#
                    .to_string()
            ))
        );

        let header = read_header(&mut reader("# @Jp\"+proj=longlat +datum=WGS84\"\n"))?;
        assert_eq!(
            header.spatial_ref,
            Some(SpatialRef::Proj4("+proj=longlat +datum=WGS84".to_string()))
        );
        Ok(())
    }

    #[test]
    fn drops_malformed_coordinate_system() -> Result<()> {
        let header = read_header(&mut reader("# @Jwnot-wkt\n# @Je4326\n# FEATURE_DATA\n"))?;
        assert_eq!(header.spatial_ref, None);
        assert!(header.complete);
        Ok(())
    }

    #[test]
    fn records_region_stub_and_stops_at_data() -> Result<()> {
        let data = "# @VGMT1.0 @GPOINT\n# REGION_STUB     \n1 2\n";
        let mut reader = reader(data);
        let header = read_header(&mut reader)?;

        assert_eq!(
            header.region_stub,
            Some(RegionStub {
                offset: 19,
                width: 18
            })
        );
        assert!(!header.region_declared);
        assert!(!header.complete);
        assert_eq!(reader.current().text, "1 2");
        Ok(())
    }

    #[test]
    fn malformed_region_is_declared_but_unknown() -> Result<()> {
        let header = read_header(&mut reader("# @R0/10/0\n"))?;
        assert!(header.region_declared);
        assert_eq!(header.region, None);
        Ok(())
    }

    #[test]
    fn rewritten_region_line_stays_rewritable() -> Result<()> {
        let data = "# @VGMT1.0 @GPOINT\n# @R0/1/0/1      \n# FEATURE_DATA\n";
        let header = read_header(&mut reader(data))?;
        assert_eq!(
            header.region_stub,
            Some(RegionStub {
                offset: 19,
                width: 17
            })
        );
        assert_eq!(header.region, Some(Envelope::new(0.0, 1.0, 0.0, 1.0)));
        Ok(())
    }
}
