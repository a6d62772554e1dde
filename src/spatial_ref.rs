//! Coordinate reference system descriptors carried by a GMT layer.
//!
//! A GMT header may declare the coordinate system as an EPSG code
//! (`@Je`), a PROJ string (`@Jp`) or a WKT definition (`@Jw`). The crate
//! keeps the declaration as-is and only checks that it is well formed;
//! it never interprets or transforms coordinates.

use crate::error::{GmtError, Result};

const WKT_ROOT_KEYWORDS: &[&str] = &[
    "PROJCS",
    "GEOGCS",
    "GEOCCS",
    "VERT_CS",
    "LOCAL_CS",
    "COMPD_CS",
    "FITTED_CS",
    "PROJCRS",
    "PROJECTEDCRS",
    "GEOGCRS",
    "GEOGRAPHICCRS",
    "GEODCRS",
    "GEODETICCRS",
    "VERTCRS",
    "VERTICALCRS",
    "ENGCRS",
    "ENGINEERINGCRS",
    "COMPOUNDCRS",
    "BOUNDCRS",
    "DERIVEDPROJCRS",
];

#[derive(Clone, Debug, PartialEq)]
pub enum SpatialRef {
    Epsg(u32),
    Proj4(String),
    Wkt(String),
}

impl SpatialRef {
    /// Parse an EPSG code such as `4326`.
    pub fn from_epsg(code: &str) -> Result<Self> {
        match code.trim().parse::<u32>() {
            Ok(code) if code > 0 => Ok(SpatialRef::Epsg(code)),
            _ => Err(GmtError::Message(format!("invalid EPSG code: {code}"))),
        }
    }

    pub fn from_proj4(definition: &str) -> Result<Self> {
        let definition = definition.trim();
        let has_proj = definition
            .split_whitespace()
            .any(|token| token.starts_with("+proj=") || token.starts_with("+init="));
        if !has_proj {
            return Err(GmtError::Message(format!(
                "invalid PROJ definition: {definition}"
            )));
        }
        Ok(SpatialRef::Proj4(definition.to_string()))
    }

    /// Accept a WKT1 or WKT2 definition whose root keyword is known and
    /// whose brackets balance.
    pub fn from_wkt(definition: &str) -> Result<Self> {
        let definition = definition.trim();
        let invalid = || GmtError::Message(format!("invalid WKT definition: {definition}"));

        let keyword_end = definition.find(['[', '(']).ok_or_else(invalid)?;
        let keyword = definition[..keyword_end].trim();
        if !WKT_ROOT_KEYWORDS
            .iter()
            .any(|known| known.eq_ignore_ascii_case(keyword))
        {
            return Err(invalid());
        }

        let mut depth = 0_i32;
        let mut in_quotes = false;
        for c in definition[keyword_end..].chars() {
            match c {
                '"' => in_quotes = !in_quotes,
                '[' | '(' if !in_quotes => depth += 1,
                ']' | ')' if !in_quotes => {
                    depth -= 1;
                    if depth < 0 {
                        return Err(invalid());
                    }
                }
                _ => {}
            }
        }
        if depth != 0 || in_quotes {
            return Err(invalid());
        }

        Ok(SpatialRef::Wkt(definition.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::SpatialRef;

    #[test]
    fn validates_epsg_codes() {
        assert_eq!(SpatialRef::from_epsg("4326").ok(), Some(SpatialRef::Epsg(4326)));
        assert!(SpatialRef::from_epsg("0").is_err());
        assert!(SpatialRef::from_epsg("WGS84").is_err());
    }

    #[test]
    fn validates_proj_strings() {
        assert!(SpatialRef::from_proj4("+proj=longlat +datum=WGS84 +no_defs").is_ok());
        assert!(SpatialRef::from_proj4("longlat").is_err());
    }

    #[test]
    fn validates_wkt() {
        let wkt = r#"GEOGCS["WGS 84",DATUM["WGS_1984",SPHEROID["WGS 84",6378137,298.257223563]],PRIMEM["Greenwich",0],UNIT["degree",0.0174532925199433]]"#;
        assert_eq!(
            SpatialRef::from_wkt(wkt).ok(),
            Some(SpatialRef::Wkt(wkt.to_string()))
        );
        assert!(SpatialRef::from_wkt(r#"GEOGCS["WGS 84""#).is_err());
        assert!(SpatialRef::from_wkt("POINT (1 2)").is_err());
        assert!(SpatialRef::from_wkt("garbage").is_err());
    }
}
