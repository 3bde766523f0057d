//! Spatial reference descriptors and geodetic-datum equivalence.

/// Canonical WKT name of the WGS 84 datum.
pub const WGS84_DATUM: &str = "WGS_1984";

/// PROJ string of the WGS 84 geographic system.
pub const WGS84_LONGLAT: &str = "+proj=longlat +datum=WGS84 +no_defs";

/// A coordinate reference system as far as the delegated strategy cares:
/// how to build a transform (`proj4`) and which datum it sits on.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SpatialRef {
    /// EPSG code, when the CRS came from the EPSG registry.
    pub epsg: Option<u16>,
    pub proj4: String,
    /// Datum name of the geographic base, if it could be determined.
    pub datum: Option<String>,
}

impl SpatialRef {
    pub fn wgs84() -> Self {
        Self {
            epsg: Some(4326),
            proj4: WGS84_LONGLAT.to_string(),
            datum: Some(WGS84_DATUM.to_string()),
        }
    }

    /// Build from a registry definition. The datum comes from the WKT's
    /// geographic base when present, else from a `+datum=` PROJ parameter.
    pub fn from_definition(epsg: Option<u16>, proj4: &str, wkt: Option<&str>) -> Self {
        let datum = wkt
            .and_then(datum_from_wkt)
            .or_else(|| datum_from_proj4(proj4));
        Self {
            epsg,
            proj4: proj4.to_string(),
            datum,
        }
    }

    /// True when both systems share the same geographic datum.
    ///
    /// An undetermined datum never matches anything, itself included.
    pub fn is_same_geodetic_base(&self, other: &SpatialRef) -> bool {
        match (&self.datum, &other.datum) {
            (Some(a), Some(b)) => canonical_datum(a) == canonical_datum(b),
            _ => false,
        }
    }

    pub fn describe(&self) -> String {
        match (self.epsg, &self.datum) {
            (Some(code), Some(datum)) => format!("EPSG:{code} ({datum})"),
            (Some(code), None) => format!("EPSG:{code}"),
            (None, Some(datum)) => format!("user-defined ({datum})"),
            (None, None) => format!("user-defined ({})", self.proj4),
        }
    }
}

/// First `DATUM["name"` in a WKT string. In a projected CRS the first datum
/// is the one of the nested geographic base.
fn datum_from_wkt(wkt: &str) -> Option<String> {
    let start = wkt.find("DATUM[")? + "DATUM[".len();
    let rest = wkt[start..].strip_prefix('"')?;
    let end = rest.find('"')?;
    Some(rest[..end].to_string())
}

fn datum_from_proj4(proj4: &str) -> Option<String> {
    proj4
        .split_whitespace()
        .find_map(|token| token.strip_prefix("+datum="))
        .map(|name| match name {
            "WGS84" => WGS84_DATUM.to_string(),
            other => other.to_string(),
        })
}

/// Uppercase alphanumerics with the common WGS 84 spellings folded together.
fn canonical_datum(name: &str) -> String {
    let folded: String = name
        .chars()
        .filter(|c| c.is_ascii_alphanumeric())
        .map(|c| c.to_ascii_uppercase())
        .collect();
    match folded.as_str() {
        "WGS84" | "WGS1984" | "WORLDGEODETICSYSTEM1984" | "WORLDGEODETICSYSTEM1984ENSEMBLE" => {
            "WGS1984".to_string()
        }
        _ => folded,
    }
}
