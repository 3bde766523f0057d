//! Pure-Rust [`GeoBackend`]: GeoTIFF tags + EPSG registry + PROJ transforms.
//!
//! | Concern | Crate |
//! |---|---|
//! | TIFF directory / GeoTIFF tags | `tiff` |
//! | EPSG code → PROJ string + WKT | `crs-definitions` |
//! | Coordinate transforms | `proj4rs` |
//!
//! Non-TIFF rasters (PNG) carry no projection metadata, so they come back
//! with `spatial_ref: None` and are never transformed.

use super::srs::WGS84_LONGLAT;
use super::{Dataset, GeoBackend, GeoTransform, GeorefError, SpatialRef};
use crate::header::read_header;
use proj4rs::proj::Proj;
use proj4rs::transform::transform;
use std::fs::File;
use std::io::BufReader;
use std::path::Path;
use tiff::decoder::Decoder;
use tiff::tags::Tag;
use tracing::debug;

// GeoKey ids (GeoTIFF 1.0 §6.2)
const GT_MODEL_TYPE: u16 = 1024;
const GT_RASTER_TYPE: u16 = 1025;
const GEOGRAPHIC_TYPE: u16 = 2048;
const GEOG_GEODETIC_DATUM: u16 = 2050;
const PROJECTED_CS_TYPE: u16 = 3072;

const MODEL_PROJECTED: u16 = 1;
const MODEL_GEOGRAPHIC: u16 = 2;
const RASTER_PIXEL_IS_POINT: u16 = 2;
const USER_DEFINED: u16 = 32767;
const DATUM_WGS84: u16 = 6326;

/// GeoTIFF-capable backend. Stateless; each call opens its own file handle.
#[derive(Debug, Default)]
pub struct GeoTiffBackend;

impl GeoTiffBackend {
    pub fn new() -> Self {
        Self
    }
}

fn is_tiff(path: &Path) -> bool {
    path.extension()
        .and_then(|e| e.to_str())
        .is_some_and(|e| e.eq_ignore_ascii_case("tif") || e.eq_ignore_ascii_case("tiff"))
}

fn tiff_err(path: &Path, e: tiff::TiffError) -> GeorefError {
    GeorefError::Unsupported(format!("{}: {e}", path.display()))
}

/// Short-valued GeoKeys stored inline in the key directory.
///
/// Directory layout: a 4-short header (version, revision, minor, count)
/// followed by `count` entries of (key, location, count, value). Only entries
/// with `location == 0` hold their value inline.
fn inline_geo_keys(directory: &[u16]) -> Vec<(u16, u16)> {
    let Some(&count) = directory.get(3) else {
        return Vec::new();
    };
    directory[4..]
        .chunks_exact(4)
        .take(count as usize)
        .filter(|entry| entry[1] == 0)
        .map(|entry| (entry[0], entry[3]))
        .collect()
}

fn geo_key(keys: &[(u16, u16)], id: u16) -> Option<u16> {
    keys.iter().find(|(k, _)| *k == id).map(|(_, v)| *v)
}

/// Spatial reference from GeoKeys.
///
/// A projected model must name a registered projected CRS; anything else
/// (user-defined or unknown code) has no usable spatial reference, even when
/// the geographic base keys say WGS 84. The geographic keys are only read for
/// a geographic model or when the model type is absent. A user-defined
/// geographic CRS is accepted only when its datum key names WGS 84.
fn spatial_ref_from_keys(keys: &[(u16, u16)]) -> Option<SpatialRef> {
    let registered = |code: u16| -> Option<SpatialRef> {
        let def = crs_definitions::from_code(code)?;
        Some(SpatialRef::from_definition(Some(code), def.proj4, Some(def.wkt)))
    };

    let model = geo_key(keys, GT_MODEL_TYPE);
    match geo_key(keys, PROJECTED_CS_TYPE) {
        Some(USER_DEFINED) => return None,
        Some(code) => return registered(code),
        None if model == Some(MODEL_PROJECTED) => return None,
        None => {}
    }
    if !matches!(model, None | Some(MODEL_GEOGRAPHIC)) {
        return None;
    }
    match geo_key(keys, GEOGRAPHIC_TYPE) {
        Some(USER_DEFINED) | None => match geo_key(keys, GEOG_GEODETIC_DATUM) {
            Some(DATUM_WGS84) => Some(SpatialRef {
                epsg: None,
                ..SpatialRef::wgs84()
            }),
            _ => None,
        },
        Some(code) => registered(code),
    }
}

fn open_geotiff(path: &Path) -> Result<Dataset, GeorefError> {
    let file = BufReader::new(File::open(path)?);
    let mut decoder = Decoder::new(file).map_err(|e| tiff_err(path, e))?;
    let (width, height) = decoder.dimensions().map_err(|e| tiff_err(path, e))?;

    let mut f64_tag = |tag: Tag| -> Result<Option<Vec<f64>>, GeorefError> {
        decoder
            .find_tag(tag)
            .and_then(|v| v.map(|v| v.into_f64_vec()).transpose())
            .map_err(|e| tiff_err(path, e))
    };
    let transformation = f64_tag(Tag::ModelTransformationTag)?;
    let tiepoint = f64_tag(Tag::ModelTiepointTag)?;
    let scale = f64_tag(Tag::ModelPixelScaleTag)?;

    let keys = decoder
        .find_tag(Tag::GeoKeyDirectoryTag)
        .and_then(|v| v.map(|v| v.into_u16_vec()).transpose())
        .map_err(|e| tiff_err(path, e))?
        .map(|dir| inline_geo_keys(&dir))
        .unwrap_or_default();

    let mut gt = match (transformation, tiepoint, scale) {
        (Some(m), _, _) if m.len() >= 8 => [m[3], m[0], m[1], m[7], m[4], m[5]],
        (_, Some(tp), Some(sc)) if tp.len() >= 6 && sc.len() >= 2 => {
            let (i, j, x, y) = (tp[0], tp[1], tp[3], tp[4]);
            [x - i * sc[0], sc[0], 0.0, y + j * sc[1], 0.0, -sc[1]]
        }
        _ => {
            return Err(GeorefError::NotGeoreferenced(path.display().to_string()));
        }
    };

    // PixelIsPoint rasters anchor the tiepoint on the pixel center.
    if geo_key(&keys, GT_RASTER_TYPE) == Some(RASTER_PIXEL_IS_POINT) {
        gt[0] -= 0.5 * gt[1] + 0.5 * gt[2];
        gt[3] -= 0.5 * gt[4] + 0.5 * gt[5];
    }

    Ok(Dataset {
        spatial_ref: spatial_ref_from_keys(&keys),
        geo_transform: GeoTransform(gt),
        width,
        height,
    })
}

/// PNG carries no projection metadata. Only the pixel size is read; the
/// geotransform is the identity and is never used, since a dataset without a
/// spatial reference is rejected before any corner is transformed.
fn open_untagged(path: &Path) -> Result<Dataset, GeorefError> {
    let header = read_header(path).map_err(|e| GeorefError::Unsupported(format!("{}: {e}", path.display())))?;
    debug!(tile = %path.display(), "no projection metadata");
    Ok(Dataset {
        spatial_ref: None,
        geo_transform: GeoTransform::IDENTITY,
        width: header.width,
        height: header.height,
    })
}

impl GeoBackend for GeoTiffBackend {
    fn name(&self) -> &'static str {
        "geotiff"
    }

    fn open(&self, path: &Path) -> Result<Dataset, GeorefError> {
        if is_tiff(path) {
            open_geotiff(path)
        } else {
            open_untagged(path)
        }
    }

    fn to_geographic(&self, srs: &SpatialRef, x: f64, y: f64) -> Result<(f64, f64), GeorefError> {
        let proj_err = |e: proj4rs::errors::Error| GeorefError::Transform(format!("{}: {e:?}", srs.describe()));
        let src = Proj::from_proj_string(&srs.proj4).map_err(proj_err)?;
        let dst = Proj::from_proj_string(WGS84_LONGLAT).map_err(proj_err)?;

        // proj4rs works in radians for geographic systems.
        let mut point = if src.is_latlong() {
            (x.to_radians(), y.to_radians(), 0.0)
        } else {
            (x, y, 0.0)
        };
        transform(&src, &dst, &mut point).map_err(proj_err)?;
        Ok((point.0.to_degrees(), point.1.to_degrees()))
    }
}
