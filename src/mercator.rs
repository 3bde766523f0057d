//! Spherical Web Mercator ↔ geodetic conversion.
//!
//! Closed-form inverse used by the direct strategy to turn world-file meters
//! into degrees. The sphere radius is the WGS 84 semi-major axis; the input is
//! assumed to already be WGS 84 spherical Mercator and nothing here checks it.

use std::f64::consts::PI;

/// Sphere radius in meters (WGS 84 semi-major axis).
pub const EARTH_RADIUS: f64 = 6_378_137.0;

/// Half the projected circumference: x = ±ORIGIN_SHIFT at lon = ±180°.
pub const ORIGIN_SHIFT: f64 = 2.0 * PI * EARTH_RADIUS / 2.0;

/// Convert projected meters to `(lon, lat)` in degrees.
///
/// Non-finite results are possible for pathological input; callers must
/// validate before use.
#[inline]
pub fn meters_to_lon_lat(mx: f64, my: f64) -> (f64, f64) {
    let lon = (mx / ORIGIN_SHIFT) * 180.0;
    let lat = (my / ORIGIN_SHIFT) * 180.0;
    let lat = 180.0 / PI * (2.0 * (lat * PI / 180.0).exp().atan() - PI / 2.0);
    (lon, lat)
}

/// Convert `(lon, lat)` in degrees to projected meters.
#[inline]
pub fn lon_lat_to_meters(lon: f64, lat: f64) -> (f64, f64) {
    let mx = lon * ORIGIN_SHIFT / 180.0;
    let my = ((90.0 + lat) * PI / 360.0).tan().ln() / (PI / 180.0);
    (mx, my * ORIGIN_SHIFT / 180.0)
}
