//! Bounding boxes in projected and geographic space.
//!
//! Both box types can only be built through their validating constructors, so
//! a box that exists is a box whose upper-left corner lies strictly west and
//! strictly north of its lower-right corner. A tile whose corners violate this
//! is skipped, never silently flipped.

use serde::Serialize;
use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum GeometryError {
    #[error("upper left x {upper_left} is not less than lower right x {lower_right}")]
    InvertedX { upper_left: f64, lower_right: f64 },
    #[error("upper left y {upper_left} is not greater than lower right y {lower_right}")]
    InvertedY { upper_left: f64, lower_right: f64 },
    #[error("non-finite coordinate ({x}, {y})")]
    NonFinite { x: f64, y: f64 },
    #[error("longitude {lon} / latitude {lat} outside the valid range")]
    OutOfRange { lon: f64, lat: f64 },
}

/// A point in projected map units (x east, y north).
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct ProjectedPoint {
    pub x: f64,
    pub y: f64,
}

impl ProjectedPoint {
    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }
}

/// Upper-left and lower-right corners of a tile in projected units.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct ProjectedBounds {
    pub upper_left: ProjectedPoint,
    pub lower_right: ProjectedPoint,
}

impl ProjectedBounds {
    pub fn new(upper_left: ProjectedPoint, lower_right: ProjectedPoint) -> Result<Self, GeometryError> {
        check_corners(
            (upper_left.x, upper_left.y),
            (lower_right.x, lower_right.y),
        )?;
        Ok(Self {
            upper_left,
            lower_right,
        })
    }
}

/// Geographic rectangle enclosing a tile, in degrees.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct GeoBoundingBox {
    pub upper_left_lat: f64,
    pub upper_left_lon: f64,
    pub lower_right_lat: f64,
    pub lower_right_lon: f64,
}

impl GeoBoundingBox {
    /// Build a box from `(lon, lat)` corner pairs. Longitudes must lie in
    /// [-180, 180] and latitudes in [-90, 90].
    pub fn from_corners(upper_left: (f64, f64), lower_right: (f64, f64)) -> Result<Self, GeometryError> {
        check_corners(upper_left, lower_right)?;
        for (lon, lat) in [upper_left, lower_right] {
            if lon.abs() > 180.0 || lat.abs() > 90.0 {
                return Err(GeometryError::OutOfRange { lon, lat });
            }
        }
        Ok(Self {
            upper_left_lat: upper_left.1,
            upper_left_lon: upper_left.0,
            lower_right_lat: lower_right.1,
            lower_right_lon: lower_right.0,
        })
    }
}

fn check_corners(upper_left: (f64, f64), lower_right: (f64, f64)) -> Result<(), GeometryError> {
    for (x, y) in [upper_left, lower_right] {
        if !x.is_finite() || !y.is_finite() {
            return Err(GeometryError::NonFinite { x, y });
        }
    }
    // Negated comparisons would let NaN through; finiteness is checked above.
    if upper_left.0 >= lower_right.0 {
        return Err(GeometryError::InvertedX {
            upper_left: upper_left.0,
            lower_right: lower_right.0,
        });
    }
    if upper_left.1 <= lower_right.1 {
        return Err(GeometryError::InvertedY {
            upper_left: upper_left.1,
            lower_right: lower_right.1,
        });
    }
    Ok(())
}
