//! Spherical <-> Cartesian conversion for the dotted globe.
//!
//! Globe space has +Y through the north pole. The dot layout is authored from
//! the +X axis rather than +Z, so longitudes read off `atan2(x, z)` carry a
//! fixed `LONGITUDE_OFFSET_DEG` correction. Both directions apply it; a map
//! built with only one of them is rotated by a quarter turn.

use std::fmt;

use super::Vec3;

/// Radius of the rendered globe, in scene units.
pub const GLOBE_RADIUS: f64 = 2.0;

/// Longitude correction between `atan2(x, z)` and geographic longitude.
pub const LONGITUDE_OFFSET_DEG: f64 = 90.0;

/// Geographic coordinates in degrees.
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct LatLng {
    pub lat: f64,
    pub lng: f64,
}

impl LatLng {
    pub fn new(lat: f64, lng: f64) -> Self {
        Self { lat, lng }
    }
}

#[derive(Debug, Copy, Clone, PartialEq)]
pub enum SphereError {
    /// The point sits at the globe center; it has no direction.
    ZeroVector,
    NonFinite { x: f64, y: f64, z: f64 },
}

impl fmt::Display for SphereError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SphereError::ZeroVector => write!(f, "point is at the globe center"),
            SphereError::NonFinite { x, y, z } => {
                write!(f, "point has non-finite components: ({x}, {y}, {z})")
            }
        }
    }
}

impl std::error::Error for SphereError {}

/// Wrap a longitude into `[-180, 180)`. In-range values are returned as is.
pub fn normalize_longitude(lng: f64) -> f64 {
    if (-180.0..180.0).contains(&lng) {
        return lng;
    }
    let wrapped = (lng + 180.0).rem_euclid(360.0) - 180.0;
    // rem_euclid may round up to exactly 360 for tiny negative inputs.
    if wrapped >= 180.0 {
        wrapped - 360.0
    } else {
        wrapped
    }
}

/// `atan2(x, z)` in degrees, without the layout correction.
pub fn raw_longitude_deg(point: Vec3) -> f64 {
    point.x.atan2(point.z).to_degrees()
}

pub fn xyz_to_lat_lng(point: Vec3) -> Result<LatLng, SphereError> {
    if !point.is_finite() {
        return Err(SphereError::NonFinite {
            x: point.x,
            y: point.y,
            z: point.z,
        });
    }

    let scaled = point.rescaled().ok_or(SphereError::ZeroVector)?;
    let polar = (scaled.y / scaled.length()).clamp(-1.0, 1.0).acos();
    let lat = 90.0 - polar.to_degrees();
    let lng = normalize_longitude(raw_longitude_deg(point) - LONGITUDE_OFFSET_DEG);

    Ok(LatLng::new(lat, lng))
}

pub fn lat_lng_to_xyz(lat: f64, lng: f64, radius: f64) -> Vec3 {
    let lat_rad = lat.to_radians();
    let theta = (lng + LONGITUDE_OFFSET_DEG).to_radians();
    let ring = radius * lat_rad.cos();

    Vec3::new(ring * theta.sin(), radius * lat_rad.sin(), ring * theta.cos())
}
