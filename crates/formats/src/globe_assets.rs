//! The two JSON shapes the globe ships with.
//!
//! - Dot positions: `[[x, y, z], ...]` on a sphere of radius `GLOBE_RADIUS`.
//! - Coordinate map: `[{"xyz": {"x", "y", "z"}, "lat", "lng"}, ...]`, derived
//!   offline from the dot positions.

use std::fmt;
use std::path::PathBuf;

use foundation::math::{
    LONGITUDE_OFFSET_DEG, SphereError, Vec3, normalize_longitude, xyz_to_lat_lng,
};
use scene::{CoordinateMap, CoordinateMapEntry};
use serde::{Deserialize, Serialize};

#[derive(Debug)]
pub enum GlobeAssetError {
    Io {
        path: PathBuf,
        source: std::io::Error,
    },
    Parse(serde_json::Error),
    Serialize(serde_json::Error),
    NonFinite {
        index: usize,
    },
    LatitudeOutOfRange {
        index: usize,
        lat: f64,
    },
    DegeneratePoint {
        index: usize,
        source: SphereError,
    },
    UnsupportedVersion {
        found: String,
    },
    OffsetMismatch {
        found: f64,
    },
    HashMismatch {
        path: PathBuf,
        expected: String,
        found: String,
    },
}

impl fmt::Display for GlobeAssetError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            GlobeAssetError::Io { path, source } => {
                write!(f, "failed to read {}: {source}", path.display())
            }
            GlobeAssetError::Parse(err) => write!(f, "asset parse error: {err}"),
            GlobeAssetError::Serialize(err) => write!(f, "asset serialize error: {err}"),
            GlobeAssetError::NonFinite { index } => {
                write!(f, "entry {index} has a non-finite component")
            }
            GlobeAssetError::LatitudeOutOfRange { index, lat } => {
                write!(f, "entry {index} has latitude {lat} outside [-90, 90]")
            }
            GlobeAssetError::DegeneratePoint { index, source } => {
                write!(f, "dot {index} cannot be converted: {source}")
            }
            GlobeAssetError::UnsupportedVersion { found } => {
                write!(f, "unsupported globe manifest version: {found}")
            }
            GlobeAssetError::OffsetMismatch { found } => write!(
                f,
                "asset was built with a {found} degree longitude offset, expected {LONGITUDE_OFFSET_DEG}"
            ),
            GlobeAssetError::HashMismatch {
                path,
                expected,
                found,
            } => write!(
                f,
                "content hash mismatch for {}: expected {expected}, found {found}",
                path.display()
            ),
        }
    }
}

impl std::error::Error for GlobeAssetError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            GlobeAssetError::Io { source, .. } => Some(source),
            GlobeAssetError::Parse(err) | GlobeAssetError::Serialize(err) => Some(err),
            GlobeAssetError::DegeneratePoint { source, .. } => Some(source),
            _ => None,
        }
    }
}

#[derive(Debug, Copy, Clone, Serialize, Deserialize, PartialEq)]
pub struct XyzRecord {
    pub x: f64,
    pub y: f64,
    pub z: f64,
}

/// One element of the coordinate map asset.
#[derive(Debug, Copy, Clone, Serialize, Deserialize, PartialEq)]
pub struct CoordinateMapRecord {
    pub xyz: XyzRecord,
    pub lat: f64,
    pub lng: f64,
}

impl From<&CoordinateMapEntry> for CoordinateMapRecord {
    fn from(entry: &CoordinateMapEntry) -> Self {
        Self {
            xyz: XyzRecord {
                x: entry.xyz.x,
                y: entry.xyz.y,
                z: entry.xyz.z,
            },
            lat: entry.lat,
            lng: entry.lng,
        }
    }
}

pub fn parse_globe_points(json: &str) -> Result<Vec<Vec3>, GlobeAssetError> {
    let raw: Vec<[f64; 3]> = serde_json::from_str(json).map_err(GlobeAssetError::Parse)?;
    raw.into_iter()
        .enumerate()
        .map(|(index, p)| {
            let v = Vec3::from(p);
            if v.is_finite() {
                Ok(v)
            } else {
                Err(GlobeAssetError::NonFinite { index })
            }
        })
        .collect()
}

pub fn globe_points_to_json(points: &[Vec3]) -> Result<String, GlobeAssetError> {
    let raw: Vec<[f64; 3]> = points.iter().map(|p| p.as_array()).collect();
    serde_json::to_string(&raw).map_err(GlobeAssetError::Serialize)
}

/// Apply the globe coordinate transform to every dot, keeping dot order.
pub fn derive_coordinate_map(points: &[Vec3]) -> Result<CoordinateMap, GlobeAssetError> {
    points
        .iter()
        .enumerate()
        .map(|(index, &p)| {
            let ll = xyz_to_lat_lng(p)
                .map_err(|source| GlobeAssetError::DegeneratePoint { index, source })?;
            Ok(CoordinateMapEntry::new(p, ll.lat, ll.lng))
        })
        .collect()
}

/// Parse and validate a coordinate map asset.
///
/// Longitudes are normalized to `[-180, 180)` so older assets written without
/// wrapping index correctly.
pub fn parse_coordinate_map(json: &str) -> Result<CoordinateMap, GlobeAssetError> {
    let records: Vec<CoordinateMapRecord> =
        serde_json::from_str(json).map_err(GlobeAssetError::Parse)?;

    records
        .into_iter()
        .enumerate()
        .map(|(index, r)| {
            let xyz = Vec3::new(r.xyz.x, r.xyz.y, r.xyz.z);
            if !xyz.is_finite() || !r.lat.is_finite() || !r.lng.is_finite() {
                return Err(GlobeAssetError::NonFinite { index });
            }
            if !(-90.0..=90.0).contains(&r.lat) {
                return Err(GlobeAssetError::LatitudeOutOfRange { index, lat: r.lat });
            }
            Ok(CoordinateMapEntry::new(xyz, r.lat, normalize_longitude(r.lng)))
        })
        .collect()
}

pub fn coordinate_map_to_json(map: &CoordinateMap) -> Result<String, GlobeAssetError> {
    let records: Vec<CoordinateMapRecord> = map.iter().map(CoordinateMapRecord::from).collect();
    serde_json::to_string(&records).map_err(GlobeAssetError::Serialize)
}

/// Hex blake3 digest used to identify asset payloads.
pub fn content_hash(bytes: &[u8]) -> String {
    blake3::hash(bytes).to_hex().to_string()
}

#[cfg(test)]
mod tests {
    use super::{
        GlobeAssetError, content_hash, coordinate_map_to_json, derive_coordinate_map,
        globe_points_to_json, parse_coordinate_map, parse_globe_points,
    };
    use foundation::math::{GLOBE_RADIUS, SphereError, Vec3, lat_lng_to_xyz};
    use pretty_assertions::assert_eq;
    use scene::fibonacci_globe_points;

    #[test]
    fn parses_point_triples() {
        let points = parse_globe_points("[[2.0, 0.0, 0.0], [0, 2, 0]]").expect("parse");
        assert_eq!(points, vec![Vec3::new(2.0, 0.0, 0.0), Vec3::new(0.0, 2.0, 0.0)]);
    }

    #[test]
    fn rejects_malformed_points() {
        let err = parse_globe_points("[[1.0, 2.0]]").expect_err("short triple");
        assert!(matches!(err, GlobeAssetError::Parse(_)));
    }

    #[test]
    fn derived_map_uses_the_offset_convention() {
        let points = vec![
            lat_lng_to_xyz(51.5, 0.0, GLOBE_RADIUS),
            lat_lng_to_xyz(35.68, 139.65, GLOBE_RADIUS),
        ];
        let map = derive_coordinate_map(&points).expect("derive");
        assert_eq!(map.len(), 2);
        assert!((map.entries()[0].lat - 51.5).abs() < 1e-9);
        assert!(map.entries()[0].lng.abs() < 1e-9);
        assert!((map.entries()[1].lng - 139.65).abs() < 1e-9);
    }

    #[test]
    fn derive_reports_degenerate_dot_index() {
        let points = vec![Vec3::new(0.0, 2.0, 0.0), Vec3::ZERO];
        let err = derive_coordinate_map(&points).expect_err("zero dot");
        match err {
            GlobeAssetError::DegeneratePoint { index, source } => {
                assert_eq!(index, 1);
                assert_eq!(source, SphereError::ZeroVector);
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn map_asset_survives_a_write_and_read() {
        let points = fibonacci_globe_points(64, GLOBE_RADIUS);
        let map = derive_coordinate_map(&points).expect("derive");
        let json = coordinate_map_to_json(&map).expect("json");
        assert_eq!(parse_coordinate_map(&json).expect("parse"), map);

        let points_json = globe_points_to_json(&points).expect("json");
        assert_eq!(parse_globe_points(&points_json).expect("parse"), points);
    }

    #[test]
    fn parses_documented_record_shape_and_wraps_longitude() {
        let json = r#"[{"xyz": {"x": 0.0, "y": 0.0, "z": -2.0}, "lat": 0.0, "lng": -270.0}]"#;
        let map = parse_coordinate_map(json).expect("parse");
        assert_eq!(map.entries()[0].lng, 90.0);
        assert_eq!(map.entries()[0].xyz, Vec3::new(0.0, 0.0, -2.0));
    }

    #[test]
    fn rejects_latitude_out_of_range() {
        let json = r#"[{"xyz": {"x": 0.0, "y": 2.0, "z": 0.0}, "lat": 91.0, "lng": 0.0}]"#;
        let err = parse_coordinate_map(json).expect_err("bad lat");
        assert!(matches!(
            err,
            GlobeAssetError::LatitudeOutOfRange { index: 0, .. }
        ));
    }

    #[test]
    fn content_hash_is_stable_hex() {
        let a = content_hash(b"globe");
        assert_eq!(a.len(), 64);
        assert_eq!(a, content_hash(b"globe"));
        assert_ne!(a, content_hash(b"globe!"));
    }
}
