use foundation::math::{GLOBE_RADIUS, LONGITUDE_OFFSET_DEG};
use serde::{Deserialize, Serialize};

pub const MANIFEST_VERSION: &str = "1.0";

/// Describes a directory holding the dot positions and the coordinate map
/// derived from them.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct GlobeManifest {
    pub version: String,
    pub name: Option<String>,
    pub radius: f64,
    /// Longitude correction the map was derived with.
    pub longitude_offset_deg: f64,
    pub points: AssetEntry,
    pub coordinate_map: AssetEntry,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct AssetEntry {
    pub path: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub content_hash: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub count: Option<u32>,
}

impl AssetEntry {
    pub fn new(path: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            content_hash: None,
            count: None,
        }
    }
}

impl GlobeManifest {
    pub fn new(points_path: impl Into<String>, map_path: impl Into<String>) -> Self {
        Self {
            version: MANIFEST_VERSION.to_string(),
            name: None,
            radius: GLOBE_RADIUS,
            longitude_offset_deg: LONGITUDE_OFFSET_DEG,
            points: AssetEntry::new(points_path),
            coordinate_map: AssetEntry::new(map_path),
        }
    }
}
