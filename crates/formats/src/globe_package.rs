use std::fs;
use std::path::{Path, PathBuf};

use foundation::math::{LONGITUDE_OFFSET_DEG, Vec3};
use scene::CoordinateMap;

use crate::globe_assets::{
    GlobeAssetError, content_hash, coordinate_map_to_json, derive_coordinate_map,
    globe_points_to_json, parse_coordinate_map, parse_globe_points,
};
use crate::manifest::{GlobeManifest, MANIFEST_VERSION};

pub const MANIFEST_FILE_NAME: &str = "globe.manifest.json";
pub const POINTS_FILE_NAME: &str = "globe-points.json";
pub const COORDINATE_MAP_FILE_NAME: &str = "coordinate-map.json";

/// A directory with a `GlobeManifest` and the assets it lists.
#[derive(Debug, Clone)]
pub struct GlobePackage {
    root: PathBuf,
    manifest: GlobeManifest,
}

impl GlobePackage {
    pub fn load(root: impl AsRef<Path>) -> Result<Self, GlobeAssetError> {
        let root = root.as_ref().to_path_buf();
        let manifest_path = root.join(MANIFEST_FILE_NAME);
        let payload = read_to_string(&manifest_path)?;
        let manifest: GlobeManifest =
            serde_json::from_str(&payload).map_err(GlobeAssetError::Parse)?;

        if manifest.version != MANIFEST_VERSION {
            return Err(GlobeAssetError::UnsupportedVersion {
                found: manifest.version,
            });
        }
        if manifest.longitude_offset_deg != LONGITUDE_OFFSET_DEG {
            return Err(GlobeAssetError::OffsetMismatch {
                found: manifest.longitude_offset_deg,
            });
        }

        Ok(Self { root, manifest })
    }

    /// Derive the coordinate map from `points` and write a complete package.
    pub fn write(
        root: impl AsRef<Path>,
        name: Option<String>,
        points: &[Vec3],
    ) -> Result<Self, GlobeAssetError> {
        let root = root.as_ref().to_path_buf();
        fs::create_dir_all(&root).map_err(|source| GlobeAssetError::Io {
            path: root.clone(),
            source,
        })?;

        let map = derive_coordinate_map(points)?;
        let points_json = globe_points_to_json(points)?;
        let map_json = coordinate_map_to_json(&map)?;

        let mut manifest = GlobeManifest::new(POINTS_FILE_NAME, COORDINATE_MAP_FILE_NAME);
        manifest.name = name;
        manifest.points.content_hash = Some(content_hash(points_json.as_bytes()));
        manifest.points.count = Some(points.len() as u32);
        manifest.coordinate_map.content_hash = Some(content_hash(map_json.as_bytes()));
        manifest.coordinate_map.count = Some(map.len() as u32);

        write_file(&root.join(POINTS_FILE_NAME), &points_json)?;
        write_file(&root.join(COORDINATE_MAP_FILE_NAME), &map_json)?;
        let manifest_json =
            serde_json::to_string_pretty(&manifest).map_err(GlobeAssetError::Serialize)?;
        write_file(&root.join(MANIFEST_FILE_NAME), &manifest_json)?;

        Ok(Self { root, manifest })
    }

    pub fn manifest(&self) -> &GlobeManifest {
        &self.manifest
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn points_path(&self) -> PathBuf {
        self.root.join(&self.manifest.points.path)
    }

    pub fn coordinate_map_path(&self) -> PathBuf {
        self.root.join(&self.manifest.coordinate_map.path)
    }

    pub fn read_points(&self) -> Result<Vec<Vec3>, GlobeAssetError> {
        let path = self.points_path();
        let payload = read_to_string(&path)?;
        verify_hash(&path, self.manifest.points.content_hash.as_deref(), &payload)?;
        parse_globe_points(&payload)
    }

    /// Read the coordinate map, checking its content hash when the manifest
    /// records one.
    pub fn read_coordinate_map(&self) -> Result<CoordinateMap, GlobeAssetError> {
        let path = self.coordinate_map_path();
        let payload = read_to_string(&path)?;
        verify_hash(
            &path,
            self.manifest.coordinate_map.content_hash.as_deref(),
            &payload,
        )?;
        parse_coordinate_map(&payload)
    }
}

pub(crate) fn read_to_string(path: &Path) -> Result<String, GlobeAssetError> {
    fs::read_to_string(path).map_err(|source| GlobeAssetError::Io {
        path: path.to_path_buf(),
        source,
    })
}

fn write_file(path: &Path, payload: &str) -> Result<(), GlobeAssetError> {
    fs::write(path, payload).map_err(|source| GlobeAssetError::Io {
        path: path.to_path_buf(),
        source,
    })
}

fn verify_hash(path: &Path, expected: Option<&str>, payload: &str) -> Result<(), GlobeAssetError> {
    let Some(expected) = expected else {
        return Ok(());
    };
    let found = content_hash(payload.as_bytes());
    if found != expected {
        return Err(GlobeAssetError::HashMismatch {
            path: path.to_path_buf(),
            expected: expected.to_string(),
            found,
        });
    }
    Ok(())
}
