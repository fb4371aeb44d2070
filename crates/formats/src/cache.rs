use std::path::PathBuf;
use std::sync::{Arc, OnceLock};

use scene::CoordinateMap;
use tracing::{info, warn};

use crate::globe_assets::{GlobeAssetError, parse_coordinate_map};
use crate::globe_package::{GlobePackage, read_to_string};

/// Where a `CoordinateMapCache` reads its map from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CoordinateMapSource {
    /// A bare coordinate map JSON file.
    File(PathBuf),
    /// A globe package directory; the map's content hash is checked.
    Package(PathBuf),
    /// Map JSON already in memory (bundled assets, tests).
    Inline(String),
}

impl CoordinateMapSource {
    fn describe(&self) -> String {
        match self {
            CoordinateMapSource::File(path) => format!("file {}", path.display()),
            CoordinateMapSource::Package(path) => format!("package {}", path.display()),
            CoordinateMapSource::Inline(json) => format!("inline ({} bytes)", json.len()),
        }
    }

    fn read(&self) -> Result<CoordinateMap, GlobeAssetError> {
        match self {
            CoordinateMapSource::File(path) => parse_coordinate_map(&read_to_string(path)?),
            CoordinateMapSource::Package(root) => GlobePackage::load(root)?.read_coordinate_map(),
            CoordinateMapSource::Inline(json) => parse_coordinate_map(json),
        }
    }
}

/// Loads the coordinate map on first use and keeps it for the cache's lifetime.
///
/// A failed load is returned to the caller and not remembered; the next
/// `load` tries again. Once loaded the map is never replaced or evicted.
#[derive(Debug)]
pub struct CoordinateMapCache {
    source: CoordinateMapSource,
    map: OnceLock<Arc<CoordinateMap>>,
}

impl CoordinateMapCache {
    pub fn new(source: CoordinateMapSource) -> Self {
        Self {
            source,
            map: OnceLock::new(),
        }
    }

    pub fn source(&self) -> &CoordinateMapSource {
        &self.source
    }

    pub fn load(&self) -> Result<Arc<CoordinateMap>, GlobeAssetError> {
        if let Some(map) = self.map.get() {
            return Ok(Arc::clone(map));
        }

        let map = self.source.read().inspect_err(|err| {
            warn!(source = %self.source.describe(), "coordinate map load failed: {err}");
        })?;
        info!(
            source = %self.source.describe(),
            entries = map.len(),
            "loaded coordinate map"
        );

        // Another thread may have won the race; either copy is equivalent.
        Ok(Arc::clone(self.map.get_or_init(|| Arc::new(map))))
    }

    /// The cached map, without triggering a load.
    pub fn get(&self) -> Option<Arc<CoordinateMap>> {
        self.map.get().cloned()
    }

    pub fn is_loaded(&self) -> bool {
        self.map.get().is_some()
    }
}

#[cfg(test)]
mod tests {
    use std::fs;
    use std::sync::Arc;

    use super::{CoordinateMapCache, CoordinateMapSource};
    use crate::globe_assets::{GlobeAssetError, coordinate_map_to_json, derive_coordinate_map};
    use crate::globe_package::{GlobePackage, tests::temp_dir};
    use foundation::math::GLOBE_RADIUS;
    use scene::fibonacci_globe_points;

    fn sample_json(count: usize) -> String {
        let map = derive_coordinate_map(&fibonacci_globe_points(count, GLOBE_RADIUS))
            .expect("derive");
        coordinate_map_to_json(&map).expect("json")
    }

    #[test]
    fn loads_lazily_and_once() {
        let cache = CoordinateMapCache::new(CoordinateMapSource::Inline(sample_json(50)));
        assert!(!cache.is_loaded());
        assert!(cache.get().is_none());

        let first = cache.load().expect("load");
        let second = cache.load().expect("load");
        assert!(cache.is_loaded());
        assert_eq!(first.len(), 50);
        assert!(Arc::ptr_eq(&first, &second));
        assert!(Arc::ptr_eq(&first, &cache.get().expect("cached")));
    }

    #[test]
    fn failed_load_is_reported_and_retried() {
        let root = temp_dir("cache_retry");
        let path = root.join("map.json");
        let cache = CoordinateMapCache::new(CoordinateMapSource::File(path.clone()));

        let err = cache.load().expect_err("missing file");
        assert!(matches!(err, GlobeAssetError::Io { .. }));
        assert!(!cache.is_loaded());

        fs::write(&path, sample_json(12)).expect("write map");
        assert_eq!(cache.load().expect("load after fix").len(), 12);
    }

    #[test]
    fn parse_errors_surface_from_inline_source() {
        let cache = CoordinateMapCache::new(CoordinateMapSource::Inline("{".to_string()));
        assert!(matches!(cache.load(), Err(GlobeAssetError::Parse(_))));
    }

    #[test]
    fn loads_from_package_directory() {
        let root = temp_dir("cache_package");
        let points = fibonacci_globe_points(30, GLOBE_RADIUS);
        GlobePackage::write(&root, None, &points).expect("write");

        let cache = CoordinateMapCache::new(CoordinateMapSource::Package(root));
        assert_eq!(cache.load().expect("load").len(), 30);
    }

    #[test]
    fn cache_is_shareable_across_threads() {
        let cache = Arc::new(CoordinateMapCache::new(CoordinateMapSource::Inline(
            sample_json(40),
        )));
        let handles: Vec<_> = (0..4)
            .map(|_| {
                let cache = Arc::clone(&cache);
                std::thread::spawn(move || cache.load().expect("load").len())
            })
            .collect();
        for h in handles {
            assert_eq!(h.join().expect("join"), 40);
        }
    }
}
