use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;

use foundation::math::{Vec3, xyz_to_lat_lng};
use tracing::debug;

use crate::coordinate_map::CoordinateMap;
use crate::picking::{ClosestCoordinate, NearestLookup, closest_among};

#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub struct GridResolution {
    pub lat_cells: u32,
    pub lng_cells: u32,
}

impl GridResolution {
    pub const fn new(lat_cells: u32, lng_cells: u32) -> Self {
        Self {
            lat_cells,
            lng_cells,
        }
    }

    pub fn lat_step(&self) -> f64 {
        180.0 / self.lat_cells as f64
    }

    pub fn lng_step(&self) -> f64 {
        360.0 / self.lng_cells as f64
    }
}

impl Default for GridResolution {
    /// 5 degree rows, 10 degree columns.
    fn default() -> Self {
        Self::new(36, 36)
    }
}

/// Grid cell address: `(latitude row, longitude column)`.
#[derive(Debug, Copy, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct CellKey {
    pub lat_index: u32,
    pub lng_index: u32,
}

impl fmt::Display for CellKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{},{}", self.lat_index, self.lng_index)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SpatialIndexError {
    EmptyGrid { lat_cells: u32, lng_cells: u32 },
}

impl fmt::Display for SpatialIndexError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SpatialIndexError::EmptyGrid {
                lat_cells,
                lng_cells,
            } => write!(f, "grid needs at least one cell per axis: {lat_cells}x{lng_cells}"),
        }
    }
}

impl std::error::Error for SpatialIndexError {}

/// Latitude/longitude grid over a shared `CoordinateMap`.
///
/// Lookups search the query's cell and its 8 neighbors. Latitude rows clamp at
/// the poles; longitude columns wrap across the antimeridian. A true nearest
/// dot lying outside that 3x3 window is missed, which is acceptable for
/// evenly spaced dots away from the poles.
///
/// The index is immutable after `build`.
#[derive(Debug, Clone)]
pub struct GlobeSpatialIndex {
    map: Arc<CoordinateMap>,
    resolution: GridResolution,
    cells: BTreeMap<CellKey, Vec<usize>>,
}

impl GlobeSpatialIndex {
    pub fn build(
        map: Arc<CoordinateMap>,
        resolution: GridResolution,
    ) -> Result<Self, SpatialIndexError> {
        if resolution.lat_cells == 0 || resolution.lng_cells == 0 {
            return Err(SpatialIndexError::EmptyGrid {
                lat_cells: resolution.lat_cells,
                lng_cells: resolution.lng_cells,
            });
        }

        let mut cells: BTreeMap<CellKey, Vec<usize>> = BTreeMap::new();
        for (index, entry) in map.iter().enumerate() {
            let key = cell_key(resolution, entry.lat, entry.lng);
            cells.entry(key).or_default().push(index);
        }

        debug!(
            entries = map.len(),
            occupied = cells.len(),
            lat_cells = resolution.lat_cells,
            lng_cells = resolution.lng_cells,
            "built globe spatial index"
        );

        Ok(Self {
            map,
            resolution,
            cells,
        })
    }

    pub fn map(&self) -> &Arc<CoordinateMap> {
        &self.map
    }

    pub fn resolution(&self) -> GridResolution {
        self.resolution
    }

    pub fn len(&self) -> usize {
        self.map.len()
    }

    pub fn is_empty(&self) -> bool {
        self.map.is_empty()
    }

    pub fn occupied_cells(&self) -> usize {
        self.cells.len()
    }

    pub fn cell_of(&self, lat: f64, lng: f64) -> CellKey {
        cell_key(self.resolution, lat, lng)
    }

    pub fn cell_len(&self, key: CellKey) -> usize {
        self.cells.get(&key).map_or(0, Vec::len)
    }

    /// The 3x3 block of cells around `center`, each listed once.
    pub fn search_window(&self, center: CellKey) -> Vec<CellKey> {
        let GridResolution {
            lat_cells,
            lng_cells,
        } = self.resolution;

        let mut keys = Vec::with_capacity(9);
        for d_lat in -1i64..=1 {
            let lat_index = center.lat_index as i64 + d_lat;
            if lat_index < 0 || lat_index >= lat_cells as i64 {
                continue;
            }
            for d_lng in -1i64..=1 {
                let lng_index = (center.lng_index as i64 + d_lng).rem_euclid(lng_cells as i64);
                let key = CellKey {
                    lat_index: lat_index as u32,
                    lng_index: lng_index as u32,
                };
                if !keys.contains(&key) {
                    keys.push(key);
                }
            }
        }
        keys
    }

    /// Nearest dot within the query's search window.
    ///
    /// Distance metric and tie-break match `find_closest_coordinate`.
    /// Returns `None` when the query has no direction or the window is empty.
    pub fn find_nearest(&self, point: Vec3) -> Option<ClosestCoordinate> {
        let query = point.normalized()?;
        let estimate = xyz_to_lat_lng(point).ok()?;
        let center = self.cell_of(estimate.lat, estimate.lng);

        let candidates = self
            .search_window(center)
            .into_iter()
            .filter_map(|key| self.cells.get(&key))
            .flatten()
            .copied();

        closest_among(&self.map, query, candidates)
    }
}

impl NearestLookup for GlobeSpatialIndex {
    fn nearest(&self, point: Vec3) -> Option<ClosestCoordinate> {
        self.find_nearest(point)
    }
}

fn cell_key(resolution: GridResolution, lat: f64, lng: f64) -> CellKey {
    CellKey {
        lat_index: bucket(lat + 90.0, resolution.lat_step(), resolution.lat_cells),
        lng_index: bucket(lng + 180.0, resolution.lng_step(), resolution.lng_cells),
    }
}

fn bucket(offset: f64, step: f64, cells: u32) -> u32 {
    let raw = (offset / step).floor();
    // `as` saturates NaN to 0 and negatives to 0; the upper edge is clamped.
    (raw as u32).min(cells - 1)
}
