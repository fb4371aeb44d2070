use foundation::math::precision::stable_total_cmp_f64;
use foundation::math::{GLOBE_RADIUS, SphereError, Vec3, xyz_to_lat_lng};
use tracing::debug;

use crate::coordinate_map::{CoordinateMap, CoordinateMapEntry};

/// Closest precomputed dot to a query point.
///
/// `distance` is measured on the unit sphere (both the query and the dot are
/// scaled to radius 1 before comparing).
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct ClosestCoordinate {
    pub lat: f64,
    pub lng: f64,
    pub distance: f64,
    /// Index of the matched entry in its `CoordinateMap`.
    pub index: usize,
}

/// Anything that can answer "which dot is nearest to this point".
pub trait NearestLookup {
    fn nearest(&self, point: Vec3) -> Option<ClosestCoordinate>;
}

impl NearestLookup for CoordinateMap {
    fn nearest(&self, point: Vec3) -> Option<ClosestCoordinate> {
        find_closest_coordinate(self, point)
    }
}

impl<T: NearestLookup + ?Sized> NearestLookup for std::sync::Arc<T> {
    fn nearest(&self, point: Vec3) -> Option<ClosestCoordinate> {
        (**self).nearest(point)
    }
}

/// Brute-force nearest dot.
///
/// Ordering contract:
/// - The smallest distance wins.
/// - On an exact tie, the entry with the lower index wins.
///
/// Returns `None` for an empty map or a query with no direction (zero or
/// non-finite).
pub fn find_closest_coordinate(map: &CoordinateMap, point: Vec3) -> Option<ClosestCoordinate> {
    let query = point.normalized()?;
    closest_among(map, query, 0..map.len())
}

/// Scan `candidates` (indices into `map`) for the entry closest to `query_unit`.
pub(crate) fn closest_among<I>(
    map: &CoordinateMap,
    query_unit: Vec3,
    candidates: I,
) -> Option<ClosestCoordinate>
where
    I: IntoIterator<Item = usize>,
{
    let scale = 1.0 / GLOBE_RADIUS;
    let mut best: Option<(f64, usize)> = None;

    for index in candidates {
        let Some(entry) = map.get(index) else {
            continue;
        };
        let d2 = (entry.xyz * scale).distance_squared(query_unit);

        best = match best {
            None => Some((d2, index)),
            Some((bd2, bi)) => {
                let ord = stable_total_cmp_f64(d2, bd2).then_with(|| index.cmp(&bi));
                if ord.is_lt() {
                    Some((d2, index))
                } else {
                    Some((bd2, bi))
                }
            }
        };
    }

    let (d2, index) = best?;
    let CoordinateMapEntry { lat, lng, .. } = map.entries()[index];
    Some(ClosestCoordinate {
        lat,
        lng,
        distance: d2.sqrt(),
        index,
    })
}

#[derive(Debug, Copy, Clone, PartialEq)]
pub struct LookupOptions {
    /// Largest unit-sphere distance at which a precomputed match is trusted.
    pub acceptance_threshold: f64,
}

impl Default for LookupOptions {
    fn default() -> Self {
        Self {
            acceptance_threshold: 0.1,
        }
    }
}

#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum CoordinateMethod {
    Precomputed,
    Calculated,
}

impl CoordinateMethod {
    pub fn as_str(self) -> &'static str {
        match self {
            CoordinateMethod::Precomputed => "precomputed",
            CoordinateMethod::Calculated => "calculated",
        }
    }
}

#[derive(Debug, Copy, Clone, PartialEq)]
pub struct AccurateCoordinate {
    pub lat: f64,
    pub lng: f64,
    pub method: CoordinateMethod,
    /// Distance to the matched dot; `None` when the coordinate was calculated.
    pub distance: Option<f64>,
}

/// Prefer the precomputed dot; fall back to direct trigonometry when the best
/// match is farther than `options.acceptance_threshold`.
///
/// Errors only when the query itself has no direction.
pub fn get_accurate_coordinate<L>(
    lookup: &L,
    point: Vec3,
    options: LookupOptions,
) -> Result<AccurateCoordinate, SphereError>
where
    L: NearestLookup + ?Sized,
{
    if let Some(hit) = lookup.nearest(point) {
        if hit.distance <= options.acceptance_threshold {
            return Ok(AccurateCoordinate {
                lat: hit.lat,
                lng: hit.lng,
                method: CoordinateMethod::Precomputed,
                distance: Some(hit.distance),
            });
        }
        debug!(
            distance = hit.distance,
            threshold = options.acceptance_threshold,
            "closest dot too far, calculating coordinate directly"
        );
    } else {
        debug!("no precomputed dot found, calculating coordinate directly");
    }

    let ll = xyz_to_lat_lng(point)?;
    Ok(AccurateCoordinate {
        lat: ll.lat,
        lng: ll.lng,
        method: CoordinateMethod::Calculated,
        distance: None,
    })
}

#[cfg(test)]
mod tests {
    use super::{
        CoordinateMethod, LookupOptions, find_closest_coordinate, get_accurate_coordinate,
    };
    use crate::coordinate_map::{CoordinateMap, CoordinateMapEntry, fibonacci_globe_points};
    use foundation::math::{GLOBE_RADIUS, SphereError, Vec3, lat_lng_to_xyz, xyz_to_lat_lng};

    fn derived_map(count: usize) -> CoordinateMap {
        fibonacci_globe_points(count, GLOBE_RADIUS)
            .into_iter()
            .map(|p| {
                let ll = xyz_to_lat_lng(p).expect("surface point");
                CoordinateMapEntry::new(p, ll.lat, ll.lng)
            })
            .collect()
    }

    #[test]
    fn every_entry_finds_itself() {
        let map = derived_map(1500);
        for (i, entry) in map.iter().enumerate() {
            let hit = find_closest_coordinate(&map, entry.xyz).expect("hit");
            assert_eq!(hit.index, i);
            assert!(hit.distance < 1e-9, "entry {i}: distance {}", hit.distance);
            assert_eq!((hit.lat, hit.lng), (entry.lat, entry.lng));
        }
    }

    #[test]
    fn query_radius_does_not_matter() {
        let map = derived_map(800);
        let near_tokyo = lat_lng_to_xyz(35.68, 139.65, 1.0);
        let a = find_closest_coordinate(&map, near_tokyo).expect("a");
        let b = find_closest_coordinate(&map, near_tokyo * 37.0).expect("b");
        assert_eq!(a, b);
    }

    #[test]
    fn exact_tie_prefers_first_entry() {
        let p = lat_lng_to_xyz(10.0, 20.0, GLOBE_RADIUS);
        let map = CoordinateMap::new(vec![
            CoordinateMapEntry::new(p, 10.0, 20.0),
            CoordinateMapEntry::new(p, -1.0, -1.0),
        ]);
        let hit = find_closest_coordinate(&map, p).expect("hit");
        assert_eq!(hit.index, 0);
        assert_eq!(hit.lat, 10.0);
    }

    #[test]
    fn empty_map_and_zero_query_find_nothing() {
        let map = derived_map(10);
        assert_eq!(find_closest_coordinate(&map, Vec3::ZERO), None);
        assert_eq!(
            find_closest_coordinate(&CoordinateMap::default(), Vec3::new(0.0, 1.0, 0.0)),
            None
        );
    }

    #[test]
    fn close_query_uses_precomputed_dot() {
        let map = derived_map(2000);
        let entry = map.entries()[123];
        let nudged = entry.xyz + Vec3::new(0.01, 0.0, 0.0);
        let got = get_accurate_coordinate(&map, nudged, LookupOptions::default()).expect("ok");
        assert_eq!(got.method, CoordinateMethod::Precomputed);
        assert_eq!((got.lat, got.lng), (entry.lat, entry.lng));
        assert!(got.distance.expect("distance") <= 0.1);
    }

    #[test]
    fn far_query_falls_back_to_calculation() {
        // A handful of dots clustered around the north pole.
        let map = CoordinateMap::new(vec![
            CoordinateMapEntry::from_lat_lng(89.0, 0.0),
            CoordinateMapEntry::from_lat_lng(88.0, 90.0),
            CoordinateMapEntry::from_lat_lng(87.0, -90.0),
        ]);
        let query = lat_lng_to_xyz(-20.0, 45.0, GLOBE_RADIUS);

        let got = get_accurate_coordinate(&map, query, LookupOptions::default()).expect("ok");
        assert_eq!(got.method, CoordinateMethod::Calculated);
        assert_eq!(got.method.as_str(), "calculated");
        assert_eq!(got.distance, None);
        assert!((got.lat + 20.0).abs() < 1e-9);
        assert!((got.lng - 45.0).abs() < 1e-9);
    }

    #[test]
    fn threshold_is_configurable() {
        let map = CoordinateMap::new(vec![CoordinateMapEntry::from_lat_lng(0.0, 0.0)]);
        let query = lat_lng_to_xyz(0.0, 10.0, GLOBE_RADIUS);

        let strict = get_accurate_coordinate(&map, query, LookupOptions::default()).expect("ok");
        assert_eq!(strict.method, CoordinateMethod::Calculated);

        let loose = LookupOptions {
            acceptance_threshold: 0.5,
        };
        let relaxed = get_accurate_coordinate(&map, query, loose).expect("ok");
        assert_eq!(relaxed.method, CoordinateMethod::Precomputed);
        assert_eq!(relaxed.lng, 0.0);
    }

    #[test]
    fn empty_map_falls_back_and_zero_vector_errors() {
        let empty = CoordinateMap::default();
        let got = get_accurate_coordinate(&empty, Vec3::new(0.0, 0.0, 1.0), LookupOptions::default())
            .expect("ok");
        assert_eq!(got.method, CoordinateMethod::Calculated);

        let err = get_accurate_coordinate(&empty, Vec3::ZERO, LookupOptions::default())
            .expect_err("zero vector");
        assert_eq!(err, SphereError::ZeroVector);
    }
}
