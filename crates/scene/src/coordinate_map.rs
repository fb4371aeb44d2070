use foundation::math::{GLOBE_RADIUS, LatLng, Vec3, lat_lng_to_xyz, xyz_to_lat_lng};

/// One precomputed globe dot with its geographic coordinates.
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct CoordinateMapEntry {
    pub xyz: Vec3,
    pub lat: f64,
    pub lng: f64,
}

impl CoordinateMapEntry {
    pub fn new(xyz: Vec3, lat: f64, lng: f64) -> Self {
        Self { xyz, lat, lng }
    }

    /// Entry for a geographic coordinate, placed on the globe surface.
    pub fn from_lat_lng(lat: f64, lng: f64) -> Self {
        Self::new(lat_lng_to_xyz(lat, lng, GLOBE_RADIUS), lat, lng)
    }

    pub fn lat_lng(&self) -> LatLng {
        LatLng::new(self.lat, self.lng)
    }
}

/// The full dot -> coordinate table.
///
/// Entry order is significant: lookups resolve exact ties in favor of the
/// lower index.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CoordinateMap {
    entries: Vec<CoordinateMapEntry>,
}

/// Result of re-deriving every entry's coordinates from its position.
#[derive(Debug, Copy, Clone, Default, PartialEq, Eq)]
pub struct MapAudit {
    pub checked: usize,
    pub mismatched: usize,
    /// Mismatches whose longitude is off by exactly a quarter turn.
    pub quarter_turn: usize,
    /// Entries whose position could not be converted at all.
    pub degenerate: usize,
}

impl MapAudit {
    pub fn is_clean(&self) -> bool {
        self.mismatched == 0 && self.degenerate == 0
    }
}

impl CoordinateMap {
    pub fn new(entries: Vec<CoordinateMapEntry>) -> Self {
        Self { entries }
    }

    pub fn entries(&self) -> &[CoordinateMapEntry] {
        &self.entries
    }

    pub fn get(&self, index: usize) -> Option<&CoordinateMapEntry> {
        self.entries.get(index)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, CoordinateMapEntry> {
        self.entries.iter()
    }

    /// Recompute lat/lng from each entry's position and compare.
    pub fn audit(&self, tolerance_deg: f64) -> MapAudit {
        let mut audit = MapAudit::default();
        for entry in &self.entries {
            audit.checked += 1;
            let Ok(derived) = xyz_to_lat_lng(entry.xyz) else {
                audit.degenerate += 1;
                continue;
            };

            let lat_off = (derived.lat - entry.lat).abs();
            let lng_off = angular_gap_deg(derived.lng, entry.lng);
            if lat_off <= tolerance_deg && lng_off <= tolerance_deg {
                continue;
            }

            audit.mismatched += 1;
            // Near the poles longitude is meaningless, so only count clear cases.
            if lat_off <= tolerance_deg && (lng_off - 90.0).abs() <= tolerance_deg {
                audit.quarter_turn += 1;
            }
        }
        audit
    }
}

impl From<Vec<CoordinateMapEntry>> for CoordinateMap {
    fn from(entries: Vec<CoordinateMapEntry>) -> Self {
        Self::new(entries)
    }
}

impl FromIterator<CoordinateMapEntry> for CoordinateMap {
    fn from_iter<I: IntoIterator<Item = CoordinateMapEntry>>(iter: I) -> Self {
        Self::new(iter.into_iter().collect())
    }
}

impl<'a> IntoIterator for &'a CoordinateMap {
    type Item = &'a CoordinateMapEntry;
    type IntoIter = std::slice::Iter<'a, CoordinateMapEntry>;

    fn into_iter(self) -> Self::IntoIter {
        self.entries.iter()
    }
}

/// Smallest absolute difference between two longitudes, in `[0, 180]`.
fn angular_gap_deg(a: f64, b: f64) -> f64 {
    let d = (a - b).rem_euclid(360.0);
    d.min(360.0 - d)
}

/// Evenly spread dots on the globe surface (Fibonacci lattice).
///
/// Used by the asset tooling and tests as a stand-in for the landmass dots.
pub fn fibonacci_globe_points(count: usize, radius: f64) -> Vec<Vec3> {
    let golden_angle = std::f64::consts::PI * (3.0 - 5.0_f64.sqrt());
    (0..count)
        .map(|i| {
            let y = 1.0 - 2.0 * (i as f64 + 0.5) / count as f64;
            let ring = (1.0 - y * y).max(0.0).sqrt();
            let phi = golden_angle * i as f64;
            Vec3::new(ring * phi.cos(), y, ring * phi.sin()) * radius
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::{CoordinateMap, CoordinateMapEntry, fibonacci_globe_points};
    use foundation::math::{GLOBE_RADIUS, Vec3, raw_longitude_deg, xyz_to_lat_lng};

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
    fn fibonacci_points_lie_on_the_sphere() {
        let points = fibonacci_globe_points(500, GLOBE_RADIUS);
        assert_eq!(points.len(), 500);
        for p in points {
            assert!((p.length() - GLOBE_RADIUS).abs() < 1e-9);
        }
    }

    #[test]
    fn audit_of_derived_map_is_clean() {
        let map = derived_map(400);
        let audit = map.audit(1e-6);
        assert_eq!(audit.checked, 400);
        assert!(audit.is_clean(), "{audit:?}");
    }

    #[test]
    fn audit_flags_map_built_without_offset() {
        let points = fibonacci_globe_points(400, GLOBE_RADIUS);
        let map: CoordinateMap = points
            .into_iter()
            .map(|p| {
                let ll = xyz_to_lat_lng(p).expect("surface point");
                // Longitude taken straight from atan2, as the old generator did.
                CoordinateMapEntry::new(p, ll.lat, raw_longitude_deg(p))
            })
            .collect();

        let audit = map.audit(1e-6);
        assert_eq!(audit.mismatched, 400);
        assert_eq!(audit.quarter_turn, 400);
    }

    #[test]
    fn audit_counts_degenerate_entries() {
        let map = CoordinateMap::new(vec![CoordinateMapEntry::new(Vec3::ZERO, 0.0, 0.0)]);
        let audit = map.audit(0.01);
        assert_eq!(audit.degenerate, 1);
        assert!(!audit.is_clean());
    }

    #[test]
    fn from_lat_lng_places_entry_on_surface() {
        let e = CoordinateMapEntry::from_lat_lng(51.5, 0.0);
        assert!((e.xyz.length() - GLOBE_RADIUS).abs() < 1e-12);
        assert_eq!(e.lat_lng().lat, 51.5);
    }
}
