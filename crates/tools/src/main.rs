use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use clap::{Args as ClapArgs, Parser, Subcommand};
use formats::{
    CoordinateMapCache, CoordinateMapSource, GlobePackage, content_hash, globe_points_to_json,
    parse_globe_points,
};
use foundation::math::{GLOBE_RADIUS, Vec3, lat_lng_to_xyz, xyz_to_lat_lng};
use layers::{ScribbleStyle, generate_scribble_path_with};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use scene::spatial::{GlobeSpatialIndex, GridResolution};
use scene::{
    AccurateCoordinate, CoordinateMap, LookupOptions, find_closest_coordinate,
    fibonacci_globe_points, get_accurate_coordinate,
};
use serde::Serialize;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(author, version, about = "Asset and geometry tooling for the dotted globe")]
struct Args {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Write evenly spread placeholder dots as a `[[x, y, z], ...]` asset
    GenerateDots {
        /// Number of dots
        #[arg(long, default_value_t = 4000)]
        count: usize,

        /// Output file
        #[arg(long)]
        out: PathBuf,
    },

    /// Derive the coordinate map from a dot asset and write a globe package
    DeriveMap {
        /// Dot positions (`[[x, y, z], ...]`)
        points: PathBuf,

        /// Package directory to create
        out_dir: PathBuf,

        /// Human-readable package name
        #[arg(long)]
        name: Option<String>,
    },

    /// Re-derive every entry's lat/lng from its position and report mismatches
    Audit {
        #[command(flatten)]
        map: MapArgs,

        /// Allowed difference in degrees
        #[arg(long, default_value_t = 1e-6)]
        tolerance: f64,
    },

    /// Resolve a globe-space point to a coordinate
    #[command(allow_negative_numbers = true)]
    Lookup {
        #[command(flatten)]
        map: MapArgs,

        x: f64,
        y: f64,
        z: f64,

        /// Use the grid index instead of a linear scan
        #[arg(long)]
        indexed: bool,

        /// Largest unit-sphere distance at which a precomputed dot is trusted
        #[arg(long, default_value_t = 0.1)]
        threshold: f64,

        #[command(flatten)]
        grid: GridArgs,
    },

    /// Compare grid-indexed lookups against the linear scan on random queries
    VerifyIndex {
        #[command(flatten)]
        map: MapArgs,

        #[arg(long, default_value_t = 1000)]
        samples: usize,

        #[arg(long, default_value_t = 1)]
        seed: u64,

        #[command(flatten)]
        grid: GridArgs,
    },

    /// Print a hand-drawn border path
    Scribble {
        width: f64,
        height: f64,

        #[arg(long, default_value_t = 2.0)]
        roughness: f64,

        #[arg(long, default_value_t = 12.0)]
        radius: f64,

        /// Omit for a different wobble on every run
        #[arg(long)]
        seed: Option<u64>,

        #[arg(long, default_value_t = 8)]
        segments: u32,
    },
}

#[derive(ClapArgs, Debug)]
struct MapArgs {
    /// Coordinate map JSON file
    #[arg(long, env = "GLOBE_COORDINATE_MAP")]
    map: Option<PathBuf>,

    /// Globe package directory (takes precedence over --map)
    #[arg(long)]
    package: Option<PathBuf>,
}

#[derive(ClapArgs, Debug)]
struct GridArgs {
    #[arg(long, default_value_t = 36)]
    lat_cells: u32,

    #[arg(long, default_value_t = 36)]
    lng_cells: u32,
}

impl MapArgs {
    fn source(&self) -> Result<CoordinateMapSource, String> {
        match (&self.package, &self.map) {
            (Some(dir), _) => Ok(CoordinateMapSource::Package(dir.clone())),
            (None, Some(path)) => Ok(CoordinateMapSource::File(path.clone())),
            (None, None) => {
                Err("no coordinate map: pass --map, --package or set GLOBE_COORDINATE_MAP".into())
            }
        }
    }

    fn load(&self) -> Result<Arc<CoordinateMap>, Box<dyn std::error::Error>> {
        let cache = CoordinateMapCache::new(self.source()?);
        Ok(cache.load()?)
    }
}

impl GridArgs {
    fn resolution(&self) -> GridResolution {
        GridResolution::new(self.lat_cells, self.lng_cells)
    }
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    let args = Args::parse();

    match args.command {
        Command::GenerateDots { count, out } => generate_dots(count, &out)?,
        Command::DeriveMap {
            points,
            out_dir,
            name,
        } => derive_map(&points, &out_dir, name)?,
        Command::Audit { map, tolerance } => audit(&map, tolerance)?,
        Command::Lookup {
            map,
            x,
            y,
            z,
            indexed,
            threshold,
            grid,
        } => lookup(&map, Vec3::new(x, y, z), indexed, threshold, &grid)?,
        Command::VerifyIndex {
            map,
            samples,
            seed,
            grid,
        } => verify_index(&map, samples, seed, &grid)?,
        Command::Scribble {
            width,
            height,
            roughness,
            radius,
            seed,
            segments,
        } => {
            let mut style = ScribbleStyle::new(roughness, radius);
            style.segments = segments;
            let path = match seed {
                Some(seed) => generate_scribble_path_with(
                    &mut StdRng::seed_from_u64(seed),
                    &style,
                    width,
                    height,
                )?,
                None => generate_scribble_path_with(&mut rand::thread_rng(), &style, width, height)?,
            };
            println!("{path}");
        }
    }

    Ok(())
}

fn generate_dots(count: usize, out: &Path) -> Result<(), Box<dyn std::error::Error>> {
    let points = fibonacci_globe_points(count, GLOBE_RADIUS);
    let payload = globe_points_to_json(&points)?;
    fs::write(out, &payload)?;
    info!(
        "wrote {} ({} dots, blake3={})",
        out.display(),
        count,
        content_hash(payload.as_bytes())
    );
    Ok(())
}

fn derive_map(
    points: &Path,
    out_dir: &Path,
    name: Option<String>,
) -> Result<(), Box<dyn std::error::Error>> {
    let payload = fs::read_to_string(points)?;
    let points = parse_globe_points(&payload)?;
    let package = GlobePackage::write(out_dir, name, &points)?;

    let manifest = package.manifest();
    info!(
        "wrote {} ({} entries, blake3={})",
        package.coordinate_map_path().display(),
        manifest.coordinate_map.count.unwrap_or_default(),
        manifest.coordinate_map.content_hash.clone().unwrap_or_default()
    );
    println!("{}", serde_json::to_string_pretty(manifest)?);
    Ok(())
}

fn audit(map: &MapArgs, tolerance: f64) -> Result<(), Box<dyn std::error::Error>> {
    let map = map.load()?;
    let report = map.audit(tolerance);
    println!(
        "checked={} mismatched={} quarter_turn={} degenerate={}",
        report.checked, report.mismatched, report.quarter_turn, report.degenerate
    );
    if report.quarter_turn > 0 {
        warn!(
            "{} entries are rotated by 90 degrees; the map was derived without the longitude offset",
            report.quarter_turn
        );
    }
    if !report.is_clean() {
        let failed = report.mismatched + report.degenerate;
        return Err(format!("{failed} entries failed the audit").into());
    }
    Ok(())
}

#[derive(Debug, Serialize)]
struct LookupReport {
    lat: f64,
    lng: f64,
    method: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    distance: Option<f64>,
}

impl From<AccurateCoordinate> for LookupReport {
    fn from(c: AccurateCoordinate) -> Self {
        Self {
            lat: c.lat,
            lng: c.lng,
            method: c.method.as_str(),
            distance: c.distance,
        }
    }
}

fn lookup(
    map: &MapArgs,
    point: Vec3,
    indexed: bool,
    threshold: f64,
    grid: &GridArgs,
) -> Result<(), Box<dyn std::error::Error>> {
    let map = map.load()?;
    let options = LookupOptions {
        acceptance_threshold: threshold,
    };

    let result = if indexed {
        let index = GlobeSpatialIndex::build(map, grid.resolution())?;
        get_accurate_coordinate(&index, point, options)?
    } else {
        get_accurate_coordinate(&map, point, options)?
    };

    println!("{}", serde_json::to_string_pretty(&LookupReport::from(result))?);
    Ok(())
}

#[derive(Debug, Default, Serialize)]
struct AgreementReport {
    samples: usize,
    agreed: usize,
    /// Brute-force winner outside the 3x3 search window.
    outside_window: usize,
    /// Indexed search found nothing at all.
    no_candidates: usize,
    /// Disagreement with the brute-force winner inside the window; should stay 0.
    unexplained: usize,
}

fn verify_index(
    map: &MapArgs,
    samples: usize,
    seed: u64,
    grid: &GridArgs,
) -> Result<(), Box<dyn std::error::Error>> {
    let map = map.load()?;
    let index = GlobeSpatialIndex::build(Arc::clone(&map), grid.resolution())?;
    let mut rng = StdRng::seed_from_u64(seed);
    let report = compare_lookups(&index, &mut rng, samples);

    println!("{}", serde_json::to_string_pretty(&report)?);
    if report.unexplained > 0 {
        return Err(format!("{} unexplained disagreements", report.unexplained).into());
    }
    Ok(())
}

fn compare_lookups(index: &GlobeSpatialIndex, rng: &mut StdRng, samples: usize) -> AgreementReport {
    let mut report = AgreementReport {
        samples,
        ..AgreementReport::default()
    };

    for _ in 0..samples {
        // Uniform over the sphere surface.
        let lat = rng.gen_range(-1.0f64..=1.0).asin().to_degrees();
        let lng = rng.gen_range(-180.0..180.0);
        let query = lat_lng_to_xyz(lat, lng, GLOBE_RADIUS);

        let Some(brute) = find_closest_coordinate(index.map(), query) else {
            continue;
        };
        let Some(indexed) = index.find_nearest(query) else {
            report.no_candidates += 1;
            continue;
        };
        if indexed.index == brute.index {
            report.agreed += 1;
            continue;
        }

        let Ok(estimate) = xyz_to_lat_lng(query) else {
            continue;
        };
        let window = index.search_window(index.cell_of(estimate.lat, estimate.lng));
        if window.contains(&index.cell_of(brute.lat, brute.lng)) {
            warn!(lat, lng, "indexed lookup disagrees inside its search window");
            report.unexplained += 1;
        } else {
            report.outside_window += 1;
        }
    }

    report
}
