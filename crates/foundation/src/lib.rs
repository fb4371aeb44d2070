pub mod math;

// Foundation crate: small, well-tested primitives only.
pub use math::{GLOBE_RADIUS, LatLng, SphereError, Vec2, Vec3};
