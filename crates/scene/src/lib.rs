pub mod coordinate_map;
pub mod picking;
pub mod spatial;

pub use coordinate_map::*;
pub use picking::*;
