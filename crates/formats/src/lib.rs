pub mod cache;
pub mod globe_assets;
pub mod globe_package;
pub mod manifest;

pub use cache::*;
pub use globe_assets::*;
pub use globe_package::*;
pub use manifest::*;
