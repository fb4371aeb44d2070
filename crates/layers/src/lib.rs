pub mod scribble;
pub mod symbology;

pub use scribble::*;
pub use symbology::*;
