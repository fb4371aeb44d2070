use crate::scribble::{ScribbleError, generate_scribble_path_with};
use rand::SeedableRng;
use rand::rngs::StdRng;

/// Shape parameters for a hand-drawn border.
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct ScribbleStyle {
    /// Maximum perpendicular wobble, in pixels.
    pub roughness: f64,
    pub border_radius: f64,
    /// Segments per straight edge.
    pub segments: u32,
    /// Sample points per rounded corner.
    pub corner_steps: u32,
}

impl ScribbleStyle {
    pub const fn new(roughness: f64, border_radius: f64) -> Self {
        Self {
            roughness,
            border_radius,
            segments: 8,
            corner_steps: 4,
        }
    }

    /// Distance the outline is pulled in from the layout box.
    pub fn inset(&self) -> f64 {
        (self.roughness.max(0.0) * 1.5).max(3.0)
    }
}

impl Default for ScribbleStyle {
    fn default() -> Self {
        Self::new(2.0, 12.0)
    }
}

/// A card border drawn as two overlapping strokes.
///
/// Both strokes derive from `seed`, so a border redrawn at the same size
/// looks the same.
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct ScribbleBorder {
    pub style: ScribbleStyle,
    pub seed: u64,
}

impl ScribbleBorder {
    pub fn new(style: ScribbleStyle, seed: u64) -> Self {
        Self { style, seed }
    }

    /// Primary and secondary stroke paths for a `width` x `height` box.
    pub fn strokes(&self, width: f64, height: f64) -> Result<[String; 2], ScribbleError> {
        let primary = self.stroke(self.seed, width, height)?;
        let secondary = self.stroke(self.seed.wrapping_add(1), width, height)?;
        Ok([primary, secondary])
    }

    fn stroke(&self, seed: u64, width: f64, height: f64) -> Result<String, ScribbleError> {
        let mut rng = StdRng::seed_from_u64(seed);
        generate_scribble_path_with(&mut rng, &self.style, width, height)
    }
}
