//! Hand-drawn rounded-rectangle outlines as SVG path data.
//!
//! The outline runs clockwise from the top edge: top, top-right corner, right,
//! bottom-right corner, bottom, bottom-left corner, left, top-left corner, and
//! closes with `Z`. Edges are quadratic Bezier segments with perpendicular
//! wobble; corners are polylines with a wobbling radius.

use std::f64::consts::{FRAC_PI_2, PI};
use std::fmt::{self, Write};

use foundation::math::Vec2;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use crate::symbology::ScribbleStyle;

#[derive(Debug, Copy, Clone, PartialEq)]
pub enum ScribbleError {
    InvalidSize { width: f64, height: f64 },
    InvalidRoughness { roughness: f64 },
    NoSegments,
}

impl fmt::Display for ScribbleError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ScribbleError::InvalidSize { width, height } => {
                write!(f, "scribble box must be positive and finite: {width}x{height}")
            }
            ScribbleError::InvalidRoughness { roughness } => {
                write!(f, "scribble roughness must be finite: {roughness}")
            }
            ScribbleError::NoSegments => write!(f, "scribble edges need at least one segment"),
        }
    }
}

impl std::error::Error for ScribbleError {}

/// Scribble outline for a `width` x `height` box.
///
/// With `Some(seed)` the result is fully determined by the arguments. With
/// `None` the wobble comes from the thread RNG and differs between calls.
pub fn generate_scribble_path(
    width: f64,
    height: f64,
    roughness: f64,
    border_radius: f64,
    seed: Option<u64>,
) -> Result<String, ScribbleError> {
    let style = ScribbleStyle::new(roughness, border_radius);
    match seed {
        Some(seed) => {
            generate_scribble_path_with(&mut StdRng::seed_from_u64(seed), &style, width, height)
        }
        None => generate_scribble_path_with(&mut rand::thread_rng(), &style, width, height),
    }
}

/// Scribble outline drawing its wobble from `rng`.
pub fn generate_scribble_path_with<R: Rng + ?Sized>(
    rng: &mut R,
    style: &ScribbleStyle,
    width: f64,
    height: f64,
) -> Result<String, ScribbleError> {
    if !(width.is_finite() && height.is_finite() && width > 0.0 && height > 0.0) {
        return Err(ScribbleError::InvalidSize { width, height });
    }
    if !style.roughness.is_finite() {
        return Err(ScribbleError::InvalidRoughness {
            roughness: style.roughness,
        });
    }
    if style.segments == 0 {
        return Err(ScribbleError::NoSegments);
    }

    let roughness = style.roughness.max(0.0);
    let inset = style.inset();
    let (left, right) = inner_span(width, inset);
    let (top, bottom) = inner_span(height, inset);
    // A point plus its control jitter reaches 1.5x the amplitude past the
    // inner line, and `left`/`top` is all the room there is on each side.
    let wobble = Vec2::new(roughness.min(left / 1.5), roughness.min(top / 1.5));
    let r = style
        .border_radius
        .max(0.0)
        .min((right - left) * 0.5)
        .min((bottom - top) * 0.5);

    let mut pen = Pen {
        rng,
        path: String::new(),
        wobble,
        segments: style.segments,
        corner_steps: style.corner_steps.max(1),
    };

    pen.move_to(Vec2::new(left + r, top));

    pen.edge(Vec2::new(left + r, top), Vec2::new(right - r, top), Vec2::new(0.0, -1.0));
    pen.corner(Vec2::new(right - r, top + r), r, -FRAC_PI_2);

    pen.edge(Vec2::new(right, top + r), Vec2::new(right, bottom - r), Vec2::new(1.0, 0.0));
    pen.corner(Vec2::new(right - r, bottom - r), r, 0.0);

    pen.edge(Vec2::new(right - r, bottom), Vec2::new(left + r, bottom), Vec2::new(0.0, 1.0));
    pen.corner(Vec2::new(left + r, bottom - r), r, FRAC_PI_2);

    pen.edge(Vec2::new(left, bottom - r), Vec2::new(left, top + r), Vec2::new(-1.0, 0.0));
    pen.corner(Vec2::new(left + r, top + r), r, PI);

    pen.path.push('Z');
    Ok(pen.path)
}

/// Inner extent along one axis; collapses to the midpoint when the box is
/// smaller than twice the inset.
fn inner_span(extent: f64, inset: f64) -> (f64, f64) {
    if extent >= inset * 2.0 {
        (inset, extent - inset)
    } else {
        (extent * 0.5, extent * 0.5)
    }
}

struct Pen<'a, R: Rng + ?Sized> {
    rng: &'a mut R,
    path: String,
    /// Wobble amplitude along each axis.
    wobble: Vec2,
    segments: u32,
    corner_steps: u32,
}

impl<R: Rng + ?Sized> Pen<'_, R> {
    fn jitter(&mut self, amplitude: f64) -> f64 {
        if amplitude > 0.0 {
            self.rng.gen_range(-amplitude..=amplitude)
        } else {
            0.0
        }
    }

    fn move_to(&mut self, p: Vec2) {
        // Writing into a String cannot fail.
        let _ = write!(self.path, "M {:.2} {:.2} ", p.x, p.y);
    }

    fn line_to(&mut self, p: Vec2) {
        let _ = write!(self.path, "L {:.2} {:.2} ", p.x, p.y);
    }

    fn quad_to(&mut self, control: Vec2, p: Vec2) {
        let _ = write!(
            self.path,
            "Q {:.2} {:.2} {:.2} {:.2} ",
            control.x, control.y, p.x, p.y
        );
    }

    /// Straight edge; interior points wobble along `normal`, endpoints stay put.
    fn edge(&mut self, from: Vec2, to: Vec2, normal: Vec2) {
        let amplitude = (normal.x * self.wobble.x).abs() + (normal.y * self.wobble.y).abs();
        let half = self.wobble * 0.5;
        let mut prev = from;
        for i in 1..=self.segments {
            let t = f64::from(i) / f64::from(self.segments);
            let mut point = from.lerp(to, t);
            if i < self.segments {
                point = point + normal * self.jitter(amplitude);
            }

            let offset = Vec2::new(self.jitter(half.x), self.jitter(half.y));
            let control = prev.lerp(point, 0.5) + offset;
            self.quad_to(control, point);
            prev = point;
        }
    }

    /// Quarter arc around `center` starting at `start_angle`, clockwise on screen.
    fn corner(&mut self, center: Vec2, radius: f64, start_angle: f64) {
        let half = self.wobble.x.min(self.wobble.y) * 0.5;
        for k in 1..=self.corner_steps {
            let angle = start_angle + FRAC_PI_2 * f64::from(k) / f64::from(self.corner_steps);
            let rr = if k < self.corner_steps {
                (radius + self.jitter(half)).max(0.0)
            } else {
                radius
            };
            self.line_to(center + Vec2::new(angle.cos(), angle.sin()) * rr);
        }
    }
}
