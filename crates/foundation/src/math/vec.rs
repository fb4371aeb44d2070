#[derive(Debug, Copy, Clone, PartialEq)]
pub struct Vec2 {
    pub x: f64,
    pub y: f64,
}

impl Vec2 {
    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }

    pub fn lerp(self, other: Self, t: f64) -> Self {
        Self::new(
            self.x + (other.x - self.x) * t,
            self.y + (other.y - self.y) * t,
        )
    }
}

impl std::ops::Add for Vec2 {
    type Output = Self;

    fn add(self, other: Self) -> Self::Output {
        Self::new(self.x + other.x, self.y + other.y)
    }
}

impl std::ops::Sub for Vec2 {
    type Output = Self;

    fn sub(self, other: Self) -> Self::Output {
        Self::new(self.x - other.x, self.y - other.y)
    }
}

impl std::ops::Mul<f64> for Vec2 {
    type Output = Self;

    fn mul(self, s: f64) -> Self::Output {
        Self::new(self.x * s, self.y * s)
    }
}

/// A point or direction in globe space.
///
/// Globe space is right-handed with +Y through the north pole.
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct Vec3 {
    pub x: f64,
    pub y: f64,
    pub z: f64,
}

impl Vec3 {
    pub const ZERO: Self = Self::new(0.0, 0.0, 0.0);

    pub const fn new(x: f64, y: f64, z: f64) -> Self {
        Self { x, y, z }
    }

    pub fn dot(self, other: Self) -> f64 {
        self.x * other.x + self.y * other.y + self.z * other.z
    }

    pub fn length_squared(self) -> f64 {
        self.dot(self)
    }

    pub fn length(self) -> f64 {
        self.length_squared().sqrt()
    }

    pub fn is_finite(self) -> bool {
        self.x.is_finite() && self.y.is_finite() && self.z.is_finite()
    }

    pub fn distance_squared(self, other: Self) -> f64 {
        (self - other).length_squared()
    }

    pub fn max_abs_component(self) -> f64 {
        self.x.abs().max(self.y.abs()).max(self.z.abs())
    }

    /// Copy divided by its largest absolute component, so the length lies in
    /// `[1, sqrt(3)]` and squaring it can neither overflow nor underflow.
    /// `None` for a zero or non-finite vector.
    pub fn rescaled(self) -> Option<Self> {
        let m = self.max_abs_component();
        if !m.is_finite() || m <= 0.0 {
            return None;
        }
        Some(Self::new(self.x / m, self.y / m, self.z / m))
    }

    /// Unit-length copy, or `None` for a zero or non-finite vector.
    pub fn normalized(self) -> Option<Self> {
        let scaled = self.rescaled()?;
        Some(scaled * (1.0 / scaled.length()))
    }

    pub fn as_array(self) -> [f64; 3] {
        [self.x, self.y, self.z]
    }
}

impl From<[f64; 3]> for Vec3 {
    fn from(v: [f64; 3]) -> Self {
        Self::new(v[0], v[1], v[2])
    }
}

impl std::ops::Add for Vec3 {
    type Output = Self;

    fn add(self, other: Self) -> Self::Output {
        Self::new(self.x + other.x, self.y + other.y, self.z + other.z)
    }
}

impl std::ops::Sub for Vec3 {
    type Output = Self;

    fn sub(self, other: Self) -> Self::Output {
        Self::new(self.x - other.x, self.y - other.y, self.z - other.z)
    }
}

impl std::ops::Mul<f64> for Vec3 {
    type Output = Self;

    fn mul(self, s: f64) -> Self::Output {
        Self::new(self.x * s, self.y * s, self.z * s)
    }
}

#[cfg(test)]
mod tests {
    use super::{Vec2, Vec3};

    #[test]
    fn vec2_add_sub_lerp() {
        let a = Vec2::new(1.0, 2.0);
        let b = Vec2::new(-0.5, 4.0);
        assert_eq!(a + b, Vec2::new(0.5, 6.0));
        assert_eq!(a - b, Vec2::new(1.5, -2.0));
        assert_eq!(a.lerp(b, 0.5), Vec2::new(0.25, 3.0));
    }

    #[test]
    fn vec3_add_sub_dot() {
        let a = Vec3::new(1.0, 2.0, -1.0);
        let b = Vec3::new(0.5, -2.0, 3.0);
        assert_eq!(a + b, Vec3::new(1.5, 0.0, 2.0));
        assert_eq!(a - b, Vec3::new(0.5, 4.0, -4.0));
        assert_eq!(a.dot(b), -6.5);
    }

    #[test]
    fn normalized_rejects_zero_and_nan() {
        assert_eq!(Vec3::ZERO.normalized(), None);
        assert_eq!(Vec3::new(f64::NAN, 0.0, 1.0).normalized(), None);
        assert_eq!(
            Vec3::new(0.0, 3.0, 0.0).normalized(),
            Some(Vec3::new(0.0, 1.0, 0.0))
        );
    }

    #[test]
    fn normalized_survives_extreme_magnitudes() {
        assert_eq!(
            Vec3::new(0.0, 1e200, 0.0).normalized(),
            Some(Vec3::new(0.0, 1.0, 0.0))
        );
        assert_eq!(
            Vec3::new(1e-170, 0.0, 0.0).normalized(),
            Some(Vec3::new(1.0, 0.0, 0.0))
        );
        assert_eq!(
            Vec3::new(0.0, 0.0, -5e-324).normalized(),
            Some(Vec3::new(0.0, 0.0, -1.0))
        );
        let huge = Vec3::new(f64::MAX, f64::MAX, 0.0)
            .normalized()
            .expect("finite");
        assert!((huge.length() - 1.0).abs() < 1e-15);
    }

    #[test]
    fn length_of_pythagorean_triple() {
        let v = Vec3::new(2.0, 3.0, 6.0);
        assert_eq!(v.length_squared(), 49.0);
        assert_eq!(v.length(), 7.0);
        assert_eq!(v.distance_squared(Vec3::ZERO), 49.0);
    }
}
