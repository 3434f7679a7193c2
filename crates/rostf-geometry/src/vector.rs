//! Three-component `f64` vector.

use std::ops::{Add, Mul, Neg, Sub};

use serde::{Deserialize, Serialize};
use rostf_types::WireVector3;

/// A 3-D vector (translation, point or rotation axis).
///
/// All operations return new values; a `Vec3` is never mutated in place by
/// the rotation code.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Vec3 {
    pub x: f64,
    pub y: f64,
    pub z: f64,
}

impl Vec3 {
    /// The zero vector.
    pub const ZERO: Vec3 = Vec3::new(0.0, 0.0, 0.0);
    /// First canonical vector (1, 0, 0).
    pub const PLUS_I: Vec3 = Vec3::new(1.0, 0.0, 0.0);
    /// Second canonical vector (0, 1, 0).
    pub const PLUS_J: Vec3 = Vec3::new(0.0, 1.0, 0.0);
    /// Third canonical vector (0, 0, 1).
    pub const PLUS_K: Vec3 = Vec3::new(0.0, 0.0, 1.0);

    /// Create a new vector.
    pub const fn new(x: f64, y: f64, z: f64) -> Self {
        Self { x, y, z }
    }

    pub fn dot(self, rhs: Self) -> f64 {
        self.x * rhs.x + self.y * rhs.y + self.z * rhs.z
    }

    pub fn cross(self, rhs: Self) -> Self {
        Self::new(
            self.y * rhs.z - self.z * rhs.y,
            self.z * rhs.x - self.x * rhs.z,
            self.x * rhs.y - self.y * rhs.x,
        )
    }

    pub fn norm_squared(self) -> f64 {
        self.dot(self)
    }

    /// Euclidean length.
    pub fn norm(self) -> f64 {
        self.norm_squared().sqrt()
    }

    /// Return a unit vector orthogonal to `self`, or `None` for the zero
    /// vector.
    ///
    /// The axis to cross against is picked deterministically: the first
    /// component whose magnitude is at most 0.6 × |self| is zeroed, which
    /// keeps the divisor well away from zero.
    pub fn orthogonal(self) -> Option<Self> {
        let threshold = 0.6 * self.norm();
        if threshold == 0.0 {
            return None;
        }

        if self.x.abs() <= threshold {
            let inverse = 1.0 / (self.y * self.y + self.z * self.z).sqrt();
            Some(Self::new(0.0, inverse * self.z, -inverse * self.y))
        } else if self.y.abs() <= threshold {
            let inverse = 1.0 / (self.x * self.x + self.z * self.z).sqrt();
            Some(Self::new(-inverse * self.z, 0.0, inverse * self.x))
        } else {
            let inverse = 1.0 / (self.x * self.x + self.y * self.y).sqrt();
            Some(Self::new(inverse * self.y, -inverse * self.x, 0.0))
        }
    }

    /// Component-wise closeness test.
    pub fn approx_eq(self, rhs: Self, tolerance: f64) -> bool {
        (self.x - rhs.x).abs() <= tolerance
            && (self.y - rhs.y).abs() <= tolerance
            && (self.z - rhs.z).abs() <= tolerance
    }
}

impl Add for Vec3 {
    type Output = Vec3;

    fn add(self, rhs: Self) -> Self {
        Self::new(self.x + rhs.x, self.y + rhs.y, self.z + rhs.z)
    }
}

impl Sub for Vec3 {
    type Output = Vec3;

    fn sub(self, rhs: Self) -> Self {
        Self::new(self.x - rhs.x, self.y - rhs.y, self.z - rhs.z)
    }
}

impl Neg for Vec3 {
    type Output = Vec3;

    fn neg(self) -> Self {
        Self::new(-self.x, -self.y, -self.z)
    }
}

impl Mul<f64> for Vec3 {
    type Output = Vec3;

    fn mul(self, k: f64) -> Self {
        Self::new(k * self.x, k * self.y, k * self.z)
    }
}

impl Mul<Vec3> for f64 {
    type Output = Vec3;

    fn mul(self, v: Vec3) -> Vec3 {
        v * self
    }
}

impl From<WireVector3> for Vec3 {
    fn from(v: WireVector3) -> Self {
        Self::new(v.x, v.y, v.z)
    }
}

impl From<Vec3> for WireVector3 {
    fn from(v: Vec3) -> Self {
        WireVector3 {
            x: v.x,
            y: v.y,
            z: v.z,
        }
    }
}

impl From<[f64; 3]> for Vec3 {
    fn from([x, y, z]: [f64; 3]) -> Self {
        Self::new(x, y, z)
    }
}
