use nalgebra::{Rotation3, Unit, Vector3};
use serde::{Deserialize, Serialize};
use std::ops::{Add, Div, Mul, Neg, Sub};

/// A vector in 3D Euclidean space.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Vec3 {
    pub x: f64,
    pub y: f64,
    pub z: f64,
}

impl Vec3 {
    pub const ZERO: Self = Self {
        x: 0.0,
        y: 0.0,
        z: 0.0,
    };
    pub const X: Self = Self {
        x: 1.0,
        y: 0.0,
        z: 0.0,
    };
    pub const Y: Self = Self {
        x: 0.0,
        y: 1.0,
        z: 0.0,
    };
    pub const Z: Self = Self {
        x: 0.0,
        y: 0.0,
        z: 1.0,
    };

    pub fn new(x: f64, y: f64, z: f64) -> Self {
        Self { x, y, z }
    }

    pub fn dot(&self, other: &Self) -> f64 {
        self.x * other.x + self.y * other.y + self.z * other.z
    }

    pub fn cross(&self, other: &Self) -> Self {
        Self {
            x: self.y * other.z - self.z * other.y,
            y: self.z * other.x - self.x * other.z,
            z: self.x * other.y - self.y * other.x,
        }
    }

    pub fn length(&self) -> f64 {
        self.dot(self).sqrt()
    }

    pub fn normalized(&self) -> Option<Self> {
        let len = self.length();
        if len < 1e-12 {
            None
        } else {
            Some(*self / len)
        }
    }

    /// Same direction, given length. `None` for a zero vector.
    pub fn with_length(&self, length: f64) -> Option<Self> {
        self.normalized().map(|n| n * length)
    }

    /// Unsigned angle in `[0, π]`. Zero when either vector is degenerate.
    pub fn angle_to(&self, other: &Self) -> f64 {
        let len_product = self.length() * other.length();
        if len_product < 1e-15 {
            return 0.0;
        }
        (self.dot(other) / len_product).clamp(-1.0, 1.0).acos()
    }

    /// Component of `self` along `other`.
    pub fn project_onto(&self, other: &Self) -> Self {
        let denom = other.dot(other);
        if denom < 1e-30 {
            return Self::ZERO;
        }
        *other * (self.dot(other) / denom)
    }

    /// Component of `self` perpendicular to `other`.
    pub fn reject_from(&self, other: &Self) -> Self {
        *self - self.project_onto(other)
    }

    /// Any unit vector perpendicular to `self`.
    pub fn any_perpendicular(&self) -> Option<Self> {
        let n = self.normalized()?;
        let seed = if n.x.abs() < 0.9 { Vec3::X } else { Vec3::Y };
        seed.cross(&n).normalized()
    }

    /// Right-handed rotation about `axis` by `angle` radians.
    pub fn rotated_about(&self, axis: &Vec3, angle: f64) -> Option<Self> {
        let axis = axis.normalized()?;
        let rotation = Rotation3::from_axis_angle(
            &Unit::new_unchecked(Vector3::new(axis.x, axis.y, axis.z)),
            angle,
        );
        let v = rotation * Vector3::new(self.x, self.y, self.z);
        Some(Vec3::new(v.x, v.y, v.z))
    }
}

impl Add for Vec3 {
    type Output = Self;
    fn add(self, rhs: Self) -> Self::Output {
        Self::new(self.x + rhs.x, self.y + rhs.y, self.z + rhs.z)
    }
}

impl Sub for Vec3 {
    type Output = Self;
    fn sub(self, rhs: Self) -> Self::Output {
        Self::new(self.x - rhs.x, self.y - rhs.y, self.z - rhs.z)
    }
}

impl Mul<f64> for Vec3 {
    type Output = Self;
    fn mul(self, rhs: f64) -> Self::Output {
        Self::new(self.x * rhs, self.y * rhs, self.z * rhs)
    }
}

impl Div<f64> for Vec3 {
    type Output = Self;
    fn div(self, rhs: f64) -> Self::Output {
        Self::new(self.x / rhs, self.y / rhs, self.z / rhs)
    }
}

impl Neg for Vec3 {
    type Output = Self;
    fn neg(self) -> Self::Output {
        Self::new(-self.x, -self.y, -self.z)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use std::f64::consts::{FRAC_PI_2, FRAC_PI_4, PI};

    #[test]
    fn test_cross_product() {
        let result = Vec3::X.cross(&Vec3::Y);
        assert_eq!(result, Vec3::Z);
    }

    #[test]
    fn test_normalized_zero_is_none() {
        assert!(Vec3::ZERO.normalized().is_none());
        let n = Vec3::new(3.0, 0.0, 4.0).normalized().unwrap();
        assert_relative_eq!(n.length(), 1.0, epsilon = 1e-12);
    }

    #[test]
    fn test_angle_to() {
        assert_relative_eq!(Vec3::X.angle_to(&Vec3::Y), FRAC_PI_2, epsilon = 1e-12);
        assert_relative_eq!(Vec3::X.angle_to(&(-Vec3::X)), PI, epsilon = 1e-12);
        assert_eq!(Vec3::ZERO.angle_to(&Vec3::X), 0.0);
    }

    #[test]
    fn test_reject_from_is_perpendicular() {
        let v = Vec3::new(2.0, 3.0, 0.0);
        let r = v.reject_from(&Vec3::X);
        assert_relative_eq!(r.dot(&Vec3::X), 0.0, epsilon = 1e-12);
        assert_relative_eq!(r.y, 3.0, epsilon = 1e-12);
    }

    #[test]
    fn test_rotation_moves_away_from_reference() {
        // Rotating v about d x v by a positive angle increases its angle to d.
        let d = Vec3::X;
        let v = Vec3::new(1.0, 1.0, 0.0);
        let axis = d.cross(&v);
        let rotated = v.rotated_about(&axis, FRAC_PI_4).unwrap();
        assert_relative_eq!(rotated.angle_to(&d), FRAC_PI_2, epsilon = 1e-12);
        assert_relative_eq!(rotated.length(), v.length(), epsilon = 1e-12);
    }

    #[test]
    fn test_any_perpendicular() {
        for v in [Vec3::X, Vec3::Y, Vec3::new(1.0, 2.0, 3.0)] {
            let p = v.any_perpendicular().unwrap();
            assert_relative_eq!(p.dot(&v), 0.0, epsilon = 1e-12);
        }
    }
}
