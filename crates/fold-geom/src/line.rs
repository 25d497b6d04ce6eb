use serde::{Deserialize, Serialize};

use super::point::Point3d;
use super::vector::Vec3;

/// An infinite line defined by a point and a unit direction.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Line3d {
    pub origin: Point3d,
    pub direction: Vec3,
}

impl Line3d {
    /// `None` when `direction` has no length.
    pub fn new(origin: Point3d, direction: Vec3) -> Option<Self> {
        Some(Self {
            origin,
            direction: direction.normalized()?,
        })
    }

    pub fn from_points(a: Point3d, b: Point3d) -> Option<Self> {
        Self::new(a, b - a)
    }

    pub fn evaluate(&self, t: f64) -> Point3d {
        self.origin + self.direction * t
    }

    /// Signed distance along the line from its origin to the foot of `p`.
    pub fn parameter_of(&self, p: &Point3d) -> f64 {
        (*p - self.origin).dot(&self.direction)
    }

    pub fn closest_point(&self, p: &Point3d) -> Point3d {
        self.evaluate(self.parameter_of(p))
    }

    pub fn distance_to_point(&self, p: &Point3d) -> f64 {
        p.distance_to(&self.closest_point(p))
    }

    /// Perpendicular translation carrying the foot of `p` on this line to `p`.
    pub fn offset_of(&self, p: &Point3d) -> Vec3 {
        *p - self.closest_point(p)
    }

    /// Closest points between this line and `other`: `(t_self, t_other, distance)`.
    /// `None` if the lines are parallel.
    pub fn closest_approach(&self, other: &Line3d) -> Option<(f64, f64, f64)> {
        let w = self.origin - other.origin;
        let b = self.direction.dot(&other.direction);
        let d = self.direction.dot(&w);
        let e = other.direction.dot(&w);

        let denom = 1.0 - b * b;
        if denom.abs() < 1e-12 {
            return None;
        }
        let t1 = (b * e - d) / denom;
        let t2 = (e - b * d) / denom;
        let dist = self.evaluate(t1).distance_to(&other.evaluate(t2));
        Some((t1, t2, dist))
    }
}

/// A half-line: the pointer ray handed in by the picking collaborator.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Ray {
    pub origin: Point3d,
    pub direction: Vec3,
}

impl Ray {
    pub fn new(origin: Point3d, direction: Vec3) -> Option<Self> {
        Some(Self {
            origin,
            direction: direction.normalized()?,
        })
    }

    /// Ray from `origin` passing through `target`.
    pub fn toward(origin: Point3d, target: Point3d) -> Option<Self> {
        Self::new(origin, target - origin)
    }

    pub fn at(&self, t: f64) -> Point3d {
        self.origin + self.direction * t
    }
}
