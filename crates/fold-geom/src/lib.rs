//! Geometry utilities for joint construction on pop-up book patches.
//!
//! Everything here is a plain value type or a pure function. Degenerate
//! inputs (zero-length directions, parallel planes) surface as `None` rather
//! than NaN so callers can decide how to recover.

pub mod intersection;
pub mod line;
pub mod plane;
pub mod point;
pub mod polygon;
pub mod vector;

pub use intersection::{line_plane_intersection, ray_plane, ray_sphere, RayHit};
pub use line::{Line3d, Ray};
pub use plane::{Plane, Side};
pub use point::Point3d;
pub use vector::Vec3;

use serde::{Deserialize, Serialize};

/// Global tolerance configuration for geometric comparisons.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Tolerance {
    /// Points closer than this are considered coincident.
    pub coincidence: f64,
    /// Angles smaller than this (radians) are considered zero.
    pub angular: f64,
    /// Signed plane distances below this count as on-plane.
    pub planar: f64,
}

impl Default for Tolerance {
    fn default() -> Self {
        Self {
            coincidence: 1e-7,
            angular: 1e-9,
            planar: 1e-6,
        }
    }
}

impl Tolerance {
    pub fn points_coincident(&self, a: &Point3d, b: &Point3d) -> bool {
        a.distance_to(b) < self.coincidence
    }

    pub fn is_zero_length(&self, length: f64) -> bool {
        length.abs() < self.coincidence
    }

    pub fn is_zero_angle(&self, angle: f64) -> bool {
        angle.abs() < self.angular
    }

    /// Two normals are parallel when their cross product is (nearly) zero.
    pub fn normals_parallel(&self, a: &Vec3, b: &Vec3) -> bool {
        a.cross(b).length() < self.planar
    }
}
