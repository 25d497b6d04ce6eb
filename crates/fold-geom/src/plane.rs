use serde::{Deserialize, Serialize};

use super::point::Point3d;
use super::vector::Vec3;

/// Which half-space of a plane a point falls in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Side {
    Positive,
    Negative,
    /// Within the caller's epsilon of the plane.
    On,
}

/// An infinite oriented plane with an in-plane frame for 2D work.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Plane {
    pub origin: Point3d,
    pub normal: Vec3,
    pub u_axis: Vec3,
    pub v_axis: Vec3,
}

impl Plane {
    /// `None` when `normal` has no length.
    pub fn new(origin: Point3d, normal: Vec3) -> Option<Self> {
        let normal = normal.normalized()?;
        let u_axis = normal.any_perpendicular()?;
        let v_axis = normal.cross(&u_axis);
        Some(Self {
            origin,
            normal,
            u_axis,
            v_axis,
        })
    }

    /// Plane through three points, normal `(b - a) x (c - a)`.
    /// `None` when the points are collinear.
    pub fn from_points(a: Point3d, b: Point3d, c: Point3d) -> Option<Self> {
        Self::new(a, (b - a).cross(&(c - a)))
    }

    /// Plane containing the line through `origin` along `a` and along `b`.
    pub fn spanned_by(origin: Point3d, a: Vec3, b: Vec3) -> Option<Self> {
        Self::new(origin, a.cross(&b))
    }

    pub fn signed_distance(&self, p: &Point3d) -> f64 {
        (*p - self.origin).dot(&self.normal)
    }

    pub fn side_of(&self, p: &Point3d, eps: f64) -> Side {
        let d = self.signed_distance(p);
        if d.abs() <= eps {
            Side::On
        } else if d > 0.0 {
            Side::Positive
        } else {
            Side::Negative
        }
    }

    /// Strict side test with no on-plane band, used for half-space comparisons.
    pub fn same_side(&self, p: &Point3d, q: &Point3d) -> bool {
        (self.signed_distance(p) >= 0.0) == (self.signed_distance(q) >= 0.0)
    }

    pub fn is_on_plane(&self, p: &Point3d, eps: f64) -> bool {
        self.signed_distance(p).abs() <= eps
    }

    pub fn project_point(&self, p: &Point3d) -> Point3d {
        *p - self.normal * self.signed_distance(p)
    }

    /// Mirror image of `p` across the plane.
    pub fn reflect_point(&self, p: &Point3d) -> Point3d {
        *p - self.normal * (2.0 * self.signed_distance(p))
    }

    /// In-plane (u, v) coordinates of the projection of `p`.
    pub fn parameters_of(&self, p: &Point3d) -> (f64, f64) {
        let v = *p - self.origin;
        (v.dot(&self.u_axis), v.dot(&self.v_axis))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn xy_plane() -> Plane {
        Plane::from_points(
            Point3d::ORIGIN,
            Point3d::new(1.0, 0.0, 0.0),
            Point3d::new(0.0, 1.0, 0.0),
        )
        .unwrap()
    }

    #[test]
    fn test_three_point_plane_normal() {
        let plane = xy_plane();
        assert_relative_eq!(plane.normal.z, 1.0, epsilon = 1e-12);
    }

    #[test]
    fn test_collinear_points_have_no_plane() {
        let plane = Plane::from_points(
            Point3d::ORIGIN,
            Point3d::new(1.0, 0.0, 0.0),
            Point3d::new(2.0, 0.0, 0.0),
        );
        assert!(plane.is_none());
    }

    #[test]
    fn test_side_classification() {
        let plane = xy_plane();
        assert_eq!(plane.side_of(&Point3d::new(0.0, 0.0, 2.0), 1e-9), Side::Positive);
        assert_eq!(plane.side_of(&Point3d::new(0.0, 0.0, -2.0), 1e-9), Side::Negative);
        assert_eq!(plane.side_of(&Point3d::new(5.0, 5.0, 1e-12), 1e-9), Side::On);
    }

    #[test]
    fn test_project_and_reflect() {
        let plane = xy_plane();
        let p = Point3d::new(1.0, 2.0, 3.0);
        let foot = plane.project_point(&p);
        assert_relative_eq!(foot.z, 0.0, epsilon = 1e-12);
        let mirror = plane.reflect_point(&p);
        assert_relative_eq!(mirror.z, -3.0, epsilon = 1e-12);
        assert_relative_eq!(mirror.x, 1.0, epsilon = 1e-12);
    }

    #[test]
    fn test_in_plane_frame_is_orthonormal() {
        let plane = Plane::new(Point3d::ORIGIN, Vec3::new(1.0, 1.0, 1.0)).unwrap();
        assert_relative_eq!(plane.u_axis.dot(&plane.v_axis), 0.0, epsilon = 1e-12);
        assert_relative_eq!(plane.u_axis.dot(&plane.normal), 0.0, epsilon = 1e-12);
        assert_relative_eq!(plane.v_axis.length(), 1.0, epsilon = 1e-12);
    }
}
