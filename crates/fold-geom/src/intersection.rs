use super::line::Ray;
use super::plane::Plane;
use super::point::Point3d;
use super::vector::Vec3;

/// Result of a ray hitting a surface.
#[derive(Debug, Clone, Copy)]
pub struct RayHit {
    pub point: Point3d,
    pub t: f64,
}

// ─── Line-Plane Intersection ────────────────────────────────────────────────

/// Intersection of the infinite line `origin + s * direction` with `plane`.
/// `None` if the line is parallel to the plane.
pub fn line_plane_intersection(origin: &Point3d, direction: &Vec3, plane: &Plane) -> Option<Point3d> {
    let denom = direction.dot(&plane.normal);
    if denom.abs() < 1e-12 {
        return None;
    }
    let s = (plane.origin - *origin).dot(&plane.normal) / denom;
    Some(*origin + *direction * s)
}

// ─── Ray-Plane Intersection ─────────────────────────────────────────────────

pub fn ray_plane(ray: &Ray, plane: &Plane) -> Option<RayHit> {
    let denom = ray.direction.dot(&plane.normal);
    if denom.abs() < 1e-12 {
        return None; // parallel
    }
    let t = (plane.origin - ray.origin).dot(&plane.normal) / denom;
    if t < 0.0 {
        return None; // behind ray
    }
    Some(RayHit { point: ray.at(t), t })
}

// ─── Ray-Sphere Intersection ────────────────────────────────────────────────

/// Nearest non-negative hit of `ray` on the sphere, if any.
pub fn ray_sphere(ray: &Ray, center: &Point3d, radius: f64) -> Option<RayHit> {
    let oc = ray.origin - *center;
    let b = 2.0 * oc.dot(&ray.direction);
    let c = oc.dot(&oc) - radius * radius;
    let discriminant = b * b - 4.0 * c;

    if discriminant < 0.0 {
        return None;
    }

    let sqrt_disc = discriminant.sqrt();
    [(-b - sqrt_disc) / 2.0, (-b + sqrt_disc) / 2.0]
        .into_iter()
        .find(|t| *t >= 0.0)
        .map(|t| RayHit { point: ray.at(t), t })
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_line_plane_intersection() {
        let plane = Plane::new(Point3d::new(0.0, 0.0, 2.0), Vec3::Z).unwrap();
        let hit = line_plane_intersection(&Point3d::ORIGIN, &Vec3::new(1.0, 0.0, 1.0), &plane).unwrap();
        assert_relative_eq!(hit.x, 2.0, epsilon = 1e-12);
        assert_relative_eq!(hit.z, 2.0, epsilon = 1e-12);
        // Lines extend both ways.
        let back = line_plane_intersection(&Point3d::new(0.0, 0.0, 5.0), &Vec3::Z, &plane).unwrap();
        assert_relative_eq!(back.z, 2.0, epsilon = 1e-12);
    }

    #[test]
    fn test_parallel_line_misses_plane() {
        let plane = Plane::new(Point3d::ORIGIN, Vec3::Z).unwrap();
        assert!(line_plane_intersection(&Point3d::new(0.0, 0.0, 1.0), &Vec3::X, &plane).is_none());
    }

    #[test]
    fn test_ray_plane_behind_is_none() {
        let plane = Plane::new(Point3d::ORIGIN, Vec3::Z).unwrap();
        let ray = Ray::new(Point3d::new(0.0, 0.0, 1.0), Vec3::Z).unwrap();
        assert!(ray_plane(&ray, &plane).is_none());
        let ray = Ray::new(Point3d::new(3.0, 0.0, 1.0), -Vec3::Z).unwrap();
        let hit = ray_plane(&ray, &plane).unwrap();
        assert_relative_eq!(hit.t, 1.0, epsilon = 1e-12);
        assert_relative_eq!(hit.point.x, 3.0, epsilon = 1e-12);
    }

    #[test]
    fn test_ray_sphere_nearest_hit() {
        let ray = Ray::new(Point3d::new(-5.0, 0.0, 0.0), Vec3::X).unwrap();
        let hit = ray_sphere(&ray, &Point3d::ORIGIN, 1.0).unwrap();
        assert_relative_eq!(hit.point.x, -1.0, epsilon = 1e-12);
        let miss = Ray::new(Point3d::new(-5.0, 2.0, 0.0), Vec3::X).unwrap();
        assert!(ray_sphere(&miss, &Point3d::ORIGIN, 1.0).is_none());
    }
}
