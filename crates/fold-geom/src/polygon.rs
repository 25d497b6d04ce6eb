//! Helpers over ordered, cyclic, planar polygons given as `&[Point3d]`.

use super::line::Line3d;
use super::plane::Plane;
use super::point::Point3d;
use super::vector::Vec3;

/// Cyclic edges `(p[i], p[i + 1 mod n])`.
pub fn edges(polygon: &[Point3d]) -> impl Iterator<Item = (Point3d, Point3d)> + '_ {
    let n = polygon.len();
    (0..n).map(move |i| (polygon[i], polygon[(i + 1) % n]))
}

/// True when `p` lies on the infinite line through `a` and `b`.
pub fn is_collinear(a: &Point3d, p: &Point3d, b: &Point3d, eps: f64) -> bool {
    match Line3d::from_points(*a, *b) {
        Some(line) => line.distance_to_point(p) < eps,
        None => a.distance_to(p) < eps,
    }
}

/// True when `p` lies on the closed segment `[a, b]`.
pub fn is_between(a: &Point3d, p: &Point3d, b: &Point3d, eps: f64) -> bool {
    (a.distance_to(p) + p.distance_to(b) - a.distance_to(b)).abs() < eps
}

pub fn closest_point_on_segment(a: &Point3d, b: &Point3d, p: &Point3d) -> Point3d {
    let ab = *b - *a;
    let len_sq = ab.dot(&ab);
    if len_sq < 1e-24 {
        return *a;
    }
    let t = ((*p - *a).dot(&ab) / len_sq).clamp(0.0, 1.0);
    *a + ab * t
}

/// Polygon normal by Newell's method; robust to a few collinear vertices.
pub fn normal(polygon: &[Point3d]) -> Option<Vec3> {
    let mut n = Vec3::ZERO;
    for (a, b) in edges(polygon) {
        n = n + Vec3::new(
            (a.y - b.y) * (a.z + b.z),
            (a.z - b.z) * (a.x + b.x),
            (a.x - b.x) * (a.y + b.y),
        );
    }
    n.normalized()
}

/// Supporting plane of the polygon, anchored at its first vertex.
pub fn supporting_plane(polygon: &[Point3d]) -> Option<Plane> {
    let origin = *polygon.first()?;
    Plane::new(origin, normal(polygon)?)
}

/// Point-in-polygon for the projection of `p` onto the polygon's plane.
/// Points within `eps` of an edge count as inside.
pub fn contains_point(polygon: &[Point3d], p: &Point3d, eps: f64) -> bool {
    if polygon.len() < 3 {
        return false;
    }
    let Some(plane) = supporting_plane(polygon) else {
        return false;
    };
    let q = plane.project_point(p);
    if edges(polygon).any(|(a, b)| closest_point_on_segment(&a, &b, &q).distance_to(&q) <= eps) {
        return true;
    }

    let (px, py) = plane.parameters_of(&q);
    let mut inside = false;
    for (a, b) in edges(polygon) {
        let (ax, ay) = plane.parameters_of(&a);
        let (bx, by) = plane.parameters_of(&b);
        if (ay > py) != (by > py) {
            let x_cross = ax + (py - ay) * (bx - ax) / (by - ay);
            if px < x_cross {
                inside = !inside;
            }
        }
    }
    inside
}

/// Nearest point on the polygon's outline.
pub fn closest_point_on_boundary(polygon: &[Point3d], p: &Point3d) -> Option<Point3d> {
    edges(polygon)
        .map(|(a, b)| closest_point_on_segment(&a, &b, p))
        .min_by(|x, y| x.distance_to(p).total_cmp(&y.distance_to(p)))
}

/// The two outermost crossings of the line `origin + t * direction` with the
/// polygon outline, ordered by `t`. For a convex polygon these are the entry
/// and exit points; their midpoint re-centres a point inside the polygon.
pub fn line_boundary_intersection_pair(
    origin: &Point3d,
    direction: &Vec3,
    polygon: &[Point3d],
    eps: f64,
) -> Option<(Point3d, Point3d)> {
    let line = Line3d::new(*origin, *direction)?;
    let mut hits: Vec<f64> = Vec::new();

    for (a, b) in edges(polygon) {
        let Some(edge) = Line3d::from_points(a, b) else {
            continue;
        };
        let Some((t, s, dist)) = line.closest_approach(&edge) else {
            continue;
        };
        if dist < eps && s >= -eps && s <= a.distance_to(&b) + eps {
            hits.push(t);
        }
    }

    hits.sort_by(f64::total_cmp);
    hits.dedup_by(|x, y| (*x - *y).abs() < eps);
    match (hits.first(), hits.last()) {
        (Some(&t0), Some(&t1)) if hits.len() >= 2 => Some((line.evaluate(t0), line.evaluate(t1))),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn square() -> Vec<Point3d> {
        vec![
            Point3d::new(0.0, 0.0, 0.0),
            Point3d::new(4.0, 0.0, 0.0),
            Point3d::new(4.0, 4.0, 0.0),
            Point3d::new(0.0, 4.0, 0.0),
        ]
    }

    #[test]
    fn test_is_between() {
        let a = Point3d::ORIGIN;
        let b = Point3d::new(4.0, 0.0, 0.0);
        assert!(is_between(&a, &Point3d::new(1.0, 0.0, 0.0), &b, 1e-9));
        assert!(is_between(&a, &a, &b, 1e-9));
        assert!(!is_between(&a, &Point3d::new(5.0, 0.0, 0.0), &b, 1e-9));
        assert!(!is_between(&a, &Point3d::new(2.0, 1.0, 0.0), &b, 1e-9));
    }

    #[test]
    fn test_is_collinear() {
        let a = Point3d::ORIGIN;
        let b = Point3d::new(1.0, 1.0, 0.0);
        assert!(is_collinear(&a, &Point3d::new(-3.0, -3.0, 0.0), &b, 1e-9));
        assert!(!is_collinear(&a, &Point3d::new(1.0, 0.0, 0.0), &b, 1e-9));
    }

    #[test]
    fn test_contains_point() {
        let sq = square();
        assert!(contains_point(&sq, &Point3d::new(2.0, 2.0, 0.0), 1e-9));
        assert!(contains_point(&sq, &Point3d::new(4.0, 2.0, 0.0), 1e-9));
        assert!(!contains_point(&sq, &Point3d::new(5.0, 2.0, 0.0), 1e-9));
        // Off-plane points are judged by their projection.
        assert!(contains_point(&sq, &Point3d::new(1.0, 1.0, 3.0), 1e-9));
    }

    #[test]
    fn test_closest_point_on_boundary() {
        let p = closest_point_on_boundary(&square(), &Point3d::new(6.0, 1.0, 0.0)).unwrap();
        assert_relative_eq!(p.x, 4.0, epsilon = 1e-12);
        assert_relative_eq!(p.y, 1.0, epsilon = 1e-12);
    }

    #[test]
    fn test_line_boundary_pair_from_outside() {
        let (entry, exit) =
            line_boundary_intersection_pair(&Point3d::new(2.0, -3.0, 0.0), &Vec3::Y, &square(), 1e-9)
                .unwrap();
        assert_relative_eq!(entry.y, 0.0, epsilon = 1e-9);
        assert_relative_eq!(exit.y, 4.0, epsilon = 1e-9);
        let mid = entry.midpoint(&exit);
        assert!(contains_point(&square(), &mid, 1e-9));
    }

    #[test]
    fn test_line_boundary_pair_miss() {
        let miss = line_boundary_intersection_pair(&Point3d::new(9.0, 0.0, 0.0), &Vec3::Y, &square(), 1e-9);
        assert!(miss.is_none());
    }

    #[test]
    fn test_newell_normal() {
        let n = normal(&square()).unwrap();
        assert_relative_eq!(n.z, 1.0, epsilon = 1e-12);
    }
}
