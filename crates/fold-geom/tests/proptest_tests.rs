//! Property-based tests for geometry invariants using the `proptest` crate.

use proptest::prelude::*;

use fold_geom::polygon::{closest_point_on_boundary, contains_point, is_between};
use fold_geom::{Line3d, Plane, Point3d, Vec3};

// ---------------------------------------------------------------------------
// Strategy helpers
// ---------------------------------------------------------------------------

fn arb_point() -> impl Strategy<Value = (f64, f64, f64)> {
    (-100.0f64..100.0, -100.0f64..100.0, -100.0f64..100.0)
}

/// Direction components bounded away from the zero vector.
fn arb_direction() -> impl Strategy<Value = (f64, f64, f64)> {
    (0.1f64..1.0, -1.0f64..1.0, -1.0f64..1.0)
}

fn arb_angle() -> impl Strategy<Value = f64> {
    -std::f64::consts::PI..std::f64::consts::PI
}

const TOL: f64 = 1e-6;

fn p((x, y, z): (f64, f64, f64)) -> Point3d {
    Point3d::new(x, y, z)
}

fn v((x, y, z): (f64, f64, f64)) -> Vec3 {
    Vec3::new(x, y, z)
}

// ---------------------------------------------------------------------------
// 1. Projection onto a plane lands on the plane
// ---------------------------------------------------------------------------

proptest! {
    #[test]
    fn plane_projection_is_on_plane(
        origin in arb_point(),
        normal in arb_direction(),
        q in arb_point(),
    ) {
        let plane = Plane::new(p(origin), v(normal)).unwrap();
        let foot = plane.project_point(&p(q));
        prop_assert!(plane.signed_distance(&foot).abs() < TOL);
    }
}

// ---------------------------------------------------------------------------
// 2. Reflection is an involution and preserves distance to the plane
// ---------------------------------------------------------------------------

proptest! {
    #[test]
    fn plane_reflection_involution(
        origin in arb_point(),
        normal in arb_direction(),
        q in arb_point(),
    ) {
        let plane = Plane::new(p(origin), v(normal)).unwrap();
        let q = p(q);
        let mirrored = plane.reflect_point(&q);
        let back = plane.reflect_point(&mirrored);
        prop_assert!(back.distance_to(&q) < TOL);
        prop_assert!((plane.signed_distance(&mirrored) + plane.signed_distance(&q)).abs() < TOL);
    }
}

// ---------------------------------------------------------------------------
// 3. Line offset is perpendicular and reconstructs the point
// ---------------------------------------------------------------------------

proptest! {
    #[test]
    fn line_offset_is_perpendicular(
        origin in arb_point(),
        dir in arb_direction(),
        q in arb_point(),
    ) {
        let line = Line3d::new(p(origin), v(dir)).unwrap();
        let q = p(q);
        let offset = line.offset_of(&q);
        prop_assert!(offset.dot(&line.direction).abs() < TOL);
        prop_assert!((line.closest_point(&q) + offset).distance_to(&q) < TOL);
    }
}

// ---------------------------------------------------------------------------
// 4. Rotation preserves length
// ---------------------------------------------------------------------------

proptest! {
    #[test]
    fn rotation_preserves_length(
        vec in arb_point(),
        axis in arb_direction(),
        angle in arb_angle(),
    ) {
        let vec = v(vec);
        let rotated = vec.rotated_about(&v(axis), angle).unwrap();
        prop_assert!((rotated.length() - vec.length()).abs() < TOL);
    }
}

// ---------------------------------------------------------------------------
// 5. Any lerp between two points is "between" them
// ---------------------------------------------------------------------------

proptest! {
    #[test]
    fn lerp_is_between(a in arb_point(), b in arb_point(), t in 0.0f64..1.0) {
        let (a, b) = (p(a), p(b));
        prop_assert!(is_between(&a, &a.lerp(&b, t), &b, TOL));
    }
}

// ---------------------------------------------------------------------------
// 6. The nearest outline point of a square is always contained by it
// ---------------------------------------------------------------------------

proptest! {
    #[test]
    fn closest_boundary_point_is_contained(x in -50.0f64..50.0, y in -50.0f64..50.0) {
        let square = [
            Point3d::new(-5.0, -5.0, 0.0),
            Point3d::new(5.0, -5.0, 0.0),
            Point3d::new(5.0, 5.0, 0.0),
            Point3d::new(-5.0, 5.0, 0.0),
        ];
        let q = closest_point_on_boundary(&square, &Point3d::new(x, y, 0.0)).unwrap();
        prop_assert!(contains_point(&square, &q, 1e-9));
    }
}
