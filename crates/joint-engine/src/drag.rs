//! Maps a selected element to its drag mode and permitted-motion plane.
//!
//! Legality of the resulting candidate point is decided by the solver; this
//! module only turns a pointer ray into a candidate.

use serde::{Deserialize, Serialize};

use fold_geom::{ray_plane, Line3d, Plane, Point3d, Ray};

use crate::draft::{DragMode, Edge, JointDraft, JointSide, JointVariant, VertexId};
use crate::error::SessionError;
use crate::solver::bisector;

/// A rendered element of the draft that the pointer can pick.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Element {
    Dot(VertexId),
    Edge(Edge),
}

pub fn mode_for_selection(draft: &JointDraft, element: &Element) -> Result<DragMode, SessionError> {
    match *element {
        Element::Dot(id) if id == draft.hinge_id() => Ok(DragMode::Shift),
        Element::Dot(id) if id == draft.apex_id() => Ok(DragMode::TopAngle),
        Element::Dot(id) if id == draft.wing_id(JointSide::A) || id == draft.wing_id(JointSide::B) => {
            Ok(DragMode::SideAngle)
        }
        Element::Dot(id) if draft.locate(id).is_some() => Ok(DragMode::FreeMove),
        Element::Edge(edge) if draft.edges().contains(&edge) => Ok(DragMode::Shift),
        _ => Err(SessionError::UnknownElement),
    }
}

/// Side a dot belongs to, A for shared points and edges.
fn element_side(draft: &JointDraft, element: &Element) -> JointSide {
    match element {
        Element::Dot(id) => draft.locate(*id).map_or(JointSide::A, |(side, _)| side),
        Element::Edge(edge) => draft.edge_side(edge).unwrap_or(JointSide::A),
    }
}

/// Plane the dragged element may move in. `None` when the draft is
/// degenerate enough that no plane can be formed, or there is no drag.
pub fn manifold_for(draft: &JointDraft, mode: DragMode, element: &Element, viewer: &Point3d) -> Option<Plane> {
    let hinge = draft.hinge();
    let side = element_side(draft, element);
    match (mode, draft.variant) {
        (DragMode::None, _) => None,
        (DragMode::Shift, JointVariant::VStyle) => {
            let facing = Line3d::new(hinge, draft.hinge_axis)?.offset_of(viewer);
            Plane::new(hinge, -facing)
        }
        (DragMode::Shift, JointVariant::SpecialVStyle) => Plane::spanned_by(
            hinge,
            bisector(draft)?,
            draft.wing(JointSide::A) - draft.wing(JointSide::B),
        ),
        (DragMode::SideAngle, _) => Plane::spanned_by(hinge, draft.hinge_axis, draft.axis_translation(side)),
        (DragMode::TopAngle, _) => Plane::spanned_by(hinge, draft.hinge_axis, draft.apex() - hinge),
        (DragMode::FreeMove, _) => Plane::from_points(hinge, draft.apex(), draft.wing(side)),
    }
}

/// Where the pointer ray meets the manifold.
pub fn candidate_on(manifold: &Plane, ray: &Ray) -> Option<Point3d> {
    ray_plane(ray, manifold).map(|hit| hit.point)
}

/// Anchor for shift drags: the contact point projected onto the line the
/// joint slides along.
pub fn shift_reference(draft: &JointDraft, element: &Element, contact: &Point3d) -> Point3d {
    let hinge = draft.hinge();
    if matches!(element, Element::Dot(id) if *id == draft.hinge_id()) {
        return hinge;
    }
    let direction = match draft.variant {
        JointVariant::VStyle => Some(draft.hinge_axis),
        JointVariant::SpecialVStyle => bisector(draft),
    };
    direction
        .and_then(|d| Line3d::new(hinge, d))
        .map_or(hinge, |line| line.closest_point(contact))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::builder::build_joint;
    use crate::config::EngineConfig;
    use book_model::MockBook;

    fn rect(vertical: bool) -> Vec<Point3d> {
        let p = |x: f64, s: f64| {
            if vertical {
                Point3d::new(x, 0.0, s)
            } else {
                Point3d::new(x, s, 0.0)
            }
        };
        vec![p(-5.0, 0.0), p(5.0, 0.0), p(5.0, 10.0), p(-5.0, 10.0)]
    }

    fn draft() -> JointDraft {
        let mut book = MockBook::new();
        let floor = book.add_root_patch(rect(false));
        let wall = book.add_root_patch(rect(true));
        build_joint(
            &book,
            floor,
            wall,
            JointVariant::VStyle,
            Point3d::new(0.0, 20.0, 20.0),
            &EngineConfig::default(),
        )
        .unwrap()
    }

    #[test]
    fn test_selection_modes() {
        let mut d = draft();
        let mode = |d: &JointDraft, e: Element| mode_for_selection(d, &e);
        assert_eq!(mode(&d, Element::Dot(d.hinge_id())), Ok(DragMode::Shift));
        assert_eq!(mode(&d, Element::Dot(d.apex_id())), Ok(DragMode::TopAngle));
        assert_eq!(mode(&d, Element::Dot(d.wing_id(JointSide::B))), Ok(DragMode::SideAngle));
        assert_eq!(mode(&d, Element::Edge(d.edges()[1])), Ok(DragMode::Shift));

        let inner = d.hinge().lerp(&d.wing(JointSide::A).midpoint(&d.apex()), 0.5);
        let id = d.insert_on_edge(JointSide::A, 3, 1, inner);
        assert_eq!(mode(&d, Element::Dot(id)), Ok(DragMode::FreeMove));

        let bogus = Edge {
            from: d.apex_id(),
            to: d.apex_id(),
        };
        assert_eq!(mode(&d, Element::Edge(bogus)), Err(SessionError::UnknownElement));
    }

    #[test]
    fn test_side_angle_manifold_contains_hinge_axis() {
        let d = draft();
        let plane = manifold_for(&d, DragMode::SideAngle, &Element::Dot(d.wing_id(JointSide::A)), &Point3d::ORIGIN).unwrap();
        assert!(plane.is_on_plane(&d.hinge(), 1e-9));
        assert!(plane.is_on_plane(&(d.hinge() + d.hinge_axis), 1e-9));
        assert!(plane.is_on_plane(&(d.hinge() + d.axis_translation_a), 1e-9));
    }

    #[test]
    fn test_shift_manifold_faces_viewer() {
        let d = draft();
        let viewer = Point3d::new(0.0, 20.0, 20.0);
        let plane = manifold_for(&d, DragMode::Shift, &Element::Dot(d.hinge_id()), &viewer).unwrap();
        assert!(plane.is_on_plane(&(d.hinge() + d.hinge_axis * 3.0), 1e-9));

        let ray = Ray::toward(viewer, Point3d::new(2.0, 0.0, 0.0)).unwrap();
        let hit = candidate_on(&plane, &ray).unwrap();
        assert!(hit.distance_to(&Point3d::new(2.0, 0.0, 0.0)) < 1e-9);
    }

    #[test]
    fn test_parallel_ray_has_no_candidate() {
        let d = draft();
        let plane = manifold_for(&d, DragMode::TopAngle, &Element::Dot(d.apex_id()), &Point3d::ORIGIN).unwrap();
        let along = Ray::new(d.hinge() + plane.normal * 2.0, d.hinge_axis).unwrap();
        assert!(candidate_on(&plane, &along).is_none());
    }

    #[test]
    fn test_shift_reference_projects_onto_axis() {
        let d = draft();
        let edge = Element::Edge(d.edges()[0]);
        let r = shift_reference(&d, &edge, &Point3d::new(1.5, 2.0, -1.0));
        assert!(r.distance_to(&Point3d::new(1.5, 0.0, 0.0)) < 1e-9);
        assert_eq!(shift_reference(&d, &Element::Dot(d.hinge_id()), &Point3d::new(9.0, 9.0, 9.0)), d.hinge());
    }
}
