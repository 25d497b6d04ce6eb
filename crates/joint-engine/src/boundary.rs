//! Safety-region refresh. The flat-foldability analysis itself belongs to the
//! book; this module only proposes the current hinge geometry and keeps the
//! last good answer.

use tracing::{debug, instrument};

use book_model::{BookQuery, BoundaryRequest, JointKind};

use crate::draft::{JointDraft, JointSide};

pub fn boundary_request(draft: &JointDraft) -> BoundaryRequest {
    BoundaryRequest {
        patch_a: draft.patch_a,
        patch_b: draft.patch_b,
        side_a: draft.frame(JointSide::A),
        side_b: draft.frame(JointSide::B),
        kind: JointKind::VStyle,
    }
}

/// Ask the book for fresh safety polygons. On success both boundaries are
/// replaced in place; when the book reports no valid region the previous
/// boundaries stay as they were. Returns whether they were replaced.
#[instrument(skip_all, fields(variant = ?draft.variant))]
pub fn refresh_boundaries<B: BookQuery + ?Sized>(draft: &mut JointDraft, book: &B) -> bool {
    match book.safety_boundaries(&boundary_request(draft)) {
        Some(found) => {
            draft.boundary_a.clear();
            draft.boundary_a.extend(found.side_a);
            draft.boundary_b.clear();
            draft.boundary_b.extend(found.side_b);
            debug!(
                points_a = draft.boundary_a.len(),
                points_b = draft.boundary_b.len(),
                "safety boundaries refreshed"
            );
            true
        }
        None => {
            debug!("no safety region for proposed hinge, keeping previous");
            false
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::builder::build_joint;
    use crate::config::EngineConfig;
    use crate::draft::JointVariant;
    use book_model::MockBook;
    use fold_geom::Point3d;

    fn book() -> (MockBook, book_model::PatchId, book_model::PatchId) {
        let mut book = MockBook::new();
        let floor = book.add_root_patch(vec![
            Point3d::new(-5.0, 0.0, 0.0),
            Point3d::new(5.0, 0.0, 0.0),
            Point3d::new(5.0, 10.0, 0.0),
            Point3d::new(-5.0, 10.0, 0.0),
        ]);
        let wall = book.add_root_patch(vec![
            Point3d::new(-5.0, 0.0, 0.0),
            Point3d::new(5.0, 0.0, 0.0),
            Point3d::new(5.0, 0.0, 10.0),
            Point3d::new(-5.0, 0.0, 10.0),
        ]);
        (book, floor, wall)
    }

    #[test]
    fn test_request_carries_current_frames() {
        let (book, floor, wall) = book();
        let draft = build_joint(&book, floor, wall, JointVariant::VStyle, Point3d::new(0.0, 20.0, 20.0), &EngineConfig::default()).unwrap();
        let request = boundary_request(&draft);
        assert_eq!(request.patch_a, draft.patch_a);
        assert_eq!(request.side_a.hinge, draft.hinge());
        assert_eq!(request.side_b.wing, draft.wing(JointSide::B));
        assert_eq!(request.side_a.apex, request.side_b.apex);
    }

    #[test]
    fn test_refused_refresh_keeps_previous_boundaries() {
        let (mut book, floor, wall) = book();
        let mut draft = build_joint(&book, floor, wall, JointVariant::VStyle, Point3d::new(0.0, 20.0, 20.0), &EngineConfig::default()).unwrap();
        let before = draft.boundary_a.clone();
        assert!(!before.is_empty());

        book.set_refuse_boundaries(true);
        assert!(!refresh_boundaries(&mut draft, &book));
        assert_eq!(draft.boundary_a, before);
        assert_eq!(book.boundary_requests(), 2);
    }

    #[test]
    fn test_first_refusal_leaves_boundaries_empty() {
        let (mut book, floor, wall) = book();
        book.set_refuse_boundaries(true);
        let draft = build_joint(&book, floor, wall, JointVariant::VStyle, Point3d::new(0.0, 20.0, 20.0), &EngineConfig::default()).unwrap();
        assert!(draft.boundary_a.is_empty() && draft.boundary_b.is_empty());
    }
}
