use fold_geom::Point3d;

use crate::types::*;

/// Read-only view of the pop-up book used while a joint is being built.
/// Implemented by the host application's patch tree and by `MockBook`.
pub trait BookQuery {
    fn patch(&self, id: PatchId) -> Option<&Patch>;

    fn joint(&self, id: JointId) -> Option<&Joint>;

    /// Shared adjacency axis of two patches, if they touch along an edge.
    fn axis_between(&self, a: PatchId, b: PatchId) -> Option<(Point3d, Point3d)>;

    /// True when the two patches share a boundary edge of positive length.
    fn is_neighbor(&self, a: PatchId, b: PatchId) -> bool;

    /// Flat-foldability analysis for a proposed joint. `None` when no valid
    /// region exists for the proposed hinge geometry.
    fn safety_boundaries(&self, request: &BoundaryRequest) -> Option<SafetyBoundaries>;

    /// Where `point`, attached to `patch`, ends up once the book is closed by
    /// `fraction` (0 = open, 1 = flat shut).
    fn predict_when_folded(&self, patch: PatchId, point: &Point3d, fraction: f64) -> Point3d;
}

/// Mutation side of the book model. Called only when a joint is committed.
pub trait BookModel: BookQuery {
    /// Append a new patch cut out of `source`.
    fn add_patch(
        &mut self,
        source: PatchId,
        boundary: &[Point3d],
        axis: [Point3d; 2],
    ) -> Result<PatchId, ModelError>;

    /// Join two patches along `axis`.
    fn add_joint(
        &mut self,
        a: PatchId,
        b: PatchId,
        axis: [Point3d; 2],
        kind: JointKind,
    ) -> Result<JointId, ModelError>;
}
