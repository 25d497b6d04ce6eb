use serde::{Deserialize, Serialize};
use slotmap::new_key_type;

use fold_geom::{polygon, Plane, Point3d, Vec3};

new_key_type! {
    /// Handle to a patch owned by the book model.
    pub struct PatchId;
    /// Handle to a joint owned by the book model.
    pub struct JointId;
}

/// Fold mechanism variants known to the book model.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum JointKind {
    /// Single hinge/apex with two wings. Both V-style flavours commit as this.
    VStyle,
    /// Cross-fold (step) joint. Read during construction, never produced.
    CrossFold,
}

impl JointKind {
    /// Tag string used by the book's persisted representation.
    pub fn tag(&self) -> &'static str {
        match self {
            JointKind::VStyle => "D1Joint",
            JointKind::CrossFold => "D2Joint",
        }
    }
}

/// A rigid flat region of a page.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Patch {
    /// Ordered, cyclic outline. Vertex order defines edge adjacency.
    pub boundary: Vec<Point3d>,
    /// Hinge axis connecting this patch to its parent.
    pub axis: [Point3d; 2],
    pub normal: Vec3,
    /// Non-owning back-reference.
    pub parent: Option<PatchId>,
    /// Joint this patch hangs from, if any.
    pub joint: Option<JointId>,
    /// Non-owning forward references, traversal only.
    pub children: Vec<PatchId>,
}

impl Patch {
    pub fn plane(&self) -> Option<Plane> {
        Plane::new(*self.boundary.first()?, self.normal)
    }

    /// Unsigned distance from the patch's plane to `p`.
    pub fn distance_to_point(&self, p: &Point3d) -> f64 {
        self.plane()
            .map(|plane| plane.signed_distance(p).abs())
            .unwrap_or(f64::INFINITY)
    }

    pub fn contains(&self, p: &Point3d, eps: f64) -> bool {
        polygon::contains_point(&self.boundary, p, eps)
    }

    pub fn has_child(&self, id: PatchId) -> bool {
        self.children.contains(&id)
    }
}

/// A fold mechanism between two patches.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Joint {
    pub kind: JointKind,
    pub axis: [Point3d; 2],
    pub patches: (PatchId, PatchId),
}

impl Joint {
    /// The patch on the opposite side of the joint from `patch`.
    pub fn other(&self, patch: PatchId) -> Option<PatchId> {
        match self.patches {
            (a, b) if a == patch => Some(b),
            (a, b) if b == patch => Some(a),
            _ => None,
        }
    }
}

/// Hinge/apex/wing layout of one side of a proposed joint.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SideFrame {
    pub wing: Point3d,
    pub hinge: Point3d,
    pub apex: Point3d,
}

/// Input to the book's flat-foldability analysis.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BoundaryRequest {
    pub patch_a: PatchId,
    pub patch_b: PatchId,
    pub side_a: SideFrame,
    pub side_b: SideFrame,
    pub kind: JointKind,
}

/// Safety polygons returned by the analysis, one per side.
///
/// Layout of each polygon: index 0 bounds the wing, index 1 is the hinge
/// corner, index 2 bounds the apex, and indices >= 2 walk the outer edge.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SafetyBoundaries {
    pub side_a: Vec<Point3d>,
    pub side_b: Vec<Point3d>,
}

/// Errors from book model operations.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ModelError {
    #[error("patch not found: {id:?}")]
    PatchNotFound { id: PatchId },

    #[error("degenerate patch outline ({points} points)")]
    DegenerateOutline { points: usize },
}
