//! The in-progress joint: two side polygons over one shared point store.
//!
//! Hinge and apex are stored once and referenced by id from both sides, so
//! `side(A)[1] == side(B)[1]` and `side(A)[2] == side(B)[2]` hold by
//! construction rather than by keeping copies in sync.

use serde::{Deserialize, Serialize};
use slotmap::{new_key_type, SlotMap};

use book_model::{PatchId, SideFrame};
use fold_geom::{Point3d, Vec3};

new_key_type! {
    /// Stable handle to one point of a draft.
    pub struct VertexId;
}

pub const WING: usize = 0;
pub const HINGE: usize = 1;
pub const APEX: usize = 2;
/// First index of user-inserted edge points.
pub const FIRST_INSERTED: usize = 3;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum JointSide {
    A,
    B,
}

impl JointSide {
    pub fn other(self) -> Self {
        match self {
            JointSide::A => JointSide::B,
            JointSide::B => JointSide::A,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum JointVariant {
    /// Two directly adjacent patches.
    VStyle,
    /// Two non-adjacent patches joined through adjacent parallel ancestors.
    SpecialVStyle,
}

/// Active permitted-motion constraint.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum DragMode {
    #[default]
    None,
    FreeMove,
    SideAngle,
    TopAngle,
    Shift,
}

/// A rendered connecting line between two draft points.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Edge {
    pub from: VertexId,
    pub to: VertexId,
}

impl Edge {
    pub fn touches(&self, id: VertexId) -> bool {
        self.from == id || self.to == id
    }
}

/// Initial layout produced by the joint builder.
#[derive(Debug, Clone, Copy)]
pub(crate) struct Layout {
    pub wing_a: Point3d,
    pub wing_b: Point3d,
    pub hinge: Point3d,
    pub apex: Point3d,
    pub axis_translation_a: Vec3,
    pub axis_translation_b: Vec3,
    pub hinge_axis: Vec3,
    pub adjacency: [Point3d; 2],
}

#[derive(Debug, Clone)]
pub struct JointDraft {
    pub variant: JointVariant,
    pub patch_a: PatchId,
    pub patch_b: PatchId,
    points: SlotMap<VertexId, Point3d>,
    side_a: Vec<VertexId>,
    side_b: Vec<VertexId>,
    edges: Vec<Edge>,
    /// Safety polygons; empty until the first successful refresh.
    pub boundary_a: Vec<Point3d>,
    pub boundary_b: Vec<Point3d>,
    pub axis_translation_a: Vec3,
    pub axis_translation_b: Vec3,
    /// Direction of the hinge axis.
    pub hinge_axis: Vec3,
    /// Endpoints of the adjacency axis the joint was built on.
    pub adjacency: [Point3d; 2],
    pub angle_lock: bool,
    pub drag_mode: DragMode,
}

impl JointDraft {
    pub(crate) fn from_layout(
        variant: JointVariant,
        patch_a: PatchId,
        patch_b: PatchId,
        layout: Layout,
    ) -> Self {
        let mut points = SlotMap::with_key();
        let wing_a = points.insert(layout.wing_a);
        let hinge = points.insert(layout.hinge);
        let apex = points.insert(layout.apex);
        let wing_b = points.insert(layout.wing_b);

        let edges = vec![
            Edge { from: wing_a, to: hinge },
            Edge { from: wing_a, to: apex },
            Edge { from: apex, to: hinge },
            Edge { from: hinge, to: wing_b },
            Edge { from: apex, to: wing_b },
        ];

        Self {
            variant,
            patch_a,
            patch_b,
            points,
            side_a: vec![wing_a, hinge, apex],
            side_b: vec![wing_b, hinge, apex],
            edges,
            boundary_a: Vec::new(),
            boundary_b: Vec::new(),
            axis_translation_a: layout.axis_translation_a,
            axis_translation_b: layout.axis_translation_b,
            hinge_axis: layout.hinge_axis,
            adjacency: layout.adjacency,
            angle_lock: false,
            drag_mode: DragMode::None,
        }
    }

    /// Ordered point ids of one side's polygon.
    pub fn side(&self, side: JointSide) -> &[VertexId] {
        match side {
            JointSide::A => &self.side_a,
            JointSide::B => &self.side_b,
        }
    }

    pub fn positions(&self, side: JointSide) -> Vec<Point3d> {
        self.side(side).iter().map(|&id| self.points[id]).collect()
    }

    pub fn position(&self, id: VertexId) -> Option<Point3d> {
        self.points.get(id).copied()
    }

    pub fn vertices(&self) -> impl Iterator<Item = (VertexId, Point3d)> + '_ {
        self.points.iter().map(|(id, p)| (id, *p))
    }

    pub fn edges(&self) -> &[Edge] {
        &self.edges
    }

    pub fn hinge_id(&self) -> VertexId {
        self.side_a[HINGE]
    }

    pub fn apex_id(&self) -> VertexId {
        self.side_a[APEX]
    }

    pub fn wing_id(&self, side: JointSide) -> VertexId {
        self.side(side)[WING]
    }

    pub fn hinge(&self) -> Point3d {
        self.points[self.hinge_id()]
    }

    pub fn apex(&self) -> Point3d {
        self.points[self.apex_id()]
    }

    pub fn wing(&self, side: JointSide) -> Point3d {
        self.points[self.wing_id(side)]
    }

    pub fn boundary(&self, side: JointSide) -> &[Point3d] {
        match side {
            JointSide::A => &self.boundary_a,
            JointSide::B => &self.boundary_b,
        }
    }

    pub fn axis_translation(&self, side: JointSide) -> Vec3 {
        match side {
            JointSide::A => self.axis_translation_a,
            JointSide::B => self.axis_translation_b,
        }
    }

    /// Hinge/apex/wing layout of one side, as sent to the safety analysis.
    pub fn frame(&self, side: JointSide) -> SideFrame {
        SideFrame {
            wing: self.wing(side),
            hinge: self.hinge(),
            apex: self.apex(),
        }
    }

    /// Side and polygon index of a point. Shared points report side A.
    pub fn locate(&self, id: VertexId) -> Option<(JointSide, usize)> {
        [JointSide::A, JointSide::B].into_iter().find_map(|side| {
            self.side(side)
                .iter()
                .position(|&v| v == id)
                .map(|index| (side, index))
        })
    }

    /// The side whose polygon contains both ends of `edge`.
    pub fn edge_side(&self, edge: &Edge) -> Option<JointSide> {
        [JointSide::A, JointSide::B].into_iter().find(|&side| {
            let ids = self.side(side);
            ids.contains(&edge.from) && ids.contains(&edge.to)
        })
    }

    pub fn is_shared(&self, id: VertexId) -> bool {
        id == self.hinge_id() || id == self.apex_id()
    }

    pub fn set(&mut self, id: VertexId, p: Point3d) {
        if let Some(slot) = self.points.get_mut(id) {
            *slot = p;
        }
    }

    /// Move every point of the draft by `delta`. Shared points move once.
    pub fn translate_all(&mut self, delta: Vec3) {
        for (_, p) in self.points.iter_mut() {
            *p += delta;
        }
    }

    /// Put `point` `length` away from the hinge along its current direction.
    /// Returns false when the point sits on the hinge.
    pub fn set_distance_from_hinge(&mut self, id: VertexId, length: f64) -> bool {
        let hinge = self.hinge();
        let Some(p) = self.position(id) else {
            return false;
        };
        match (p - hinge).with_length(length) {
            Some(offset) => {
                self.set(id, hinge + offset);
                true
            }
            None => false,
        }
    }

    /// Add a point to `side` at polygon index `index` (clamped to the end)
    /// and split `edge` around it.
    pub(crate) fn insert_on_edge(
        &mut self,
        side: JointSide,
        index: usize,
        edge: usize,
        p: Point3d,
    ) -> VertexId {
        let id = self.points.insert(p);
        let list = match side {
            JointSide::A => &mut self.side_a,
            JointSide::B => &mut self.side_b,
        };
        list.insert(index.min(list.len()), id);
        if let Some(split) = self.edges.get_mut(edge) {
            let far = split.to;
            split.to = id;
            self.edges.push(Edge { from: far, to: id });
        }
        id
    }
}
