//! MockBook: deterministic in-memory test double implementing `BookModel`.
//!
//! Patches and joints live in slot maps. Adjacency is derived from shared
//! collinear boundary edges, and the flat-foldability analysis is replaced by
//! a fixed-size parallelogram laid out along each side's wing and apex
//! directions, so engine tests get predictable safety regions.

use std::cell::Cell;

use slotmap::SlotMap;
use tracing::debug;

use fold_geom::{polygon, Line3d, Point3d, Vec3};

use crate::traits::{BookModel, BookQuery};
use crate::types::*;

const EDGE_EPS: f64 = 1e-6;

pub struct MockBook {
    patches: SlotMap<PatchId, Patch>,
    joints: SlotMap<JointId, Joint>,
    /// Edge length of the synthetic safety parallelograms.
    safety_extent: f64,
    refuse_boundaries: bool,
    boundary_requests: Cell<usize>,
}

impl Default for MockBook {
    fn default() -> Self {
        Self::new()
    }
}

impl MockBook {
    pub fn new() -> Self {
        Self {
            patches: SlotMap::with_key(),
            joints: SlotMap::with_key(),
            safety_extent: 4.0,
            refuse_boundaries: false,
            boundary_requests: Cell::new(0),
        }
    }

    pub fn with_safety_extent(mut self, extent: f64) -> Self {
        self.safety_extent = extent;
        self
    }

    /// Make every subsequent safety query report "no valid region".
    pub fn set_refuse_boundaries(&mut self, refuse: bool) {
        self.refuse_boundaries = refuse;
    }

    /// Number of safety queries answered so far.
    pub fn boundary_requests(&self) -> usize {
        self.boundary_requests.get()
    }

    pub fn patch_count(&self) -> usize {
        self.patches.len()
    }

    pub fn joint_count(&self) -> usize {
        self.joints.len()
    }

    /// Insert a parentless patch. Its axis defaults to its first edge.
    pub fn add_root_patch(&mut self, boundary: Vec<Point3d>) -> PatchId {
        let axis = first_edge(&boundary);
        self.insert_patch(boundary, axis, None)
    }

    /// Insert a patch under `parent`, hinged on the edge they share
    /// (or on its own first edge when they do not touch).
    pub fn add_child_patch(&mut self, parent: PatchId, boundary: Vec<Point3d>) -> PatchId {
        let axis = self
            .patches
            .get(parent)
            .and_then(|p| shared_edge(&p.boundary, &boundary))
            .map(|(a, b)| [a, b])
            .unwrap_or_else(|| first_edge(&boundary));
        self.insert_patch(boundary, axis, Some(parent))
    }

    /// Connect two existing patches with a joint of the given kind.
    pub fn link_joint(&mut self, a: PatchId, b: PatchId, kind: JointKind) -> JointId {
        let axis = self
            .axis_between(a, b)
            .map(|(p, q)| [p, q])
            .or_else(|| self.patches.get(a).map(|p| p.axis))
            .unwrap_or([Point3d::ORIGIN, Point3d::ORIGIN]);
        self.attach_joint(a, b, axis, kind)
    }

    pub fn set_parent(&mut self, id: PatchId, parent: Option<PatchId>) {
        if let Some(p) = self.patches.get_mut(id) {
            p.parent = parent;
        }
    }

    /// Override a patch's hinge axis, e.g. to model a crease that is not a
    /// shared boundary edge.
    pub fn set_axis(&mut self, id: PatchId, axis: [Point3d; 2]) {
        if let Some(p) = self.patches.get_mut(id) {
            p.axis = axis;
        }
    }

    fn insert_patch(
        &mut self,
        boundary: Vec<Point3d>,
        axis: [Point3d; 2],
        parent: Option<PatchId>,
    ) -> PatchId {
        let normal = polygon::normal(&boundary).unwrap_or(Vec3::Z);
        let id = self.patches.insert(Patch {
            boundary,
            axis,
            normal,
            parent,
            joint: None,
            children: Vec::new(),
        });
        if let Some(parent) = parent.and_then(|p| self.patches.get_mut(p)) {
            parent.children.push(id);
        }
        id
    }

    fn attach_joint(&mut self, a: PatchId, b: PatchId, axis: [Point3d; 2], kind: JointKind) -> JointId {
        let id = self.joints.insert(Joint {
            kind,
            axis,
            patches: (a, b),
        });
        for patch in [a, b] {
            if let Some(p) = self.patches.get_mut(patch) {
                p.joint = Some(id);
            }
        }
        id
    }
}

fn first_edge(boundary: &[Point3d]) -> [Point3d; 2] {
    polygon::edges(boundary)
        .next()
        .map(|(a, b)| [a, b])
        .unwrap_or([Point3d::ORIGIN, Point3d::ORIGIN])
}

/// Overlap of the first pair of collinear edges, ordered along `a`'s edge.
fn shared_edge(a: &[Point3d], b: &[Point3d]) -> Option<(Point3d, Point3d)> {
    for (a0, a1) in polygon::edges(a) {
        let Some(line) = Line3d::from_points(a0, a1) else {
            continue;
        };
        for (b0, b1) in polygon::edges(b) {
            if line.distance_to_point(&b0) > EDGE_EPS || line.distance_to_point(&b1) > EDGE_EPS {
                continue;
            }
            let (ta0, ta1) = (line.parameter_of(&a0), line.parameter_of(&a1));
            let (tb0, tb1) = (line.parameter_of(&b0), line.parameter_of(&b1));
            let lo = ta0.min(ta1).max(tb0.min(tb1));
            let hi = ta0.max(ta1).min(tb0.max(tb1));
            if hi - lo > EDGE_EPS {
                return Some((line.evaluate(lo), line.evaluate(hi)));
            }
        }
    }
    None
}

fn parallelogram(side: &SideFrame, extent: f64) -> Option<Vec<Point3d>> {
    let u = (side.wing - side.hinge).with_length(extent)?;
    let w = (side.apex - side.hinge).with_length(extent)?;
    if u.cross(&w).length() < EDGE_EPS {
        return None;
    }
    let h = side.hinge;
    Some(vec![h + u, h, h + w, h + u + w])
}

impl BookQuery for MockBook {
    fn patch(&self, id: PatchId) -> Option<&Patch> {
        self.patches.get(id)
    }

    fn joint(&self, id: JointId) -> Option<&Joint> {
        self.joints.get(id)
    }

    fn axis_between(&self, a: PatchId, b: PatchId) -> Option<(Point3d, Point3d)> {
        if a == b {
            return None;
        }
        shared_edge(&self.patches.get(a)?.boundary, &self.patches.get(b)?.boundary)
    }

    fn is_neighbor(&self, a: PatchId, b: PatchId) -> bool {
        self.axis_between(a, b).is_some()
    }

    fn safety_boundaries(&self, request: &BoundaryRequest) -> Option<SafetyBoundaries> {
        self.boundary_requests.set(self.boundary_requests.get() + 1);
        if self.refuse_boundaries {
            return None;
        }
        Some(SafetyBoundaries {
            side_a: parallelogram(&request.side_a, self.safety_extent)?,
            side_b: parallelogram(&request.side_b, self.safety_extent)?,
        })
    }

    fn predict_when_folded(&self, patch: PatchId, point: &Point3d, fraction: f64) -> Point3d {
        let Some(p) = self.patches.get(patch) else {
            return *point;
        };
        let Some(axis) = Line3d::from_points(p.axis[0], p.axis[1]) else {
            return *point;
        };
        let foot = axis.closest_point(point);
        (*point - foot)
            .rotated_about(&axis.direction, fraction * std::f64::consts::PI)
            .map(|v| foot + v)
            .unwrap_or(*point)
    }
}

impl BookModel for MockBook {
    fn add_patch(
        &mut self,
        source: PatchId,
        boundary: &[Point3d],
        axis: [Point3d; 2],
    ) -> Result<PatchId, ModelError> {
        if !self.patches.contains_key(source) {
            return Err(ModelError::PatchNotFound { id: source });
        }
        if boundary.len() < 3 || polygon::normal(boundary).is_none() {
            return Err(ModelError::DegenerateOutline {
                points: boundary.len(),
            });
        }
        let id = self.insert_patch(boundary.to_vec(), axis, Some(source));
        debug!(?id, ?source, points = boundary.len(), "added patch");
        Ok(id)
    }

    fn add_joint(
        &mut self,
        a: PatchId,
        b: PatchId,
        axis: [Point3d; 2],
        kind: JointKind,
    ) -> Result<JointId, ModelError> {
        for id in [a, b] {
            if !self.patches.contains_key(id) {
                return Err(ModelError::PatchNotFound { id });
            }
        }
        let id = self.attach_joint(a, b, axis, kind);
        debug!(?id, tag = kind.tag(), "added joint");
        Ok(id)
    }
}
