//! One joint-construction session, from patch selection to commit.

use tracing::{debug, info, instrument};

use book_model::{BookModel, BookQuery, JointId, JointKind, ModelError, PatchId};
use fold_geom::{polygon, ray_sphere, Line3d, Plane, Point3d, Ray};

use crate::boundary::refresh_boundaries;
use crate::builder::build_joint;
use crate::config::EngineConfig;
use crate::drag::{candidate_on, manifold_for, mode_for_selection, shift_reference, Element};
use crate::draft::{DragMode, Edge, JointDraft, JointSide, JointVariant, VertexId, WING};
use crate::error::{ConstructionError, SessionError};
use crate::solver;
use crate::visual::{snapshot, VisualSink};

/// Handles of the model entities created by a commit.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CommitReceipt {
    pub patch_a: PatchId,
    pub patch_b: PatchId,
    pub joint: JointId,
}

/// Owns the draft while the host is in joint-construction mode. Dropping the
/// session (or calling [`JointSession::discard`]) leaves the model untouched.
#[derive(Debug)]
pub struct JointSession {
    draft: JointDraft,
    config: EngineConfig,
    viewer: Point3d,
    selection: Option<Element>,
    manifold: Option<Plane>,
    /// Anchor of the current shift drag; moves with the joint.
    reference: Point3d,
    matched: Vec<VertexId>,
}

impl JointSession {
    /// Start constructing a joint between exactly two selected patches.
    #[instrument(skip(book, config, sink))]
    pub fn begin<B: BookQuery + ?Sized>(
        book: &B,
        patches: &[PatchId],
        variant: JointVariant,
        viewer: Point3d,
        config: EngineConfig,
        sink: &mut dyn VisualSink,
    ) -> Result<Self, ConstructionError> {
        let &[a, b] = patches else {
            return Err(ConstructionError::NeedTwoPatches { count: patches.len() });
        };
        let draft = build_joint(book, a, b, variant, viewer, &config)?;
        let session = Self {
            reference: draft.hinge(),
            draft,
            config,
            viewer,
            selection: None,
            manifold: None,
            matched: Vec::new(),
        };
        session.sync(sink);
        info!(patch_a = ?session.draft.patch_a, patch_b = ?session.draft.patch_b, "joint session started");
        Ok(session)
    }

    pub fn draft(&self) -> &JointDraft {
        &self.draft
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    pub fn drag_mode(&self) -> DragMode {
        self.draft.drag_mode
    }

    /// Points aligned with the dragged one by the last free move.
    pub fn matched(&self) -> &[VertexId] {
        &self.matched
    }

    /// Only V-style joints have an angle lock. Returns the resulting state.
    pub fn set_angle_lock(&mut self, locked: bool) -> bool {
        if self.draft.variant == JointVariant::VStyle {
            self.draft.angle_lock = locked;
        }
        self.draft.angle_lock
    }

    /// Pick a dot or edge and enter its drag mode. `contact` is where the
    /// pointer touched it.
    pub fn select(&mut self, element: Element, contact: Point3d, sink: &mut dyn VisualSink) -> Result<DragMode, SessionError> {
        let mode = mode_for_selection(&self.draft, &element)?;
        self.manifold = manifold_for(&self.draft, mode, &element, &self.viewer);
        self.reference = match mode {
            DragMode::Shift => shift_reference(&self.draft, &element, &contact),
            _ => contact,
        };
        self.draft.drag_mode = mode;
        self.selection = Some(element);
        self.matched.clear();
        debug!(?mode, has_manifold = self.manifold.is_some(), "element selected");
        self.sync(sink);
        Ok(mode)
    }

    /// Pointer release: back to no drag mode, highlights cleared.
    pub fn release(&mut self, sink: &mut dyn VisualSink) {
        self.draft.drag_mode = DragMode::None;
        self.selection = None;
        self.manifold = None;
        self.matched.clear();
        self.sync(sink);
    }

    /// Pointer move. A ray that misses the drag manifold is ignored.
    /// Returns whether the draft changed.
    pub fn drag<B: BookQuery + ?Sized>(&mut self, book: &B, ray: &Ray, sink: &mut dyn VisualSink) -> Result<bool, SessionError> {
        if self.draft.drag_mode == DragMode::None {
            return Err(SessionError::NotDragging);
        }
        let Some(candidate) = self.manifold.as_ref().and_then(|m| candidate_on(m, ray)) else {
            return Ok(false);
        };
        let lock_hit = self
            .locked_partner()
            .is_some_and(|partner| ray_sphere(ray, &partner, self.config.wing_proxy_radius).is_some());
        self.apply(book, candidate, lock_hit, sink)
    }

    /// Drag to a point already on the manifold.
    pub fn drag_to<B: BookQuery + ?Sized>(
        &mut self,
        book: &B,
        candidate: Point3d,
        sink: &mut dyn VisualSink,
    ) -> Result<bool, SessionError> {
        let lock_hit = self
            .locked_partner()
            .is_some_and(|partner| partner.distance_to(&candidate) <= self.config.wing_proxy_radius);
        self.apply(book, candidate, lock_hit, sink)
    }

    /// Other side's wing, when dragging a wing with the angle locked.
    fn locked_partner(&self) -> Option<Point3d> {
        if !self.draft.angle_lock || self.draft.drag_mode != DragMode::SideAngle {
            return None;
        }
        let side = self.selected_wing_side()?;
        Some(self.draft.wing(side.other()))
    }

    fn selected_wing_side(&self) -> Option<JointSide> {
        let Some(Element::Dot(id)) = self.selection else {
            return None;
        };
        [JointSide::A, JointSide::B]
            .into_iter()
            .find(|&side| self.draft.wing_id(side) == id)
    }

    fn apply<B: BookQuery + ?Sized>(
        &mut self,
        book: &B,
        candidate: Point3d,
        lock_hit: bool,
        sink: &mut dyn VisualSink,
    ) -> Result<bool, SessionError> {
        let Some(element) = self.selection else {
            return Err(SessionError::NotDragging);
        };
        let mode = self.draft.drag_mode;
        let variant = self.draft.variant;
        let tol = self.config.tolerance;
        let step = self.config.angle_step;
        let floor = self.config.min_length;

        let moved = match mode {
            DragMode::None => return Err(SessionError::NotDragging),
            DragMode::FreeMove => {
                let Element::Dot(id) = element else {
                    return Err(SessionError::UnknownElement);
                };
                if variant == JointVariant::VStyle && !self.clear_of_neighbours(id, &candidate) {
                    false
                } else {
                    self.draft.set(id, candidate);
                    let eps = match variant {
                        JointVariant::VStyle => self.config.symmetry_epsilon_v,
                        JointVariant::SpecialVStyle => self.config.symmetry_epsilon_special,
                    };
                    self.matched = solver::propagate_symmetry(&mut self.draft, id, eps);
                    true
                }
            }
            DragMode::SideAngle => {
                let side = self.selected_wing_side().ok_or(SessionError::UnknownElement)?;
                let id = self.draft.wing_id(side);
                match variant {
                    JointVariant::VStyle if !self.draft.angle_lock => {
                        let theta = (candidate - self.draft.hinge()).angle_to(&self.draft.hinge_axis);
                        let turned = solver::rotate_wings_to(&mut self.draft, side, solver::snap_side_angle(theta, step), &tol);
                        if turned {
                            solver::repair_planarity(&mut self.draft, &tol);
                            refresh_boundaries(&mut self.draft, book);
                        }
                        solver::extend_toward(&mut self.draft, id, &candidate, floor) || turned
                    }
                    JointVariant::VStyle if lock_hit => solver::lock_wing_length(&mut self.draft, side),
                    _ => solver::extend_toward(&mut self.draft, id, &candidate, floor),
                }
            }
            DragMode::TopAngle => {
                let apex = self.draft.apex_id();
                let mut turned = false;
                if variant == JointVariant::VStyle && !self.draft.angle_lock {
                    let theta = (candidate - self.draft.hinge()).angle_to(&self.draft.hinge_axis);
                    turned = solver::rotate_apex_to(&mut self.draft, solver::snap_top_angle(theta, step), &tol);
                    if turned {
                        refresh_boundaries(&mut self.draft, book);
                    }
                }
                let extended = solver::extend_toward(&mut self.draft, apex, &candidate, floor);
                solver::repair_planarity(&mut self.draft, &tol);
                turned || extended
            }
            DragMode::Shift => {
                let shifted = match variant {
                    JointVariant::VStyle => {
                        let shifted = solver::shift_along_axis(&mut self.draft, &mut self.reference, &candidate, &tol);
                        if shifted.is_some() {
                            solver::fit_center_point(&mut self.draft, &mut self.reference, &self.config);
                        }
                        shifted
                    }
                    JointVariant::SpecialVStyle => {
                        let patch_a = self.draft.patch_a;
                        let outline = &book
                            .patch(patch_a)
                            .ok_or(ModelError::PatchNotFound { id: patch_a })?
                            .boundary;
                        solver::shift_along_bisector(&mut self.draft, &mut self.reference, &candidate, outline, &tol)
                    }
                };
                if shifted.is_some() {
                    refresh_boundaries(&mut self.draft, book);
                }
                shifted.is_some()
            }
        };

        if moved {
            let report = solver::solve(&mut self.draft, &self.config);
            debug!(?mode, clamped = report.total(), "drag applied");
            self.refresh_manifold();
            self.sync(sink);
        }
        Ok(moved)
    }

    /// Planes built from moving geometry follow the draft between events.
    fn refresh_manifold(&mut self) {
        if let Some(element) = self.selection {
            self.manifold = manifold_for(&self.draft, self.draft.drag_mode, &element, &self.viewer);
        }
    }

    fn clear_of_neighbours(&self, id: VertexId, candidate: &Point3d) -> bool {
        let Some((side, i)) = self.draft.locate(id) else {
            return false;
        };
        let ids = self.draft.side(side);
        let prev = ids[(i + ids.len() - 1) % ids.len()];
        let next = ids[(i + 1) % ids.len()];
        [prev, next].into_iter().all(|n| {
            self.draft
                .position(n)
                .is_some_and(|p| p.distance_to(candidate) > self.config.neighbour_gap)
        })
    }

    /// Split `edge` at the point nearest `contact` and add that point to the
    /// edge's side.
    pub fn insert_point(&mut self, edge: Edge, contact: Point3d, sink: &mut dyn VisualSink) -> Result<VertexId, SessionError> {
        let index = self
            .draft
            .edges()
            .iter()
            .position(|e| *e == edge)
            .ok_or(SessionError::UnknownElement)?;
        if edge.touches(self.draft.hinge_id()) {
            return Err(SessionError::HingeEdge);
        }
        let side = self.draft.edge_side(&edge).ok_or(SessionError::UnknownElement)?;
        let (Some(from), Some(to)) = (self.draft.position(edge.from), self.draft.position(edge.to)) else {
            return Err(SessionError::UnknownElement);
        };
        let point = Line3d::from_points(from, to).map_or(contact, |line| line.closest_point(&contact));

        let ids = self.draft.side(side);
        let slot = |v: VertexId| ids.iter().position(|&x| x == v);
        let (Some(i), Some(j)) = (slot(edge.from), slot(edge.to)) else {
            return Err(SessionError::UnknownElement);
        };
        let at = if i == WING || j == WING { ids.len() } else { i.max(j) };

        let id = self.draft.insert_on_edge(side, at, index, point);
        let report = solver::solve(&mut self.draft, &self.config);
        debug!(?side, at, clamped = report.total(), "edge point inserted");
        self.refresh_manifold();
        self.sync(sink);
        Ok(id)
    }

    /// Write the joint into the model: side A's patch, side B's patch, then
    /// the joint between them.
    #[instrument(skip_all, fields(variant = ?self.draft.variant))]
    pub fn commit<M: BookModel + ?Sized>(self, model: &mut M) -> Result<CommitReceipt, SessionError> {
        let d = &self.draft;
        // Nothing is written unless both parents and both outlines are usable.
        for id in [d.patch_a, d.patch_b] {
            if model.patch(id).is_none() {
                return Err(ModelError::PatchNotFound { id }.into());
            }
        }
        let (outline_a, outline_b) = (d.positions(JointSide::A), d.positions(JointSide::B));
        for outline in [&outline_a, &outline_b] {
            if outline.len() < 3 || polygon::normal(outline).is_none() {
                return Err(ModelError::DegenerateOutline { points: outline.len() }.into());
            }
        }
        let hinge = d.hinge();
        let patch_a = model.add_patch(d.patch_a, &outline_a, [d.wing(JointSide::A), hinge])?;
        let patch_b = model.add_patch(d.patch_b, &outline_b, [d.wing(JointSide::B), hinge])?;
        let joint = model.add_joint(patch_a, patch_b, [d.apex(), hinge], JointKind::VStyle)?;
        info!(?patch_a, ?patch_b, ?joint, tag = JointKind::VStyle.tag(), "joint committed");
        Ok(CommitReceipt { patch_a, patch_b, joint })
    }

    pub fn discard(self) {
        debug!(variant = ?self.draft.variant, "joint draft discarded");
    }

    fn sync(&self, sink: &mut dyn VisualSink) {
        let (dot, edge) = match self.selection {
            Some(Element::Dot(id)) => (Some(id), None),
            Some(Element::Edge(e)) => (None, Some(e)),
            None => (None, None),
        };
        let (dots, lines) = snapshot(&self.draft, dot, edge, &self.matched);
        sink.sync(&dots, &lines);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
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

    #[test]
    fn test_commit_refuses_zero_area_outline_before_writing() {
        let mut book = MockBook::new();
        let floor = book.add_root_patch(rect(false));
        let wall = book.add_root_patch(rect(true));
        let mut session = JointSession::begin(
            &book,
            &[floor, wall],
            JointVariant::VStyle,
            Point3d::new(0.0, 20.0, 20.0),
            EngineConfig::default(),
            &mut (),
        )
        .unwrap();

        let d = session.draft.clone();
        let (wing, apex) = (d.wing(JointSide::B), d.apex());
        let id = session.insert_point(d.edges()[4], apex.midpoint(&wing), &mut ()).unwrap();
        // Bow tie: the two lobes of side B cancel out.
        session.draft.set(id, d.hinge() + (apex - wing));
        assert!(polygon::normal(&session.draft.positions(JointSide::B)).is_none());

        let err = session.commit(&mut book).unwrap_err();
        assert_eq!(err, SessionError::Model(ModelError::DegenerateOutline { points: 4 }));
        assert_eq!(book.patch_count(), 2);
        assert_eq!(book.joint_count(), 0);
    }

    #[test]
    fn test_shift_anchor_follows_recentre() {
        let mut book = MockBook::new();
        let floor = book.add_root_patch(rect(false));
        let wall = book.add_root_patch(rect(true));
        let mut session = JointSession::begin(
            &book,
            &[floor, wall],
            JointVariant::VStyle,
            Point3d::new(0.0, 20.0, 20.0),
            EngineConfig::default(),
            &mut (),
        )
        .unwrap();
        let hinge = session.draft.hinge_id();
        session.select(Element::Dot(hinge), Point3d::ORIGIN, &mut ()).unwrap();

        assert!(session.drag_to(&book, Point3d::new(6.0, 0.0, 0.0), &mut ()).unwrap());
        assert_eq!(session.reference, session.draft.hinge());
    }
}
