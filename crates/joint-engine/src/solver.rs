//! Constraint passes applied to a draft after every accepted edit.
//!
//! Violations are never errors here: every pass clamps or re-projects in
//! place and reports how many points it had to touch.

use std::f64::consts::PI;

use tracing::debug;

use fold_geom::polygon::{closest_point_on_boundary, closest_point_on_segment, contains_point, is_between};
use fold_geom::{Line3d, Plane, Point3d, Tolerance, Vec3};

use crate::config::EngineConfig;
use crate::draft::{JointDraft, JointSide, VertexId, APEX, FIRST_INSERTED, HINGE, WING};

/// Points moved by one solver run, per pass.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ClampReport {
    pub lengths: usize,
    pub inserted: usize,
    /// Inserted points that fell outside every edge bracket and were pulled
    /// onto the nearest boundary point.
    pub fallback: usize,
    pub reprojected: usize,
}

impl ClampReport {
    pub fn total(&self) -> usize {
        self.lengths + self.inserted + self.fallback + self.reprojected
    }
}

/// Length clamp, inserted-point clamp, then planarity repair.
pub fn solve(draft: &mut JointDraft, config: &EngineConfig) -> ClampReport {
    let lengths = clamp_lengths(draft, config);
    let (inserted, fallback) = clamp_inserted_points(draft, &config.tolerance);
    let reprojected = repair_planarity(draft, &config.tolerance);
    let report = ClampReport {
        lengths,
        inserted,
        fallback,
        reprojected,
    };
    if report.total() > 0 {
        debug!(?report, "solver clamped draft");
    }
    report
}

fn clamp_length(length: f64, floor: f64, max: f64, eps: f64) -> Option<f64> {
    // The floor wins over a safety region smaller than it.
    let target = if length > max + eps { max } else { length };
    let target = if target < floor - eps { floor } else { target };
    (target != length).then_some(target)
}

/// Keep wing and apex distances from the hinge within
/// `[min_length, boundary extent]`. Sides without a boundary are skipped.
pub fn clamp_lengths(draft: &mut JointDraft, config: &EngineConfig) -> usize {
    let eps = config.tolerance.coincidence;
    let hinge = draft.hinge();
    let mut clamped = 0;

    for side in [JointSide::A, JointSide::B] {
        let boundary = draft.boundary(side);
        if boundary.len() <= APEX {
            continue;
        }
        let max = boundary[HINGE].distance_to(&boundary[WING]);
        let id = draft.wing_id(side);
        let length = draft.wing(side).distance_to(&hinge);
        if let Some(target) = clamp_length(length, config.min_length, max, eps) {
            clamped += usize::from(draft.set_distance_from_hinge(id, target));
        }
    }

    let apex_max = [JointSide::A, JointSide::B]
        .into_iter()
        .map(|side| draft.boundary(side))
        .filter(|b| b.len() > APEX)
        .map(|b| b[HINGE].distance_to(&b[APEX]))
        .reduce(f64::min);
    if let Some(max) = apex_max {
        let length = draft.apex().distance_to(&hinge);
        if let Some(target) = clamp_length(length, config.min_length, max, eps) {
            let apex = draft.apex_id();
            clamped += usize::from(draft.set_distance_from_hinge(apex, target));
        }
    }
    clamped
}

/// Pull inserted points of both sides back inside their safety polygons.
/// Returns `(bracketed, fallback)` counts.
pub fn clamp_inserted_points(draft: &mut JointDraft, tol: &Tolerance) -> (usize, usize) {
    let mut bracketed = 0;
    let mut fallback = 0;
    for side in [JointSide::A, JointSide::B] {
        let (b, f) = clamp_side(draft, side, tol);
        bracketed += b;
        fallback += f;
    }
    (bracketed, fallback)
}

fn clamp_side(draft: &mut JointDraft, side: JointSide, tol: &Tolerance) -> (usize, usize) {
    let boundary = draft.boundary(side).to_vec();
    let ids = draft.side(side).to_vec();
    if boundary.len() <= APEX || ids.len() <= FIRST_INSERTED {
        return (0, 0);
    }
    let (wing, hinge, apex) = (draft.wing(side), draft.hinge(), draft.apex());
    let normal = (wing - hinge).cross(&(apex - hinge));
    let (Some(bot), Some(top)) = (
        Plane::from_points(wing, hinge, hinge + normal),
        Plane::from_points(apex, hinge, hinge + normal),
    ) else {
        return (0, 0);
    };

    let mut bracketed = 0;
    let mut fallback = 0;
    for &id in &ids[FIRST_INSERTED..] {
        let Some(p) = draft.position(id) else {
            continue;
        };
        let mut q = p;
        let on_base = bot.is_on_plane(&p, tol.planar) || top.is_on_plane(&p, tol.planar);
        if !on_base && bot.same_side(&p, &apex) && top.same_side(&p, &wing) {
            q = clamp_into_bracket(&boundary, p, hinge, wing, normal);
        }
        if q != p {
            bracketed += 1;
        }
        if !contains_point(&boundary, &q, tol.coincidence) {
            if let Some(nearest) = closest_point_on_boundary(&boundary, &q) {
                q = nearest;
                fallback += 1;
            }
        }
        draft.set(id, q);
    }
    (bracketed, fallback)
}

/// Find the outer boundary edge whose angular span (seen from the hinge,
/// measured from the wing) contains `p`. If `p` is beyond that edge, project
/// it onto the edge, falling back to the nearer corner when the projection
/// leaves the edge's span.
fn clamp_into_bracket(boundary: &[Point3d], p: Point3d, hinge: Point3d, wing: Point3d, normal: Vec3) -> Point3d {
    let n = boundary.len();
    let reference = wing - hinge;
    let angle_of = |q: &Point3d| (*q - hinge).angle_to(&reference);
    let target = angle_of(&p);

    for x in APEX..n {
        let p1 = boundary[x];
        let p2 = boundary[(x + 1) % n];
        if !(angle_of(&p1) > target && angle_of(&p2) < target) {
            continue;
        }
        let Some(edge) = Plane::from_points(p1, p2, p1 + normal) else {
            return p;
        };
        if edge.same_side(&p, &hinge) {
            return p;
        }
        let projected = edge.project_point(&p);
        let mid = p1.midpoint(&p2);
        let before = Plane::from_points(p1, boundary[x - 1], p1 + normal);
        if before.is_some_and(|plane| !plane.same_side(&projected, &mid)) {
            return p1;
        }
        let after = Plane::from_points(p2, boundary[(x + 2) % n], p2 + normal);
        if after.is_some_and(|plane| !plane.same_side(&projected, &mid)) {
            return p2;
        }
        return projected;
    }
    p
}

/// Re-project every point past the apex onto its side's plane
/// `(wing, hinge, apex)`.
pub fn repair_planarity(draft: &mut JointDraft, tol: &Tolerance) -> usize {
    let mut moved = 0;
    for side in [JointSide::A, JointSide::B] {
        let Some(plane) = Plane::from_points(draft.wing(side), draft.hinge(), draft.apex()) else {
            continue;
        };
        let ids = draft.side(side).to_vec();
        for &id in &ids[FIRST_INSERTED.min(ids.len())..] {
            let Some(p) = draft.position(id) else {
                continue;
            };
            if !plane.is_on_plane(&p, tol.planar) {
                draft.set(id, plane.project_point(&p));
                moved += 1;
            }
        }
    }
    moved
}

/// Align a dragged inserted point with any other point of its side whose
/// perpendicular offset from the wing baseline or the apex baseline is within
/// `eps` of its own. Returns the points it was matched against.
pub fn propagate_symmetry(draft: &mut JointDraft, dragged: VertexId, eps: f64) -> Vec<VertexId> {
    let Some((side, i)) = draft.locate(dragged) else {
        return Vec::new();
    };
    if i < FIRST_INSERTED {
        return Vec::new();
    }
    let hinge = draft.hinge();
    let baselines = [
        (Line3d::from_points(hinge, draft.wing(side)), WING),
        (Line3d::from_points(hinge, draft.apex()), APEX),
    ];
    let ids = draft.side(side).to_vec();
    let mut matched = Vec::new();

    for (x, &other) in ids.iter().enumerate() {
        if x == i || x == HINGE {
            continue;
        }
        let mut hit = false;
        for (line, own) in &baselines {
            // A baseline's own endpoint always has zero offset from it.
            let (Some(line), false) = (line, x == *own) else {
                continue;
            };
            let (Some(p), Some(q)) = (draft.position(dragged), draft.position(other)) else {
                continue;
            };
            let mine = line.offset_of(&p);
            let theirs = line.offset_of(&q);
            if (theirs - mine).length() < eps {
                draft.set(dragged, p + (theirs - mine));
                hit = true;
            }
        }
        if hit {
            matched.push(other);
        }
    }
    matched
}

/// Nearest half-step multiple `step/2 + k*step` within `[0, pi]`.
pub fn snap_side_angle(theta: f64, step: f64) -> f64 {
    let half = step / 2.0;
    (half + step * ((theta - half) / step).round()).clamp(half, PI - half)
}

/// Nearest multiple of `step` to `theta - step`, kept off 0 and pi.
pub fn snap_top_angle(theta: f64, step: f64) -> f64 {
    let k = ((theta - step) / step).round();
    (k * step).clamp(step, PI - step)
}

/// Rotate `point` about the hinge, in the plane it spans with the hinge axis,
/// so that its angle to the axis becomes `target`.
fn rotate_to_angle(draft: &mut JointDraft, id: VertexId, target: f64, tol: &Tolerance) -> bool {
    let hinge = draft.hinge();
    let Some(p) = draft.position(id) else {
        return false;
    };
    let offset = p - hinge;
    let delta = target - offset.angle_to(&draft.hinge_axis);
    if tol.is_zero_angle(delta) {
        return false;
    }
    match offset.rotated_about(&draft.hinge_axis.cross(&offset), delta) {
        Some(rotated) => {
            draft.set(id, hinge + rotated);
            true
        }
        None => false,
    }
}

/// Turn both wings so that `side`'s wing meets the hinge axis at `target`.
/// The other wing turns by the same amount.
pub fn rotate_wings_to(draft: &mut JointDraft, side: JointSide, target: f64, tol: &Tolerance) -> bool {
    let current = (draft.wing(side) - draft.hinge()).angle_to(&draft.hinge_axis);
    let (own, other) = (draft.wing_id(side), draft.wing_id(side.other()));
    let other_target = (draft.wing(side.other()) - draft.hinge()).angle_to(&draft.hinge_axis) + (target - current);
    let turned = rotate_to_angle(draft, own, target, tol);
    if turned {
        rotate_to_angle(draft, other, other_target, tol);
    }
    turned
}

pub fn rotate_apex_to(draft: &mut JointDraft, target: f64, tol: &Tolerance) -> bool {
    let apex = draft.apex_id();
    rotate_to_angle(draft, apex, target, tol)
}

/// Set the distance of `id` from the hinge to the length of the
/// `candidate`'s projection on its current direction, floored at `floor`.
pub fn extend_toward(draft: &mut JointDraft, id: VertexId, candidate: &Point3d, floor: f64) -> bool {
    let hinge = draft.hinge();
    let Some(direction) = draft.position(id).and_then(|p| (p - hinge).normalized()) else {
        return false;
    };
    let length = (*candidate - hinge).dot(&direction).max(floor);
    draft.set_distance_from_hinge(id, length)
}

/// Give `side`'s wing the same length as the other side's.
pub fn lock_wing_length(draft: &mut JointDraft, side: JointSide) -> bool {
    let length = draft.wing(side.other()).distance_to(&draft.hinge());
    let id = draft.wing_id(side);
    draft.set_distance_from_hinge(id, length)
}

/// Slide the whole joint along the hinge axis toward `candidate`, keeping
/// the hinge on the adjacency segment. Moves `reference` with the joint and
/// returns the applied translation.
pub fn shift_along_axis(draft: &mut JointDraft, reference: &mut Point3d, candidate: &Point3d, tol: &Tolerance) -> Option<Vec3> {
    let line = Line3d::new(*reference, draft.hinge_axis)?;
    let target = line.closest_point(candidate);
    if tol.points_coincident(&target, reference) {
        return None;
    }
    let hinge = draft.hinge();
    let [e0, e1] = draft.adjacency;
    let mut translation = target - *reference;
    let post = hinge + translation;
    if !is_between(&e0, &post, &e1, tol.coincidence) {
        translation = closest_point_on_segment(&e0, &e1, &post) - hinge;
    }
    if tol.is_zero_length(translation.length()) {
        return None;
    }
    draft.translate_all(translation);
    *reference += translation;
    Some(translation)
}

/// Re-centre a hinge that has drifted within `min_length` of an adjacency
/// endpoint to exactly `min_length` from it. `reference` moves with the
/// joint. Boundaries are stale afterwards.
pub fn fit_center_point(draft: &mut JointDraft, reference: &mut Point3d, config: &EngineConfig) -> Option<Vec3> {
    let hinge = draft.hinge();
    let [e0, e1] = draft.adjacency;
    let (d0, d1) = (hinge.distance_to(&e0), hinge.distance_to(&e1));
    if d0 >= config.min_length && d1 >= config.min_length {
        return None;
    }
    let (near, far) = if d0 < d1 { (e0, e1) } else { (e1, e0) };
    let translation = near + (far - near).with_length(config.min_length)? - hinge;
    draft.translate_all(translation);
    *reference += translation;
    Some(translation)
}

/// Slide the whole joint along the bisector of its wings toward `candidate`.
/// Refused when side A's wing would leave `patch_a_outline`.
pub fn shift_along_bisector(
    draft: &mut JointDraft,
    reference: &mut Point3d,
    candidate: &Point3d,
    patch_a_outline: &[Point3d],
    tol: &Tolerance,
) -> Option<Vec3> {
    let line = Line3d::new(draft.hinge(), bisector(draft)?)?;
    let translation = line.closest_point(candidate) - *reference;
    if tol.is_zero_length(translation.length()) {
        return None;
    }
    if !contains_point(patch_a_outline, &(draft.wing(JointSide::A) + translation), tol.coincidence) {
        return None;
    }
    draft.translate_all(translation);
    *reference += translation;
    Some(translation)
}

/// Sum of the two unit wing directions.
pub fn bisector(draft: &JointDraft) -> Option<Vec3> {
    let hinge = draft.hinge();
    let a = (draft.wing(JointSide::A) - hinge).normalized()?;
    let b = (draft.wing(JointSide::B) - hinge).normalized()?;
    (a + b).normalized()
}
