//! Initial geometry synthesis for new joints.

use tracing::{debug, info, instrument};

use book_model::{parallel_lineage, BookQuery, JointKind, ModelError, Patch, PatchId};
use fold_geom::polygon::{is_between, is_collinear, line_boundary_intersection_pair};
use fold_geom::{line_plane_intersection, Line3d, Plane, Point3d, Vec3};

use crate::boundary::refresh_boundaries;
use crate::config::EngineConfig;
use crate::draft::{JointDraft, JointVariant, Layout};
use crate::error::ConstructionError;
use crate::solver;

/// Build a draft joint between two patches, compute its first safety
/// boundaries and run one solver pass over it.
#[instrument(skip(book, config))]
pub fn build_joint<B: BookQuery + ?Sized>(
    book: &B,
    a: PatchId,
    b: PatchId,
    variant: JointVariant,
    viewer: Point3d,
    config: &EngineConfig,
) -> Result<JointDraft, ConstructionError> {
    let mut draft = match variant {
        JointVariant::VStyle => build_v_style(book, a, b, viewer, config)?,
        JointVariant::SpecialVStyle => build_special_v_style(book, a, b, config)?,
    };
    let bounded = refresh_boundaries(&mut draft, book);
    let report = solver::solve(&mut draft, config);
    info!(?variant, bounded, clamped = report.total(), "joint draft built");
    Ok(draft)
}

fn patch<B: BookQuery + ?Sized>(book: &B, id: PatchId) -> Result<&Patch, ConstructionError> {
    book.patch(id)
        .ok_or(ConstructionError::Model(ModelError::PatchNotFound { id }))
}

/// Perpendicular offset from `line` to the first boundary point of `patch`
/// that is off the adjacency axis.
fn off_axis_translation(patch: &Patch, axis: (Point3d, Point3d), line: &Line3d, eps: f64) -> Option<Vec3> {
    patch
        .boundary
        .iter()
        .find(|p| !is_collinear(&axis.0, p, &axis.1, eps))
        .map(|p| line.offset_of(p))
}

fn build_v_style<B: BookQuery + ?Sized>(
    book: &B,
    a: PatchId,
    b: PatchId,
    viewer: Point3d,
    config: &EngineConfig,
) -> Result<JointDraft, ConstructionError> {
    let eps = config.tolerance.coincidence;

    // A T joint hangs a child off its own parent; the child becomes side A.
    let (a, b, t_shape) = if patch(book, a)?.has_child(b) {
        (b, a, true)
    } else if patch(book, b)?.has_child(a) {
        (a, b, true)
    } else {
        (a, b, false)
    };
    let (pa, pb) = (patch(book, a)?, patch(book, b)?);

    let axis = book
        .axis_between(a, b)
        .ok_or(ConstructionError::NoAdjacency { a, b })?;
    let center = axis.0.midpoint(&axis.1);
    let end = center + (axis.0 - axis.1) * config.hinge_ratio;
    let delta = center - end;
    let line = Line3d::new(end, delta).ok_or(ConstructionError::DegenerateAxis("adjacency axis has no length"))?;
    let wing_length = (config.angle_step * 1.5).tan() * delta.length();

    let side_translation = |p: &Patch| {
        off_axis_translation(p, axis, &line, eps)
            .and_then(|t| t.with_length(wing_length))
            .ok_or(ConstructionError::DegenerateAxis("patch lies along its adjacency axis"))
    };
    let axis_translation_a = side_translation(pa)?;
    let mut axis_translation_b = side_translation(pb)?;

    let wing_a = end + axis_translation_a;
    if t_shape {
        let candidate = end + axis_translation_b;
        let folded_gap = book
            .predict_when_folded(a, &wing_a, 0.5)
            .distance_to(&book.predict_when_folded(b, &candidate, 0.5));
        if candidate.distance_to(&wing_a) < folded_gap {
            axis_translation_b = -axis_translation_b;
        }
    }
    let wing_b = end + axis_translation_b;

    let mut up = (wing_a - center)
        .cross(&(wing_b - center))
        .with_length(delta.length() / config.golden_ratio)
        .ok_or(ConstructionError::DegenerateAxis("wings are parallel"))?;
    if t_shape {
        let folded_mid = book
            .predict_when_folded(a, &wing_a, 0.01)
            .midpoint(&book.predict_when_folded(b, &wing_b, 0.01));
        if (end + up).distance_to(&folded_mid) > (end - up).distance_to(&folded_mid) {
            up = -up;
        }
    } else if (center + up).distance_to(&viewer) > (center - up).distance_to(&viewer) {
        up = -up;
    }

    debug!(t_shape, wing_length, "v-style layout");
    Ok(JointDraft::from_layout(
        JointVariant::VStyle,
        a,
        b,
        Layout {
            wing_a,
            wing_b,
            hinge: center,
            apex: center + up,
            axis_translation_a,
            axis_translation_b,
            hinge_axis: delta,
            adjacency: [axis.0, axis.1],
        },
    ))
}

/// Wing direction and opposite-panel normal when `id` hangs from a
/// cross-fold joint.
fn cross_fold_frame<B: BookQuery + ?Sized>(book: &B, id: PatchId, pivot: &Point3d) -> Option<(Vec3, Vec3)> {
    let p = book.patch(id)?;
    let joint = book.joint(p.joint?)?;
    if joint.kind != JointKind::CrossFold {
        return None;
    }
    let other = book.patch(joint.other(id)?)?;
    let [s, e] = p.axis;
    let away = if s.distance_to(pivot) < e.distance_to(pivot) { e - s } else { s - e };
    Some((other.normal, away.normalized()?))
}

/// Extent of `boundary` along `axis` after sliding each point along
/// `-direction` onto `mid_plane`.
fn projected_extent(boundary: &[Point3d], direction: &Vec3, mid_plane: &Plane, axis: &Line3d) -> Option<(Point3d, Point3d)> {
    let params: Vec<f64> = boundary
        .iter()
        .filter_map(|p| line_plane_intersection(p, &(-*direction), mid_plane))
        .map(|q| axis.parameter_of(&q))
        .collect();
    let lo = params.iter().copied().reduce(f64::min)?;
    let hi = params.iter().copied().reduce(f64::max)?;
    Some((axis.evaluate(lo), axis.evaluate(hi)))
}

fn build_special_v_style<B: BookQuery + ?Sized>(
    book: &B,
    a: PatchId,
    b: PatchId,
    config: &EngineConfig,
) -> Result<JointDraft, ConstructionError> {
    let tol = config.tolerance;
    let eps = tol.coincidence;

    let lineage_a = parallel_lineage(book, a, config.max_ancestor_depth, &tol);
    let lineage_b = parallel_lineage(book, b, config.max_ancestor_depth, &tol);
    let (base_a, base_b) = lineage_a
        .iter()
        .find_map(|&x| {
            lineage_b
                .iter()
                .find(|&&y| book.is_neighbor(x, y))
                .map(|&y| (x, y))
        })
        .ok_or(ConstructionError::NoCommonAdjacentAncestor)?;
    let axis = book
        .axis_between(base_a, base_b)
        .ok_or(ConstructionError::NoAdjacency { a: base_a, b: base_b })?;

    // Side A is the patch farther from the shared axis.
    let axis_mid = axis.0.midpoint(&axis.1);
    let (a, b, base_a, base_b) =
        if patch(book, a)?.distance_to_point(&axis_mid) < patch(book, b)?.distance_to_point(&axis_mid) {
            (b, a, base_b, base_a)
        } else {
            (a, b, base_a, base_b)
        };
    let (pa, pb) = (patch(book, a)?, patch(book, b)?);

    let axis_line = Line3d::from_points(axis.0, axis.1)
        .ok_or(ConstructionError::DegenerateAxis("adjacency axis has no length"))?;
    let base_translation = |id: PatchId| -> Result<Vec3, ConstructionError> {
        off_axis_translation(patch(book, id)?, axis, &axis_line, eps)
            .and_then(|t| t.normalized())
            .ok_or(ConstructionError::DegenerateAxis("ancestor lies along the adjacency axis"))
    };
    let mut ta = base_translation(base_a)?;
    let mut tb = base_translation(base_b)?;

    let mid_plane = Plane::new(axis.1, ta - tb)
        .ok_or(ConstructionError::DegenerateAxis("ancestor planes coincide"))?;

    // Keep chains of joints built against cross-folds mutually consistent.
    let mut side_normal = None;
    if let Some((normal, away)) = cross_fold_frame(book, a, &axis.1) {
        side_normal = Some(normal);
        ta = away;
        tb = mid_plane.reflect_point(&(axis.1 + ta)) - axis.1;
    } else if let Some((normal, away)) = cross_fold_frame(book, b, &axis.1) {
        side_normal = Some(normal);
        tb = away;
        ta = mid_plane.reflect_point(&(axis.1 + tb)) - axis.1;
    }

    let bisector = (ta + tb).normalized();
    let mut up = match side_normal {
        Some(n) => n.cross(&mid_plane.normal).normalized(),
        None => bisector,
    }
    .ok_or(ConstructionError::DegenerateAxis("no fold direction"))?;
    if bisector.is_some_and(|bis| up.dot(&bis) < 0.0) {
        up = -up;
    }

    let centroid = Point3d::centroid(&pa.boundary).ok_or(ConstructionError::Model(
        ModelError::DegenerateOutline {
            points: pa.boundary.len(),
        },
    ))?;
    let plane_a = pa.plane().ok_or(ConstructionError::DegenerateAxis("patch has no plane"))?;
    let plane_b = pb.plane().ok_or(ConstructionError::DegenerateAxis("patch has no plane"))?;
    let on_mid = line_plane_intersection(&centroid, &(-ta), &mid_plane).ok_or(ConstructionError::NotConstructible)?;
    let mut hinge = line_plane_intersection(&on_mid, &(-up), &plane_b).unwrap_or(on_mid);

    let (a0, a1) = projected_extent(&pa.boundary, &ta, &mid_plane, &axis_line).ok_or(ConstructionError::NotConstructible)?;
    let (b0, b1) = projected_extent(&pb.boundary, &tb, &mid_plane, &axis_line).ok_or(ConstructionError::NotConstructible)?;
    let inside_b = |p: &Point3d| is_between(&b0, p, &b1, eps);
    let inside_a = |p: &Point3d| is_between(&a0, p, &a1, eps);
    let recenter = match (inside_b(&a0), inside_b(&a1)) {
        (true, true) => None,
        (true, false) => Some(a0.midpoint(if inside_a(&b0) { &b0 } else { &b1 })),
        (false, true) => Some(a1.midpoint(if inside_a(&b0) { &b0 } else { &b1 })),
        (false, false) if inside_a(&b0) && inside_a(&b1) => Some(b0.midpoint(&b1)),
        (false, false) => return Err(ConstructionError::NotConstructible),
    };
    if let Some(target) = recenter {
        let shift = axis_line.parameter_of(&target) - axis_line.parameter_of(&hinge);
        hinge += axis_line.direction * shift;
    }

    let wing_in = |plane: &Plane, direction: &Vec3, boundary: &[Point3d]| {
        line_boundary_intersection_pair(&plane.project_point(&hinge), direction, boundary, eps)
            .map(|(p, q)| p.midpoint(&q))
            .ok_or(ConstructionError::NotConstructible)
    };
    let wing_a = wing_in(&plane_a, &ta, &pa.boundary)?;
    let wing_b = wing_in(&plane_b, &tb, &pb.boundary)?;

    let mut height = hinge.distance_to(&wing_a) * config.golden_ratio / 2.0;
    if height < eps {
        height = hinge.distance_to(&wing_b) * config.golden_ratio / 2.0;
    }
    if height < eps {
        return Err(ConstructionError::DegenerateAxis("wings collapse onto the hinge"));
    }

    debug!(?base_a, ?base_b, cross_fold = side_normal.is_some(), height, "special v-style layout");
    Ok(JointDraft::from_layout(
        JointVariant::SpecialVStyle,
        a,
        b,
        Layout {
            wing_a,
            wing_b,
            hinge,
            apex: hinge + up * height,
            axis_translation_a: ta,
            axis_translation_b: tb,
            hinge_axis: axis.0 - axis.1,
            adjacency: [axis.0, axis.1],
        },
    ))
}
