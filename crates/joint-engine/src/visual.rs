//! Output side of the editor: dot and line snapshots pushed to the host's
//! renderer after every accepted edit. Nothing here is ever read back.

use serde::{Deserialize, Serialize};

use fold_geom::Point3d;

use crate::draft::{Edge, JointDraft, VertexId};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum DotState {
    #[default]
    Normal,
    Selected,
    /// Aligned with the dragged point by symmetry propagation.
    Matched,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct DotVisual {
    pub vertex: VertexId,
    pub position: Point3d,
    pub state: DotState,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct LineVisual {
    pub edge: Edge,
    pub from: Point3d,
    pub to: Point3d,
    pub selected: bool,
}

pub trait VisualSink {
    fn sync(&mut self, dots: &[DotVisual], lines: &[LineVisual]);
}

/// Sink for hosts that render nothing.
impl VisualSink for () {
    fn sync(&mut self, _dots: &[DotVisual], _lines: &[LineVisual]) {}
}

/// Keeps every snapshot it receives.
#[derive(Debug, Default)]
pub struct RecordingSink {
    pub frames: Vec<(Vec<DotVisual>, Vec<LineVisual>)>,
}

impl RecordingSink {
    pub fn last(&self) -> Option<&(Vec<DotVisual>, Vec<LineVisual>)> {
        self.frames.last()
    }

    pub fn dot(&self, vertex: VertexId) -> Option<&DotVisual> {
        self.last()?.0.iter().find(|d| d.vertex == vertex)
    }
}

impl VisualSink for RecordingSink {
    fn sync(&mut self, dots: &[DotVisual], lines: &[LineVisual]) {
        self.frames.push((dots.to_vec(), lines.to_vec()));
    }
}

/// Snapshot of the draft with highlight state applied.
pub(crate) fn snapshot(
    draft: &JointDraft,
    selected: Option<VertexId>,
    selected_edge: Option<Edge>,
    matched: &[VertexId],
) -> (Vec<DotVisual>, Vec<LineVisual>) {
    let dots = draft
        .vertices()
        .map(|(vertex, position)| {
            let state = if selected == Some(vertex) {
                DotState::Selected
            } else if matched.contains(&vertex) {
                DotState::Matched
            } else {
                DotState::Normal
            };
            DotVisual { vertex, position, state }
        })
        .collect();
    let lines = draft
        .edges()
        .iter()
        .filter_map(|&edge| {
            Some(LineVisual {
                edge,
                from: draft.position(edge.from)?,
                to: draft.position(edge.to)?,
                selected: selected_edge == Some(edge),
            })
        })
        .collect();
    (dots, lines)
}
