use thiserror::Error;

use book_model::{ModelError, PatchId};

/// Fatal to the current construction attempt. The draft is dropped and the
/// host returns to browsing.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ConstructionError {
    #[error("a joint needs exactly two patches, got {count}")]
    NeedTwoPatches { count: usize },

    #[error("patches {a:?} and {b:?} share no adjacency axis")]
    NoAdjacency { a: PatchId, b: PatchId },

    #[error("no common adjacent ancestor")]
    NoCommonAdjacentAncestor,

    #[error("joint not constructible on these planes")]
    NotConstructible,

    #[error("degenerate axis: {0}")]
    DegenerateAxis(&'static str),

    #[error(transparent)]
    Model(#[from] ModelError),
}

/// Refusals from an editing session. The draft itself stays valid.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum SessionError {
    #[error("element is not part of this joint")]
    UnknownElement,

    #[error("edges touching the hinge cannot be split")]
    HingeEdge,

    #[error("no drag in progress")]
    NotDragging,

    #[error(transparent)]
    Model(#[from] ModelError),
}
