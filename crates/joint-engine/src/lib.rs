//! Interactive construction of V-style and Special V-style joints between
//! pop-up book patches.
//!
//! A [`JointSession`] builds a [`JointDraft`] from two selected patches, keeps
//! it legal through every drag and point insertion, and finally writes it to
//! the host's [`book_model::BookModel`].

pub mod boundary;
pub mod builder;
pub mod config;
pub mod drag;
pub mod draft;
pub mod error;
pub mod session;
pub mod solver;
pub mod visual;

pub use boundary::refresh_boundaries;
pub use builder::build_joint;
pub use config::EngineConfig;
pub use drag::Element;
pub use draft::*;
pub use error::*;
pub use session::{CommitReceipt, JointSession};
pub use solver::ClampReport;
pub use visual::*;
