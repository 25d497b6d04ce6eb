//! Patch/joint model contracts of the pop-up book.
//!
//! The real patch tree belongs to the host application. The joint engine
//! reads it through [`BookQuery`] while a joint is being drafted and writes
//! to it through [`BookModel`] exactly once, at commit.

pub mod ancestors;
pub mod mock_book;
pub mod traits;
pub mod types;

pub use ancestors::{parallel_lineage, Ancestors};
pub use mock_book::MockBook;
pub use traits::*;
pub use types::*;
