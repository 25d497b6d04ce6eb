//! Parent-chain traversal over externally owned patches.

use fold_geom::Tolerance;

use crate::traits::BookQuery;
use crate::types::{Patch, PatchId};

/// Iterator over a patch's ancestors, nearest first.
///
/// Follows `parent` links without taking ownership and stops after
/// `max_depth` steps, so a malformed (cyclic) tree cannot hang the caller.
pub struct Ancestors<'a, B: BookQuery + ?Sized> {
    book: &'a B,
    next: Option<PatchId>,
    remaining: usize,
}

impl<'a, B: BookQuery + ?Sized> Ancestors<'a, B> {
    pub fn new(book: &'a B, start: PatchId, max_depth: usize) -> Self {
        let next = book.patch(start).and_then(|p| p.parent);
        Self {
            book,
            next,
            remaining: max_depth,
        }
    }
}

impl<'a, B: BookQuery + ?Sized> Iterator for Ancestors<'a, B> {
    type Item = (PatchId, &'a Patch);

    fn next(&mut self) -> Option<Self::Item> {
        if self.remaining == 0 {
            return None;
        }
        let id = self.next?;
        let patch = self.book.patch(id)?;
        self.remaining -= 1;
        self.next = patch.parent;
        Some((id, patch))
    }
}

/// `start` followed by every ancestor whose normal is parallel to its own.
pub fn parallel_lineage<B: BookQuery + ?Sized>(
    book: &B,
    start: PatchId,
    max_depth: usize,
    tol: &Tolerance,
) -> Vec<PatchId> {
    let Some(origin) = book.patch(start) else {
        return Vec::new();
    };
    let mut out = vec![start];
    out.extend(
        Ancestors::new(book, start, max_depth)
            .filter(|(_, p)| tol.normals_parallel(&p.normal, &origin.normal))
            .map(|(id, _)| id),
    );
    out
}
