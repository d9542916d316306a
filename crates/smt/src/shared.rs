//! A thin single-writer/multi-reader convenience wrapper.
//!
//! The core tree is not internally synchronized (spec §5: single-threaded,
//! synchronous, no suspension points). `SharedTree` is an additive
//! convenience for callers that do need the "readers only between
//! `batch_insert` calls, never during" boundary spec'd in §5 — it does not
//! change the core's synchronous contract, it just wraps it in a lock.

use crate::batch::BatchOutcome;
use crate::error::Error;
use crate::hash::HashOracle;
use crate::tree::SparseMerkleTree;
use std::sync::{RwLock, RwLockReadGuard};

pub struct SharedTree<F, O> {
    inner: RwLock<SparseMerkleTree<F, O>>,
}

impl<F, O> SharedTree<F, O>
where
    F: Clone + PartialEq,
    O: HashOracle<F>,
{
    pub fn new(tree: SparseMerkleTree<F, O>) -> Self {
        Self { inner: RwLock::new(tree) }
    }

    /// Takes the exclusive write lock for the duration of a single
    /// `batch_insert` call, exactly as spec'd: the tree is a total
    /// ordering point and readers never observe a partially-applied batch.
    pub fn batch_insert(&self, batch: Vec<(u64, F)>) -> Result<BatchOutcome<F>, Error> {
        let mut guard = self.inner.write().expect("smt: shared tree lock poisoned");
        guard.batch_insert(batch)
    }

    pub fn read(&self) -> RwLockReadGuard<'_, SparseMerkleTree<F, O>> {
        self.inner.read().expect("smt: shared tree lock poisoned")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::hash::Blake2bOracle;

    #[test]
    fn readers_see_post_insert_state_only() {
        let tree = SparseMerkleTree::new(8, Blake2bOracle::new(), false).unwrap();
        let shared = SharedTree::new(tree);
        let before = shared.read().root();
        let mut value = [0u8; 32];
        value[31] = 5;
        shared.batch_insert(vec![(3, value)]).unwrap();
        let after = shared.read().root();
        assert_ne!(before, after);
    }
}
