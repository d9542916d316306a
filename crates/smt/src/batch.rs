//! Batch insertion: the layered-ascent algorithm that materializes a batch
//! of leaves and emits the minimal sibling witness for the affected
//! frontier.

use crate::address::key_space;
use crate::error::Error;
use crate::hash::HashOracle;
use crate::tree::SparseMerkleTree;
use crate::witness::{empty_witness, Witness};
use std::collections::BTreeSet;

/// Why a batch entry was dropped. Only one reason exists today, but the
/// type leaves room for the engine to report others without breaking
/// callers matching on it.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum DiagnosticReason {
    /// The leaf slot was already occupied (by a prior call, or by an
    /// earlier pair in this same batch).
    DuplicateLeaf,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Diagnostic {
    pub key: u64,
    pub reason: DiagnosticReason,
}

/// Result of a successful `batch_insert`: the witness, plus the keys that
/// were silently dropped as duplicates (spec §7: soft failure, batch
/// proceeds without them).
pub struct BatchOutcome<F> {
    pub witness: Witness<F>,
    pub dropped: Vec<Diagnostic>,
}

impl<F, O> SparseMerkleTree<F, O>
where
    F: Clone + PartialEq,
    O: HashOracle<F>,
{
    /// Inserts a batch of `(key, value)` pairs into previously-empty leaf
    /// slots and returns the sibling witness for the affected frontier.
    ///
    /// `batch` need not be pre-sorted; the engine sorts it so the returned
    /// root and witness are independent of the caller's ordering (spec §8
    /// invariant 4). `KeyOutOfRange` is validated for the *entire* batch
    /// before any store mutation, so a single bad key fails the whole call
    /// with no partial effect (spec §7: transactional w.r.t. hard errors).
    /// Leaf slots already occupied — by a prior call or by an earlier pair
    /// in this same batch — are dropped with a diagnostic rather than
    /// failing the call (spec §7: soft `DuplicateLeaf`).
    pub fn batch_insert(&mut self, mut batch: Vec<(u64, F)>) -> Result<BatchOutcome<F>, Error> {
        let limit = key_space(self.depth);
        for (key, _) in &batch {
            if *key >= limit {
                return Err(Error::KeyOutOfRange { key: *key, depth: self.depth });
            }
        }

        batch.sort_by_key(|(k, _)| *k);

        // Pre-filter against the store's current state. Building the
        // filtered list up front (rather than mutating as we go) keeps the
        // hard-error validation above and this soft-filter both free of
        // side effects until we're certain the batch will be accepted.
        let mut filtered = Vec::with_capacity(batch.len());
        let mut dropped = Vec::new();
        for (key, value) in batch {
            if self.store.contains(0, key) {
                dropped.push(Diagnostic { key, reason: DiagnosticReason::DuplicateLeaf });
                log::warn!("smt: dropping duplicate leaf at key {key}, slot already occupied");
                continue;
            }
            filtered.push((key, value));
        }

        if filtered.is_empty() {
            return Ok(BatchOutcome { witness: empty_witness(self.depth), dropped });
        }

        // Write the batch's leaves. `set_leaf` re-checks occupancy, which
        // also covers a duplicate key appearing twice within this same
        // batch (the pre-filter above only sees the store's prior state).
        // The frontier only ever grows with keys that actually landed, so
        // a later duplicate of an already-materialized key can't evict it.
        let mut frontier: BTreeSet<u64> = BTreeSet::new();
        for (key, value) in filtered {
            if self.store.set_leaf(key, value) {
                frontier.insert(key);
            } else {
                dropped.push(Diagnostic { key, reason: DiagnosticReason::DuplicateLeaf });
                log::warn!("smt: dropping duplicate leaf at key {key} (duplicated within batch)");
            }
        }

        if frontier.is_empty() {
            return Ok(BatchOutcome { witness: empty_witness(self.depth), dropped });
        }

        let mut witness: Witness<F> = Vec::with_capacity(self.depth as usize);

        for level in 0..self.depth {
            let parents: BTreeSet<u64> = frontier.iter().map(|k| k >> 1).collect();
            let mut level_witness = Vec::new();

            for &p in &parents {
                let lc = p << 1;
                let rc = lc | 1;
                let lc_affected = frontier.contains(&lc);
                let rc_affected = frontier.contains(&rc);
                let default_here = &self.defaults[level as usize];

                if lc_affected && !rc_affected {
                    let sv = self.store.get(level, rc, default_here);
                    if sv != *default_here {
                        level_witness.push((rc, sv));
                    }
                } else if rc_affected && !lc_affected {
                    let sv = self.store.get(level, lc, default_here);
                    if sv != *default_here {
                        level_witness.push((lc, sv));
                    }
                }

                let lv = self.store.get(level, lc, default_here);
                let rv = self.store.get(level, rc, default_here);
                let pv = self.oracle.hash(&lv, &rv);
                self.store.set(level + 1, p, pv);
            }

            level_witness.sort_by_key(|(k, _)| *k);
            witness.push(level_witness);
            frontier = parents;
        }

        Ok(BatchOutcome { witness, dropped })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::hash::Blake2bOracle;

    fn tree(depth: u32) -> SparseMerkleTree<crate::hash::Digest, Blake2bOracle> {
        SparseMerkleTree::new(depth, Blake2bOracle::new(), false).unwrap()
    }

    fn v(n: u8) -> crate::hash::Digest {
        let mut d = [0u8; 32];
        d[31] = n;
        d
    }

    #[test]
    fn single_insertion_has_empty_witness() {
        let mut t = tree(8);
        let outcome = t.batch_insert(vec![(1, v(42))]).unwrap();
        assert!(outcome.dropped.is_empty());
        assert!(outcome.witness.iter().all(Vec::is_empty));
        assert_ne!(t.root(), *t.default_at(8));
    }

    #[test]
    fn sibling_leaves_produce_empty_witness_and_merge() {
        let mut t = tree(8);
        let outcome = t.batch_insert(vec![(1, v(10)), (0, v(20))]).unwrap();
        assert!(outcome.witness.iter().all(Vec::is_empty));
    }

    #[test]
    fn distant_keys_have_empty_witness() {
        let mut t = tree(16);
        let outcome = t.batch_insert(vec![(0x0001, v(1)), (0x8000, v(2))]).unwrap();
        assert!(outcome.witness.iter().all(Vec::is_empty));
    }

    #[test]
    fn second_batch_witnesses_prior_subtree() {
        let mut t = tree(16);
        t.batch_insert(vec![(0x0001, v(1))]).unwrap();
        let outcome = t.batch_insert(vec![(0x0002, v(2))]).unwrap();
        // level 0 sibling of 0x0002 is 0x0003, still default -> absent.
        assert!(outcome.witness[0].is_empty());
        // level 1 parent of (0x0002,0x0003) is 0x0001; its sibling 0x0000
        // covers {0x0000,0x0001} and is non-default because v(1) landed there.
        assert_eq!(outcome.witness[1].len(), 1);
        assert_eq!(outcome.witness[1][0].0, 0x0000);
    }

    #[test]
    fn duplicate_leaf_is_dropped_not_fatal() {
        let mut t = tree(8);
        t.batch_insert(vec![(1, v(1))]).unwrap();
        let outcome = t.batch_insert(vec![(1, v(2)), (2, v(3))]).unwrap();
        assert_eq!(outcome.dropped.len(), 1);
        assert_eq!(outcome.dropped[0].key, 1);
        // original value at key 1 must be untouched.
        assert_eq!(t.get_node(0, 1), v(1));
    }

    #[test]
    fn duplicate_within_same_batch_drops_second_occurrence() {
        let mut t = tree(8);
        let outcome = t.batch_insert(vec![(1, v(1)), (1, v(2))]).unwrap();
        assert_eq!(outcome.dropped.len(), 1);
        assert_eq!(t.get_node(0, 1), v(1));
    }

    #[test]
    fn all_duplicates_returns_empty_shaped_witness() {
        let mut t = tree(8);
        t.batch_insert(vec![(1, v(1))]).unwrap();
        let outcome = t.batch_insert(vec![(1, v(9))]).unwrap();
        assert_eq!(outcome.witness.len(), 8);
        assert!(outcome.witness.iter().all(Vec::is_empty));
        assert_eq!(outcome.dropped.len(), 1);
    }

    #[test]
    fn key_out_of_range_is_rejected_without_mutation() {
        let mut t = tree(4);
        let before = t.root();
        let err = t.batch_insert(vec![(16, v(1))]).unwrap_err();
        assert!(matches!(err, Error::KeyOutOfRange { key: 16, depth: 4 }));
        assert_eq!(t.root(), before);
        assert_eq!(t.store.materialized_len(), 0);
    }

    #[test]
    fn caller_order_does_not_affect_root() {
        let mut a = tree(8);
        let mut b = tree(8);
        a.batch_insert(vec![(1, v(1)), (2, v(2)), (3, v(3))]).unwrap();
        b.batch_insert(vec![(3, v(3)), (1, v(1)), (2, v(2))]).unwrap();
        assert_eq!(a.root(), b.root());
    }

    #[test]
    fn witness_minimality_excludes_frontier_and_defaults() {
        let mut t = tree(8);
        t.batch_insert(vec![(10, v(1))]).unwrap();
        let outcome = t.batch_insert(vec![(11, v(2))]).unwrap();
        for level in &outcome.witness {
            for (_, val) in level {
                assert_ne!(*val, [0u8; 32]);
            }
        }
    }
}
