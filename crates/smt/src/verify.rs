//! The non-deletion verifier: a stateless, pure function that recomputes
//! two roots from the witness alone and checks both against the claimed
//! roots.
//!
//! This mirrors what a ZK circuit checks: bottom-up reduction from leaves,
//! never accepting a witness entry at a higher level as a shortcut past
//! lower-level recomputation (that would open a soundness gap where an
//! attacker substitutes a forged subtree root).

use crate::error::Error;
use crate::hash::{HashOracle, OracleAdapter};
use crate::witness::{validate_shape, Witness};

/// Verifies that `batch` was inserted into previously-empty slots and that
/// the tree transitioned from `old_root` to `new_root` without disturbing
/// any other leaf, using only `witness` and `batch` — no access to the
/// rest of the tree.
///
/// `oracle` must be the same [`OracleAdapter`] configuration (same
/// underlying hash, same `idempotent_on_default` choice) used to produce
/// `witness`; see spec §4.1 and §6.3.
pub fn verify<F, O>(
    old_root: &F,
    new_root: &F,
    batch: &[(u64, F)],
    witness: &Witness<F>,
    depth: u32,
    oracle: &OracleAdapter<F, O>,
) -> Result<(), Error>
where
    F: Clone + PartialEq + std::fmt::Debug,
    O: HashOracle<F>,
{
    if depth == 0 {
        return verify_degenerate(old_root, new_root, batch, oracle);
    }

    if batch.is_empty() {
        return if old_root == new_root {
            Ok(())
        } else {
            Err(Error::RootMismatch {
                which: "old_root (empty batch)",
                expected: format!("{old_root:?}"),
                actual: format!("{new_root:?}"),
            })
        };
    }

    validate_shape(witness, depth)?;
    ensure_witness_outside_frontier(batch, witness)?;

    let empty = oracle.empty();
    let empties: Vec<(u64, F)> = batch.iter().map(|(k, _)| (*k, empty.clone())).collect();
    let r1 = compute_forest(&empties, witness, depth, oracle)?;
    if r1 != *old_root {
        return Err(Error::RootMismatch {
            which: "old_root",
            expected: format!("{old_root:?}"),
            actual: format!("{r1:?}"),
        });
    }

    let r2 = compute_forest(batch, witness, depth, oracle)?;
    if r2 != *new_root {
        return Err(Error::RootMismatch {
            which: "new_root",
            expected: format!("{new_root:?}"),
            actual: format!("{r2:?}"),
        });
    }

    Ok(())
}

/// Convenience wrapper collapsing [`verify`] to a boolean, for callers that
/// only want the spec §8 invariant checked without inspecting which root
/// failed.
pub fn verify_bool<F, O>(
    old_root: &F,
    new_root: &F,
    batch: &[(u64, F)],
    witness: &Witness<F>,
    depth: u32,
    oracle: &OracleAdapter<F, O>,
) -> bool
where
    F: Clone + PartialEq + std::fmt::Debug,
    O: HashOracle<F>,
{
    verify(old_root, new_root, batch, witness, depth, oracle).is_ok()
}

/// Degenerate depth-0 tree: the single leaf *is* the root (spec §4.4).
fn verify_degenerate<F, O>(
    old_root: &F,
    new_root: &F,
    batch: &[(u64, F)],
    oracle: &OracleAdapter<F, O>,
) -> Result<(), Error>
where
    F: Clone + PartialEq + std::fmt::Debug,
    O: HashOracle<F>,
{
    if batch.is_empty() {
        return if old_root == new_root {
            Ok(())
        } else {
            Err(Error::RootMismatch {
                which: "old_root (depth 0, empty batch)",
                expected: format!("{old_root:?}"),
                actual: format!("{new_root:?}"),
            })
        };
    }
    if batch.len() != 1 {
        return Err(Error::MalformedWitness(
            "depth-0 tree can only hold a single leaf at the root".into(),
        ));
    }
    if *old_root != oracle.empty() {
        return Err(Error::RootMismatch {
            which: "old_root (depth 0)",
            expected: format!("{old_root:?}"),
            actual: format!("{:?}", oracle.empty()),
        });
    }
    let value = &batch[0].1;
    if *new_root != *value {
        return Err(Error::RootMismatch {
            which: "new_root (depth 0)",
            expected: format!("{new_root:?}"),
            actual: format!("{value:?}"),
        });
    }
    Ok(())
}

/// Hard-rejects a witness with an entry whose key lies inside the batch's
/// level-0 frontier: the sibling lookup in [`compute_forest`] would never
/// consume it, and its presence indicates a malformed witness (spec §4.4
/// edge cases).
fn ensure_witness_outside_frontier<F>(batch: &[(u64, F)], witness: &Witness<F>) -> Result<(), Error> {
    use std::collections::BTreeSet;
    let mut frontier: BTreeSet<u64> = batch.iter().map(|(k, _)| *k).collect();
    for level in witness {
        for (k, _) in level {
            if frontier.contains(k) {
                return Err(Error::MalformedWitness(format!(
                    "witness entry at key {k} lies inside the batch frontier"
                )));
            }
        }
        frontier = frontier.iter().map(|k| k >> 1).collect();
    }
    Ok(())
}

/// Bottom-up reduction of an ordered list of `(key, value)` leaves to a
/// single root, consuming sibling values from `witness` (or an adjacent
/// leaf already in `nodes`, or the level default) exactly as spec'd.
///
/// Must not cache intermediate hashes across the two calls a verifier
/// makes with the same witness — that reuse is the entire security
/// argument (spec §4.4): each pass recomputes independently from the
/// witness and the pass's own leaves.
fn compute_forest<F, O>(
    leaves: &[(u64, F)],
    witness: &Witness<F>,
    depth: u32,
    oracle: &OracleAdapter<F, O>,
) -> Result<F, Error>
where
    F: Clone + PartialEq,
    O: HashOracle<F>,
{
    let mut nodes: Vec<(u64, F)> = leaves.to_vec();
    nodes.sort_by_key(|(k, _)| *k);

    for level in 0..depth as usize {
        let level_witness = &witness[level];
        let mut next: Vec<(u64, F)> = Vec::with_capacity(nodes.len());
        let mut i = 0usize;
        let mut j = 0usize;

        while i < nodes.len() {
            let (k, kv) = &nodes[i];
            let parent = k >> 1;
            let bit = k & 1;
            let sibling = (parent << 1) | (1 - bit);

            let sv = if bit == 0 && i + 1 < nodes.len() && nodes[i + 1].0 == sibling {
                i += 1;
                nodes[i].1.clone()
            } else if j < level_witness.len() && level_witness[j].0 == sibling {
                let v = level_witness[j].1.clone();
                j += 1;
                v
            } else {
                oracle.empty()
            };

            let pv = if bit == 0 { oracle.hash(kv, &sv) } else { oracle.hash(&sv, kv) };
            next.push((parent, pv));
            i += 1;
        }

        nodes = next;
    }

    if nodes.len() != 1 {
        return Err(Error::MalformedWitness(format!(
            "forest reduction ended with {} nodes, expected 1",
            nodes.len()
        )));
    }
    Ok(nodes.into_iter().next().unwrap().1)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::batch::DiagnosticReason;
    use crate::hash::{Blake2bOracle, Digest};
    use crate::tree::SparseMerkleTree;

    fn v(n: u8) -> Digest {
        let mut d = [0u8; 32];
        d[31] = n;
        d
    }

    fn tree(depth: u32) -> SparseMerkleTree<Digest, Blake2bOracle> {
        SparseMerkleTree::new(depth, Blake2bOracle::new(), false).unwrap()
    }

    #[test]
    fn s1_empty_tree_verifies_trivially() {
        let t = tree(8);
        let oracle = t.oracle();
        let root = t.root();
        let witness = crate::witness::empty_witness(8);
        assert!(verify(&root, &root, &[], &witness, 8, oracle).is_ok());
    }

    #[test]
    fn s2_single_insertion_round_trips() {
        let mut t = tree(8);
        let old_root = t.root();
        let outcome = t.batch_insert(vec![(1, v(42))]).unwrap();
        let new_root = t.root();
        let batch = vec![(1u64, v(42))];
        assert!(verify(&old_root, &new_root, &batch, &outcome.witness, 8, t.oracle()).is_ok());
    }

    #[test]
    fn s5_second_batch_reuses_prior_subtree_witness() {
        let mut t = tree(16);
        t.batch_insert(vec![(0x0001, v(1))]).unwrap();
        let old_root = t.root();
        let outcome = t.batch_insert(vec![(0x0002, v(2))]).unwrap();
        let new_root = t.root();
        let batch = vec![(0x0002u64, v(2))];
        assert!(verify(&old_root, &new_root, &batch, &outcome.witness, 16, t.oracle()).is_ok());
    }

    #[test]
    fn s6_forgery_is_rejected() {
        let mut t = tree(16);
        t.batch_insert(vec![(0x0001, v(1))]).unwrap();
        let old_root = t.root();
        let outcome = t.batch_insert(vec![(0x0002, v(2))]).unwrap();
        let new_root = t.root();
        let batch = vec![(0x0002u64, v(2))];
        let mut forged = outcome.witness.clone();
        if forged[1].is_empty() {
            panic!("test setup expects a non-empty witness at level 1");
        }
        forged[1][0].1 = v(250);
        assert!(verify(&old_root, &new_root, &batch, &forged, 16, t.oracle()).is_err());
    }

    #[test]
    fn rejects_witness_entry_inside_frontier() {
        let t = tree(8);
        let root = t.root();
        let batch = vec![(1u64, v(1))];
        let mut witness = crate::witness::empty_witness(8);
        witness[0].push((1, v(9))); // 1 is itself a batch key
        let err = verify(&root, &root, &batch, &witness, 8, t.oracle()).unwrap_err();
        assert!(matches!(err, Error::MalformedWitness(_)));
    }

    #[test]
    fn rejects_non_ascending_witness() {
        let t = tree(8);
        let root = t.root();
        let batch = vec![(1u64, v(1))];
        let mut witness = crate::witness::empty_witness(8);
        witness[0] = vec![(5, v(1)), (3, v(2))];
        let err = verify(&root, &root, &batch, &witness, 8, t.oracle()).unwrap_err();
        assert!(matches!(err, Error::MalformedWitness(_)));
    }

    #[test]
    fn verify_accepts_redundant_default_entry() {
        // A witness entry whose value equals the level default is
        // redundant but not unsound (spec §9 open question).
        let mut t = tree(8);
        let old_root = t.root();
        let outcome = t.batch_insert(vec![(1, v(42))]).unwrap();
        let new_root = t.root();
        let batch = vec![(1u64, v(42))];
        let mut padded = outcome.witness.clone();
        padded[0].push((0, [0u8; 32])); // default value at sibling key 0
        padded[0].sort_by_key(|(k, _)| *k);
        assert!(verify(&old_root, &new_root, &batch, &padded, 8, t.oracle()).is_ok());
    }

    #[test]
    fn depth_zero_degenerate_case() {
        let t = SparseMerkleTree::degenerate(Blake2bOracle::new(), false);
        let empty = t.oracle().empty();
        let value = v(7);
        let witness: Witness<Digest> = vec![];
        assert!(verify(&empty, &value, &[(0, value)], &witness, 0, t.oracle()).is_ok());
    }

    #[test]
    fn duplicate_leaf_is_not_a_hard_error_end_to_end() {
        let mut t = tree(8);
        t.batch_insert(vec![(1, v(1))]).unwrap();
        let old_root = t.root();
        let outcome = t.batch_insert(vec![(1, v(2)), (2, v(3))]).unwrap();
        let new_root = t.root();
        assert_eq!(outcome.dropped[0].reason, DiagnosticReason::DuplicateLeaf);
        // Verifier only ever sees the accepted half of the batch.
        let accepted = vec![(2u64, v(3))];
        assert!(verify(&old_root, &new_root, &accepted, &outcome.witness, 8, t.oracle()).is_ok());
    }
}
