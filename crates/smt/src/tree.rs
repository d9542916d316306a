//! The sparse node store and the tree that owns it.
//!
//! The store is a partial map from `(level, key)` to field values; any
//! address not present logically holds `def[level]`. No balancing, no
//! tombstones — a miss is resolved by falling back to the precomputed
//! default for that level.

use crate::config::TreeConfig;
use crate::error::Error;
use crate::hash::{precompute_defaults, HashOracle, OracleAdapter};
use std::collections::HashMap;

/// Partial mapping `(level, key) -> F`. Never stores `⊥`/`def[level]`
/// redundantly by construction (callers only ever `set` non-default
/// values), though the spec notes that doing so would not break
/// correctness.
#[derive(Default)]
pub struct NodeStore<F> {
    nodes: HashMap<(u32, u64), F>,
}

impl<F: Clone> NodeStore<F> {
    pub fn new() -> Self {
        Self { nodes: HashMap::new() }
    }

    /// Returns the stored value, or `default` if absent. Never fails.
    pub fn get(&self, level: u32, key: u64, default: &F) -> F {
        self.nodes.get(&(level, key)).cloned().unwrap_or_else(|| default.clone())
    }

    pub fn contains(&self, level: u32, key: u64) -> bool {
        self.nodes.contains_key(&(level, key))
    }

    /// Unconditional write at any level above 0.
    pub fn set(&mut self, level: u32, key: u64, value: F) {
        self.nodes.insert((level, key), value);
    }

    /// Leaf-level write. Returns `true` if the write landed, `false` if a
    /// leaf already occupied `key` and the write was suppressed (the soft
    /// `DuplicateLeaf` condition from spec §4.2/§7).
    pub fn set_leaf(&mut self, key: u64, value: F) -> bool {
        if self.nodes.contains_key(&(0, key)) {
            return false;
        }
        self.nodes.insert((0, key), value);
        true
    }

    pub fn materialized_len(&self) -> usize {
        self.nodes.len()
    }
}

/// A fixed-depth sparse Merkle tree: the node store plus the precomputed
/// default levels and the oracle adapter that both default-level
/// precomputation and batch insertion go through.
///
/// The tree is mutated exclusively by [`crate::batch`]'s `batch_insert`;
/// concurrent mutation is not supported (wrap in [`crate::shared::SharedTree`]
/// if you need a single-writer/multi-reader boundary between calls).
pub struct SparseMerkleTree<F, O> {
    pub(crate) depth: u32,
    pub(crate) store: NodeStore<F>,
    pub(crate) defaults: Vec<F>,
    pub(crate) oracle: OracleAdapter<F, O>,
}

impl<F, O> SparseMerkleTree<F, O>
where
    F: Clone + PartialEq,
    O: HashOracle<F>,
{
    /// Builds an empty tree of the given `depth` (`1..=256`) over `oracle`.
    pub fn new(depth: u32, oracle: O, idempotent_on_default: bool) -> Result<Self, Error> {
        if depth == 0 || depth > 256 {
            return Err(Error::MalformedWitness(format!(
                "depth {depth} out of bounds (must be 1..=256)"
            )));
        }
        let adapter = OracleAdapter::new(oracle, idempotent_on_default);
        let defaults = precompute_defaults(&adapter, depth);
        Ok(Self { depth, store: NodeStore::new(), defaults, oracle: adapter })
    }

    /// Builds a tree from a [`TreeConfig`]; `config.hash_function` is not
    /// interpreted, only `config.depth` and `config.idempotent_on_default`
    /// drive construction (see [`TreeConfig`]'s doc comment).
    pub fn from_config(config: &TreeConfig, oracle: O) -> Result<Self, Error> {
        Self::new(config.depth, oracle, config.idempotent_on_default)
    }

    /// Degenerate depth-0 tree: a single leaf *is* the root. Used only by
    /// the verifier's degenerate case (spec §4.4 edge cases); not exposed
    /// as a general-purpose constructor since a depth-0 tree cannot hold a
    /// batch of more than one key.
    pub(crate) fn degenerate(oracle: O, idempotent_on_default: bool) -> Self {
        let adapter = OracleAdapter::new(oracle, idempotent_on_default);
        let empty = adapter.empty();
        Self { depth: 0, store: NodeStore::new(), defaults: vec![empty], oracle: adapter }
    }

    pub fn depth(&self) -> u32 {
        self.depth
    }

    pub fn default_at(&self, level: u32) -> &F {
        &self.defaults[level as usize]
    }

    /// `get(level, key)`: never fails.
    pub fn get_node(&self, level: u32, key: u64) -> F {
        self.store.get(level, key, &self.defaults[level as usize])
    }

    /// `root()`.
    pub fn root(&self) -> F {
        self.get_node(self.depth, 0)
    }

    pub fn oracle(&self) -> &OracleAdapter<F, O> {
        &self.oracle
    }

    /// Verifies `witness` against this tree's own configured depth, oracle
    /// and identity mode, rather than trusting a caller-supplied `depth`
    /// argument. Where [`crate::verify::verify`] is the stateless verifier
    /// (its `depth` argument governs, per spec §7's note on `DepthMismatch`),
    /// this is the stateful counterpart used when a witness is checked
    /// against a specific live tree: a `witness_depth` that disagrees with
    /// `self.depth()` is rejected before any hashing is attempted.
    pub fn verify_against(
        &self,
        old_root: &F,
        new_root: &F,
        batch: &[(u64, F)],
        witness: &crate::witness::Witness<F>,
        witness_depth: u32,
    ) -> Result<(), Error>
    where
        F: std::fmt::Debug,
    {
        if witness_depth != self.depth {
            return Err(Error::DepthMismatch { tree_depth: self.depth, witness_depth });
        }
        crate::verify::verify(old_root, new_root, batch, witness, self.depth, &self.oracle)
    }
}
