//! Sparse Merkle Tree engine with batch insertion and succinct
//! non-deletion witnesses, designed to feed zero-knowledge proof circuits.
//!
//! Given a fixed-depth binary tree whose leaves default to an empty value,
//! this crate supports:
//! - inserting a batch of `(key, value)` pairs at once ([`batch`]),
//! - producing a compact consistency witness proving the batch landed in
//!   previously-empty slots and that the root transitioned without
//!   overwriting any non-empty leaf ([`witness`]),
//! - verifying that witness independently ([`verify`]).
//!
//! The hash primitive is external: the engine is generic over any
//! [`hash::HashOracle`]. A BLAKE2b-based oracle is provided out of the box
//! for tests and quick starts; production use should supply a
//! circuit-friendly hash (Poseidon, Rescue, ...).

pub mod address;
pub mod batch;
pub mod config;
pub mod error;
pub mod hash;
pub mod shared;
pub mod tree;
pub mod verify;
pub mod witness;

/// Opinionated defaults, in the style of this workspace's `params` modules
/// (see `accum::params`).
pub mod params {
    /// Default tree depth when none is specified by the caller: `2^32`
    /// leaves, matching the depth this workspace's other accumulator uses.
    pub const DEFAULT_DEPTH: u32 = 32;
    /// Node arity is fixed at 2 throughout this crate; exposed as a named
    /// constant for callers building wire formats around it.
    pub const NODE_ARITY: usize = 2;
}

pub use address::{key_to_bits, NodeAddress};
pub use batch::{BatchOutcome, Diagnostic, DiagnosticReason};
pub use config::TreeConfig;
pub use error::Error;
pub use hash::{Blake2bOracle, Digest, HashOracle, HexField, OracleAdapter};
pub use shared::SharedTree;
pub use tree::{NodeStore, SparseMerkleTree};
pub use verify::{verify, verify_bool};
pub use witness::{empty_witness, Witness, WitnessBundle};
