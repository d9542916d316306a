//! Hard-failure taxonomy for the tree and verifier.
//!
//! `DuplicateLeaf` is intentionally not a variant here: it is a soft
//! condition (see [`crate::batch::Diagnostic`]) and must never fail a
//! batch.

use thiserror::Error;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum Error {
    #[error("key {key} out of range for depth {depth} (must be < 2^{depth})")]
    KeyOutOfRange { key: u64, depth: u32 },

    #[error("malformed witness: {0}")]
    MalformedWitness(String),

    #[error("root mismatch on {which}: expected {expected}, computed {actual}")]
    RootMismatch { which: &'static str, expected: String, actual: String },

    #[error("depth mismatch: tree is configured for {tree_depth}, witness carries {witness_depth}")]
    DepthMismatch { tree_depth: u32, witness_depth: u32 },

    #[error("invalid field element encoding: {0}")]
    Encoding(String),
}
