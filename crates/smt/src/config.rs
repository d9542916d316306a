//! Deployment-wide configuration (spec §6.3): the three knobs that must
//! agree between whoever builds a tree and whoever later verifies a
//! witness produced by it.

/// `depth`, `hash_function` and `idempotent_on_default` from spec §6.3.
/// `hash_function` is an opaque identifier (e.g. `"poseidon-pasta"`,
/// `"blake2b-256"`) carried for diagnostics and cross-tool agreement; this
/// crate does not interpret it, since the concrete hash is always supplied
/// by the caller via [`crate::hash::HashOracle`].
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct TreeConfig {
    pub depth: u32,
    pub hash_function: String,
    pub idempotent_on_default: bool,
}

impl TreeConfig {
    pub fn new(depth: u32, hash_function: impl Into<String>, idempotent_on_default: bool) -> Self {
        Self { depth, hash_function: hash_function.into(), idempotent_on_default }
    }

    /// Config for the crate's built-in BLAKE2b oracle with plain
    /// `H(⊥,⊥)=⊥` semantics (no leaf-binding identity).
    pub fn blake2b(depth: u32) -> Self {
        Self::new(depth, "blake2b-256", false)
    }
}
