//! The hash oracle: a pure binary combiner over field elements, injected by
//! the caller. The engine treats it as opaque except for one algebraic
//! identity it is required to exploit: `H(⊥, ⊥) = ⊥`.

use crate::error::Error;
use blake2b_simd::Params as Blake2bParams;
use std::marker::PhantomData;

/// A 32-byte field-element stand-in used by the crate's built-in oracle.
/// Downstream users plug in their own `F` (e.g. a Poseidon-over-Pasta
/// scalar) together with their own [`HashOracle`] impl; nothing in
/// `crate::tree`, `crate::batch` or `crate::verify` depends on the concrete
/// type beyond `Clone + PartialEq`.
pub type Digest = [u8; 32];

/// The distinguished empty element for [`Digest`].
pub const EMPTY_DIGEST: Digest = [0u8; 32];

/// A pure binary combiner `H: F × F → F`, with a distinguished empty value.
///
/// Implementations must be deterministic and side-effect free. They are
/// *not* responsible for the `H(⊥,⊥)=⊥` short-circuit or the optional
/// `idempotent_on_default` identities — [`OracleAdapter`] applies those
/// uniformly so every call site (default-level precomputation, batch
/// insertion, verification) agrees.
pub trait HashOracle<F> {
    fn raw_hash(&self, left: &F, right: &F) -> F;
    fn empty(&self) -> F;
}

/// Wraps a [`HashOracle`] and enforces the deployment-wide identities from
/// spec §4.1 at a single call site.
///
/// `idempotent_on_default` selects between two sound but distinct tree
/// semantics: plain `H(⊥,⊥)=⊥` only (positional commitment), or the
/// additional `H(x,⊥)=H(⊥,x)=x` leaf-binding identity. This flag must be
/// the same value used to build a tree's [`crate::tree::SparseMerkleTree`]
/// and whatever [`OracleAdapter`] is handed to [`crate::verify::verify`]
/// for witnesses produced by that tree.
pub struct OracleAdapter<F, O> {
    inner: O,
    idempotent_on_default: bool,
    _marker: PhantomData<F>,
}

impl<F, O> OracleAdapter<F, O>
where
    F: Clone + PartialEq,
    O: HashOracle<F>,
{
    pub fn new(inner: O, idempotent_on_default: bool) -> Self {
        Self { inner, idempotent_on_default, _marker: PhantomData }
    }

    pub fn idempotent_on_default(&self) -> bool {
        self.idempotent_on_default
    }

    pub fn empty(&self) -> F {
        self.inner.empty()
    }

    /// `H(l, r)` with the short-circuit and optional identity applied.
    ///
    /// The short-circuit is not an optimization here: at depth 256 without
    /// it, precomputing default levels would require `2 * 256` oracle
    /// calls over subtrees that are all `⊥` anyway, and a naive consumer
    /// that walked the frontier instead of trusting `def[level]` would pay
    /// `O(2^D)`. Skipping the call when both sides are empty is what keeps
    /// default-level precomputation `O(D)`.
    pub fn hash(&self, left: &F, right: &F) -> F {
        let empty = self.inner.empty();
        if *left == empty && *right == empty {
            return empty;
        }
        if self.idempotent_on_default {
            if *left == empty {
                return right.clone();
            }
            if *right == empty {
                return left.clone();
            }
        }
        self.inner.raw_hash(left, right)
    }
}

/// Precompute `def[0..=depth]` where `def[0] = ⊥` and
/// `def[i] = H(def[i-1], def[i-1])`.
pub fn precompute_defaults<F, O>(oracle: &OracleAdapter<F, O>, depth: u32) -> Vec<F>
where
    F: Clone + PartialEq,
    O: HashOracle<F>,
{
    let mut def = Vec::with_capacity(depth as usize + 1);
    def.push(oracle.empty());
    for i in 1..=depth as usize {
        let prev = def[i - 1].clone();
        def.push(oracle.hash(&prev, &prev));
    }
    def
}

/// The crate's built-in oracle: domain-separated BLAKE2b-256 over the
/// concatenation of both children, in the style of the domain-separated
/// digest derivations used elsewhere in this workspace
/// (`primitives::digest`). This is a stand-in for a real circuit-friendly
/// hash (Poseidon, Rescue, ...); swap in your own [`HashOracle`] for
/// production proving.
#[derive(Clone, Debug)]
pub struct Blake2bOracle {
    domain: &'static [u8; 16],
}

const DS_SMT_NODE_V1: &[u8; 16] = b"smt.node.h2.v1\0\0";

impl Blake2bOracle {
    pub fn new() -> Self {
        Self { domain: DS_SMT_NODE_V1 }
    }

    pub fn with_domain(domain: &'static [u8; 16]) -> Self {
        Self { domain }
    }
}

impl Default for Blake2bOracle {
    fn default() -> Self {
        Self::new()
    }
}

impl HashOracle<Digest> for Blake2bOracle {
    fn raw_hash(&self, left: &Digest, right: &Digest) -> Digest {
        let mut input = [0u8; 64];
        input[..32].copy_from_slice(left);
        input[32..].copy_from_slice(right);
        let hash = Blake2bParams::new().hash_length(32).personal(self.domain).hash(&input);
        let mut out = [0u8; 32];
        out.copy_from_slice(hash.as_bytes());
        out
    }

    fn empty(&self) -> Digest {
        EMPTY_DIGEST
    }
}

/// Hex codec for field elements that have a canonical byte representation,
/// used by the witness-bundle (de)serialization in [`crate::witness`].
pub trait HexField: Sized {
    fn to_hex(&self) -> String;
    fn from_hex(s: &str) -> Result<Self, Error>;
}

impl HexField for Digest {
    fn to_hex(&self) -> String {
        format!("0x{}", hex::encode(self))
    }

    fn from_hex(s: &str) -> Result<Self, Error> {
        let s = s.strip_prefix("0x").unwrap_or(s);
        let bytes = hex::decode(s).map_err(|e| Error::Encoding(e.to_string()))?;
        if bytes.len() != 32 {
            return Err(Error::Encoding(format!("expected 32 bytes, got {}", bytes.len())));
        }
        let mut out = [0u8; 32];
        out.copy_from_slice(&bytes);
        Ok(out)
    }
}
