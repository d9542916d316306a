//! The consistency witness and its cross-tool wire formats.
//!
//! A witness is per-level: `witness[level]` is the ascending-by-key list of
//! non-default sibling values outside the batch frontier at that level.
//! `crate::batch` produces it; `crate::verify` consumes it; this module
//! only knows how to check its shape and how to move it in and out of the
//! bundle formats from spec §6.1/§6.2.

use crate::error::Error;
use crate::hash::HexField;
use serde::{Deserialize, Serialize};

/// `witness[0..depth)`, each level's entries sorted ascending by node key.
pub type Witness<F> = Vec<Vec<(u64, F)>>;

/// Builds the empty-shaped witness (`depth` empty per-level lists), the
/// value `batch_insert` returns when every pair in a batch was filtered out
/// as a duplicate (spec §9 open question: preserved, not a sentinel).
pub fn empty_witness<F>(depth: u32) -> Witness<F> {
    (0..depth).map(|_| Vec::new()).collect()
}

/// Checks the shape invariants a verifier must enforce before trusting a
/// witness (spec §4.4 edge cases / §7 `MalformedWitness`):
/// level count equals `depth`, and each level's keys are strictly
/// ascending (also rules out duplicate keys within a level).
pub fn validate_shape<F>(witness: &Witness<F>, depth: u32) -> Result<(), Error> {
    if witness.len() != depth as usize {
        return Err(Error::MalformedWitness(format!(
            "witness has {} levels, expected {depth}",
            witness.len()
        )));
    }
    for (level, entries) in witness.iter().enumerate() {
        for pair in entries.windows(2) {
            if pair[0].0 >= pair[1].0 {
                return Err(Error::MalformedWitness(format!(
                    "witness level {level} keys not strictly ascending at key {}",
                    pair[0].0
                )));
            }
        }
    }
    Ok(())
}

/// Witness bundle as described in spec §6.1: a JSON object carrying both
/// roots, the depth, the batch, and the proof (witness). Field elements
/// and keys are hex strings; this is the concrete `Digest`-keyed form used
/// for interchange — callers with a custom field type convert through
/// [`crate::hash::HexField`] themselves.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct WitnessBundle {
    pub old_root: String,
    pub new_root: String,
    pub depth: u32,
    pub batch: Vec<(u64, String)>,
    pub proof: Vec<Vec<(u64, String)>>,
}

impl WitnessBundle {
    pub fn new<F: HexField>(
        old_root: &F,
        new_root: &F,
        depth: u32,
        batch: &[(u64, F)],
        witness: &Witness<F>,
    ) -> Self {
        Self {
            old_root: old_root.to_hex(),
            new_root: new_root.to_hex(),
            depth,
            batch: batch.iter().map(|(k, v)| (*k, v.to_hex())).collect(),
            proof: witness
                .iter()
                .map(|level| level.iter().map(|(k, v)| (*k, v.to_hex())).collect())
                .collect(),
        }
    }

    pub fn to_json(&self) -> Result<String, Error> {
        serde_json::to_string_pretty(self).map_err(|e| Error::Encoding(e.to_string()))
    }

    pub fn from_json(s: &str) -> Result<Self, Error> {
        serde_json::from_str(s).map_err(|e| Error::Encoding(e.to_string()))
    }

    /// Decodes the hex fields back into `(F, F, batch, witness)`.
    pub fn decode<F: HexField>(&self) -> Result<(F, F, Vec<(u64, F)>, Witness<F>), Error> {
        let old_root = F::from_hex(&self.old_root)?;
        let new_root = F::from_hex(&self.new_root)?;
        let batch = self
            .batch
            .iter()
            .map(|(k, v)| Ok((*k, F::from_hex(v)?)))
            .collect::<Result<Vec<_>, Error>>()?;
        let proof = self
            .proof
            .iter()
            .map(|level| {
                level.iter().map(|(k, v)| Ok((*k, F::from_hex(v)?))).collect::<Result<Vec<_>, Error>>()
            })
            .collect::<Result<Vec<_>, Error>>()?;
        Ok((old_root, new_root, batch, proof))
    }

    /// Flattens the bundle into the ordered hex argument vector from spec
    /// §6.2, for ingestion by a fixed-calling-convention verifier circuit.
    /// All integers (lengths, `depth`) are hex-encoded with a `0x` prefix,
    /// matching the field elements.
    pub fn to_hex_args(&self) -> Vec<String> {
        let mut args = Vec::new();
        args.push(self.old_root.clone());
        args.push(self.new_root.clone());
        args.push(hex_u64(self.batch.len() as u64));
        for (k, v) in &self.batch {
            args.push(hex_u64(*k));
            args.push(v.clone());
        }
        args.push(hex_u64(self.proof.len() as u64));
        for level in &self.proof {
            args.push(hex_u64(level.len() as u64));
            for (k, v) in level {
                args.push(hex_u64(*k));
                args.push(v.clone());
            }
        }
        args.push(hex_u64(self.depth as u64));
        args
    }
}

fn hex_u64(v: u64) -> String {
    format!("0x{v:x}")
}
