//! Hash-chain primitives: hashing and chain integrity verification.
//!
//! Hash input layout (bytes, in order):
//!   1. sequence as 8-byte little-endian
//!   2. prev_hash as UTF-8 bytes (64 ASCII hex chars)
//!   3. canonical JSON of the transition (serde_json, no pretty-printing)
//!
//! The run id is part of the transition JSON, so entries from different runs
//! sharing one journal still hash distinctly.

use sha2::{Digest, Sha256};

use precog_contracts::{
    error::{CoordinationError, PrecogResult},
    phase::PhaseTransition,
};

use crate::entry::JournalEntry;

/// Compute the SHA-256 hash of one journal entry.
///
/// Returns a lowercase 64-character hex string.
pub fn hash_entry(sequence: u64, transition: &PhaseTransition, prev_hash: &str) -> PrecogResult<String> {
    let transition_json =
        serde_json::to_vec(transition).map_err(|e| CoordinationError::JournalWriteFailed {
            reason: format!("transition is not serializable: {}", e),
        })?;

    let mut hasher = Sha256::new();
    hasher.update(sequence.to_le_bytes());
    hasher.update(prev_hash.as_bytes());
    hasher.update(&transition_json);

    Ok(hex::encode(hasher.finalize()))
}

/// Verify the integrity of a hash chain.
///
/// Valid when every entry's `prev_hash` is the previous entry's `this_hash`
/// (or `GENESIS_HASH` for the first), every `sequence` equals its position,
/// and every `this_hash` matches the value recomputed from the entry's own
/// fields. An empty chain is valid.
pub fn verify_chain(entries: &[JournalEntry]) -> bool {
    let mut expected_prev = JournalEntry::GENESIS_HASH.to_string();

    for (position, entry) in entries.iter().enumerate() {
        if entry.sequence != position as u64 || entry.prev_hash != expected_prev {
            return false;
        }

        match hash_entry(entry.sequence, &entry.transition, &entry.prev_hash) {
            Ok(recomputed) if recomputed == entry.this_hash => {}
            _ => return false,
        }

        expected_prev = entry.this_hash.clone();
    }

    true
}
