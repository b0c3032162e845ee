//! Journal entry and log types.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use precog_contracts::phase::PhaseTransition;

/// One link in the SHA-256 chain: a scheduler transition plus its position
/// and hashes.
///
/// Editing any field, including those of the embedded transition, breaks
/// `this_hash` and every later `prev_hash`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct JournalEntry {
    /// Position in the chain, starting at 0.
    pub sequence: u64,
    pub transition: PhaseTransition,
    /// `this_hash` of the previous entry, or `GENESIS_HASH`.
    pub prev_hash: String,
    pub this_hash: String,
}

impl JournalEntry {
    /// The `prev_hash` of the first entry in every chain.
    pub const GENESIS_HASH: &'static str =
        "0000000000000000000000000000000000000000000000000000000000000000";

    pub fn run_id(&self) -> &str {
        &self.transition.run_id
    }
}

/// A snapshot of a journal, as produced by `InMemoryRunJournal::export_log`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JournalLog {
    /// All entries in chain order.
    pub entries: Vec<JournalEntry>,
    /// Runs that reached DONE and were finalized, in completion order.
    pub finalized_runs: Vec<String>,
    pub exported_at: DateTime<Utc>,
    /// `this_hash` of the last entry; empty if the journal is empty.
    pub terminal_hash: String,
}
