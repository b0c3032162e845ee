//! In-memory implementation of `RunJournal`.
//!
//! Entries live in a `Vec` behind `Arc<Mutex<_>>`. Clones share the same
//! chain, so a caller can hand one clone to the scheduler and keep another
//! to inspect the journal after the run.

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use chrono::Utc;
use tracing::{debug, info};

use precog_contracts::{
    error::{CoordinationError, PrecogResult},
    phase::PhaseTransition,
};
use precog_core::traits::RunJournal;

use crate::{
    chain::{hash_entry, verify_chain},
    entry::{JournalEntry, JournalLog},
};

pub(crate) struct JournalState {
    pub(crate) entries: Vec<JournalEntry>,
    pub(crate) finalized_runs: Vec<String>,
    /// `this_hash` of the last entry, or `GENESIS_HASH`.
    pub(crate) last_hash: String,
}

/// An append-only run journal backed by a SHA-256 hash chain.
#[derive(Clone)]
pub struct InMemoryRunJournal {
    pub(crate) state: Arc<Mutex<JournalState>>,
}

impl Default for InMemoryRunJournal {
    fn default() -> Self {
        Self::new()
    }
}

impl InMemoryRunJournal {
    pub fn new() -> Self {
        let state = JournalState {
            entries: Vec::new(),
            finalized_runs: Vec::new(),
            last_hash: JournalEntry::GENESIS_HASH.to_string(),
        };
        Self {
            state: Arc::new(Mutex::new(state)),
        }
    }

    /// Read access for inspection. A poisoned lock still holds a consistent
    /// chain: entries are pushed only after hashing succeeds.
    fn read(&self) -> MutexGuard<'_, JournalState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn write(&self) -> PrecogResult<MutexGuard<'_, JournalState>> {
        self.state.lock().map_err(|e| CoordinationError::JournalWriteFailed {
            reason: format!("journal lock poisoned: {}", e),
        })
    }

    pub fn len(&self) -> usize {
        self.read().entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.read().entries.is_empty()
    }

    /// Entries belonging to `run_id`, in chain order.
    pub fn entries_for_run(&self, run_id: &str) -> Vec<JournalEntry> {
        self.read()
            .entries
            .iter()
            .filter(|e| e.run_id() == run_id)
            .cloned()
            .collect()
    }

    /// Snapshot every entry written so far.
    pub fn export_log(&self) -> JournalLog {
        let state = self.read();
        let terminal_hash = state
            .entries
            .last()
            .map(|e| e.this_hash.clone())
            .unwrap_or_default();

        JournalLog {
            entries: state.entries.clone(),
            finalized_runs: state.finalized_runs.clone(),
            exported_at: Utc::now(),
            terminal_hash,
        }
    }

    /// Check the in-memory chain for tampering.
    pub fn verify_integrity(&self) -> bool {
        verify_chain(&self.read().entries)
    }
}

impl RunJournal for InMemoryRunJournal {
    fn record(&self, transition: &PhaseTransition) -> PrecogResult<()> {
        let mut state = self.write()?;

        let sequence = state.entries.len() as u64;
        let prev_hash = state.last_hash.clone();
        let this_hash = hash_entry(sequence, transition, &prev_hash)?;

        debug!(
            run_id = %transition.run_id,
            sequence,
            from = %transition.from,
            to = %transition.to,
            "journal entry appended"
        );

        state.entries.push(JournalEntry {
            sequence,
            transition: transition.clone(),
            prev_hash,
            this_hash: this_hash.clone(),
        });
        state.last_hash = this_hash;

        Ok(())
    }

    fn finalize(&self, run_id: &str) -> PrecogResult<()> {
        let mut state = self.write()?;
        state.finalized_runs.push(run_id.to_string());

        info!(
            run_id = %run_id,
            entry_count = state.entries.len(),
            terminal_hash = %state.last_hash,
            "run journal finalized"
        );

        Ok(())
    }
}
