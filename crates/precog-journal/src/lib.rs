//! # precog-journal
//!
//! Append-only, SHA-256 hash-chained journal of scheduler state transitions.
//!
//! Every `PhaseTransition` the scheduler records is wrapped in a
//! `JournalEntry` linked to its predecessor by hash. Editing any entry
//! breaks the chain and `verify_chain` reports it.
//!
//! ## Usage
//!
//! ```rust,ignore
//! use precog_journal::InMemoryRunJournal;
//!
//! let journal = InMemoryRunJournal::new();
//! let scheduler = PhaseScheduler::new(settings, funding, Box::new(journal.clone()));
//! scheduler.run_coordination(&mut registry, &scenario)?;
//!
//! assert!(journal.verify_integrity());
//! let log = journal.export_log();
//! ```

pub mod chain;
pub mod entry;
pub mod memory;

pub use chain::{hash_entry, verify_chain};
pub use entry::{JournalEntry, JournalLog};
pub use memory::InMemoryRunJournal;

// ── Tests ─────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use chrono::Utc;

    use precog_contracts::phase::{PhaseTransition, SchedulerState};
    use precog_core::traits::RunJournal;

    use super::{InMemoryRunJournal, JournalEntry};

    // ── Helpers ───────────────────────────────────────────────────────────────

    fn transition(run_id: &str, from: SchedulerState, outcomes: usize) -> PhaseTransition {
        PhaseTransition {
            run_id: run_id.to_string(),
            from,
            to: from.advance().unwrap(),
            agent_outcomes: outcomes,
            detail: None,
            timestamp: Utc::now(),
        }
    }

    /// Journal a complete run: INIT → … → DONE.
    fn record_full_run(journal: &InMemoryRunJournal, run_id: &str) {
        let mut state = SchedulerState::Init;
        while !state.is_terminal() {
            journal.record(&transition(run_id, state, 4)).unwrap();
            state = state.advance().unwrap();
        }
        journal.finalize(run_id).unwrap();
    }

    // ── Tests ─────────────────────────────────────────────────────────────────

    /// A full run journals six transitions forming a valid chain.
    #[test]
    fn test_hash_chain_integrity() {
        let journal = InMemoryRunJournal::new();
        record_full_run(&journal, "run-integrity");

        assert_eq!(journal.len(), 6);
        assert!(journal.verify_integrity(), "chain must be valid after sequential writes");
    }

    /// Rewriting a transition after the fact breaks the chain.
    #[test]
    fn test_tamper_detection() {
        let journal = InMemoryRunJournal::new();
        record_full_run(&journal, "run-tamper");

        {
            let mut state = journal.state.lock().unwrap();
            state.entries[2].transition.agent_outcomes = 99;
        }

        assert!(!journal.verify_integrity(), "chain must detect an edited entry");
    }

    /// Dropping an entry from the middle breaks the linkage.
    #[test]
    fn test_removed_entry_detected() {
        let journal = InMemoryRunJournal::new();
        record_full_run(&journal, "run-gap");

        {
            let mut state = journal.state.lock().unwrap();
            state.entries.remove(3);
        }

        assert!(!journal.verify_integrity());
    }

    /// The first entry links to the genesis sentinel.
    #[test]
    fn test_genesis_hash() {
        let journal = InMemoryRunJournal::new();
        journal.record(&transition("run-genesis", SchedulerState::Init, 0)).unwrap();

        let log = journal.export_log();
        assert_eq!(log.entries.len(), 1);
        assert_eq!(log.entries[0].prev_hash, JournalEntry::GENESIS_HASH);
    }

    /// Sequence numbers run 0, 1, 2, … across runs sharing one journal.
    #[test]
    fn test_sequence_monotonic_across_runs() {
        let journal = InMemoryRunJournal::new();
        record_full_run(&journal, "run-a");
        record_full_run(&journal, "run-b");

        let log = journal.export_log();
        for (idx, entry) in log.entries.iter().enumerate() {
            assert_eq!(entry.sequence, idx as u64);
        }
        assert_eq!(log.finalized_runs, vec!["run-a".to_string(), "run-b".to_string()]);
        assert_eq!(journal.entries_for_run("run-b").len(), 6);
        assert!(journal.verify_integrity());
    }

    /// An aborted run carries the error text on its final entry.
    #[test]
    fn test_abort_entry_keeps_detail() {
        let journal = InMemoryRunJournal::new();
        journal.record(&transition("run-abort", SchedulerState::Init, 0)).unwrap();
        journal
            .record(&PhaseTransition {
                run_id: "run-abort".to_string(),
                from: SchedulerState::Detecting,
                to: SchedulerState::Aborted,
                agent_outcomes: 0,
                detail: Some("agent 'crisis-sage' failed during detect".to_string()),
                timestamp: Utc::now(),
            })
            .unwrap();

        let entries = journal.entries_for_run("run-abort");
        assert_eq!(entries.last().unwrap().transition.to, SchedulerState::Aborted);
        assert!(entries[1].transition.detail.as_deref().unwrap().contains("crisis-sage"));
        assert!(journal.export_log().finalized_runs.is_empty());
    }

    /// Clones share one chain.
    #[test]
    fn test_clones_share_state() {
        let journal = InMemoryRunJournal::new();
        let handle = journal.clone();
        record_full_run(&handle, "run-shared");

        assert_eq!(journal.len(), 6);
        let log = journal.export_log();
        assert_eq!(log.terminal_hash, log.entries.last().unwrap().this_hash);
        assert!(super::verify_chain(&log.entries));
    }

    /// An empty journal is trivially valid.
    #[test]
    fn test_verify_empty() {
        let journal = InMemoryRunJournal::new();
        assert!(journal.is_empty());
        assert!(journal.verify_integrity());
        assert!(super::verify_chain(&[]));
        assert_eq!(journal.export_log().terminal_hash, "");
    }
}
