//! Core trait definitions for the Precog coordination pipeline.
//!
//! These three traits are the seams the scheduler is built around:
//!
//! - `Agent`: external analysis unit (swappable business logic)
//! - `FundingSource`: injectable funding table or feed
//! - `RunJournal`: trusted sink for scheduler state transitions
//!
//! The scheduler owns the ordering. Agents never see each other's state and
//! never receive mutable access to the shared phase context.

use precog_contracts::{
    agent::AgentState,
    error::PrecogResult,
    phase::PhaseTransition,
    report::{BroadcastResult, DetectResult, PhaseContext, PredictResult, PreventResult},
    roi::FundingOpportunity,
};

/// An analysis unit taking part in every agent phase of a run.
///
/// The phase is selected by which method the scheduler calls; agents carry
/// no "current mode" of their own. Each call receives the agent's own
/// registry state (`&mut`, so confidence and capability flags may be updated)
/// and the read-only aggregated context of the previous phase.
///
/// Within one phase, the scheduler may call every agent concurrently, hence
/// the `Send + Sync` bound.
pub trait Agent: Send + Sync {
    /// Inspect the scenario context and report what was found.
    fn detect(&self, state: &mut AgentState, ctx: &PhaseContext) -> PrecogResult<DetectResult>;

    /// Forecast from the aggregated detection context.
    fn predict(&self, state: &mut AgentState, ctx: &PhaseContext) -> PrecogResult<PredictResult>;

    /// Propose mitigation strategies from the aggregated prediction context.
    fn prevent(&self, state: &mut AgentState, ctx: &PhaseContext) -> PrecogResult<PreventResult>;

    /// Acknowledge the combined run result. Must not have side effects
    /// beyond the agent's own state.
    fn broadcast(&self, state: &mut AgentState, ctx: &PhaseContext) -> PrecogResult<BroadcastResult>;
}

/// Supplies the funding opportunities used to scale strategy benefits.
///
/// May be a static table or an external feed. An empty list is valid.
pub trait FundingSource: Send + Sync {
    fn opportunities(&self) -> PrecogResult<Vec<FundingOpportunity>>;
}

/// The run journal: an append-only record of scheduler transitions.
///
/// A failed write is fatal: the run aborts with
/// `CoordinationError::JournalWriteFailed`.
pub trait RunJournal: Send + Sync {
    /// Append one transition record.
    fn record(&self, transition: &PhaseTransition) -> PrecogResult<()>;

    /// Mark a run as complete. Called once after the DONE transition.
    fn finalize(&self, run_id: &str) -> PrecogResult<()>;
}

/// A journal that discards everything.
#[derive(Debug, Default, Clone, Copy)]
pub struct NullJournal;

impl RunJournal for NullJournal {
    fn record(&self, _transition: &PhaseTransition) -> PrecogResult<()> {
        Ok(())
    }

    fn finalize(&self, _run_id: &str) -> PrecogResult<()> {
        Ok(())
    }
}
