//! Error types for the Precog coordination pipeline.
//!
//! All fallible operations return `PrecogResult<T>`. Errors raised inside a
//! phase are wrapped in `CoordinationError::Aborted` by the scheduler before
//! they reach the caller, so a caller only ever sees a complete
//! `CoordinationResult` or one descriptive aborted-run error.

use thiserror::Error;

use crate::{agent::AgentId, phase::Phase};

/// The unified error type for the Precog runtime.
#[derive(Debug, Error)]
pub enum CoordinationError {
    /// An agent operation failed or returned a malformed result.
    #[error("agent '{agent}' failed during {phase}: {reason}")]
    AgentExecution {
        agent: AgentId,
        phase: Phase,
        reason: String,
    },

    /// An agent call ran longer than the configured per-call limit.
    ///
    /// The call is allowed to finish, but its result is discarded.
    #[error("agent '{agent}' exceeded the {limit_ms} ms call limit during {phase} (took {elapsed_ms} ms)")]
    AgentTimeout {
        agent: AgentId,
        phase: Phase,
        elapsed_ms: u64,
        limit_ms: u64,
    },

    /// A phase tag did not name one of the five pipeline phases, or named a
    /// phase that agents do not take part in.
    #[error("unknown phase '{tag}'")]
    UnknownPhase { tag: String },

    /// The optimizer was given a negative budget or malformed cost data.
    ///
    /// An empty selection is a normal outcome and never produces this error.
    #[error("infeasible optimization: {reason}")]
    InfeasibleOptimization { reason: String },

    /// The scheduler hit an illegal state transition or inconsistent run data.
    #[error("state machine error: {reason}")]
    StateMachine { reason: String },

    /// Two agents were registered under the same identity.
    #[error("agent '{agent}' is already registered")]
    DuplicateAgent { agent: AgentId },

    /// A required configuration value is missing or invalid.
    #[error("configuration error: {reason}")]
    ConfigError { reason: String },

    /// The run journal could not persist a transition record.
    ///
    /// Treated as fatal: a transition that cannot be journaled cannot proceed.
    #[error("journal write failed: {reason}")]
    JournalWriteFailed { reason: String },

    /// A coordination run was aborted. `cause` is the originating error.
    #[error("coordination aborted in {phase}{}: {cause}", agent_suffix(.agent))]
    Aborted {
        phase: Phase,
        agent: Option<AgentId>,
        #[source]
        cause: Box<CoordinationError>,
    },
}

impl CoordinationError {
    /// The agent this error originated from, if any.
    pub fn agent(&self) -> Option<&AgentId> {
        match self {
            Self::AgentExecution { agent, .. } | Self::AgentTimeout { agent, .. } => Some(agent),
            Self::DuplicateAgent { agent } => Some(agent),
            Self::Aborted { agent, .. } => agent.as_ref(),
            _ => None,
        }
    }

    /// Wrap this error as an aborted run in `phase`.
    ///
    /// An error that is already `Aborted` is returned unchanged.
    pub fn abort_in(self, phase: Phase) -> Self {
        match self {
            aborted @ Self::Aborted { .. } => aborted,
            other => Self::Aborted {
                phase,
                agent: other.agent().cloned(),
                cause: Box::new(other),
            },
        }
    }
}

fn agent_suffix(agent: &Option<AgentId>) -> String {
    agent
        .as_ref()
        .map(|a| format!(" at agent '{}'", a))
        .unwrap_or_default()
}

/// Convenience alias used throughout the Precog crates.
pub type PrecogResult<T> = Result<T, CoordinationError>;
