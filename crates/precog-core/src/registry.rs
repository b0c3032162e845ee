//! The agent registry: the only shared mutable object of a run.

use precog_contracts::{
    agent::{AgentId, AgentState, AgentStatus},
    error::{CoordinationError, PrecogResult},
};
use tracing::debug;

use crate::traits::Agent;

/// One registered agent: its implementation plus its per-run state.
pub struct RegisteredAgent {
    pub(crate) state: AgentState,
    pub(crate) agent: Box<dyn Agent>,
}

impl RegisteredAgent {
    pub fn state(&self) -> &AgentState {
        &self.state
    }
}

/// Ordered collection of agents for one coordination run.
///
/// Iteration order is registration order. Passed explicitly to the
/// scheduler; there is no process-wide instance.
#[derive(Default)]
pub struct AgentRegistry {
    entries: Vec<RegisteredAgent>,
}

impl AgentRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register `agent` under `id` with a fresh state.
    ///
    /// Returns `DuplicateAgent` if `id` is already taken.
    pub fn register(
        &mut self,
        id: AgentId,
        name: impl Into<String>,
        threshold: f64,
        agent: Box<dyn Agent>,
    ) -> PrecogResult<()> {
        self.register_state(AgentState::new(id, name, threshold), agent)
    }

    /// Register `agent` with a caller-built state.
    pub fn register_state(&mut self, state: AgentState, agent: Box<dyn Agent>) -> PrecogResult<()> {
        if self.contains(&state.agent_id) {
            return Err(CoordinationError::DuplicateAgent { agent: state.agent_id });
        }
        debug!(agent = %state.agent_id, threshold = state.threshold(), "agent registered");
        self.entries.push(RegisteredAgent { state, agent });
        Ok(())
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn contains(&self, id: &AgentId) -> bool {
        self.entries.iter().any(|e| &e.state.agent_id == id)
    }

    /// Agent identities in registration order.
    pub fn ids(&self) -> impl Iterator<Item = &AgentId> {
        self.entries.iter().map(|e| &e.state.agent_id)
    }

    pub fn state(&self, id: &AgentId) -> Option<&AgentState> {
        self.entries
            .iter()
            .find(|e| &e.state.agent_id == id)
            .map(|e| &e.state)
    }

    pub fn iter(&self) -> impl Iterator<Item = &RegisteredAgent> {
        self.entries.iter()
    }

    /// Confidence, threshold and capability flags of every agent.
    pub fn status(&self) -> Vec<AgentStatus> {
        self.entries.iter().map(|e| e.state.status()).collect()
    }

    pub(crate) fn entries_mut(&mut self) -> &mut [RegisteredAgent] {
        &mut self.entries
    }
}
