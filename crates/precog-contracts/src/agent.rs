//! Agent identity and per-run agent state.
//!
//! The registry owns one `AgentState` per agent for the lifetime of a run.
//! Agents receive `&mut` access to their own entry only, so the confidence
//! invariant is enforced here rather than by each agent.

use std::{collections::BTreeMap, fmt};

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Stable identifier for an agent.
///
/// Used as the registry key, as the prefix of aggregated context keys, and
/// as the `agent` field of every ROI calculation.
/// Example: AgentId("street-precog")
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct AgentId(pub String);

impl AgentId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for AgentId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Unique identifier for one coordination run.
///
/// Tags log records and journal entries. It is deliberately absent from
/// `CoordinationResult` so identical runs produce identical results.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct RunId(pub uuid::Uuid);

impl RunId {
    /// Create a new, unique run ID.
    pub fn new() -> Self {
        Self(uuid::Uuid::new_v4())
    }
}

impl Default for RunId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for RunId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Clamp `value` into [0, 1]. NaN maps to 0.
fn clamp_unit(value: f64) -> f64 {
    if value.is_nan() {
        0.0
    } else {
        value.clamp(0.0, 1.0)
    }
}

/// Mutable state an agent carries through a run.
///
/// `confidence` and `threshold` are private so that every write goes through
/// a clamping setter.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AgentState {
    /// Registry identity.
    pub agent_id: AgentId,
    /// Human-readable name (e.g. "Street Precog").
    pub name: String,
    confidence: f64,
    threshold: f64,
    /// Auxiliary agent-specific data attached during a run.
    flags: BTreeMap<String, Value>,
}

impl AgentState {
    /// Fresh state with zero confidence and no capability flags.
    pub fn new(agent_id: AgentId, name: impl Into<String>, threshold: f64) -> Self {
        Self {
            agent_id,
            name: name.into(),
            confidence: 0.0,
            threshold: clamp_unit(threshold),
            flags: BTreeMap::new(),
        }
    }

    pub fn confidence(&self) -> f64 {
        self.confidence
    }

    pub fn threshold(&self) -> f64 {
        self.threshold
    }

    /// Store `confidence` clamped into [0, 1] and return the stored value.
    pub fn update_confidence(&mut self, confidence: f64) -> f64 {
        self.confidence = clamp_unit(confidence);
        self.confidence
    }

    pub fn set_threshold(&mut self, threshold: f64) {
        self.threshold = clamp_unit(threshold);
    }

    /// True when the current confidence reaches the threshold.
    pub fn meets_threshold(&self) -> bool {
        self.confidence >= self.threshold
    }

    /// Attach or replace a capability flag.
    pub fn set_flag(&mut self, name: impl Into<String>, value: Value) {
        self.flags.insert(name.into(), value);
    }

    pub fn flag(&self, name: &str) -> Option<&Value> {
        self.flags.get(name)
    }

    pub fn flags(&self) -> &BTreeMap<String, Value> {
        &self.flags
    }

    /// Snapshot this state for status reporting.
    pub fn status(&self) -> AgentStatus {
        AgentStatus {
            agent_id: self.agent_id.clone(),
            name: self.name.clone(),
            confidence: self.confidence,
            threshold: self.threshold,
            threshold_met: self.meets_threshold(),
            flags: self.flags.clone(),
        }
    }
}

/// Point-in-time view of one agent, as reported by `AgentRegistry::status()`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AgentStatus {
    pub agent_id: AgentId,
    pub name: String,
    pub confidence: f64,
    pub threshold: f64,
    pub threshold_met: bool,
    pub flags: BTreeMap<String, Value>,
}
