//! Phase contexts, per-phase agent results, and committed phase results.
//!
//! Each agent operation returns one of a closed set of result structs. Every
//! struct carries the required `confidence` plus an open `extensions` map for
//! agent-specific auxiliary data, which the aggregator forwards opaquely into
//! the next phase's context.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::{
    agent::AgentId,
    error::{CoordinationError, PrecogResult},
    phase::Phase,
};

/// Read-only key/value context handed to every agent in a phase.
///
/// Agents receive `&PhaseContext`; only the aggregator builds new contexts.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PhaseContext {
    entries: Map<String, Value>,
}

impl PhaseContext {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_map(entries: Map<String, Value>) -> Self {
        Self { entries }
    }

    pub fn get(&self, key: &str) -> Option<&Value> {
        self.entries.get(key)
    }

    /// Look up the output `agent` produced in `phase`, as forwarded by the
    /// aggregator under `<agent-id>_<phase-key>`.
    pub fn agent_output(&self, agent: &AgentId, phase: Phase) -> Option<&Value> {
        self.entries
            .get(&format!("{}_{}", agent, phase.context_key()))
    }

    pub fn contains_key(&self, key: &str) -> bool {
        self.entries.contains_key(key)
    }

    pub fn keys(&self) -> impl Iterator<Item = &String> {
        self.entries.keys()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub(crate) fn insert(&mut self, key: impl Into<String>, value: Value) {
        self.entries.insert(key.into(), value);
    }

    /// Consume the builder-side map. Used by the aggregator.
    pub fn into_map(self) -> Map<String, Value> {
        self.entries
    }
}

/// Scenario parameters supplied to the pipeline entry point.
///
/// `weather` is an opaque environment bag; `parameters` carries any further
/// scenario keys through to the Detect context unchanged.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ScenarioInput {
    pub location: String,
    #[serde(default)]
    pub weather: Map<String, Value>,
    #[serde(flatten)]
    pub parameters: Map<String, Value>,
}

impl ScenarioInput {
    pub fn new(location: impl Into<String>) -> Self {
        Self {
            location: location.into(),
            ..Self::default()
        }
    }

    pub fn with_weather(mut self, key: impl Into<String>, value: Value) -> Self {
        self.weather.insert(key.into(), value);
        self
    }

    pub fn with_parameter(mut self, key: impl Into<String>, value: Value) -> Self {
        self.parameters.insert(key.into(), value);
        self
    }

    /// The context handed to agents in the Detect phase.
    pub fn to_context(&self) -> PhaseContext {
        let mut ctx = PhaseContext::from_map(self.parameters.clone());
        ctx.insert("location", Value::String(self.location.clone()));
        ctx.insert("weather", Value::Object(self.weather.clone()));
        ctx
    }
}

/// Priority tier of a proposed strategy.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Priority {
    Low,
    #[default]
    Medium,
    High,
    Critical,
}

/// A candidate mitigation action proposed during Prevent.
///
/// Cost and benefit are not supplied by the agent; the ROI calculator
/// assigns them uniformly.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Strategy {
    /// Category label (e.g. "outreach", "maintenance", "reallocation").
    #[serde(rename = "type")]
    pub kind: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub target: Option<String>,
    #[serde(default)]
    pub priority: Priority,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub action: Option<String>,
}

impl Strategy {
    pub fn new(kind: impl Into<String>, priority: Priority) -> Self {
        Self {
            kind: kind.into(),
            target: None,
            priority,
            action: None,
        }
    }

    pub fn with_target(mut self, target: impl Into<String>) -> Self {
        self.target = Some(target.into());
        self
    }

    pub fn with_action(mut self, action: impl Into<String>) -> Self {
        self.action = Some(action.into());
        self
    }
}

/// Parse a raw JSON payload into a typed result, mapping failures (missing
/// or non-numeric `confidence`, malformed strategies) to `AgentExecution`.
fn parse_payload<T: serde::de::DeserializeOwned>(
    agent: &AgentId,
    phase: Phase,
    payload: Value,
) -> PrecogResult<T> {
    serde_json::from_value(payload).map_err(|e| CoordinationError::AgentExecution {
        agent: agent.clone(),
        phase,
        reason: format!("malformed {} result: {}", phase, e),
    })
}

macro_rules! impl_result_common {
    ($ty:ident) => {
        impl $ty {
            /// Attach an auxiliary key forwarded into the next phase's context.
            pub fn with(mut self, key: impl Into<String>, value: Value) -> Self {
                self.extensions.insert(key.into(), value);
                self
            }

            /// Build from an agent's raw JSON payload. `confidence` is required.
            pub fn from_payload(agent: &AgentId, phase: Phase, payload: Value) -> PrecogResult<Self> {
                parse_payload(agent, phase, payload)
            }
        }
    };
}

/// Result of `Agent::detect`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DetectResult {
    pub confidence: f64,
    #[serde(flatten)]
    pub extensions: Map<String, Value>,
}

impl DetectResult {
    pub fn new(confidence: f64) -> Self {
        Self { confidence, extensions: Map::new() }
    }
}

/// Result of `Agent::predict`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PredictResult {
    pub confidence: f64,
    #[serde(flatten)]
    pub extensions: Map<String, Value>,
}

impl PredictResult {
    pub fn new(confidence: f64) -> Self {
        Self { confidence, extensions: Map::new() }
    }
}

/// Result of `Agent::prevent`. The only result that carries strategies.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PreventResult {
    pub confidence: f64,
    #[serde(default)]
    pub strategies: Vec<Strategy>,
    #[serde(flatten)]
    pub extensions: Map<String, Value>,
}

impl PreventResult {
    pub fn new(confidence: f64) -> Self {
        Self {
            confidence,
            strategies: Vec::new(),
            extensions: Map::new(),
        }
    }

    pub fn with_strategy(mut self, strategy: Strategy) -> Self {
        self.strategies.push(strategy);
        self
    }
}

/// Result of `Agent::broadcast`: a side-effect-free acknowledgment.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BroadcastResult {
    pub confidence: f64,
    #[serde(flatten)]
    pub extensions: Map<String, Value>,
}

impl BroadcastResult {
    pub fn new(confidence: f64) -> Self {
        Self { confidence, extensions: Map::new() }
    }
}

impl_result_common!(DetectResult);
impl_result_common!(PredictResult);
impl_result_common!(PreventResult);
impl_result_common!(BroadcastResult);

/// One agent's result for one phase, tagged by phase.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "phase", rename_all = "kebab-case")]
pub enum AgentReport {
    Detect(DetectResult),
    Predict(PredictResult),
    Prevent(PreventResult),
    Broadcast(BroadcastResult),
}

impl AgentReport {
    pub fn phase(&self) -> Phase {
        match self {
            AgentReport::Detect(_) => Phase::Detect,
            AgentReport::Predict(_) => Phase::Predict,
            AgentReport::Prevent(_) => Phase::Prevent,
            AgentReport::Broadcast(_) => Phase::Broadcast,
        }
    }

    pub fn confidence(&self) -> f64 {
        match self {
            AgentReport::Detect(r) => r.confidence,
            AgentReport::Predict(r) => r.confidence,
            AgentReport::Prevent(r) => r.confidence,
            AgentReport::Broadcast(r) => r.confidence,
        }
    }

    pub fn set_confidence(&mut self, confidence: f64) {
        match self {
            AgentReport::Detect(r) => r.confidence = confidence,
            AgentReport::Predict(r) => r.confidence = confidence,
            AgentReport::Prevent(r) => r.confidence = confidence,
            AgentReport::Broadcast(r) => r.confidence = confidence,
        }
    }

    /// Strategies proposed in this result. Empty outside Prevent.
    pub fn strategies(&self) -> &[Strategy] {
        match self {
            AgentReport::Prevent(r) => &r.strategies,
            _ => &[],
        }
    }

    pub fn extensions(&self) -> &Map<String, Value> {
        match self {
            AgentReport::Detect(r) => &r.extensions,
            AgentReport::Predict(r) => &r.extensions,
            AgentReport::Prevent(r) => &r.extensions,
            AgentReport::Broadcast(r) => &r.extensions,
        }
    }

    /// The raw output map: `confidence`, `strategies` (Prevent only) and
    /// every extension key, without the phase tag.
    pub fn to_output_map(&self) -> Map<String, Value> {
        let mut out = self.extensions().clone();
        out.insert("confidence".to_string(), Value::from(self.confidence()));
        if let AgentReport::Prevent(r) = self {
            // Strategy serialization cannot fail: plain strings and enums only.
            let strategies = r
                .strategies
                .iter()
                .filter_map(|s| serde_json::to_value(s).ok())
                .collect();
            out.insert("strategies".to_string(), Value::Array(strategies));
        }
        out
    }
}

/// One agent's committed output for a phase.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AgentOutcome {
    pub agent: AgentId,
    pub report: AgentReport,
}

/// All agent outputs for one phase, in registry order.
///
/// Built by the scheduler only after every agent of the phase succeeded;
/// never modified afterwards.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PhaseResult {
    pub phase: Phase,
    pub outcomes: Vec<AgentOutcome>,
}

impl PhaseResult {
    pub fn new(phase: Phase, outcomes: Vec<AgentOutcome>) -> Self {
        Self { phase, outcomes }
    }

    pub fn get(&self, agent: &AgentId) -> Option<&AgentReport> {
        self.outcomes
            .iter()
            .find(|o| &o.agent == agent)
            .map(|o| &o.report)
    }

    pub fn agents(&self) -> impl Iterator<Item = &AgentId> {
        self.outcomes.iter().map(|o| &o.agent)
    }

    pub fn len(&self) -> usize {
        self.outcomes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.outcomes.is_empty()
    }

    /// Every `(agent, strategy)` pair, in registry then proposal order.
    pub fn strategies(&self) -> impl Iterator<Item = (&AgentId, &Strategy)> {
        self.outcomes
            .iter()
            .flat_map(|o| o.report.strategies().iter().map(move |s| (&o.agent, s)))
    }

    /// Map form `{agent-id: output map}` used in the broadcast context.
    pub fn to_value(&self) -> Value {
        let map: Map<String, Value> = self
            .outcomes
            .iter()
            .map(|o| (o.agent.to_string(), Value::Object(o.report.to_output_map())))
            .collect();
        Value::Object(map)
    }
}
