//! The four civic reference agents.
//!
//! Each agent pulls raw records from the injected `CityDataSource` during
//! Detect and carries what it needs forward in its own result extensions.
//! Later phases only see the aggregated output of the phase before, so an
//! agent reads its working set back under `<agent-id>_<phase-key>`.

pub mod budget;
pub mod crisis;
pub mod housing;
pub mod street;

pub use budget::BudgetProphet;
pub use crisis::CrisisSage;
pub use housing::HousingOracle;
pub use street::StreetPrecog;

use serde::{de::DeserializeOwned, Serialize};
use serde_json::{json, Value};

use precog_contracts::{
    agent::AgentState,
    error::{CoordinationError, PrecogResult},
    phase::Phase,
    report::{BroadcastResult, PhaseContext, Priority},
};

/// Location used when the scenario does not name one.
pub const DEFAULT_LOCATION: &str = "San Francisco";

pub(crate) fn location(ctx: &PhaseContext) -> String {
    ctx.get("location")
        .and_then(Value::as_str)
        .unwrap_or(DEFAULT_LOCATION)
        .to_string()
}

pub(crate) fn rain_probability(ctx: &PhaseContext) -> f64 {
    ctx.get("weather")
        .and_then(|w| w.get("rain_probability"))
        .and_then(Value::as_f64)
        .unwrap_or(0.0)
}

pub(crate) fn capped(cap: f64, score: f64) -> f64 {
    score.min(cap)
}

pub(crate) fn priority_above(severity: f64, cut: f64) -> Priority {
    if severity > cut {
        Priority::High
    } else {
        Priority::Medium
    }
}

/// Read `key` from this agent's own `from`-phase output in `ctx`.
pub(crate) fn carried<T: DeserializeOwned>(
    ctx: &PhaseContext,
    state: &AgentState,
    from: Phase,
    key: &str,
) -> PrecogResult<T> {
    let failed = |reason: String| CoordinationError::AgentExecution {
        agent: state.agent_id.clone(),
        phase: from.next().unwrap_or(from),
        reason,
    };

    let value = ctx
        .agent_output(&state.agent_id, from)
        .and_then(|output| output.get(key))
        .ok_or_else(|| failed(format!("own {} output has no '{}'", from, key)))?;

    serde_json::from_value(value.clone())
        .map_err(|e| failed(format!("own {} output '{}' is unreadable: {}", from, key, e)))
}

pub(crate) fn encode<T: Serialize>(state: &AgentState, phase: Phase, value: &T) -> PrecogResult<Value> {
    serde_json::to_value(value).map_err(|e| CoordinationError::AgentExecution {
        agent: state.agent_id.clone(),
        phase,
        reason: format!("failed to encode result: {}", e),
    })
}

/// The shared Broadcast acknowledgment.
///
/// Counts the context sections received and how many of this agent's
/// proposals the optimizer funded, and records the latter as a flag.
pub(crate) fn acknowledge(state: &mut AgentState, ctx: &PhaseContext) -> BroadcastResult {
    let id = state.agent_id.as_str();

    let sections = ["detection", "prediction", "prevention", "roi_optimization"]
        .iter()
        .filter(|key| ctx.contains_key(key))
        .count();

    let proposed = ctx
        .get("prevention")
        .and_then(|p| p.get(id))
        .and_then(|out| out.get("strategies"))
        .and_then(Value::as_array)
        .map_or(0, Vec::len);

    let roi = ctx.get("roi_optimization");
    let selected = roi
        .and_then(|r| r.pointer("/result/selected"))
        .and_then(Value::as_array)
        .map_or(0, |sel| {
            sel.iter()
                .filter(|calc| calc.get("agent").and_then(Value::as_str) == Some(id))
                .count()
        });
    let total_roi = roi
        .and_then(|r| r.get("total_roi"))
        .and_then(Value::as_f64)
        .unwrap_or(0.0);

    state.set_flag("strategies_funded", json!(selected));

    let funded_bonus = if selected > 0 { 0.1 } else { 0.0 };
    BroadcastResult::new(capped(0.9, sections as f64 * 0.1 + funded_bonus))
        .with("sections_received", json!(sections))
        .with("strategies_proposed", json!(proposed))
        .with("strategies_selected", json!(selected))
        .with("total_roi", json!(total_roi))
}
