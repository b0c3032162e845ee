//! Phase dispatch: the tagged-variant function table mapping a `Phase` to
//! the matching `Agent` operation.
//!
//! Dispatch also normalizes what comes back: foreign errors become
//! `AgentExecution` errors carrying the agent and phase, a non-finite
//! confidence is rejected as malformed, and the reported confidence is
//! clamped and written into the agent's state.

use precog_contracts::{
    agent::AgentState,
    error::{CoordinationError, PrecogResult},
    phase::Phase,
    report::{AgentReport, PhaseContext},
};

use crate::traits::Agent;

/// Invoke the `phase` operation of `agent`.
///
/// # Errors
///
/// - `UnknownPhase` for `Phase::Optimize`, which has no agent operation.
/// - `AgentExecution` if the agent failed or reported a non-finite confidence.
pub fn invoke(
    agent: &dyn Agent,
    phase: Phase,
    state: &mut AgentState,
    ctx: &PhaseContext,
) -> PrecogResult<AgentReport> {
    let raw = match phase {
        Phase::Detect => agent.detect(state, ctx).map(AgentReport::Detect),
        Phase::Predict => agent.predict(state, ctx).map(AgentReport::Predict),
        Phase::Prevent => agent.prevent(state, ctx).map(AgentReport::Prevent),
        Phase::Broadcast => agent.broadcast(state, ctx).map(AgentReport::Broadcast),
        Phase::Optimize => {
            return Err(CoordinationError::UnknownPhase {
                tag: format!("{} (no agent operation)", phase),
            })
        }
    };

    let mut report = raw.map_err(|e| attribute(e, state, phase))?;

    let confidence = report.confidence();
    if !confidence.is_finite() {
        return Err(CoordinationError::AgentExecution {
            agent: state.agent_id.clone(),
            phase,
            reason: format!("malformed {} result: confidence is {}", phase, confidence),
        });
    }
    let clamped = state.update_confidence(confidence);
    report.set_confidence(clamped);

    Ok(report)
}

/// Invoke by phase tag, as received from an untyped caller.
pub fn invoke_tag(
    agent: &dyn Agent,
    tag: &str,
    state: &mut AgentState,
    ctx: &PhaseContext,
) -> PrecogResult<AgentReport> {
    let phase: Phase = tag.parse()?;
    invoke(agent, phase, state, ctx)
}

/// Attribute an agent-side error to the calling agent and phase.
fn attribute(err: CoordinationError, state: &AgentState, phase: Phase) -> CoordinationError {
    match err {
        already @ CoordinationError::AgentExecution { .. } => already,
        other => CoordinationError::AgentExecution {
            agent: state.agent_id.clone(),
            phase,
            reason: other.to_string(),
        },
    }
}
