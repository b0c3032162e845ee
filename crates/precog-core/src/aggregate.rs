//! Cross-agent aggregation between phases.
//!
//! Context keys are `<agent-id>_<phase-key>` (e.g. `street-precog_detection`)
//! holding that agent's full output map. Contexts are rebuilt from scratch
//! for every phase and never mutated after being handed to agents.

use serde_json::{Map, Value};

use precog_contracts::{
    error::{CoordinationError, PrecogResult},
    report::{PhaseContext, PhaseResult},
    roi::OptimizationReport,
};

/// Builds the context consumed by the next phase.
pub struct PhaseContextAggregator;

impl PhaseContextAggregator {
    /// Merge every agent's output from `result` into a fresh context.
    pub fn aggregate(result: &PhaseResult) -> PhaseContext {
        let entries: Map<String, Value> = result
            .outcomes
            .iter()
            .map(|o| {
                (
                    format!("{}_{}", o.agent, result.phase.context_key()),
                    Value::Object(o.report.to_output_map()),
                )
            })
            .collect();
        PhaseContext::from_map(entries)
    }

    /// The context for the Broadcast phase: the three agent-phase results,
    /// the optimization report, and the run's total ROI.
    pub fn broadcast_context(
        detection: &PhaseResult,
        prediction: &PhaseResult,
        prevention: &PhaseResult,
        optimization: &OptimizationReport,
        total_roi: f64,
    ) -> PrecogResult<PhaseContext> {
        let mut entries = Map::new();
        for result in [detection, prediction, prevention] {
            entries.insert(result.phase.context_key().to_string(), result.to_value());
        }

        let mut report = serde_json::to_value(optimization).map_err(|e| {
            CoordinationError::StateMachine {
                reason: format!("failed to encode optimization report: {}", e),
            }
        })?;
        if let Value::Object(map) = &mut report {
            map.insert("total_roi".to_string(), Value::from(total_roi));
        }
        entries.insert("roi_optimization".to_string(), report);

        Ok(PhaseContext::from_map(entries))
    }
}
