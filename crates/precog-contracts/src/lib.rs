//! # precog-contracts
//!
//! Shared types, results, and error contracts for the Precog coordination
//! pipeline.
//!
//! All crates in the workspace import from here. No business logic lives in
//! this crate: only data definitions, small invariant-preserving helpers,
//! and error types.

pub mod agent;
pub mod coordination;
pub mod error;
pub mod phase;
pub mod report;
pub mod roi;

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;
    use agent::{AgentId, AgentState, RunId};
    use error::CoordinationError;
    use phase::{Phase, SchedulerState};
    use report::{AgentReport, DetectResult, PreventResult, Priority, ScenarioInput, Strategy};
    use roi::{OptimizationResult, OptimizationStatus};

    // ── AgentState ───────────────────────────────────────────────────────────

    #[test]
    fn confidence_is_clamped_on_every_update() {
        let mut state = AgentState::new(AgentId::new("street-precog"), "Street Precog", 0.75);

        assert_eq!(state.update_confidence(1.7), 1.0);
        assert_eq!(state.update_confidence(-0.2), 0.0);
        assert_eq!(state.update_confidence(f64::NAN), 0.0);
        assert_eq!(state.update_confidence(0.42), 0.42);
        assert_eq!(state.confidence(), 0.42);
    }

    #[test]
    fn threshold_is_clamped_and_compared_inclusively() {
        let mut state = AgentState::new(AgentId::new("crisis-sage"), "Crisis Sage", 3.0);
        assert_eq!(state.threshold(), 1.0);

        state.set_threshold(0.85);
        state.update_confidence(0.85);
        assert!(state.meets_threshold());

        state.update_confidence(0.84);
        assert!(!state.meets_threshold());
    }

    #[test]
    fn status_snapshot_carries_flags() {
        let mut state = AgentState::new(AgentId::new("housing-oracle"), "Housing Oracle", 0.8);
        state.set_flag("snap_guidance", json!(3));
        state.update_confidence(0.9);

        let status = state.status();
        assert_eq!(status.agent_id, AgentId::new("housing-oracle"));
        assert!(status.threshold_met);
        assert_eq!(status.flags.get("snap_guidance"), Some(&json!(3)));
    }

    // ── Phase and SchedulerState ─────────────────────────────────────────────

    #[test]
    fn phase_parses_every_tag_and_rejects_others() {
        for phase in Phase::ORDER {
            assert_eq!(phase.as_str().parse::<Phase>().unwrap(), phase);
        }

        match "optimise".parse::<Phase>() {
            Err(CoordinationError::UnknownPhase { tag }) => assert_eq!(tag, "optimise"),
            other => panic!("expected UnknownPhase, got {:?}", other),
        }
    }

    #[test]
    fn scheduler_states_advance_in_fixed_order() {
        let mut state = SchedulerState::Init;
        let mut visited = vec![state];
        while !state.is_terminal() {
            state = state.advance().unwrap();
            visited.push(state);
        }

        assert_eq!(
            visited,
            vec![
                SchedulerState::Init,
                SchedulerState::Detecting,
                SchedulerState::Predicting,
                SchedulerState::Preventing,
                SchedulerState::Optimizing,
                SchedulerState::Broadcasting,
                SchedulerState::Done,
            ]
        );
    }

    #[test]
    fn abort_is_legal_only_from_non_terminal_states() {
        assert_eq!(SchedulerState::Init.abort().unwrap(), SchedulerState::Aborted);
        assert_eq!(SchedulerState::Optimizing.abort().unwrap(), SchedulerState::Aborted);
        assert!(SchedulerState::Done.abort().is_err());
        assert!(SchedulerState::Aborted.advance().is_err());
    }

    // ── Results ──────────────────────────────────────────────────────────────

    #[test]
    fn payload_without_confidence_is_malformed() {
        let agent = AgentId::new("budget-prophet");
        let err = DetectResult::from_payload(&agent, Phase::Detect, json!({ "gaps": [] }))
            .unwrap_err();

        match err {
            CoordinationError::AgentExecution { agent: a, phase, reason } => {
                assert_eq!(a, agent);
                assert_eq!(phase, Phase::Detect);
                assert!(reason.contains("confidence"), "reason: {reason}");
            }
            other => panic!("expected AgentExecution, got {:?}", other),
        }
    }

    #[test]
    fn prevent_payload_keeps_extensions_beside_strategies() {
        let agent = AgentId::new("street-precog");
        let result = PreventResult::from_payload(
            &agent,
            Phase::Prevent,
            json!({
                "confidence": 0.6,
                "strategies": [{ "type": "outreach", "target": "Market St", "priority": "high" }],
                "crew_hours": 12
            }),
        )
        .unwrap();

        assert_eq!(result.strategies.len(), 1);
        assert_eq!(result.strategies[0].priority, Priority::High);
        assert_eq!(result.extensions.get("crew_hours"), Some(&json!(12)));

        let output = AgentReport::Prevent(result).to_output_map();
        assert_eq!(output["confidence"], json!(0.6));
        assert_eq!(output["strategies"][0]["type"], json!("outreach"));
    }

    #[test]
    fn strategies_are_empty_outside_prevent() {
        let report = AgentReport::Detect(DetectResult::new(0.5).with("issues", json!([1, 2])));
        assert!(report.strategies().is_empty());

        let prevent = AgentReport::Prevent(
            PreventResult::new(0.5).with_strategy(Strategy::new("safety", Priority::High)),
        );
        assert_eq!(prevent.strategies().len(), 1);
    }

    #[test]
    fn scenario_context_exposes_location_and_weather() {
        let scenario = ScenarioInput::new("San Francisco")
            .with_weather("rain_probability", json!(0.3))
            .with_parameter("scenario", json!("street-maintenance"));

        let ctx = scenario.to_context();
        assert_eq!(ctx.get("location"), Some(&json!("San Francisco")));
        assert_eq!(ctx.get("weather").unwrap()["rain_probability"], json!(0.3));
        assert_eq!(ctx.get("scenario"), Some(&json!("street-maintenance")));
    }

    #[test]
    fn empty_optimization_reports_zero_roi() {
        let result = OptimizationResult::empty(1_000_000.0, OptimizationStatus::NoCandidates);
        assert_eq!(result.roi(), 0.0);
        assert_eq!(result.total_cost, 0.0);
    }

    // ── RunId ────────────────────────────────────────────────────────────────

    #[test]
    fn run_id_new_produces_unique_values() {
        let ids: std::collections::HashSet<String> =
            (0..100).map(|_| RunId::new().to_string()).collect();
        assert_eq!(ids.len(), 100);
    }

    // ── CoordinationError display messages ───────────────────────────────────

    #[test]
    fn error_agent_execution_display() {
        let err = CoordinationError::AgentExecution {
            agent: AgentId::new("crisis-sage"),
            phase: Phase::Predict,
            reason: "feed unavailable".to_string(),
        };
        let msg = err.to_string();
        assert!(msg.contains("crisis-sage"));
        assert!(msg.contains("predict"));
        assert!(msg.contains("feed unavailable"));
    }

    #[test]
    fn error_aborted_carries_phase_agent_and_cause() {
        let err = CoordinationError::AgentTimeout {
            agent: AgentId::new("street-precog"),
            phase: Phase::Detect,
            elapsed_ms: 250,
            limit_ms: 100,
        }
        .abort_in(Phase::Detect);

        assert_eq!(err.agent(), Some(&AgentId::new("street-precog")));
        let msg = err.to_string();
        assert!(msg.contains("coordination aborted in detect"));
        assert!(msg.contains("street-precog"));
        assert!(msg.contains("100 ms"));
    }

    #[test]
    fn abort_in_does_not_double_wrap() {
        let err = CoordinationError::InfeasibleOptimization { reason: "negative budget".to_string() }
            .abort_in(Phase::Optimize)
            .abort_in(Phase::Broadcast);

        match err {
            CoordinationError::Aborted { phase, agent, .. } => {
                assert_eq!(phase, Phase::Optimize);
                assert!(agent.is_none());
            }
            other => panic!("expected Aborted, got {:?}", other),
        }
    }

    #[test]
    fn error_config_error_display() {
        let err = CoordinationError::ConfigError { reason: "missing budget".to_string() };
        let msg = err.to_string();
        assert!(msg.contains("configuration error"));
        assert!(msg.contains("missing budget"));
    }
}
