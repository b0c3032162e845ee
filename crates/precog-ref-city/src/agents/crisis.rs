//! Crisis Sage: emergency events, escalation forecasts, coordinated response.

use std::sync::Arc;

use serde_json::{json, Value};

use precog_contracts::{
    agent::AgentState,
    error::PrecogResult,
    phase::Phase,
    report::{BroadcastResult, DetectResult, PhaseContext, PredictResult, PreventResult, Priority, Strategy},
};
use precog_core::traits::Agent;

use crate::city_data::{CityDataSource, CrisisEvent, CrisisKind};

use super::{acknowledge, capped, carried, encode, location, priority_above};

/// Events above this severity are expected to escalate.
const ESCALATION_SEVERITY: f64 = 0.7;

fn responders(kind: CrisisKind) -> &'static [&'static str] {
    match kind {
        CrisisKind::Medical => &["ambulance", "mental_health"],
        CrisisKind::Safety => &["fire", "police"],
        CrisisKind::Infrastructure => &["utilities", "communications"],
    }
}

fn escalating(events: &[CrisisEvent]) -> impl Iterator<Item = &CrisisEvent> {
    events.iter().filter(|e| e.severity > ESCALATION_SEVERITY)
}

pub struct CrisisSage {
    data: Arc<dyn CityDataSource>,
}

impl CrisisSage {
    pub const ID: &'static str = "crisis-sage";
    pub const NAME: &'static str = "Crisis Sage";
    pub const DEFAULT_THRESHOLD: f64 = 0.85;

    pub fn new(data: Arc<dyn CityDataSource>) -> Self {
        Self { data }
    }
}

impl Agent for CrisisSage {
    fn detect(&self, state: &mut AgentState, ctx: &PhaseContext) -> PrecogResult<DetectResult> {
        let events = self.data.crisis_events(&location(ctx))?;
        let patterns = escalating(&events).count();

        let coordination: Vec<Value> = events
            .iter()
            .map(|e| json!({ "event_id": e.id, "location": e.location, "responders": responders(e.kind) }))
            .collect();

        state.set_flag("coordinated_responses", json!(coordination.len()));

        let confidence = capped(0.9, events.len() as f64 * 0.1 + patterns as f64 * 0.2);
        Ok(DetectResult::new(confidence)
            .with("crisis_events", encode(state, Phase::Detect, &events)?)
            .with("escalation_patterns", json!(patterns))
            .with("response_coordination", Value::Array(coordination)))
    }

    fn predict(&self, state: &mut AgentState, ctx: &PhaseContext) -> PrecogResult<PredictResult> {
        let events: Vec<CrisisEvent> = carried(ctx, state, Phase::Detect, "crisis_events")?;

        let escalations: Vec<String> = escalating(&events).map(|e| e.location.clone()).collect();

        let mut kinds: Vec<CrisisKind> = Vec::new();
        for event in &events {
            if !kinds.contains(&event.kind) {
                kinds.push(event.kind);
            }
        }
        let resource_needs: Vec<Value> = kinds
            .iter()
            .map(|k| json!({ "kind": k, "responders": responders(*k) }))
            .collect();

        let confidence = capped(0.85, (escalations.len() + resource_needs.len()) as f64 * 0.15);
        Ok(PredictResult::new(confidence)
            .with("escalation_areas", json!(escalations))
            .with("resource_needs", Value::Array(resource_needs))
            .with("crisis_events", encode(state, Phase::Predict, &events)?))
    }

    fn prevent(&self, state: &mut AgentState, ctx: &PhaseContext) -> PrecogResult<PreventResult> {
        let events: Vec<CrisisEvent> = carried(ctx, state, Phase::Predict, "crisis_events")?;
        let escalation_areas: Vec<String> = carried(ctx, state, Phase::Predict, "escalation_areas")?;

        let mut result = PreventResult::new(0.0);

        for event in &events {
            let (action, priority) = match event.kind {
                CrisisKind::Medical => ("Deploy medical response teams", priority_above(event.severity, 0.7)),
                CrisisKind::Safety => ("Deploy safety patrols", Priority::High),
                CrisisKind::Infrastructure => {
                    ("Infrastructure maintenance check", priority_above(event.severity, 0.8))
                }
            };
            result = result.with_strategy(
                Strategy::new("crisis_prevention", priority)
                    .with_target(event.location.clone())
                    .with_action(action),
            );
        }

        let mut holistic = 0;
        if events.len() > 2 {
            result = result.with_strategy(
                Strategy::new("holistic_coordination", Priority::High)
                    .with_action("Establish cross-agency crisis response protocol"),
            );
            holistic += 1;
        }
        for area in &escalation_areas {
            result = result.with_strategy(
                Strategy::new("holistic_coordination", Priority::High)
                    .with_target(area.clone())
                    .with_action("Deploy escalation prevention teams"),
            );
            holistic += 1;
        }

        for (kind, label) in [(CrisisKind::Medical, "medical"), (CrisisKind::Safety, "safety")] {
            if events.iter().any(|e| e.kind == kind) {
                result = result.with_strategy(
                    Strategy::new("resource_allocation", Priority::High)
                        .with_target(label)
                        .with_action(format!("Increase {} response capacity", label)),
                );
            }
        }

        state.set_flag("holistic_strategies", json!(holistic));

        result.confidence = capped(0.8, result.strategies.len() as f64 * 0.15);
        Ok(result)
    }

    fn broadcast(&self, state: &mut AgentState, ctx: &PhaseContext) -> PrecogResult<BroadcastResult> {
        Ok(acknowledge(state, ctx))
    }
}
