//! Street Precog: 311 street issues, weather impact, cleanup and repair.

use std::{collections::BTreeMap, sync::Arc};

use serde_json::{json, Value};

use precog_contracts::{
    agent::AgentState,
    error::PrecogResult,
    phase::Phase,
    report::{BroadcastResult, DetectResult, PhaseContext, PredictResult, PreventResult, Priority, Strategy},
};
use precog_core::traits::Agent;

use crate::city_data::{CityDataSource, StreetIssue, StreetIssueKind};

use super::{acknowledge, capped, carried, encode, location, priority_above, rain_probability};

pub struct StreetPrecog {
    data: Arc<dyn CityDataSource>,
}

impl StreetPrecog {
    pub const ID: &'static str = "street-precog";
    pub const NAME: &'static str = "Street Precog";
    pub const DEFAULT_THRESHOLD: f64 = 0.75;

    pub fn new(data: Arc<dyn CityDataSource>) -> Self {
        Self { data }
    }
}

/// Location clusters (more than one report at a spot) plus the fixed
/// rush-hour patterns.
fn detect_patterns(issues: &[StreetIssue]) -> Vec<Value> {
    let mut by_location: BTreeMap<&str, Vec<f64>> = BTreeMap::new();
    for issue in issues {
        by_location.entry(issue.location.as_str()).or_default().push(issue.severity);
    }

    let mut patterns: Vec<Value> = by_location
        .into_iter()
        .filter(|(_, severities)| severities.len() > 1)
        .map(|(location, severities)| {
            let mean = severities.iter().sum::<f64>() / severities.len() as f64;
            json!({ "type": "location_cluster", "location": location, "count": severities.len(), "severity": mean })
        })
        .collect();

    patterns.push(json!({ "type": "time_pattern", "period": "morning_peak", "locations": ["Market St", "Mission St"] }));
    patterns.push(json!({ "type": "time_pattern", "period": "evening_peak", "locations": ["Castro St", "Haight St"] }));
    patterns
}

fn is_gross(issue: &&StreetIssue) -> bool {
    issue.kind == StreetIssueKind::Gross
}

impl Agent for StreetPrecog {
    fn detect(&self, state: &mut AgentState, ctx: &PhaseContext) -> PrecogResult<DetectResult> {
        let issues = self.data.street_issues(&location(ctx))?;
        let patterns = detect_patterns(&issues);

        state.set_flag("reports_processed", json!(issues.len()));
        state.set_flag("patterns_detected", json!(patterns.len()));

        let confidence = capped(0.95, issues.len() as f64 * 0.1 + patterns.len() as f64 * 0.2);
        Ok(DetectResult::new(confidence)
            .with("issues", encode(state, Phase::Detect, &issues)?)
            .with("patterns", Value::Array(patterns))
            .with("rain_probability", json!(rain_probability(ctx))))
    }

    fn predict(&self, state: &mut AgentState, ctx: &PhaseContext) -> PrecogResult<PredictResult> {
        let issues: Vec<StreetIssue> = carried(ctx, state, Phase::Detect, "issues")?;
        let rain: f64 = carried(ctx, state, Phase::Detect, "rain_probability")?;

        let mut predictions = Vec::new();
        if rain > 0.7 {
            for issue in issues.iter().filter(is_gross) {
                predictions.push(json!({
                    "type": "weather_impact",
                    "issue_id": issue.id,
                    "prediction": "Increased severity due to rain",
                }));
            }
        }
        if rain > 0.5 {
            predictions.push(json!({
                "type": "rain_impact",
                "prediction": "Increased trash accumulation in low-lying areas",
                "affected_areas": ["Market St", "Mission St"],
            }));
        }
        let weather_predictions = predictions.len();

        let gross: Vec<&StreetIssue> = issues.iter().filter(is_gross).collect();
        if gross.iter().any(|i| i.location == "Market St") {
            predictions.push(json!({
                "type": "pattern_prediction",
                "location": "Market St",
                "prediction": "Continued trash accumulation pattern",
            }));
        }
        if gross.len() > 2 {
            predictions.push(json!({
                "type": "pattern_prediction",
                "prediction": "Escalating gross issue pattern",
                "affected_areas": gross.iter().map(|i| i.location.as_str()).collect::<Vec<_>>(),
            }));
        }

        state.set_flag("weather_predictions", json!(weather_predictions));

        let confidence = capped(0.9, predictions.len() as f64 * 0.15);
        Ok(PredictResult::new(confidence)
            .with("predictions", Value::Array(predictions))
            .with("issues", encode(state, Phase::Predict, &issues)?))
    }

    fn prevent(&self, state: &mut AgentState, ctx: &PhaseContext) -> PrecogResult<PreventResult> {
        let issues: Vec<StreetIssue> = carried(ctx, state, Phase::Predict, "issues")?;

        let mut result = PreventResult::new(0.0);
        for issue in &issues {
            let strategy = match issue.kind {
                StreetIssueKind::Gross => Strategy::new("outreach", priority_above(issue.severity, 0.7))
                    .with_action("Schedule cleanup crew"),
                StreetIssueKind::Safety => Strategy::new("maintenance", priority_above(issue.severity, 0.7))
                    .with_action("Schedule safety inspection"),
                StreetIssueKind::Accessibility => Strategy::new("maintenance", Priority::Medium)
                    .with_action("Schedule accessibility repair"),
            };
            result = result.with_strategy(strategy.with_target(issue.location.clone()));
        }

        let safety_areas: Vec<&str> = issues
            .iter()
            .filter(|i| i.kind == StreetIssueKind::Safety)
            .map(|i| i.location.as_str())
            .collect();
        if !safety_areas.is_empty() {
            result = result
                .with_strategy(Strategy::new("safety", Priority::High).with_action("Deploy safety patrols"))
                .with("patrol_areas", json!(safety_areas));
        }

        result.confidence = capped(0.85, result.strategies.len() as f64 * 0.2);
        Ok(result)
    }

    fn broadcast(&self, state: &mut AgentState, ctx: &PhaseContext) -> PrecogResult<BroadcastResult> {
        Ok(acknowledge(state, ctx))
    }
}
