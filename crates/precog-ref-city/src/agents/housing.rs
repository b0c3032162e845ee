//! Housing Oracle: evictions, parcel overlays, rental assistance and SNAP guidance.

use std::sync::Arc;

use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

use precog_contracts::{
    agent::AgentState,
    error::PrecogResult,
    phase::Phase,
    report::{BroadcastResult, DetectResult, PhaseContext, PredictResult, PreventResult, Priority, Strategy},
};
use precog_core::traits::Agent;

use crate::city_data::{CityDataSource, Eviction, EvictionReason, Permit, PermitKind};

use super::{acknowledge, capped, carried, encode, location, priority_above};

/// Zoning district assumed for every parcel in the simulated overlay.
const ZONING_DISTRICT: &str = "RM-2";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ParcelIssueKind {
    ZoningViolation,
    DevelopmentOpportunity,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ParcelIssue {
    pub address: String,
    pub kind: ParcelIssueKind,
    pub severity: f64,
    pub zoning_district: String,
}

/// Overlay evictions and permits onto the parcel map.
///
/// The simulated overlay flags every Market St parcel as out of compliance;
/// pending or approved new construction is a development opportunity.
fn parcel_issues(evictions: &[Eviction], permits: &[Permit]) -> Vec<ParcelIssue> {
    let violations = evictions
        .iter()
        .filter(|e| e.address.contains("Market"))
        .map(|e| ParcelIssue {
            address: e.address.clone(),
            kind: ParcelIssueKind::ZoningViolation,
            severity: 0.8,
            zoning_district: ZONING_DISTRICT.to_string(),
        });

    let opportunities = permits
        .iter()
        .filter(|p| p.kind == PermitKind::NewConstruction)
        .map(|p| ParcelIssue {
            address: p.address.clone(),
            kind: ParcelIssueKind::DevelopmentOpportunity,
            severity: 0.7,
            zoning_district: ZONING_DISTRICT.to_string(),
        });

    violations.chain(opportunities).collect()
}

pub struct HousingOracle {
    data: Arc<dyn CityDataSource>,
}

impl HousingOracle {
    pub const ID: &'static str = "housing-oracle";
    pub const NAME: &'static str = "Housing Oracle";
    pub const DEFAULT_THRESHOLD: f64 = 0.8;

    pub fn new(data: Arc<dyn CityDataSource>) -> Self {
        Self { data }
    }
}

impl Agent for HousingOracle {
    fn detect(&self, state: &mut AgentState, ctx: &PhaseContext) -> PrecogResult<DetectResult> {
        let location = location(ctx);
        let evictions = self.data.evictions(&location)?;
        let permits = self.data.permits(&location)?;
        let parcels = parcel_issues(&evictions, &permits);

        state.set_flag("parcel_analysis", json!(parcels.len()));

        let confidence = capped(0.9, evictions.len() as f64 * 0.1 + parcels.len() as f64 * 0.2);
        Ok(DetectResult::new(confidence)
            .with("evictions", encode(state, Phase::Detect, &evictions)?)
            .with("permits", encode(state, Phase::Detect, &permits)?)
            .with("parcel_issues", encode(state, Phase::Detect, &parcels)?))
    }

    fn predict(&self, state: &mut AgentState, ctx: &PhaseContext) -> PrecogResult<PredictResult> {
        let evictions: Vec<Eviction> = carried(ctx, state, Phase::Detect, "evictions")?;
        let parcels: Vec<ParcelIssue> = carried(ctx, state, Phase::Detect, "parcel_issues")?;

        let mut risks: Vec<Value> = evictions
            .iter()
            .filter(|e| e.severity > 0.7)
            .map(|e| json!({ "type": "eviction_risk", "address": e.address, "risk": e.severity }))
            .collect();

        let zoning_risks = parcels
            .iter()
            .filter(|p| p.kind == ParcelIssueKind::ZoningViolation)
            .count();
        risks.extend(
            parcels
                .iter()
                .filter(|p| p.kind == ParcelIssueKind::ZoningViolation)
                .map(|p| json!({ "type": "zoning_risk", "address": p.address, "district": p.zoning_district })),
        );

        if evictions.len() > 2 {
            risks.push(json!({
                "type": "affordability_trend",
                "prediction": "Displacement pressure rising across eviction filings",
            }));
        }

        state.set_flag("zoning_risks", json!(zoning_risks));

        let confidence = capped(0.85, risks.len() as f64 * 0.15);
        Ok(PredictResult::new(confidence)
            .with("risk_predictions", Value::Array(risks))
            .with("evictions", encode(state, Phase::Predict, &evictions)?)
            .with("parcel_issues", encode(state, Phase::Predict, &parcels)?))
    }

    fn prevent(&self, state: &mut AgentState, ctx: &PhaseContext) -> PrecogResult<PreventResult> {
        let evictions: Vec<Eviction> = carried(ctx, state, Phase::Predict, "evictions")?;
        let parcels: Vec<ParcelIssue> = carried(ctx, state, Phase::Predict, "parcel_issues")?;

        let mut result = PreventResult::new(0.0);

        for eviction in evictions.iter().filter(|e| e.reason == EvictionReason::NonPayment) {
            result = result.with_strategy(
                Strategy::new("assistance", priority_above(eviction.severity, 0.7))
                    .with_target(eviction.address.clone())
                    .with_action("Provide rental assistance"),
            );
        }

        let mut snap_guidance = 0;
        for eviction in &evictions {
            let steps = [
                ("SNAP eligibility verification", priority_above(eviction.severity, 0.7)),
                ("Monthly benefit calculation", Priority::Medium),
                ("Application process guidance", Priority::Medium),
            ];
            for (action, priority) in steps {
                result = result.with_strategy(
                    Strategy::new("snap_guidance", priority)
                        .with_target(eviction.address.clone())
                        .with_action(action),
                );
                snap_guidance += 1;
            }
        }

        for parcel in parcels.iter().filter(|p| p.kind == ParcelIssueKind::ZoningViolation) {
            result = result.with_strategy(
                Strategy::new("zoning", priority_above(parcel.severity, 0.7))
                    .with_target(parcel.address.clone())
                    .with_action("Zoning compliance assistance"),
            );
        }

        state.set_flag("snap_guidance", json!(snap_guidance));

        result.confidence = capped(0.8, result.strategies.len() as f64 * 0.15);
        Ok(result)
    }

    fn broadcast(&self, state: &mut AgentState, ctx: &PhaseContext) -> PrecogResult<BroadcastResult> {
        Ok(acknowledge(state, ctx))
    }
}
