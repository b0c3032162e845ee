//! Budget Prophet: funding gaps, trend forecasts, reallocation and grant strategies.

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

use crate::city_data::{BudgetAllocation, CityDataSource};

use super::{acknowledge, capped, carried, encode, location, priority_above};

/// Gaps above this share of the target are worth a grant application.
const GRANT_GAP: f64 = 0.1;
/// Gaps above this share of the target justify moving general-fund money.
const REALLOCATION_GAP: f64 = 0.3;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FundingGap {
    pub category: String,
    pub shortfall: f64,
    /// `shortfall / expected`, at most 1.
    pub severity: f64,
}

fn funding_gaps(allocations: &[BudgetAllocation]) -> Vec<FundingGap> {
    allocations
        .iter()
        .filter_map(|line| {
            let shortfall = line.shortfall()?;
            let expected = line.expected?;
            Some(FundingGap {
                category: line.category.clone(),
                shortfall,
                severity: (shortfall / expected).min(1.0),
            })
        })
        .collect()
}

pub struct BudgetProphet {
    data: Arc<dyn CityDataSource>,
}

impl BudgetProphet {
    pub const ID: &'static str = "budget-prophet";
    pub const NAME: &'static str = "Budget Prophet";
    pub const DEFAULT_THRESHOLD: f64 = 0.8;

    pub fn new(data: Arc<dyn CityDataSource>) -> Self {
        Self { data }
    }
}

impl Agent for BudgetProphet {
    fn detect(&self, state: &mut AgentState, ctx: &PhaseContext) -> PrecogResult<DetectResult> {
        let allocations = self.data.budget_allocations(&location(ctx))?;
        let gaps = funding_gaps(&allocations);

        let total: f64 = allocations.iter().map(|a| a.amount).sum();
        state.set_flag("allocations_reviewed", json!(allocations.len()));
        state.set_flag("funding_gaps", json!(gaps.len()));

        let confidence = capped(0.9, allocations.len() as f64 * 0.1 + gaps.len() as f64 * 0.15);
        Ok(DetectResult::new(confidence)
            .with("allocations", encode(state, Phase::Detect, &allocations)?)
            .with("funding_gaps", encode(state, Phase::Detect, &gaps)?)
            .with("total_allocated", json!(total)))
    }

    fn predict(&self, state: &mut AgentState, ctx: &PhaseContext) -> PrecogResult<PredictResult> {
        let allocations: Vec<BudgetAllocation> = carried(ctx, state, Phase::Detect, "allocations")?;
        let gaps: Vec<FundingGap> = carried(ctx, state, Phase::Detect, "funding_gaps")?;

        let trends: Vec<Value> = allocations
            .iter()
            .map(|line| {
                let trend = match line.shortfall() {
                    Some(_) => "drop",
                    None if line.source == "federal" => "at_risk",
                    None => "stable",
                };
                json!({ "category": line.category, "trend": trend })
            })
            .collect();

        let disparities: Vec<Value> = gaps
            .iter()
            .filter(|g| g.severity > GRANT_GAP)
            .map(|g| json!({ "category": g.category, "severity": g.severity, "shortfall": g.shortfall }))
            .collect();

        let confidence = capped(0.85, trends.len() as f64 * 0.1 + disparities.len() as f64 * 0.15);
        Ok(PredictResult::new(confidence)
            .with("funding_predictions", Value::Array(trends))
            .with("disparities", Value::Array(disparities))
            .with("funding_gaps", encode(state, Phase::Predict, &gaps)?))
    }

    fn prevent(&self, state: &mut AgentState, ctx: &PhaseContext) -> PrecogResult<PreventResult> {
        let gaps: Vec<FundingGap> = carried(ctx, state, Phase::Predict, "funding_gaps")?;

        let mut result = PreventResult::new(0.0);
        let mut reallocations = 0;
        let mut grants = 0;

        for gap in &gaps {
            if gap.severity > REALLOCATION_GAP {
                result = result.with_strategy(
                    Strategy::new("reallocation", Priority::High)
                        .with_target(gap.category.clone())
                        .with_action(format!("Move {:.0} from the general fund", gap.shortfall)),
                );
                reallocations += 1;
            }
            if gap.severity > GRANT_GAP {
                result = result.with_strategy(
                    Strategy::new("federal_grant", priority_above(gap.severity, 0.15))
                        .with_target(gap.category.clone())
                        .with_action("Prepare federal grant application"),
                );
                grants += 1;
            }
        }

        state.set_flag("federal_strategies", json!(grants));

        result.confidence = capped(0.8, reallocations as f64 * 0.15 + grants as f64 * 0.1);
        Ok(result)
    }

    fn broadcast(&self, state: &mut AgentState, ctx: &PhaseContext) -> PrecogResult<BroadcastResult> {
        Ok(acknowledge(state, ctx))
    }
}
