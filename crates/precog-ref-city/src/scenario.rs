//! Wiring the civic agents into a coordination run.
//!
//!   city data ─► four agents ─► AgentRegistry ─► PhaseScheduler ─► CoordinationResult
//!
//! Thresholds come from `[agents.<id>]` in the configuration, falling back
//! to each agent's own default. The funding table and coordination settings
//! come from the same configuration.

use std::sync::Arc;

use serde_json::json;
use tracing::info;

use precog_config::PrecogConfig;
use precog_contracts::{
    agent::{AgentId, AgentStatus},
    coordination::CoordinationResult,
    error::PrecogResult,
    report::ScenarioInput,
};
use precog_core::{
    traits::{Agent, RunJournal},
    AgentRegistry, PhaseScheduler,
};

use crate::{
    agents::{BudgetProphet, CrisisSage, HousingOracle, StreetPrecog},
    city_data::CityDataSource,
};

/// The outcome of one city run: the full result plus each agent's status
/// after Broadcast.
#[derive(Debug, Clone)]
pub struct CityRun {
    pub result: CoordinationResult,
    pub status: Vec<AgentStatus>,
}

/// Register the four reference agents, in pipeline order, over `data`.
pub fn build_registry(config: &PrecogConfig, data: Arc<dyn CityDataSource>) -> PrecogResult<AgentRegistry> {
    let agents: [(&str, &str, f64, Box<dyn Agent>); 4] = [
        (
            StreetPrecog::ID,
            StreetPrecog::NAME,
            StreetPrecog::DEFAULT_THRESHOLD,
            Box::new(StreetPrecog::new(Arc::clone(&data))),
        ),
        (
            HousingOracle::ID,
            HousingOracle::NAME,
            HousingOracle::DEFAULT_THRESHOLD,
            Box::new(HousingOracle::new(Arc::clone(&data))),
        ),
        (
            BudgetProphet::ID,
            BudgetProphet::NAME,
            BudgetProphet::DEFAULT_THRESHOLD,
            Box::new(BudgetProphet::new(Arc::clone(&data))),
        ),
        (
            CrisisSage::ID,
            CrisisSage::NAME,
            CrisisSage::DEFAULT_THRESHOLD,
            Box::new(CrisisSage::new(data)),
        ),
    ];

    let mut registry = AgentRegistry::new();
    for (id, name, default_threshold, agent) in agents {
        let id = AgentId::new(id);
        let threshold = config.threshold_for(&id).unwrap_or(default_threshold);
        registry.register(id, name, threshold, agent)?;
    }
    Ok(registry)
}

/// A scenario for `location` with the given chance of rain.
pub fn city_scenario(location: impl Into<String>, rain_probability: f64) -> ScenarioInput {
    ScenarioInput::new(location).with_weather("rain_probability", json!(rain_probability))
}

/// Run the full pipeline over the reference agents.
///
/// `journal` receives every scheduler transition; pass a clone of an
/// `InMemoryRunJournal` to inspect it afterwards.
pub fn run(
    config: &PrecogConfig,
    data: Arc<dyn CityDataSource>,
    scenario: &ScenarioInput,
    journal: Box<dyn RunJournal>,
) -> PrecogResult<CityRun> {
    let mut registry = build_registry(config, data)?;
    let scheduler = PhaseScheduler::new(
        config.settings().clone(),
        Box::new(config.funding_simulator()),
        journal,
    );

    let result = scheduler.run_coordination(&mut registry, scenario)?;
    let status = registry.status();

    info!(
        location = %scenario.location,
        agents_over_threshold = status.iter().filter(|s| s.threshold_met).count(),
        "city run complete"
    );

    Ok(CityRun { result, status })
}
