//! # precog-ref-city
//!
//! Civic reference agents for the Precog coordination pipeline.
//!
//! Four agents cover one city scenario end to end:
//!
//! 1. **Street Precog**: 311 street reports, weather impact, cleanup crews.
//! 2. **Housing Oracle**: evictions, parcel overlays, rental assistance and SNAP guidance.
//! 3. **Budget Prophet**: budget gaps, trend forecasts, grant applications.
//! 4. **Crisis Sage**: emergency events, escalation forecasts, coordinated response.
//!
//! All data is fictional and comes from an injected `CityDataSource`.

pub mod agents;
pub mod city_data;
pub mod scenario;

pub use city_data::{CityDataSource, SeededCityData, StaticCityData};
pub use scenario::{build_registry, city_scenario, run, CityRun};

// ── Tests ─────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use serde_json::json;

    use precog_config::PrecogConfig;
    use precog_contracts::{
        agent::AgentId,
        error::{CoordinationError, PrecogResult},
        phase::{Phase, SchedulerState},
    };
    use precog_core::traits::NullJournal;
    use precog_journal::InMemoryRunJournal;

    use crate::{
        build_registry,
        city_data::{
            BudgetAllocation, CityDataSource, CrisisEvent, Eviction, Permit, StaticCityData, StreetIssue,
        },
        city_scenario, run, SeededCityData,
    };

    // ── Helpers ───────────────────────────────────────────────────────────────

    fn config() -> PrecogConfig {
        PrecogConfig::builtin().unwrap()
    }

    fn static_data() -> Arc<dyn CityDataSource> {
        Arc::new(StaticCityData)
    }

    /// Static fixtures, except the crisis feed is down.
    struct CrisisFeedDown;

    impl CityDataSource for CrisisFeedDown {
        fn street_issues(&self, location: &str) -> PrecogResult<Vec<StreetIssue>> {
            StaticCityData.street_issues(location)
        }
        fn evictions(&self, location: &str) -> PrecogResult<Vec<Eviction>> {
            StaticCityData.evictions(location)
        }
        fn permits(&self, location: &str) -> PrecogResult<Vec<Permit>> {
            StaticCityData.permits(location)
        }
        fn budget_allocations(&self, location: &str) -> PrecogResult<Vec<BudgetAllocation>> {
            StaticCityData.budget_allocations(location)
        }
        fn crisis_events(&self, _location: &str) -> PrecogResult<Vec<CrisisEvent>> {
            Err(CoordinationError::ConfigError {
                reason: "dispatch feed unreachable".to_string(),
            })
        }
    }

    // ── Registry ──────────────────────────────────────────────────────────────

    #[test]
    fn test_registry_uses_configured_thresholds() {
        let registry = build_registry(&config(), static_data()).unwrap();

        let ids: Vec<&str> = registry.ids().map(|id| id.as_str()).collect();
        assert_eq!(ids, vec!["street-precog", "housing-oracle", "budget-prophet", "crisis-sage"]);

        let threshold = |id: &str| registry.state(&AgentId::new(id)).unwrap().threshold();
        assert_eq!(threshold("street-precog"), 0.75);
        assert_eq!(threshold("housing-oracle"), 0.8);
        assert_eq!(threshold("budget-prophet"), 0.8);
        assert_eq!(threshold("crisis-sage"), 0.85);
    }

    #[test]
    fn test_registry_override_and_fallback() {
        let config = PrecogConfig::from_toml_str("[agents.crisis-sage]\nthreshold = 0.5\n").unwrap();
        let registry = build_registry(&config, static_data()).unwrap();

        assert_eq!(registry.state(&AgentId::new("crisis-sage")).unwrap().threshold(), 0.5);
        assert_eq!(registry.state(&AgentId::new("street-precog")).unwrap().threshold(), 0.75);
    }

    // ── End-to-end ────────────────────────────────────────────────────────────

    /// The default configuration over static fixtures: 27 proposals, ten
    /// affordable, all funded at the mean multiplier.
    #[test]
    fn test_end_to_end_static_run() {
        let run = run(&config(), static_data(), &city_scenario("San Francisco", 0.3), Box::new(NullJournal))
            .unwrap();
        let result = &run.result;

        assert_eq!(result.phases(), Phase::ORDER);
        assert_eq!(result.optimization.roi_calculations.len(), 27);

        let opt = &result.optimization.result;
        assert_eq!(opt.selected_indices, (0..10).collect::<Vec<_>>());
        assert_eq!(opt.total_cost, 1_000_000.0);
        assert!(opt.total_cost <= opt.budget);

        let multiplier = (2.5 + 3.0 + 2.8) / 3.0;
        assert!((result.total_roi - 2.5 * multiplier).abs() < 1e-9, "total_roi = {}", result.total_roi);
        assert!(result.optimization.roi_calculations.iter().all(|c| c.funding_applied));
    }

    #[test]
    fn test_every_phase_reports_bounded_confidence() {
        let run = run(&config(), static_data(), &city_scenario("San Francisco", 0.9), Box::new(NullJournal))
            .unwrap();

        for phase in run.result.agent_phases() {
            assert_eq!(phase.len(), 4);
            for outcome in &phase.outcomes {
                let c = outcome.report.confidence();
                assert!((0.0..=1.0).contains(&c), "{} {} = {}", outcome.agent, phase.phase, c);
            }
        }
        for status in &run.status {
            assert!((0.0..=1.0).contains(&status.confidence));
        }
    }

    /// Broadcast sees all four sections and each agent learns how many of
    /// its proposals were funded.
    #[test]
    fn test_broadcast_acknowledges_funding() {
        let run = run(&config(), static_data(), &city_scenario("San Francisco", 0.3), Box::new(NullJournal))
            .unwrap();

        for outcome in &run.result.broadcast.outcomes {
            assert_eq!(outcome.report.extensions().get("sections_received"), Some(&json!(4)));
        }

        let funded = |id: &str| {
            run.status
                .iter()
                .find(|s| s.agent_id.as_str() == id)
                .and_then(|s| s.flags.get("strategies_funded").cloned())
        };
        assert_eq!(funded("street-precog"), Some(json!(5)));
        assert_eq!(funded("housing-oracle"), Some(json!(5)));
        assert_eq!(funded("crisis-sage"), Some(json!(0)));
    }

    #[test]
    fn test_rain_raises_street_predictions() {
        let dry = run(&config(), static_data(), &city_scenario("San Francisco", 0.1), Box::new(NullJournal))
            .unwrap();
        let wet = run(&config(), static_data(), &city_scenario("San Francisco", 0.9), Box::new(NullJournal))
            .unwrap();

        let street = AgentId::new("street-precog");
        let count = |r: &crate::CityRun| {
            r.result.prediction.get(&street).unwrap().extensions()["predictions"]
                .as_array()
                .unwrap()
                .len()
        };
        assert!(count(&wet) > count(&dry));
    }

    #[test]
    fn test_tight_budget_funds_first_proposal() {
        let config = config().with_total_budget(150_000.0).unwrap();
        let run = run(&config, static_data(), &city_scenario("San Francisco", 0.3), Box::new(NullJournal))
            .unwrap();

        let opt = &run.result.optimization.result;
        assert_eq!(opt.selected.len(), 1);
        assert_eq!(opt.selected[0].agent, AgentId::new("street-precog"));
        assert_eq!(opt.selected[0].strategy, "outreach");
    }

    #[test]
    fn test_zero_budget_selects_nothing() {
        let config = config().with_total_budget(0.0).unwrap();
        let run = run(&config, static_data(), &city_scenario("San Francisco", 0.3), Box::new(NullJournal))
            .unwrap();

        assert!(run.result.optimization.result.selected.is_empty());
        assert_eq!(run.result.total_roi, 0.0);
    }

    #[test]
    fn test_seeded_runs_are_reproducible() {
        let once = |seed| {
            let data: Arc<dyn CityDataSource> = Arc::new(SeededCityData::new(seed));
            let run = run(&config(), data, &city_scenario("Oakland", 0.6), Box::new(NullJournal)).unwrap();
            serde_json::to_string(&run.result).unwrap()
        };
        assert_eq!(once(11), once(11));
    }

    // ── Journal ───────────────────────────────────────────────────────────────

    #[test]
    fn test_journal_chain_for_complete_run() {
        let journal = InMemoryRunJournal::new();
        run(&config(), static_data(), &city_scenario("San Francisco", 0.3), Box::new(journal.clone()))
            .unwrap();

        let log = journal.export_log();
        assert_eq!(log.entries.len(), 6);
        assert_eq!(log.entries.last().unwrap().transition.to, SchedulerState::Done);
        assert_eq!(log.finalized_runs.len(), 1);
        assert!(journal.verify_integrity());
    }

    #[test]
    fn test_data_source_failure_aborts_in_detect() {
        let journal = InMemoryRunJournal::new();
        let err = run(
            &config(),
            Arc::new(CrisisFeedDown),
            &city_scenario("San Francisco", 0.3),
            Box::new(journal.clone()),
        )
        .unwrap_err();

        match err {
            CoordinationError::Aborted { phase, agent, cause } => {
                assert_eq!(phase, Phase::Detect);
                assert_eq!(agent, Some(AgentId::new("crisis-sage")));
                assert!(cause.to_string().contains("dispatch feed unreachable"));
            }
            other => panic!("expected Aborted, got {:?}", other),
        }

        let log = journal.export_log();
        assert_eq!(log.entries.last().unwrap().transition.to, SchedulerState::Aborted);
        assert!(log.finalized_runs.is_empty());
        assert!(journal.verify_integrity());
    }
}
