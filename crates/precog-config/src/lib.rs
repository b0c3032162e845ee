//! # precog-config
//!
//! TOML configuration for the Precog runtime.
//!
//! ## Quick start
//!
//! ```rust,ignore
//! use std::path::Path;
//! use precog_config::PrecogConfig;
//!
//! let config = PrecogConfig::from_file(Path::new("config/precog.toml"))?;
//! ```
//!
//! ## Sections
//!
//! - `[coordination]`: budget, per-strategy cost and benefit, parallelism, call limit
//! - `[agents.<id>]`: confidence threshold per agent
//! - `[[funding]]`: funding programs scaling strategy benefits

pub mod document;
pub mod loader;

pub use document::{AgentSection, ConfigDocument};
pub use loader::{PrecogConfig, DEFAULT_CONFIG_TOML};

// ── Tests ─────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use std::path::Path;

    use precog_contracts::{
        agent::AgentId, coordination::CoordinationSettings, error::CoordinationError,
    };

    use crate::PrecogConfig;

    fn config_error(result: Result<PrecogConfig, CoordinationError>) -> String {
        match result {
            Err(CoordinationError::ConfigError { reason }) => reason,
            other => panic!("expected ConfigError, got {:?}", other),
        }
    }

    // ── 1. built-in document ─────────────────────────────────────────────────

    #[test]
    fn test_builtin_reproduces_reference_constants() {
        let config = PrecogConfig::builtin().unwrap();

        assert_eq!(config.settings(), &CoordinationSettings::default());
        assert_eq!(config.threshold_for(&AgentId::new("street-precog")), Some(0.75));
        assert_eq!(config.threshold_for(&AgentId::new("housing-oracle")), Some(0.8));
        assert_eq!(config.threshold_for(&AgentId::new("budget-prophet")), Some(0.8));
        assert_eq!(config.threshold_for(&AgentId::new("crisis-sage")), Some(0.85));

        let multipliers: Vec<f64> = config.funding().iter().map(|f| f.roi_multiplier).collect();
        assert_eq!(multipliers, vec![2.5, 3.0, 2.8]);
        assert!(config.funding().iter().all(|f| f.probability == 0.7));
        assert_eq!(config.funding_simulator().total_potential_funding(), 48_000_000.0);
    }

    // ── 2. sections are optional ─────────────────────────────────────────────

    #[test]
    fn test_empty_document_uses_defaults_without_funding() {
        let config = PrecogConfig::from_toml_str("").unwrap();

        assert_eq!(config.settings(), &CoordinationSettings::default());
        assert!(config.funding().is_empty());
        assert_eq!(config.threshold_for(&AgentId::new("street-precog")), None);
        assert_eq!(config.funding_simulator().average_roi_multiplier(), 1.0);
    }

    #[test]
    fn test_partial_coordination_section() {
        let toml = r#"
            [coordination]
            total_budget = 250000.0
            parallel_agents = false
            agent_timeout_ms = 1500
        "#;

        let config = PrecogConfig::from_toml_str(toml).unwrap();
        let settings = config.settings();
        assert_eq!(settings.total_budget, 250_000.0);
        assert_eq!(settings.base_strategy_cost, CoordinationSettings::DEFAULT_STRATEGY_COST);
        assert!(!settings.parallel_agents);
        assert_eq!(settings.agent_timeout_ms, Some(1500));
    }

    // ── 3. validation ────────────────────────────────────────────────────────

    #[test]
    fn test_negative_budget_rejected() {
        let reason = config_error(PrecogConfig::from_toml_str(
            "[coordination]\ntotal_budget = -5.0\n",
        ));
        assert!(reason.contains("total_budget"), "reason: {reason}");
    }

    #[test]
    fn test_zero_strategy_cost_rejected() {
        let reason = config_error(PrecogConfig::from_toml_str(
            "[coordination]\nbase_strategy_cost = 0.0\n",
        ));
        assert!(reason.contains("base_strategy_cost"), "reason: {reason}");
    }

    #[test]
    fn test_threshold_out_of_range_rejected() {
        let toml = r#"
            [agents.crisis-sage]
            threshold = 1.2
        "#;
        let reason = config_error(PrecogConfig::from_toml_str(toml));
        assert!(reason.contains("agents.crisis-sage.threshold"), "reason: {reason}");
    }

    #[test]
    fn test_funding_constraints_all_reported() {
        let toml = r#"
            [[funding]]
            program = "Bad Grant"
            amount = 1000.0
            probability = 1.5
            roi_multiplier = 0.0
            deadline = "2024-12-31"
        "#;
        let reason = config_error(PrecogConfig::from_toml_str(toml));
        assert!(reason.contains("probability"), "reason: {reason}");
        assert!(reason.contains("roi_multiplier"), "reason: {reason}");
        assert!(reason.contains("Bad Grant"), "reason: {reason}");
    }

    #[test]
    fn test_zero_timeout_rejected() {
        let reason = config_error(PrecogConfig::from_toml_str(
            "[coordination]\nagent_timeout_ms = 0\n",
        ));
        assert!(reason.contains("agent_timeout_ms"), "reason: {reason}");
    }

    #[test]
    fn test_budget_override_revalidates() {
        let config = PrecogConfig::builtin().unwrap();
        let tighter = config.clone().with_total_budget(150_000.0).unwrap();
        assert_eq!(tighter.settings().total_budget, 150_000.0);
        assert_eq!(tighter.funding(), config.funding());

        config_error(config.with_total_budget(f64::NAN));
    }

    // ── 4. parse errors ──────────────────────────────────────────────────────

    #[test]
    fn test_toml_parse_error() {
        let reason = config_error(PrecogConfig::from_toml_str("this is not valid toml ][[["));
        assert!(reason.contains("failed to parse configuration TOML"), "reason: {reason}");
    }

    #[test]
    fn test_unknown_section_rejected() {
        let reason = config_error(PrecogConfig::from_toml_str("[coordinaton]\ntotal_budget = 1.0\n"));
        assert!(reason.contains("failed to parse"), "reason: {reason}");
    }

    #[test]
    fn test_misspelled_coordination_key_rejected() {
        let reason = config_error(PrecogConfig::from_toml_str(
            "[coordination]\ntotal_budgt = 5.0\n",
        ));
        assert!(reason.contains("total_budgt"), "reason: {reason}");
    }

    #[test]
    fn test_missing_file() {
        let reason = config_error(PrecogConfig::from_file(Path::new("/nonexistent/precog.toml")));
        assert!(reason.contains("failed to read configuration file"), "reason: {reason}");
    }
}
