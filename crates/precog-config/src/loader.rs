//! TOML configuration loading.
//!
//! `PrecogConfig` parses a `ConfigDocument` from a TOML string or file,
//! validates it, and hands out the pieces the runtime needs: coordination
//! settings, per-agent thresholds, and the funding table.

use std::path::Path;

use tracing::{debug, warn};

use precog_contracts::{
    agent::AgentId,
    coordination::CoordinationSettings,
    error::{CoordinationError, PrecogResult},
    roi::FundingOpportunity,
};
use precog_core::FundingSimulator;

use crate::document::ConfigDocument;

/// The built-in configuration, reproducing the reference constants.
pub const DEFAULT_CONFIG_TOML: &str = include_str!("../../../config/precog.toml");

/// A validated configuration.
///
/// ```rust,ignore
/// use precog_config::PrecogConfig;
///
/// let config = PrecogConfig::from_file(Path::new("config/precog.toml"))?;
/// let scheduler = PhaseScheduler::new(config.settings().clone(), Box::new(config.funding_simulator()), journal);
/// ```
#[derive(Debug, Clone, PartialEq)]
pub struct PrecogConfig {
    document: ConfigDocument,
}

impl PrecogConfig {
    /// Parse `s` as TOML and validate it.
    ///
    /// Returns `CoordinationError::ConfigError` if the TOML is malformed, does
    /// not match the `ConfigDocument` schema, or violates a constraint.
    pub fn from_toml_str(s: &str) -> PrecogResult<Self> {
        let document: ConfigDocument = toml::from_str(s).map_err(|e| CoordinationError::ConfigError {
            reason: format!("failed to parse configuration TOML: {}", e),
        })?;
        Self::from_document(document)
    }

    /// Read the file at `path` and parse it as TOML configuration.
    pub fn from_file(path: &Path) -> PrecogResult<Self> {
        let contents = std::fs::read_to_string(path).map_err(|e| CoordinationError::ConfigError {
            reason: format!("failed to read configuration file '{}': {}", path.display(), e),
        })?;
        debug!(path = %path.display(), "configuration file read");
        Self::from_toml_str(&contents)
    }

    /// The built-in configuration.
    pub fn builtin() -> PrecogResult<Self> {
        Self::from_toml_str(DEFAULT_CONFIG_TOML)
    }

    /// Validate an already-built document.
    pub fn from_document(document: ConfigDocument) -> PrecogResult<Self> {
        let violations = document.violations();
        if !violations.is_empty() {
            for v in &violations {
                warn!(violation = %v, "invalid configuration");
            }
            return Err(CoordinationError::ConfigError {
                reason: violations.join("; "),
            });
        }

        debug!(
            total_budget = document.coordination.total_budget,
            agents = document.agents.len(),
            funding_programs = document.funding.len(),
            "configuration loaded"
        );
        Ok(Self { document })
    }

    pub fn document(&self) -> &ConfigDocument {
        &self.document
    }

    pub fn settings(&self) -> &CoordinationSettings {
        &self.document.coordination
    }

    /// Replace the budget, re-validating.
    pub fn with_total_budget(self, budget: f64) -> PrecogResult<Self> {
        let mut document = self.document;
        document.coordination.total_budget = budget;
        Self::from_document(document)
    }

    /// The configured threshold for `id`, if the document sets one.
    pub fn threshold_for(&self, id: &AgentId) -> Option<f64> {
        self.document.agents.get(id.as_str()).map(|a| a.threshold)
    }

    pub fn funding(&self) -> &[FundingOpportunity] {
        &self.document.funding
    }

    pub fn funding_simulator(&self) -> FundingSimulator {
        FundingSimulator::new(self.document.funding.clone())
    }
}
