//! Simulated city data for the Precog reference agents.
//!
//! All data in this module is fictional. No external systems are contacted;
//! `CityDataSource` is the seam where a real 311, housing, budget, or
//! dispatch feed would plug in.

use rand::{rngs::StdRng, Rng, SeedableRng};
use serde::{Deserialize, Serialize};

use precog_contracts::error::PrecogResult;

// ── Record types ──────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StreetIssueKind {
    /// Trash, litter, graffiti.
    Gross,
    Safety,
    Accessibility,
}

/// A 311 street report.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StreetIssue {
    pub id: u32,
    pub kind: StreetIssueKind,
    pub location: String,
    pub severity: f64,
    pub description: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EvictionReason {
    NonPayment,
    LeaseViolation,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Eviction {
    pub id: u32,
    pub address: String,
    pub reason: EvictionReason,
    pub severity: f64,
    pub filed: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PermitKind {
    Renovation,
    NewConstruction,
    Demolition,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Permit {
    pub id: u32,
    pub address: String,
    pub kind: PermitKind,
    pub approved: bool,
}

/// One line of the current city budget.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BudgetAllocation {
    pub category: String,
    pub amount: f64,
    /// Amount the category needs, where a target exists.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub expected: Option<f64>,
    pub source: String,
}

impl BudgetAllocation {
    /// `expected - amount` when positive.
    pub fn shortfall(&self) -> Option<f64> {
        self.expected
            .map(|expected| expected - self.amount)
            .filter(|gap| *gap > 0.0)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CrisisKind {
    Medical,
    Safety,
    Infrastructure,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CrisisEvent {
    pub id: u32,
    pub kind: CrisisKind,
    pub location: String,
    pub severity: f64,
    pub description: String,
}

// ── Data source seam ─────────────────────────────────────────────────────────

/// Supplies the raw city records the reference agents analyze.
///
/// Shared by all four agents, which may call it from parallel threads.
pub trait CityDataSource: Send + Sync {
    fn street_issues(&self, location: &str) -> PrecogResult<Vec<StreetIssue>>;
    fn evictions(&self, location: &str) -> PrecogResult<Vec<Eviction>>;
    fn permits(&self, location: &str) -> PrecogResult<Vec<Permit>>;
    fn budget_allocations(&self, location: &str) -> PrecogResult<Vec<BudgetAllocation>>;
    fn crisis_events(&self, location: &str) -> PrecogResult<Vec<CrisisEvent>>;
}

// ── Fixtures ──────────────────────────────────────────────────────────────────

fn street(id: u32, kind: StreetIssueKind, location: &str, severity: f64, description: &str) -> StreetIssue {
    StreetIssue {
        id,
        kind,
        location: location.to_string(),
        severity,
        description: description.to_string(),
    }
}

fn fixture_street_issues() -> Vec<StreetIssue> {
    vec![
        street(1, StreetIssueKind::Gross, "Market St", 0.8, "Trash accumulation"),
        street(2, StreetIssueKind::Safety, "Mission St", 0.6, "Broken glass"),
        street(3, StreetIssueKind::Gross, "Castro St", 0.9, "Graffiti"),
        street(4, StreetIssueKind::Accessibility, "Haight St", 0.5, "Sidewalk obstruction"),
    ]
}

fn eviction(id: u32, address: &str, reason: EvictionReason, severity: f64, filed: &str) -> Eviction {
    Eviction {
        id,
        address: address.to_string(),
        reason,
        severity,
        filed: filed.to_string(),
    }
}

fn fixture_evictions() -> Vec<Eviction> {
    vec![
        eviction(1, "123 Market St", EvictionReason::NonPayment, 0.8, "2024-01-15"),
        eviction(2, "456 Mission St", EvictionReason::LeaseViolation, 0.6, "2024-01-14"),
        eviction(3, "789 Castro St", EvictionReason::NonPayment, 0.9, "2024-01-13"),
    ]
}

fn fixture_permits() -> Vec<Permit> {
    let permit = |id, address: &str, kind, approved| Permit {
        id,
        address: address.to_string(),
        kind,
        approved,
    };
    vec![
        permit(1, "123 Market St", PermitKind::Renovation, true),
        permit(2, "456 Mission St", PermitKind::NewConstruction, false),
        permit(3, "789 Castro St", PermitKind::Demolition, true),
    ]
}

fn fixture_budget() -> Vec<BudgetAllocation> {
    let line = |category: &str, amount, expected, source: &str| BudgetAllocation {
        category: category.to_string(),
        amount,
        expected,
        source: source.to_string(),
    };
    vec![
        line("housing", 50_000_000.0, Some(60_000_000.0), "general_fund"),
        line("infrastructure", 75_000_000.0, Some(80_000_000.0), "general_fund"),
        line("social_services", 30_000_000.0, Some(35_000_000.0), "general_fund"),
        line("homeless_services", 25_000_000.0, None, "federal"),
        line("public_transport", 40_000_000.0, None, "federal"),
    ]
}

fn crisis(id: u32, kind: CrisisKind, location: &str, severity: f64, description: &str) -> CrisisEvent {
    CrisisEvent {
        id,
        kind,
        location: location.to_string(),
        severity,
        description: description.to_string(),
    }
}

fn fixture_crisis_events() -> Vec<CrisisEvent> {
    vec![
        crisis(1, CrisisKind::Medical, "Tenderloin", 0.8, "Overdose incident"),
        crisis(2, CrisisKind::Safety, "Mission District", 0.6, "Fire emergency"),
        crisis(3, CrisisKind::Infrastructure, "Downtown", 0.9, "Power outage"),
    ]
}

// ── Static source ─────────────────────────────────────────────────────────────

/// Fixed fixtures, identical for every location.
#[derive(Debug, Clone, Copy, Default)]
pub struct StaticCityData;

impl CityDataSource for StaticCityData {
    fn street_issues(&self, _location: &str) -> PrecogResult<Vec<StreetIssue>> {
        Ok(fixture_street_issues())
    }

    fn evictions(&self, _location: &str) -> PrecogResult<Vec<Eviction>> {
        Ok(fixture_evictions())
    }

    fn permits(&self, _location: &str) -> PrecogResult<Vec<Permit>> {
        Ok(fixture_permits())
    }

    fn budget_allocations(&self, _location: &str) -> PrecogResult<Vec<BudgetAllocation>> {
        Ok(fixture_budget())
    }

    fn crisis_events(&self, _location: &str) -> PrecogResult<Vec<CrisisEvent>> {
        Ok(fixture_crisis_events())
    }
}

// ── Seeded source ─────────────────────────────────────────────────────────────

/// The fixture records with severities and budget amounts drawn from a
/// seeded RNG.
///
/// Each feed has its own stream derived from `(seed, location, feed)`, so a
/// feed returns the same records no matter which agent asks first.
#[derive(Debug, Clone, Copy)]
pub struct SeededCityData {
    seed: u64,
}

impl SeededCityData {
    pub fn new(seed: u64) -> Self {
        Self { seed }
    }

    pub fn seed(&self) -> u64 {
        self.seed
    }

    fn rng(&self, location: &str, feed: u64) -> StdRng {
        // FNV-1a over the location keeps streams stable across platforms.
        let mut h: u64 = 0xcbf2_9ce4_8422_2325;
        for b in location.as_bytes() {
            h ^= u64::from(*b);
            h = h.wrapping_mul(0x0100_0000_01b3);
        }
        StdRng::seed_from_u64(self.seed ^ h ^ feed.wrapping_mul(0x9e37_79b9_7f4a_7c15))
    }
}

/// A severity in [0.3, 1.0] rounded to two decimals.
fn severity(rng: &mut StdRng) -> f64 {
    (rng.gen_range(0.3..=1.0_f64) * 100.0).round() / 100.0
}

impl CityDataSource for SeededCityData {
    fn street_issues(&self, location: &str) -> PrecogResult<Vec<StreetIssue>> {
        let mut rng = self.rng(location, 1);
        Ok(fixture_street_issues()
            .into_iter()
            .map(|issue| StreetIssue { severity: severity(&mut rng), ..issue })
            .collect())
    }

    fn evictions(&self, location: &str) -> PrecogResult<Vec<Eviction>> {
        let mut rng = self.rng(location, 2);
        Ok(fixture_evictions()
            .into_iter()
            .map(|e| Eviction { severity: severity(&mut rng), ..e })
            .collect())
    }

    fn permits(&self, location: &str) -> PrecogResult<Vec<Permit>> {
        let mut rng = self.rng(location, 3);
        Ok(fixture_permits()
            .into_iter()
            .map(|p| Permit { approved: rng.gen_bool(0.5), ..p })
            .collect())
    }

    fn budget_allocations(&self, location: &str) -> PrecogResult<Vec<BudgetAllocation>> {
        let mut rng = self.rng(location, 4);
        Ok(fixture_budget()
            .into_iter()
            .map(|line| {
                let base = line.expected.unwrap_or(line.amount);
                let amount = (base * rng.gen_range(0.6..=1.05) / 1_000.0).round() * 1_000.0;
                BudgetAllocation { amount, ..line }
            })
            .collect())
    }

    fn crisis_events(&self, location: &str) -> PrecogResult<Vec<CrisisEvent>> {
        let mut rng = self.rng(location, 5);
        Ok(fixture_crisis_events()
            .into_iter()
            .map(|event| CrisisEvent { severity: severity(&mut rng), ..event })
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn shortfall_only_when_underfunded() {
        let budget = fixture_budget();
        assert_eq!(budget[0].shortfall(), Some(10_000_000.0));
        assert_eq!(budget[3].shortfall(), None);

        let overfunded = BudgetAllocation { amount: 90_000_000.0, ..budget[1].clone() };
        assert_eq!(overfunded.shortfall(), None);
    }

    #[test]
    fn seeded_source_is_reproducible() {
        let a = SeededCityData::new(42);
        let b = SeededCityData::new(42);
        assert_eq!(a.street_issues("Oakland").unwrap(), b.street_issues("Oakland").unwrap());
        assert_eq!(a.budget_allocations("Oakland").unwrap(), b.budget_allocations("Oakland").unwrap());
        assert_eq!(a.crisis_events("Oakland").unwrap(), b.crisis_events("Oakland").unwrap());
    }

    #[test]
    fn seeded_severities_stay_in_range() {
        let data = SeededCityData::new(7);
        for issue in data.street_issues("San Francisco").unwrap() {
            assert!((0.3..=1.0).contains(&issue.severity));
        }
        for event in data.crisis_events("San Francisco").unwrap() {
            assert!((0.3..=1.0).contains(&event.severity));
        }
    }

    #[test]
    fn seeds_and_locations_change_the_draw() {
        let seven = SeededCityData::new(7).evictions("San Francisco").unwrap();
        let eight = SeededCityData::new(8).evictions("San Francisco").unwrap();
        let elsewhere = SeededCityData::new(7).evictions("Oakland").unwrap();
        assert_ne!(seven, eight);
        assert_ne!(seven, elsewhere);
    }
}
