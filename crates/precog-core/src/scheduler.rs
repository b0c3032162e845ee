//! The phase scheduler: drives one coordination run through the fixed
//! five-phase sequence.
//!
//!   Detect → Predict → Prevent → Optimize → Broadcast
//!
//! A phase only starts once every registered agent completed the previous
//! one. Agents of a phase read the same immutable context and write only
//! their own registry entry, so they may run on parallel threads; the
//! scheduler joins them all before aggregating. Any failure aborts the whole
//! run: the caller receives either a complete `CoordinationResult` or a single
//! `CoordinationError::Aborted`.

use std::{
    panic::{self, AssertUnwindSafe},
    thread,
    time::{Duration, Instant},
};

use chrono::Utc;
use tracing::{debug, info, warn};

use precog_contracts::{
    agent::{AgentId, RunId},
    coordination::{CoordinationResult, CoordinationSettings},
    error::{CoordinationError, PrecogResult},
    phase::{Phase, PhaseTransition, SchedulerState},
    report::{AgentOutcome, AgentReport, PhaseContext, PhaseResult, ScenarioInput},
    roi::OptimizationReport,
};

use crate::{
    aggregate::PhaseContextAggregator,
    dispatch,
    funding::summarize,
    optimizer::ResourceAllocationOptimizer,
    registry::{AgentRegistry, RegisteredAgent},
    roi::RoiCalculator,
    traits::{FundingSource, RunJournal},
};

/// Drives coordination runs. Holds no per-run state; one scheduler may
/// serve any number of sequential runs.
pub struct PhaseScheduler {
    settings: CoordinationSettings,
    funding: Box<dyn FundingSource>,
    journal: Box<dyn RunJournal>,
}

impl PhaseScheduler {
    pub fn new(
        settings: CoordinationSettings,
        funding: Box<dyn FundingSource>,
        journal: Box<dyn RunJournal>,
    ) -> Self {
        Self { settings, funding, journal }
    }

    pub fn settings(&self) -> &CoordinationSettings {
        &self.settings
    }

    /// The pipeline entry point.
    ///
    /// # Errors
    ///
    /// Always `CoordinationError::Aborted`, carrying the phase (and agent,
    /// where applicable) in which the run failed and the originating error.
    pub fn run_coordination(
        &self,
        registry: &mut AgentRegistry,
        scenario: &ScenarioInput,
    ) -> PrecogResult<CoordinationResult> {
        let mut run = RunTracker::new(self.journal.as_ref());
        info!(
            run_id = %run.run_id,
            agents = registry.len(),
            location = %scenario.location,
            "coordination run starting"
        );

        match self.drive(&mut run, registry, scenario) {
            Ok(result) => {
                info!(
                    run_id = %run.run_id,
                    selected = result.optimization.result.selected.len(),
                    total_cost = result.optimization.result.total_cost,
                    total_benefit = result.optimization.result.total_benefit,
                    total_roi = result.total_roi,
                    "coordination run complete"
                );
                Ok(result)
            }
            Err(err) => {
                let phase = run.failing_phase();
                warn!(run_id = %run.run_id, phase = %phase, error = %err, "coordination run aborted");
                if let Err(journal_err) = run.abort(&err) {
                    warn!(run_id = %run.run_id, error = %journal_err, "failed to journal abort");
                }
                Err(err.abort_in(phase))
            }
        }
    }

    fn drive(
        &self,
        run: &mut RunTracker<'_>,
        registry: &mut AgentRegistry,
        scenario: &ScenarioInput,
    ) -> PrecogResult<CoordinationResult> {
        run.advance(0)?;
        let detection = self.run_agent_phase(run, Phase::Detect, registry, &scenario.to_context())?;

        run.advance(detection.len())?;
        let ctx = PhaseContextAggregator::aggregate(&detection);
        let prediction = self.run_agent_phase(run, Phase::Predict, registry, &ctx)?;

        run.advance(prediction.len())?;
        let ctx = PhaseContextAggregator::aggregate(&prediction);
        let prevention = self.run_agent_phase(run, Phase::Prevent, registry, &ctx)?;

        run.advance(prevention.len())?;
        let optimization = self.optimize(run, &prevention, registry)?;
        let total_roi = optimization.result.roi();

        run.advance(optimization.result.selected.len())?;
        let ctx = PhaseContextAggregator::broadcast_context(
            &detection,
            &prediction,
            &prevention,
            &optimization,
            total_roi,
        )?;
        let broadcast = self.run_agent_phase(run, Phase::Broadcast, registry, &ctx)?;

        run.advance(broadcast.len())?;
        run.finalize()?;

        Ok(CoordinationResult {
            detection,
            prediction,
            prevention,
            optimization,
            broadcast,
            total_roi,
        })
    }

    /// Invoke `phase` on every agent and commit the results.
    ///
    /// In parallel mode every agent call runs to completion before errors are
    /// inspected; the first failure in registry order is returned and all
    /// results of the phase are discarded.
    fn run_agent_phase(
        &self,
        run: &RunTracker<'_>,
        phase: Phase,
        registry: &mut AgentRegistry,
        ctx: &PhaseContext,
    ) -> PrecogResult<PhaseResult> {
        let limit = self.settings.agent_timeout();
        let entries = registry.entries_mut();
        let ids: Vec<AgentId> = entries.iter().map(|e| e.state.agent_id.clone()).collect();

        debug!(
            run_id = %run.run_id,
            phase = %phase,
            agents = ids.len(),
            context_keys = ctx.len(),
            parallel = self.settings.parallel_agents,
            "phase starting"
        );

        let reports: Vec<AgentReport> = if self.settings.parallel_agents && entries.len() > 1 {
            let joined: Vec<PrecogResult<AgentReport>> = thread::scope(|scope| {
                let handles: Vec<_> = entries
                    .iter_mut()
                    .map(|entry| scope.spawn(move || timed_invoke(entry, phase, ctx, limit)))
                    .collect();
                handles
                    .into_iter()
                    .zip(&ids)
                    .map(|(handle, id)| handle.join().unwrap_or_else(|_| Err(panicked(id, phase))))
                    .collect()
            });
            joined.into_iter().collect::<PrecogResult<_>>()?
        } else {
            entries
                .iter_mut()
                .zip(&ids)
                .map(|(entry, id)| {
                    panic::catch_unwind(AssertUnwindSafe(|| timed_invoke(entry, phase, ctx, limit)))
                        .unwrap_or_else(|_| Err(panicked(id, phase)))
                })
                .collect::<PrecogResult<_>>()?
        };

        let outcomes: Vec<AgentOutcome> = ids
            .into_iter()
            .zip(reports)
            .map(|(agent, report)| AgentOutcome { agent, report })
            .collect();

        info!(run_id = %run.run_id, phase = %phase, agents = outcomes.len(), "phase complete");
        Ok(PhaseResult::new(phase, outcomes))
    }

    /// ROI calculation, funding simulation, and budget optimization.
    fn optimize(
        &self,
        run: &RunTracker<'_>,
        prevention: &PhaseResult,
        registry: &AgentRegistry,
    ) -> PrecogResult<OptimizationReport> {
        let calculator = RoiCalculator::from_settings(&self.settings)?;
        let funding = summarize(self.funding.opportunities()?);
        let roi_calculations = calculator.calculate(prevention, &funding);

        if let Some(stray) = roi_calculations.iter().find(|c| !registry.contains(&c.agent)) {
            return Err(CoordinationError::StateMachine {
                reason: format!("strategy attributed to unregistered agent '{}'", stray.agent),
            });
        }

        let result = ResourceAllocationOptimizer::new(self.settings.total_budget)
            .optimize(&roi_calculations)?;

        info!(
            run_id = %run.run_id,
            candidates = roi_calculations.len(),
            funding_opportunities = funding.opportunities.len(),
            funding_multiplier = funding.average_roi_multiplier,
            selected = result.selected.len(),
            total_cost = result.total_cost,
            budget = result.budget,
            "optimization complete"
        );

        Ok(OptimizationReport {
            funding,
            roi_calculations,
            result,
        })
    }
}

fn panicked(agent: &AgentId, phase: Phase) -> CoordinationError {
    CoordinationError::AgentExecution {
        agent: agent.clone(),
        phase,
        reason: "agent panicked".to_string(),
    }
}

/// Invoke one agent, enforcing the per-call limit after the fact.
///
/// The call is never interrupted; an over-limit result is discarded.
fn timed_invoke(
    entry: &mut RegisteredAgent,
    phase: Phase,
    ctx: &PhaseContext,
    limit: Option<Duration>,
) -> PrecogResult<AgentReport> {
    let started = Instant::now();
    let report = dispatch::invoke(entry.agent.as_ref(), phase, &mut entry.state, ctx)?;
    let elapsed = started.elapsed();

    if let Some(limit) = limit {
        if elapsed > limit {
            return Err(CoordinationError::AgentTimeout {
                agent: entry.state.agent_id.clone(),
                phase,
                elapsed_ms: elapsed.as_millis() as u64,
                limit_ms: limit.as_millis() as u64,
            });
        }
    }

    debug!(
        agent = %entry.state.agent_id,
        phase = %phase,
        confidence = report.confidence(),
        strategies = report.strategies().len(),
        elapsed_ms = elapsed.as_millis() as u64,
        "agent call complete"
    );
    Ok(report)
}

/// Per-run scheduler state plus its journal.
struct RunTracker<'a> {
    run_id: RunId,
    state: SchedulerState,
    journal: &'a dyn RunJournal,
}

impl<'a> RunTracker<'a> {
    fn new(journal: &'a dyn RunJournal) -> Self {
        Self {
            run_id: RunId::new(),
            state: SchedulerState::Init,
            journal,
        }
    }

    /// Move to the successor state. `outcomes` is the number of results the
    /// finishing phase committed.
    fn advance(&mut self, outcomes: usize) -> PrecogResult<()> {
        let next = self.state.advance()?;
        self.record(next, outcomes, None)?;
        debug!(run_id = %self.run_id, from = %self.state, to = %next, "scheduler transition");
        self.state = next;
        Ok(())
    }

    fn abort(&mut self, err: &CoordinationError) -> PrecogResult<()> {
        if self.state.is_terminal() {
            return Ok(());
        }
        let next = self.state.abort()?;
        let result = self.record(next, 0, Some(err.to_string()));
        self.state = next;
        result
    }

    fn record(&self, to: SchedulerState, outcomes: usize, detail: Option<String>) -> PrecogResult<()> {
        self.journal.record(&PhaseTransition {
            run_id: self.run_id.to_string(),
            from: self.state,
            to,
            agent_outcomes: outcomes,
            detail,
            timestamp: Utc::now(),
        })
    }

    fn finalize(&self) -> PrecogResult<()> {
        self.journal.finalize(&self.run_id.to_string())
    }

    /// The phase to blame for a failure in the current state.
    fn failing_phase(&self) -> Phase {
        match self.state {
            SchedulerState::Init => Phase::Detect,
            SchedulerState::Done => Phase::Broadcast,
            other => other.phase().unwrap_or(Phase::Detect),
        }
    }
}

// ── Tests ────────────────────────────────────────────────────────────────────
