//! Pipeline phases and the scheduler state machine.
//!
//! ```text
//! INIT → DETECTING → PREDICTING → PREVENTING → OPTIMIZING → BROADCASTING → DONE
//!   └──────────┴───────────┴────────────┴────────────┴─────────────┴──→ ABORTED
//! ```

use std::{fmt, str::FromStr};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::{CoordinationError, PrecogResult};

/// One of the five ordered pipeline stages.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Phase {
    Detect,
    Predict,
    Prevent,
    Optimize,
    Broadcast,
}

impl Phase {
    /// Every phase in execution order.
    pub const ORDER: [Phase; 5] = [
        Phase::Detect,
        Phase::Predict,
        Phase::Prevent,
        Phase::Optimize,
        Phase::Broadcast,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Phase::Detect => "detect",
            Phase::Predict => "predict",
            Phase::Prevent => "prevent",
            Phase::Optimize => "optimize",
            Phase::Broadcast => "broadcast",
        }
    }

    /// Key under which this phase's output appears in aggregated contexts
    /// (`<agent-id>_<key>` per agent, or `<key>` for the broadcast context).
    pub fn context_key(&self) -> &'static str {
        match self {
            Phase::Detect => "detection",
            Phase::Predict => "prediction",
            Phase::Prevent => "prevention",
            Phase::Optimize => "roi_optimization",
            Phase::Broadcast => "broadcast",
        }
    }

    /// True for phases in which every registered agent is invoked.
    pub fn invokes_agents(&self) -> bool {
        !matches!(self, Phase::Optimize)
    }

    pub fn next(&self) -> Option<Phase> {
        match self {
            Phase::Detect => Some(Phase::Predict),
            Phase::Predict => Some(Phase::Prevent),
            Phase::Prevent => Some(Phase::Optimize),
            Phase::Optimize => Some(Phase::Broadcast),
            Phase::Broadcast => None,
        }
    }
}

impl fmt::Display for Phase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Phase {
    type Err = CoordinationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Phase::ORDER
            .into_iter()
            .find(|p| p.as_str() == s)
            .ok_or_else(|| CoordinationError::UnknownPhase { tag: s.to_string() })
    }
}

/// States of the phase scheduler.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum SchedulerState {
    Init,
    Detecting,
    Predicting,
    Preventing,
    Optimizing,
    Broadcasting,
    Done,
    Aborted,
}

impl SchedulerState {
    /// The state in which `phase` executes.
    pub fn for_phase(phase: Phase) -> Self {
        match phase {
            Phase::Detect => SchedulerState::Detecting,
            Phase::Predict => SchedulerState::Predicting,
            Phase::Prevent => SchedulerState::Preventing,
            Phase::Optimize => SchedulerState::Optimizing,
            Phase::Broadcast => SchedulerState::Broadcasting,
        }
    }

    /// The phase executing in this state, if any.
    pub fn phase(&self) -> Option<Phase> {
        match self {
            SchedulerState::Detecting => Some(Phase::Detect),
            SchedulerState::Predicting => Some(Phase::Predict),
            SchedulerState::Preventing => Some(Phase::Prevent),
            SchedulerState::Optimizing => Some(Phase::Optimize),
            SchedulerState::Broadcasting => Some(Phase::Broadcast),
            SchedulerState::Init | SchedulerState::Done | SchedulerState::Aborted => None,
        }
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self, SchedulerState::Done | SchedulerState::Aborted)
    }

    /// The successor state on success.
    ///
    /// Terminal states have no successor.
    pub fn advance(&self) -> PrecogResult<SchedulerState> {
        match self {
            SchedulerState::Init => Ok(SchedulerState::Detecting),
            SchedulerState::Broadcasting => Ok(SchedulerState::Done),
            SchedulerState::Done | SchedulerState::Aborted => Err(CoordinationError::StateMachine {
                reason: format!("cannot advance from terminal state {}", self),
            }),
            running => {
                // Non-terminal running states always map to a phase with a successor.
                let next = running.phase().and_then(|p| p.next());
                next.map(SchedulerState::for_phase)
                    .ok_or_else(|| CoordinationError::StateMachine {
                        reason: format!("no successor for state {}", running),
                    })
            }
        }
    }

    /// The abort transition, legal from any non-terminal state.
    pub fn abort(&self) -> PrecogResult<SchedulerState> {
        if self.is_terminal() {
            return Err(CoordinationError::StateMachine {
                reason: format!("cannot abort from terminal state {}", self),
            });
        }
        Ok(SchedulerState::Aborted)
    }
}

impl fmt::Display for SchedulerState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            SchedulerState::Init => "INIT",
            SchedulerState::Detecting => "DETECTING",
            SchedulerState::Predicting => "PREDICTING",
            SchedulerState::Preventing => "PREVENTING",
            SchedulerState::Optimizing => "OPTIMIZING",
            SchedulerState::Broadcasting => "BROADCASTING",
            SchedulerState::Done => "DONE",
            SchedulerState::Aborted => "ABORTED",
        };
        f.write_str(s)
    }
}

/// One scheduler state change, written to the run journal.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PhaseTransition {
    /// The run this transition belongs to.
    pub run_id: String,
    pub from: SchedulerState,
    pub to: SchedulerState,
    /// Number of agent outcomes committed by the phase that just finished.
    pub agent_outcomes: usize,
    /// Error text for aborts; free-form note otherwise.
    pub detail: Option<String>,
    /// Wall-clock time the transition was recorded (UTC).
    pub timestamp: DateTime<Utc>,
}
