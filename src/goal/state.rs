use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::models::GoalStatus;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub enum GoalPhase {
    Idle,
    Running,
    NailedIt,
    FailedOut,
}

impl Default for GoalPhase {
    fn default() -> Self {
        GoalPhase::Idle
    }
}

/// The two terminal outcomes of a goal.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub enum GoalOutcome {
    NailedIt,
    FailedOut,
}

impl GoalOutcome {
    pub fn status(&self) -> GoalStatus {
        match self {
            GoalOutcome::NailedIt => GoalStatus::NailedIt,
            GoalOutcome::FailedOut => GoalStatus::FailedOut,
        }
    }
}

/// The one goal this client session is allowed to have in flight.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ActiveGoal {
    pub id: i64,
    pub title: String,
    pub duration_minutes: u32,
}

#[must_use]
pub enum TickResult {
    StillRunning(u32),
    Expired,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GoalState {
    pub phase: GoalPhase,
    pub goal: Option<ActiveGoal>,
    pub remaining_secs: u32,
    pub started_at: Option<DateTime<Utc>>,
    /// Survives the return to Idle so the last terminal outcome stays
    /// observable.
    pub last_outcome: Option<GoalOutcome>,
}

impl Default for GoalState {
    fn default() -> Self {
        Self {
            phase: GoalPhase::Idle,
            goal: None,
            remaining_secs: 0,
            started_at: None,
            last_outcome: None,
        }
    }
}

impl GoalState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn begin(&mut self, goal: ActiveGoal, started_at: DateTime<Utc>) {
        let remaining_secs = goal.duration_minutes * 60;
        *self = Self {
            phase: GoalPhase::Running,
            goal: Some(goal),
            remaining_secs,
            started_at: Some(started_at),
            last_outcome: self.last_outcome,
        };
    }

    /// One second elapsed. Only meaningful while Running; the caller holds
    /// the phase precondition.
    pub fn tick(&mut self) -> TickResult {
        self.remaining_secs = self.remaining_secs.saturating_sub(1);
        if self.remaining_secs == 0 {
            TickResult::Expired
        } else {
            TickResult::StillRunning(self.remaining_secs)
        }
    }

    /// Countdown hit zero. The goal is kept so the post-composition
    /// sub-flow knows what was nailed.
    pub fn nail(&mut self) {
        self.phase = GoalPhase::NailedIt;
        self.remaining_secs = 0;
        self.last_outcome = Some(GoalOutcome::NailedIt);
    }

    /// User (or the backgrounding policy) declared failure. The remaining
    /// counter is discarded.
    pub fn fail(&mut self) {
        self.phase = GoalPhase::FailedOut;
        self.remaining_secs = 0;
        self.last_outcome = Some(GoalOutcome::FailedOut);
    }

    pub fn reset(&mut self) {
        *self = Self {
            last_outcome: self.last_outcome,
            ..Self::default()
        };
    }
}
