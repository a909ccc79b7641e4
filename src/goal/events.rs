use serde::Serialize;

use crate::models::Post;

use super::state::{ActiveGoal, GoalState};

#[derive(Debug, Clone, Copy, Serialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub enum NoticeLevel {
    Info,
    Success,
    Error,
}

/// Everything a UI needs to render the goal flow: state transitions, the
/// per-second countdown, terminal outcomes, and toast-style notices.
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum GoalEvent {
    StateChanged {
        state: GoalState,
        remaining_secs: u32,
    },
    Tick {
        remaining_secs: u32,
    },
    GoalNailed {
        goal: ActiveGoal,
    },
    GoalFailed {
        goal: ActiveGoal,
        /// True when the backgrounding policy forced the failure rather
        /// than an explicit user action.
        forced: bool,
    },
    PostPublished {
        post: Post,
    },
    Notice {
        level: NoticeLevel,
        message: String,
    },
}
