use thiserror::Error;

use crate::api::ApiError;

/// Errors surfaced by goal lifecycle operations.
#[derive(Debug, Error)]
pub enum GoalError {
    /// `start` requires a signed-in user.
    #[error("not authenticated")]
    NotAuthenticated,

    /// Rejected before any request was made.
    #[error("{0}")]
    InvalidInput(String),

    /// A goal is already running; at most one per client session.
    #[error("a goal is already in progress")]
    GoalAlreadyActive,

    /// `publish_post` is only valid from the nailed-it sub-flow.
    #[error("no completed goal awaiting a post")]
    NoCompletedGoal,

    /// The backend call behind the operation failed.
    #[error(transparent)]
    Backend(#[from] ApiError),
}
