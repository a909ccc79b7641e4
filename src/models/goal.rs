use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Terminal and in-flight statuses use the backend's exact wire strings,
/// spaces included.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub enum GoalStatus {
    #[serde(rename = "in progress")]
    InProgress,
    #[serde(rename = "nailed it")]
    NailedIt,
    #[serde(rename = "failed out")]
    FailedOut,
}

impl GoalStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            GoalStatus::InProgress => "in progress",
            GoalStatus::NailedIt => "nailed it",
            GoalStatus::FailedOut => "failed out",
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Goal {
    pub id: i64,
    pub user_id: i64,
    pub title: String,
    /// Minutes. The backend field is named `duration`.
    #[serde(rename = "duration")]
    pub duration_minutes: u32,
    pub status: GoalStatus,
    pub created_at: DateTime<Utc>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn status_uses_wire_strings() {
        assert_eq!(
            serde_json::to_string(&GoalStatus::NailedIt).unwrap(),
            "\"nailed it\""
        );
        assert_eq!(
            serde_json::to_string(&GoalStatus::FailedOut).unwrap(),
            "\"failed out\""
        );
        let status: GoalStatus = serde_json::from_str("\"in progress\"").unwrap();
        assert_eq!(status, GoalStatus::InProgress);
    }

    #[test]
    fn goal_deserializes_backend_shape() {
        let goal: Goal = serde_json::from_str(
            r#"{
                "id": 7,
                "user_id": 3,
                "title": "read",
                "duration": 25,
                "status": "in progress",
                "created_at": "2025-06-01T12:00:00Z"
            }"#,
        )
        .unwrap();
        assert_eq!(goal.duration_minutes, 25);
        assert_eq!(goal.status, GoalStatus::InProgress);
    }
}
