use thiserror::Error;

/// Failures surfaced by the remote API client.
#[derive(Debug, Error)]
pub enum ApiError {
    /// The operation needs a bearer token and none is held.
    #[error("not authenticated")]
    NotAuthenticated,

    /// The backend could not be reached or did not answer in time.
    #[error("backend unavailable: {0}")]
    Unavailable(#[from] reqwest::Error),

    /// The backend answered with a non-success status.
    #[error("{message}")]
    Rejected { status: u16, message: String },
}

impl ApiError {
    pub fn is_unauthorized(&self) -> bool {
        match self {
            ApiError::NotAuthenticated => true,
            ApiError::Rejected { status, .. } => *status == 401,
            ApiError::Unavailable(_) => false,
        }
    }
}

/// Pulls a human-readable message out of an error response body. The backend
/// answers with either `{"error": "..."}` or `{"message": "..."}`.
pub(crate) fn rejection_message(status: u16, body: &str) -> String {
    if let Ok(value) = serde_json::from_str::<serde_json::Value>(body) {
        for key in ["error", "message"] {
            if let Some(text) = value.get(key).and_then(|v| v.as_str()) {
                return text.to_string();
            }
        }
    }
    format!("request failed with status {status}")
}
