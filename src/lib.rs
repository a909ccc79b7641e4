//! lowkey: the headless client core of a social goal timer.
//!
//! Users start a timed goal, the countdown runs, and the outcome ("nailed
//! it" or "failed out") is written back to the backend; nailed goals may
//! become posts that others like, comment on and bookmark. This crate owns
//! the goal lifecycle state machine, the typed API client, session
//! persistence, and the feed/dashboard read paths. A UI shell constructs
//! [`AppServices`] once at startup and renders the state and events the
//! services expose.

pub mod api;
pub mod auth;
pub mod config;
pub mod dashboard;
pub mod feed;
pub mod goal;
pub mod models;
pub mod utils;

use std::sync::Arc;

use anyhow::{Context, Result};

pub use api::{ApiClient, ApiError};
pub use auth::{AuthError, AuthService, SessionStore};
pub use config::ClientConfig;
pub use dashboard::{chart_points, ChartPeriod, ChartPoint, DashboardData, DashboardService};
pub use feed::FeedService;
pub use goal::{
    AppStateChange, GoalController, GoalError, GoalEvent, GoalPhase, GoalSnapshot, NoticeLevel,
};

/// Every service the client needs, constructed once and shared by reference.
/// There is no ambient registry; a host passes these where they are needed.
pub struct AppServices {
    pub api: Arc<ApiClient>,
    pub auth: Arc<AuthService>,
    pub goals: GoalController,
    pub feed: FeedService,
    pub dashboard: DashboardService,
}

impl AppServices {
    pub fn init(config: ClientConfig) -> Result<Self> {
        std::fs::create_dir_all(&config.data_dir)
            .with_context(|| format!("Failed to create {}", config.data_dir.display()))?;

        let api = Arc::new(ApiClient::new(&config)?);
        let store = SessionStore::new(config.data_dir.join("session.json"))?;
        let auth = Arc::new(AuthService::new(api.clone(), store));
        let goals = GoalController::new(api.clone(), auth.clone(), config.tick_interval);
        let feed = FeedService::new(api.clone(), auth.clone());
        let dashboard = DashboardService::new(api.clone());

        Ok(Self {
            api,
            auth,
            goals,
            feed,
            dashboard,
        })
    }
}

/// Initializes logging for a host app (reads RUST_LOG).
pub fn init_logging() {
    env_logger::Builder::from_default_env()
        .filter_level(log::LevelFilter::Info)
        .init();
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn services_initialize_against_a_fresh_data_dir() {
        let dir = tempfile::tempdir().unwrap();
        let mut config = ClientConfig::new("http://localhost:3000/api");
        config.data_dir = dir.path().join("lowkey");

        let services = AppServices::init(config).unwrap();
        assert!(services.auth.current_user().is_none());
        assert!(!services.auth.is_logged_in());
    }
}
