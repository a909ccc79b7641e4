use std::{sync::Arc, time::Duration};

use async_trait::async_trait;
use chrono::Utc;
use log::error;
use serde::Serialize;
use tokio::{
    sync::{broadcast, Mutex},
    time::{self, MissedTickBehavior},
};
use tokio_util::sync::CancellationToken;

use crate::{
    api::ApiError,
    auth::AuthService,
    models::{Goal, GoalStatus, Post},
};

use super::{
    error::GoalError,
    events::{GoalEvent, NoticeLevel},
    state::{ActiveGoal, GoalPhase, GoalState, TickResult},
};

/// Backend seam for the goal lifecycle: creation, the two terminal status
/// writes, and the optional post. [`crate::api::ApiClient`] implements it;
/// tests substitute a fake.
#[async_trait]
pub trait GoalBackend: Send + Sync {
    async fn create_goal(
        &self,
        user_id: i64,
        title: &str,
        duration_minutes: u32,
    ) -> Result<Goal, ApiError>;

    async fn update_goal_status(&self, goal_id: i64, status: GoalStatus) -> Result<(), ApiError>;

    async fn create_post(
        &self,
        user_id: i64,
        goal_id: i64,
        image_url: &str,
        description: &str,
    ) -> Result<Post, ApiError>;
}

/// Host app lifecycle notifications. A goal left Running when the app goes to
/// the background is forfeited; the countdown cannot be trusted while the app
/// is not active, so no reconciliation is attempted on return.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AppStateChange {
    Active,
    Inactive,
    Background,
}

#[derive(Debug, Serialize, Clone)]
#[serde(rename_all = "camelCase")]
pub struct GoalSnapshot {
    pub state: GoalState,
    pub remaining_secs: u32,
}

const EVENT_CHANNEL_CAPACITY: usize = 256;

/// Drives a single active goal from `start` to its terminal outcome. Every
/// public operation checks the phase under the state lock, so a late
/// `fail_out` after the zero-crossing has been processed is a no-op rather
/// than a race.
#[derive(Clone)]
pub struct GoalController {
    state: Arc<Mutex<GoalState>>,
    backend: Arc<dyn GoalBackend>,
    auth: Arc<AuthService>,
    events: broadcast::Sender<GoalEvent>,
    ticker: Arc<Mutex<Option<CancellationToken>>>,
    tick_interval: Duration,
}

impl GoalController {
    pub fn new(backend: Arc<dyn GoalBackend>, auth: Arc<AuthService>, tick_interval: Duration) -> Self {
        let (events, _) = broadcast::channel(EVENT_CHANNEL_CAPACITY);
        Self {
            state: Arc::new(Mutex::new(GoalState::new())),
            backend,
            auth,
            events,
            ticker: Arc::new(Mutex::new(None)),
            tick_interval,
        }
    }

    /// A UI renders the countdown by subscribing here rather than polling.
    pub fn subscribe(&self) -> broadcast::Receiver<GoalEvent> {
        self.events.subscribe()
    }

    pub async fn get_state(&self) -> GoalState {
        self.state.lock().await.clone()
    }

    pub async fn get_snapshot(&self) -> GoalSnapshot {
        let guard = self.state.lock().await;
        GoalSnapshot {
            remaining_secs: guard.remaining_secs,
            state: guard.clone(),
        }
    }

    /// Creates the goal remotely and enters Running. The state lock is held
    /// across the create so a second `start` cannot slip in between the
    /// phase check and the transition.
    pub async fn start(&self, title: &str, duration_minutes: u32) -> Result<ActiveGoal, GoalError> {
        let user = self.auth.current_user().ok_or(GoalError::NotAuthenticated)?;
        let title = title.trim();
        if title.is_empty() {
            return Err(GoalError::InvalidInput("Title cannot be empty".into()));
        }
        if duration_minutes == 0 {
            return Err(GoalError::InvalidInput(
                "Duration must be greater than zero".into(),
            ));
        }

        let mut state = self.state.lock().await;
        if state.phase != GoalPhase::Idle {
            return Err(GoalError::GoalAlreadyActive);
        }

        let goal = self
            .backend
            .create_goal(user.id, title, duration_minutes)
            .await?;

        let active = ActiveGoal {
            id: goal.id,
            title: goal.title.clone(),
            duration_minutes,
        };
        state.begin(active.clone(), Utc::now());
        self.spawn_ticker().await;
        self.emit_state(&state);
        self.notice(NoticeLevel::Success, "Goal started!");
        Ok(active)
    }

    /// One second elapsed. Driven by the ticker task while Running; a no-op
    /// in any other phase, which is what makes a dangling tick harmless.
    pub async fn tick(&self) {
        let mut state = self.state.lock().await;
        if state.phase != GoalPhase::Running {
            return;
        }

        match state.tick() {
            TickResult::StillRunning(remaining) => {
                let _ = self.events.send(GoalEvent::Tick {
                    remaining_secs: remaining,
                });
            }
            TickResult::Expired => {
                self.cancel_ticker().await;
                let Some(goal) = state.goal.clone() else {
                    return;
                };
                state.nail();
                let _ = self.events.send(GoalEvent::GoalNailed { goal: goal.clone() });
                self.notice(NoticeLevel::Success, "\u{1f4aa} Nailed it!");
                self.emit_state(&state);

                // The countdown truth is client-local and cannot be
                // un-expired; the write is fire-and-forget.
                self.spawn_status_update(goal.id, GoalStatus::NailedIt);
            }
        }
    }

    /// Explicit user action. No-op unless Running.
    pub async fn fail_out(&self) {
        self.fail(false).await;
    }

    /// Backgrounding forfeits a running goal outright; see [`AppStateChange`].
    pub async fn app_state_changed(&self, change: AppStateChange) {
        if matches!(change, AppStateChange::Background | AppStateChange::Inactive) {
            self.fail(true).await;
        }
    }

    async fn fail(&self, forced: bool) {
        let mut state = self.state.lock().await;
        if state.phase != GoalPhase::Running {
            return;
        }
        self.cancel_ticker().await;
        let Some(goal) = state.goal.clone() else {
            return;
        };

        // Optimistic: the local transition happens before the write and is
        // never rolled back on remote failure.
        state.fail();
        let _ = self.events.send(GoalEvent::GoalFailed {
            goal: goal.clone(),
            forced,
        });
        let message = if forced {
            "\u{1f622} App backgrounded. Failed out."
        } else {
            "\u{1f622} Failed out."
        };
        self.notice(NoticeLevel::Error, message);
        self.emit_state(&state);

        if let Err(err) = self
            .backend
            .update_goal_status(goal.id, GoalStatus::FailedOut)
            .await
        {
            error!("Failed to record goal {} as failed out: {err}", goal.id);
            self.notice(NoticeLevel::Error, "Error updating goal status.");
        }

        state.reset();
        self.emit_state(&state);
    }

    /// NailedIt sub-flow: publish the post and settle back to Idle. On
    /// failure the controller stays in NailedIt so the user can retry or
    /// dismiss.
    pub async fn publish_post(
        &self,
        image_url: &str,
        description: &str,
    ) -> Result<Post, GoalError> {
        let user = self.auth.current_user().ok_or(GoalError::NotAuthenticated)?;

        let mut state = self.state.lock().await;
        if state.phase != GoalPhase::NailedIt {
            return Err(GoalError::NoCompletedGoal);
        }
        let Some(goal) = state.goal.clone() else {
            return Err(GoalError::NoCompletedGoal);
        };

        match self
            .backend
            .create_post(user.id, goal.id, image_url, description)
            .await
        {
            Ok(post) => {
                state.reset();
                let _ = self.events.send(GoalEvent::PostPublished { post: post.clone() });
                self.notice(NoticeLevel::Success, "Post created!");
                self.emit_state(&state);
                Ok(post)
            }
            Err(err) => {
                error!("Failed to publish post for goal {}: {err}", goal.id);
                self.notice(NoticeLevel::Error, "Error creating post.");
                Err(err.into())
            }
        }
    }

    /// Closes the NailedIt sub-flow without a post. A nailed goal with no
    /// post is an accepted terminal state.
    pub async fn dismiss_completion(&self) {
        let mut state = self.state.lock().await;
        if state.phase == GoalPhase::NailedIt {
            state.reset();
            self.emit_state(&state);
        }
    }

    async fn spawn_ticker(&self) {
        let mut slot = self.ticker.lock().await;
        if let Some(token) = slot.take() {
            token.cancel();
        }
        let token = CancellationToken::new();
        *slot = Some(token.clone());
        drop(slot);

        let controller = self.clone();
        let tick_interval = self.tick_interval;
        tokio::spawn(async move {
            // The first tick lands one full interval after start.
            let mut interval =
                time::interval_at(time::Instant::now() + tick_interval, tick_interval);
            interval.set_missed_tick_behavior(MissedTickBehavior::Delay);
            loop {
                tokio::select! {
                    _ = interval.tick() => controller.tick().await,
                    _ = token.cancelled() => break,
                }
            }
        });
    }

    async fn cancel_ticker(&self) {
        if let Some(token) = self.ticker.lock().await.take() {
            token.cancel();
        }
    }

    fn spawn_status_update(&self, goal_id: i64, status: GoalStatus) {
        let backend = self.backend.clone();
        let events = self.events.clone();
        tokio::spawn(async move {
            if let Err(err) = backend.update_goal_status(goal_id, status).await {
                error!(
                    "Failed to record goal {goal_id} as {}: {err}",
                    status.as_str()
                );
                let _ = events.send(GoalEvent::Notice {
                    level: NoticeLevel::Error,
                    message: "Error updating goal status. Please try again.".into(),
                });
            }
        });
    }

    fn emit_state(&self, state: &GoalState) {
        let _ = self.events.send(GoalEvent::StateChanged {
            state: state.clone(),
            remaining_secs: state.remaining_secs,
        });
    }

    fn notice(&self, level: NoticeLevel, message: impl Into<String>) {
        let _ = self.events.send(GoalEvent::Notice {
            level,
            message: message.into(),
        });
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicBool, AtomicI64, Ordering};

    use super::*;
    use crate::{
        api::ApiClient,
        auth::{SessionStore, StoredSession},
        config::ClientConfig,
        goal::GoalOutcome,
        models::User,
    };

    struct FakeBackend {
        next_goal_id: AtomicI64,
        fail_create: AtomicBool,
        fail_status: AtomicBool,
        fail_post: AtomicBool,
        status_updates: Mutex<Vec<(i64, GoalStatus)>>,
        posts: Mutex<Vec<(i64, i64, String, String)>>,
    }

    impl FakeBackend {
        fn new() -> Self {
            Self {
                next_goal_id: AtomicI64::new(1),
                fail_create: AtomicBool::new(false),
                fail_status: AtomicBool::new(false),
                fail_post: AtomicBool::new(false),
                status_updates: Mutex::new(Vec::new()),
                posts: Mutex::new(Vec::new()),
            }
        }

        fn rejection() -> ApiError {
            ApiError::Rejected {
                status: 500,
                message: "backend exploded".into(),
            }
        }
    }

    #[async_trait]
    impl GoalBackend for FakeBackend {
        async fn create_goal(
            &self,
            user_id: i64,
            title: &str,
            duration_minutes: u32,
        ) -> Result<Goal, ApiError> {
            if self.fail_create.load(Ordering::SeqCst) {
                return Err(Self::rejection());
            }
            Ok(Goal {
                id: self.next_goal_id.fetch_add(1, Ordering::SeqCst),
                user_id,
                title: title.to_string(),
                duration_minutes,
                status: GoalStatus::InProgress,
                created_at: Utc::now(),
            })
        }

        async fn update_goal_status(
            &self,
            goal_id: i64,
            status: GoalStatus,
        ) -> Result<(), ApiError> {
            if self.fail_status.load(Ordering::SeqCst) {
                return Err(Self::rejection());
            }
            self.status_updates.lock().await.push((goal_id, status));
            Ok(())
        }

        async fn create_post(
            &self,
            user_id: i64,
            goal_id: i64,
            image_url: &str,
            description: &str,
        ) -> Result<Post, ApiError> {
            if self.fail_post.load(Ordering::SeqCst) {
                return Err(Self::rejection());
            }
            self.posts.lock().await.push((
                user_id,
                goal_id,
                image_url.to_string(),
                description.to_string(),
            ));
            Ok(Post {
                post_id: 1,
                user_id,
                goal_id: Some(goal_id),
                image_url: image_url.to_string(),
                description: description.to_string(),
                created_at: Utc::now(),
                like_count: 0,
                comment_count: 0,
                username: None,
                profile_image: None,
            })
        }
    }

    fn auth_service(dir: &tempfile::TempDir, signed_in: bool) -> Arc<AuthService> {
        let mut config = ClientConfig::new("http://localhost:0/api");
        config.data_dir = dir.path().to_path_buf();
        let api = Arc::new(ApiClient::new(&config).unwrap());
        let store = SessionStore::new(dir.path().join("session.json")).unwrap();
        if signed_in {
            store
                .save(StoredSession {
                    token: "tok".into(),
                    user: User {
                        id: 42,
                        username: "harry".into(),
                        email: None,
                        profile_image: None,
                    },
                })
                .unwrap();
        }
        Arc::new(AuthService::new(api, store))
    }

    fn controller(backend: Arc<FakeBackend>, auth: Arc<AuthService>) -> GoalController {
        // Ticks are driven by hand in tests; stretch the interval so the
        // spawned ticker never fires underneath them.
        GoalController::new(backend, auth, Duration::from_secs(3600))
    }

    /// Lets fire-and-forget tasks run on the current-thread test runtime.
    async fn drain_spawned_tasks() {
        for _ in 0..10 {
            tokio::task::yield_now().await;
        }
    }

    #[tokio::test]
    async fn start_requires_authentication() {
        let dir = tempfile::tempdir().unwrap();
        let ctl = controller(Arc::new(FakeBackend::new()), auth_service(&dir, false));

        let err = ctl.start("read", 1).await.unwrap_err();
        assert!(matches!(err, GoalError::NotAuthenticated));
        assert_eq!(ctl.get_state().await.phase, GoalPhase::Idle);
    }

    #[tokio::test]
    async fn start_validates_input_before_any_request() {
        let dir = tempfile::tempdir().unwrap();
        let ctl = controller(Arc::new(FakeBackend::new()), auth_service(&dir, true));

        assert!(matches!(
            ctl.start("   ", 5).await.unwrap_err(),
            GoalError::InvalidInput(_)
        ));
        assert!(matches!(
            ctl.start("read", 0).await.unwrap_err(),
            GoalError::InvalidInput(_)
        ));
        assert_eq!(ctl.get_state().await.phase, GoalPhase::Idle);
    }

    #[tokio::test]
    async fn start_enters_running_with_the_countdown_in_seconds() {
        let dir = tempfile::tempdir().unwrap();
        let ctl = controller(Arc::new(FakeBackend::new()), auth_service(&dir, true));

        let active = ctl.start("read", 5).await.unwrap();
        assert_eq!(active.duration_minutes, 5);

        let snapshot = ctl.get_snapshot().await;
        assert_eq!(snapshot.state.phase, GoalPhase::Running);
        assert_eq!(snapshot.remaining_secs, 300);
    }

    #[tokio::test]
    async fn create_failure_leaves_the_controller_idle() {
        let dir = tempfile::tempdir().unwrap();
        let backend = Arc::new(FakeBackend::new());
        backend.fail_create.store(true, Ordering::SeqCst);
        let ctl = controller(backend, auth_service(&dir, true));

        let err = ctl.start("read", 1).await.unwrap_err();
        assert!(matches!(err, GoalError::Backend(_)));
        assert_eq!(ctl.get_state().await.phase, GoalPhase::Idle);
    }

    #[tokio::test]
    async fn start_while_running_is_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let ctl = controller(Arc::new(FakeBackend::new()), auth_service(&dir, true));

        ctl.start("read", 1).await.unwrap();
        assert!(matches!(
            ctl.start("another", 1).await.unwrap_err(),
            GoalError::GoalAlreadyActive
        ));
    }

    #[tokio::test]
    async fn sixty_ticks_nail_a_one_minute_goal() {
        let dir = tempfile::tempdir().unwrap();
        let backend = Arc::new(FakeBackend::new());
        let ctl = controller(backend.clone(), auth_service(&dir, true));
        let mut events = ctl.subscribe();

        ctl.start("read", 1).await.unwrap();
        for _ in 0..60 {
            ctl.tick().await;
        }
        drain_spawned_tasks().await;

        let state = ctl.get_state().await;
        assert_eq!(state.phase, GoalPhase::NailedIt);
        assert_eq!(state.last_outcome, Some(GoalOutcome::NailedIt));
        assert_eq!(
            backend.status_updates.lock().await.as_slice(),
            &[(1, GoalStatus::NailedIt)]
        );

        // A 61st tick is a no-op; the phase precondition eats it.
        ctl.tick().await;
        assert_eq!(ctl.get_state().await.phase, GoalPhase::NailedIt);

        // First countdown event after the start notice carries 59 seconds.
        let mut first_tick = None;
        while let Ok(event) = events.try_recv() {
            if let GoalEvent::Tick { remaining_secs } = event {
                first_tick = Some(remaining_secs);
                break;
            }
        }
        assert_eq!(first_tick, Some(59));
    }

    #[tokio::test]
    async fn fail_out_is_a_noop_when_idle_or_terminal() {
        let dir = tempfile::tempdir().unwrap();
        let backend = Arc::new(FakeBackend::new());
        let ctl = controller(backend.clone(), auth_service(&dir, true));

        ctl.fail_out().await;
        assert_eq!(ctl.get_state().await.phase, GoalPhase::Idle);

        ctl.start("read", 1).await.unwrap();
        for _ in 0..60 {
            ctl.tick().await;
        }
        drain_spawned_tasks().await;

        // Zero-crossing already processed; an explicit fail changes nothing.
        ctl.fail_out().await;
        let state = ctl.get_state().await;
        assert_eq!(state.phase, GoalPhase::NailedIt);
        assert_eq!(
            backend.status_updates.lock().await.as_slice(),
            &[(1, GoalStatus::NailedIt)]
        );
    }

    #[tokio::test]
    async fn fail_out_discards_the_remaining_counter_and_settles_idle() {
        let dir = tempfile::tempdir().unwrap();
        let backend = Arc::new(FakeBackend::new());
        let ctl = controller(backend.clone(), auth_service(&dir, true));

        ctl.start("pushups", 5).await.unwrap();
        for _ in 0..10 {
            ctl.tick().await;
        }
        ctl.fail_out().await;

        let state = ctl.get_state().await;
        assert_eq!(state.phase, GoalPhase::Idle);
        assert_eq!(state.remaining_secs, 0);
        assert_eq!(state.last_outcome, Some(GoalOutcome::FailedOut));
        assert_eq!(
            backend.status_updates.lock().await.as_slice(),
            &[(1, GoalStatus::FailedOut)]
        );
    }

    #[tokio::test]
    async fn backgrounding_forces_a_fail_out() {
        let dir = tempfile::tempdir().unwrap();
        let backend = Arc::new(FakeBackend::new());
        let ctl = controller(backend.clone(), auth_service(&dir, true));
        let mut events = ctl.subscribe();

        ctl.start("read", 30).await.unwrap();
        ctl.app_state_changed(AppStateChange::Background).await;

        let state = ctl.get_state().await;
        assert_eq!(state.phase, GoalPhase::Idle);
        assert_eq!(state.last_outcome, Some(GoalOutcome::FailedOut));

        let mut saw_forced_failure = false;
        while let Ok(event) = events.try_recv() {
            if let GoalEvent::GoalFailed { forced, .. } = event {
                saw_forced_failure = forced;
            }
        }
        assert!(saw_forced_failure);

        // Becoming active again is never a lifecycle transition.
        ctl.app_state_changed(AppStateChange::Active).await;
        assert_eq!(ctl.get_state().await.phase, GoalPhase::Idle);
    }

    #[tokio::test]
    async fn status_write_failure_never_reverts_a_nailed_goal() {
        let dir = tempfile::tempdir().unwrap();
        let backend = Arc::new(FakeBackend::new());
        backend.fail_status.store(true, Ordering::SeqCst);
        let ctl = controller(backend, auth_service(&dir, true));
        let mut events = ctl.subscribe();

        ctl.start("read", 1).await.unwrap();
        for _ in 0..60 {
            ctl.tick().await;
        }
        drain_spawned_tasks().await;

        assert_eq!(ctl.get_state().await.phase, GoalPhase::NailedIt);

        let mut saw_error_notice = false;
        while let Ok(event) = events.try_recv() {
            if let GoalEvent::Notice {
                level: NoticeLevel::Error,
                ..
            } = event
            {
                saw_error_notice = true;
            }
        }
        assert!(saw_error_notice);
    }

    #[tokio::test]
    async fn status_write_failure_still_settles_a_failed_goal_to_idle() {
        let dir = tempfile::tempdir().unwrap();
        let backend = Arc::new(FakeBackend::new());
        backend.fail_status.store(true, Ordering::SeqCst);
        let ctl = controller(backend, auth_service(&dir, true));

        ctl.start("read", 5).await.unwrap();
        ctl.fail_out().await;

        let state = ctl.get_state().await;
        assert_eq!(state.phase, GoalPhase::Idle);
        assert_eq!(state.last_outcome, Some(GoalOutcome::FailedOut));
    }

    #[tokio::test]
    async fn publish_failure_keeps_the_sub_flow_open_for_a_retry() {
        let dir = tempfile::tempdir().unwrap();
        let backend = Arc::new(FakeBackend::new());
        backend.fail_post.store(true, Ordering::SeqCst);
        let ctl = controller(backend.clone(), auth_service(&dir, true));

        ctl.start("read", 1).await.unwrap();
        for _ in 0..60 {
            ctl.tick().await;
        }
        drain_spawned_tasks().await;

        let err = ctl
            .publish_post("https://cdn.example.com/p.jpg", "done!")
            .await
            .unwrap_err();
        assert!(matches!(err, GoalError::Backend(_)));
        assert_eq!(ctl.get_state().await.phase, GoalPhase::NailedIt);

        backend.fail_post.store(false, Ordering::SeqCst);
        let post = ctl
            .publish_post("https://cdn.example.com/p.jpg", "done!")
            .await
            .unwrap();
        assert_eq!(post.goal_id, Some(1));
        assert_eq!(ctl.get_state().await.phase, GoalPhase::Idle);
    }

    #[tokio::test]
    async fn dismissing_the_completion_returns_to_idle_without_a_post() {
        let dir = tempfile::tempdir().unwrap();
        let backend = Arc::new(FakeBackend::new());
        let ctl = controller(backend.clone(), auth_service(&dir, true));

        ctl.start("read", 1).await.unwrap();
        for _ in 0..60 {
            ctl.tick().await;
        }
        drain_spawned_tasks().await;

        ctl.dismiss_completion().await;
        let state = ctl.get_state().await;
        assert_eq!(state.phase, GoalPhase::Idle);
        assert_eq!(state.last_outcome, Some(GoalOutcome::NailedIt));
        assert!(backend.posts.lock().await.is_empty());
    }

    #[tokio::test]
    async fn publish_without_a_completed_goal_is_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let ctl = controller(Arc::new(FakeBackend::new()), auth_service(&dir, true));

        let err = ctl
            .publish_post("https://cdn.example.com/p.jpg", "done!")
            .await
            .unwrap_err();
        assert!(matches!(err, GoalError::NoCompletedGoal));
    }
}
