//! Session lifecycle: login/signup, token verification on startup, profile
//! and password flows. The persisted session lives in [`store::SessionStore`];
//! the bearer token is pushed into the shared [`ApiClient`] so every request
//! picks it up.

use std::{path::Path, sync::Arc};

use log::{error, warn};
use thiserror::Error;

use crate::{
    api::{ApiClient, ApiError, AuthPayload, PasswordResetChallenge},
    models::User,
};

pub mod store;

pub use store::{SessionStore, StoredSession};

#[derive(Debug, Error)]
pub enum AuthError {
    #[error("not authenticated")]
    NotAuthenticated,

    #[error("{0}")]
    InvalidInput(String),

    #[error(transparent)]
    Api(#[from] ApiError),
}

pub struct AuthService {
    api: Arc<ApiClient>,
    store: SessionStore,
}

impl AuthService {
    /// Restores any persisted session into memory. The token is not yet
    /// trusted; call [`AuthService::initialize`] to verify it remotely.
    pub fn new(api: Arc<ApiClient>, store: SessionStore) -> Self {
        if let Some(session) = store.current() {
            api.set_token(Some(session.token));
        }
        Self { api, store }
    }

    /// Startup check: verify the restored token against the backend and
    /// drop the session when it no longer holds. Returns whether a valid
    /// session survived.
    pub async fn initialize(&self) -> bool {
        if self.store.current().is_none() {
            return false;
        }
        match self.api.verify_token().await {
            Ok(true) => true,
            Ok(false) => {
                warn!("Stored token is no longer valid; signing out");
                self.clear_session();
                false
            }
            Err(err) => {
                error!("Token verification failed: {err}");
                self.clear_session();
                false
            }
        }
    }

    pub fn current_user(&self) -> Option<User> {
        self.store.current().map(|session| session.user)
    }

    pub fn is_logged_in(&self) -> bool {
        self.store.current().is_some()
    }

    pub async fn signup(
        &self,
        username: &str,
        email: &str,
        password: &str,
    ) -> Result<User, AuthError> {
        let payload = self.api.signup(username, email, password).await?;
        Ok(self.adopt_session(payload))
    }

    pub async fn login(&self, email: &str, password: &str) -> Result<User, AuthError> {
        let payload = self.api.login(email, password).await?;
        Ok(self.adopt_session(payload))
    }

    pub fn logout(&self) {
        self.clear_session();
    }

    /// Fetches another user's public profile (the "viewed user" on their
    /// dashboard).
    pub async fn fetch_user(&self, user_id: i64) -> Result<User, AuthError> {
        Ok(self.api.fetch_profile(user_id).await?)
    }

    /// Re-fetches the signed-in user's profile and refreshes the stored copy.
    pub async fn refresh_profile(&self) -> Result<User, AuthError> {
        let user = self.require_user()?;
        let profile = self.api.fetch_profile(user.id).await?;
        self.remember_user(profile.clone());
        Ok(profile)
    }

    pub async fn update_username(&self, username: &str) -> Result<User, AuthError> {
        let user = self.require_user()?;
        let username = username.trim();
        if username.is_empty() {
            return Err(AuthError::InvalidInput("Username cannot be empty".into()));
        }
        let updated = self.api.update_profile(user.id, username).await?;
        self.remember_user(updated.clone());
        Ok(updated)
    }

    pub async fn update_profile_image(&self, image: &Path) -> Result<User, AuthError> {
        let user = self.require_user()?;
        let updated = self.api.upload_profile_image(user.id, image).await?;
        self.remember_user(updated.clone());
        Ok(updated)
    }

    pub async fn request_password_reset(
        &self,
        email: &str,
    ) -> Result<PasswordResetChallenge, AuthError> {
        Ok(self.api.request_password_reset(email).await?)
    }

    pub async fn verify_reset_code(&self, email: &str, code: u32) -> Result<String, AuthError> {
        Ok(self.api.verify_reset_code(email, code).await?)
    }

    pub async fn reset_password(
        &self,
        email: &str,
        code: u32,
        new_password: &str,
    ) -> Result<String, AuthError> {
        Ok(self.api.reset_password(email, code, new_password).await?)
    }

    pub async fn verify_current_password(
        &self,
        email: &str,
        current_password: &str,
    ) -> Result<(), AuthError> {
        Ok(self
            .api
            .verify_current_password(email, current_password)
            .await?)
    }

    pub async fn change_password(
        &self,
        email: &str,
        current_password: &str,
        new_password: &str,
    ) -> Result<(), AuthError> {
        Ok(self
            .api
            .change_password(email, current_password, new_password)
            .await?)
    }

    /// Deletes the account remotely, then signs out locally.
    pub async fn delete_account(&self) -> Result<(), AuthError> {
        let user = self.require_user()?;
        self.api.delete_user(user.id).await?;
        self.clear_session();
        Ok(())
    }

    fn require_user(&self) -> Result<User, AuthError> {
        self.current_user().ok_or(AuthError::NotAuthenticated)
    }

    fn adopt_session(&self, payload: AuthPayload) -> User {
        self.api.set_token(Some(payload.token.clone()));
        if let Err(err) = self.store.save(StoredSession {
            token: payload.token,
            user: payload.user.clone(),
        }) {
            warn!("Failed to persist session: {err:#}");
        }
        payload.user
    }

    fn remember_user(&self, user: User) {
        if let Err(err) = self.store.update_user(user) {
            warn!("Failed to persist profile update: {err:#}");
        }
    }

    fn clear_session(&self) {
        self.api.set_token(None);
        if let Err(err) = self.store.clear() {
            warn!("Failed to clear stored session: {err:#}");
        }
    }
}
