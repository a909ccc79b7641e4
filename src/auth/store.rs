use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::{fs, path::PathBuf, sync::RwLock};

use crate::models::User;

/// The persisted session: bearer token plus the signed-in user.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct StoredSession {
    pub token: String,
    pub user: User,
}

/// File-backed session storage under the platform data directory. A corrupt
/// or missing file reads as "signed out" rather than an error.
pub struct SessionStore {
    path: PathBuf,
    data: RwLock<Option<StoredSession>>,
}

impl SessionStore {
    pub fn new(path: PathBuf) -> Result<Self> {
        let data = if path.exists() {
            let contents = fs::read_to_string(&path)
                .with_context(|| format!("Failed to read session from {}", path.display()))?;
            serde_json::from_str(&contents).unwrap_or_default()
        } else {
            None
        };

        Ok(Self {
            path,
            data: RwLock::new(data),
        })
    }

    pub fn current(&self) -> Option<StoredSession> {
        self.data.read().unwrap().clone()
    }

    pub fn save(&self, session: StoredSession) -> Result<()> {
        let mut guard = self.data.write().unwrap();
        *guard = Some(session);
        self.persist(guard.as_ref())
    }

    /// Rewrites the stored user, keeping the token. No-op when signed out.
    pub fn update_user(&self, user: User) -> Result<()> {
        let mut guard = self.data.write().unwrap();
        if let Some(session) = guard.as_mut() {
            session.user = user;
            return self.persist(guard.as_ref());
        }
        Ok(())
    }

    pub fn clear(&self) -> Result<()> {
        let mut guard = self.data.write().unwrap();
        *guard = None;
        if self.path.exists() {
            fs::remove_file(&self.path)
                .with_context(|| format!("Failed to remove session at {}", self.path.display()))?;
        }
        Ok(())
    }

    fn persist(&self, data: Option<&StoredSession>) -> Result<()> {
        let Some(session) = data else {
            return Ok(());
        };
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent)
                .with_context(|| format!("Failed to create {}", parent.display()))?;
        }
        let serialized = serde_json::to_string_pretty(session)?;
        fs::write(&self.path, serialized)
            .with_context(|| format!("Failed to write session to {}", self.path.display()))
    }
}
