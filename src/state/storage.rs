//! Local session storage
//!
//! The only state kept on this machine: the auth session, a pending PKCE
//! verifier between `login` and `callback`, and the active studio. Stored as
//! `session.json` in the configured state directory.

use std::path::{Path, PathBuf};
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};
use uuid::Uuid;

use crate::models::AuthSession;
use crate::utils::errors::Result;

const SESSION_FILE: &str = "session.json";

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SessionState {
    pub auth: Option<AuthSession>,
    pub pkce_verifier: Option<String>,
    pub active_studio: Option<Uuid>,
}

/// File-backed session storage
#[derive(Debug, Clone)]
pub struct SessionStorage {
    path: PathBuf,
}

impl SessionStorage {
    pub fn new(state_dir: impl AsRef<Path>) -> Self {
        Self {
            path: state_dir.as_ref().join(SESSION_FILE),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Load the session; a missing or unreadable file is an empty session
    pub async fn load(&self) -> Result<SessionState> {
        match tokio::fs::read(&self.path).await {
            Ok(bytes) => match serde_json::from_slice(&bytes) {
                Ok(state) => Ok(state),
                Err(e) => {
                    warn!(path = %self.path.display(), error = %e, "Ignoring corrupt session file");
                    Ok(SessionState::default())
                }
            },
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(SessionState::default()),
            Err(e) => Err(e.into()),
        }
    }

    pub async fn save(&self, state: &SessionState) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            tokio::fs::create_dir_all(parent).await?;
        }
        let serialized = serde_json::to_vec_pretty(state)?;
        tokio::fs::write(&self.path, serialized).await?;
        debug!(path = %self.path.display(), "Session saved");
        Ok(())
    }

    /// Load, modify and save in one step
    pub async fn update<F>(&self, f: F) -> Result<SessionState>
    where
        F: FnOnce(&mut SessionState),
    {
        let mut state = self.load().await?;
        f(&mut state);
        self.save(&state).await?;
        Ok(state)
    }

    pub async fn set_active_studio(&self, studio_id: Option<Uuid>) -> Result<()> {
        self.update(|state| state.active_studio = studio_id).await?;
        Ok(())
    }

    pub async fn set_auth(&self, auth: Option<AuthSession>) -> Result<()> {
        self.update(|state| state.auth = auth).await?;
        Ok(())
    }

    /// Remove and return the pending PKCE verifier
    pub async fn take_pkce_verifier(&self) -> Result<Option<String>> {
        let mut verifier = None;
        self.update(|state| verifier = state.pkce_verifier.take()).await?;
        Ok(verifier)
    }

    /// Forget everything (sign out)
    pub async fn clear(&self) -> Result<()> {
        self.save(&SessionState::default()).await
    }
}
