//! Studio context service
//!
//! Every studio-scoped operation takes an explicit `StudioContext`. The
//! membership row is the source of truth: the context is checked against it
//! when a studio is activated and again before each privileged action. A
//! revoked membership clears the locally remembered studio.

use std::sync::Arc;
use tracing::{info, warn};
use uuid::Uuid;

use crate::database::store::InventoryStore;
use crate::models::{MembershipStatus, StudioRole, StudioUser};
use crate::services::auth::AuthService;
use crate::state::SessionStorage;
use crate::utils::errors::{GearError, Result};

/// Who is acting in which studio
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StudioContext {
    pub studio_id: Uuid,
    pub user_id: Uuid,
    pub role: StudioRole,
}

impl StudioContext {
    pub fn from_membership(membership: &StudioUser) -> Self {
        Self {
            studio_id: membership.studio_id,
            user_id: membership.user_id,
            role: membership.role,
        }
    }

    pub fn can_manage(&self) -> bool {
        self.role.can_manage()
    }
}

/// Re-checks a context against the backend before privileged actions
#[derive(Clone)]
pub struct ContextGuard {
    store: Arc<dyn InventoryStore>,
    storage: Option<SessionStorage>,
}

impl std::fmt::Debug for ContextGuard {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ContextGuard")
            .field("storage", &self.storage)
            .finish_non_exhaustive()
    }
}

impl ContextGuard {
    /// `storage` is cleared when a membership turns out to be revoked
    pub fn new(store: Arc<dyn InventoryStore>, storage: Option<SessionStorage>) -> Self {
        Self { store, storage }
    }

    /// Confirm the membership is still active; returns the context with the
    /// current role
    pub async fn revalidate(&self, context: &StudioContext) -> Result<StudioContext> {
        let membership = self
            .store
            .find_membership(context.studio_id, context.user_id)
            .await?;

        match membership {
            Some(m) if m.status == MembershipStatus::Active => Ok(StudioContext::from_membership(&m)),
            _ => {
                warn!(
                    studio_id = %context.studio_id,
                    user_id = %context.user_id,
                    "Studio membership no longer active"
                );
                self.forget_studio(context.studio_id).await;
                Err(GearError::PermissionDenied(
                    "You no longer have access to this studio.".to_string(),
                ))
            }
        }
    }

    /// Revalidate and require an owner or admin role
    pub async fn require_manager(&self, context: &StudioContext) -> Result<StudioContext> {
        let current = self.revalidate(context).await?;
        if !current.can_manage() {
            return Err(GearError::PermissionDenied(
                "Only studio owners and admins can do that.".to_string(),
            ));
        }
        Ok(current)
    }

    async fn forget_studio(&self, studio_id: Uuid) {
        let Some(storage) = &self.storage else {
            return;
        };
        let result = storage
            .update(|state| {
                if state.active_studio == Some(studio_id) {
                    state.active_studio = None;
                }
            })
            .await;
        if let Err(e) = result {
            warn!(error = %e, "Failed to clear active studio");
        }
    }
}

/// Resolves the signed-in user's active studio
#[derive(Debug, Clone)]
pub struct SessionService {
    auth: AuthService,
    storage: SessionStorage,
    guard: ContextGuard,
}

impl SessionService {
    pub fn new(auth: AuthService, storage: SessionStorage, guard: ContextGuard) -> Self {
        Self { auth, storage, guard }
    }

    /// Validate membership and remember the studio for later commands
    pub async fn activate_studio(&self, studio_id: Uuid) -> Result<StudioContext> {
        let session = self.auth.require_session().await?;
        let candidate = StudioContext {
            studio_id,
            user_id: session.user.id,
            role: StudioRole::Colleague,
        };
        let context = self.guard.revalidate(&candidate).await?;
        self.storage.set_active_studio(Some(studio_id)).await?;
        info!(studio_id = %studio_id, user_id = %context.user_id, role = %context.role, "Active studio set");
        Ok(context)
    }

    /// Context for the remembered studio, revalidated against the backend
    pub async fn current_context(&self) -> Result<StudioContext> {
        let session = self.auth.require_session().await?;
        let state = self.storage.load().await?;
        let studio_id = state.active_studio.ok_or_else(|| {
            GearError::InvalidInput("Please select or create a studio first".to_string())
        })?;
        let candidate = StudioContext {
            studio_id,
            user_id: session.user.id,
            role: StudioRole::Colleague,
        };
        self.guard.revalidate(&candidate).await
    }

    pub fn guard(&self) -> &ContextGuard {
        &self.guard
    }
}
