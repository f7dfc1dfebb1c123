//! Studio onboarding, dashboard and activity log

use std::collections::HashSet;

use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::database::repositories::ActivityFilter;
use crate::database::DataService;
use crate::models::{
    ApprovalStatus, AuthUser, CreateMembershipRequest, CreateStudioRequest, InvitationStatus,
    InvitationWithStudio, MembershipStatus, MembershipWithStudio, Studio, StudioInvitation, StudioRole, Transaction,
    TransactionRecord, TransactionType,
};
use crate::services::session::{ContextGuard, StudioContext};
use crate::utils::errors::{GearError, Result};
use crate::utils::helpers::normalize_email;
use crate::utils::logging::log_member_action;

const USER_RECENT: usize = 10;
const OWNED_RECENT: usize = 5;
const ACTIVITY_LIMIT: usize = 50;

/// Everything shown on the landing screen
#[derive(Debug, Clone, Default)]
pub struct Dashboard {
    pub owned: Vec<Studio>,
    /// Studios the user belongs to without owning them
    pub memberships: Vec<MembershipWithStudio>,
    pub invitations: Vec<InvitationWithStudio>,
    pub recent: Vec<TransactionRecord>,
    /// Latest activity across owned studios
    pub studio_activity: Vec<TransactionRecord>,
}

#[derive(Debug, Clone)]
pub struct StudioService {
    data: DataService,
    guard: ContextGuard,
}

impl StudioService {
    pub fn new(data: DataService, guard: ContextGuard) -> Self {
        Self { data, guard }
    }

    /// Create a studio owned by `user`
    pub async fn create_studio(
        &self,
        user: &AuthUser,
        name: &str,
        description: Option<String>,
        timezone: Option<String>,
    ) -> Result<Studio> {
        let name = name.trim();
        if name.is_empty() {
            return Err(GearError::InvalidInput("Please enter a studio name".to_string()));
        }

        let studio = self
            .data
            .studios
            .create(CreateStudioRequest {
                name: name.to_string(),
                description: description.filter(|d| !d.trim().is_empty()),
                timezone: timezone.unwrap_or_else(|| "UTC".to_string()),
                owner_id: user.id,
            })
            .await?;

        self.data
            .studios
            .add_membership(CreateMembershipRequest {
                studio_id: studio.id,
                user_id: user.id,
                role: StudioRole::Owner,
                status: MembershipStatus::Active,
            })
            .await?;

        info!(studio_id = %studio.id, owner_id = %user.id, "Studio created");
        Ok(studio)
    }

    /// Join the studio an invitation points to
    pub async fn accept_invitation(&self, user: &AuthUser, invitation_id: Uuid) -> Result<StudioContext> {
        let invitation = self.pending_invitation_for(user, invitation_id).await?;

        let membership = self
            .data
            .studios
            .add_membership(CreateMembershipRequest {
                studio_id: invitation.studio_id,
                user_id: user.id,
                role: invitation.role,
                status: MembershipStatus::Active,
            })
            .await;

        let context = match membership {
            Ok(m) => StudioContext::from_membership(&m),
            Err(e) if e.is_duplicate_key() => {
                debug!(studio_id = %invitation.studio_id, "Already a member");
                let existing = self
                    .data
                    .studios
                    .find_membership(invitation.studio_id, user.id)
                    .await?
                    .ok_or_else(|| GearError::NotFound("Membership not found".to_string()))?;
                StudioContext::from_membership(&existing)
            }
            Err(e) => return Err(e),
        };

        self.data
            .invitations
            .set_status(invitation.id, InvitationStatus::Accepted)
            .await?;
        log_member_action(user.id, "accept_invitation", invitation.studio_id, None);
        Ok(context)
    }

    pub async fn decline_invitation(&self, user: &AuthUser, invitation_id: Uuid) -> Result<()> {
        let invitation = self.pending_invitation_for(user, invitation_id).await?;
        self.data
            .invitations
            .set_status(invitation.id, InvitationStatus::Declined)
            .await?;
        log_member_action(user.id, "decline_invitation", invitation.studio_id, None);
        Ok(())
    }

    async fn pending_invitation_for(
        &self,
        user: &AuthUser,
        invitation_id: Uuid,
    ) -> Result<StudioInvitation> {
        let invitation = self
            .data
            .invitations
            .find_by_id(invitation_id)
            .await?
            .filter(|i| i.status == InvitationStatus::Pending)
            .ok_or_else(|| GearError::NotFound("Invitation not found".to_string()))?;

        let email = user.email.as_deref().and_then(normalize_email);
        if email.as_deref() != Some(invitation.email.as_str()) {
            return Err(GearError::PermissionDenied(
                "This invitation was sent to a different email address.".to_string(),
            ));
        }
        Ok(invitation)
    }

    pub async fn dashboard(&self, user: &AuthUser) -> Result<Dashboard> {
        let owned = self.data.studios.list_owned(user.id).await?;
        let owned_ids: Vec<Uuid> = owned.iter().map(|s| s.id).collect();

        let memberships: Vec<MembershipWithStudio> = self
            .data
            .studios
            .list_memberships(user.id)
            .await?
            .into_iter()
            .filter(|m| m.membership.role != StudioRole::Owner && !owned_ids.contains(&m.membership.studio_id))
            .collect();

        let joined: HashSet<Uuid> = owned_ids
            .iter()
            .copied()
            .chain(memberships.iter().map(|m| m.membership.studio_id))
            .collect();

        let invitations = match user.email.as_deref().and_then(normalize_email) {
            Some(email) => self
                .data
                .invitations
                .list_pending_for_email(&email)
                .await?
                .into_iter()
                .filter(|i| !joined.contains(&i.invitation.studio_id))
                .collect(),
            None => {
                warn!(user_id = %user.id, "Signed-in user has no email; skipping invitations");
                Vec::new()
            }
        };

        let recent = self.data.transactions.list_for_user(user.id, USER_RECENT).await?;
        let studio_activity = if owned_ids.is_empty() {
            Vec::new()
        } else {
            self.data
                .transactions
                .list_for_studios(&owned_ids, OWNED_RECENT)
                .await?
        };

        Ok(Dashboard {
            owned,
            memberships,
            invitations,
            recent,
            studio_activity,
        })
    }

    /// Latest transactions of the studio. Colleagues only see their own.
    pub async fn activity(&self, context: &StudioContext, kind: Option<TransactionType>) -> Result<Vec<TransactionRecord>> {
        let context = self.guard.revalidate(context).await?;
        let filter = ActivityFilter {
            kind,
            user_id: (!context.can_manage()).then_some(context.user_id),
            limit: ACTIVITY_LIMIT,
        };
        self.data.transactions.list_for_studio(context.studio_id, &filter).await
    }

    /// Approve or deny a pending transaction
    pub async fn review(&self, context: &StudioContext, transaction_id: Uuid, approve: bool) -> Result<Transaction> {
        let context = self.guard.require_manager(context).await?;
        let status = if approve {
            ApprovalStatus::Approved
        } else {
            ApprovalStatus::Denied
        };

        let transaction = self
            .data
            .transactions
            .set_approval(context.studio_id, transaction_id, status)
            .await?
            .ok_or_else(|| GearError::NotFound("No pending transaction with that id.".to_string()))?;

        info!(
            studio_id = %context.studio_id,
            transaction_id = %transaction_id,
            reviewer = %context.user_id,
            status = ?status,
            "Transaction reviewed"
        );
        Ok(transaction)
    }
}
