//! Studio member management
//!
//! Owners and admins list members, invite by email, remove members and
//! cancel pending invitations.

use tracing::info;
use uuid::Uuid;

use crate::database::DataService;
use crate::models::{CreateInvitationRequest, InvitationStatus, StudioInvitation, StudioRole, StudioUser};
use crate::services::session::{ContextGuard, StudioContext};
use crate::utils::errors::{GearError, Result};
use crate::utils::helpers::normalize_email;
use crate::utils::logging::log_member_action;

const ALREADY_INVITED: &str = "This email has already been invited.";

/// Members and pending invitations of a studio
#[derive(Debug, Clone)]
pub struct MemberRoster {
    pub members: Vec<StudioUser>,
    pub invitations: Vec<StudioInvitation>,
}

#[derive(Debug, Clone)]
pub struct MembersService {
    data: DataService,
    guard: ContextGuard,
}

impl MembersService {
    pub fn new(data: DataService, guard: ContextGuard) -> Self {
        Self { data, guard }
    }

    pub async fn roster(&self, context: &StudioContext) -> Result<MemberRoster> {
        let context = self.guard.require_manager(context).await?;
        let members = self.data.studios.list_members(context.studio_id).await?;
        let invitations = self
            .data
            .invitations
            .list_pending_for_studio(context.studio_id)
            .await?;
        Ok(MemberRoster { members, invitations })
    }

    /// Invite an email address to the studio
    pub async fn invite(&self, context: &StudioContext, email: &str, role: StudioRole) -> Result<StudioInvitation> {
        let context = self.guard.require_manager(context).await?;

        let email = normalize_email(email)
            .ok_or_else(|| GearError::InvalidInput("Please enter a valid email address.".to_string()))?;
        if role == StudioRole::Owner {
            return Err(GearError::InvalidInput("A studio has exactly one owner.".to_string()));
        }

        if self
            .data
            .invitations
            .find_pending(context.studio_id, &email)
            .await?
            .is_some()
        {
            return Err(GearError::StateConflict(ALREADY_INVITED.to_string()));
        }

        let request = CreateInvitationRequest {
            studio_id: context.studio_id,
            email: email.clone(),
            role,
            status: InvitationStatus::Pending,
            invited_by: context.user_id,
        };
        let invitation = match self.data.invitations.create(request).await {
            Ok(invitation) => invitation,
            Err(e) if e.is_duplicate_key() => {
                return Err(GearError::StateConflict(ALREADY_INVITED.to_string()))
            }
            Err(e) => return Err(e),
        };

        log_member_action(context.user_id, "invite", context.studio_id, Some(&email));
        Ok(invitation)
    }

    /// Remove a member. The owner's membership cannot be removed.
    pub async fn remove_member(&self, context: &StudioContext, membership_id: Uuid) -> Result<()> {
        let context = self.guard.require_manager(context).await?;

        let membership = self
            .data
            .studios
            .find_membership_by_id(membership_id)
            .await?
            .filter(|m| m.studio_id == context.studio_id)
            .ok_or_else(|| GearError::NotFound("Member not found".to_string()))?;

        if membership.role == StudioRole::Owner {
            return Err(GearError::PermissionDenied(
                "The studio owner cannot be removed.".to_string(),
            ));
        }

        self.data.studios.remove_membership(membership_id).await?;
        log_member_action(
            context.user_id,
            "remove_member",
            context.studio_id,
            Some(&membership.user_id.to_string()),
        );
        info!(studio_id = %context.studio_id, membership_id = %membership_id, "Member removed");
        Ok(())
    }

    pub async fn cancel_invitation(&self, context: &StudioContext, invitation_id: Uuid) -> Result<()> {
        let context = self.guard.require_manager(context).await?;
        self.data.invitations.delete(context.studio_id, invitation_id).await?;
        log_member_action(
            context.user_id,
            "cancel_invitation",
            context.studio_id,
            Some(&invitation_id.to_string()),
        );
        Ok(())
    }
}
