//! Studio invitation repository implementation

use chrono::Utc;
use serde_json::json;
use uuid::Uuid;

use super::studio::first_row;
use crate::database::connection::{BackendClient, Query};
use crate::models::invitation::{CreateInvitationRequest, InvitationStatus, InvitationWithStudio, StudioInvitation};
use crate::utils::errors::Result;

const TABLE: &str = "studio_invitations";

#[derive(Debug, Clone)]
pub struct InvitationRepository {
    client: BackendClient,
}

impl InvitationRepository {
    pub fn new(client: BackendClient) -> Self {
        Self { client }
    }

    pub async fn create(&self, request: CreateInvitationRequest) -> Result<StudioInvitation> {
        let rows: Vec<StudioInvitation> = self.client.insert(TABLE, &request).await?;
        first_row(rows, TABLE)
    }

    pub async fn find_by_id(&self, id: Uuid) -> Result<Option<StudioInvitation>> {
        let rows: Vec<StudioInvitation> = self
            .client
            .select(TABLE, &Query::new().select("*").eq("id", id))
            .await?;
        Ok(rows.into_iter().next())
    }

    /// Pending invitations of a studio
    pub async fn list_pending_for_studio(&self, studio_id: Uuid) -> Result<Vec<StudioInvitation>> {
        self.client
            .select(
                TABLE,
                &Query::new()
                    .select("*")
                    .eq("studio_id", studio_id)
                    .eq("status", "pending")
                    .order("created_at", false),
            )
            .await
    }

    /// Pending invitations addressed to an email, with their studios
    pub async fn list_pending_for_email(&self, email: &str) -> Result<Vec<InvitationWithStudio>> {
        self.client
            .select(
                TABLE,
                &Query::new()
                    .select("*,studios(*)")
                    .eq("email", email)
                    .eq("status", "pending"),
            )
            .await
    }

    /// Pending invitation for an email in a studio, if any
    pub async fn find_pending(&self, studio_id: Uuid, email: &str) -> Result<Option<StudioInvitation>> {
        let rows: Vec<StudioInvitation> = self
            .client
            .select(
                TABLE,
                &Query::new()
                    .select("*")
                    .eq("studio_id", studio_id)
                    .eq("email", email)
                    .eq("status", "pending"),
            )
            .await?;
        Ok(rows.into_iter().next())
    }

    /// Mark an invitation accepted or declined
    pub async fn set_status(&self, id: Uuid, status: InvitationStatus) -> Result<()> {
        let body = match status {
            InvitationStatus::Accepted => json!({ "status": status, "accepted_at": Utc::now() }),
            _ => json!({ "status": status }),
        };
        let _: Vec<StudioInvitation> = self
            .client
            .update(TABLE, &Query::new().eq("id", id), &body)
            .await?;
        Ok(())
    }

    pub async fn delete(&self, studio_id: Uuid, id: Uuid) -> Result<()> {
        self.client
            .delete(TABLE, &Query::new().eq("id", id).eq("studio_id", studio_id))
            .await
    }
}
