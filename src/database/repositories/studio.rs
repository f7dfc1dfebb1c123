//! Studio and membership repository implementation

use uuid::Uuid;
use crate::database::connection::{BackendClient, Query};
use crate::models::studio::{
    CreateMembershipRequest, CreateStudioRequest, MembershipWithStudio, Studio, StudioUser,
};
use crate::utils::errors::{BackendError, GearError, Result};

#[derive(Debug, Clone)]
pub struct StudioRepository {
    client: BackendClient,
}

impl StudioRepository {
    pub fn new(client: BackendClient) -> Self {
        Self { client }
    }

    /// Create a new studio
    pub async fn create(&self, request: CreateStudioRequest) -> Result<Studio> {
        let rows: Vec<Studio> = self.client.insert("studios", &request).await?;
        first_row(rows, "studios")
    }

    /// Find studio by ID
    pub async fn find_by_id(&self, id: Uuid) -> Result<Option<Studio>> {
        let rows: Vec<Studio> = self
            .client
            .select("studios", &Query::new().select("*").eq("id", id))
            .await?;
        Ok(rows.into_iter().next())
    }

    /// Studios owned by a user
    pub async fn list_owned(&self, owner_id: Uuid) -> Result<Vec<Studio>> {
        self.client
            .select(
                "studios",
                &Query::new().select("*").eq("owner_id", owner_id).order("created_at", false),
            )
            .await
    }

    /// Memberships of a user, each with its studio
    pub async fn list_memberships(&self, user_id: Uuid) -> Result<Vec<MembershipWithStudio>> {
        self.client
            .select(
                "studio_users",
                &Query::new().select("*,studios(*)").eq("user_id", user_id),
            )
            .await
    }

    /// Membership row for a user in a studio
    pub async fn find_membership(&self, studio_id: Uuid, user_id: Uuid) -> Result<Option<StudioUser>> {
        let rows: Vec<StudioUser> = self
            .client
            .select(
                "studio_users",
                &Query::new().select("*").eq("studio_id", studio_id).eq("user_id", user_id),
            )
            .await?;
        Ok(rows.into_iter().next())
    }

    /// All members of a studio
    pub async fn list_members(&self, studio_id: Uuid) -> Result<Vec<StudioUser>> {
        self.client
            .select(
                "studio_users",
                &Query::new().select("*").eq("studio_id", studio_id).order("created_at", true),
            )
            .await
    }

    /// Add a member to a studio
    pub async fn add_membership(&self, request: CreateMembershipRequest) -> Result<StudioUser> {
        let rows: Vec<StudioUser> = self.client.insert("studio_users", &request).await?;
        first_row(rows, "studio_users")
    }

    /// Remove a membership row
    pub async fn remove_membership(&self, membership_id: Uuid) -> Result<()> {
        self.client
            .delete("studio_users", &Query::new().eq("id", membership_id))
            .await
    }

    pub async fn find_membership_by_id(&self, membership_id: Uuid) -> Result<Option<StudioUser>> {
        let rows: Vec<StudioUser> = self
            .client
            .select("studio_users", &Query::new().select("*").eq("id", membership_id))
            .await?;
        Ok(rows.into_iter().next())
    }
}

/// First row of a `return=representation` response
pub(crate) fn first_row<T>(rows: Vec<T>, table: &str) -> Result<T> {
    rows.into_iter().next().ok_or_else(|| {
        GearError::Backend(BackendError::InvalidResponse(format!(
            "{} write returned no rows",
            table
        )))
    })
}
