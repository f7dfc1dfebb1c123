//! Studio invitation model

use serde::{Deserialize, Serialize};
use chrono::{DateTime, Utc};
use uuid::Uuid;

use super::studio::{Studio, StudioRole};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StudioInvitation {
    pub id: Uuid,
    pub studio_id: Uuid,
    pub email: String,
    pub role: StudioRole,
    pub status: InvitationStatus,
    pub invited_by: Option<Uuid>,
    pub created_at: DateTime<Utc>,
    pub accepted_at: Option<DateTime<Utc>>,
}

/// Invitation joined with its studio (`select=*,studios(*)`)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InvitationWithStudio {
    #[serde(flatten)]
    pub invitation: StudioInvitation,
    #[serde(rename = "studios")]
    pub studio: Option<Studio>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum InvitationStatus {
    Pending,
    Accepted,
    Declined,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateInvitationRequest {
    pub studio_id: Uuid,
    pub email: String,
    pub role: StudioRole,
    pub status: InvitationStatus,
    pub invited_by: Uuid,
}
