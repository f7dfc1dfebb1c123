//! Studio and membership models

use serde::{Deserialize, Serialize};
use chrono::{DateTime, Utc};
use uuid::Uuid;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Studio {
    pub id: Uuid,
    pub name: String,
    pub description: Option<String>,
    #[serde(default = "default_timezone")]
    pub timezone: String,
    pub owner_id: Uuid,
    pub created_at: DateTime<Utc>,
}

fn default_timezone() -> String {
    "UTC".to_string()
}

/// Membership row linking a user to a studio
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StudioUser {
    pub id: Uuid,
    pub studio_id: Uuid,
    pub user_id: Uuid,
    pub role: StudioRole,
    pub status: MembershipStatus,
    pub created_at: Option<DateTime<Utc>>,
}

/// Membership joined with its studio (`select=*,studios(*)`)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MembershipWithStudio {
    #[serde(flatten)]
    pub membership: StudioUser,
    #[serde(rename = "studios")]
    pub studio: Option<Studio>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StudioRole {
    Owner,
    Admin,
    Colleague,
}

impl StudioRole {
    /// Owners and admins manage inventory, members and approvals
    pub fn can_manage(&self) -> bool {
        matches!(self, StudioRole::Owner | StudioRole::Admin)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            StudioRole::Owner => "owner",
            StudioRole::Admin => "admin",
            StudioRole::Colleague => "colleague",
        }
    }
}

impl std::fmt::Display for StudioRole {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for StudioRole {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "owner" => Ok(StudioRole::Owner),
            "admin" => Ok(StudioRole::Admin),
            "colleague" => Ok(StudioRole::Colleague),
            other => Err(format!("unknown role '{}'", other)),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MembershipStatus {
    Active,
    Invited,
    Disabled,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateStudioRequest {
    pub name: String,
    pub description: Option<String>,
    pub timezone: String,
    pub owner_id: Uuid,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateMembershipRequest {
    pub studio_id: Uuid,
    pub user_id: Uuid,
    pub role: StudioRole,
    pub status: MembershipStatus,
}
