//! Auth session model (token endpoint response)

use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AuthUser {
    pub id: Uuid,
    pub email: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AuthSession {
    pub access_token: String,
    pub refresh_token: String,
    #[serde(default = "default_token_type")]
    pub token_type: String,
    /// Unix seconds
    pub expires_at: Option<i64>,
    pub user: AuthUser,
}

fn default_token_type() -> String {
    "bearer".to_string()
}

impl AuthSession {
    /// True when the access token expires within `margin_seconds`
    pub fn expires_within(&self, now: i64, margin_seconds: i64) -> bool {
        match self.expires_at {
            Some(expires_at) => expires_at - now <= margin_seconds,
            None => false,
        }
    }
}
