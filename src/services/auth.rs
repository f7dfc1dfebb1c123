//! Authentication service implementation
//!
//! OAuth sign-in against the backend's auth endpoints using the PKCE flow:
//! `begin_sign_in` stores a verifier and returns the provider URL, the user
//! signs in in a browser, and `complete_sign_in` trades the returned code for
//! a session. Sessions are refreshed shortly before they expire.

use base64::{engine::general_purpose::URL_SAFE_NO_PAD, Engine as _};
use chrono::Utc;
use jsonwebtoken::{decode, Algorithm, DecodingKey, Validation};
use rand::{distributions::Alphanumeric, Rng};
use reqwest::Method;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use tracing::{debug, info, warn};
use url::Url;
use uuid::Uuid;

use crate::config::AuthConfig;
use crate::database::connection::{decode_json, BackendClient};
use crate::models::{AuthSession, AuthUser};
use crate::state::SessionStorage;
use crate::utils::errors::{GearError, Result};

/// Refresh the access token when it expires within this many seconds
const REFRESH_MARGIN_SECONDS: i64 = 60;

/// Claims read from the access token
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AccessClaims {
    pub sub: Uuid,
    pub email: Option<String>,
    pub exp: i64,
    pub role: Option<String>,
}

#[derive(Debug, Deserialize)]
struct TokenResponse {
    access_token: String,
    refresh_token: String,
    token_type: Option<String>,
    expires_in: Option<i64>,
    expires_at: Option<i64>,
    user: AuthUser,
}

impl TokenResponse {
    fn into_session(self) -> AuthSession {
        let expires_at = self
            .expires_at
            .or_else(|| self.expires_in.map(|secs| Utc::now().timestamp() + secs))
            .or_else(|| token_claims(&self.access_token).ok().map(|c| c.exp));
        AuthSession {
            access_token: self.access_token,
            refresh_token: self.refresh_token,
            token_type: self.token_type.unwrap_or_else(|| "bearer".to_string()),
            expires_at,
            user: self.user,
        }
    }
}

/// Generate a PKCE verifier and its S256 challenge
pub fn generate_pkce_pair() -> (String, String) {
    let verifier: String = rand::thread_rng()
        .sample_iter(&Alphanumeric)
        .take(64)
        .map(char::from)
        .collect();
    let challenge = pkce_challenge(&verifier);
    (verifier, challenge)
}

pub fn pkce_challenge(verifier: &str) -> String {
    URL_SAFE_NO_PAD.encode(Sha256::digest(verifier.as_bytes()))
}

/// Read the claims of an access token without verifying its signature.
/// The backend verifies tokens; this is only used for display and expiry.
pub fn token_claims(access_token: &str) -> Result<AccessClaims> {
    let mut validation = Validation::new(Algorithm::HS256);
    validation.insecure_disable_signature_validation();
    validation.validate_exp = false;
    validation.validate_aud = false;
    validation.required_spec_claims.clear();

    decode::<AccessClaims>(access_token, &DecodingKey::from_secret(&[]), &validation)
        .map(|data| data.claims)
        .map_err(|e| GearError::Authentication(format!("Unreadable access token: {}", e)))
}

/// Pull the auth code out of a pasted redirect URL, or accept a bare code
pub fn extract_auth_code(input: &str) -> Option<String> {
    let input = input.trim();
    if input.is_empty() {
        return None;
    }
    match Url::parse(input) {
        Ok(url) => url
            .query_pairs()
            .find(|(key, _)| key == "code")
            .map(|(_, value)| value.into_owned()),
        Err(_) => Some(input.to_string()),
    }
}

/// Authentication service for the signed-in user
#[derive(Debug, Clone)]
pub struct AuthService {
    client: BackendClient,
    config: AuthConfig,
    storage: SessionStorage,
}

impl AuthService {
    /// Create a new AuthService instance
    pub fn new(client: BackendClient, config: AuthConfig, storage: SessionStorage) -> Self {
        Self { client, config, storage }
    }

    /// Store a fresh PKCE verifier and return the provider sign-in URL
    pub async fn begin_sign_in(&self) -> Result<Url> {
        let (verifier, challenge) = generate_pkce_pair();
        self.storage
            .update(|state| state.pkce_verifier = Some(verifier))
            .await?;

        let mut url = self.client.endpoint("auth/v1/authorize")?;
        url.query_pairs_mut()
            .append_pair("provider", &self.config.provider)
            .append_pair("redirect_to", &self.config.redirect_url)
            .append_pair("code_challenge", &challenge)
            .append_pair("code_challenge_method", "s256");

        info!(provider = %self.config.provider, "Sign-in started");
        Ok(url)
    }

    /// Exchange the auth code from the redirect for a session
    pub async fn complete_sign_in(&self, auth_code: &str) -> Result<AuthSession> {
        let verifier = self.storage.take_pkce_verifier().await?.ok_or_else(|| {
            GearError::Authentication("No sign-in in progress. Run `login` first.".to_string())
        })?;

        let session = self
            .token_request(
                "pkce",
                &serde_json::json!({ "auth_code": auth_code, "code_verifier": verifier }),
            )
            .await?;

        self.storage.set_auth(Some(session.clone())).await?;
        self.client.set_access_token(Some(session.access_token.clone()));
        info!(user_id = %session.user.id, "Signed in");
        Ok(session)
    }

    /// Trade a refresh token for a new session
    pub async fn refresh(&self, session: &AuthSession) -> Result<AuthSession> {
        debug!(user_id = %session.user.id, "Refreshing session");
        let refreshed = self
            .token_request(
                "refresh_token",
                &serde_json::json!({ "refresh_token": session.refresh_token }),
            )
            .await?;
        self.storage.set_auth(Some(refreshed.clone())).await?;
        Ok(refreshed)
    }

    async fn token_request(&self, grant_type: &str, body: &serde_json::Value) -> Result<AuthSession> {
        let mut url = self.client.endpoint("auth/v1/token")?;
        url.query_pairs_mut().append_pair("grant_type", grant_type);

        let request = self
            .client
            .anonymous_request(Method::POST, url)
            .json(body);
        let response = self.client.send(request).await.map_err(|e| match e {
            GearError::Backend(crate::utils::errors::BackendError::Api { message, .. }) => {
                GearError::Authentication(message)
            }
            other => other,
        })?;
        let token: TokenResponse = decode_json(response).await?;
        Ok(token.into_session())
    }

    /// Load the stored session, refreshing it if it is about to expire, and
    /// attach its token to the backend client
    pub async fn current_session(&self) -> Result<Option<AuthSession>> {
        let state = self.storage.load().await?;
        let Some(session) = state.auth else {
            return Ok(None);
        };

        let session = if session.expires_within(Utc::now().timestamp(), REFRESH_MARGIN_SECONDS) {
            match self.refresh(&session).await {
                Ok(refreshed) => refreshed,
                Err(e) => {
                    warn!(error = %e, "Session refresh failed");
                    self.storage.set_auth(None).await?;
                    return Ok(None);
                }
            }
        } else {
            session
        };

        self.client.set_access_token(Some(session.access_token.clone()));
        Ok(Some(session))
    }

    /// Current session or an authentication error
    pub async fn require_session(&self) -> Result<AuthSession> {
        self.current_session()
            .await?
            .ok_or_else(|| GearError::Authentication("Not signed in. Run `login` first.".to_string()))
    }

    /// Fetch the signed-in user from the auth server
    pub async fn fetch_user(&self) -> Result<AuthUser> {
        let url = self.client.endpoint("auth/v1/user")?;
        let response = self.client.send(self.client.request(Method::GET, url)).await?;
        decode_json(response).await
    }

    /// Revoke the session and forget local state
    pub async fn sign_out(&self) -> Result<()> {
        if self.client.access_token().is_some() {
            let url = self.client.endpoint("auth/v1/logout")?;
            if let Err(e) = self.client.send(self.client.request(Method::POST, url)).await {
                warn!(error = %e, "Remote sign-out failed");
            }
        }
        self.client.set_access_token(None);
        self.storage.clear().await?;
        info!("Signed out");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use jsonwebtoken::{encode, EncodingKey, Header};

    #[test]
    fn test_pkce_pair() {
        let (verifier, challenge) = generate_pkce_pair();
        assert_eq!(verifier.len(), 64);
        assert_eq!(challenge, pkce_challenge(&verifier));
        assert!(!challenge.contains('='));
    }

    #[test]
    fn test_known_pkce_challenge() {
        // RFC 7636 appendix B
        assert_eq!(
            pkce_challenge("dBjftJeZ4CVP-mB92K27uhbUJU1p1r_wW1gFWFOEjXk"),
            "E9Melhoa2OwvFrEMTJguCHaoeK1t8URWbuGJSstw-cM"
        );
    }

    #[test]
    fn test_token_claims_without_key() {
        let user_id = Uuid::new_v4();
        let claims = AccessClaims {
            sub: user_id,
            email: Some("alex@studio.io".to_string()),
            exp: 1_900_000_000,
            role: Some("authenticated".to_string()),
        };
        let token = encode(&Header::default(), &claims, &EncodingKey::from_secret(b"server-secret")).unwrap();

        let read = token_claims(&token).unwrap();
        assert_eq!(read.sub, user_id);
        assert_eq!(read.exp, 1_900_000_000);
    }

    #[test]
    fn test_extract_auth_code() {
        assert_eq!(
            extract_auth_code("http://localhost:3000/auth/callback?code=abc123&state=x"),
            Some("abc123".to_string())
        );
        assert_eq!(extract_auth_code(" abc123 "), Some("abc123".to_string()));
        assert_eq!(extract_auth_code("http://localhost:3000/auth/callback"), None);
        assert_eq!(extract_auth_code(""), None);
    }
}
