//! Backend connection management
//!
//! A thin typed client over the hosted backend's REST (PostgREST), auth
//! (GoTrue) and object storage endpoints. Every request carries the project
//! anon key and, once signed in, the user's access token.

use std::sync::{Arc, RwLock};
use std::time::{Duration, Instant};

use reqwest::{Method, RequestBuilder, Response};
use serde::{de::DeserializeOwned, Serialize};
use tracing::debug;
use url::Url;

use crate::config::BackendConfig;
use crate::utils::errors::{BackendError, GearError, Result};
use crate::utils::logging;

/// Filter/ordering parameters for a REST table request
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Query {
    params: Vec<(String, String)>,
}

impl Query {
    pub fn new() -> Self {
        Self::default()
    }

    /// Columns to return, including embedded relations (`*,equipment(*)`)
    pub fn select(mut self, columns: &str) -> Self {
        self.params.push(("select".to_string(), columns.to_string()));
        self
    }

    pub fn eq(mut self, column: &str, value: impl std::fmt::Display) -> Self {
        self.params.push((column.to_string(), format!("eq.{}", value)));
        self
    }

    pub fn neq(mut self, column: &str, value: impl std::fmt::Display) -> Self {
        self.params.push((column.to_string(), format!("neq.{}", value)));
        self
    }

    pub fn in_list<T: std::fmt::Display>(mut self, column: &str, values: &[T]) -> Self {
        let joined = values.iter().map(|v| v.to_string()).collect::<Vec<_>>().join(",");
        self.params.push((column.to_string(), format!("in.({})", joined)));
        self
    }

    /// Case-insensitive substring match
    pub fn ilike(mut self, column: &str, needle: &str) -> Self {
        self.params.push((column.to_string(), format!("ilike.*{}*", needle)));
        self
    }

    pub fn order(mut self, column: &str, ascending: bool) -> Self {
        let direction = if ascending { "asc" } else { "desc" };
        self.params.push(("order".to_string(), format!("{}.{}", column, direction)));
        self
    }

    pub fn limit(mut self, limit: usize) -> Self {
        self.params.push(("limit".to_string(), limit.to_string()));
        self
    }

    pub fn params(&self) -> &[(String, String)] {
        &self.params
    }
}

/// Shared HTTP client for the hosted backend
#[derive(Debug, Clone)]
pub struct BackendClient {
    http: reqwest::Client,
    base_url: Url,
    anon_key: String,
    access_token: Arc<RwLock<Option<String>>>,
}

impl BackendClient {
    /// Create a new client from configuration
    pub fn new(config: &BackendConfig) -> Result<Self> {
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_seconds))
            .user_agent(concat!("StudioGear/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(GearError::Http)?;

        let mut base_url = Url::parse(&config.url)?;
        if !base_url.path().ends_with('/') {
            let path = format!("{}/", base_url.path());
            base_url.set_path(&path);
        }

        Ok(Self {
            http,
            base_url,
            anon_key: config.anon_key.clone(),
            access_token: Arc::new(RwLock::new(None)),
        })
    }

    /// Use the given user access token for subsequent requests
    pub fn set_access_token(&self, token: Option<String>) {
        if let Ok(mut guard) = self.access_token.write() {
            *guard = token;
        }
    }

    pub fn access_token(&self) -> Option<String> {
        self.access_token.read().ok().and_then(|guard| guard.clone())
    }

    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    pub fn anon_key(&self) -> &str {
        &self.anon_key
    }

    /// Resolve a path relative to the project URL
    pub fn endpoint(&self, path: &str) -> Result<Url> {
        Ok(self.base_url.join(path.trim_start_matches('/'))?)
    }

    /// Start a request with the project headers attached
    pub fn request(&self, method: Method, url: Url) -> RequestBuilder {
        let bearer = self.access_token().unwrap_or_else(|| self.anon_key.clone());
        self.http
            .request(method, url)
            .header("apikey", &self.anon_key)
            .bearer_auth(bearer)
    }

    /// Start a request authorized with the anon key only
    pub fn anonymous_request(&self, method: Method, url: Url) -> RequestBuilder {
        self.http
            .request(method, url)
            .header("apikey", &self.anon_key)
            .bearer_auth(&self.anon_key)
    }

    /// Read rows from a table
    pub async fn select<T: DeserializeOwned>(&self, table: &str, query: &Query) -> Result<Vec<T>> {
        let url = self.endpoint(&format!("rest/v1/{}", table))?;
        let request = self.request(Method::GET, url).query(query.params());
        self.execute("select", table, request).await
    }

    /// Insert one row or an array of rows, returning the stored representation
    pub async fn insert<B: Serialize + ?Sized, T: DeserializeOwned>(&self, table: &str, body: &B) -> Result<Vec<T>> {
        let url = self.endpoint(&format!("rest/v1/{}", table))?;
        let request = self
            .request(Method::POST, url)
            .header("Prefer", "return=representation")
            .json(body);
        self.execute("insert", table, request).await
    }

    /// Update the rows matching `query`, returning those actually changed
    pub async fn update<B: Serialize + ?Sized, T: DeserializeOwned>(&self, table: &str, query: &Query, body: &B) -> Result<Vec<T>> {
        let url = self.endpoint(&format!("rest/v1/{}", table))?;
        let request = self
            .request(Method::PATCH, url)
            .query(query.params())
            .header("Prefer", "return=representation")
            .json(body);
        self.execute("update", table, request).await
    }

    /// Delete the rows matching `query`
    pub async fn delete(&self, table: &str, query: &Query) -> Result<()> {
        let url = self.endpoint(&format!("rest/v1/{}", table))?;
        let request = self.request(Method::DELETE, url).query(query.params());
        let started = Instant::now();
        let result = self.send(request).await.map(|_| ());
        logging::log_backend_operation("delete", table, elapsed_ms(started), result.is_ok());
        result
    }

    /// Call a server-side function
    pub async fn rpc<B: Serialize + ?Sized, T: DeserializeOwned>(&self, function: &str, args: &B) -> Result<T> {
        let url = self.endpoint(&format!("rest/v1/rpc/{}", function))?;
        let request = self.request(Method::POST, url).json(args);
        self.execute("rpc", function, request).await
    }

    async fn execute<T: DeserializeOwned>(&self, operation: &str, resource: &str, request: RequestBuilder) -> Result<T> {
        let started = Instant::now();
        let result = match self.send(request).await {
            Ok(response) => decode_json(response).await,
            Err(e) => Err(e),
        };
        logging::log_backend_operation(operation, resource, elapsed_ms(started), result.is_ok());
        result
    }

    /// Send a request, mapping transport failures and non-2xx statuses
    pub async fn send(&self, request: RequestBuilder) -> Result<Response> {
        let response = request.send().await.map_err(map_transport_error)?;

        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }

        let body = response.text().await.unwrap_or_default();
        let error = api_error(status.as_u16(), &body);
        debug!(status = status.as_u16(), body = %body, "Backend returned an error");
        Err(GearError::Backend(error))
    }
}

/// Decode a JSON response body
pub async fn decode_json<T: DeserializeOwned>(response: Response) -> Result<T> {
    let bytes = response.bytes().await.map_err(map_transport_error)?;
    serde_json::from_slice(&bytes).map_err(|e| {
        GearError::Backend(BackendError::InvalidResponse(format!(
            "{}: {}",
            e,
            String::from_utf8_lossy(&bytes)
        )))
    })
}

fn map_transport_error(e: reqwest::Error) -> GearError {
    let error = if e.is_timeout() {
        BackendError::Timeout
    } else if e.is_connect() {
        BackendError::ServiceUnavailable
    } else {
        BackendError::RequestFailed(e.to_string())
    };
    logging::log_api_error("backend", &error.to_string(), None);
    GearError::Backend(error)
}

/// Build an API error from whichever error shape the endpoint returned.
///
/// REST errors carry `code`/`message`, auth errors `error`/`error_description`
/// or `msg`, storage errors `error`/`message`.
fn api_error(status: u16, body: &str) -> BackendError {
    let parsed: Option<serde_json::Value> = serde_json::from_str(body).ok();
    let field = |name: &str| {
        parsed
            .as_ref()
            .and_then(|v| v.get(name))
            .and_then(|v| match v {
                serde_json::Value::String(s) => Some(s.clone()),
                serde_json::Value::Number(n) => Some(n.to_string()),
                _ => None,
            })
    };

    let code = field("code").or_else(|| field("error"));
    let message = field("message")
        .or_else(|| field("msg"))
        .or_else(|| field("error_description"))
        .unwrap_or_else(|| body.to_string());

    if status == 503 {
        return BackendError::ServiceUnavailable;
    }
    BackendError::Api { status, code, message }
}

fn elapsed_ms(started: Instant) -> u64 {
    started.elapsed().as_millis() as u64
}
