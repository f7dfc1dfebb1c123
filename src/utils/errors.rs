//! Error handling for StudioGear
//!
//! This module defines the main error types used throughout the application
//! and provides a unified error handling strategy. Workflow code converts
//! every failure into one of a handful of kinds so the front end can show a
//! user-visible message and return to an interactive step.

use thiserror::Error;

/// Main error type for StudioGear
#[derive(Error, Debug)]
pub enum GearError {
    #[error("Backend error: {0}")]
    Backend(#[from] BackendError),

    #[error("Scanner error: {0}")]
    Scanner(#[from] ScannerError),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Permission denied: {0}")]
    PermissionDenied(String),

    #[error("Authentication error: {0}")]
    Authentication(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("State conflict: {0}")]
    StateConflict(String),

    #[error("Capacity exceeded: {0}")]
    CapacityExceeded(String),

    #[error("Invalid state transition: {from} -> {to}")]
    InvalidStateTransition { from: String, to: String },

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Commit failed after {committed} item(s): {source}")]
    CommitFailed {
        committed: usize,
        compensation_failures: usize,
        #[source]
        source: Box<GearError>,
    },

    #[error("Label rendering error: {0}")]
    Render(String),

    #[error("Archive error: {0}")]
    Archive(#[from] zip::result::ZipError),

    #[error("Image error: {0}")]
    Image(#[from] image::ImageError),

    #[error("HTTP request error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("URL parsing error: {0}")]
    UrlParse(#[from] url::ParseError),
}

/// Hosted backend (REST, auth, storage) specific errors
#[derive(Error, Debug)]
pub enum BackendError {
    #[error("Backend request failed: {0}")]
    RequestFailed(String),

    #[error("Backend timeout")]
    Timeout,

    #[error("Backend rejected request ({status}): {message}")]
    Api {
        status: u16,
        code: Option<String>,
        message: String,
    },

    #[error("Invalid backend response: {0}")]
    InvalidResponse(String),

    #[error("Backend service unavailable")]
    ServiceUnavailable,
}

/// Camera and decoding errors
#[derive(Error, Debug)]
pub enum ScannerError {
    #[error("Scanner is already running")]
    AlreadyScanning,

    #[error("Camera permission denied: {0}")]
    PermissionDenied(String),

    #[error("Camera unavailable: {0}")]
    DeviceUnavailable(String),

    #[error("Scanner is not running")]
    NotRunning,
}

/// Result type alias for StudioGear operations
pub type Result<T> = std::result::Result<T, GearError>;

/// Result type alias for backend operations
pub type BackendResult<T> = std::result::Result<T, BackendError>;

/// Result type alias for camera operations
pub type ScannerResult<T> = std::result::Result<T, ScannerError>;

/// Coarse classification shown to the user
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// A scanned code or id did not resolve
    NotFound,
    /// Mode/status mismatch or duplicate staging
    StateConflict,
    /// Quantity outside the available/returnable bound
    Capacity,
    /// Network, storage or backend failure
    Upstream,
    Permission,
    Input,
    Internal,
}

impl GearError {
    /// Classify the error into the workflow taxonomy
    pub fn kind(&self) -> ErrorKind {
        match self {
            GearError::NotFound(_) => ErrorKind::NotFound,
            GearError::StateConflict(_) | GearError::InvalidStateTransition { .. } => ErrorKind::StateConflict,
            GearError::CapacityExceeded(_) => ErrorKind::Capacity,
            GearError::Backend(_) | GearError::Http(_) | GearError::Io(_) => ErrorKind::Upstream,
            GearError::CommitFailed { source, .. } => source.kind(),
            GearError::PermissionDenied(_) | GearError::Authentication(_) => ErrorKind::Permission,
            GearError::InvalidInput(_) => ErrorKind::Input,
            GearError::Scanner(_) => ErrorKind::Upstream,
            GearError::Config(_)
            | GearError::Render(_)
            | GearError::Archive(_)
            | GearError::Image(_)
            | GearError::Serialization(_)
            | GearError::UrlParse(_) => ErrorKind::Internal,
        }
    }

    /// Text suitable for showing to the person holding the scanner
    pub fn user_message(&self) -> String {
        match self {
            GearError::NotFound(msg)
            | GearError::StateConflict(msg)
            | GearError::CapacityExceeded(msg)
            | GearError::InvalidInput(msg)
            | GearError::PermissionDenied(msg) => msg.clone(),
            GearError::Authentication(_) => "Please sign in again.".to_string(),
            GearError::Scanner(ScannerError::PermissionDenied(_)) => {
                "Camera access was denied. Grant camera permission and try again.".to_string()
            }
            GearError::Scanner(e) => format!("Failed to access camera: {}", e),
            GearError::CommitFailed { source, .. } => match source.kind() {
                ErrorKind::Upstream | ErrorKind::Internal => {
                    "Failed to complete transaction. Please try again.".to_string()
                }
                _ => source.user_message(),
            },
            GearError::InvalidStateTransition { .. } => "That action is not available right now.".to_string(),
            _ => match self.kind() {
                ErrorKind::Upstream => "Something went wrong talking to the server. Please try again.".to_string(),
                _ => "Something went wrong. Please try again.".to_string(),
            },
        }
    }

    /// Check if the error is recoverable by retrying the same action
    pub fn is_recoverable(&self) -> bool {
        match self {
            GearError::Backend(BackendError::Api { status, .. }) => *status >= 500,
            GearError::Backend(_) => true,
            GearError::Scanner(_) => true,
            GearError::Config(_) => false,
            GearError::PermissionDenied(_) => false,
            GearError::Authentication(_) => false,
            GearError::NotFound(_) => false,
            GearError::StateConflict(_) => false,
            GearError::CapacityExceeded(_) => false,
            GearError::InvalidStateTransition { .. } => false,
            GearError::InvalidInput(_) => false,
            GearError::CommitFailed { source, .. } => source.is_recoverable(),
            GearError::Render(_) => false,
            GearError::Archive(_) => false,
            GearError::Image(_) => false,
            GearError::Http(_) => true,
            GearError::Serialization(_) => false,
            GearError::Io(_) => true,
            GearError::UrlParse(_) => false,
        }
    }

    /// Get error severity level
    pub fn severity(&self) -> ErrorSeverity {
        match self {
            GearError::Config(_) => ErrorSeverity::Critical,
            GearError::CommitFailed { compensation_failures, .. } if *compensation_failures > 0 => {
                ErrorSeverity::Critical
            }
            GearError::PermissionDenied(_) => ErrorSeverity::Warning,
            GearError::Authentication(_) => ErrorSeverity::Warning,
            GearError::NotFound(_)
            | GearError::StateConflict(_)
            | GearError::CapacityExceeded(_)
            | GearError::InvalidInput(_) => ErrorSeverity::Info,
            _ => ErrorSeverity::Error,
        }
    }

    /// True when the backend reported a unique constraint violation
    pub fn is_duplicate_key(&self) -> bool {
        match self {
            GearError::Backend(BackendError::Api { code, message, .. }) => {
                code.as_deref() == Some("23505") || message.contains("duplicate key")
            }
            _ => false,
        }
    }
}

/// Error severity levels
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorSeverity {
    Info,
    Warning,
    Error,
    Critical,
}

impl std::fmt::Display for ErrorSeverity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ErrorSeverity::Info => write!(f, "INFO"),
            ErrorSeverity::Warning => write!(f, "WARN"),
            ErrorSeverity::Error => write!(f, "ERROR"),
            ErrorSeverity::Critical => write!(f, "CRITICAL"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_kind_classification() {
        assert_eq!(GearError::NotFound("x".into()).kind(), ErrorKind::NotFound);
        assert_eq!(GearError::StateConflict("x".into()).kind(), ErrorKind::StateConflict);
        assert_eq!(GearError::CapacityExceeded("x".into()).kind(), ErrorKind::Capacity);
        assert_eq!(GearError::Backend(BackendError::Timeout).kind(), ErrorKind::Upstream);
    }

    #[test]
    fn test_commit_failure_hides_upstream_details() {
        let err = GearError::CommitFailed {
            committed: 1,
            compensation_failures: 0,
            source: Box::new(GearError::Backend(BackendError::ServiceUnavailable)),
        };
        assert_eq!(err.kind(), ErrorKind::Upstream);
        assert_eq!(err.user_message(), "Failed to complete transaction. Please try again.");
        assert!(err.is_recoverable());
    }

    #[test]
    fn test_commit_failure_keeps_conflict_message() {
        let err = GearError::CommitFailed {
            committed: 0,
            compensation_failures: 0,
            source: Box::new(GearError::StateConflict("This item is already checked out.".into())),
        };
        assert_eq!(err.user_message(), "This item is already checked out.");
        assert_eq!(err.severity(), ErrorSeverity::Error);
    }

    #[test]
    fn test_duplicate_key_detection() {
        let err = GearError::Backend(BackendError::Api {
            status: 409,
            code: Some("23505".into()),
            message: "duplicate key value violates unique constraint".into(),
        });
        assert!(err.is_duplicate_key());
        assert!(!err.is_recoverable());
        assert!(!GearError::NotFound("x".into()).is_duplicate_key());
    }

    #[test]
    fn test_severity_display() {
        assert_eq!(ErrorSeverity::Critical.to_string(), "CRITICAL");
        assert_eq!(GearError::Config("bad".into()).severity(), ErrorSeverity::Critical);
    }
}
