//! Application settings management
//!
//! This module defines the configuration structure and provides methods
//! for loading settings from TOML files and environment variables.

use serde::{Deserialize, Serialize};

/// Main application configuration structure
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct Settings {
    pub backend: BackendConfig,
    pub storage: StorageConfig,
    pub auth: AuthConfig,
    pub session: SessionConfig,
    pub scanner: ScannerConfig,
    pub labels: LabelsConfig,
    pub logging: LoggingConfig,
    pub features: FeaturesConfig,
}

/// Hosted backend configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct BackendConfig {
    /// Project base URL, e.g. `https://xyz.supabase.co`
    pub url: String,
    /// Public anonymous API key sent with every request
    pub anon_key: String,
    pub timeout_seconds: u64,
}

/// Object storage buckets
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct StorageConfig {
    pub equipment_photos_bucket: String,
    pub transaction_photos_bucket: String,
}

/// OAuth sign-in configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct AuthConfig {
    pub provider: String,
    pub redirect_url: String,
}

/// Local session persistence
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct SessionConfig {
    pub state_dir: String,
}

/// Code scanner configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ScannerConfig {
    pub fps: u32,
    /// Identical codes seen within this window are delivered once
    pub cooldown_ms: u64,
    pub prefer_environment: bool,
}

/// Label export configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct LabelsConfig {
    /// `qr` or `barcode`
    pub style: String,
    /// `small`, `medium` or `large`
    pub size: String,
    pub scale: u32,
    pub output_dir: String,
}

/// Logging configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct LoggingConfig {
    pub level: String,
    pub file_path: String,
}

/// Feature flags configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct FeaturesConfig {
    /// New transactions start with `approval_status = pending`
    pub approval_workflow: bool,
    pub require_condition_photo: bool,
}

impl Settings {
    /// Load settings from configuration file and environment variables
    pub fn new() -> Result<Self, config::ConfigError> {
        Self::from_file("config")
    }

    /// Load settings from a specific configuration file (extension optional)
    pub fn from_file(path: &str) -> Result<Self, config::ConfigError> {
        let defaults = config::Config::try_from(&Settings::default())?;

        let settings = config::Config::builder()
            .add_source(defaults)
            .add_source(config::File::with_name(path).required(false))
            .add_source(config::Environment::with_prefix("STUDIO_GEAR").separator("__"))
            .build()?;

        settings.try_deserialize()
    }

    /// Validate configuration settings
    pub fn validate(&self) -> Result<(), crate::utils::errors::GearError> {
        super::validation::validate_settings(self)
    }
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            backend: BackendConfig {
                url: "http://localhost:54321".to_string(),
                anon_key: String::new(),
                timeout_seconds: 15,
            },
            storage: StorageConfig {
                equipment_photos_bucket: "equipment-photos".to_string(),
                transaction_photos_bucket: "transaction-photos".to_string(),
            },
            auth: AuthConfig {
                provider: "google".to_string(),
                redirect_url: "http://localhost:3000/auth/callback".to_string(),
            },
            session: SessionConfig {
                state_dir: ".studio-gear".to_string(),
            },
            scanner: ScannerConfig {
                fps: 10,
                cooldown_ms: 1500,
                prefer_environment: true,
            },
            labels: LabelsConfig {
                style: "qr".to_string(),
                size: "medium".to_string(),
                scale: 3,
                output_dir: ".".to_string(),
            },
            logging: LoggingConfig {
                level: "info".to_string(),
                file_path: "logs".to_string(),
            },
            features: FeaturesConfig {
                approval_workflow: false,
                require_condition_photo: true,
            },
        }
    }
}
