//! Configuration validation module
//!
//! This module provides validation functions for application configuration
//! to ensure all required settings are properly configured.

use crate::utils::errors::{GearError, Result};
use super::Settings;

/// Validate all configuration settings
pub fn validate_settings(settings: &Settings) -> Result<()> {
    validate_backend_config(&settings.backend)?;
    validate_storage_config(&settings.storage)?;
    validate_auth_config(&settings.auth)?;
    validate_session_config(&settings.session)?;
    validate_scanner_config(&settings.scanner)?;
    validate_labels_config(&settings.labels)?;
    validate_logging_config(&settings.logging)?;

    Ok(())
}

/// Validate backend configuration
fn validate_backend_config(config: &super::BackendConfig) -> Result<()> {
    if config.url.is_empty() {
        return Err(GearError::Config(
            "Backend URL is required".to_string()
        ));
    }

    url::Url::parse(&config.url)
        .map_err(|e| GearError::Config(format!("Backend URL is invalid: {}", e)))?;

    if config.anon_key.is_empty() {
        return Err(GearError::Config(
            "Backend anon key is required".to_string()
        ));
    }

    if config.timeout_seconds == 0 {
        return Err(GearError::Config(
            "Backend timeout must be greater than 0".to_string()
        ));
    }

    Ok(())
}

/// Validate storage buckets
fn validate_storage_config(config: &super::StorageConfig) -> Result<()> {
    if config.equipment_photos_bucket.is_empty() || config.transaction_photos_bucket.is_empty() {
        return Err(GearError::Config(
            "Both photo buckets must be configured".to_string()
        ));
    }

    Ok(())
}

/// Validate OAuth configuration
fn validate_auth_config(config: &super::AuthConfig) -> Result<()> {
    if config.provider.is_empty() {
        return Err(GearError::Config(
            "OAuth provider is required".to_string()
        ));
    }

    url::Url::parse(&config.redirect_url)
        .map_err(|e| GearError::Config(format!("OAuth redirect URL is invalid: {}", e)))?;

    Ok(())
}

/// Validate session configuration
fn validate_session_config(config: &super::SessionConfig) -> Result<()> {
    if config.state_dir.is_empty() {
        return Err(GearError::Config(
            "Session state directory is required".to_string()
        ));
    }

    Ok(())
}

/// Validate scanner configuration
fn validate_scanner_config(config: &super::ScannerConfig) -> Result<()> {
    if config.fps == 0 || config.fps > 60 {
        return Err(GearError::Config(
            format!("Scanner fps must be between 1 and 60, got {}", config.fps)
        ));
    }

    Ok(())
}

/// Validate label export configuration
fn validate_labels_config(config: &super::LabelsConfig) -> Result<()> {
    let valid_styles = ["qr", "barcode"];
    if !valid_styles.contains(&config.style.as_str()) {
        return Err(GearError::Config(
            format!("Invalid label style: {}. Valid styles: {:?}", config.style, valid_styles)
        ));
    }

    let valid_sizes = ["small", "medium", "large"];
    if !valid_sizes.contains(&config.size.as_str()) {
        return Err(GearError::Config(
            format!("Invalid label size: {}. Valid sizes: {:?}", config.size, valid_sizes)
        ));
    }

    if config.scale == 0 || config.scale > 8 {
        return Err(GearError::Config(
            "Label scale must be between 1 and 8".to_string()
        ));
    }

    Ok(())
}

/// Validate logging configuration
fn validate_logging_config(config: &super::LoggingConfig) -> Result<()> {
    if config.level.is_empty() {
        return Err(GearError::Config(
            "Log level is required".to_string()
        ));
    }

    let valid_levels = ["trace", "debug", "info", "warn", "error"];
    if !valid_levels.contains(&config.level.as_str()) {
        return Err(GearError::Config(
            format!("Invalid log level: {}. Valid levels: {:?}", config.level, valid_levels)
        ));
    }

    Ok(())
}
