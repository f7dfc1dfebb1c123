//! Logging configuration and setup
//!
//! This module provides logging initialization and structured logging utilities
//! for the StudioGear application.

use tracing::{info, warn, error, debug};
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};
use uuid::Uuid;
use crate::config::LoggingConfig;
use crate::utils::errors::{GearError, Result};

/// Initialize logging based on configuration.
///
/// The returned guard flushes the file writer; keep it alive for the
/// lifetime of the process.
pub fn init_logging(config: &LoggingConfig) -> Result<WorkerGuard> {
    let file_appender = tracing_appender::rolling::daily(&config.file_path, "studio-gear.log");
    let (non_blocking, guard) = tracing_appender::non_blocking(file_appender);

    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(&config.level))
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .with(tracing_subscriber::fmt::layer().with_ansi(false).with_writer(non_blocking))
        .try_init()
        .map_err(|e| GearError::Config(format!("Failed to initialize logging: {}", e)))?;

    info!("Logging initialized with level: {}", config.level);
    Ok(guard)
}

/// Log the outcome of a single scan
pub fn log_scan(studio_id: Uuid, code: &str, accepted: bool, reason: Option<&str>) {
    if accepted {
        info!(studio_id = %studio_id, code = code, "Scan accepted");
    } else {
        debug!(studio_id = %studio_id, code = code, reason = reason, "Scan rejected");
    }
}

/// Log a committed checkout/checkin
pub fn log_transaction(studio_id: Uuid, user_id: Uuid, kind: &str, equipment_id: Uuid, quantity: i32) {
    info!(
        studio_id = %studio_id,
        user_id = %user_id,
        kind = kind,
        equipment_id = %equipment_id,
        quantity = quantity,
        "Transaction recorded"
    );
}

/// Log bulk label export results
pub fn log_export(studio_id: Uuid, labels: usize, archive: Option<&str>) {
    match archive {
        Some(name) => info!(studio_id = %studio_id, labels = labels, archive = name, "Label archive created"),
        None => warn!(studio_id = %studio_id, labels = labels, "Label export aborted"),
    }
}

/// Log member management actions
pub fn log_member_action(actor_id: Uuid, action: &str, studio_id: Uuid, target: Option<&str>) {
    warn!(
        actor_id = %actor_id,
        action = action,
        studio_id = %studio_id,
        target = target,
        "Member action performed"
    );
}

/// Log API errors with context
pub fn log_api_error(api: &str, error: &str, context: Option<&str>) {
    error!(
        api = api,
        error = error,
        context = context,
        "API error occurred"
    );
}

/// Log backend operations
pub fn log_backend_operation(operation: &str, resource: &str, duration_ms: u64, success: bool) {
    if success {
        debug!(
            operation = operation,
            resource = resource,
            duration_ms = duration_ms,
            "Backend operation completed"
        );
    } else {
        error!(
            operation = operation,
            resource = resource,
            duration_ms = duration_ms,
            "Backend operation failed"
        );
    }
}
