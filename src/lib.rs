//! StudioGear
//!
//! Equipment tracking for studios: scannable QR/barcode labels, a
//! checkout/checkin cart flow, a quick-scan station and bulk label export,
//! all backed by a hosted Postgres REST backend.

pub mod config;
pub mod database;
pub mod handlers;
pub mod models;
pub mod services;
pub mod state;
pub mod utils;

// Re-export commonly used types
pub use config::Settings;
pub use utils::errors::{GearError, Result};

// Re-export main components for easy access
pub use database::DataService;
pub use services::ServiceFactory;
pub use state::{FlowManager, SessionStorage};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Library name
pub const NAME: &str = env!("CARGO_PKG_NAME");

/// Get library information
pub fn info() -> String {
    format!("{} v{}", NAME, VERSION)
}
