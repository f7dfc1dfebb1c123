//! Backend module
//!
//! This module handles the connection to the hosted backend and typed
//! access to its tables and storage buckets

pub mod connection;
pub mod repositories;
pub mod service;
pub mod storage;
pub mod store;

// Re-export commonly used backend components
pub use connection::{BackendClient, Query};
pub use repositories::{StudioRepository, EquipmentRepository, UnitRepository, TransactionRepository, InvitationRepository, ActivityFilter};
pub use service::DataService;
pub use storage::ObjectStorage;
pub use store::{InventoryStore, PhotoStorage};
