//! Backend repositories module
//!
//! This module contains all repository implementations for data access

pub mod studio;
pub mod equipment;
pub mod unit;
pub mod transaction;
pub mod invitation;

// Re-export repositories
pub use studio::StudioRepository;
pub use equipment::EquipmentRepository;
pub use unit::UnitRepository;
pub use transaction::{TransactionRepository, ActivityFilter};
pub use invitation::InvitationRepository;
