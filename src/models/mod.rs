//! Data models module
//!
//! This module contains all data structures exchanged with the backend

pub mod studio;
pub mod equipment;
pub mod transaction;
pub mod invitation;
pub mod payload;
pub mod session;

// Re-export commonly used models
pub use studio::{Studio, StudioUser, StudioRole, MembershipStatus, MembershipWithStudio, CreateStudioRequest, CreateMembershipRequest};
pub use equipment::{Equipment, EquipmentUnit, UnitWithEquipment, UnitStatus, CodeType, CreateEquipmentRequest, UpdateEquipmentRequest, CreateUnitRequest};
pub use transaction::{Transaction, TransactionRecord, TransactionType, ApprovalStatus, CreateTransactionRequest};
pub use invitation::{StudioInvitation, InvitationWithStudio, InvitationStatus, CreateInvitationRequest};
pub use payload::{CodePayload, LabelPayload, PayloadType};
pub use session::{AuthSession, AuthUser};
