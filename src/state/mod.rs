//! State management module
//!
//! This module handles workflow state and the local session

pub mod context;
pub mod scenarios;
pub mod storage;

// Re-export commonly used state components
pub use context::{FlowContext, FlowMode, CartItem, CapturedPhoto};
pub use scenarios::{FlowManager, FlowDefinition, FlowStep, FlowKind};
pub use storage::{SessionStorage, SessionState};
