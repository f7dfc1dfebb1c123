//! Workflow context management
//!
//! This module holds the per-session state of a checkout/checkin flow: the
//! current step, the mode, the item being confirmed, the staged cart and the
//! last user-visible message.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::models::{Equipment, EquipmentUnit, TransactionType, UnitStatus, UnitWithEquipment};
use super::scenarios::{FlowKind, FlowStep};

/// Direction of the flow
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FlowMode {
    Checkout,
    Checkin,
}

impl FlowMode {
    pub fn transaction_type(&self) -> TransactionType {
        match self {
            FlowMode::Checkout => TransactionType::Checkout,
            FlowMode::Checkin => TransactionType::Checkin,
        }
    }

    /// Status a unit ends up in after this flow commits it
    pub fn target_status(&self) -> UnitStatus {
        match self {
            FlowMode::Checkout => UnitStatus::CheckedOut,
            FlowMode::Checkin => UnitStatus::Available,
        }
    }

    /// Change applied to `available_quantity` per unit
    pub fn availability_delta(&self, quantity: i32) -> i32 {
        match self {
            FlowMode::Checkout => -quantity,
            FlowMode::Checkin => quantity,
        }
    }

    pub fn toggled(&self) -> Self {
        match self {
            FlowMode::Checkout => FlowMode::Checkin,
            FlowMode::Checkin => FlowMode::Checkout,
        }
    }
}

impl std::fmt::Display for FlowMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.transaction_type().as_str())
    }
}

/// Condition photo held in memory until commit
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CapturedPhoto {
    pub bytes: Vec<u8>,
    pub content_type: String,
}

/// A resolved unit on its way into (or already in) the cart
#[derive(Debug, Clone, PartialEq)]
pub struct CartItem {
    pub unit: EquipmentUnit,
    pub equipment: Equipment,
    /// Status seen when the unit was scanned; the commit only succeeds if
    /// the unit is still in this status
    pub observed_status: UnitStatus,
    pub photo: Option<CapturedPhoto>,
}

impl CartItem {
    pub fn from_resolved(row: UnitWithEquipment) -> Self {
        let observed_status = row.unit.status;
        Self {
            unit: row.unit,
            equipment: row.equipment,
            observed_status,
            photo: None,
        }
    }

    pub fn unit_id(&self) -> Uuid {
        self.unit.id
    }
}

/// State of one checkout/checkin flow
#[derive(Debug, Clone)]
pub struct FlowContext {
    pub kind: FlowKind,
    pub step: FlowStep,
    pub mode: FlowMode,
    /// Item between scan and staging
    pub current: Option<CartItem>,
    pub cart: Vec<CartItem>,
    /// Last user-visible error or notice
    pub message: Option<String>,
}

impl FlowContext {
    pub fn new(kind: FlowKind) -> Self {
        Self {
            kind,
            step: FlowStep::Scan,
            mode: FlowMode::Checkout,
            current: None,
            cart: Vec::new(),
            message: None,
        }
    }

    pub fn is_staged(&self, unit_id: Uuid) -> bool {
        self.cart.iter().any(|item| item.unit_id() == unit_id)
    }

    pub fn stage(&mut self, item: CartItem) {
        if !self.is_staged(item.unit_id()) {
            self.cart.push(item);
        }
    }

    /// Remove a staged unit. Returns false if it was not in the cart.
    pub fn unstage(&mut self, unit_id: Uuid) -> bool {
        let before = self.cart.len();
        self.cart.retain(|item| item.unit_id() != unit_id);
        self.cart.len() != before
    }

    pub fn set_message(&mut self, message: impl Into<String>) {
        self.message = Some(message.into());
    }

    pub fn clear_message(&mut self) {
        self.message = None;
    }

    /// Drop everything but the mode and go back to scanning
    pub fn reset(&mut self) {
        self.step = FlowStep::Scan;
        self.current = None;
        self.cart.clear();
        self.message = None;
    }
}
