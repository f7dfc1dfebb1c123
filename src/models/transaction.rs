//! Transaction log models

use serde::{Deserialize, Serialize};
use chrono::{DateTime, Utc};
use uuid::Uuid;

/// Append-only record of a checkout, checkin or adjustment
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Transaction {
    pub id: Uuid,
    pub studio_id: Uuid,
    pub equipment_id: Uuid,
    pub equipment_item_id: Option<Uuid>,
    pub user_id: Uuid,
    #[serde(rename = "type")]
    pub kind: TransactionType,
    pub quantity: i32,
    pub photo_url: Option<String>,
    pub notes: Option<String>,
    pub approval_status: Option<ApprovalStatus>,
    pub created_at: DateTime<Utc>,
}

/// Transaction joined with the template name (`select=*,equipment(name)`)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TransactionRecord {
    #[serde(flatten)]
    pub transaction: Transaction,
    pub equipment: Option<EquipmentName>,
}

impl TransactionRecord {
    pub fn equipment_name(&self) -> &str {
        self.equipment.as_ref().map(|e| e.name.as_str()).unwrap_or("Unknown")
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EquipmentName {
    pub name: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TransactionType {
    Checkout,
    Checkin,
    Adjustment,
}

impl TransactionType {
    pub fn as_str(&self) -> &'static str {
        match self {
            TransactionType::Checkout => "checkout",
            TransactionType::Checkin => "checkin",
            TransactionType::Adjustment => "adjustment",
        }
    }
}

impl std::fmt::Display for TransactionType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for TransactionType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "checkout" => Ok(TransactionType::Checkout),
            "checkin" => Ok(TransactionType::Checkin),
            "adjustment" => Ok(TransactionType::Adjustment),
            other => Err(format!("unknown transaction type '{}'", other)),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ApprovalStatus {
    Pending,
    Approved,
    Denied,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateTransactionRequest {
    pub studio_id: Uuid,
    pub equipment_id: Uuid,
    pub equipment_item_id: Option<Uuid>,
    pub user_id: Uuid,
    #[serde(rename = "type")]
    pub kind: TransactionType,
    pub quantity: i32,
    pub photo_url: Option<String>,
    pub notes: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub approval_status: Option<ApprovalStatus>,
}
