//! Equipment template and unit models

use serde::{Deserialize, Serialize};
use chrono::{DateTime, Utc};
use uuid::Uuid;

/// A kind of equipment with aggregate quantities
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Equipment {
    pub id: Uuid,
    pub studio_id: Uuid,
    pub name: String,
    pub category: String,
    pub sku: Option<String>,
    pub total_quantity: i32,
    pub available_quantity: i32,
    pub metadata: Option<serde_json::Value>,
    pub photo_url: Option<String>,
    pub notes: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: Option<DateTime<Utc>>,
}

impl Equipment {
    pub fn checked_out_quantity(&self) -> i32 {
        self.total_quantity - self.available_quantity
    }
}

/// A single physical instance of an equipment template (`equipment_items`)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EquipmentUnit {
    pub id: Uuid,
    pub equipment_id: Uuid,
    pub studio_id: Uuid,
    pub code: String,
    pub code_type: CodeType,
    pub status: UnitStatus,
    pub photo_url: Option<String>,
    pub created_at: DateTime<Utc>,
}

/// Unit joined with its template (`select=*,equipment(*)`)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UnitWithEquipment {
    #[serde(flatten)]
    pub unit: EquipmentUnit,
    pub equipment: Equipment,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum UnitStatus {
    Available,
    CheckedOut,
    Maintenance,
}

impl UnitStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            UnitStatus::Available => "available",
            UnitStatus::CheckedOut => "checked_out",
            UnitStatus::Maintenance => "maintenance",
        }
    }
}

impl std::fmt::Display for UnitStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CodeType {
    Qr,
    Barcode,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateEquipmentRequest {
    pub studio_id: Uuid,
    pub name: String,
    pub category: String,
    pub sku: Option<String>,
    pub total_quantity: i32,
    pub available_quantity: i32,
    pub photo_url: Option<String>,
    pub notes: Option<String>,
}

/// Partial update; absent fields are left untouched by the backend
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct UpdateEquipmentRequest {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub category: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sku: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub updated_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateUnitRequest {
    pub equipment_id: Uuid,
    pub studio_id: Uuid,
    pub code: String,
    pub code_type: CodeType,
    pub status: UnitStatus,
}
