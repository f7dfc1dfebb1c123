//! Data access seams used by the workflow
//!
//! The checkout flow, the quick-scan station and the studio context only
//! talk to the backend through these traits, so they can run against the
//! hosted service or an in-memory store in tests.

use async_trait::async_trait;
use uuid::Uuid;

use crate::models::{
    CreateTransactionRequest, Equipment, StudioUser, Transaction, UnitStatus, UnitWithEquipment,
};
use crate::utils::errors::Result;

#[async_trait]
pub trait InventoryStore: Send + Sync {
    /// Unit (with its template) by exact id, scoped to a studio
    async fn find_unit_by_id(&self, studio_id: Uuid, unit_id: Uuid) -> Result<Option<UnitWithEquipment>>;

    /// Units whose code matches exactly, scoped to a studio
    async fn find_units_by_code(&self, studio_id: Uuid, code: &str) -> Result<Vec<UnitWithEquipment>>;

    async fn find_equipment(&self, studio_id: Uuid, equipment_id: Uuid) -> Result<Option<Equipment>>;

    /// Move a unit from `from` to `to` only if it is still in `from`.
    /// Returns false when another writer got there first.
    async fn transition_unit_status(&self, unit_id: Uuid, from: UnitStatus, to: UnitStatus) -> Result<bool>;

    /// Apply `available_quantity + delta` only if the result stays within
    /// `0..=total_quantity`. Returns the updated row, or `None` when the
    /// bound would be violated.
    async fn adjust_available_quantity(&self, equipment_id: Uuid, delta: i32) -> Result<Option<Equipment>>;

    async fn record_transaction(&self, request: CreateTransactionRequest) -> Result<Transaction>;

    /// Only used to compensate a transaction inserted earlier in the same commit
    async fn delete_transaction(&self, transaction_id: Uuid) -> Result<()>;

    async fn find_membership(&self, studio_id: Uuid, user_id: Uuid) -> Result<Option<StudioUser>>;
}

#[async_trait]
pub trait PhotoStorage: Send + Sync {
    /// Store an object and return its public URL
    async fn upload(&self, bucket: &str, path: &str, bytes: Vec<u8>, content_type: &str) -> Result<String>;

    async fn remove(&self, bucket: &str, path: &str) -> Result<()>;
}
