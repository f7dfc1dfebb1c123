//! Backend service layer
//!
//! This module bundles the repositories behind one handle and exposes them
//! to the workflow through the `InventoryStore` and `PhotoStorage` seams.

use async_trait::async_trait;
use uuid::Uuid;

use crate::database::connection::BackendClient;
use crate::database::repositories::{
    EquipmentRepository, InvitationRepository, StudioRepository, TransactionRepository, UnitRepository,
};
use crate::database::storage::ObjectStorage;
use crate::database::store::{InventoryStore, PhotoStorage};
use crate::models::*;
use crate::utils::errors::Result;

#[derive(Debug, Clone)]
pub struct DataService {
    pub client: BackendClient,
    pub studios: StudioRepository,
    pub equipment: EquipmentRepository,
    pub units: UnitRepository,
    pub transactions: TransactionRepository,
    pub invitations: InvitationRepository,
    pub storage: ObjectStorage,
}

impl DataService {
    pub fn new(client: BackendClient) -> Self {
        Self {
            studios: StudioRepository::new(client.clone()),
            equipment: EquipmentRepository::new(client.clone()),
            units: UnitRepository::new(client.clone()),
            transactions: TransactionRepository::new(client.clone()),
            invitations: InvitationRepository::new(client.clone()),
            storage: ObjectStorage::new(client.clone()),
            client,
        }
    }
}

#[async_trait]
impl InventoryStore for DataService {
    async fn find_unit_by_id(&self, studio_id: Uuid, unit_id: Uuid) -> Result<Option<UnitWithEquipment>> {
        self.units.find_by_id(studio_id, unit_id).await
    }

    async fn find_units_by_code(&self, studio_id: Uuid, code: &str) -> Result<Vec<UnitWithEquipment>> {
        self.units.find_by_code(studio_id, code).await
    }

    async fn find_equipment(&self, studio_id: Uuid, equipment_id: Uuid) -> Result<Option<Equipment>> {
        self.equipment.find_by_id(studio_id, equipment_id).await
    }

    async fn transition_unit_status(&self, unit_id: Uuid, from: UnitStatus, to: UnitStatus) -> Result<bool> {
        self.units.transition_status(unit_id, from, to).await
    }

    async fn adjust_available_quantity(&self, equipment_id: Uuid, delta: i32) -> Result<Option<Equipment>> {
        self.equipment.adjust_available_quantity(equipment_id, delta).await
    }

    async fn record_transaction(&self, request: CreateTransactionRequest) -> Result<Transaction> {
        self.transactions.create(request).await
    }

    async fn delete_transaction(&self, transaction_id: Uuid) -> Result<()> {
        self.transactions.delete(transaction_id).await
    }

    async fn find_membership(&self, studio_id: Uuid, user_id: Uuid) -> Result<Option<StudioUser>> {
        self.studios.find_membership(studio_id, user_id).await
    }
}

#[async_trait]
impl PhotoStorage for DataService {
    async fn upload(&self, bucket: &str, path: &str, bytes: Vec<u8>, content_type: &str) -> Result<String> {
        self.storage.upload(bucket, path, bytes, content_type).await
    }

    async fn remove(&self, bucket: &str, path: &str) -> Result<()> {
        self.storage.remove(bucket, path).await
    }
}
