//! In-memory inventory and photo storage
//!
//! Implements the same bounded and conditional writes as the hosted backend
//! and lets tests make individual operations fail.

use std::collections::HashMap;
use std::sync::Mutex;

use async_trait::async_trait;
use chrono::Utc;
use uuid::Uuid;

use studio_gear::database::{InventoryStore, PhotoStorage};
use studio_gear::models::{
    CreateTransactionRequest, Equipment, EquipmentUnit, MembershipStatus, StudioUser, Transaction, UnitStatus,
    UnitWithEquipment,
};
use studio_gear::utils::errors::{BackendError, GearError, Result};

/// Operations that can be made to fail
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Fault {
    RecordTransaction,
    Upload,
    Remove,
}

#[derive(Debug, Default)]
struct Inner {
    equipment: HashMap<Uuid, Equipment>,
    units: HashMap<Uuid, EquipmentUnit>,
    transactions: Vec<Transaction>,
    memberships: Vec<StudioUser>,
    photos: HashMap<(String, String), Vec<u8>>,
    /// Remaining calls that succeed before the fault fires
    faults: HashMap<Fault, usize>,
}

impl Inner {
    fn trip(&mut self, fault: Fault) -> Result<()> {
        match self.faults.get_mut(&fault) {
            Some(0) => Err(GearError::Backend(BackendError::ServiceUnavailable)),
            Some(left) => {
                *left -= 1;
                Ok(())
            }
            None => Ok(()),
        }
    }

    fn with_equipment(&self, unit: &EquipmentUnit) -> Option<UnitWithEquipment> {
        self.equipment.get(&unit.equipment_id).map(|equipment| UnitWithEquipment {
            unit: unit.clone(),
            equipment: equipment.clone(),
        })
    }
}

#[derive(Debug, Default)]
pub struct MemoryStore {
    inner: Mutex<Inner>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert_equipment(&self, equipment: Equipment) {
        self.inner.lock().unwrap().equipment.insert(equipment.id, equipment);
    }

    pub fn insert_unit(&self, unit: EquipmentUnit) {
        self.inner.lock().unwrap().units.insert(unit.id, unit);
    }

    pub fn insert_membership(&self, membership: StudioUser) {
        self.inner.lock().unwrap().memberships.push(membership);
    }

    pub fn set_membership_status(&self, studio_id: Uuid, user_id: Uuid, status: MembershipStatus) {
        let mut inner = self.inner.lock().unwrap();
        for m in inner.memberships.iter_mut() {
            if m.studio_id == studio_id && m.user_id == user_id {
                m.status = status;
            }
        }
    }

    /// Change a unit behind the workflow's back
    pub fn set_unit_status(&self, unit_id: Uuid, status: UnitStatus) {
        if let Some(unit) = self.inner.lock().unwrap().units.get_mut(&unit_id) {
            unit.status = status;
        }
    }

    pub fn set_available(&self, equipment_id: Uuid, available: i32) {
        if let Some(equipment) = self.inner.lock().unwrap().equipment.get_mut(&equipment_id) {
            equipment.available_quantity = available;
        }
    }

    /// Let `successes` calls through, then fail every later one
    pub fn fail_after(&self, fault: Fault, successes: usize) {
        self.inner.lock().unwrap().faults.insert(fault, successes);
    }

    pub fn equipment(&self, id: Uuid) -> Equipment {
        self.inner.lock().unwrap().equipment[&id].clone()
    }

    pub fn unit(&self, id: Uuid) -> EquipmentUnit {
        self.inner.lock().unwrap().units[&id].clone()
    }

    pub fn transactions(&self) -> Vec<Transaction> {
        self.inner.lock().unwrap().transactions.clone()
    }

    pub fn photo_paths(&self) -> Vec<(String, String)> {
        self.inner.lock().unwrap().photos.keys().cloned().collect()
    }
}

#[async_trait]
impl InventoryStore for MemoryStore {
    async fn find_unit_by_id(&self, studio_id: Uuid, unit_id: Uuid) -> Result<Option<UnitWithEquipment>> {
        let inner = self.inner.lock().unwrap();
        Ok(inner
            .units
            .get(&unit_id)
            .filter(|u| u.studio_id == studio_id)
            .and_then(|u| inner.with_equipment(u)))
    }

    async fn find_units_by_code(&self, studio_id: Uuid, code: &str) -> Result<Vec<UnitWithEquipment>> {
        let inner = self.inner.lock().unwrap();
        Ok(inner
            .units
            .values()
            .filter(|u| u.studio_id == studio_id && u.code == code)
            .filter_map(|u| inner.with_equipment(u))
            .collect())
    }

    async fn find_equipment(&self, studio_id: Uuid, equipment_id: Uuid) -> Result<Option<Equipment>> {
        let inner = self.inner.lock().unwrap();
        Ok(inner
            .equipment
            .get(&equipment_id)
            .filter(|e| e.studio_id == studio_id)
            .cloned())
    }

    async fn transition_unit_status(&self, unit_id: Uuid, from: UnitStatus, to: UnitStatus) -> Result<bool> {
        let mut inner = self.inner.lock().unwrap();
        match inner.units.get_mut(&unit_id) {
            Some(unit) if unit.status == from => {
                unit.status = to;
                Ok(true)
            }
            _ => Ok(false),
        }
    }

    async fn adjust_available_quantity(&self, equipment_id: Uuid, delta: i32) -> Result<Option<Equipment>> {
        let mut inner = self.inner.lock().unwrap();
        let Some(equipment) = inner.equipment.get_mut(&equipment_id) else {
            return Ok(None);
        };
        let next = match equipment.available_quantity.checked_add(delta) {
            Some(next) if (0..=equipment.total_quantity).contains(&next) => next,
            _ => return Ok(None),
        };
        equipment.available_quantity = next;
        Ok(Some(equipment.clone()))
    }

    async fn record_transaction(&self, request: CreateTransactionRequest) -> Result<Transaction> {
        let mut inner = self.inner.lock().unwrap();
        inner.trip(Fault::RecordTransaction)?;
        let transaction = Transaction {
            id: Uuid::new_v4(),
            studio_id: request.studio_id,
            equipment_id: request.equipment_id,
            equipment_item_id: request.equipment_item_id,
            user_id: request.user_id,
            kind: request.kind,
            quantity: request.quantity,
            photo_url: request.photo_url,
            notes: request.notes,
            approval_status: request.approval_status,
            created_at: Utc::now(),
        };
        inner.transactions.push(transaction.clone());
        Ok(transaction)
    }

    async fn delete_transaction(&self, transaction_id: Uuid) -> Result<()> {
        self.inner
            .lock()
            .unwrap()
            .transactions
            .retain(|t| t.id != transaction_id);
        Ok(())
    }

    async fn find_membership(&self, studio_id: Uuid, user_id: Uuid) -> Result<Option<StudioUser>> {
        let inner = self.inner.lock().unwrap();
        Ok(inner
            .memberships
            .iter()
            .find(|m| m.studio_id == studio_id && m.user_id == user_id)
            .cloned())
    }
}

#[async_trait]
impl PhotoStorage for MemoryStore {
    async fn upload(&self, bucket: &str, path: &str, bytes: Vec<u8>, _content_type: &str) -> Result<String> {
        let mut inner = self.inner.lock().unwrap();
        inner.trip(Fault::Upload)?;
        inner.photos.insert((bucket.to_string(), path.to_string()), bytes);
        Ok(format!("memory://{}/{}", bucket, path))
    }

    async fn remove(&self, bucket: &str, path: &str) -> Result<()> {
        let mut inner = self.inner.lock().unwrap();
        inner.trip(Fault::Remove)?;
        inner.photos.remove(&(bucket.to_string(), path.to_string()));
        Ok(())
    }
}
