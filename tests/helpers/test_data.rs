//! Seed data for workflow tests

use std::sync::Arc;

use chrono::Utc;
use uuid::Uuid;

use studio_gear::database::{InventoryStore, PhotoStorage};
use studio_gear::models::{
    CodeType, Equipment, EquipmentUnit, MembershipStatus, StudioRole, StudioUser, UnitStatus,
};
use studio_gear::services::checkout::CheckoutOptions;
use studio_gear::services::{CheckoutFlow, ContextGuard, ScanStation, StudioContext};

use super::memory_store::MemoryStore;

pub const CAMERA_CODE: &str = "CAM-001-AB12";

pub fn test_equipment(studio_id: Uuid, name: &str, total: i32, available: i32) -> Equipment {
    Equipment {
        id: Uuid::new_v4(),
        studio_id,
        name: name.to_string(),
        category: "video".to_string(),
        sku: None,
        total_quantity: total,
        available_quantity: available,
        metadata: None,
        photo_url: None,
        notes: None,
        created_at: Utc::now(),
        updated_at: None,
    }
}

pub fn test_unit(equipment: &Equipment, code: &str, status: UnitStatus) -> EquipmentUnit {
    EquipmentUnit {
        id: Uuid::new_v4(),
        equipment_id: equipment.id,
        studio_id: equipment.studio_id,
        code: code.to_string(),
        code_type: CodeType::Qr,
        status,
        photo_url: None,
        created_at: Utc::now(),
    }
}

/// One studio with a five-unit camera template, all units available
pub struct StudioFixture {
    pub store: Arc<MemoryStore>,
    pub context: StudioContext,
    pub camera: Equipment,
    pub units: Vec<EquipmentUnit>,
}

impl StudioFixture {
    pub fn new(role: StudioRole) -> Self {
        let store = Arc::new(MemoryStore::new());
        let studio_id = Uuid::new_v4();
        let user_id = Uuid::new_v4();

        store.insert_membership(StudioUser {
            id: Uuid::new_v4(),
            studio_id,
            user_id,
            role,
            status: MembershipStatus::Active,
            created_at: Some(Utc::now()),
        });

        let camera = test_equipment(studio_id, "Camera", 5, 5);
        store.insert_equipment(camera.clone());

        let codes = [CAMERA_CODE, "CAM-002-CD34", "CAM-003-EF56", "CAM-004-GH78", "CAM-005-IJ90"];
        let units: Vec<EquipmentUnit> = codes
            .iter()
            .map(|code| test_unit(&camera, code, UnitStatus::Available))
            .collect();
        for unit in &units {
            store.insert_unit(unit.clone());
        }

        Self {
            store,
            context: StudioContext { studio_id, user_id, role },
            camera,
            units,
        }
    }

    /// Mark a unit checked out and reduce availability to match
    pub fn check_out(&self, unit: &EquipmentUnit) {
        self.store.set_unit_status(unit.id, UnitStatus::CheckedOut);
        let available = self.store.equipment(self.camera.id).available_quantity;
        self.store.set_available(self.camera.id, available - 1);
    }

    pub fn guard(&self) -> ContextGuard {
        let store: Arc<dyn InventoryStore> = self.store.clone();
        ContextGuard::new(store, None)
    }

    pub fn checkout_flow(&self, options: CheckoutOptions) -> CheckoutFlow {
        let store: Arc<dyn InventoryStore> = self.store.clone();
        let photos: Arc<dyn PhotoStorage> = self.store.clone();
        CheckoutFlow::new(store, photos, self.guard(), self.context, options)
    }

    pub fn scan_station(&self, approval_workflow: bool) -> ScanStation {
        let store: Arc<dyn InventoryStore> = self.store.clone();
        ScanStation::new(store, self.guard(), self.context, approval_workflow)
    }
}

/// A few bytes that stand in for a JPEG
pub fn test_photo() -> Vec<u8> {
    vec![0xFF, 0xD8, 0xFF, 0xE0, 0x00, 0x10]
}
