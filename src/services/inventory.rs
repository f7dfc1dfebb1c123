//! Inventory service implementation
//!
//! Equipment templates and their units: creation with generated unit codes,
//! edits, deletion, search and the detail view.

use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::database::store::PhotoStorage;
use crate::database::DataService;
use crate::models::{
    CodeType, CreateEquipmentRequest, CreateUnitRequest, Equipment, EquipmentUnit, Transaction, UnitStatus,
    UnitWithEquipment, UpdateEquipmentRequest,
};
use crate::services::session::{ContextGuard, StudioContext};
use crate::state::CapturedPhoto;
use crate::utils::errors::{GearError, Result};
use crate::utils::helpers::{epoch_millis, extension_for_content_type, generate_unit_code, unit_code_base};

const RECENT_TRANSACTIONS: usize = 20;

/// Input for a new equipment template
#[derive(Debug, Clone)]
pub struct NewEquipment {
    pub name: String,
    pub category: String,
    pub sku: Option<String>,
    /// Number of units to create
    pub quantity: i32,
    pub notes: Option<String>,
    pub code_type: CodeType,
    pub photo: Option<CapturedPhoto>,
}

/// A template with the units created for it
#[derive(Debug, Clone)]
pub struct CreatedEquipment {
    pub equipment: Equipment,
    pub units: Vec<EquipmentUnit>,
}

#[derive(Debug, Clone)]
pub struct EquipmentDetail {
    pub equipment: Equipment,
    pub units: Vec<EquipmentUnit>,
    pub transactions: Vec<Transaction>,
}

#[derive(Debug, Clone)]
pub struct InventoryService {
    data: DataService,
    guard: ContextGuard,
    photos_bucket: String,
}

impl InventoryService {
    pub fn new(data: DataService, guard: ContextGuard, photos_bucket: impl Into<String>) -> Self {
        Self {
            data,
            guard,
            photos_bucket: photos_bucket.into(),
        }
    }

    /// Create a template and one unit per quantity.
    ///
    /// If the units cannot be inserted, the template and its photo are
    /// removed again.
    pub async fn add_equipment(&self, context: &StudioContext, new: NewEquipment) -> Result<CreatedEquipment> {
        let context = self.guard.revalidate(context).await?;

        let name = new.name.trim().to_string();
        if name.is_empty() {
            return Err(GearError::InvalidInput("Please enter a name".to_string()));
        }
        if new.quantity < 1 {
            return Err(GearError::InvalidInput("Quantity must be at least 1".to_string()));
        }
        let photo = new
            .photo
            .filter(|p| !p.bytes.is_empty())
            .ok_or_else(|| GearError::InvalidInput("Please add a photo of the equipment".to_string()))?;

        let path = format!(
            "{}/{}.{}",
            context.studio_id,
            epoch_millis(),
            extension_for_content_type(&photo.content_type)
        );
        let photo_url = self
            .data
            .upload(&self.photos_bucket, &path, photo.bytes, &photo.content_type)
            .await?;

        let sku = new.sku.map(|s| s.trim().to_string()).filter(|s| !s.is_empty());
        let request = CreateEquipmentRequest {
            studio_id: context.studio_id,
            name: name.clone(),
            category: new.category.trim().to_string(),
            sku: sku.clone(),
            total_quantity: new.quantity,
            available_quantity: new.quantity,
            photo_url: Some(photo_url),
            notes: new.notes.filter(|n| !n.trim().is_empty()),
        };

        let equipment = match self.data.equipment.create(request).await {
            Ok(equipment) => equipment,
            Err(e) => {
                self.remove_photo(&path).await;
                return Err(e);
            }
        };

        let base = unit_code_base(&name, sku.as_deref());
        let unit_requests: Vec<CreateUnitRequest> = (1..=new.quantity as usize)
            .map(|index| CreateUnitRequest {
                equipment_id: equipment.id,
                studio_id: context.studio_id,
                code: generate_unit_code(&base, index),
                code_type: new.code_type,
                status: UnitStatus::Available,
            })
            .collect();

        let units = match self.data.units.create_many(&unit_requests).await {
            Ok(units) => units,
            Err(e) => {
                warn!(equipment_id = %equipment.id, error = %e, "Unit creation failed, removing template");
                if let Err(cleanup) = self.data.equipment.delete(context.studio_id, equipment.id).await {
                    warn!(equipment_id = %equipment.id, error = %cleanup, "Failed to remove template");
                }
                self.remove_photo(&path).await;
                return Err(e);
            }
        };

        info!(
            studio_id = %context.studio_id,
            equipment_id = %equipment.id,
            units = units.len(),
            "Equipment added"
        );
        Ok(CreatedEquipment { equipment, units })
    }

    async fn remove_photo(&self, path: &str) {
        if let Err(e) = self.data.remove(&self.photos_bucket, path).await {
            warn!(path = %path, error = %e, "Failed to remove equipment photo");
        }
    }

    /// Edit name, category, SKU or notes
    pub async fn update_equipment(
        &self,
        context: &StudioContext,
        equipment_id: Uuid,
        update: UpdateEquipmentRequest,
    ) -> Result<Equipment> {
        let context = self.guard.revalidate(context).await?;
        if let Some(name) = &update.name {
            if name.trim().is_empty() {
                return Err(GearError::InvalidInput("Please enter a name".to_string()));
            }
        }

        let equipment = self
            .data
            .equipment
            .update(context.studio_id, equipment_id, update)
            .await?
            .ok_or_else(|| GearError::NotFound("Equipment not found".to_string()))?;
        info!(studio_id = %context.studio_id, equipment_id = %equipment_id, "Equipment updated");
        Ok(equipment)
    }

    /// Delete a template together with its units
    pub async fn delete_equipment(&self, context: &StudioContext, equipment_id: Uuid) -> Result<()> {
        let context = self.guard.require_manager(context).await?;

        self.data
            .equipment
            .find_by_id(context.studio_id, equipment_id)
            .await?
            .ok_or_else(|| GearError::NotFound("Equipment not found".to_string()))?;

        self.data.units.delete_by_equipment(equipment_id).await?;
        self.data.equipment.delete(context.studio_id, equipment_id).await?;
        info!(studio_id = %context.studio_id, equipment_id = %equipment_id, "Equipment deleted");
        Ok(())
    }

    /// Templates of the studio, optionally filtered by name
    pub async fn list_equipment(&self, context: &StudioContext, search: Option<&str>) -> Result<Vec<Equipment>> {
        let context = self.guard.revalidate(context).await?;
        let search = search.map(str::trim).filter(|s| !s.is_empty());
        debug!(studio_id = %context.studio_id, search = ?search, "Listing equipment");
        self.data.equipment.list(context.studio_id, search).await
    }

    pub async fn equipment_detail(&self, context: &StudioContext, equipment_id: Uuid) -> Result<EquipmentDetail> {
        let context = self.guard.revalidate(context).await?;
        let equipment = self
            .data
            .equipment
            .find_by_id(context.studio_id, equipment_id)
            .await?
            .ok_or_else(|| GearError::NotFound("Equipment not found".to_string()))?;

        let units = self.data.units.list_by_equipment(equipment_id).await?;
        let transactions = self
            .data
            .transactions
            .list_for_equipment(equipment_id, RECENT_TRANSACTIONS)
            .await?;

        Ok(EquipmentDetail {
            equipment,
            units,
            transactions,
        })
    }

    /// Every unit of the studio with its template, for label export
    pub async fn list_units(&self, context: &StudioContext) -> Result<Vec<UnitWithEquipment>> {
        let context = self.guard.revalidate(context).await?;
        self.data.units.list_by_studio(context.studio_id).await
    }
}
