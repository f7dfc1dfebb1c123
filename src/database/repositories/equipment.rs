//! Equipment template repository implementation

use chrono::Utc;
use serde::Serialize;
use uuid::Uuid;

use super::studio::first_row;
use crate::database::connection::{BackendClient, Query};
use crate::models::equipment::{CreateEquipmentRequest, Equipment, UpdateEquipmentRequest};
use crate::utils::errors::Result;

#[derive(Debug, Serialize)]
struct AdjustArgs {
    p_equipment_id: Uuid,
    p_delta: i32,
}

#[derive(Debug, Clone)]
pub struct EquipmentRepository {
    client: BackendClient,
}

impl EquipmentRepository {
    pub fn new(client: BackendClient) -> Self {
        Self { client }
    }

    /// Create a new equipment template
    pub async fn create(&self, request: CreateEquipmentRequest) -> Result<Equipment> {
        let rows: Vec<Equipment> = self.client.insert("equipment", &request).await?;
        first_row(rows, "equipment")
    }

    /// Find equipment by ID within a studio
    pub async fn find_by_id(&self, studio_id: Uuid, id: Uuid) -> Result<Option<Equipment>> {
        let rows: Vec<Equipment> = self
            .client
            .select(
                "equipment",
                &Query::new().select("*").eq("id", id).eq("studio_id", studio_id),
            )
            .await?;
        Ok(rows.into_iter().next())
    }

    /// List a studio's equipment, optionally filtered by name
    pub async fn list(&self, studio_id: Uuid, search: Option<&str>) -> Result<Vec<Equipment>> {
        let mut query = Query::new().select("*").eq("studio_id", studio_id);
        if let Some(search) = search.map(str::trim).filter(|s| !s.is_empty()) {
            query = query.ilike("name", search);
        }
        self.client.select("equipment", &query.order("name", true)).await
    }

    /// Update name/category/sku/notes and bump `updated_at`
    pub async fn update(&self, studio_id: Uuid, id: Uuid, mut request: UpdateEquipmentRequest) -> Result<Option<Equipment>> {
        request.updated_at = Some(Utc::now());
        let rows: Vec<Equipment> = self
            .client
            .update(
                "equipment",
                &Query::new().eq("id", id).eq("studio_id", studio_id),
                &request,
            )
            .await?;
        Ok(rows.into_iter().next())
    }

    /// Delete equipment
    pub async fn delete(&self, studio_id: Uuid, id: Uuid) -> Result<()> {
        self.client
            .delete("equipment", &Query::new().eq("id", id).eq("studio_id", studio_id))
            .await
    }

    /// Bounded atomic change of `available_quantity` (server function)
    pub async fn adjust_available_quantity(&self, id: Uuid, delta: i32) -> Result<Option<Equipment>> {
        let rows: Vec<Equipment> = self
            .client
            .rpc(
                "adjust_available_quantity",
                &AdjustArgs { p_equipment_id: id, p_delta: delta },
            )
            .await?;
        Ok(rows.into_iter().next())
    }
}
