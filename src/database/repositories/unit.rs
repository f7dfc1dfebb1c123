//! Equipment unit repository implementation

use serde_json::json;
use uuid::Uuid;

use crate::database::connection::{BackendClient, Query};
use crate::models::equipment::{CreateUnitRequest, EquipmentUnit, UnitStatus, UnitWithEquipment};
use crate::utils::errors::Result;

const TABLE: &str = "equipment_items";
const WITH_EQUIPMENT: &str = "*,equipment(*)";

#[derive(Debug, Clone)]
pub struct UnitRepository {
    client: BackendClient,
}

impl UnitRepository {
    pub fn new(client: BackendClient) -> Self {
        Self { client }
    }

    /// Insert a batch of units in one request
    pub async fn create_many(&self, requests: &[CreateUnitRequest]) -> Result<Vec<EquipmentUnit>> {
        self.client.insert(TABLE, requests).await
    }

    pub async fn find_by_id(&self, studio_id: Uuid, id: Uuid) -> Result<Option<UnitWithEquipment>> {
        let rows: Vec<UnitWithEquipment> = self
            .client
            .select(
                TABLE,
                &Query::new().select(WITH_EQUIPMENT).eq("id", id).eq("studio_id", studio_id),
            )
            .await?;
        Ok(rows.into_iter().next())
    }

    /// Units with exactly this code
    pub async fn find_by_code(&self, studio_id: Uuid, code: &str) -> Result<Vec<UnitWithEquipment>> {
        self.client
            .select(
                TABLE,
                &Query::new().select(WITH_EQUIPMENT).eq("code", code).eq("studio_id", studio_id),
            )
            .await
    }

    /// Units of one template ordered by code
    pub async fn list_by_equipment(&self, equipment_id: Uuid) -> Result<Vec<EquipmentUnit>> {
        self.client
            .select(
                TABLE,
                &Query::new().select("*").eq("equipment_id", equipment_id).order("code", true),
            )
            .await
    }

    /// Every unit in a studio with its template
    pub async fn list_by_studio(&self, studio_id: Uuid) -> Result<Vec<UnitWithEquipment>> {
        self.client
            .select(
                TABLE,
                &Query::new().select(WITH_EQUIPMENT).eq("studio_id", studio_id).order("code", true),
            )
            .await
    }

    /// Conditional status update; false when the unit was no longer in `from`
    pub async fn transition_status(&self, id: Uuid, from: UnitStatus, to: UnitStatus) -> Result<bool> {
        let rows: Vec<EquipmentUnit> = self
            .client
            .update(
                TABLE,
                &Query::new().eq("id", id).eq("status", from),
                &json!({ "status": to }),
            )
            .await?;
        Ok(!rows.is_empty())
    }

    pub async fn delete_by_equipment(&self, equipment_id: Uuid) -> Result<()> {
        self.client
            .delete(TABLE, &Query::new().eq("equipment_id", equipment_id))
            .await
    }
}
