//! Scanned text to inventory record resolution

use std::sync::Arc;
use tracing::debug;
use uuid::Uuid;

use crate::database::store::InventoryStore;
use crate::models::{CodePayload, Equipment, PayloadType, UnitWithEquipment};
use crate::utils::errors::Result;

/// What a scan pointed at
#[derive(Debug, Clone, PartialEq)]
pub enum Resolved {
    Unit(UnitWithEquipment),
    Equipment(Equipment),
}

#[derive(Clone)]
pub struct CodeResolver {
    store: Arc<dyn InventoryStore>,
}

impl CodeResolver {
    pub fn new(store: Arc<dyn InventoryStore>) -> Self {
        Self { store }
    }

    /// Resolve to a single unit; template labels do not resolve here
    pub async fn resolve_unit(&self, studio_id: Uuid, text: &str) -> Result<Option<UnitWithEquipment>> {
        match self.resolve_inner(studio_id, text, false).await? {
            Some(Resolved::Unit(unit)) => Ok(Some(unit)),
            _ => Ok(None),
        }
    }

    /// Resolve to a unit or, failing that, an equipment template
    pub async fn resolve(&self, studio_id: Uuid, text: &str) -> Result<Option<Resolved>> {
        self.resolve_inner(studio_id, text, true).await
    }

    async fn resolve_inner(&self, studio_id: Uuid, text: &str, allow_templates: bool) -> Result<Option<Resolved>> {
        match CodePayload::parse(text) {
            CodePayload::Structured(payload) => {
                if payload.studio_id != studio_id {
                    debug!(payload_studio = %payload.studio_id, studio_id = %studio_id, "Label belongs to another studio");
                    return Ok(None);
                }
                match payload.kind {
                    PayloadType::Item => Ok(self
                        .store
                        .find_unit_by_id(studio_id, payload.id)
                        .await?
                        .map(Resolved::Unit)),
                    PayloadType::Equipment if allow_templates => Ok(self
                        .store
                        .find_equipment(studio_id, payload.id)
                        .await?
                        .map(Resolved::Equipment)),
                    PayloadType::Equipment => Ok(None),
                }
            }
            CodePayload::Bare(code) => {
                if code.is_empty() {
                    return Ok(None);
                }

                let mut by_code = self.store.find_units_by_code(studio_id, &code).await?;
                match by_code.len() {
                    1 => return Ok(by_code.pop().map(Resolved::Unit)),
                    0 => {}
                    n => {
                        debug!(code = %code, matches = n, "Ambiguous unit code");
                        return Ok(None);
                    }
                }

                let Ok(id) = Uuid::parse_str(&code) else {
                    return Ok(None);
                };
                if let Some(unit) = self.store.find_unit_by_id(studio_id, id).await? {
                    return Ok(Some(Resolved::Unit(unit)));
                }
                if allow_templates {
                    return Ok(self
                        .store
                        .find_equipment(studio_id, id)
                        .await?
                        .map(Resolved::Equipment));
                }
                Ok(None)
            }
        }
    }
}
