//! Multi-write commit with compensation
//!
//! The backend offers no transaction spanning several requests. A `Saga`
//! performs the writes of one commit in order and remembers how to undo each
//! one; if a later write fails, `compensate` undoes the earlier ones in
//! reverse order.

use tracing::{error, warn};
use uuid::Uuid;

use crate::database::store::{InventoryStore, PhotoStorage};
use crate::models::{CreateTransactionRequest, Equipment, Transaction, UnitStatus};
use crate::state::CapturedPhoto;
use crate::utils::errors::{GearError, Result};

#[derive(Debug, Clone)]
enum Compensation {
    RestoreStatus { unit_id: Uuid, from: UnitStatus, to: UnitStatus },
    Adjust { equipment_id: Uuid, delta: i32 },
    RemovePhoto { bucket: String, path: String },
    DeleteTransaction { transaction_id: Uuid },
}

pub struct Saga<'a> {
    store: &'a dyn InventoryStore,
    photos: Option<&'a dyn PhotoStorage>,
    undo: Vec<Compensation>,
}

impl<'a> Saga<'a> {
    pub fn new(store: &'a dyn InventoryStore, photos: Option<&'a dyn PhotoStorage>) -> Self {
        Self {
            store,
            photos,
            undo: Vec::new(),
        }
    }

    /// Compare-and-set a unit's status; a lost race is a state conflict
    pub async fn transition_unit(&mut self, unit_id: Uuid, from: UnitStatus, to: UnitStatus, conflict: &str) -> Result<()> {
        if !self.store.transition_unit_status(unit_id, from, to).await? {
            return Err(GearError::StateConflict(conflict.to_string()));
        }
        self.undo.push(Compensation::RestoreStatus { unit_id, from: to, to: from });
        Ok(())
    }

    /// Bounded change of `available_quantity`; out of bounds is a capacity error
    pub async fn adjust_available(&mut self, equipment_id: Uuid, delta: i32, capacity: &str) -> Result<Equipment> {
        let updated = self
            .store
            .adjust_available_quantity(equipment_id, delta)
            .await?
            .ok_or_else(|| GearError::CapacityExceeded(capacity.to_string()))?;
        self.undo.push(Compensation::Adjust { equipment_id, delta: -delta });
        Ok(updated)
    }

    /// Upload a photo and return its public URL
    pub async fn upload_photo(&mut self, bucket: &str, path: &str, photo: &CapturedPhoto) -> Result<String> {
        let photos = self
            .photos
            .ok_or_else(|| GearError::Config("Photo storage is not configured".to_string()))?;
        let url = photos
            .upload(bucket, path, photo.bytes.clone(), &photo.content_type)
            .await?;
        self.undo.push(Compensation::RemovePhoto {
            bucket: bucket.to_string(),
            path: path.to_string(),
        });
        Ok(url)
    }

    pub async fn record_transaction(&mut self, request: CreateTransactionRequest) -> Result<Transaction> {
        let transaction = self.store.record_transaction(request).await?;
        self.undo.push(Compensation::DeleteTransaction { transaction_id: transaction.id });
        Ok(transaction)
    }

    /// Undo every completed step, newest first. Returns how many undo
    /// steps failed; those are logged and otherwise ignored.
    pub async fn compensate(self) -> usize {
        let mut failures = 0;
        for step in self.undo.into_iter().rev() {
            let result = match &step {
                Compensation::RestoreStatus { unit_id, from, to } => self
                    .store
                    .transition_unit_status(*unit_id, *from, *to)
                    .await
                    .and_then(|restored| {
                        if restored {
                            Ok(())
                        } else {
                            Err(GearError::StateConflict("unit status changed concurrently".to_string()))
                        }
                    }),
                Compensation::Adjust { equipment_id, delta } => self
                    .store
                    .adjust_available_quantity(*equipment_id, *delta)
                    .await
                    .and_then(|row| {
                        row.map(|_| ())
                            .ok_or_else(|| GearError::CapacityExceeded("inverse adjustment out of bounds".to_string()))
                    }),
                Compensation::RemovePhoto { bucket, path } => match self.photos {
                    Some(photos) => photos.remove(bucket, path).await,
                    None => Ok(()),
                },
                Compensation::DeleteTransaction { transaction_id } => {
                    self.store.delete_transaction(*transaction_id).await
                }
            };

            match result {
                Ok(()) => warn!(step = ?step, "Compensated"),
                Err(e) => {
                    failures += 1;
                    error!(step = ?step, error = %e, "Compensation failed");
                }
            }
        }
        failures
    }

    /// Forget the undo log once the commit is complete
    pub fn finish(self) {}
}
