//! Quick-scan station
//!
//! One scan, one commit. A unit label moves that unit; an equipment label
//! moves a chosen quantity of the template with no unit attached.

use std::sync::Arc;

use tracing::{debug, error, info, instrument};
use uuid::Uuid;

use crate::database::store::InventoryStore;
use crate::models::{ApprovalStatus, CreateTransactionRequest, Equipment, Transaction};
use crate::services::checkout::{capacity_message, check_unit_status, conflict_message, NOT_FOUND};
use crate::services::resolver::{CodeResolver, Resolved};
use crate::services::saga::Saga;
use crate::services::session::{ContextGuard, StudioContext};
use crate::state::{CartItem, FlowContext, FlowKind, FlowManager, FlowMode, FlowStep};
use crate::utils::errors::{GearError, Result};
use crate::utils::logging::{log_scan, log_transaction};

/// What the station is about to move
#[derive(Debug, Clone, PartialEq)]
pub enum StationTarget {
    Unit(CartItem),
    Equipment(Equipment),
}

impl StationTarget {
    pub fn equipment(&self) -> &Equipment {
        match self {
            StationTarget::Unit(item) => &item.equipment,
            StationTarget::Equipment(equipment) => equipment,
        }
    }
}

/// Check a template quantity against current counts
pub fn check_quantity(mode: FlowMode, equipment: &Equipment, quantity: i32) -> Result<()> {
    if quantity < 1 {
        return Err(GearError::InvalidInput("Quantity must be at least 1".to_string()));
    }
    let fits = match mode {
        FlowMode::Checkout => quantity <= equipment.available_quantity,
        FlowMode::Checkin => quantity <= equipment.total_quantity - equipment.available_quantity,
    };
    if !fits {
        return Err(GearError::CapacityExceeded(capacity_message(mode).to_string()));
    }
    Ok(())
}

pub struct ScanStation {
    store: Arc<dyn InventoryStore>,
    guard: ContextGuard,
    resolver: CodeResolver,
    manager: FlowManager,
    context: FlowContext,
    studio: StudioContext,
    approval_workflow: bool,
    target: Option<StationTarget>,
    quantity: i32,
    last: Option<Transaction>,
}

impl ScanStation {
    pub fn new(
        store: Arc<dyn InventoryStore>,
        guard: ContextGuard,
        studio: StudioContext,
        approval_workflow: bool,
    ) -> Self {
        Self {
            resolver: CodeResolver::new(Arc::clone(&store)),
            store,
            guard,
            manager: FlowManager::new(),
            context: FlowContext::new(FlowKind::QuickScan),
            studio,
            approval_workflow,
            target: None,
            quantity: 1,
            last: None,
        }
    }

    pub fn step(&self) -> FlowStep {
        self.context.step
    }

    pub fn mode(&self) -> FlowMode {
        self.context.mode
    }

    pub fn target(&self) -> Option<&StationTarget> {
        self.target.as_ref()
    }

    pub fn quantity(&self) -> i32 {
        self.quantity
    }

    pub fn message(&self) -> Option<&str> {
        self.context.message.as_deref()
    }

    /// Transaction written by the last successful confirm
    pub fn last_transaction(&self) -> Option<&Transaction> {
        self.last.as_ref()
    }

    /// Change direction; discards whatever was scanned
    pub fn set_mode(&mut self, mode: FlowMode) {
        if mode != self.context.mode {
            self.reset();
            self.context.mode = mode;
            info!(studio_id = %self.studio.studio_id, mode = %mode, "Station mode changed");
        }
    }

    /// Resolve a decoded code. Returns false when the station is busy and
    /// the code was ignored.
    #[instrument(skip(self), fields(studio_id = %self.studio.studio_id, mode = %self.context.mode))]
    pub async fn handle_scan(&mut self, text: &str) -> Result<bool> {
        if self.context.step != FlowStep::Scan {
            debug!(step = %self.context.step, "Scan ignored");
            return Ok(false);
        }

        let resolved = match self.resolver.resolve(self.studio.studio_id, text).await {
            Ok(Some(resolved)) => resolved,
            Ok(None) => return Err(self.reject(text, GearError::NotFound(NOT_FOUND.to_string()))),
            Err(e) => return Err(self.reject(text, e)),
        };

        let target = match resolved {
            Resolved::Unit(row) => {
                if let Err(e) = check_unit_status(self.context.mode, row.unit.status) {
                    return Err(self.reject(text, e));
                }
                StationTarget::Unit(CartItem::from_resolved(row))
            }
            Resolved::Equipment(equipment) => StationTarget::Equipment(equipment),
        };

        log_scan(self.studio.studio_id, text, true, None);
        self.target = Some(target);
        self.quantity = 1;
        self.context.clear_message();
        self.manager.transition(&mut self.context, FlowStep::ConfirmItem)?;
        Ok(true)
    }

    fn reject(&mut self, text: &str, error: GearError) -> GearError {
        let message = error.user_message();
        log_scan(self.studio.studio_id, text, false, Some(&message));
        self.context.set_message(message);
        error
    }

    /// Quantity for a template; units always move one at a time
    pub fn set_quantity(&mut self, quantity: i32) -> Result<()> {
        self.manager.require_step(&self.context, FlowStep::ConfirmItem, "set_quantity")?;
        match &self.target {
            Some(StationTarget::Equipment(_)) => {}
            _ => {
                return Err(GearError::InvalidInput(
                    "Quantity only applies to equipment labels".to_string(),
                ))
            }
        }
        if quantity < 1 {
            return Err(GearError::InvalidInput("Quantity must be at least 1".to_string()));
        }
        self.quantity = quantity;
        Ok(())
    }

    /// Commit the scanned unit or quantity
    #[instrument(skip(self), fields(studio_id = %self.studio.studio_id, mode = %self.context.mode))]
    pub async fn confirm(&mut self) -> Result<Transaction> {
        self.manager.require_step(&self.context, FlowStep::ConfirmItem, "confirm")?;
        let target = self
            .target
            .clone()
            .ok_or_else(|| GearError::StateConflict("Nothing scanned yet.".to_string()))?;

        match self.guard.revalidate(&self.studio).await {
            Ok(current) => self.studio = current,
            Err(e) => {
                self.context.set_message(e.user_message());
                return Err(e);
            }
        }

        self.manager.transition(&mut self.context, FlowStep::Processing)?;

        let mut saga = Saga::new(self.store.as_ref(), None);
        let outcome = match &target {
            StationTarget::Unit(item) => self.commit_unit(item, &mut saga).await,
            StationTarget::Equipment(equipment) => self.commit_quantity(equipment, &mut saga).await,
        };

        match outcome {
            Ok(transaction) => {
                saga.finish();
                log_transaction(
                    self.studio.studio_id,
                    self.studio.user_id,
                    transaction.kind.as_str(),
                    transaction.equipment_id,
                    transaction.quantity,
                );
                self.context.clear_message();
                self.manager.transition(&mut self.context, FlowStep::Success)?;
                self.last = Some(transaction.clone());
                Ok(transaction)
            }
            Err(e) => {
                let compensation_failures = saga.compensate().await;
                error!(error = %e, compensation_failures, "Quick scan commit failed");
                let failure = match e {
                    // Rejected before any write
                    GearError::CapacityExceeded(_) | GearError::NotFound(_) | GearError::InvalidInput(_)
                        if compensation_failures == 0 =>
                    {
                        e
                    }
                    other => GearError::CommitFailed {
                        committed: 0,
                        compensation_failures,
                        source: Box::new(other),
                    },
                };
                self.context.set_message(failure.user_message());
                self.manager.transition(&mut self.context, FlowStep::ConfirmItem)?;
                Err(failure)
            }
        }
    }

    async fn commit_unit(&self, item: &CartItem, saga: &mut Saga<'_>) -> Result<Transaction> {
        let mode = self.context.mode;
        saga.transition_unit(item.unit_id(), item.observed_status, mode.target_status(), conflict_message(mode))
            .await?;
        saga.adjust_available(item.equipment.id, mode.availability_delta(1), capacity_message(mode))
            .await?;
        saga.record_transaction(self.transaction_request(item.equipment.id, Some(item.unit_id()), 1))
            .await
    }

    async fn commit_quantity(&self, scanned: &Equipment, saga: &mut Saga<'_>) -> Result<Transaction> {
        let mode = self.context.mode;
        let quantity = self.quantity;

        let fresh = self
            .store
            .find_equipment(self.studio.studio_id, scanned.id)
            .await?
            .ok_or_else(|| GearError::NotFound(NOT_FOUND.to_string()))?;
        check_quantity(mode, &fresh, quantity)?;

        saga.adjust_available(fresh.id, mode.availability_delta(quantity), capacity_message(mode))
            .await?;
        saga.record_transaction(self.transaction_request(fresh.id, None, quantity))
            .await
    }

    fn transaction_request(&self, equipment_id: Uuid, unit_id: Option<Uuid>, quantity: i32) -> CreateTransactionRequest {
        CreateTransactionRequest {
            studio_id: self.studio.studio_id,
            equipment_id,
            equipment_item_id: unit_id,
            user_id: self.studio.user_id,
            kind: self.context.mode.transaction_type(),
            quantity,
            photo_url: None,
            notes: None,
            approval_status: self.approval_workflow.then_some(ApprovalStatus::Pending),
        }
    }

    /// Leave confirmation or success and scan again
    pub fn next_scan(&mut self) -> Result<()> {
        match self.context.step {
            FlowStep::ConfirmItem | FlowStep::Success => {
                self.manager.transition(&mut self.context, FlowStep::Scan)?;
                self.target = None;
                self.quantity = 1;
                self.context.clear_message();
                Ok(())
            }
            FlowStep::Scan => Ok(()),
            other => Err(GearError::InvalidStateTransition {
                from: other.to_string(),
                to: FlowStep::Scan.to_string(),
            }),
        }
    }

    fn reset(&mut self) {
        self.context.reset();
        self.target = None;
        self.quantity = 1;
    }
}
