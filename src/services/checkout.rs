//! Cart-based checkout/checkin flow
//!
//! Scanned units are confirmed, photographed and staged in a cart. Committing
//! the cart writes each item through its own [`Saga`], so a failure part way
//! through leaves earlier items committed and undoes only the failing one.

use std::sync::Arc;

use tracing::{error, info, instrument};
use uuid::Uuid;

use crate::config::Settings;
use crate::database::store::{InventoryStore, PhotoStorage};
use crate::models::{ApprovalStatus, CreateTransactionRequest, Transaction, UnitStatus};
use crate::services::resolver::CodeResolver;
use crate::services::saga::Saga;
use crate::services::session::{ContextGuard, StudioContext};
use crate::state::{CapturedPhoto, CartItem, FlowContext, FlowKind, FlowManager, FlowMode, FlowStep};
use crate::utils::errors::{GearError, Result};
use crate::utils::helpers::{epoch_millis, extension_for_content_type};
use crate::utils::logging::{log_scan, log_transaction};

pub(crate) const NOT_FOUND: &str = "Item not found. Make sure you are scanning a valid label.";
pub(crate) const ALREADY_OUT: &str = "This item is already checked out.";
pub(crate) const NOT_OUT: &str = "This item is not currently checked out.";
pub(crate) const NOT_ENOUGH: &str = "Not enough items available";
pub(crate) const EXCEEDS_TOTAL: &str = "Return exceeds total";

/// Whether a unit in `status` may go through a flow in `mode`
pub(crate) fn check_unit_status(mode: FlowMode, status: UnitStatus) -> Result<()> {
    match mode {
        FlowMode::Checkout if status != UnitStatus::Available => {
            Err(GearError::StateConflict(ALREADY_OUT.to_string()))
        }
        FlowMode::Checkin if status == UnitStatus::Available => {
            Err(GearError::StateConflict(NOT_OUT.to_string()))
        }
        _ => Ok(()),
    }
}

pub(crate) fn conflict_message(mode: FlowMode) -> &'static str {
    match mode {
        FlowMode::Checkout => ALREADY_OUT,
        FlowMode::Checkin => NOT_OUT,
    }
}

pub(crate) fn capacity_message(mode: FlowMode) -> &'static str {
    match mode {
        FlowMode::Checkout => NOT_ENOUGH,
        FlowMode::Checkin => EXCEEDS_TOTAL,
    }
}

/// Commit behaviour taken from settings
#[derive(Debug, Clone)]
pub struct CheckoutOptions {
    pub transaction_bucket: String,
    /// New transactions start as `pending`
    pub approval_workflow: bool,
    /// Staging requires a condition photo
    pub require_photo: bool,
}

impl CheckoutOptions {
    pub fn from_settings(settings: &Settings) -> Self {
        Self {
            transaction_bucket: settings.storage.transaction_photos_bucket.clone(),
            approval_workflow: settings.features.approval_workflow,
            require_photo: settings.features.require_condition_photo,
        }
    }
}

impl Default for CheckoutOptions {
    fn default() -> Self {
        Self {
            transaction_bucket: "transaction-photos".to_string(),
            approval_workflow: false,
            require_photo: true,
        }
    }
}

/// Result of a fully committed cart
#[derive(Debug, Clone)]
pub struct CommitReport {
    pub mode: FlowMode,
    pub transactions: Vec<Transaction>,
}

pub struct CheckoutFlow {
    store: Arc<dyn InventoryStore>,
    photos: Arc<dyn PhotoStorage>,
    guard: ContextGuard,
    resolver: CodeResolver,
    manager: FlowManager,
    context: FlowContext,
    studio: StudioContext,
    options: CheckoutOptions,
}

impl CheckoutFlow {
    pub fn new(
        store: Arc<dyn InventoryStore>,
        photos: Arc<dyn PhotoStorage>,
        guard: ContextGuard,
        studio: StudioContext,
        options: CheckoutOptions,
    ) -> Self {
        Self {
            resolver: CodeResolver::new(Arc::clone(&store)),
            store,
            photos,
            guard,
            manager: FlowManager::new(),
            context: FlowContext::new(FlowKind::Cart),
            studio,
            options,
        }
    }

    pub fn context(&self) -> &FlowContext {
        &self.context
    }

    pub fn step(&self) -> FlowStep {
        self.context.step
    }

    pub fn mode(&self) -> FlowMode {
        self.context.mode
    }

    pub fn cart(&self) -> &[CartItem] {
        &self.context.cart
    }

    pub fn current(&self) -> Option<&CartItem> {
        self.context.current.as_ref()
    }

    pub fn message(&self) -> Option<&str> {
        self.context.message.as_deref()
    }

    pub fn studio(&self) -> &StudioContext {
        &self.studio
    }

    /// Switch between checkout and checkin. Only allowed while scanning with
    /// an empty cart.
    pub fn set_mode(&mut self, mode: FlowMode) -> Result<()> {
        if mode == self.context.mode {
            return Ok(());
        }
        if self.context.step != FlowStep::Scan || !self.context.cart.is_empty() {
            return Err(GearError::StateConflict(
                "Clear the cart before switching between checkout and checkin.".to_string(),
            ));
        }
        self.context.mode = mode;
        self.context.clear_message();
        info!(studio_id = %self.studio.studio_id, mode = %mode, "Flow mode changed");
        Ok(())
    }

    /// Resolve a decoded code and move to confirmation
    #[instrument(skip(self), fields(studio_id = %self.studio.studio_id, mode = %self.context.mode))]
    pub async fn handle_scan(&mut self, text: &str) -> Result<()> {
        self.manager.require_step(&self.context, FlowStep::Scan, "scan")?;

        let resolved = match self.resolver.resolve_unit(self.studio.studio_id, text).await {
            Ok(resolved) => resolved,
            Err(e) => return Err(self.reject(text, e)),
        };

        let Some(row) = resolved else {
            return Err(self.reject(text, GearError::NotFound(NOT_FOUND.to_string())));
        };

        if self.context.is_staged(row.unit.id) {
            return Err(self.reject(
                text,
                GearError::StateConflict("This item is already in your cart.".to_string()),
            ));
        }

        if let Err(e) = check_unit_status(self.context.mode, row.unit.status) {
            return Err(self.reject(text, e));
        }

        log_scan(self.studio.studio_id, text, true, None);
        self.context.current = Some(CartItem::from_resolved(row));
        self.context.clear_message();
        self.manager.transition(&mut self.context, FlowStep::ConfirmItem)
    }

    fn reject(&mut self, text: &str, error: GearError) -> GearError {
        let message = error.user_message();
        log_scan(self.studio.studio_id, text, false, Some(&message));
        self.context.set_message(message);
        error
    }

    pub fn begin_photo(&mut self) -> Result<()> {
        self.manager.transition(&mut self.context, FlowStep::Photo)
    }

    /// Hold a condition photo for the current item
    pub fn capture_photo(&mut self, bytes: Vec<u8>, content_type: &str) -> Result<()> {
        self.manager.require_step(&self.context, FlowStep::Photo, "capture_photo")?;
        if bytes.is_empty() {
            return Err(GearError::InvalidInput("The photo is empty.".to_string()));
        }
        let current = self
            .context
            .current
            .as_mut()
            .ok_or_else(|| GearError::StateConflict("No item to photograph.".to_string()))?;
        current.photo = Some(CapturedPhoto {
            bytes,
            content_type: content_type.to_string(),
        });
        Ok(())
    }

    pub fn retake_photo(&mut self) -> Result<()> {
        self.manager.require_step(&self.context, FlowStep::Photo, "retake_photo")?;
        if let Some(current) = self.context.current.as_mut() {
            current.photo = None;
        }
        Ok(())
    }

    /// Stage the current item and go back to scanning
    pub fn confirm_photo(&mut self) -> Result<()> {
        self.manager.require_step(&self.context, FlowStep::Photo, "confirm_photo")?;

        let has_photo = self
            .context
            .current
            .as_ref()
            .map(|item| item.photo.is_some())
            .unwrap_or(false);
        if self.options.require_photo && !has_photo {
            let error = GearError::InvalidInput("Please take a photo of the current condition.".to_string());
            self.context.set_message(error.user_message());
            return Err(error);
        }

        let item = self
            .context
            .current
            .take()
            .ok_or_else(|| GearError::StateConflict("No item to add.".to_string()))?;
        self.context.stage(item);
        self.context.clear_message();
        self.manager.transition(&mut self.context, FlowStep::Scan)
    }

    /// Drop the item being confirmed
    pub fn cancel_item(&mut self) -> Result<()> {
        if !matches!(self.context.step, FlowStep::ConfirmItem | FlowStep::Photo) {
            return Err(GearError::InvalidStateTransition {
                from: self.context.step.to_string(),
                to: "cancel_item".to_string(),
            });
        }
        self.manager.transition(&mut self.context, FlowStep::Scan)?;
        self.context.current = None;
        Ok(())
    }

    /// Unstage a unit. Emptying the cart while reviewing it returns to scanning.
    pub fn remove_from_cart(&mut self, unit_id: Uuid) -> Result<bool> {
        if !matches!(self.context.step, FlowStep::Scan | FlowStep::Cart) {
            return Err(GearError::InvalidStateTransition {
                from: self.context.step.to_string(),
                to: "remove_from_cart".to_string(),
            });
        }
        let removed = self.context.unstage(unit_id);
        if removed && self.context.cart.is_empty() && self.context.step == FlowStep::Cart {
            self.manager.transition(&mut self.context, FlowStep::Scan)?;
        }
        Ok(removed)
    }

    /// Unstage by unit code, as printed on the label
    pub fn remove_code(&mut self, code: &str) -> Result<bool> {
        let unit_id = self
            .context
            .cart
            .iter()
            .find(|item| item.unit.code.eq_ignore_ascii_case(code))
            .map(CartItem::unit_id);
        match unit_id {
            Some(id) => self.remove_from_cart(id),
            None => Ok(false),
        }
    }

    pub fn proceed_to_cart(&mut self) -> Result<()> {
        self.manager.require_step(&self.context, FlowStep::Scan, "proceed_to_cart")?;
        if self.context.cart.is_empty() {
            let error = GearError::InvalidInput("Add at least one item to proceed.".to_string());
            self.context.set_message(error.user_message());
            return Err(error);
        }
        self.context.clear_message();
        self.manager.transition(&mut self.context, FlowStep::Cart)
    }

    pub fn add_more(&mut self) -> Result<()> {
        self.manager.require_step(&self.context, FlowStep::Cart, "add_more")?;
        self.manager.transition(&mut self.context, FlowStep::Scan)
    }

    /// Commit every staged item
    #[instrument(skip(self), fields(studio_id = %self.studio.studio_id, mode = %self.context.mode, items = self.context.cart.len()))]
    pub async fn confirm_transaction(&mut self) -> Result<CommitReport> {
        self.manager.require_step(&self.context, FlowStep::Cart, "confirm_transaction")?;
        if self.context.cart.is_empty() {
            return Err(GearError::InvalidInput("Add at least one item to proceed.".to_string()));
        }

        match self.guard.revalidate(&self.studio).await {
            Ok(current) => self.studio = current,
            Err(e) => {
                self.context.set_message(e.user_message());
                return Err(e);
            }
        }

        self.manager.transition(&mut self.context, FlowStep::Processing)?;
        let mode = self.context.mode;
        let items = self.context.cart.clone();
        let mut transactions = Vec::with_capacity(items.len());

        for item in items {
            let mut saga = Saga::new(self.store.as_ref(), Some(self.photos.as_ref()));
            match self.commit_item(&item, &mut saga).await {
                Ok(transaction) => {
                    saga.finish();
                    log_transaction(
                        self.studio.studio_id,
                        self.studio.user_id,
                        transaction.kind.as_str(),
                        transaction.equipment_id,
                        transaction.quantity,
                    );
                    self.context.unstage(item.unit_id());
                    transactions.push(transaction);
                }
                Err(e) => {
                    let compensation_failures = saga.compensate().await;
                    error!(
                        unit_id = %item.unit_id(),
                        committed = transactions.len(),
                        compensation_failures,
                        error = %e,
                        "Commit failed"
                    );
                    let failure = GearError::CommitFailed {
                        committed: transactions.len(),
                        compensation_failures,
                        source: Box::new(e),
                    };
                    self.context.set_message(failure.user_message());
                    self.manager.transition(&mut self.context, FlowStep::Cart)?;
                    return Err(failure);
                }
            }
        }

        self.context.clear_message();
        self.manager.transition(&mut self.context, FlowStep::Success)?;
        info!(count = transactions.len(), "Cart committed");
        Ok(CommitReport { mode, transactions })
    }

    async fn commit_item(&self, item: &CartItem, saga: &mut Saga<'_>) -> Result<Transaction> {
        let mode = self.context.mode;

        saga.transition_unit(item.unit_id(), item.observed_status, mode.target_status(), conflict_message(mode))
            .await?;
        saga.adjust_available(item.equipment.id, mode.availability_delta(1), capacity_message(mode))
            .await?;

        let photo_url = match &item.photo {
            Some(photo) => {
                let path = format!(
                    "{}/{}/{}.{}",
                    self.studio.studio_id,
                    item.unit_id(),
                    epoch_millis(),
                    extension_for_content_type(&photo.content_type)
                );
                Some(saga.upload_photo(&self.options.transaction_bucket, &path, photo).await?)
            }
            None => None,
        };

        saga.record_transaction(CreateTransactionRequest {
            studio_id: self.studio.studio_id,
            equipment_id: item.equipment.id,
            equipment_item_id: Some(item.unit_id()),
            user_id: self.studio.user_id,
            kind: mode.transaction_type(),
            quantity: 1,
            photo_url,
            notes: None,
            approval_status: self.options.approval_workflow.then_some(ApprovalStatus::Pending),
        })
        .await
    }

    /// Back to an empty scan step, keeping the mode
    pub fn start_over(&mut self) -> Result<()> {
        if self.context.step == FlowStep::Success {
            self.manager.transition(&mut self.context, FlowStep::Scan)?;
        }
        self.context.reset();
        Ok(())
    }
}
