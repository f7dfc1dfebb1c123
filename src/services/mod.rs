//! Services module
//!
//! This module contains business logic services

pub mod auth;
pub mod checkout;
pub mod export;
pub mod inventory;
pub mod labels;
pub mod members;
pub mod quick_scan;
pub mod resolver;
pub mod saga;
pub mod scanner;
pub mod session;
pub mod studio;

// Re-export commonly used services
pub use auth::{AccessClaims, AuthService};
pub use checkout::{CheckoutFlow, CheckoutOptions, CommitReport};
pub use export::{BulkExporter, LabelArchive, LabelSelection, LabelSize, LabelSpec, LabelStyle, PngLabelRasterizer};
pub use inventory::{CreatedEquipment, EquipmentDetail, InventoryService, NewEquipment};
pub use members::{MemberRoster, MembersService};
pub use quick_scan::{ScanStation, StationTarget};
pub use resolver::{CodeResolver, Resolved};
pub use scanner::{CameraDevice, CodeScanner, Facing, Frame, LineCamera, ScanDebouncer, ScannerState};
pub use session::{ContextGuard, SessionService, StudioContext};
pub use studio::{Dashboard, StudioService};

use std::sync::Arc;

use crate::config::settings::Settings;
use crate::database::{BackendClient, DataService, InventoryStore, PhotoStorage};
use crate::state::SessionStorage;
use crate::utils::errors::Result;

/// Service factory for creating and managing all services
#[derive(Clone)]
pub struct ServiceFactory {
    pub settings: Settings,
    pub data: DataService,
    pub auth_service: AuthService,
    pub session_service: SessionService,
    pub inventory_service: InventoryService,
    pub members_service: MembersService,
    pub studio_service: StudioService,
    guard: ContextGuard,
}

impl ServiceFactory {
    /// Create a new ServiceFactory with all services initialized
    pub fn new(settings: Settings) -> Result<Self> {
        let client = BackendClient::new(&settings.backend)?;
        let storage = SessionStorage::new(&settings.session.state_dir);
        Ok(Self::with_parts(settings, client, storage))
    }

    /// Build from an existing client and session storage
    pub fn with_parts(settings: Settings, client: BackendClient, storage: SessionStorage) -> Self {
        let data = DataService::new(client.clone());
        let store: Arc<dyn InventoryStore> = Arc::new(data.clone());
        let guard = ContextGuard::new(store, Some(storage.clone()));

        let auth_service = AuthService::new(client, settings.auth.clone(), storage.clone());
        let session_service = SessionService::new(auth_service.clone(), storage, guard.clone());
        let inventory_service = InventoryService::new(
            data.clone(),
            guard.clone(),
            settings.storage.equipment_photos_bucket.clone(),
        );
        let members_service = MembersService::new(data.clone(), guard.clone());
        let studio_service = StudioService::new(data.clone(), guard.clone());

        Self {
            settings,
            data,
            auth_service,
            session_service,
            inventory_service,
            members_service,
            studio_service,
            guard,
        }
    }

    /// Cart flow for a validated studio context
    pub fn checkout_flow(&self, context: StudioContext) -> CheckoutFlow {
        let store: Arc<dyn InventoryStore> = Arc::new(self.data.clone());
        let photos: Arc<dyn PhotoStorage> = Arc::new(self.data.clone());
        CheckoutFlow::new(
            store,
            photos,
            self.guard.clone(),
            context,
            CheckoutOptions::from_settings(&self.settings),
        )
    }

    /// Quick-scan station for a validated studio context
    pub fn scan_station(&self, context: StudioContext) -> ScanStation {
        let store: Arc<dyn InventoryStore> = Arc::new(self.data.clone());
        ScanStation::new(
            store,
            self.guard.clone(),
            context,
            self.settings.features.approval_workflow,
        )
    }

    /// Label rasterizer from the `labels` section, with optional overrides
    pub fn label_rasterizer(&self, style: Option<&str>, size: Option<&str>) -> Result<PngLabelRasterizer> {
        let labels = &self.settings.labels;
        let style: LabelStyle = style.unwrap_or(&labels.style).parse()?;
        let size: LabelSize = size.unwrap_or(&labels.size).parse()?;
        Ok(PngLabelRasterizer::new(style, size, labels.scale))
    }
}
