//! Mock hosted backend built on wiremock

use serde_json::{json, Value};
use uuid::Uuid;
use wiremock::MockServer;

use studio_gear::config::BackendConfig;
use studio_gear::database::{BackendClient, DataService};

pub const TEST_ANON_KEY: &str = "test-anon-key";

pub struct BackendMock {
    pub server: MockServer,
}

impl BackendMock {
    pub async fn start() -> Self {
        Self {
            server: MockServer::start().await,
        }
    }

    pub fn config(&self) -> BackendConfig {
        BackendConfig {
            url: self.server.uri(),
            anon_key: TEST_ANON_KEY.to_string(),
            timeout_seconds: 5,
        }
    }

    pub fn client(&self) -> BackendClient {
        BackendClient::new(&self.config()).expect("mock backend client")
    }

    pub fn data(&self) -> DataService {
        DataService::new(self.client())
    }
}

/// An `equipment` row as the REST API returns it
pub fn equipment_row(id: Uuid, studio_id: Uuid, total: i32, available: i32) -> Value {
    json!({
        "id": id,
        "studio_id": studio_id,
        "name": "Camera",
        "category": "video",
        "sku": null,
        "total_quantity": total,
        "available_quantity": available,
        "metadata": null,
        "photo_url": null,
        "notes": null,
        "created_at": "2024-03-01T10:00:00Z",
        "updated_at": null
    })
}

/// An `equipment_items` row, optionally with the embedded template
pub fn unit_row(id: Uuid, equipment_id: Uuid, studio_id: Uuid, code: &str, status: &str) -> Value {
    json!({
        "id": id,
        "equipment_id": equipment_id,
        "studio_id": studio_id,
        "code": code,
        "code_type": "qr",
        "status": status,
        "photo_url": null,
        "created_at": "2024-03-01T10:00:00Z"
    })
}
