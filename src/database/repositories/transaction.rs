//! Transaction log repository implementation

use serde_json::json;
use uuid::Uuid;

use super::studio::first_row;
use crate::database::connection::{BackendClient, Query};
use crate::models::transaction::{
    ApprovalStatus, CreateTransactionRequest, Transaction, TransactionRecord, TransactionType,
};
use crate::utils::errors::Result;

const TABLE: &str = "transactions";
const WITH_NAME: &str = "*,equipment(name)";

/// Filters for the studio activity log
#[derive(Debug, Clone, Default)]
pub struct ActivityFilter {
    pub kind: Option<TransactionType>,
    /// Restrict to a single user's transactions
    pub user_id: Option<Uuid>,
    pub limit: usize,
}

#[derive(Debug, Clone)]
pub struct TransactionRepository {
    client: BackendClient,
}

impl TransactionRepository {
    pub fn new(client: BackendClient) -> Self {
        Self { client }
    }

    /// Append a transaction
    pub async fn create(&self, request: CreateTransactionRequest) -> Result<Transaction> {
        let rows: Vec<Transaction> = self.client.insert(TABLE, &request).await?;
        first_row(rows, TABLE)
    }

    pub async fn delete(&self, id: Uuid) -> Result<()> {
        self.client.delete(TABLE, &Query::new().eq("id", id)).await
    }

    /// Latest transactions of a studio, newest first
    pub async fn list_for_studio(&self, studio_id: Uuid, filter: &ActivityFilter) -> Result<Vec<TransactionRecord>> {
        let mut query = Query::new().select(WITH_NAME).eq("studio_id", studio_id);
        if let Some(kind) = filter.kind {
            query = query.eq("type", kind);
        }
        if let Some(user_id) = filter.user_id {
            query = query.eq("user_id", user_id);
        }
        let limit = if filter.limit == 0 { 50 } else { filter.limit };
        self.client
            .select(TABLE, &query.order("created_at", false).limit(limit))
            .await
    }

    /// Latest transactions made by one user across studios
    pub async fn list_for_user(&self, user_id: Uuid, limit: usize) -> Result<Vec<TransactionRecord>> {
        self.client
            .select(
                TABLE,
                &Query::new()
                    .select(WITH_NAME)
                    .eq("user_id", user_id)
                    .order("created_at", false)
                    .limit(limit),
            )
            .await
    }

    /// Latest transactions across several studios
    pub async fn list_for_studios(&self, studio_ids: &[Uuid], limit: usize) -> Result<Vec<TransactionRecord>> {
        if studio_ids.is_empty() {
            return Ok(Vec::new());
        }
        self.client
            .select(
                TABLE,
                &Query::new()
                    .select(WITH_NAME)
                    .in_list("studio_id", studio_ids)
                    .order("created_at", false)
                    .limit(limit),
            )
            .await
    }

    pub async fn list_for_equipment(&self, equipment_id: Uuid, limit: usize) -> Result<Vec<Transaction>> {
        self.client
            .select(
                TABLE,
                &Query::new()
                    .select("*")
                    .eq("equipment_id", equipment_id)
                    .order("created_at", false)
                    .limit(limit),
            )
            .await
    }

    /// Decide a pending transaction. Returns `None` when it is not pending.
    pub async fn set_approval(&self, studio_id: Uuid, id: Uuid, status: ApprovalStatus) -> Result<Option<Transaction>> {
        let rows: Vec<Transaction> = self
            .client
            .update(
                TABLE,
                &Query::new()
                    .eq("id", id)
                    .eq("studio_id", studio_id)
                    .eq("approval_status", "pending"),
                &json!({ "approval_status": status }),
            )
            .await?;
        Ok(rows.into_iter().next())
    }
}
