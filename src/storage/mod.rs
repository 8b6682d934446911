//! Storage collaborator interface.
//!
//! Durable persistence lives outside the gateway. This module defines the
//! seam the gateway calls through, plus an in-memory implementation used by
//! tests and local development. No transactions span the gateway and this
//! collaborator: artifact, audit, and cache writes are independent.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::audit::UsageRecord;
use crate::types::{Operation, ScopeKey};

mod memory;

pub use memory::MemoryStorage;

#[derive(Debug, thiserror::Error)]
pub enum StorageError {
    #[error("storage backend error: {0}")]
    Backend(String),
}

pub type StorageResult<T> = std::result::Result<T, StorageError>;

/// Organizational domain as persisted by the endpoint-management backend.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DomainRecord {
    pub id: Uuid,
    pub name: String,
    pub enabled_features: Vec<String>,
    /// Per-domain override of the global daily AI budget.
    pub daily_ai_budget: Option<Decimal>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TenantRecord {
    pub id: Uuid,
    pub name: String,
    /// Per-tenant override; takes precedence over the domain override.
    pub daily_ai_budget: Option<Decimal>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PolicyRecord {
    pub id: Uuid,
    pub name: String,
    pub category: String,
    pub description: String,
    pub active: bool,
}

/// Model output persisted as a user-visible artifact.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GeneratedArtifact {
    pub id: Uuid,
    pub request_id: Uuid,
    pub user_id: Uuid,
    pub domain_id: Option<Uuid>,
    pub tenant_id: Option<Uuid>,
    pub operation: Operation,
    pub prompt: String,
    pub output: String,
    pub model: String,
    pub created_at: DateTime<Utc>,
}

/// Interface to the relational storage collaborator.
#[async_trait]
pub trait Storage: Send + Sync {
    async fn domain_by_id(&self, id: Uuid) -> StorageResult<Option<DomainRecord>>;

    async fn tenant_by_id(&self, id: Uuid) -> StorageResult<Option<TenantRecord>>;

    /// Active policies in a category, most relevant first.
    async fn active_policies(&self, category: &str) -> StorageResult<Vec<PolicyRecord>>;

    async fn persist_artifact(&self, artifact: GeneratedArtifact) -> StorageResult<()>;

    async fn persist_usage_record(&self, record: UsageRecord) -> StorageResult<()>;

    /// Sum of recorded cost for a scope within the current UTC calendar day.
    ///
    /// Recomputed per call so budget checks never act on a stale ledger.
    async fn sum_cost_for_scope_today(&self, scope: &ScopeKey) -> StorageResult<Decimal>;
}
