//! Usage auditing.
//!
//! Every pipeline execution produces exactly one [`UsageRecord`], on every
//! exit path: cache hit, rejection, success, or failure. Persistence goes
//! through the storage collaborator and is best-effort; a failed or slow
//! audit write must never fail the primary request.

use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::storage::Storage;
use crate::types::{RequestContext, ScopeKey, Usage};

/// Append-only record of one gateway pipeline execution.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UsageRecord {
    pub id: Uuid,
    pub user_id: Uuid,
    pub domain_id: Option<Uuid>,
    pub tenant_id: Option<Uuid>,
    pub session_id: String,
    pub ip_address: Option<String>,
    pub user_agent: Option<String>,
    pub endpoint: String,
    pub request_id: Uuid,
    pub success: bool,
    pub tokens_in: u64,
    pub tokens_out: u64,
    pub cost: Decimal,
    pub latency_ms: u64,
    pub http_status: u16,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error_message: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl UsageRecord {
    pub fn new(
        context: &RequestContext,
        endpoint: impl Into<String>,
        success: bool,
        usage: Usage,
        cost: Decimal,
        latency_ms: u64,
        http_status: u16,
        error_message: Option<String>,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            user_id: context.user_id,
            domain_id: context.domain_id,
            tenant_id: context.tenant_id,
            session_id: context.session_id.clone(),
            ip_address: context.ip_address.clone(),
            user_agent: context.user_agent.clone(),
            endpoint: endpoint.into(),
            request_id: context.request_id,
            success,
            tokens_in: usage.input_tokens,
            tokens_out: usage.output_tokens,
            cost,
            latency_ms,
            http_status,
            error_message,
            created_at: Utc::now(),
        }
    }

    pub fn scope(&self) -> ScopeKey {
        ScopeKey {
            user_id: self.user_id,
            domain_id: self.domain_id,
            tenant_id: self.tenant_id,
        }
    }
}

/// Best-effort persister of usage records.
#[derive(Clone)]
pub struct AuditLogger {
    storage: Arc<dyn Storage>,
    enabled: bool,
    timeout: Duration,
}

impl AuditLogger {
    pub fn new(storage: Arc<dyn Storage>, enabled: bool, timeout: Duration) -> Self {
        Self {
            storage,
            enabled,
            timeout,
        }
    }

    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    /// Persist a usage record, swallowing any failure.
    ///
    /// Failures are reported to process diagnostics only; the caller's
    /// response path is unaffected.
    pub async fn record(&self, record: UsageRecord) {
        if !self.enabled {
            return;
        }

        let request_id = record.request_id;
        let endpoint = record.endpoint.clone();

        match tokio::time::timeout(self.timeout, self.storage.persist_usage_record(record)).await {
            Ok(Ok(())) => {}
            Ok(Err(e)) => {
                tracing::warn!(
                    request_id = %request_id,
                    endpoint = %endpoint,
                    error = %e,
                    "Failed to persist usage record"
                );
            }
            Err(_) => {
                tracing::warn!(
                    request_id = %request_id,
                    endpoint = %endpoint,
                    timeout_ms = self.timeout.as_millis() as u64,
                    "Usage record persistence timed out"
                );
            }
        }
    }
}
