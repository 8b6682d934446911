//! # model-gateway
//!
//! Multi-tenant request gateway for hosted LLM APIs.
//!
//! Every AI call an endpoint-management backend makes flows through one
//! [`RequestGateway`], which enforces per-scope rate ceilings and daily
//! spend budgets, memoizes identical work, filters unsafe input, enriches
//! prompts with organizational context, and records an audit trail on every
//! exit path. The HTTP route layer, relational storage, and authentication
//! are collaborators behind traits.
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use std::sync::Arc;
//! use model_gateway::{
//!     GatewayConfig, HttpModelInvoker, MemoryStorage, RequestContext, RequestGateway,
//! };
//!
//! #[tokio::main]
//! async fn main() -> Result<(), model_gateway::Error> {
//!     let invoker = Arc::new(HttpModelInvoker::from_env()?);
//!     let storage = Arc::new(MemoryStorage::new());
//!     let gateway = RequestGateway::new(GatewayConfig::from_env(), invoker, storage);
//!
//!     let ctx = RequestContext::new(uuid::Uuid::new_v4(), "session-1");
//!     let response = gateway
//!         .generate(&ctx, "script to report agents offline for 24h")
//!         .await?;
//!     println!("{} (cached: {})", response.data, response.metadata.cached);
//!     Ok(())
//! }
//! ```

#![deny(rustdoc::broken_intra_doc_links)]

pub mod audit;
pub mod cache;
pub mod config;
pub mod cost;
pub mod enrich;
pub mod gateway;
pub mod invoker;
pub mod observability;
pub mod prelude;
pub mod ratelimit;
pub mod safety;
pub mod storage;
pub mod types;

// Re-exports for convenience
pub use audit::{AuditLogger, UsageRecord};
pub use cache::{CachedResponse, ResponseCache, fingerprint};
pub use config::GatewayConfig;
pub use cost::{
    BudgetStatus, CostAccountant, ModelPricing, PricingTable, PricingTableBuilder,
    global_pricing_table,
};
pub use enrich::ContextEnricher;
pub use gateway::RequestGateway;
pub use invoker::{HttpModelInvoker, ModelInvoker, ModelRequest, ModelResponse};
pub use observability::{Counter, GatewayMetrics, MetricsSnapshot};
pub use ratelimit::{RateLimiter, RateWindow};
pub use safety::{ContentSafetyFilter, ContentViolation};
pub use storage::{
    DomainRecord, GeneratedArtifact, MemoryStorage, PolicyRecord, Storage, StorageError,
    TenantRecord,
};
pub use types::{
    AuditSummary, GatewayResponse, Operation, RequestContext, ResponseMetadata, ScopeKey, Usage,
};

use rust_decimal::Decimal;

/// Error type for gateway operations.
///
/// Every terminal outcome is audited before it reaches the caller, and each
/// variant maps to a stable HTTP-equivalent status for the route layer.
#[derive(Debug, thiserror::Error)]
#[non_exhaustive]
pub enum Error {
    /// Scope exhausted its admission window.
    #[error("rate limit exceeded: {limit} requests per {window_minutes} minutes")]
    RateLimitExceeded { limit: u32, window_minutes: i64 },

    /// Scope reached its daily spend ceiling.
    #[error("daily budget exceeded: ${spent} spent (ceiling: ${budget})")]
    BudgetExceeded { spent: Decimal, budget: Decimal },

    /// Input matched the content safety filter.
    #[error(transparent)]
    ContentRejected(#[from] safety::ContentViolation),

    /// The model provider failed the request.
    #[error("model invocation failed (HTTP {status}): {message}", status = status.map(|s| s.to_string()).unwrap_or_else(|| "unknown".into()))]
    ModelInvocation {
        message: String,
        status: Option<u16>,
    },

    /// Model invocation exceeded its timeout.
    #[error("model invocation timed out after {:.1}s", .0.as_secs_f64())]
    Timeout(std::time::Duration),

    /// The primary artifact write failed.
    ///
    /// Audit and cache persistence failures are swallowed; only the
    /// user-visible artifact write surfaces here.
    #[error("failed to persist artifact: {0}")]
    Persistence(String),

    /// Network connectivity or request failed.
    #[error("network request failed: {0}")]
    Network(#[from] reqwest::Error),

    /// JSON serialization or deserialization failed.
    #[error("JSON parsing failed: {0}")]
    Json(#[from] serde_json::Error),

    /// Invalid or missing configuration.
    #[error("configuration error: {0}")]
    Config(String),

    /// Storage collaborator failed a load-bearing query.
    #[error("storage error: {0}")]
    Storage(#[from] storage::StorageError),
}

/// Error category for unified handling at the route layer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCategory {
    /// Caller hit a resource ceiling (rate or budget); retry later.
    ResourceLimit,
    /// Caller's input was rejected; retrying unchanged will not help.
    InvalidInput,
    /// The upstream model failed; may succeed on retry.
    Upstream,
    /// Internal failures (storage, configuration, serialization).
    Internal,
}

impl Error {
    pub fn category(&self) -> ErrorCategory {
        match self {
            Error::RateLimitExceeded { .. } | Error::BudgetExceeded { .. } => {
                ErrorCategory::ResourceLimit
            }
            Error::ContentRejected(_) => ErrorCategory::InvalidInput,
            Error::ModelInvocation { .. } | Error::Timeout(_) | Error::Network(_) => {
                ErrorCategory::Upstream
            }
            Error::Persistence(_) | Error::Json(_) | Error::Config(_) | Error::Storage(_) => {
                ErrorCategory::Internal
            }
        }
    }

    /// HTTP-equivalent status for the route layer.
    pub fn http_status(&self) -> u16 {
        match self {
            Error::RateLimitExceeded { .. } | Error::BudgetExceeded { .. } => 429,
            Error::ContentRejected(_) => 400,
            Error::ModelInvocation { .. } | Error::Network(_) => 502,
            Error::Timeout(_) => 504,
            Error::Persistence(_) | Error::Json(_) | Error::Config(_) | Error::Storage(_) => 500,
        }
    }

    pub fn is_retryable(&self) -> bool {
        matches!(self.category(), ErrorCategory::Upstream)
    }
}

pub type Result<T> = std::result::Result<T, Error>;
