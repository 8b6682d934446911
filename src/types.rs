//! Core request/response types shared across the gateway pipeline.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Resolved caller identity and tenancy scope.
///
/// Created once per inbound request by the authentication collaborator and
/// treated as trusted. Immutable for the lifetime of the request; never
/// persisted as an entity, only embedded in derived records.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RequestContext {
    pub user_id: Uuid,
    pub domain_id: Option<Uuid>,
    pub tenant_id: Option<Uuid>,
    pub session_id: String,
    pub ip_address: Option<String>,
    pub user_agent: Option<String>,
    pub request_id: Uuid,
}

impl RequestContext {
    pub fn new(user_id: Uuid, session_id: impl Into<String>) -> Self {
        Self {
            user_id,
            domain_id: None,
            tenant_id: None,
            session_id: session_id.into(),
            ip_address: None,
            user_agent: None,
            request_id: Uuid::new_v4(),
        }
    }

    pub fn with_domain(mut self, domain_id: Uuid) -> Self {
        self.domain_id = Some(domain_id);
        self
    }

    pub fn with_tenant(mut self, tenant_id: Uuid) -> Self {
        self.tenant_id = Some(tenant_id);
        self
    }

    pub fn with_ip_address(mut self, ip: impl Into<String>) -> Self {
        self.ip_address = Some(ip.into());
        self
    }

    pub fn with_user_agent(mut self, agent: impl Into<String>) -> Self {
        self.user_agent = Some(agent.into());
        self
    }

    /// The isolation unit for rate limits, caches, and budgets.
    pub fn scope(&self) -> ScopeKey {
        ScopeKey {
            user_id: self.user_id,
            domain_id: self.domain_id,
            tenant_id: self.tenant_id,
        }
    }
}

/// Deterministic (user, domain, tenant) composite key.
///
/// Two requests with different scope keys must never observe each other's
/// rate windows, cache entries, or budget ledgers.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ScopeKey {
    pub user_id: Uuid,
    pub domain_id: Option<Uuid>,
    pub tenant_id: Option<Uuid>,
}

impl ScopeKey {
    pub fn user(user_id: Uuid) -> Self {
        Self {
            user_id,
            domain_id: None,
            tenant_id: None,
        }
    }
}

impl std::fmt::Display for ScopeKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        fn part(id: Option<Uuid>) -> String {
            id.map(|u| u.to_string()).unwrap_or_else(|| "-".into())
        }
        write!(
            f,
            "user:{}/domain:{}/tenant:{}",
            self.user_id,
            part(self.domain_id),
            part(self.tenant_id)
        )
    }
}

/// AI capability exposed by the gateway.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Operation {
    /// Generate a new script/artifact from a natural-language description.
    Generate,
    /// Improve an existing artifact.
    Enhance,
    /// Convert an artifact between formats or platforms.
    Convert,
    /// Analyze network/agent/compliance data.
    Analyze,
}

impl Operation {
    pub fn endpoint(&self) -> &'static str {
        match self {
            Operation::Generate => "generate",
            Operation::Enhance => "enhance",
            Operation::Convert => "convert",
            Operation::Analyze => "analyze",
        }
    }

    pub fn all() -> &'static [Operation] {
        &[
            Operation::Generate,
            Operation::Enhance,
            Operation::Convert,
            Operation::Analyze,
        ]
    }
}

impl std::fmt::Display for Operation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.endpoint())
    }
}

/// Token usage reported by the model provider.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Usage {
    pub input_tokens: u64,
    pub output_tokens: u64,
}

impl Usage {
    pub fn new(input_tokens: u64, output_tokens: u64) -> Self {
        Self {
            input_tokens,
            output_tokens,
        }
    }

    #[inline]
    pub fn total(&self) -> u64 {
        self.input_tokens.saturating_add(self.output_tokens)
    }

    pub fn add(&mut self, other: &Usage) {
        self.input_tokens = self.input_tokens.saturating_add(other.input_tokens);
        self.output_tokens = self.output_tokens.saturating_add(other.output_tokens);
    }
}

/// Result of one gateway operation, returned to the route layer.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GatewayResponse {
    pub data: String,
    pub metadata: ResponseMetadata,
    pub audit: AuditSummary,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ResponseMetadata {
    pub request_id: Uuid,
    pub processing_time_ms: u64,
    pub tokens_used: u64,
    pub cost: Decimal,
    pub cached: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub confidence: Option<f64>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuditSummary {
    pub user_id: Uuid,
    pub timestamp: DateTime<Utc>,
    pub endpoint: String,
    pub success: bool,
}
