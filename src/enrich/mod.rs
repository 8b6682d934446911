//! Organizational context enrichment.
//!
//! Pulls display names, enabled features, and the leading security policies
//! from the storage collaborator and condenses them into a short context
//! string appended to the outbound prompt. Strictly best-effort: any lookup
//! failure or timeout yields an empty string, never a pipeline abort.

use std::sync::Arc;
use std::time::Duration;

use uuid::Uuid;

use crate::storage::Storage;

const MAX_POLICIES: usize = 3;
const POLICY_CATEGORY: &str = "security";

#[derive(Clone)]
pub struct ContextEnricher {
    storage: Arc<dyn Storage>,
    timeout: Duration,
}

impl ContextEnricher {
    pub fn new(storage: Arc<dyn Storage>, timeout: Duration) -> Self {
        Self { storage, timeout }
    }

    /// Assemble the context string for a request's tenancy.
    ///
    /// Never fails; enrichment is not load-bearing for correctness.
    pub async fn enrich(&self, domain_id: Option<Uuid>, tenant_id: Option<Uuid>) -> String {
        match tokio::time::timeout(self.timeout, self.build(domain_id, tenant_id)).await {
            Ok(context) => context,
            Err(_) => {
                tracing::debug!(
                    timeout_ms = self.timeout.as_millis() as u64,
                    "Context enrichment timed out, continuing without it"
                );
                String::new()
            }
        }
    }

    async fn build(&self, domain_id: Option<Uuid>, tenant_id: Option<Uuid>) -> String {
        let mut parts = Vec::new();

        if let Some(id) = domain_id {
            match self.storage.domain_by_id(id).await {
                Ok(Some(domain)) => {
                    parts.push(format!("Organization: {}.", domain.name));
                    if !domain.enabled_features.is_empty() {
                        parts.push(format!(
                            "Enabled features: {}.",
                            domain.enabled_features.join(", ")
                        ));
                    }
                }
                Ok(None) => {}
                Err(e) => {
                    tracing::debug!(domain_id = %id, error = %e, "Domain lookup failed during enrichment");
                    return String::new();
                }
            }
        }

        if let Some(id) = tenant_id {
            match self.storage.tenant_by_id(id).await {
                Ok(Some(tenant)) => parts.push(format!("Tenant: {}.", tenant.name)),
                Ok(None) => {}
                Err(e) => {
                    tracing::debug!(tenant_id = %id, error = %e, "Tenant lookup failed during enrichment");
                    return String::new();
                }
            }
        }

        match self.storage.active_policies(POLICY_CATEGORY).await {
            Ok(policies) if !policies.is_empty() => {
                let summary: Vec<String> = policies
                    .iter()
                    .take(MAX_POLICIES)
                    .map(|p| p.name.clone())
                    .collect();
                parts.push(format!("Active security policies: {}.", summary.join("; ")));
            }
            Ok(_) => {}
            Err(e) => {
                tracing::debug!(error = %e, "Policy lookup failed during enrichment");
                return String::new();
            }
        }

        parts.join(" ")
    }
}
