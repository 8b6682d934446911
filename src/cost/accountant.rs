//! Daily budget enforcement per scope.

use std::sync::Arc;

use rust_decimal::Decimal;

use super::estimator;
use super::pricing::PricingTable;
use crate::storage::Storage;
use crate::types::{ScopeKey, Usage};
use crate::{Error, Result};

#[derive(Debug, Clone)]
pub enum BudgetStatus {
    WithinBudget {
        spent: Decimal,
        budget: Decimal,
        remaining: Decimal,
    },
    Exceeded {
        spent: Decimal,
        budget: Decimal,
    },
}

impl BudgetStatus {
    pub fn is_exceeded(&self) -> bool {
        matches!(self, Self::Exceeded { .. })
    }

    pub fn spent(&self) -> Decimal {
        match self {
            Self::WithinBudget { spent, .. } | Self::Exceeded { spent, .. } => *spent,
        }
    }
}

/// Token/cost estimation and budget ceilings.
#[derive(Clone)]
pub struct CostAccountant {
    pricing: PricingTable,
    storage: Arc<dyn Storage>,
    default_daily_budget: Decimal,
}

impl CostAccountant {
    pub fn new(pricing: PricingTable, storage: Arc<dyn Storage>, default_daily_budget: Decimal) -> Self {
        Self {
            pricing,
            storage,
            default_daily_budget,
        }
    }

    pub fn pricing(&self) -> &PricingTable {
        &self.pricing
    }

    /// Budget ceiling for a scope: tenant override, then domain override,
    /// then the deployment default.
    pub async fn daily_budget(&self, scope: &ScopeKey) -> Result<Decimal> {
        if let Some(tenant_id) = scope.tenant_id
            && let Some(tenant) = self.storage.tenant_by_id(tenant_id).await?
            && let Some(budget) = tenant.daily_ai_budget
        {
            return Ok(budget);
        }

        if let Some(domain_id) = scope.domain_id
            && let Some(domain) = self.storage.domain_by_id(domain_id).await?
            && let Some(budget) = domain.daily_ai_budget
        {
            return Ok(budget);
        }

        Ok(self.default_daily_budget)
    }

    /// Cumulative recorded cost for the scope today. Recomputed from the
    /// ledger on every call; never cached, so the check cannot act on stale
    /// totals.
    pub async fn spent_today(&self, scope: &ScopeKey) -> Result<Decimal> {
        Ok(self.storage.sum_cost_for_scope_today(scope).await?)
    }

    /// Advisory pre-dispatch budget check.
    ///
    /// Check-then-spend is not serialized per scope: concurrent requests may
    /// both pass before either's cost lands in the ledger, permitting a
    /// transient overrun bounded by the requests in flight. Accepted trade-off
    /// against holding a lock across storage and model round-trips.
    pub async fn check_budget(&self, scope: &ScopeKey) -> Result<BudgetStatus> {
        let budget = self.daily_budget(scope).await?;
        let spent = self.spent_today(scope).await?;

        if spent >= budget {
            Ok(BudgetStatus::Exceeded { spent, budget })
        } else {
            Ok(BudgetStatus::WithinBudget {
                spent,
                budget,
                remaining: budget - spent,
            })
        }
    }

    /// Reject unless the scope is under its ceiling.
    pub async fn enforce_budget(&self, scope: &ScopeKey) -> Result<()> {
        match self.check_budget(scope).await? {
            BudgetStatus::Exceeded { spent, budget } => {
                Err(Error::BudgetExceeded { spent, budget })
            }
            BudgetStatus::WithinBudget { .. } => Ok(()),
        }
    }

    /// Heuristic pre-dispatch estimate: token count and projected cost under
    /// the assumed input/output split.
    pub fn estimate(&self, model: &str, payload: &str) -> (u64, Decimal) {
        let usage = estimator::estimate_usage(payload);
        (usage.total(), self.pricing.calculate(model, &usage))
    }

    /// Post-dispatch cost from provider-reported usage.
    pub fn actual_cost(&self, model: &str, usage: &Usage) -> Decimal {
        self.pricing.calculate(model, usage)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::audit::UsageRecord;
    use crate::cost::pricing::PricingTableBuilder;
    use crate::storage::{DomainRecord, MemoryStorage, TenantRecord};
    use crate::types::RequestContext;
    use rust_decimal_macros::dec;
    use uuid::Uuid;

    fn accountant(storage: Arc<MemoryStorage>) -> CostAccountant {
        CostAccountant::new(
            PricingTableBuilder::new().with_defaults().build(),
            storage,
            dec!(10.0),
        )
    }

    #[tokio::test]
    async fn test_budget_resolution_order() {
        let storage = Arc::new(MemoryStorage::new());
        let domain_id = Uuid::new_v4();
        let tenant_id = Uuid::new_v4();

        storage.insert_domain(DomainRecord {
            id: domain_id,
            name: "acme".into(),
            enabled_features: vec![],
            daily_ai_budget: Some(dec!(25.0)),
        });
        storage.insert_tenant(TenantRecord {
            id: tenant_id,
            name: "acme-eu".into(),
            daily_ai_budget: Some(dec!(5.0)),
        });

        let accountant = accountant(storage);
        let user = Uuid::new_v4();

        // Tenant override wins over domain override.
        let scope = RequestContext::new(user, "s")
            .with_domain(domain_id)
            .with_tenant(tenant_id)
            .scope();
        assert_eq!(accountant.daily_budget(&scope).await.unwrap(), dec!(5.0));

        // Domain override when no tenant.
        let scope = RequestContext::new(user, "s").with_domain(domain_id).scope();
        assert_eq!(accountant.daily_budget(&scope).await.unwrap(), dec!(25.0));

        // Global default otherwise.
        let scope = ScopeKey::user(user);
        assert_eq!(accountant.daily_budget(&scope).await.unwrap(), dec!(10.0));
    }

    #[tokio::test]
    async fn test_budget_exceeded_at_ceiling() {
        let storage = Arc::new(MemoryStorage::new());
        let accountant = accountant(storage.clone());
        let context = RequestContext::new(Uuid::new_v4(), "s");

        let record = UsageRecord::new(
            &context,
            "generate",
            true,
            Usage::new(100, 50),
            dec!(10.01),
            120,
            200,
            None,
        );
        storage.persist_usage_record(record).await.unwrap();

        let status = accountant.check_budget(&context.scope()).await.unwrap();
        assert!(status.is_exceeded());
        assert!(accountant.enforce_budget(&context.scope()).await.is_err());
    }

    #[tokio::test]
    async fn test_within_budget() {
        let storage = Arc::new(MemoryStorage::new());
        let accountant = accountant(storage);
        let scope = ScopeKey::user(Uuid::new_v4());

        let status = accountant.check_budget(&scope).await.unwrap();
        assert!(!status.is_exceeded());
        assert_eq!(status.spent(), Decimal::ZERO);
    }

    #[test]
    fn test_estimate_uses_split() {
        let storage = Arc::new(MemoryStorage::new());
        let accountant = accountant(storage);

        // 4000 chars -> 1000 tokens -> 700 in / 300 out on sonnet:
        // 0.0007 * 3 + 0.0003 * 15 = $0.0066
        let payload = "x".repeat(4000);
        let (tokens, cost) = accountant.estimate("sonnet", &payload);
        assert_eq!(tokens, 1000);
        assert_eq!(cost, dec!(0.0066));
    }
}
