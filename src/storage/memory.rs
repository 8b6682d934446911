//! In-memory storage for tests and local development.

use std::sync::Mutex;
use std::sync::atomic::{AtomicBool, Ordering};

use async_trait::async_trait;
use chrono::Utc;
use dashmap::DashMap;
use rust_decimal::Decimal;
use uuid::Uuid;

use super::{
    DomainRecord, GeneratedArtifact, PolicyRecord, Storage, StorageError, StorageResult,
    TenantRecord,
};
use crate::audit::UsageRecord;
use crate::types::ScopeKey;

/// Non-durable [`Storage`] backed by process memory.
///
/// Write-failure injection is available for exercising the gateway's
/// degraded paths.
#[derive(Default)]
pub struct MemoryStorage {
    domains: DashMap<Uuid, DomainRecord>,
    tenants: DashMap<Uuid, TenantRecord>,
    policies: Mutex<Vec<PolicyRecord>>,
    artifacts: DashMap<Uuid, GeneratedArtifact>,
    usage: Mutex<Vec<UsageRecord>>,
    fail_usage_writes: AtomicBool,
    fail_artifact_writes: AtomicBool,
    fail_reads: AtomicBool,
}

impl MemoryStorage {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert_domain(&self, domain: DomainRecord) {
        self.domains.insert(domain.id, domain);
    }

    pub fn insert_tenant(&self, tenant: TenantRecord) {
        self.tenants.insert(tenant.id, tenant);
    }

    pub fn insert_policy(&self, policy: PolicyRecord) {
        self.policies.lock().unwrap_or_else(std::sync::PoisonError::into_inner).push(policy);
    }

    pub fn usage_records(&self) -> Vec<UsageRecord> {
        self.usage.lock().unwrap_or_else(std::sync::PoisonError::into_inner).clone()
    }

    pub fn artifacts(&self) -> Vec<GeneratedArtifact> {
        self.artifacts.iter().map(|e| e.value().clone()).collect()
    }

    pub fn fail_usage_writes(&self, fail: bool) {
        self.fail_usage_writes.store(fail, Ordering::SeqCst);
    }

    pub fn fail_artifact_writes(&self, fail: bool) {
        self.fail_artifact_writes.store(fail, Ordering::SeqCst);
    }

    /// Make all read queries fail, for exercising best-effort paths.
    pub fn fail_reads(&self, fail: bool) {
        self.fail_reads.store(fail, Ordering::SeqCst);
    }

    fn check_reads(&self) -> StorageResult<()> {
        if self.fail_reads.load(Ordering::SeqCst) {
            Err(StorageError::Backend("injected read failure".into()))
        } else {
            Ok(())
        }
    }
}

#[async_trait]
impl Storage for MemoryStorage {
    async fn domain_by_id(&self, id: Uuid) -> StorageResult<Option<DomainRecord>> {
        self.check_reads()?;
        Ok(self.domains.get(&id).map(|d| d.clone()))
    }

    async fn tenant_by_id(&self, id: Uuid) -> StorageResult<Option<TenantRecord>> {
        self.check_reads()?;
        Ok(self.tenants.get(&id).map(|t| t.clone()))
    }

    async fn active_policies(&self, category: &str) -> StorageResult<Vec<PolicyRecord>> {
        self.check_reads()?;
        Ok(self
            .policies
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner)
            .iter()
            .filter(|p| p.active && p.category == category)
            .cloned()
            .collect())
    }

    async fn persist_artifact(&self, artifact: GeneratedArtifact) -> StorageResult<()> {
        if self.fail_artifact_writes.load(Ordering::SeqCst) {
            return Err(StorageError::Backend("injected artifact failure".into()));
        }
        self.artifacts.insert(artifact.id, artifact);
        Ok(())
    }

    async fn persist_usage_record(&self, record: UsageRecord) -> StorageResult<()> {
        if self.fail_usage_writes.load(Ordering::SeqCst) {
            return Err(StorageError::Backend("injected usage failure".into()));
        }
        self.usage.lock().unwrap_or_else(std::sync::PoisonError::into_inner).push(record);
        Ok(())
    }

    async fn sum_cost_for_scope_today(&self, scope: &ScopeKey) -> StorageResult<Decimal> {
        self.check_reads()?;
        let today = Utc::now().date_naive();
        Ok(self
            .usage
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner)
            .iter()
            .filter(|r| r.scope() == *scope && r.created_at.date_naive() == today)
            .map(|r| r.cost)
            .sum())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{RequestContext, Usage};
    use chrono::Duration;
    use rust_decimal_macros::dec;

    fn usage_record(context: &RequestContext, cost: Decimal) -> UsageRecord {
        UsageRecord::new(context, "generate", true, Usage::new(10, 5), cost, 100, 200, None)
    }

    #[tokio::test]
    async fn test_ledger_sums_only_today_and_scope() {
        let storage = MemoryStorage::new();
        let context = RequestContext::new(Uuid::new_v4(), "s-1");
        let other = RequestContext::new(Uuid::new_v4(), "s-2");

        storage
            .persist_usage_record(usage_record(&context, dec!(1.25)))
            .await
            .unwrap();
        storage
            .persist_usage_record(usage_record(&context, dec!(0.75)))
            .await
            .unwrap();
        storage
            .persist_usage_record(usage_record(&other, dec!(9.99)))
            .await
            .unwrap();

        let mut stale = usage_record(&context, dec!(100));
        stale.created_at = Utc::now() - Duration::days(1);
        storage.persist_usage_record(stale).await.unwrap();

        let spent = storage
            .sum_cost_for_scope_today(&context.scope())
            .await
            .unwrap();
        assert_eq!(spent, dec!(2.00));
    }

    #[tokio::test]
    async fn test_policy_filter() {
        let storage = MemoryStorage::new();
        storage.insert_policy(PolicyRecord {
            id: Uuid::new_v4(),
            name: "Block external exfiltration".into(),
            category: "security".into(),
            description: "Deny outbound transfers to unapproved hosts".into(),
            active: true,
        });
        storage.insert_policy(PolicyRecord {
            id: Uuid::new_v4(),
            name: "Legacy patching cadence".into(),
            category: "maintenance".into(),
            description: "Weekly".into(),
            active: true,
        });
        storage.insert_policy(PolicyRecord {
            id: Uuid::new_v4(),
            name: "Retired rule".into(),
            category: "security".into(),
            description: "Old".into(),
            active: false,
        });

        let policies = storage.active_policies("security").await.unwrap();
        assert_eq!(policies.len(), 1);
        assert_eq!(policies[0].name, "Block external exfiltration");
    }
}
