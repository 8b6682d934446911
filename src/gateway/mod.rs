//! Request orchestration.
//!
//! One pipeline per operation kind: admission control, cache lookup, budget
//! gate, content filter, enrichment, model dispatch, then cache/artifact
//! writes. Every execution produces exactly one audit record, on every exit
//! path, and no retries happen inside the gateway.

use std::sync::Arc;
use std::time::Instant;

use rust_decimal::Decimal;
use uuid::Uuid;

use crate::audit::{AuditLogger, UsageRecord};
use crate::cache::{CachedResponse, ResponseCache, fingerprint};
use crate::config::GatewayConfig;
use crate::cost::{BudgetStatus, CostAccountant, PricingTable};
use crate::enrich::ContextEnricher;
use crate::invoker::{ModelInvoker, ModelRequest};
use crate::observability::{GatewayMetrics, MetricsSnapshot};
use crate::ratelimit::{RateLimiter, RateWindow};
use crate::safety::ContentSafetyFilter;
use crate::storage::{GeneratedArtifact, Storage};
use crate::types::{
    AuditSummary, GatewayResponse, Operation, RequestContext, ResponseMetadata, ScopeKey, Usage,
};
use crate::{Error, Result};

/// Internal result of one pipeline run, before audit/response assembly.
struct PipelineSuccess {
    data: String,
    usage: Usage,
    cost: Decimal,
    cached: bool,
    confidence: Option<f64>,
}

/// Failed pipeline run, with whatever spend was actually incurred.
///
/// A failure after model dispatch (the artifact write) still burned real
/// tokens; that usage must reach the audit ledger or the scope's daily spend
/// would under-count.
struct PipelineFailure {
    error: Error,
    usage: Usage,
    cost: Decimal,
}

impl From<Error> for PipelineFailure {
    fn from(error: Error) -> Self {
        Self {
            error,
            usage: Usage::default(),
            cost: Decimal::ZERO,
        }
    }
}

/// The multi-tenant AI request gateway.
///
/// Shared across concurrent request handlers; all mutable state lives in
/// concurrency-safe structures, and pipelines never serialize against each
/// other.
pub struct RequestGateway {
    config: GatewayConfig,
    rate_limiter: RateLimiter,
    cache: ResponseCache,
    accountant: CostAccountant,
    filter: ContentSafetyFilter,
    enricher: ContextEnricher,
    audit: AuditLogger,
    metrics: GatewayMetrics,
    invoker: Arc<dyn ModelInvoker>,
    storage: Arc<dyn Storage>,
}

impl RequestGateway {
    pub fn new(
        config: GatewayConfig,
        invoker: Arc<dyn ModelInvoker>,
        storage: Arc<dyn Storage>,
    ) -> Self {
        Self::with_pricing(config, invoker, storage, PricingTable::default())
    }

    pub fn with_pricing(
        config: GatewayConfig,
        invoker: Arc<dyn ModelInvoker>,
        storage: Arc<dyn Storage>,
        pricing: PricingTable,
    ) -> Self {
        let accountant = CostAccountant::new(pricing, storage.clone(), config.max_daily_cost);
        let enricher = ContextEnricher::new(storage.clone(), config.side_call_timeout);
        let audit = AuditLogger::new(
            storage.clone(),
            config.audit_logging_enabled,
            config.side_call_timeout,
        );

        Self {
            config,
            rate_limiter: RateLimiter::new(),
            cache: ResponseCache::new(),
            accountant,
            filter: ContentSafetyFilter::new(),
            enricher,
            audit,
            metrics: GatewayMetrics::new(),
            invoker,
            storage,
        }
    }

    pub async fn generate(&self, ctx: &RequestContext, prompt: &str) -> Result<GatewayResponse> {
        self.execute(ctx, Operation::Generate, prompt).await
    }

    pub async fn enhance(&self, ctx: &RequestContext, prompt: &str) -> Result<GatewayResponse> {
        self.execute(ctx, Operation::Enhance, prompt).await
    }

    pub async fn convert(&self, ctx: &RequestContext, prompt: &str) -> Result<GatewayResponse> {
        self.execute(ctx, Operation::Convert, prompt).await
    }

    pub async fn analyze(&self, ctx: &RequestContext, prompt: &str) -> Result<GatewayResponse> {
        self.execute(ctx, Operation::Analyze, prompt).await
    }

    /// Run the full pipeline for one operation.
    pub async fn execute(
        &self,
        ctx: &RequestContext,
        operation: Operation,
        prompt: &str,
    ) -> Result<GatewayResponse> {
        let started = Instant::now();
        self.metrics.requests_total.inc();

        let outcome = self.run_pipeline(ctx, operation, prompt).await;
        let latency_ms = started.elapsed().as_millis() as u64;
        self.metrics.latency_ms_total.add(latency_ms);

        match outcome {
            Ok(success) => {
                self.metrics.requests_success.inc();
                if success.cached {
                    self.metrics.cache_hits.inc();
                }
                self.metrics
                    .record_tokens(success.usage.input_tokens, success.usage.output_tokens);
                self.metrics.record_cost(success.cost);

                self.audit
                    .record(UsageRecord::new(
                        ctx,
                        operation.endpoint(),
                        true,
                        success.usage,
                        success.cost,
                        latency_ms,
                        200,
                        None,
                    ))
                    .await;

                Ok(GatewayResponse {
                    data: success.data,
                    metadata: ResponseMetadata {
                        request_id: ctx.request_id,
                        processing_time_ms: latency_ms,
                        tokens_used: success.usage.total(),
                        cost: success.cost,
                        cached: success.cached,
                        confidence: success.confidence,
                    },
                    audit: AuditSummary {
                        user_id: ctx.user_id,
                        timestamp: chrono::Utc::now(),
                        endpoint: operation.endpoint().to_string(),
                        success: true,
                    },
                })
            }
            Err(failure) => {
                let PipelineFailure { error: err, usage, cost } = failure;

                self.metrics.requests_error.inc();
                match &err {
                    Error::RateLimitExceeded { .. } => self.metrics.rate_limited.inc(),
                    Error::BudgetExceeded { .. } => self.metrics.budget_rejected.inc(),
                    Error::ContentRejected(_) => self.metrics.content_rejected.inc(),
                    Error::ModelInvocation { .. } | Error::Timeout(_) | Error::Network(_) => {
                        self.metrics.model_failures.inc()
                    }
                    _ => {}
                }
                // Spend incurred before the failure still counts.
                self.metrics.record_tokens(usage.input_tokens, usage.output_tokens);
                self.metrics.record_cost(cost);

                tracing::warn!(
                    request_id = %ctx.request_id,
                    endpoint = operation.endpoint(),
                    error = %err,
                    latency_ms,
                    "Gateway pipeline failed"
                );

                self.audit
                    .record(UsageRecord::new(
                        ctx,
                        operation.endpoint(),
                        false,
                        usage,
                        cost,
                        latency_ms,
                        err.http_status(),
                        Some(err.to_string()),
                    ))
                    .await;

                Err(err)
            }
        }
    }

    async fn run_pipeline(
        &self,
        ctx: &RequestContext,
        operation: Operation,
        prompt: &str,
    ) -> std::result::Result<PipelineSuccess, PipelineFailure> {
        let scope = ctx.scope();

        if !self.rate_limiter.admit(
            &scope,
            self.config.rate_limit_requests,
            self.config.rate_limit_window_minutes,
        ) {
            return Err(Error::RateLimitExceeded {
                limit: self.config.rate_limit_requests,
                window_minutes: self.config.rate_limit_window_minutes,
            }
            .into());
        }

        let payload = serde_json::json!({ "prompt": prompt });
        let key = fingerprint(&scope, operation.endpoint(), &payload);

        if let Some(hit) = self.cache.get(&key) {
            tracing::debug!(
                request_id = %ctx.request_id,
                endpoint = operation.endpoint(),
                "Serving response from cache"
            );
            return Ok(PipelineSuccess {
                data: hit.data,
                usage: Usage::default(),
                cost: Decimal::ZERO,
                cached: true,
                confidence: hit.confidence,
            });
        }

        self.accountant.enforce_budget(&scope).await?;

        if self.config.content_filtering_enabled {
            self.filter.scan(prompt).map_err(Error::from)?;
        }

        let context = self.enricher.enrich(ctx.domain_id, ctx.tenant_id).await;

        let request = ModelRequest::new(&self.config.model, prompt, self.config.max_tokens)
            .with_context(context);
        let response = tokio::time::timeout(self.config.request_timeout, self.invoker.invoke(request))
            .await
            .map_err(|_| Error::Timeout(self.config.request_timeout))??;

        let cost = self.accountant.actual_cost(&self.config.model, &response.usage);

        self.cache.set(
            key,
            CachedResponse {
                data: response.text.clone(),
                confidence: response.confidence,
            },
            self.config.cache_ttl_minutes,
        );

        let artifact = GeneratedArtifact {
            id: Uuid::new_v4(),
            request_id: ctx.request_id,
            user_id: ctx.user_id,
            domain_id: ctx.domain_id,
            tenant_id: ctx.tenant_id,
            operation,
            prompt: prompt.to_string(),
            output: response.text.clone(),
            model: self.config.model.clone(),
            created_at: chrono::Utc::now(),
        };
        // The artifact is user-visible data: unlike audit/cache writes, a
        // failure here is surfaced. The model already ran, so the real
        // usage and cost travel with the error into the audit record.
        if let Err(e) = self.storage.persist_artifact(artifact).await {
            return Err(PipelineFailure {
                error: Error::Persistence(e.to_string()),
                usage: response.usage,
                cost,
            });
        }

        Ok(PipelineSuccess {
            data: response.text,
            usage: response.usage,
            cost,
            cached: false,
            confidence: response.confidence,
        })
    }

    pub fn config(&self) -> &GatewayConfig {
        &self.config
    }

    pub fn metrics(&self) -> MetricsSnapshot {
        self.metrics.snapshot()
    }

    /// Current budget position for a scope.
    pub async fn budget_status(&self, scope: &ScopeKey) -> Result<BudgetStatus> {
        self.accountant.check_budget(scope).await
    }

    /// Pre-dispatch token/cost estimate for a prompt against the configured
    /// model, for caller-side preview before committing to a request.
    pub fn estimate(&self, prompt: &str) -> (u64, Decimal) {
        self.accountant.estimate(&self.config.model, prompt)
    }

    /// Current rate window for a scope, if one exists.
    pub fn rate_window(&self, scope: &ScopeKey) -> Option<RateWindow> {
        self.rate_limiter.window(scope)
    }

    /// Administrative full cache flush.
    pub fn clear_cache(&self) {
        self.cache.clear();
    }

    pub fn cached_entries(&self) -> usize {
        self.cache.len()
    }
}
