//! Gateway metrics.
//!
//! Local atomic counters only; snapshots are cheap and lock-free. Export to
//! an external metrics system belongs to the embedding service.

use std::sync::atomic::{AtomicU64, Ordering};

use rust_decimal::Decimal;

/// Scale factor for storing Decimal costs as AtomicU64 (6 decimal places).
const COST_SCALE_FACTOR: u64 = 1_000_000;

/// Thread-safe atomic counter.
#[derive(Debug, Default)]
pub struct Counter {
    value: AtomicU64,
}

impl Counter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn inc(&self) {
        self.value.fetch_add(1, Ordering::Relaxed);
    }

    pub fn add(&self, n: u64) {
        self.value.fetch_add(n, Ordering::Relaxed);
    }

    pub fn get(&self) -> u64 {
        self.value.load(Ordering::Relaxed)
    }
}

/// Counters for every pipeline outcome the gateway can produce.
#[derive(Debug, Default)]
pub struct GatewayMetrics {
    pub requests_total: Counter,
    pub requests_success: Counter,
    pub requests_error: Counter,
    pub cache_hits: Counter,
    pub rate_limited: Counter,
    pub budget_rejected: Counter,
    pub content_rejected: Counter,
    pub model_failures: Counter,
    pub tokens_input: Counter,
    pub tokens_output: Counter,
    pub latency_ms_total: Counter,
    cost_total_micros: Counter,
}

impl GatewayMetrics {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record_tokens(&self, input: u64, output: u64) {
        self.tokens_input.add(input);
        self.tokens_output.add(output);
    }

    pub fn record_cost(&self, cost_usd: Decimal) {
        let micros = (cost_usd * Decimal::from(COST_SCALE_FACTOR))
            .try_into()
            .unwrap_or(0u64);
        self.cost_total_micros.add(micros);
    }

    pub fn total_cost_usd(&self) -> Decimal {
        Decimal::from(self.cost_total_micros.get()) / Decimal::from(COST_SCALE_FACTOR)
    }

    pub fn snapshot(&self) -> MetricsSnapshot {
        let total = self.requests_total.get();
        let avg_latency_ms = if total > 0 {
            self.latency_ms_total.get() as f64 / total as f64
        } else {
            0.0
        };

        MetricsSnapshot {
            requests_total: total,
            requests_success: self.requests_success.get(),
            requests_error: self.requests_error.get(),
            cache_hits: self.cache_hits.get(),
            rate_limited: self.rate_limited.get(),
            budget_rejected: self.budget_rejected.get(),
            content_rejected: self.content_rejected.get(),
            model_failures: self.model_failures.get(),
            tokens_input: self.tokens_input.get(),
            tokens_output: self.tokens_output.get(),
            total_cost_usd: self.total_cost_usd(),
            avg_latency_ms,
        }
    }
}

/// Point-in-time view for export/display.
#[derive(Debug, Clone, Default)]
pub struct MetricsSnapshot {
    pub requests_total: u64,
    pub requests_success: u64,
    pub requests_error: u64,
    pub cache_hits: u64,
    pub rate_limited: u64,
    pub budget_rejected: u64,
    pub content_rejected: u64,
    pub model_failures: u64,
    pub tokens_input: u64,
    pub tokens_output: u64,
    pub total_cost_usd: Decimal,
    pub avg_latency_ms: f64,
}
