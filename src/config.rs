//! Gateway deployment configuration.

use std::env;
use std::time::Duration;

use rust_decimal::Decimal;
use rust_decimal_macros::dec;

/// Per-deployment knobs for the gateway pipeline.
#[derive(Clone, Debug)]
pub struct GatewayConfig {
    /// Model identifier sent to the invoker.
    pub model: String,
    /// Output cap per model call.
    pub max_tokens: u32,
    /// Global default daily budget ceiling per scope, USD.
    pub max_daily_cost: Decimal,
    /// Admitted requests per scope per window.
    pub rate_limit_requests: u32,
    pub rate_limit_window_minutes: i64,
    pub cache_ttl_minutes: i64,
    pub content_filtering_enabled: bool,
    pub audit_logging_enabled: bool,
    /// Upper bound on one model invocation, including network time.
    pub request_timeout: Duration,
    /// Upper bound on best-effort side calls (enrichment, audit writes).
    pub side_call_timeout: Duration,
}

impl Default for GatewayConfig {
    fn default() -> Self {
        Self {
            model: "claude-sonnet-4-5".to_string(),
            max_tokens: 4096,
            max_daily_cost: dec!(10.0),
            rate_limit_requests: 100,
            rate_limit_window_minutes: 60,
            cache_ttl_minutes: 15,
            content_filtering_enabled: true,
            audit_logging_enabled: true,
            request_timeout: Duration::from_secs(120),
            side_call_timeout: Duration::from_secs(5),
        }
    }
}

impl GatewayConfig {
    pub fn new() -> Self {
        Self::default()
    }

    /// Apply `MODEL_GATEWAY_*` environment overrides on top of defaults.
    pub fn from_env() -> Self {
        let mut config = Self::default();

        if let Ok(model) = env::var("MODEL_GATEWAY_MODEL") {
            config.model = model;
        }
        if let Some(v) = parse_env("MODEL_GATEWAY_MAX_DAILY_COST") {
            config.max_daily_cost = v;
        }
        if let Some(v) = parse_env("MODEL_GATEWAY_RATE_LIMIT_REQUESTS") {
            config.rate_limit_requests = v;
        }
        if let Some(v) = parse_env("MODEL_GATEWAY_RATE_LIMIT_WINDOW_MINUTES") {
            config.rate_limit_window_minutes = v;
        }
        if let Some(v) = parse_env("MODEL_GATEWAY_CACHE_TTL_MINUTES") {
            config.cache_ttl_minutes = v;
        }
        if let Some(v) = parse_env("MODEL_GATEWAY_CONTENT_FILTERING") {
            config.content_filtering_enabled = v;
        }
        if let Some(v) = parse_env("MODEL_GATEWAY_AUDIT_LOGGING") {
            config.audit_logging_enabled = v;
        }
        if let Some(secs) = parse_env::<u64>("MODEL_GATEWAY_REQUEST_TIMEOUT_SECS") {
            config.request_timeout = Duration::from_secs(secs);
        }

        config
    }

    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.model = model.into();
        self
    }

    pub fn with_max_daily_cost(mut self, cost: Decimal) -> Self {
        self.max_daily_cost = cost;
        self
    }

    pub fn with_rate_limit(mut self, requests: u32, window_minutes: i64) -> Self {
        self.rate_limit_requests = requests;
        self.rate_limit_window_minutes = window_minutes;
        self
    }

    pub fn with_cache_ttl_minutes(mut self, minutes: i64) -> Self {
        self.cache_ttl_minutes = minutes;
        self
    }

    pub fn with_content_filtering(mut self, enabled: bool) -> Self {
        self.content_filtering_enabled = enabled;
        self
    }

    pub fn with_audit_logging(mut self, enabled: bool) -> Self {
        self.audit_logging_enabled = enabled;
        self
    }

    pub fn with_request_timeout(mut self, timeout: Duration) -> Self {
        self.request_timeout = timeout;
        self
    }

    pub fn with_side_call_timeout(mut self, timeout: Duration) -> Self {
        self.side_call_timeout = timeout;
        self
    }
}

fn parse_env<T: std::str::FromStr>(key: &str) -> Option<T> {
    env::var(key).ok()?.parse().ok()
}
