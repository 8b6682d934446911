//! HTTP-backed model invoker.

use std::time::Duration;

use secrecy::{ExposeSecret, SecretString};
use serde::Deserialize;

use super::{ModelInvoker, ModelRequest, ModelResponse};
use crate::types::Usage;
use crate::{Error, Result};

const DEFAULT_TIMEOUT: Duration = Duration::from_secs(120);
const MESSAGES_ENDPOINT: &str = "/v1/messages";
const API_VERSION: &str = "2023-06-01";

/// Invoker dispatching to a hosted messages API over HTTPS.
pub struct HttpModelInvoker {
    http: reqwest::Client,
    base_url: String,
    api_key: SecretString,
}

impl HttpModelInvoker {
    pub fn new(base_url: impl Into<String>, api_key: SecretString) -> Result<Self> {
        let http = reqwest::Client::builder()
            .timeout(DEFAULT_TIMEOUT)
            .build()
            .map_err(Error::Network)?;

        Ok(Self {
            http,
            base_url: base_url.into().trim_end_matches('/').to_string(),
            api_key,
        })
    }

    /// Build from `MODEL_GATEWAY_BASE_URL` and `MODEL_GATEWAY_API_KEY`.
    pub fn from_env() -> Result<Self> {
        let base_url = std::env::var("MODEL_GATEWAY_BASE_URL")
            .unwrap_or_else(|_| "https://api.anthropic.com".to_string());
        let api_key = std::env::var("MODEL_GATEWAY_API_KEY")
            .map_err(|_| Error::Config("MODEL_GATEWAY_API_KEY is not set".into()))?;

        Self::new(base_url, SecretString::from(api_key))
    }

    pub fn with_http(mut self, http: reqwest::Client) -> Self {
        self.http = http;
        self
    }

    fn build_body(request: &ModelRequest) -> serde_json::Value {
        let mut body = serde_json::json!({
            "model": request.model,
            "max_tokens": request.max_tokens,
            "messages": [{"role": "user", "content": request.prompt}],
        });
        if let Some(ref context) = request.context {
            body["system"] = serde_json::Value::String(context.clone());
        }
        body
    }
}

#[derive(Debug, Deserialize)]
struct WireResponse {
    content: Vec<WireContent>,
    usage: WireUsage,
    #[serde(default)]
    confidence: Option<f64>,
}

#[derive(Debug, Deserialize)]
struct WireContent {
    #[serde(default)]
    text: String,
}

#[derive(Debug, Deserialize)]
struct WireUsage {
    input_tokens: u64,
    output_tokens: u64,
}

#[derive(Debug, Deserialize)]
struct WireError {
    #[serde(default)]
    error: WireErrorBody,
}

#[derive(Debug, Default, Deserialize)]
struct WireErrorBody {
    #[serde(default)]
    message: String,
}

#[async_trait::async_trait]
impl ModelInvoker for HttpModelInvoker {
    async fn invoke(&self, request: ModelRequest) -> Result<ModelResponse> {
        let url = format!("{}{}", self.base_url, MESSAGES_ENDPOINT);
        let body = Self::build_body(&request);

        let response = self
            .http
            .post(&url)
            .header("x-api-key", self.api_key.expose_secret())
            .header("anthropic-version", API_VERSION)
            .header("content-type", "application/json")
            .json(&body)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let message = match response.json::<WireError>().await {
                Ok(err) if !err.error.message.is_empty() => err.error.message,
                _ => format!("provider returned HTTP {}", status.as_u16()),
            };
            return Err(Error::ModelInvocation {
                message,
                status: Some(status.as_u16()),
            });
        }

        let wire: WireResponse = response.json().await?;
        let text = wire
            .content
            .into_iter()
            .map(|c| c.text)
            .collect::<Vec<_>>()
            .join("");

        Ok(ModelResponse {
            text,
            usage: Usage::new(wire.usage.input_tokens, wire.usage.output_tokens),
            confidence: wire.confidence,
        })
    }
}
