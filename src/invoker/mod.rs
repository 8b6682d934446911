//! Model invocation seam.
//!
//! The gateway treats "call the model" as an opaque capability behind the
//! [`ModelInvoker`] trait. [`HttpModelInvoker`] is the default implementation
//! against a hosted messages API; tests substitute their own.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::Result;
use crate::types::Usage;

mod http;

pub use http::HttpModelInvoker;

/// Structured request handed to the model provider.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ModelRequest {
    pub model: String,
    pub prompt: String,
    /// Organizational context appended by the enricher, if any.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub context: Option<String>,
    pub max_tokens: u32,
}

impl ModelRequest {
    pub fn new(model: impl Into<String>, prompt: impl Into<String>, max_tokens: u32) -> Self {
        Self {
            model: model.into(),
            prompt: prompt.into(),
            context: None,
            max_tokens,
        }
    }

    pub fn with_context(mut self, context: impl Into<String>) -> Self {
        let context = context.into();
        if !context.is_empty() {
            self.context = Some(context);
        }
        self
    }
}

/// Structured model output.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ModelResponse {
    pub text: String,
    pub usage: Usage,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub confidence: Option<f64>,
}

/// Opaque capability: dispatch one request, return output or fail.
///
/// No retries happen behind this seam; a failure surfaces immediately and
/// retry policy belongs to the caller.
#[async_trait]
pub trait ModelInvoker: Send + Sync {
    async fn invoke(&self, request: ModelRequest) -> Result<ModelResponse>;
}
