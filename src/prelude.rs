//! Convenience re-exports for embedding the gateway.
//!
//! ```rust
//! use model_gateway::prelude::*;
//! ```

pub use crate::config::GatewayConfig;
pub use crate::gateway::RequestGateway;
pub use crate::invoker::{HttpModelInvoker, ModelInvoker, ModelRequest, ModelResponse};
pub use crate::storage::{MemoryStorage, Storage};
pub use crate::types::{GatewayResponse, Operation, RequestContext, ScopeKey, Usage};
pub use crate::{Error, ErrorCategory, Result};
