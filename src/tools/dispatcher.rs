//! Answer tool calls with the registered tools.

use std::panic::AssertUnwindSafe;
use std::sync::Arc;

use futures::future;
use futures::FutureExt;
use tracing::{debug, warn};

use super::arguments::ToolArguments;
use super::registry::ToolRegistry;
use super::tool::ToolExecutionContext;
use super::validation::validate_arguments;
use crate::types::{ToolCall, ToolOutput};

pub const UNKNOWN_TOOL: &str = "unknown tool";

/// `{"success": false, "error": ...}`, the payload every failed call gets.
pub fn failure(error: impl Into<String>) -> serde_json::Value {
    serde_json::json!({ "success": false, "error": error.into() })
}

/// Routes tool calls to tools and always produces an output.
///
/// A run stalls until every pending call is answered, so unknown tools,
/// malformed arguments, tool errors and panics all become failure payloads.
#[derive(Debug, Clone)]
pub struct ToolDispatcher {
    registry: Arc<ToolRegistry>,
}

impl ToolDispatcher {
    pub fn new(registry: Arc<ToolRegistry>) -> Self {
        Self { registry }
    }

    pub fn registry(&self) -> &ToolRegistry {
        &self.registry
    }

    /// Answer one call. The output's id always matches the call's.
    pub async fn dispatch(&self, call: &ToolCall) -> ToolOutput {
        let result = self.invoke(call).await;
        ToolOutput::from_value(call.id.clone(), &result)
    }

    /// Answer every call concurrently; outputs keep the calls' order.
    pub async fn dispatch_all(&self, calls: &[ToolCall]) -> Vec<ToolOutput> {
        future::join_all(calls.iter().map(|call| self.dispatch(call))).await
    }

    async fn invoke(&self, call: &ToolCall) -> serde_json::Value {
        let Some(tool) = self.registry.get(&call.name) else {
            warn!(tool = %call.name, call_id = %call.id, "agent requested an unregistered tool");
            return failure(UNKNOWN_TOOL);
        };

        if let Err(reason) = validate_arguments(&call.arguments, &tool.parameters().schema) {
            warn!(tool = %call.name, call_id = %call.id, %reason, "rejected tool arguments");
            return failure(format!("invalid arguments: {reason}"));
        }

        let args = ToolArguments::new(call.arguments.clone());
        let ctx = ToolExecutionContext {
            tool_call_id: call.id.clone(),
        };

        debug!(tool = %call.name, call_id = %call.id, "executing tool");
        match AssertUnwindSafe(tool.execute(&args, &ctx)).catch_unwind().await {
            Ok(Ok(value)) => value,
            Ok(Err(err)) => {
                warn!(tool = %call.name, call_id = %call.id, error = %err, "tool failed");
                failure(err.to_string())
            }
            Err(_) => {
                warn!(tool = %call.name, call_id = %call.id, "tool panicked");
                failure("tool panicked")
            }
        }
    }
}
