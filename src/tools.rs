//! Tool registry and dispatch
//!
//! The registry holds the fixed catalog of capability contracts the model
//! may call; implementations live with the embedding application and own
//! their own collaborator handles. Dispatch fails closed: whatever a
//! collaborator does (unknown name, bad input, error, panic, hang), the
//! loop receives a JSON value, never an exception.

use crate::conversation::{AgentContext, UserRole};
use crate::llm::ToolDefinition;
use async_trait::async_trait;
use futures::FutureExt;
use serde_json::{json, Value};
use std::panic::AssertUnwindSafe;
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;
use tokio_util::sync::CancellationToken;

const DEFAULT_CALL_TIMEOUT: Duration = Duration::from_secs(30);

/// Per-call context injected into every tool invocation.
///
/// Tools are stateless with respect to the conversation: caller identity
/// arrives here, and long-running work should watch `cancel`.
#[derive(Debug, Clone)]
pub struct ToolContext {
    pub cancel: CancellationToken,
    pub user_id: Option<String>,
    pub is_authenticated: bool,
    pub user_role: UserRole,
}

impl ToolContext {
    pub fn for_call(context: &AgentContext, cancel: CancellationToken) -> Self {
        Self {
            cancel,
            user_id: context.user_id.clone(),
            is_authenticated: context.is_authenticated,
            user_role: context.user_role,
        }
    }
}

/// Collaborator failure, carried as data back to the model
#[derive(Debug, Error)]
#[error("{message}")]
pub struct ToolError {
    pub message: String,
}

impl ToolError {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

/// A capability the model can request by name
#[async_trait]
pub trait Tool: Send + Sync {
    /// Unique tool name
    fn name(&self) -> &str;

    /// Tool description for the model
    fn description(&self) -> String;

    /// JSON schema for tool input
    fn input_schema(&self) -> Value;

    /// Whether this tool assembles a booking draft whose output the loop
    /// must surface to the caller as the pending side effect
    fn captures_booking_draft(&self) -> bool {
        false
    }

    /// Execute the tool. Errors are expected and become structured data;
    /// they never abort the conversation.
    async fn run(&self, input: Value, ctx: ToolContext) -> Result<Value, ToolError>;
}

/// Registry construction failure
#[derive(Debug, Error)]
pub enum RegistryError {
    #[error("duplicate tool name: {0}")]
    DuplicateName(String),
}

/// Load-time-fixed catalog of capabilities, injected by reference and
/// never mutated at runtime.
pub struct ToolRegistry {
    tools: Vec<Arc<dyn Tool>>,
    call_timeout: Duration,
}

impl ToolRegistry {
    /// Build a registry, rejecting duplicate names up front so dispatch
    /// by exact match stays unambiguous.
    pub fn new(tools: Vec<Arc<dyn Tool>>) -> Result<Self, RegistryError> {
        let mut seen = std::collections::HashSet::new();
        for tool in &tools {
            if !seen.insert(tool.name().to_string()) {
                return Err(RegistryError::DuplicateName(tool.name().to_string()));
            }
        }
        Ok(Self {
            tools,
            call_timeout: DEFAULT_CALL_TIMEOUT,
        })
    }

    /// Registry with no capabilities; the model can only converse.
    pub fn empty() -> Self {
        Self {
            tools: Vec::new(),
            call_timeout: DEFAULT_CALL_TIMEOUT,
        }
    }

    pub fn with_call_timeout(mut self, timeout: Duration) -> Self {
        self.call_timeout = timeout;
        self
    }

    pub fn is_empty(&self) -> bool {
        self.tools.is_empty()
    }

    /// Get all tool definitions for the model
    pub fn definitions(&self) -> Vec<ToolDefinition> {
        self.tools
            .iter()
            .map(|t| ToolDefinition {
                name: t.name().to_string(),
                description: t.description(),
                input_schema: t.input_schema(),
            })
            .collect()
    }

    /// Whether the named tool produces the booking-draft side effect
    pub fn captures_booking_draft(&self, name: &str) -> bool {
        self.get(name).is_some_and(|t| t.captures_booking_draft())
    }

    fn get(&self, name: &str) -> Option<&Arc<dyn Tool>> {
        self.tools.iter().find(|t| t.name() == name)
    }

    /// Dispatch a model-requested call. Always resolves to a JSON value:
    /// success payloads pass through, and every failure mode (unknown
    /// name, malformed input, collaborator error, panic, timeout,
    /// cancellation) is converted to `{"error": ...}` at this boundary.
    pub async fn invoke(&self, name: &str, input: Value, ctx: ToolContext) -> Value {
        let Some(tool) = self.get(name) else {
            tracing::warn!(tool = name, "dispatch to unknown tool");
            return json!({ "error": format!("Unknown tool: {name}") });
        };

        if let Err(reason) = validate_input(&tool.input_schema(), &input) {
            tracing::warn!(tool = name, reason = %reason, "rejected tool input");
            return json!({ "error": format!("Invalid input for {name}: {reason}") });
        }

        let start = std::time::Instant::now();
        let cancel = ctx.cancel.clone();
        let guarded = AssertUnwindSafe(tool.run(input, ctx)).catch_unwind();

        let result = tokio::select! {
            () = cancel.cancelled() => {
                json!({ "error": format!("Tool {name} was cancelled") })
            }
            outcome = tokio::time::timeout(self.call_timeout, guarded) => match outcome {
                Err(_) => {
                    json!({ "error": format!("Tool {name} timed out") })
                }
                Ok(Err(_panic)) => {
                    tracing::error!(tool = name, "tool implementation panicked");
                    json!({ "error": format!("Tool {name} failed internally") })
                }
                Ok(Ok(Err(e))) => json!({ "error": e.to_string() }),
                Ok(Ok(Ok(value))) => value,
            },
        };

        tracing::debug!(
            tool = name,
            duration_ms = %start.elapsed().as_millis(),
            error = result.get("error").is_some(),
            "tool dispatched"
        );
        result
    }
}

/// Structural validation against the declared schema: the input must be a
/// JSON object carrying every `required` property. Malformed requests are
/// rejected before any collaborator sees them.
fn validate_input(schema: &Value, input: &Value) -> Result<(), String> {
    let Some(obj) = input.as_object() else {
        return Err("expected a JSON object".to_string());
    };
    if let Some(required) = schema.get("required").and_then(|r| r.as_array()) {
        for field in required.iter().filter_map(|f| f.as_str()) {
            if !obj.contains_key(field) {
                return Err(format!("missing required field `{field}`"));
            }
        }
    }
    Ok(())
}
