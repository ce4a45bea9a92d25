//! Mock implementations for loop tests
//!
//! A scripted inference service and canned tools, so the loop can be
//! driven without real I/O.

use crate::llm::{ChatRequest, ChatResponse, InferenceError, InferenceService};
use crate::tools::{Tool, ToolContext, ToolError};
use async_trait::async_trait;
use serde_json::{json, Value};
use std::collections::VecDeque;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;
use std::time::Duration;

/// Inference service that replays queued responses and records every
/// request it sees.
pub struct ScriptedInference {
    responses: Mutex<VecDeque<Result<ChatResponse, InferenceError>>>,
    requests: Mutex<Vec<ChatRequest>>,
    delay: Option<Duration>,
}

impl ScriptedInference {
    pub fn new() -> Self {
        Self {
            responses: Mutex::new(VecDeque::new()),
            requests: Mutex::new(Vec::new()),
            delay: None,
        }
    }

    /// Delay every completion, for timeout and cancellation tests
    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    pub fn queue_response(&self, response: ChatResponse) {
        self.responses.lock().unwrap().push_back(Ok(response));
    }

    pub fn queue_error(&self, error: InferenceError) {
        self.responses.lock().unwrap().push_back(Err(error));
    }

    pub fn recorded_requests(&self) -> Vec<ChatRequest> {
        self.requests.lock().unwrap().clone()
    }
}

impl Default for ScriptedInference {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl InferenceService for ScriptedInference {
    async fn complete(&self, request: &ChatRequest) -> Result<ChatResponse, InferenceError> {
        self.requests.lock().unwrap().push(request.clone());
        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }
        self.responses
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| Err(InferenceError::network("no scripted response queued")))
    }

    fn model_id(&self) -> &str {
        "scripted"
    }
}

/// Tool returning a fixed payload and counting its invocations
pub struct RecordingTool {
    name: String,
    output: Value,
    invocations: AtomicUsize,
}

impl RecordingTool {
    pub fn new(name: impl Into<String>, output: Value) -> Self {
        Self {
            name: name.into(),
            output,
            invocations: AtomicUsize::new(0),
        }
    }

    pub fn invocations(&self) -> usize {
        self.invocations.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl Tool for RecordingTool {
    fn name(&self) -> &str {
        &self.name
    }

    fn description(&self) -> String {
        format!("Mock {}", self.name)
    }

    fn input_schema(&self) -> Value {
        json!({ "type": "object", "properties": {} })
    }

    async fn run(&self, _input: Value, _ctx: ToolContext) -> Result<Value, ToolError> {
        self.invocations.fetch_add(1, Ordering::SeqCst);
        Ok(self.output.clone())
    }
}

/// Mock booking-draft tool; its output must surface as the side effect
pub struct DraftTool {
    output: Value,
}

impl DraftTool {
    pub fn new(output: Value) -> Self {
        Self { output }
    }
}

#[async_trait]
impl Tool for DraftTool {
    fn name(&self) -> &str {
        "create_booking_draft"
    }

    fn description(&self) -> String {
        "Assemble a booking draft".to_string()
    }

    fn input_schema(&self) -> Value {
        json!({ "type": "object", "properties": {} })
    }

    fn captures_booking_draft(&self) -> bool {
        true
    }

    async fn run(&self, _input: Value, _ctx: ToolContext) -> Result<Value, ToolError> {
        Ok(self.output.clone())
    }
}
