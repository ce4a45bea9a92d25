//! Conversation loop controller
//!
//! Ties persona selection, audience profiling, prompt composition, the
//! inference service, and tool dispatch into one bounded loop. The entry
//! point never raises: configuration problems, inference failures,
//! cancellation, and budget exhaustion all surface as well-formed
//! fallback responses.

#[cfg(test)]
pub mod testing;

use crate::audience::AudienceProfile;
use crate::conversation::{AgentContext, AgentResponse, ConversationTurn, Role};
use crate::directive::extract_directives;
use crate::llm::{
    ChatMessage, ChatRequest, ContentBlock, InferenceService, ToolChoice, ToolDefinition,
};
use crate::persona::Persona;
use crate::prompt::compose_system_prompt;
use crate::tools::{ToolContext, ToolRegistry};
use futures::future::join_all;
use std::sync::Arc;
use std::time::Duration;
use tokio_util::sync::CancellationToken;

/// Hard turn budget per invocation: at most this many model calls before
/// the loop degrades to the human-escalation fallback.
const MAX_ITERATIONS: usize = 5;

/// Returned when no inference backend is configured
const NOT_CONFIGURED_FALLBACK: &str = "I'm not able to help right now because my connection to the assistant service isn't set up. Please try again later or contact support.";

/// Returned when the inference service fails or the caller disconnects
const INFERENCE_FAILURE_FALLBACK: &str =
    "Sorry, I ran into a problem while working on that. Please try again in a moment.";

/// Returned when the turn budget runs out before a final answer
const EXHAUSTED_FALLBACK: &str = "I wasn't able to finish that for you here. Let me connect you with a member of our support team who can help you directly.";

/// Loop tuning. The iteration cap is deliberately not configurable; the
/// keyword list is, since the hint heuristic is expected to be tuned.
#[derive(Debug, Clone)]
pub struct AgentConfig {
    pub temperature: f32,
    pub max_tokens: u32,
    /// Timeout applied to each individual inference call
    pub inference_timeout: Duration,
    /// Lowercase keywords in the latest user message that force the first
    /// model call into tool-use mode, so the model acts instead of
    /// narrating. Misses are acceptable degradation.
    pub tool_hint_keywords: Vec<String>,
}

impl Default for AgentConfig {
    fn default() -> Self {
        Self {
            temperature: 0.7,
            max_tokens: 1024,
            inference_timeout: Duration::from_secs(60),
            tool_hint_keywords: [
                "schedule",
                "availability",
                "available",
                "book",
                "booking",
                "appointment",
                "reschedule",
                "price",
                "pricing",
                "quote",
                "cost",
                "invoice",
                "payout",
            ]
            .into_iter()
            .map(String::from)
            .collect(),
        }
    }
}

/// The orchestrator. Holds only immutable shared state (inference client,
/// tool catalog, config); history and context arrive fresh on every call,
/// so one instance serves any number of concurrent conversations.
pub struct Agent {
    inference: Option<Arc<dyn InferenceService>>,
    tools: Arc<ToolRegistry>,
    config: AgentConfig,
}

impl Agent {
    pub fn new(inference: Arc<dyn InferenceService>, tools: Arc<ToolRegistry>) -> Self {
        Self {
            inference: Some(inference),
            tools,
            config: AgentConfig::default(),
        }
    }

    /// An agent with no inference backend. Every call short-circuits to
    /// the not-configured fallback; used when credentials are absent so
    /// the embedding layer still gets well-formed responses.
    pub fn without_inference(tools: Arc<ToolRegistry>) -> Self {
        Self {
            inference: None,
            tools,
            config: AgentConfig::default(),
        }
    }

    pub fn with_config(mut self, config: AgentConfig) -> Self {
        self.config = config;
        self
    }

    /// Produce a reply to `user_message` given caller-owned `history` and
    /// read-only `context`. Never returns an error.
    pub async fn respond(
        &self,
        user_message: &str,
        history: &[ConversationTurn],
        context: &AgentContext,
    ) -> AgentResponse {
        self.respond_cancellable(user_message, history, context, CancellationToken::new())
            .await
    }

    /// Like [`respond`](Self::respond), with a cooperative cancellation
    /// signal: cancelling aborts the in-flight model call and any running
    /// tool batch, and resolves to the apology fallback.
    pub async fn respond_cancellable(
        &self,
        user_message: &str,
        history: &[ConversationTurn],
        context: &AgentContext,
        cancel: CancellationToken,
    ) -> AgentResponse {
        let Some(inference) = &self.inference else {
            tracing::error!("no inference backend configured");
            return AgentResponse::text_only(NOT_CONFIGURED_FALLBACK);
        };

        // One persona per invocation, fixed before the loop starts
        let persona = Persona::select(context);

        // Seed history with the new user turn, then profile over it
        let mut turns = history.to_vec();
        turns.push(ConversationTurn::user(user_message));
        let profile = AudienceProfile::infer(&turns);
        let system = compose_system_prompt(persona, context, profile);

        tracing::debug!(
            persona = persona.as_str(),
            audience = profile.as_str(),
            history_turns = history.len(),
            "composed system prompt"
        );

        let mut messages: Vec<ChatMessage> = turns.iter().map(to_chat_message).collect();
        let tool_catalog: Vec<ToolDefinition> = self.tools.definitions();
        let force_tools = !self.tools.is_empty() && self.wants_tool_use(user_message);
        let mut side_effect: Option<serde_json::Value> = None;

        for iteration in 1..=MAX_ITERATIONS {
            let tool_choice = if iteration == 1 && force_tools {
                tracing::debug!("forcing tool use for first model call");
                ToolChoice::Any
            } else {
                ToolChoice::Auto
            };

            let request = ChatRequest {
                system: system.clone(),
                messages: messages.clone(),
                tools: tool_catalog.clone(),
                tool_choice,
                temperature: Some(self.config.temperature),
                max_tokens: Some(self.config.max_tokens),
            };

            let response = tokio::select! {
                () = cancel.cancelled() => {
                    tracing::info!(iteration, "invocation cancelled");
                    return AgentResponse::text_only(INFERENCE_FAILURE_FALLBACK);
                }
                outcome = tokio::time::timeout(
                    self.config.inference_timeout,
                    inference.complete(&request),
                ) => match outcome {
                    Err(_) => {
                        tracing::error!(iteration, "inference call timed out");
                        return AgentResponse::text_only(INFERENCE_FAILURE_FALLBACK);
                    }
                    Ok(Err(e)) => {
                        tracing::error!(iteration, error = %e, "inference call failed");
                        return AgentResponse::text_only(INFERENCE_FAILURE_FALLBACK);
                    }
                    Ok(Ok(response)) => response,
                },
            };

            let tool_uses = response.tool_uses();
            if tool_uses.is_empty() {
                let (text, buttons) = extract_directives(&response.text());
                tracing::info!(iteration, buttons = buttons.len(), "conversation turn complete");
                return AgentResponse {
                    text,
                    buttons,
                    side_effect,
                };
            }

            tracing::debug!(iteration, tools = tool_uses.len(), "dispatching tool batch");

            // Requested tools are independent by contract: fan out, then
            // join back in request order before the next model call
            let outputs = join_all(tool_uses.iter().map(|&(_, name, input)| {
                self.tools
                    .invoke(name, input.clone(), ToolContext::for_call(context, cancel.clone()))
            }))
            .await;

            let mut results = Vec::with_capacity(outputs.len());
            for (&(id, name, _), output) in tool_uses.iter().zip(outputs) {
                if self.tools.captures_booking_draft(name) && output.get("error").is_none() {
                    side_effect = Some(output.clone());
                }
                let is_error = output.get("error").is_some();
                results.push(ContentBlock::tool_result(id, output.to_string(), is_error));
            }

            // The raw tool-use assistant turn, then one user turn bundling
            // exactly this iteration's results
            messages.push(ChatMessage::assistant(response.content.clone()));
            messages.push(ChatMessage::user(results));
        }

        tracing::warn!(cap = MAX_ITERATIONS, "turn budget exhausted, degrading");
        AgentResponse {
            text: EXHAUSTED_FALLBACK.to_string(),
            buttons: Vec::new(),
            side_effect,
        }
    }

    /// Keyword scan of the latest user message; a hit hints that a tool
    /// call, not prose, is the expected first move.
    fn wants_tool_use(&self, user_message: &str) -> bool {
        let lowered = user_message.to_lowercase();
        self.config
            .tool_hint_keywords
            .iter()
            .any(|k| lowered.contains(k.as_str()))
    }
}

fn to_chat_message(turn: &ConversationTurn) -> ChatMessage {
    match turn.role {
        Role::User => ChatMessage::user_text(&turn.content),
        Role::Assistant => ChatMessage::assistant_text(&turn.content),
    }
}
