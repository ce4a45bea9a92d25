//! Conversation data model
//!
//! Everything here is supplied fresh by the caller on each invocation and
//! owned by the embedding layer between calls. The orchestrator keeps no
//! cross-call state.

use serde::{Deserialize, Serialize};

/// A single turn of caller-visible conversation history.
///
/// Ordered, immutable once appended. Intermediate tool traffic inside one
/// invocation never lands here; history carries only the user/assistant
/// exchange the caller persists.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConversationTurn {
    pub role: Role,
    pub content: String,
}

impl ConversationTurn {
    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: Role::User,
            content: content.into(),
        }
    }

    pub fn assistant(content: impl Into<String>) -> Self {
        Self {
            role: Role::Assistant,
            content: content.into(),
        }
    }
}

/// Turn author
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    User,
    Assistant,
}

/// Read-only per-invocation context describing who is talking and from
/// where in the product.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AgentContext {
    #[serde(default)]
    pub user_id: Option<String>,
    #[serde(default)]
    pub user_name: Option<String>,
    /// App route the conversation was opened from, e.g. `/pro/jobs`
    #[serde(default)]
    pub current_page: Option<String>,
    #[serde(default)]
    pub is_authenticated: bool,
    #[serde(default)]
    pub user_role: UserRole,
}

/// Marketplace account role
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum UserRole {
    #[default]
    Consumer,
    Pro,
    Business,
    Admin,
}

impl UserRole {
    pub fn as_str(&self) -> &'static str {
        match self {
            UserRole::Consumer => "consumer",
            UserRole::Pro => "pro",
            UserRole::Business => "business",
            UserRole::Admin => "admin",
        }
    }
}

/// A tappable UI button extracted from the assistant's reply.
///
/// `action` is an opaque mini-protocol string (`navigate:`, `reply:`,
/// `action:` prefixes) interpreted by the presentation layer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Button {
    pub text: String,
    pub action: String,
}

/// The orchestrator's caller-facing result. Always well-formed; failures
/// inside the loop surface as fallback text, never as errors.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AgentResponse {
    pub text: String,
    #[serde(default)]
    pub buttons: Vec<Button>,
    /// Output of a booking-draft tool captured during the loop, for the
    /// caller to act on after the reply is delivered.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub side_effect: Option<serde_json::Value>,
}

impl AgentResponse {
    pub fn text_only(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            buttons: Vec::new(),
            side_effect: None,
        }
    }
}
