//! Conversation orchestration core for a services marketplace assistant
//!
//! Selects a communication persona, adapts tone to the inferred audience,
//! runs a bounded tool-calling loop against an inference service, and
//! extracts structured UI directives from the final reply. History
//! persistence and HTTP transport belong to the embedding layer; this
//! crate is the library boundary in between.

pub mod agent;
pub mod audience;
pub mod conversation;
pub mod directive;
pub mod llm;
pub mod persona;
pub mod prompt;
pub mod tools;

pub use agent::{Agent, AgentConfig};
pub use audience::AudienceProfile;
pub use conversation::{
    AgentContext, AgentResponse, Button, ConversationTurn, Role, UserRole,
};
pub use directive::extract_directives;
pub use persona::Persona;
pub use prompt::compose_system_prompt;
pub use tools::{RegistryError, Tool, ToolContext, ToolError, ToolRegistry};
