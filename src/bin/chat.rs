//! Terminal smoke client
//!
//! Drives the orchestration core against the real inference backend with
//! an empty tool catalog: type a message, get the assistant's reply and
//! any extracted buttons. Useful for eyeballing persona and audience
//! behavior without the full application around the crate.

use concierge::llm::{AnthropicClient, InferenceConfig, InferenceService, LoggingService};
use concierge::{Agent, AgentContext, ConversationTurn, ToolRegistry, UserRole};
use std::io::{BufRead, Write};
use std::sync::Arc;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "concierge=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let tools = Arc::new(ToolRegistry::empty());
    let agent = match AnthropicClient::from_config(&InferenceConfig::from_env()) {
        Some(client) => {
            tracing::info!(model = client.model_id(), "inference backend ready");
            Agent::new(Arc::new(LoggingService::new(Arc::new(client))), tools)
        }
        None => {
            tracing::warn!("ANTHROPIC_API_KEY not set; every reply will be a fallback");
            Agent::without_inference(tools)
        }
    };

    let context = AgentContext {
        user_role: std::env::var("CONCIERGE_ROLE")
            .ok()
            .and_then(|r| serde_json::from_value(serde_json::Value::String(r)).ok())
            .unwrap_or(UserRole::Consumer),
        ..Default::default()
    };

    let mut history: Vec<ConversationTurn> = Vec::new();
    let stdin = std::io::stdin();

    loop {
        print!("> ");
        std::io::stdout().flush().ok();

        let mut line = String::new();
        match stdin.lock().read_line(&mut line) {
            Ok(0) | Err(_) => break,
            Ok(_) => {}
        }
        let message = line.trim();
        if message.is_empty() {
            continue;
        }

        let response = agent.respond(message, &history, &context).await;
        println!("{}", response.text);
        for button in &response.buttons {
            println!("  [{}] -> {}", button.text, button.action);
        }
        if let Some(side_effect) = &response.side_effect {
            println!("  (pending side effect: {side_effect})");
        }

        history.push(ConversationTurn::user(message));
        history.push(ConversationTurn::assistant(response.text));
    }
}
