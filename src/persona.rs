//! Persona selection
//!
//! Picks one of three system-prompt templates from the caller's role and
//! the app route the conversation was opened from. Exactly one persona is
//! active per invocation and it never changes mid-loop.

use crate::conversation::{AgentContext, UserRole};
use serde::{Deserialize, Serialize};

/// Route prefixes that force the business persona
const BUSINESS_PAGE_PREFIXES: &[&str] = &["/business"];

/// Route prefixes that force the pro persona
const PRO_PAGE_PREFIXES: &[&str] = &["/pro", "/onboarding"];

/// System prompt for consumers booking services
const CONSUMER_TEMPLATE: &str = r#"You are the in-app assistant for a home services marketplace, helping a customer find, compare, and book local service professionals.

Be warm and practical. Answer questions about services, pricing, availability, and existing bookings. Use the available tools to look up real data instead of guessing; never invent prices or time slots. When the customer is ready to book, assemble a booking draft with a tool and confirm the details back to them.

When a short set of next steps would help, end your reply with a single line of the form:
BUTTONS: [{"text":"...","action":"..."}]
where each action is one of navigate:<route>, reply:<message>, or action:<operation>. At most four buttons, and only when they genuinely help."#;

/// System prompt for service professionals
const PRO_TEMPLATE: &str = r#"You are the in-app assistant for a home services marketplace, supporting a service professional running their business on the platform.

Be direct and efficient. Help with their schedule, job requests, quotes, invoices, and customer messages. Use the available tools to read and act on real data; never fabricate jobs, payouts, or customer details. Surface anything that needs their attention today before longer-term items.

When a short set of next steps would help, end your reply with a single line of the form:
BUTTONS: [{"text":"...","action":"..."}]
where each action is one of navigate:<route>, reply:<message>, or action:<operation>. At most four buttons, and only when they genuinely help."#;

/// System prompt for business accounts
const BUSINESS_TEMPLATE: &str = r#"You are the in-app assistant for a home services marketplace, supporting a business account that manages a team of service professionals.

Be concise and operationally minded. Help with team scheduling, dispatch, multi-job coordination, billing, and account administration. Use the available tools for any figures or records; never estimate revenue or utilization from memory. Where a change affects the whole team, say so explicitly.

When a short set of next steps would help, end your reply with a single line of the form:
BUTTONS: [{"text":"...","action":"..."}]
where each action is one of navigate:<route>, reply:<message>, or action:<operation>. At most four buttons, and only when they genuinely help."#;

/// Communication persona, one per audience segment
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Persona {
    Consumer,
    Pro,
    Business,
}

impl Persona {
    /// Select the persona for this invocation. Total: always resolves,
    /// defaulting to `Consumer`.
    pub fn select(context: &AgentContext) -> Self {
        let page = context.current_page.as_deref().unwrap_or("");

        if context.user_role == UserRole::Business || has_prefix(page, BUSINESS_PAGE_PREFIXES) {
            return Persona::Business;
        }
        if context.user_role == UserRole::Pro || has_prefix(page, PRO_PAGE_PREFIXES) {
            return Persona::Pro;
        }
        Persona::Consumer
    }

    /// The persona's system-prompt template
    pub fn template(&self) -> &'static str {
        match self {
            Persona::Consumer => CONSUMER_TEMPLATE,
            Persona::Pro => PRO_TEMPLATE,
            Persona::Business => BUSINESS_TEMPLATE,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Persona::Consumer => "consumer",
            Persona::Pro => "pro",
            Persona::Business => "business",
        }
    }
}

fn has_prefix(page: &str, prefixes: &[&str]) -> bool {
    prefixes.iter().any(|p| page.starts_with(p))
}
