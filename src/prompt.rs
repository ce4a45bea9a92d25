//! System prompt composition
//!
//! Merges the selected persona template, the per-call context facts, and
//! the audience adaptation block into one system prompt, in that fixed
//! order. No truncation happens here; context-window management belongs
//! to the caller.

use crate::audience::AudienceProfile;
use crate::conversation::AgentContext;
use crate::persona::Persona;
use std::fmt::Write;

/// Tone adaptation appended when the profiler is confident. Static
/// lookup; `Default` adds nothing.
fn adaptation_block(profile: AudienceProfile) -> Option<&'static str> {
    match profile {
        AudienceProfile::Senior => Some(
            "Adapt your tone: be patient and reassuring. Use plain language, avoid jargon and abbreviations, and take things one step at a time. Spell out what happens next so nothing feels automatic or hidden.",
        ),
        AudienceProfile::GenZ => Some(
            "Adapt your tone: keep it light and conversational. Short sentences, casual phrasing, and the occasional emoji are fine. Skip corporate filler and get to the good part.",
        ),
        AudienceProfile::BusyProfessional => Some(
            "Adapt your tone: lead with the answer. Keep replies tight, skip pleasantries, and put any required decision or action in the first sentence. Offer detail only if asked.",
        ),
        AudienceProfile::DetailOriented => Some(
            "Adapt your tone: be thorough and precise. Include concrete numbers, itemize costs and steps, and state any assumptions or caveats explicitly rather than rounding them off.",
        ),
        AudienceProfile::Default => None,
    }
}

/// Build the complete system prompt for one invocation.
///
/// Only present context fields are rendered; an absent field contributes
/// no line at all, and identity lines are withheld from unauthenticated
/// sessions.
pub fn compose_system_prompt(
    persona: Persona,
    context: &AgentContext,
    profile: AudienceProfile,
) -> String {
    let mut prompt = String::from(persona.template());

    prompt.push_str("\n\nConversation context:");
    if context.is_authenticated {
        if let Some(name) = &context.user_name {
            let _ = write!(prompt, "\nUser name: {name}");
        }
        if let Some(id) = &context.user_id {
            let _ = write!(prompt, "\nUser id: {id}");
        }
        let _ = write!(prompt, "\nAccount type: {}", context.user_role.as_str());
    }
    let _ = write!(
        prompt,
        "\nSigned in: {}",
        if context.is_authenticated { "yes" } else { "no" }
    );
    if let Some(page) = &context.current_page {
        let _ = write!(prompt, "\nCurrent page: {page}");
    }

    if let Some(block) = adaptation_block(profile) {
        prompt.push_str("\n\n");
        prompt.push_str(block);
    }

    prompt
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::conversation::UserRole;

    #[test]
    fn test_unauthenticated_omits_identity_lines() {
        let context = AgentContext {
            // Fields that may linger in a stale client payload must still
            // be withheld when the session is not authenticated
            user_id: Some("u_42".to_string()),
            user_name: Some("Sam".to_string()),
            is_authenticated: false,
            ..Default::default()
        };
        let prompt =
            compose_system_prompt(Persona::Consumer, &context, AudienceProfile::Default);

        assert!(!prompt.contains("User name"));
        assert!(!prompt.contains("User id"));
        assert!(!prompt.contains("Account type"));
        assert!(prompt.contains("Signed in: no"));
        // No empty or placeholder renderings anywhere
        assert!(!prompt.contains("None"));
        assert!(!prompt.contains(": \n"));
    }

    #[test]
    fn test_authenticated_renders_present_fields() {
        let context = AgentContext {
            user_id: Some("u_42".to_string()),
            user_name: Some("Sam".to_string()),
            current_page: Some("/bookings".to_string()),
            is_authenticated: true,
            user_role: UserRole::Consumer,
        };
        let prompt =
            compose_system_prompt(Persona::Consumer, &context, AudienceProfile::Default);

        assert!(prompt.contains("User name: Sam"));
        assert!(prompt.contains("User id: u_42"));
        assert!(prompt.contains("Account type: consumer"));
        assert!(prompt.contains("Signed in: yes"));
        assert!(prompt.contains("Current page: /bookings"));
    }

    #[test]
    fn test_absent_fields_contribute_no_lines() {
        let context = AgentContext {
            is_authenticated: true,
            ..Default::default()
        };
        let prompt =
            compose_system_prompt(Persona::Consumer, &context, AudienceProfile::Default);

        assert!(!prompt.contains("User name"));
        assert!(!prompt.contains("User id"));
        assert!(!prompt.contains("Current page"));
        assert!(prompt.contains("Account type: consumer"));
    }

    #[test]
    fn test_fixed_section_order() {
        let context = AgentContext {
            current_page: Some("/pro/jobs".to_string()),
            ..Default::default()
        };
        let prompt =
            compose_system_prompt(Persona::Pro, &context, AudienceProfile::BusyProfessional);

        let persona_at = prompt.find("service professional").unwrap();
        let context_at = prompt.find("Conversation context:").unwrap();
        let adaptation_at = prompt.find("Adapt your tone").unwrap();
        assert!(persona_at < context_at);
        assert!(context_at < adaptation_at);
    }

    #[test]
    fn test_default_profile_adds_no_adaptation() {
        let prompt = compose_system_prompt(
            Persona::Consumer,
            &AgentContext::default(),
            AudienceProfile::Default,
        );
        assert!(!prompt.contains("Adapt your tone"));
    }

    #[test]
    fn test_each_confident_profile_has_a_block() {
        for profile in [
            AudienceProfile::Senior,
            AudienceProfile::GenZ,
            AudienceProfile::BusyProfessional,
            AudienceProfile::DetailOriented,
        ] {
            assert!(adaptation_block(profile).is_some(), "{profile:?}");
        }
    }
}
