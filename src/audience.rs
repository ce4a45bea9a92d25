//! Audience profiling
//!
//! A pure heuristic classifier over the user-authored turns of a
//! conversation. It tunes tone and verbosity only; it is not an identity
//! or authorization signal, and it degrades to `Default` whenever the
//! evidence is thin or ambiguous.

use crate::conversation::{ConversationTurn, Role};
use regex::Regex;
use std::sync::LazyLock;

/// Minimum winning score; anything below reads as "not enough signal"
const CONFIDENCE_THRESHOLD: u32 = 3;

static CASUAL_LEXICON: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)\b(lol|lmao|omg|btw|ngl|tbh|imo|gonna|wanna|kinda|sorta|yeah|yep|nah|bro|dude|u|ur)\b")
        .expect("casual lexicon regex")
});

static FORMALITY_MARKERS: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)\b(please|kindly|thank you|would you|could you|i would appreciate|much appreciated|good morning|good afternoon|good evening|regards)\b")
        .expect("formality regex")
});

static CLARIFICATION_PHRASES: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)(can you explain|could you explain|what does .{1,40} mean|what do you mean|how does this work|how do i|i don't understand|i do not understand|not sure (i|what|how)|walk me through|i'm confused|im confused)")
        .expect("clarification regex")
});

static URGENCY_PHRASES: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)\b(asap|urgent|urgently|immediately|right away|right now|as soon as possible|in a hurry|no time|quickly|quick)\b")
        .expect("urgency regex")
});

static ITEMIZATION_PHRASES: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)(step by step|step-by-step|break (it|this|that|them) down|breakdown|itemize|itemized|list (all|the|every|out)|line item|line-item|in detail|all the details|exact(ly)? what)")
        .expect("itemization regex")
});

/// Heuristic tone/verbosity classification for the current conversation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum AudienceProfile {
    Senior,
    GenZ,
    BusyProfessional,
    DetailOriented,
    #[default]
    Default,
}

impl AudienceProfile {
    /// Classify the audience from the user-authored turns of `history`.
    ///
    /// Pure: no I/O, same input always yields the same output. Ties
    /// resolve in declaration order (senior first), and a winning score
    /// under the confidence threshold degrades to `Default`.
    pub fn infer(history: &[ConversationTurn]) -> Self {
        let signals = Signals::extract(history);
        let scored = [
            (AudienceProfile::Senior, signals.senior_score()),
            (AudienceProfile::GenZ, signals.gen_z_score()),
            (AudienceProfile::BusyProfessional, signals.busy_score()),
            (AudienceProfile::DetailOriented, signals.detail_score()),
        ];

        let (profile, score) = scored
            .into_iter()
            .fold((AudienceProfile::Default, 0), |best, candidate| {
                if candidate.1 > best.1 {
                    candidate
                } else {
                    best
                }
            });

        if score >= CONFIDENCE_THRESHOLD {
            profile
        } else {
            AudienceProfile::Default
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            AudienceProfile::Senior => "senior",
            AudienceProfile::GenZ => "gen-z",
            AudienceProfile::BusyProfessional => "busy-professional",
            AudienceProfile::DetailOriented => "detail-oriented",
            AudienceProfile::Default => "default",
        }
    }
}

/// Raw signals extracted from the user turns, combined through a fixed
/// integer weight table below.
#[derive(Debug, Default)]
struct Signals {
    avg_chars: usize,
    expressive: bool,
    casual: bool,
    formal: bool,
    clarifying: bool,
    urgent: bool,
    itemizing: bool,
}

impl Signals {
    fn extract(history: &[ConversationTurn]) -> Self {
        let user_turns: Vec<&str> = history
            .iter()
            .filter(|t| t.role == Role::User)
            .map(|t| t.content.as_str())
            .collect();

        if user_turns.is_empty() {
            return Self::default();
        }

        let total_chars: usize = user_turns.iter().map(|t| t.chars().count()).sum();
        let mut signals = Self {
            avg_chars: total_chars / user_turns.len(),
            ..Self::default()
        };

        for turn in &user_turns {
            signals.expressive |= is_expressive(turn);
            signals.casual |= CASUAL_LEXICON.is_match(turn);
            signals.formal |= FORMALITY_MARKERS.is_match(turn);
            signals.clarifying |= CLARIFICATION_PHRASES.is_match(turn);
            signals.urgent |= URGENCY_PHRASES.is_match(turn);
            signals.itemizing |= ITEMIZATION_PHRASES.is_match(turn);
        }
        signals
    }

    fn senior_score(&self) -> u32 {
        2 * u32::from(self.formal)
            + 2 * u32::from(self.clarifying)
            + u32::from(self.avg_chars > 120)
    }

    fn gen_z_score(&self) -> u32 {
        2 * u32::from(self.casual)
            + 2 * u32::from(self.expressive)
            + u32::from(self.avg_chars > 0 && self.avg_chars < 40)
    }

    fn busy_score(&self) -> u32 {
        3 * u32::from(self.urgent) + u32::from(self.avg_chars > 0 && self.avg_chars < 60)
    }

    fn detail_score(&self) -> u32 {
        2 * u32::from(self.itemizing)
            + u32::from(self.clarifying)
            + u32::from(self.avg_chars > 160)
    }
}

/// Expressive punctuation or emoji anywhere in the turn
fn is_expressive(text: &str) -> bool {
    if text.contains("!!") || text.contains("?!") || text.contains("!?") {
        return true;
    }
    text.chars().any(|c| {
        matches!(u32::from(c),
            0x1F300..=0x1FAFF   // pictographs, faces, symbols
            | 0x2600..=0x27BF   // misc symbols, dingbats
            | 0x1F000..=0x1F0FF // tiles and cards
        )
    })
}


#[cfg(test)]
mod proptests {
    use super::*;
    use crate::conversation::{ConversationTurn, Role};
    use proptest::prelude::*;

    fn arb_turn() -> impl Strategy<Value = ConversationTurn> {
        (any::<bool>(), "\\PC{0,200}").prop_map(|(is_user, content)| ConversationTurn {
            role: if is_user { Role::User } else { Role::Assistant },
            content,
        })
    }

    proptest! {
        // Total over arbitrary histories, including odd unicode
        #[test]
        fn infer_never_panics(history in proptest::collection::vec(arb_turn(), 0..8)) {
            let _ = AudienceProfile::infer(&history);
        }

        // Same history twice yields the same profile
        #[test]
        fn infer_is_idempotent(history in proptest::collection::vec(arb_turn(), 0..8)) {
            prop_assert_eq!(
                AudienceProfile::infer(&history),
                AudienceProfile::infer(&history)
            );
        }
    }
}
