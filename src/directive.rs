//! UI directive extraction
//!
//! The model is prompted to append button suggestions as one trailing
//! `BUTTONS:` line holding a JSON array. This module strips that line
//! from the displayed text and hands the parsed buttons to the caller.
//! A malformed payload is never an error: the reply is delivered as-is
//! with no buttons.

use crate::conversation::Button;

/// Marker opening the trailing directive line
const BUTTON_MARKER: &str = "BUTTONS:";

/// Split `text` into display text and extracted buttons.
///
/// The marker must start a line and its JSON array must run to the end of
/// the text; anything else leaves the input untouched.
pub fn extract_directives(text: &str) -> (String, Vec<Button>) {
    let Some(idx) = text.rfind(BUTTON_MARKER) else {
        return (text.to_string(), Vec::new());
    };

    if idx > 0 && !text[..idx].ends_with('\n') {
        return (text.to_string(), Vec::new());
    }

    let payload = text[idx + BUTTON_MARKER.len()..].trim();
    match serde_json::from_str::<Vec<Button>>(payload) {
        Ok(buttons) => {
            let clean = text[..idx].trim_end().to_string();
            (clean, buttons)
        }
        Err(e) => {
            tracing::debug!(error = %e, "ignoring unparseable button directive");
            (text.to_string(), Vec::new())
        }
    }
}


#[cfg(test)]
mod proptests {
    use super::*;
    use proptest::prelude::*;

    fn arb_button() -> impl Strategy<Value = Button> {
        ("[a-zA-Z0-9 ]{1,20}", "[a-z:/_ ]{1,30}").prop_map(|(text, action)| Button {
            text,
            action,
        })
    }

    proptest! {
        // Extraction is total over arbitrary model output
        #[test]
        fn extract_never_panics(text in "\\PC{0,300}") {
            let _ = extract_directives(&text);
        }

        // A well-formed trailing directive always round-trips
        #[test]
        fn well_formed_payload_round_trips(
            body in "[a-zA-Z0-9 .,!?]{0,100}",
            buttons in proptest::collection::vec(arb_button(), 0..4),
        ) {
            let payload = serde_json::to_string(&buttons).unwrap();
            let input = format!("{body}\nBUTTONS: {payload}");
            let (clean, extracted) = extract_directives(&input);
            prop_assert_eq!(clean, body.trim_end());
            prop_assert_eq!(extracted, buttons);
        }
    }
}
