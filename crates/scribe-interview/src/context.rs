//! Model context construction.
//!
//! The context is plain text: a fixed preamble, the numbered plan, the most
//! recent transcript turns as `sender: message` lines, the new user line and
//! an open `agent:` cue for the model to complete.

use scribe_core::types::Turn;

use crate::plan::{numbered_plan, CONVERSATION_PLAN};

/// Fixed reply for eligibility and legal-advice requests.
pub const DEFLECTION: &str = "I'm not able to determine eligibility or give legal advice, \
                              but I can help you complete your application.";

/// Builds the text sent to the language model for one turn.
#[derive(Clone, Debug)]
pub struct ContextBuilder {
    /// Number of prior turns included, most recent last.
    pub window: usize,
    pub form_type: String,
}

impl ContextBuilder {
    pub fn new(window: usize, form_type: impl Into<String>) -> Self {
        Self {
            window,
            form_type: form_type.into(),
        }
    }

    /// Render the context for `message` given the prior `history`.
    ///
    /// `history` must not already contain `message`.
    pub fn build(&self, history: &[Turn], message: &str) -> String {
        let mut ctx = self.preamble();

        ctx.push_str("\n\nCover these topics in order, one question at a time:\n");
        ctx.push_str(&numbered_plan());
        ctx.push_str(&format!(
            "\nAfter topic {} has been answered, stop asking questions. Thank the \
             applicant and tell them their {} application is ready to download.",
            CONVERSATION_PLAN.len(),
            self.form_type
        ));

        ctx.push_str("\n\nConversation so far:\n");
        let start = history.len().saturating_sub(self.window);
        for turn in &history[start..] {
            ctx.push_str(&format!("{}: {}\n", turn.sender, turn.message));
        }
        ctx.push_str(&format!("user: {}\nagent:", message));
        ctx
    }

    fn preamble(&self) -> String {
        format!(
            "You are CivicScribe, a friendly assistant helping someone fill out a {} \
             benefits application by interview. Ask one short, plain-language question \
             at a time and briefly acknowledge each answer. If asked whether they \
             qualify or for legal advice, reply exactly: \"{}\"",
            self.form_type, DEFLECTION
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use scribe_core::types::Sender;

    fn turns(n: usize) -> Vec<Turn> {
        (0..n)
            .map(|i| {
                let sender = if i % 2 == 0 { Sender::Agent } else { Sender::User };
                Turn::now("s", sender, format!("message {}", i))
            })
            .collect()
    }

    #[test]
    fn test_context_sections_in_order() {
        let builder = ContextBuilder::new(50, "SNAP");
        let ctx = builder.build(&turns(2), "My name is Ana");

        let preamble = ctx.find("You are CivicScribe").unwrap();
        let plan = ctx.find("1. Ask about").unwrap();
        let history = ctx.find("Conversation so far:").unwrap();
        let new_line = ctx.find("user: My name is Ana").unwrap();
        assert!(preamble < plan && plan < history && history < new_line);
        assert!(ctx.ends_with("user: My name is Ana\nagent:"));
    }

    #[test]
    fn test_context_contains_guardrail_and_stop_instruction() {
        let ctx = ContextBuilder::new(50, "SNAP").build(&[], "hi");
        assert!(ctx.contains(DEFLECTION));
        assert!(ctx.contains("After topic 15 has been answered, stop asking questions"));
        assert!(ctx.contains("SNAP application is ready"));
    }

    #[test]
    fn test_history_lines_use_sender_labels() {
        let ctx = ContextBuilder::new(50, "SNAP").build(&turns(2), "next");
        assert!(ctx.contains("agent: message 0\nuser: message 1\nuser: next\nagent:"));
    }

    #[test]
    fn test_window_keeps_most_recent_turns() {
        let ctx = ContextBuilder::new(3, "SNAP").build(&turns(10), "latest");
        assert!(!ctx.contains("message 6\n"));
        assert!(ctx.contains("message 7\n"));
        assert!(ctx.contains("message 9\n"));
    }

    #[test]
    fn test_zero_window_has_only_new_message() {
        let ctx = ContextBuilder::new(0, "SNAP").build(&turns(4), "only");
        assert!(!ctx.contains("message 0"));
        assert!(ctx.ends_with("Conversation so far:\nuser: only\nagent:"));
    }

    #[test]
    fn test_empty_message_still_builds() {
        let ctx = ContextBuilder::new(50, "SNAP").build(&[], "");
        assert!(ctx.ends_with("user: \nagent:"));
    }
}
