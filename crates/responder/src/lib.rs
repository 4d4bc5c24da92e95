//! Canned replies for the simulated assistant.
//!
//! Replies come from an ordered rule table. Each rule lists trigger substrings that are matched
//! against the lower-cased prompt; the first rule with a matching trigger answers, and a default
//! echo answers everything else.

mod rules;

pub use rules::default_rules;

/// Produces the assistant's reply to a user message.
pub trait Responder: Send + Sync {
    fn reply(&self, prompt: &str) -> String;
}

/// How a matched rule builds its answer.
#[derive(Clone, Copy)]
pub enum Reply {
    Fixed(&'static str),
    /// Built from the original (not lower-cased) prompt.
    Computed(fn(&str) -> String),
}

impl std::fmt::Debug for Reply {
    fn fmt(&self, formatter: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Fixed(text) => formatter.debug_tuple("Fixed").field(text).finish(),
            Self::Computed(_) => formatter.write_str("Computed(..)"),
        }
    }
}

#[derive(Debug, Clone, Copy)]
pub struct ReplyRule {
    pub triggers: &'static [&'static str],
    pub reply: Reply,
}

impl ReplyRule {
    pub const fn fixed(triggers: &'static [&'static str], text: &'static str) -> Self {
        Self {
            triggers,
            reply: Reply::Fixed(text),
        }
    }

    pub const fn computed(triggers: &'static [&'static str], build: fn(&str) -> String) -> Self {
        Self {
            triggers,
            reply: Reply::Computed(build),
        }
    }

    /// `lowered` must already be lower-cased.
    fn matches(&self, lowered: &str) -> bool {
        self.triggers.iter().any(|trigger| lowered.contains(trigger))
    }

    fn render(&self, prompt: &str) -> String {
        match self.reply {
            Reply::Fixed(text) => text.to_string(),
            Reply::Computed(build) => build(prompt),
        }
    }
}

#[derive(Debug, Clone)]
pub struct ScriptedResponder {
    rules: Vec<ReplyRule>,
    fallback: fn(&str) -> String,
}

impl ScriptedResponder {
    pub fn new(rules: Vec<ReplyRule>, fallback: fn(&str) -> String) -> Self {
        Self { rules, fallback }
    }

    pub fn rules(&self) -> &[ReplyRule] {
        &self.rules
    }
}

impl Default for ScriptedResponder {
    fn default() -> Self {
        Self::new(default_rules(), rules::echo_fallback)
    }
}

impl Responder for ScriptedResponder {
    fn reply(&self, prompt: &str) -> String {
        let lowered = prompt.to_lowercase();
        match self.rules.iter().position(|rule| rule.matches(&lowered)) {
            Some(index) => {
                tracing::debug!(rule = index, "scripted reply matched");
                self.rules[index].render(prompt)
            }
            None => (self.fallback)(prompt),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn reply(prompt: &str) -> String {
        ScriptedResponder::default().reply(prompt)
    }

    #[test]
    fn greeting_matches_first_rule() {
        assert_eq!(reply("Hello"), "Hello there! How can I help you today?");
        assert_eq!(reply("HI"), "Hello there! How can I help you today?");
    }

    #[test]
    fn unmatched_text_is_echoed() {
        assert_eq!(
            reply("asdkjasd"),
            "You said: \"asdkjasd\". I'm currently running in simulated mode and can only provide pre-defined responses. Try asking about \"HTML\", \"JavaScript\", \"Python\", \"React\", or just say \"Hello\"!"
        );
    }

    #[test]
    fn earlier_rules_win_over_later_ones() {
        assert!(reply("tell me about javascript").starts_with("JavaScript is"));
        assert!(reply("I like java").starts_with("Java is"));
        // "this" contains "hi", and the greeting rule is checked first.
        assert_eq!(reply("what is this"), "Hello there! How can I help you today?");
        // "java" is checked after "python".
        assert!(reply("python or java?").starts_with("Python is"));
    }

    #[test]
    fn meaning_of_uses_the_remaining_text() {
        assert_eq!(
            reply("meaning of serendipity"),
            "The meaning of \"serendipity\" can vary depending on context. Could you provide more details, or are you looking for a general definition?"
        );
        assert_eq!(
            reply("meaning of "),
            "I can try to explain the meaning of something. What specifically would you like to know?"
        );
    }

    #[test]
    fn custom_tables_keep_their_order() {
        let responder = ScriptedResponder::new(
            vec![
                ReplyRule::fixed(&["ping"], "pong"),
                ReplyRule::computed(&["len"], |prompt| prompt.len().to_string()),
            ],
            |_| "?".to_string(),
        );

        assert_eq!(responder.reply("PING len"), "pong");
        assert_eq!(responder.reply("len"), "3");
        assert_eq!(responder.reply("other"), "?");
        assert_eq!(responder.rules().len(), 2);
    }
}
