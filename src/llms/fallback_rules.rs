//! Keyword rules for the fallback responder.
//!
//! Rules are checked in table order against the lowercased user input;
//! the first rule with any trigger contained in the input wins.
//! `{date}` in a template is replaced by the current date.

/// One trigger set and its reply template.
#[derive(Debug, Clone, Copy)]
pub struct KeywordRule {
    pub name: &'static str,
    pub triggers: &'static [&'static str],
    pub template: &'static str,
}

impl KeywordRule {
    /// `input` must already be lowercased.
    pub fn matches(&self, input: &str) -> bool {
        self.triggers.iter().any(|t| input.contains(t))
    }
}

pub const DATE_PLACEHOLDER: &str = "{date}";

/// Date format used in fallback replies, e.g. `March 05, 2024`.
pub const DATE_FORMAT: &str = "%B %d, %Y";

pub const RULES: &[KeywordRule] = &[
    KeywordRule {
        name: "greeting",
        triggers: &["hello", "hi"],
        template: "Hello! I'm The Always Laughing Smile. How can I assist you today? Today is {date}.",
    },
    KeywordRule {
        name: "status",
        triggers: &["how are you"],
        template: "I'm functioning perfectly well, thank you for asking! I'm here to assist you with whatever you need.",
    },
    KeywordRule {
        name: "date",
        triggers: &["date", "today", "time"],
        template: "Today is {date}. How may I assist you further?",
    },
    KeywordRule {
        name: "help",
        triggers: &["help"],
        template: "I'm here to help! You can ask me questions, seek advice, or just chat. What's on your mind?",
    },
    KeywordRule {
        name: "thanks",
        triggers: &["thank"],
        template: "You're very welcome! It's my pleasure to assist you. Is there anything else you'd like to know?",
    },
    KeywordRule {
        name: "farewell",
        triggers: &["bye", "goodbye"],
        template: "Goodbye! Feel free to return anytime you need assistance or just want to chat.",
    },
    KeywordRule {
        name: "identity",
        triggers: &["who are you", "what are you"],
        template: "I am 'The Always Laughing Smile', a wise and profound AI assistant designed to help you with compassion and understanding.",
    },
    KeywordRule {
        name: "weather",
        triggers: &["weather"],
        template: "I don't have real-time access to weather data, but I'd be happy to discuss how weather affects our mood and well-being!",
    },
    KeywordRule {
        name: "joke",
        triggers: &["joke", "funny"],
        template: "Why don't scientists trust atoms? Because they make up everything! \u{1F604}",
    },
    KeywordRule {
        name: "meaning_of_life",
        triggers: &["meaning of life"],
        template: "The meaning of life is a profound philosophical question. Many find meaning in connection, purpose, growth, and contribution to others.",
    },
];

/// Reply when no rule matches.
pub const DEFAULT_TEMPLATE: &str = "Thank you for your message. As The Always Laughing Smile, I'm here to provide guidance and support. Could you please elaborate on what you're looking for today? Today is {date}.";

/// First matching rule for an already-lowercased input.
pub fn find_rule(input: &str) -> Option<&'static KeywordRule> {
    RULES.iter().find(|rule| rule.matches(input))
}
