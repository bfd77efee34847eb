//! Canned replies used when the model path cannot answer.
//!
//! Matching is case-insensitive substring containment, so "tasking" matches
//! "task" and "this" matches "hi". Groups are checked in declaration order
//! and the first hit wins.

/// The topic a fallback reply was chosen for.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FallbackTopic {
    Informational,
    Greeting,
    Help,
    Thanks,
    Productivity,
    Technology,
    General,
}

/// Keyword groups in priority order. `General` has no keywords.
const KEYWORD_GROUPS: &[(FallbackTopic, &[&str])] = &[
    (
        FallbackTopic::Informational,
        &["what is", "who is", "how does", "explain", "define"],
    ),
    (
        FallbackTopic::Greeting,
        &["hello", "hi", "hey", "good morning", "good afternoon"],
    ),
    (FallbackTopic::Help, &["help", "assist", "support"]),
    (FallbackTopic::Thanks, &["thank", "thanks"]),
    (
        FallbackTopic::Productivity,
        &["task", "todo", "schedule", "productivity"],
    ),
    (
        FallbackTopic::Technology,
        &["code", "programming", "python", "javascript", "technology"],
    ),
];

impl FallbackTopic {
    /// Every topic, in matching priority order.
    pub const ALL: [FallbackTopic; 7] = [
        Self::Informational,
        Self::Greeting,
        Self::Help,
        Self::Thanks,
        Self::Productivity,
        Self::Technology,
        Self::General,
    ];

    /// Classify a user message.
    pub fn classify(user_message: &str) -> Self {
        let lower = user_message.to_lowercase();
        KEYWORD_GROUPS
            .iter()
            .find(|(_, keywords)| keywords.iter().any(|k| lower.contains(k)))
            .map(|(topic, _)| *topic)
            .unwrap_or(Self::General)
    }

    /// The fixed reply text for this topic.
    pub fn reply(self) -> &'static str {
        match self {
            Self::Informational => {
                "I'd love to help explain that! However, my AI model isn't currently available. \
                 Please try again in a moment, or feel free to ask me about productivity, \
                 technology, or general topics."
            }
            Self::Greeting => {
                "Hello! I'm your AI assistant. I can help answer questions on many topics \
                 including technology, science, history, and more. What would you like to know?"
            }
            Self::Help => {
                "I'm here to help! I can answer questions on a wide range of topics. \
                 Feel free to ask me about anything - from general knowledge to productivity tips!"
            }
            Self::Thanks => {
                "You're welcome! I'm happy to help. Is there anything else you'd like to know?"
            }
            Self::Productivity => {
                "I can help with productivity topics! You can ask me about task management, \
                 time management, building habits, or staying focused. What would you like to know?"
            }
            Self::Technology => {
                "I'd be happy to help with programming and technology questions! \
                 Ask me about coding concepts, best practices, or technical topics."
            }
            Self::General => {
                "That's an interesting question! I'm designed to help with a wide range of topics. \
                 Feel free to ask me about science, technology, history, productivity, or anything \
                 else you're curious about!"
            }
        }
    }
}

/// Pick the canned reply for `user_message`.
pub fn fallback_reply(user_message: &str) -> &'static str {
    FallbackTopic::classify(user_message).reply()
}
