//! Follow-up action suggestions derived from the user's message.

/// Maximum number of suggestions returned per reply.
pub const MAX_SUGGESTIONS: usize = 3;

/// Used when no keyword group matches.
pub const DEFAULT_SUGGESTIONS: [&str; 3] = [
    "What are my tasks today?",
    "How can I be more productive?",
    "Show me my progress",
];

/// Starter prompts served to new clients by `GET /suggestions`.
pub const STARTER_SUGGESTIONS: [&str; 3] = [
    "What can you help me with?",
    "Tell me about artificial intelligence",
    "How do I stay productive?",
];

/// Independent keyword groups; every matching group contributes, in order.
const SUGGESTION_GROUPS: &[(&[&str], [&str; 3])] = &[
    (
        &["task", "todo", "work"],
        ["Add a new task", "View my task list", "Set task priority"],
    ),
    (
        &["habit", "routine", "daily"],
        ["Track a habit", "View habit progress", "Set habit reminder"],
    ),
    (
        &["focus", "concentrate", "work"],
        ["Start Pomodoro timer", "Take a break", "Meditation session"],
    ),
];

/// Suggest up to [`MAX_SUGGESTIONS`] follow-up actions.
///
/// `_ai_response` is part of the handler-facing signature but does not take
/// part in matching.
pub fn suggest(user_message: &str, _ai_response: &str) -> Vec<String> {
    let lower = user_message.to_lowercase();

    let mut suggestions: Vec<&str> = SUGGESTION_GROUPS
        .iter()
        .filter(|(keywords, _)| keywords.iter().any(|k| lower.contains(k)))
        .flat_map(|(_, items)| items.iter().copied())
        .collect();

    if suggestions.is_empty() {
        suggestions.extend(DEFAULT_SUGGESTIONS);
    }

    suggestions
        .into_iter()
        .take(MAX_SUGGESTIONS)
        .map(str::to_string)
        .collect()
}
