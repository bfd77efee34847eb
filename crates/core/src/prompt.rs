//! Prompt construction from the user's message and recent history.

/// Instruction preamble used when the caller sends no history.
pub const SYSTEM_PREAMBLE: &str =
    "You are a helpful AI assistant. Answer questions clearly and concisely.";

/// How many trailing history entries are folded into the prompt.
pub const HISTORY_WINDOW: usize = 2;

/// Marker the prompt ends with; the sanitizer splits on it.
pub const ANSWER_MARKER: &str = "A:";

/// Build the completion prompt.
///
/// With history, the last [`HISTORY_WINDOW`] entries are joined by a single
/// space and prefixed to the message. Without it, the system preamble is used.
pub fn build_prompt(user_message: &str, history: &[String]) -> String {
    if history.is_empty() {
        return format!("{SYSTEM_PREAMBLE}\n\nQ: {user_message}\n{ANSWER_MARKER}");
    }

    let start = history.len().saturating_sub(HISTORY_WINDOW);
    let context = history[start..].join(" ");
    format!("Q: {context} {user_message}\n{ANSWER_MARKER}")
}
