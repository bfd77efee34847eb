//! Turns raw decoded model output into a clean, bounded reply.
//!
//! The model echoes the prompt back, often runs past the end of a sentence,
//! and has no notion of a length limit. The steps here are deterministic and
//! run in a fixed order; see [`sanitize`].

use crate::error::ReplyFailure;
use crate::prompt::ANSWER_MARKER;

/// Longest reply, in characters, before the ellipsis is appended.
pub const MAX_REPLY_CHARS: usize = 200;

/// Appended to replies cut at [`MAX_REPLY_CHARS`].
pub const ELLIPSIS: &str = "...";

/// A trailing fragment shorter than this is treated as a cut-off sentence.
const MIN_TRAILING_FRAGMENT: usize = 10;

/// Extract the assistant's answer from `raw` and bound it.
///
/// 1. Take the text after the last `"A:"`, or everything past the prompt when
///    the marker is gone.
/// 2. Trim; an empty result is [`ReplyFailure::EmptyResponse`].
/// 3. Drop a short trailing fragment after the last `.`.
/// 4. Cap at [`MAX_REPLY_CHARS`] characters plus [`ELLIPSIS`].
pub fn sanitize(raw: &str, prompt: &str) -> Result<String, ReplyFailure> {
    let answer = extract_answer(raw, prompt).trim();
    if answer.is_empty() {
        return Err(ReplyFailure::EmptyResponse);
    }

    let answer = drop_trailing_fragment(answer);
    Ok(truncate(answer))
}

fn extract_answer<'a>(raw: &'a str, prompt: &str) -> &'a str {
    if let Some(idx) = raw.rfind(ANSWER_MARKER) {
        return &raw[idx + ANSWER_MARKER.len()..];
    }

    // Offset is measured in characters; decoding may not reproduce the
    // prompt byte for byte.
    let skip = prompt.chars().count();
    match raw.char_indices().nth(skip) {
        Some((byte_idx, _)) => &raw[byte_idx..],
        None => "",
    }
}

fn drop_trailing_fragment(answer: &str) -> String {
    let segments: Vec<&str> = answer.split('.').collect();
    match segments.split_last() {
        Some((last, rest))
            if !rest.is_empty() && last.trim().chars().count() < MIN_TRAILING_FRAGMENT =>
        {
            let mut kept = rest.join(".");
            kept.push('.');
            kept
        }
        _ => answer.to_string(),
    }
}

fn truncate(answer: String) -> String {
    match answer.char_indices().nth(MAX_REPLY_CHARS) {
        Some((byte_idx, _)) => {
            let mut cut = answer[..byte_idx].to_string();
            cut.push_str(ELLIPSIS);
            cut
        }
        None => answer,
    }
}
