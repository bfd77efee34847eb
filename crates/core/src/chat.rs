//! The value object a chat turn produces.

use serde::Serialize;

/// Where a reply's text came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ReplySource {
    /// Generated by the loaded model and sanitized
    Model,
    /// Chosen by the keyword fallback responder
    Fallback,
}

/// A reply plus its follow-up suggestions. Built fresh for every request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ChatReply {
    pub reply_text: String,
    pub suggestions: Vec<String>,
    pub source: ReplySource,
}

impl ChatReply {
    pub fn is_fallback(&self) -> bool {
        self.source == ReplySource::Fallback
    }
}
