//! What the request handler does when the model path fails.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Governs `ModelUnavailable`, generation failures and empty replies alike.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ModelUnavailablePolicy {
    /// Degraded mode: answer from the fallback responder.
    #[default]
    Fallback,
    /// Strict mode: surface an error to the caller.
    Error,
}

impl fmt::Display for ModelUnavailablePolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Fallback => f.write_str("fallback"),
            Self::Error => f.write_str("error"),
        }
    }
}

impl FromStr for ModelUnavailablePolicy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "fallback" => Ok(Self::Fallback),
            "error" => Ok(Self::Error),
            other => Err(format!(
                "unknown model-unavailable policy '{other}' (expected 'fallback' or 'error')"
            )),
        }
    }
}
