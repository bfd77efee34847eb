//! # PocketLLM Core
//!
//! Domain types, traits, and the pure stages of the response pipeline.
//! This crate has **no framework dependencies**; the inference runtime,
//! HTTP layer and configuration all live in their own crates.
//!
//! ## Pipeline
//!
//! ```text
//! message + history ─▶ prompt::build_prompt ─▶ Provider::complete
//!                                                  │
//!                 sanitize::sanitize ◀─────────────┘
//!                         │ (failure) ─▶ fallback::fallback_reply
//!                         ▼
//!                 suggest::suggest ─▶ ChatReply
//! ```

pub mod chat;
pub mod error;
pub mod fallback;
pub mod policy;
pub mod prompt;
pub mod provider;
pub mod sanitize;
pub mod suggest;

// Re-export key types at crate root for ergonomics
pub use chat::{ChatReply, ReplySource};
pub use error::{ProviderError, ReplyFailure};
pub use fallback::{FallbackTopic, fallback_reply};
pub use policy::ModelUnavailablePolicy;
pub use prompt::build_prompt;
pub use provider::{GenerationRequest, GenerationResponse, Provider, SamplingConfig, Usage};
pub use sanitize::sanitize;
pub use suggest::suggest;
