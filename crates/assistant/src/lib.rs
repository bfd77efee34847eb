//! Chat reply pipeline for PocketLLM.
//!
//! [`ChatService`] is the piece the HTTP layer and the CLI share: it turns a
//! message plus history into a [`pocketllm_core::ChatReply`].

pub mod service;

pub use service::ChatService;
