//! Model providers for PocketLLM.
//!
//! All providers implement the `pocketllm_core::Provider` trait. At startup
//! [`acquire`] walks the configured candidates and installs the first model
//! that loads into a [`ModelHandle`].

pub mod acquire;
pub mod handle;
#[cfg(feature = "local")]
pub mod local;

pub use acquire::{DisabledLoader, ModelLoader, acquire};
pub use handle::ModelHandle;
#[cfg(feature = "local")]
pub use local::{LocalLoader, LocalProvider};

use std::sync::Arc;

/// The loader matching how this crate was built.
///
/// With the `local` feature, models are loaded through Candle; without it,
/// every load fails and the service starts in degraded mode.
pub fn default_loader(seed: u64) -> Arc<dyn ModelLoader> {
    #[cfg(feature = "local")]
    {
        Arc::new(LocalLoader::new(seed))
    }
    #[cfg(not(feature = "local"))]
    {
        tracing::warn!(seed, "Built without the `local` feature; no model can be loaded");
        Arc::new(DisabledLoader)
    }
}
