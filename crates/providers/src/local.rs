//! Local inference provider — runs GGUF models directly on the CPU.
//!
//! Uses [Candle](https://github.com/huggingface/candle) (Rust-native ML) to
//! run quantized Llama and Qwen2 GGUF models. Weights and tokenizers are fetched
//! from the HuggingFace Hub on first use and cached there.
//!
//! Supported presets:
//! - **SmolLM** (135M–1.7B params, Q4 ~80–950 MB) — the default primary
//! - **Qwen2** (0.5B–1.5B params) — the default fallback
//! - **TinyLlama** (1.1B params, Q4_K_M ~670 MB)
//!
//! Any other identifier is treated as a path to a local `.gguf` file with a
//! `tokenizer.json` next to it.

use async_trait::async_trait;
use candle_core::quantized::gguf_file;
use candle_core::{DType, Device, Tensor};
use candle_transformers::generation::LogitsProcessor;
use candle_transformers::models::quantized_llama as qlm;
use candle_transformers::models::quantized_qwen2 as qwen2;
use candle_transformers::utils::apply_repeat_penalty;
use hf_hub::api::sync::Api;
use pocketllm_core::error::ProviderError;
use pocketllm_core::provider::{
    GenerationRequest, GenerationResponse, Provider, SamplingConfig, Usage,
};
use std::path::Path;
use std::sync::Arc;
use tokenizers::{PaddingParams, Tokenizer};
use tokio::sync::Mutex;
use tracing::{debug, info};

use crate::acquire::ModelLoader;

// ── Well-known model aliases ───────────────────────────────────────────

/// Friendly aliases that resolve to HuggingFace repos + filenames.
struct ModelPreset {
    repo: &'static str,
    gguf_file: &'static str,
    tokenizer_repo: &'static str,
    arch: Architecture,
}

fn resolve_preset(alias: &str) -> Option<ModelPreset> {
    let alias_lower = alias.to_lowercase();
    match alias_lower.as_str() {
        "smollm" | "smollm:135m" | "smollm-135m" => Some(ModelPreset {
            repo: "TheBloke/SmolLM-135M-Instruct-GGUF",
            gguf_file: "smollm-135m-instruct.Q4_K_M.gguf",
            arch: Architecture::Llama,
            tokenizer_repo: "HuggingFaceTB/SmolLM-135M-Instruct",
        }),
        "smollm:360m" | "smollm-360m" => Some(ModelPreset {
            repo: "TheBloke/SmolLM-360M-Instruct-GGUF",
            gguf_file: "smollm-360m-instruct.Q4_K_M.gguf",
            arch: Architecture::Llama,
            tokenizer_repo: "HuggingFaceTB/SmolLM-360M-Instruct",
        }),
        "smollm:1.7b" | "smollm-1.7b" => Some(ModelPreset {
            repo: "TheBloke/SmolLM-1.7B-Instruct-GGUF",
            gguf_file: "smollm-1.7b-instruct.Q4_K_M.gguf",
            arch: Architecture::Llama,
            tokenizer_repo: "HuggingFaceTB/SmolLM-1.7B-Instruct",
        }),
        "qwen:0.5b" | "qwen-0.5b" | "qwen2-0.5b" => Some(ModelPreset {
            repo: "Qwen/Qwen2-0.5B-Instruct-GGUF",
            gguf_file: "qwen2-0_5b-instruct-q4_k_m.gguf",
            arch: Architecture::Qwen2,
            tokenizer_repo: "Qwen/Qwen2-0.5B-Instruct",
        }),
        "qwen:1.5b" | "qwen-1.5b" | "qwen2-1.5b" => Some(ModelPreset {
            repo: "Qwen/Qwen2-1.5B-Instruct-GGUF",
            gguf_file: "qwen2-1_5b-instruct-q4_k_m.gguf",
            arch: Architecture::Qwen2,
            tokenizer_repo: "Qwen/Qwen2-1.5B-Instruct",
        }),
        "tinyllama" | "tiny-llama" | "tinyllama-1.1b" => Some(ModelPreset {
            repo: "TheBloke/TinyLlama-1.1B-Chat-v1.0-GGUF",
            gguf_file: "tinyllama-1.1b-chat-v1.0.Q4_K_M.gguf",
            arch: Architecture::Llama,
            tokenizer_repo: "TinyLlama/TinyLlama-1.1B-Chat-v1.0",
        }),
        _ => None,
    }
}

// ── Architectures ──────────────────────────────────────────────────────

/// GGUF architectures this provider can run, keyed by `general.architecture`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Architecture {
    Llama,
    Qwen2,
}

impl Architecture {
    fn gguf_name(self) -> &'static str {
        match self {
            Self::Llama => "llama",
            Self::Qwen2 => "qwen2",
        }
    }

    fn detect(gguf: &gguf_file::Content) -> Result<Self, ProviderError> {
        let name = gguf
            .metadata
            .get("general.architecture")
            .and_then(|v| v.to_string().ok())
            .ok_or_else(|| {
                ProviderError::NotConfigured("GGUF file has no general.architecture".into())
            })?;

        match name.as_str() {
            "llama" => Ok(Self::Llama),
            "qwen2" => Ok(Self::Qwen2),
            other => Err(ProviderError::NotConfigured(format!(
                "Unsupported GGUF architecture '{other}' (expected llama or qwen2)"
            ))),
        }
    }
}

/// Quantized weights for one of the supported architectures.
enum ModelWeights {
    Llama(qlm::ModelWeights),
    Qwen2(qwen2::ModelWeights),
}

impl ModelWeights {
    fn from_gguf(
        arch: Architecture,
        gguf: gguf_file::Content,
        file: &mut std::fs::File,
        device: &Device,
    ) -> candle_core::Result<Self> {
        match arch {
            Architecture::Llama => qlm::ModelWeights::from_gguf(gguf, file, device).map(Self::Llama),
            Architecture::Qwen2 => {
                qwen2::ModelWeights::from_gguf(gguf, file, device).map(Self::Qwen2)
            }
        }
    }

    /// Logits for the last position, shape `(batch, vocab)`.
    fn forward(&mut self, input: &Tensor, index_pos: usize) -> candle_core::Result<Tensor> {
        match self {
            Self::Llama(model) => model.forward(input, index_pos),
            Self::Qwen2(model) => model.forward(input, index_pos),
        }
    }
}

/// End-of-sequence tokens in the order they are looked up.
const EOS_CANDIDATES: [&str; 4] = ["</s>", "<|endoftext|>", "<|im_end|>", "<|eot_id|>"];

// ── Loader ─────────────────────────────────────────────────────────────

/// Loads presets or `.gguf` paths into [`LocalProvider`]s.
pub struct LocalLoader {
    seed: u64,
}

impl LocalLoader {
    pub fn new(seed: u64) -> Self {
        Self { seed }
    }
}

impl ModelLoader for LocalLoader {
    fn load(&self, model: &str) -> Result<Arc<dyn Provider>, ProviderError> {
        let provider = LocalProvider::load(model, self.seed)?;
        Ok(Arc::new(provider))
    }
}

// ── Local Provider ─────────────────────────────────────────────────────

/// A provider that runs a GGUF-quantized language model locally via Candle.
///
/// The weights sit behind a Mutex because a forward pass mutates the KV cache.
pub struct LocalProvider {
    inner: Arc<Mutex<LocalModelState>>,
    name: String,
    seed: u64,
}

/// The loaded model state (tokenizer + weights).
struct LocalModelState {
    model: ModelWeights,
    tokenizer: Tokenizer,
    device: Device,
    eos_token_id: u32,
}

impl LocalProvider {
    /// Eagerly load the model (downloads if needed, then loads into memory).
    ///
    /// `model_name` is a preset alias (`"smollm:135m"`, `"qwen:0.5b"`) or a
    /// path to a local `.gguf` file.
    pub fn load(model_name: &str, seed: u64) -> Result<Self, ProviderError> {
        let state = LocalModelState::load(model_name)?;
        Ok(Self {
            inner: Arc::new(Mutex::new(state)),
            name: format!("local/{model_name}"),
            seed,
        })
    }
}

impl LocalModelState {
    fn load(model_name: &str) -> Result<Self, ProviderError> {
        let device = Device::Cpu;

        if Path::new(model_name).exists() && model_name.ends_with(".gguf") {
            return Self::load_from_path(Path::new(model_name), &device);
        }

        let preset = resolve_preset(model_name).ok_or_else(|| {
            ProviderError::ModelNotFound(format!(
                "Unknown local model '{}'. Available presets: smollm, smollm:135m, \
                 smollm:360m, smollm:1.7b, qwen:0.5b, qwen:1.5b, tinyllama. \
                 Or provide a path to a .gguf file.",
                model_name
            ))
        })?;

        info!(
            model = model_name,
            repo = preset.repo,
            file = preset.gguf_file,
            "Downloading/loading local model"
        );

        let api = Api::new().map_err(|e| {
            ProviderError::Network(format!("Failed to initialize HuggingFace Hub API: {e}"))
        })?;

        let model_path = api.model(preset.repo.to_string()).get(preset.gguf_file).map_err(|e| {
            ProviderError::Network(format!(
                "Failed to download model '{}' from '{}': {e}",
                preset.gguf_file, preset.repo
            ))
        })?;

        let tokenizer_path = api
            .model(preset.tokenizer_repo.to_string())
            .get("tokenizer.json")
            .map_err(|e| {
                ProviderError::Network(format!(
                    "Failed to download tokenizer from '{}': {e}",
                    preset.tokenizer_repo
                ))
            })?;

        let tokenizer = Tokenizer::from_file(&tokenizer_path)
            .map_err(|e| ProviderError::NotConfigured(format!("Failed to load tokenizer: {e}")))?;

        Self::assemble(&model_path, tokenizer, &device)
    }

    /// Load from an explicit GGUF file path; `tokenizer.json` must sit beside it.
    fn load_from_path(path: &Path, device: &Device) -> Result<Self, ProviderError> {
        info!(path = %path.display(), "Loading local GGUF model");

        let tokenizer_path = path.with_file_name("tokenizer.json");
        let tokenizer = Tokenizer::from_file(&tokenizer_path).map_err(|e| {
            ProviderError::NotConfigured(format!(
                "Failed to load tokenizer from {}: {e}",
                tokenizer_path.display()
            ))
        })?;

        Self::assemble(path, tokenizer, device)
    }

    fn assemble(
        model_path: &Path,
        mut tokenizer: Tokenizer,
        device: &Device,
    ) -> Result<Self, ProviderError> {
        let mut file = std::fs::File::open(model_path)
            .map_err(|e| ProviderError::NotConfigured(format!("Failed to open model file: {e}")))?;

        let gguf = gguf_file::Content::read(&mut file)
            .map_err(|e| ProviderError::NotConfigured(format!("Failed to parse GGUF file: {e}")))?;

        let arch = Architecture::detect(&gguf)?;
        let model = ModelWeights::from_gguf(arch, gguf, &mut file, device).map_err(|e| {
            ProviderError::NotConfigured(format!(
                "Failed to load {} model weights: {e}",
                arch.gguf_name()
            ))
        })?;

        let eos_token_id = EOS_CANDIDATES
            .iter()
            .find_map(|tok| tokenizer.token_to_id(tok))
            .unwrap_or(2);

        ensure_padding(&mut tokenizer, eos_token_id);

        info!(
            eos_token_id,
            arch = arch.gguf_name(),
            path = %model_path.display(),
            "Local model loaded"
        );

        Ok(Self {
            model,
            tokenizer,
            device: device.clone(),
            eos_token_id,
        })
    }

    /// Tokenize → sample up to `max_new_tokens` → decode prompt + continuation.
    fn generate(
        &mut self,
        prompt: &str,
        sampling: &SamplingConfig,
        seed: u64,
    ) -> Result<(String, u32, u32), ProviderError> {
        let encoding = self
            .tokenizer
            .encode(prompt, true)
            .map_err(|e| ProviderError::Tokenization(e.to_string()))?;

        let prompt_tokens = encoding.get_ids().to_vec();
        let prompt_token_count = prompt_tokens.len() as u32;

        debug!(
            prompt_tokens = prompt_token_count,
            max_new_tokens = sampling.max_new_tokens,
            temperature = sampling.temperature,
            top_p = sampling.top_p,
            "Starting local generation"
        );

        let mut logits_processor = if sampling.do_sample {
            LogitsProcessor::new(seed, Some(sampling.temperature), Some(sampling.top_p))
        } else {
            LogitsProcessor::new(seed, None, None)
        };

        let mut all_tokens = prompt_tokens.clone();
        let mut input = Tensor::new(prompt_tokens.as_slice(), &self.device)
            .and_then(|t| t.unsqueeze(0))
            .map_err(map_candle_err)?;
        let mut index_pos = 0;

        for _ in 0..sampling.max_new_tokens {
            let step_len = input.dim(1).map_err(map_candle_err)?;
            let logits = self
                .model
                .forward(&input, index_pos)
                .and_then(|l| l.squeeze(0))
                .and_then(|l| l.to_dtype(DType::F32))
                .map_err(map_candle_err)?;
            index_pos += step_len;

            let logits = if sampling.repetition_penalty == 1.0 {
                logits
            } else {
                apply_repeat_penalty(&logits, sampling.repetition_penalty, &all_tokens)
                    .map_err(map_candle_err)?
            };

            let next_token = logits_processor.sample(&logits).map_err(map_candle_err)?;
            if next_token == self.eos_token_id {
                break;
            }
            all_tokens.push(next_token);

            input = Tensor::new(&[next_token][..], &self.device)
                .and_then(|t| t.unsqueeze(0))
                .map_err(map_candle_err)?;
        }

        let completion_token_count = all_tokens.len() as u32 - prompt_token_count;

        let output = self
            .tokenizer
            .decode(&all_tokens, true)
            .map_err(|e| ProviderError::Generation(format!("Detokenization failed: {e}")))?;

        debug!(
            completion_tokens = completion_token_count,
            output_len = output.len(),
            "Generation complete"
        );

        Ok((output, prompt_token_count, completion_token_count))
    }
}

/// Give the tokenizer a padding token if it has none, reusing EOS.
fn ensure_padding(tokenizer: &mut Tokenizer, eos_token_id: u32) {
    if tokenizer.get_padding().is_some() {
        return;
    }
    let pad_token = tokenizer.id_to_token(eos_token_id).unwrap_or_default();
    debug!(pad_token = %pad_token, "Tokenizer has no padding token, using EOS");
    tokenizer.with_padding(Some(PaddingParams {
        pad_id: eos_token_id,
        pad_token,
        ..PaddingParams::default()
    }));
}

fn map_candle_err(e: candle_core::Error) -> ProviderError {
    ProviderError::Generation(format!("Candle inference error: {e}"))
}

// ── Provider trait implementation ──────────────────────────────────────

#[async_trait]
impl Provider for LocalProvider {
    fn name(&self) -> &str {
        &self.name
    }

    async fn complete(
        &self,
        request: GenerationRequest,
    ) -> std::result::Result<GenerationResponse, ProviderError> {
        let inner = self.inner.clone();
        let seed = self.seed;

        // Candle is CPU-bound; keep it off the async workers
        let (text, prompt_tokens, completion_tokens) = tokio::task::spawn_blocking(move || {
            let mut state = inner.blocking_lock();
            state.generate(&request.prompt, &request.sampling, seed)
        })
        .await
        .map_err(|e| ProviderError::Generation(format!("Inference task panicked: {e}")))??;

        Ok(GenerationResponse {
            text,
            usage: Some(Usage {
                prompt_tokens,
                completion_tokens,
            }),
            model: self.name.clone(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;

    #[test]
    fn resolve_preset_aliases() {
        assert!(resolve_preset("smollm:135m").is_some());
        assert!(resolve_preset("SmolLM").is_some());
        assert!(resolve_preset("qwen:0.5b").is_some());
        assert!(resolve_preset("tinyllama").is_some());
        assert!(resolve_preset("nonexistent").is_none());
    }

    const PRESET_ALIASES: [&str; 6] = [
        "smollm:135m",
        "smollm:360m",
        "smollm:1.7b",
        "qwen:0.5b",
        "qwen:1.5b",
        "tinyllama",
    ];

    fn gguf_with_architecture(arch: &str) -> gguf_file::Content {
        let value = gguf_file::Value::String(arch.to_string());
        let mut buf = std::io::Cursor::new(Vec::new());
        gguf_file::write(&mut buf, &[("general.architecture", &value)], &[]).unwrap();
        buf.set_position(0);
        gguf_file::Content::read(&mut buf).unwrap()
    }

    fn word_level_tokenizer() -> Tokenizer {
        let json = r#"{
            "version": "1.0",
            "truncation": null,
            "padding": null,
            "added_tokens": [],
            "normalizer": null,
            "pre_tokenizer": null,
            "post_processor": null,
            "decoder": null,
            "model": {
                "type": "WordLevel",
                "vocab": {"[UNK]": 0, "hello": 1, "</s>": 2},
                "unk_token": "[UNK]"
            }
        }"#;
        Tokenizer::from_str(json).unwrap()
    }

    #[test]
    fn presets_map_to_their_architecture() {
        assert_eq!(resolve_preset("smollm:135m").unwrap().arch, Architecture::Llama);
        assert_eq!(resolve_preset("qwen:0.5b").unwrap().arch, Architecture::Qwen2);
        assert_eq!(resolve_preset("tinyllama").unwrap().arch, Architecture::Llama);
    }

    #[test]
    fn every_preset_architecture_is_accepted() {
        for alias in PRESET_ALIASES {
            let preset = resolve_preset(alias).unwrap();
            let gguf = gguf_with_architecture(preset.arch.gguf_name());
            assert_eq!(Architecture::detect(&gguf).unwrap(), preset.arch, "{alias}");
        }
    }

    #[test]
    fn unsupported_architecture_is_rejected() {
        let gguf = gguf_with_architecture("phi3");
        let err = Architecture::detect(&gguf).unwrap_err();
        assert!(matches!(err, ProviderError::NotConfigured(ref m) if m.contains("phi3")));
    }

    #[test]
    fn missing_padding_is_filled_with_eos() {
        let mut tokenizer = word_level_tokenizer();
        assert!(tokenizer.get_padding().is_none());

        let eos = tokenizer.token_to_id("</s>").unwrap();
        ensure_padding(&mut tokenizer, eos);

        let padding = tokenizer.get_padding().unwrap();
        assert_eq!(padding.pad_id, eos);
        assert_eq!(padding.pad_token, "</s>");
    }

    #[test]
    fn existing_padding_is_kept() {
        let mut tokenizer = word_level_tokenizer();
        tokenizer.with_padding(Some(PaddingParams {
            pad_id: 1,
            pad_token: "hello".into(),
            ..PaddingParams::default()
        }));

        ensure_padding(&mut tokenizer, 2);

        let padding = tokenizer.get_padding().unwrap();
        assert_eq!(padding.pad_id, 1);
        assert_eq!(padding.pad_token, "hello");
    }

    #[test]
    fn unknown_model_is_not_found() {
        let err = LocalModelState::load("definitely-not-a-model").err().unwrap();
        assert!(matches!(err, ProviderError::ModelNotFound(_)));
    }
}
