use std::sync::Arc;
use std::time::Duration;

use crate::client::{ChatModel, OllamaChat, OpenAiChat};
use crate::error::LlmError;

pub const DEFAULT_OPENAI_BASE: &str = "https://api.openai.com/v1";
pub const DEFAULT_OPENAI_MODEL: &str = "gpt-4";
pub const DEFAULT_OLLAMA_BASE: &str = "http://localhost:11434";
pub const DEFAULT_OLLAMA_MODEL: &str = "llama3.2";
const DEFAULT_MAX_TOKENS: u32 = 1000;
const DEFAULT_TIMEOUT_SECS: u64 = 120;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LlmBackend {
    /// OpenAI-compatible chat completions endpoint.
    Hosted {
        api_base: String,
        api_key: String,
        model: String,
        max_tokens: u32,
    },
    /// Ollama running next to the process, for data that must not leave the host.
    Local { base_url: String, model: String },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LlmConfig {
    pub backend: LlmBackend,
    pub request_timeout: Duration,
}

impl LlmConfig {
    pub fn from_env() -> Result<Self, LlmError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, LlmError> {
        let get = |key: &str| lookup(key).map(|v| v.trim().to_string()).filter(|v| !v.is_empty());

        let use_local = get("USE_LOCAL_LLM")
            .map(|v| matches!(v.to_ascii_lowercase().as_str(), "true" | "1" | "yes"))
            .unwrap_or(false);

        let backend = if use_local {
            LlmBackend::Local {
                base_url: get("OLLAMA_BASE_URL").unwrap_or_else(|| DEFAULT_OLLAMA_BASE.into()),
                model: get("OLLAMA_MODEL").unwrap_or_else(|| DEFAULT_OLLAMA_MODEL.into()),
            }
        } else {
            LlmBackend::Hosted {
                api_base: get("OPENAI_API_BASE").unwrap_or_else(|| DEFAULT_OPENAI_BASE.into()),
                api_key: get("OPENAI_API_KEY").ok_or(LlmError::MissingApiKey)?,
                model: get("OPENAI_MODEL").unwrap_or_else(|| DEFAULT_OPENAI_MODEL.into()),
                max_tokens: get("OPENAI_MAX_TOKENS")
                    .and_then(|v| v.parse().ok())
                    .unwrap_or(DEFAULT_MAX_TOKENS),
            }
        };

        let request_timeout = Duration::from_secs(
            get("LLM_TIMEOUT_SECS")
                .and_then(|v| v.parse().ok())
                .unwrap_or(DEFAULT_TIMEOUT_SECS),
        );

        Ok(Self {
            backend,
            request_timeout,
        })
    }

    pub fn build(&self) -> Result<Arc<dyn ChatModel>, LlmError> {
        let model: Arc<dyn ChatModel> = match &self.backend {
            LlmBackend::Hosted {
                api_base,
                api_key,
                model,
                max_tokens,
            } => Arc::new(OpenAiChat::new(
                api_base,
                api_key,
                model,
                *max_tokens,
                self.request_timeout,
            )?),
            LlmBackend::Local { base_url, model } => {
                Arc::new(OllamaChat::new(base_url, model, self.request_timeout)?)
            }
        };
        Ok(model)
    }
}
