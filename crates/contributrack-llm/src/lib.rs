pub mod client;
pub mod config;
pub mod error;
pub mod prompts;
pub mod summarizer;

pub use client::{ChatModel, OllamaChat, OpenAiChat};
pub use config::{LlmBackend, LlmConfig};
pub use error::LlmError;
pub use summarizer::{Summarizer, parse_channel_analysis};
