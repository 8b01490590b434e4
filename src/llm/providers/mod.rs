//! LLM provider implementations.
//!
//! `build(config)` is the factory, called at startup.
//! Adding a new backend = new module + new match arm.

pub mod dummy;
pub mod gemini;

use crate::config::LlmConfig;
use crate::error::AppError;
use crate::llm::LlmProvider;

use gemini::{ApiKeySource, GeminiProvider};

/// Construct a `LlmProvider` from config.
///
/// The Gemini key is not read here: the provider resolves it from the
/// configured environment variable on every call.
pub fn build(config: &LlmConfig) -> Result<LlmProvider, AppError> {
    match config.provider.as_str() {
        "dummy" => Ok(LlmProvider::Dummy(dummy::DummyProvider)),
        "gemini" => {
            let g = &config.gemini;
            let p = GeminiProvider::new(
                g.api_base_url.clone(),
                g.model.clone(),
                ApiKeySource::Env(g.api_key_env.clone()),
            )
            .map_err(|e| AppError::Config(e.to_string()))?;
            Ok(LlmProvider::Gemini(p))
        }
        other => Err(AppError::Config(format!("unknown llm provider: {other}"))),
    }
}
