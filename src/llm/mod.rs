//! Exchange client abstraction.
//!
//! `LlmProvider` is an enum over concrete provider implementations.
//! Add a new variant + module in `providers/` for each additional backend.
//!
//! A provider is stateless: every [`LlmProvider::submit`] is a single
//! round-trip with exactly two outcomes, the normalized reply text or an
//! [`ExchangeError`]. Callers turn errors into display text with
//! [`ExchangeError::fallback_text`]; nothing here touches session history.

pub mod prompt;
pub mod providers;

use thiserror::Error;

/// Shown when no API key is configured. No request is sent.
pub const CONFIGURATION_FALLBACK: &str = "API key is missing! Please check your configuration.";
/// Shown when the request fails in transport, returns non-2xx, or is not JSON.
pub const TRANSPORT_FALLBACK: &str = "Failed to get a response. Please try again.";
/// Shown when the reply parses but carries no usable content.
pub const MALFORMED_FALLBACK: &str = "No response from AI.";

// ── Error ─────────────────────────────────────────────────────────────────────

#[derive(Debug, Error)]
pub enum ExchangeError {
    #[error("API key is missing: set the environment variable named by llm.gemini.api_key_env")]
    Configuration,
    #[error("provider request failed: {0}")]
    Transport(String),
    #[error("reply carried no usable content")]
    MalformedResponse,
}

impl ExchangeError {
    /// The user-visible text substituted for this failure.
    pub fn fallback_text(&self) -> &'static str {
        match self {
            ExchangeError::Configuration => CONFIGURATION_FALLBACK,
            ExchangeError::Transport(_) => TRANSPORT_FALLBACK,
            ExchangeError::MalformedResponse => MALFORMED_FALLBACK,
        }
    }
}

/// Collapse a submit outcome into the string shown to the user.
pub fn display_text(result: Result<String, ExchangeError>) -> String {
    match result {
        Ok(text) => text,
        Err(e) => e.fallback_text().to_string(),
    }
}

// ── Provider enum ─────────────────────────────────────────────────────────────

/// All available provider backends.
///
/// Enum dispatch avoids `dyn` trait objects and the `async-trait` dependency.
/// Adding a backend = new module + new variant + new `submit` arm.
#[derive(Debug, Clone)]
pub enum LlmProvider {
    Dummy(providers::dummy::DummyProvider),
    Gemini(providers::gemini::GeminiProvider),
}

impl LlmProvider {
    /// Send `prompt` to the provider and return its normalized text reply.
    pub async fn submit(&self, prompt: &str) -> Result<String, ExchangeError> {
        match self {
            LlmProvider::Dummy(p) => p.submit(prompt).await,
            LlmProvider::Gemini(p) => p.submit(prompt).await,
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            LlmProvider::Dummy(_) => "dummy",
            LlmProvider::Gemini(_) => "gemini",
        }
    }
}
