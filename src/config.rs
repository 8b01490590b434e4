//! Configuration loading with env-var overrides.
//!
//! Reads `config/default.toml` relative to the current working directory
//! (or the path given with `-f`), then applies the `NGK_LOG_LEVEL` override.
//! The API credential never lives in TOML: `[llm.gemini].api_key_env` names
//! the environment variable it is read from at call time.

use std::{
    env, fs,
    path::Path,
};

use serde::Deserialize;

use crate::error::AppError;
use crate::logger;

pub const DEFAULT_CONFIG_PATH: &str = "config/default.toml";

/// PTY (console) channel configuration.
#[derive(Debug, Clone)]
pub struct PtyConfig {
    /// Whether the console channel is enabled.
    pub enabled: bool,
}

/// HTTP channel configuration.
#[derive(Debug, Clone)]
pub struct HttpConfig {
    /// Whether the HTTP channel is enabled.
    pub enabled: bool,
    /// Socket address to bind the HTTP channel to.
    pub bind: String,
}

/// Comms subsystem configuration.
#[derive(Debug, Clone)]
pub struct CommsConfig {
    pub pty: PtyConfig,
    pub http: HttpConfig,
}

/// Gemini `generateContent` provider configuration.
/// Populated from `[llm.gemini]` in the TOML.
#[derive(Debug, Clone)]
pub struct GeminiConfig {
    /// Models collection URL; the model name and `:generateContent` are appended.
    pub api_base_url: String,
    /// Model name interpolated into the endpoint path.
    pub model: String,
    /// Name of the environment variable holding the API key.
    pub api_key_env: String,
}

/// LLM configuration.
#[derive(Debug, Clone)]
pub struct LlmConfig {
    /// Which provider is active (`"gemini"` or `"dummy"`).
    pub provider: String,
    pub gemini: GeminiConfig,
}

/// Fully-resolved configuration.
#[derive(Debug, Clone)]
pub struct Config {
    pub app_name: String,
    pub log_level: String,
    pub comms: CommsConfig,
    pub llm: LlmConfig,
}

/// Raw TOML shape, the `serde` target before resolution.
#[derive(Deserialize)]
struct RawConfig {
    #[serde(default)]
    app: RawApp,
    #[serde(default)]
    comms: RawComms,
    #[serde(default)]
    llm: RawLlm,
}

#[derive(Deserialize)]
struct RawApp {
    #[serde(default = "default_app_name")]
    name: String,
    #[serde(default = "default_log_level")]
    log_level: String,
}

impl Default for RawApp {
    fn default() -> Self {
        Self { name: default_app_name(), log_level: default_log_level() }
    }
}

#[derive(Deserialize, Default)]
struct RawComms {
    #[serde(default)]
    pty: RawPty,
    #[serde(default)]
    http: RawHttp,
}

#[derive(Deserialize)]
struct RawPty {
    #[serde(default = "default_true")]
    enabled: bool,
}

impl Default for RawPty {
    fn default() -> Self {
        Self { enabled: true }
    }
}

#[derive(Deserialize)]
struct RawHttp {
    /// Defaults to `false`: HTTP must be explicitly enabled.
    #[serde(default = "default_false")]
    enabled: bool,
    #[serde(default = "default_http_bind")]
    bind: String,
}

impl Default for RawHttp {
    fn default() -> Self {
        Self { enabled: false, bind: default_http_bind() }
    }
}

#[derive(Deserialize)]
struct RawLlm {
    /// Maps to `default = "..."` in `[llm]`.
    #[serde(rename = "default", default = "default_llm_provider")]
    provider: String,
    #[serde(default)]
    gemini: RawGeminiConfig,
}

impl Default for RawLlm {
    fn default() -> Self {
        Self { provider: default_llm_provider(), gemini: RawGeminiConfig::default() }
    }
}

#[derive(Deserialize)]
struct RawGeminiConfig {
    #[serde(default = "default_gemini_api_base_url")]
    api_base_url: String,
    #[serde(default = "default_gemini_model")]
    model: String,
    #[serde(default = "default_gemini_api_key_env")]
    api_key_env: String,
}

impl Default for RawGeminiConfig {
    fn default() -> Self {
        Self {
            api_base_url: default_gemini_api_base_url(),
            model: default_gemini_model(),
            api_key_env: default_gemini_api_key_env(),
        }
    }
}

fn default_app_name() -> String { "ngk-buddy".to_string() }
fn default_log_level() -> String { "info".to_string() }
fn default_llm_provider() -> String { "gemini".to_string() }
fn default_gemini_api_base_url() -> String { "https://generativelanguage.googleapis.com/v1beta/models".to_string() }
fn default_gemini_model() -> String { "gemini-1.5-pro".to_string() }
fn default_gemini_api_key_env() -> String { "GEMINI_API_KEY".to_string() }
fn default_http_bind() -> String { "127.0.0.1:8080".to_string() }
fn default_true() -> bool { true }
fn default_false() -> bool { false }

/// Load config from `path` (default `config/default.toml`), then apply env-var overrides.
pub fn load(path: Option<&str>) -> Result<Config, AppError> {
    let log_level_override = env::var("NGK_LOG_LEVEL").ok();
    load_from(
        Path::new(path.unwrap_or(DEFAULT_CONFIG_PATH)),
        log_level_override.as_deref(),
    )
}

/// Internal loader. Accepts an explicit path and optional overrides.
/// Tests pass overrides directly instead of mutating env vars.
pub fn load_from(path: &Path, log_level_override: Option<&str>) -> Result<Config, AppError> {
    let raw = fs::read_to_string(path)
        .map_err(|e| AppError::Config(format!("cannot read {}: {e}", path.display())))?;
    parse(&raw, log_level_override)
        .map_err(|e| AppError::Config(format!("{e} in {}", path.display())))
}

fn parse(raw: &str, log_level_override: Option<&str>) -> Result<Config, String> {
    let parsed: RawConfig = toml::from_str(raw).map_err(|e| format!("parse error: {e}"))?;

    match parsed.llm.provider.as_str() {
        "gemini" | "dummy" => {}
        other => return Err(format!("unknown llm provider '{other}'")),
    }
    if parsed.llm.gemini.api_key_env.trim().is_empty() {
        return Err("llm.gemini.api_key_env must not be empty".to_string());
    }

    let log_level = log_level_override.unwrap_or(&parsed.app.log_level).to_string();
    logger::parse_level(&log_level).map_err(|e| e.to_string())?;

    Ok(Config {
        app_name: parsed.app.name,
        log_level,
        comms: CommsConfig {
            pty: PtyConfig { enabled: parsed.comms.pty.enabled },
            http: HttpConfig {
                enabled: parsed.comms.http.enabled,
                bind: parsed.comms.http.bind,
            },
        },
        llm: LlmConfig {
            provider: parsed.llm.provider,
            gemini: GeminiConfig {
                api_base_url: parsed.llm.gemini.api_base_url,
                model: parsed.llm.gemini.model,
                api_key_env: parsed.llm.gemini.api_key_env,
            },
        },
    })
}

// ── test helpers ──────────────────────────────────────────────────────────────

#[cfg(test)]
impl Config {
    /// Offline `Config` for unit tests: dummy provider, no channels.
    pub fn test_default() -> Self {
        Self {
            app_name: "test".into(),
            log_level: "info".into(),
            comms: CommsConfig {
                pty: PtyConfig { enabled: false },
                http: HttpConfig { enabled: false, bind: default_http_bind() },
            },
            llm: LlmConfig {
                provider: "dummy".into(),
                gemini: GeminiConfig {
                    api_base_url: "http://127.0.0.1:0/v1beta/models".into(),
                    model: "test-model".into(),
                    api_key_env: "NGK_TEST_UNSET_KEY".into(),
                },
            },
        }
    }
}
