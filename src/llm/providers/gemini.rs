//! Gemini `generateContent` provider.
//!
//! Exposes a single `submit(&str) -> String` interface matching the rest of
//! the `LlmProvider` abstraction. All Gemini wire types are private to this
//! module. One call = one POST; no retry, no timeout beyond the transport
//! default, no cancellation.
//!
//! The reply's `content` field is polymorphic on the wire: either a plain
//! string or `{ "parts": [{ "text": .. }, ..] }` (`fragments` is accepted as
//! an alias). [`ReplyContent`] models both and [`ReplyContent::normalize`]
//! turns either into the display string.

use reqwest::Client;
use serde::{Deserialize, Serialize};
use tracing::{debug, error, trace, warn};

use crate::llm::prompt;
use crate::llm::ExchangeError;

// ── Credential ────────────────────────────────────────────────────────────────

/// Where the API key comes from. Resolved on every call, never cached.
#[derive(Debug, Clone)]
pub enum ApiKeySource {
    /// Read the named environment variable (populated from `.env` at startup).
    Env(String),
    /// A fixed value, or `None` for "not configured".
    Static(Option<String>),
}

impl ApiKeySource {
    /// Current key, or `None` when unset or empty.
    pub fn resolve(&self) -> Option<String> {
        let key = match self {
            ApiKeySource::Env(name) => std::env::var(name).ok(),
            ApiKeySource::Static(key) => key.clone(),
        };
        key.filter(|k| !k.trim().is_empty())
    }
}

// ── Public provider ───────────────────────────────────────────────────────────

/// Adapter for the Gemini `models/{model}:generateContent` endpoint.
///
/// Constructed once at startup, then cheaply cloned because
/// `reqwest::Client` is an `Arc` internally.
#[derive(Debug, Clone)]
pub struct GeminiProvider {
    client: Client,
    api_base_url: String,
    model: String,
    api_key: ApiKeySource,
}

impl GeminiProvider {
    pub fn new(
        api_base_url: String,
        model: String,
        api_key: ApiKeySource,
    ) -> Result<Self, ExchangeError> {
        let client = Client::builder()
            .build()
            .map_err(|e| ExchangeError::Transport(format!("failed to build HTTP client: {e}")))?;

        Ok(Self { client, api_base_url, model, api_key })
    }

    /// Endpoint URL without the key query parameter (safe to log).
    pub fn endpoint(&self) -> String {
        format!(
            "{}/{}:generateContent",
            self.api_base_url.trim_end_matches('/'),
            self.model
        )
    }

    /// Wrap `prompt` in the tutoring template, send it, and normalize the reply.
    pub async fn submit(&self, prompt: &str) -> Result<String, ExchangeError> {
        let Some(api_key) = self.api_key.resolve() else {
            warn!(model = %self.model, "no API key configured; request not sent");
            return Err(ExchangeError::Configuration);
        };

        let payload = GenerateContentRequest {
            contents: vec![RequestContent {
                parts: vec![RequestPart { text: prompt::render(prompt) }],
            }],
        };

        let url = self.endpoint();
        debug!(
            model = %self.model,
            prompt_len = prompt.len(),
            api_key_present = true,
            "sending generateContent request"
        );
        if tracing::enabled!(tracing::Level::TRACE) {
            let json = serde_json::to_string_pretty(&payload)
                .unwrap_or_else(|e| format!("<serialization failed: {e}>"));
            trace!(payload = %json, "full request payload");
        }

        let response = self
            .client
            .post(&url)
            .query(&[("key", api_key.as_str())])
            .json(&payload)
            .send()
            .await
            .map_err(|e| {
                // reqwest errors embed the URL; strip it so the key never reaches a log.
                let e = e.without_url();
                error!(%url, error = %e, "generateContent request failed (transport)");
                ExchangeError::Transport(e.to_string())
            })?;

        let response = check_status(response).await?;

        let body = response.text().await.map_err(|e| {
            let e = e.without_url();
            error!(error = %e, "failed to read response body");
            ExchangeError::Transport(format!("failed to read response body: {e}"))
        })?;

        trace!(response = %body, "full response payload");
        normalize_reply(&body)
    }
}

/// Parse a `generateContent` response body and normalize its first candidate.
fn normalize_reply(body: &str) -> Result<String, ExchangeError> {
    let parsed: GenerateContentResponse = serde_json::from_str(body).map_err(|e| {
        error!(error = %e, "response body is not a generateContent envelope");
        ExchangeError::Transport(format!("failed to parse response body: {e}"))
    })?;

    debug!(candidates = parsed.candidates.len(), "received generateContent response");

    let content = parsed
        .candidates
        .into_iter()
        .next()
        .and_then(|c| c.content)
        .and_then(ReplyContent::from_value);

    match content {
        Some(content) => content.normalize(),
        None => {
            warn!("response carried no candidate content");
            Err(ExchangeError::MalformedResponse)
        }
    }
}

// ── Reply content ─────────────────────────────────────────────────────────────

/// The two shapes a candidate's `content` takes on the wire.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(untagged)]
enum ReplyContent {
    Text(String),
    Parts(PartsContent),
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
struct PartsContent {
    #[serde(alias = "fragments")]
    parts: Vec<ReplyPart>,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
struct ReplyPart {
    #[serde(default)]
    text: Option<String>,
}

impl ReplyContent {
    /// Unrecognised shapes (numbers, objects without `parts`) count as absent.
    fn from_value(value: serde_json::Value) -> Option<Self> {
        serde_json::from_value(value).ok()
    }

    /// Plain text as-is; parts joined with single spaces. Empty → malformed.
    fn normalize(self) -> Result<String, ExchangeError> {
        let text = match self {
            ReplyContent::Text(text) => text,
            ReplyContent::Parts(content) => content
                .parts
                .into_iter()
                .filter_map(|p| p.text)
                .collect::<Vec<_>>()
                .join(" "),
        };
        if text.is_empty() {
            return Err(ExchangeError::MalformedResponse);
        }
        Ok(text)
    }
}

// ── Private wire types ────────────────────────────────────────────────────────

#[derive(Debug, Serialize)]
struct GenerateContentRequest {
    contents: Vec<RequestContent>,
}

#[derive(Debug, Serialize)]
struct RequestContent {
    parts: Vec<RequestPart>,
}

#[derive(Debug, Serialize)]
struct RequestPart {
    text: String,
}

#[derive(Debug, Deserialize)]
struct GenerateContentResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
}

#[derive(Debug, Deserialize)]
struct Candidate {
    #[serde(default)]
    content: Option<serde_json::Value>,
}

// Google API error envelope.
#[derive(Debug, Deserialize)]
struct ErrorEnvelope {
    error: ErrorBody,
}

#[derive(Debug, Deserialize)]
struct ErrorBody {
    message: String,
    #[serde(default)]
    status: Option<String>,
}

/// Consume the response and return it if successful, or a transport error.
async fn check_status(response: reqwest::Response) -> Result<reqwest::Response, ExchangeError> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }

    let body = response
        .text()
        .await
        .unwrap_or_else(|_| "<failed to read error body>".to_string());

    let message = match serde_json::from_str::<ErrorEnvelope>(&body) {
        Ok(env) => {
            let tag = env.error.status.map(|s| format!(" [{s}]")).unwrap_or_default();
            format!("HTTP {status}{tag}: {}", env.error.message)
        }
        Err(_) => format!("HTTP {status}: {body}"),
    };

    error!(%status, %message, "generateContent returned HTTP error");
    Err(ExchangeError::Transport(message))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn plain_string_content() {
        let body = r#"{"candidates":[{"content":"X"}]}"#;
        assert_eq!(normalize_reply(body).unwrap(), "X");
    }

    #[test]
    fn fragments_are_space_joined() {
        let body = r#"{"candidates":[{"content":{"fragments":[{"text":"A"},{"text":"B"}]}}]}"#;
        assert_eq!(normalize_reply(body).unwrap(), "A B");
    }

    #[test]
    fn gemini_parts_with_role() {
        let body = r#"{"candidates":[{"content":{"parts":[{"text":"こんにちは"},{"text":"means hello."}],"role":"model"},"finishReason":"STOP"}]}"#;
        assert_eq!(normalize_reply(body).unwrap(), "こんにちは means hello.");
    }

    #[test]
    fn parts_without_text_are_skipped() {
        let body = r#"{"candidates":[{"content":{"parts":[{"text":"A"},{"inlineData":{}},{"text":"C"}]}}]}"#;
        assert_eq!(normalize_reply(body).unwrap(), "A C");
    }

    #[test]
    fn empty_candidates_is_malformed() {
        let err = normalize_reply(r#"{"candidates":[]}"#).unwrap_err();
        assert!(matches!(err, ExchangeError::MalformedResponse));
        assert_eq!(err.fallback_text(), "No response from AI.");
    }

    #[test]
    fn missing_candidates_is_malformed() {
        let err = normalize_reply(r#"{"promptFeedback":{"blockReason":"SAFETY"}}"#).unwrap_err();
        assert!(matches!(err, ExchangeError::MalformedResponse));
    }

    #[test]
    fn null_or_odd_content_is_malformed() {
        for body in [
            r#"{"candidates":[{"content":null}]}"#,
            r#"{"candidates":[{}]}"#,
            r#"{"candidates":[{"content":42}]}"#,
            r#"{"candidates":[{"content":{"role":"model"}}]}"#,
        ] {
            let err = normalize_reply(body).unwrap_err();
            assert!(matches!(err, ExchangeError::MalformedResponse), "body: {body}");
        }
    }

    #[test]
    fn empty_text_is_malformed() {
        assert!(matches!(
            normalize_reply(r#"{"candidates":[{"content":""}]}"#),
            Err(ExchangeError::MalformedResponse)
        ));
        assert!(matches!(
            normalize_reply(r#"{"candidates":[{"content":{"parts":[]}}]}"#),
            Err(ExchangeError::MalformedResponse)
        ));
    }

    #[test]
    fn non_json_body_is_transport() {
        let err = normalize_reply("<html>502 Bad Gateway</html>").unwrap_err();
        assert!(matches!(err, ExchangeError::Transport(_)));
    }

    #[test]
    fn only_first_candidate_is_used() {
        let body = r#"{"candidates":[{"content":"first"},{"content":"second"}]}"#;
        assert_eq!(normalize_reply(body).unwrap(), "first");
    }

    #[test]
    fn request_body_shape() {
        let payload = GenerateContentRequest {
            contents: vec![RequestContent {
                parts: vec![RequestPart { text: prompt::render("sushi") }],
            }],
        };
        let v = serde_json::to_value(&payload).unwrap();
        let text = v["contents"][0]["parts"][0]["text"].as_str().unwrap();
        assert!(text.contains("User input: \"sushi\""));
        assert_eq!(v["contents"].as_array().unwrap().len(), 1);
    }

    #[test]
    fn endpoint_joins_model() {
        let p = GeminiProvider::new(
            "https://example.test/v1beta/models/".into(),
            "gemini-1.5-pro".into(),
            ApiKeySource::Static(None),
        )
        .unwrap();
        assert_eq!(
            p.endpoint(),
            "https://example.test/v1beta/models/gemini-1.5-pro:generateContent"
        );
    }

    #[test]
    fn blank_static_key_resolves_to_none() {
        assert_eq!(ApiKeySource::Static(Some("  ".into())).resolve(), None);
        assert_eq!(ApiKeySource::Static(None).resolve(), None);
        assert_eq!(
            ApiKeySource::Static(Some("k".into())).resolve().as_deref(),
            Some("k")
        );
    }

    #[test]
    fn unset_env_key_resolves_to_none() {
        let src = ApiKeySource::Env("NGK_BUDDY_TEST_DEFINITELY_UNSET_KEY".into());
        assert_eq!(src.resolve(), None);
    }

    #[tokio::test]
    async fn missing_key_fails_before_any_request() {
        // Port 9 (discard) would fail in transport if a request were attempted.
        let p = GeminiProvider::new(
            "http://127.0.0.1:9/v1beta/models".into(),
            "m".into(),
            ApiKeySource::Static(None),
        )
        .unwrap();
        let err = p.submit("hello").await.unwrap_err();
        assert!(matches!(err, ExchangeError::Configuration));
    }
}
