//! Context-aware reply suggestions for incoming text messages.
//!
//! `replycraft` turns a pasted message plus optional context (tone, sender,
//! relationship vibe, timing, mood, goal, free text) into a prompt for a
//! hosted language model, and parses the model's answer into a list of
//! short reply suggestions, in English or Hinglish.
//!
//! # Getting started
//!
//! ```ignore
//! use replycraft::prelude::*;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let api_key = std::env::var("OPENROUTER_KEY")?;
//!     let generator = OpenRouterGenerator::new(
//!         OpenRouterClient::new(api_key)?,
//!         GeneratorConfig::default(),
//!     );
//!
//!     let request = ReplyRequest::validate(&serde_json::json!({
//!         "message": "hey what's up",
//!         "tone": "funny",
//!     }))?;
//!     let prompt = ReplyPrompt::new().render(&request);
//!
//!     for reply in generator.generate(&prompt).await?.replies {
//!         println!("{reply}");
//!     }
//!     Ok(())
//! }
//! ```
//!
//! # Where to find things
//!
//! - **Request shape and validation:** [`ReplyRequest`](request::ReplyRequest),
//!   the field enums, and [`InputDiagnostics`](request::InputDiagnostics) in
//!   [`request`].
//! - **Prompt text:** [`ReplyPrompt`](prompt::ReplyPrompt) renders a request;
//!   [`PromptRegistry`](prompt::PromptRegistry) and
//!   [`PromptBuilder`](prompt::PromptBuilder) are the generic pieces under it.
//! - **Calling the model:** the [`ReplyGenerator`](generation::ReplyGenerator)
//!   trait is the seam; [`OpenRouterGenerator`](generation::OpenRouterGenerator)
//!   implements it on top of [`OpenRouterClient`].
//!
//! The HTTP gateway (auth, rate limiting, status mapping) lives in the
//! `replycraft-web` crate.

pub mod error;
pub mod generation;
pub mod prelude;
pub mod prompt;
pub mod request;

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use std::time::{Duration, Instant};
use tracing::{debug, trace};

pub use error::GenerationError;

// Re-export schemars for downstream crates.
pub use schemars;

// ── Constants ──────────────────────────────────────────────────────

pub const OPENROUTER_URL: &str = "https://openrouter.ai/api/v1/chat/completions";

/// Default model for reply generation.
pub const DEFAULT_MODEL: &str = "google/gemini-2.0-flash-001";

/// Default HTTP timeout for a single chat completion.
pub const DEFAULT_HTTP_TIMEOUT: Duration = Duration::from_secs(60);

const ATTRIBUTION_REFERER: &str = "https://github.com/replycraft";
const ATTRIBUTION_TITLE: &str = "replycraft";

// ── Schema generation ──────────────────────────────────────────────

/// Generate a JSON Schema `serde_json::Value` from a type that implements
/// `schemars::JsonSchema`.
///
/// # Example
///
/// ```
/// use replycraft::json_schema_for;
/// use replycraft::request::ReplyResponse;
///
/// let schema = json_schema_for::<ReplyResponse>();
/// assert_eq!(schema["type"], "object");
/// assert!(schema["required"].as_array().unwrap().contains(&"replies".into()));
/// ```
pub fn json_schema_for<T: JsonSchema>() -> serde_json::Value {
    let schema = schemars::schema_for!(T);
    serde_json::to_value(schema)
        .unwrap_or_else(|_| serde_json::json!({"type": "object", "properties": {}}))
}

// ── Request types ──────────────────────────────────────────────────

/// Chat completion request body. Unused optional fields are omitted from
/// serialization.
#[derive(Serialize, Debug, Default)]
pub struct ChatRequest {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub model: Option<String>,

    pub messages: Vec<Message>,

    #[serde(skip_serializing_if = "is_zero_u32")]
    pub max_tokens: u32,
    #[serde(skip_serializing_if = "is_zero_f32")]
    pub temperature: f32,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub response_format: Option<ResponseFormat>,
}

fn is_zero_u32(v: &u32) -> bool {
    *v == 0
}
fn is_zero_f32(v: &f32) -> bool {
    *v == 0.0
}

/// JSON output format type.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, Eq)]
pub enum ResponseFormatType {
    #[serde(rename = "json_schema")]
    JsonSchema,
}

/// Structured output mode.
#[derive(Serialize, Debug)]
pub struct ResponseFormat {
    #[serde(rename = "type")]
    pub fmt_type: ResponseFormatType,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub json_schema: Option<JsonSchemaFormat>,
}

impl ResponseFormat {
    /// Ask for output conforming to `schema`.
    pub fn json_schema(name: impl Into<String>, schema: serde_json::Value) -> Self {
        Self {
            fmt_type: ResponseFormatType::JsonSchema,
            json_schema: Some(JsonSchemaFormat {
                name: name.into(),
                strict: false,
                schema,
            }),
        }
    }
}

/// Named schema declaration inside a `json_schema` response format.
#[derive(Serialize, Debug)]
pub struct JsonSchemaFormat {
    pub name: String,
    pub strict: bool,
    pub schema: serde_json::Value,
}

// ── Message types ──────────────────────────────────────────────────

/// Role of a message in the conversation.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum MessageRole {
    User,
}

/// A message in the conversation.
#[derive(Serialize, Deserialize, Clone, Debug)]
pub struct Message {
    pub role: MessageRole,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub content: Option<String>,
}

impl Message {
    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: MessageRole::User,
            content: Some(content.into()),
        }
    }
}

// ── Response types ─────────────────────────────────────────────────

/// Raw API response (internal deserialization target).
#[derive(Deserialize, Debug)]
struct RawChatResponse {
    choices: Option<Vec<RawChoice>>,
    error: Option<ApiErrorResponse>,
    #[serde(default)]
    usage: Option<UsageInfo>,
}

#[derive(Deserialize, Debug)]
struct RawChoice {
    message: RawResponseMessage,
    finish_reason: Option<String>,
}

#[derive(Deserialize, Debug)]
struct RawResponseMessage {
    content: Option<String>,
}

#[derive(Deserialize, Debug)]
struct ApiErrorResponse {
    message: String,
}

/// Clean return type from [`OpenRouterClient::chat`].
#[derive(Debug)]
pub struct ChatCompletion {
    pub content: Option<String>,
    pub usage: Option<UsageInfo>,
    pub finish_reason: Option<String>,
}

/// Token usage statistics.
#[derive(Deserialize, Debug, Clone)]
pub struct UsageInfo {
    pub prompt_tokens: Option<u32>,
    pub completion_tokens: Option<u32>,
    pub total_tokens: Option<u32>,
}

/// Decode a raw chat-completions body.
fn parse_chat_response(text: &str) -> Result<ChatCompletion, GenerationError> {
    let parsed: RawChatResponse = serde_json::from_str(text)
        .map_err(|e| GenerationError::Malformed(format!("failed to parse response: {e}")))?;

    if let Some(err) = parsed.error {
        return Err(GenerationError::Api(err.message));
    }

    if let Some(ref usage) = parsed.usage {
        debug!(
            "Token usage: prompt={}, completion={}, total={}",
            usage.prompt_tokens.unwrap_or(0),
            usage.completion_tokens.unwrap_or(0),
            usage.total_tokens.unwrap_or(0),
        );
    }

    match parsed.choices.and_then(|c| c.into_iter().next()) {
        Some(c) => {
            debug!(
                "LLM output: {} chars, finish_reason={:?}",
                c.message.content.as_ref().map_or(0, |s| s.len()),
                c.finish_reason
            );
            Ok(ChatCompletion {
                content: c.message.content,
                usage: parsed.usage,
                finish_reason: c.finish_reason,
            })
        }
        None => {
            debug!("LLM output: empty (no choices)");
            Ok(ChatCompletion {
                content: None,
                usage: parsed.usage,
                finish_reason: None,
            })
        }
    }
}

// ── Client ─────────────────────────────────────────────────────────

/// Async HTTP client for the OpenRouter chat completions API.
pub struct OpenRouterClient {
    client: reqwest::Client,
    api_key: String,
    endpoint: String,
    timeout: Duration,
}

impl std::fmt::Debug for OpenRouterClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("OpenRouterClient")
            .field("endpoint", &self.endpoint)
            .field("timeout", &self.timeout)
            .finish_non_exhaustive()
    }
}

impl OpenRouterClient {
    /// Create a client with the given API key and default headers.
    pub fn new(api_key: impl Into<String>) -> Result<Self, GenerationError> {
        Self::with_timeout(api_key, DEFAULT_HTTP_TIMEOUT)
    }

    /// Create a client whose requests give up after `timeout`.
    pub fn with_timeout(
        api_key: impl Into<String>,
        timeout: Duration,
    ) -> Result<Self, GenerationError> {
        let client = reqwest::Client::builder()
            .user_agent("replycraft/0.1")
            .timeout(timeout)
            .build()
            .map_err(|e| GenerationError::Request(format!("failed to build HTTP client: {e}")))?;
        Ok(Self {
            client,
            api_key: api_key.into(),
            endpoint: OPENROUTER_URL.to_string(),
            timeout,
        })
    }

    /// Point the client at a different chat-completions URL.
    pub fn with_endpoint(mut self, endpoint: impl Into<String>) -> Self {
        self.endpoint = endpoint.into();
        self
    }

    /// Send a chat completion request.
    pub async fn chat(&self, body: &ChatRequest) -> Result<ChatCompletion, GenerationError> {
        debug!(
            "LLM request: model={}, messages={}, max_tokens={}, temp={}",
            body.model.as_deref().unwrap_or("(none)"),
            body.messages.len(),
            body.max_tokens,
            body.temperature,
        );
        trace!(
            "Request payload size: {} bytes",
            serde_json::to_string(body).map_or(0, |s| s.len())
        );

        let start = Instant::now();

        let resp = self
            .client
            .post(&self.endpoint)
            .header("Authorization", format!("Bearer {}", self.api_key))
            .header("HTTP-Referer", ATTRIBUTION_REFERER)
            .header("X-Title", ATTRIBUTION_TITLE)
            .json(body)
            .send()
            .await
            .map_err(|e| self.transport_error(e))?;

        let status = resp.status();
        let text = resp.text().await.map_err(|e| self.transport_error(e))?;

        debug!(
            "LLM response: HTTP {} in {:.1}s ({} bytes)",
            status,
            start.elapsed().as_secs_f64(),
            text.len()
        );

        if !status.is_success() {
            return Err(GenerationError::Http {
                status: status.as_u16(),
                body: text,
            });
        }

        parse_chat_response(&text)
    }

    fn transport_error(&self, err: reqwest::Error) -> GenerationError {
        if err.is_timeout() {
            GenerationError::Timeout(self.timeout)
        } else {
            GenerationError::Request(err.to_string())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn user_message_serializes_role() {
        let json = serde_json::to_value(Message::user("world")).unwrap();
        assert_eq!(json, serde_json::json!({"role": "user", "content": "world"}));
    }

    #[test]
    fn chat_request_default_skips_unset_fields() {
        let req = ChatRequest {
            model: Some("test-model".into()),
            messages: vec![Message::user("hi")],
            ..Default::default()
        };
        let json = serde_json::to_value(&req).unwrap();
        assert!(json.get("max_tokens").is_none());
        assert!(json.get("temperature").is_none());
        assert!(json.get("response_format").is_none());
    }

    #[test]
    fn json_schema_response_format_shape() {
        let format = ResponseFormat::json_schema(
            "reply_suggestions",
            serde_json::json!({"type": "object"}),
        );
        let json = serde_json::to_value(&format).unwrap();
        assert_eq!(json["type"], "json_schema");
        assert_eq!(json["json_schema"]["name"], "reply_suggestions");
        assert_eq!(json["json_schema"]["schema"]["type"], "object");
    }

    #[test]
    fn parse_response_takes_first_choice() {
        let body = r#"{
            "choices": [{"message": {"content": "{\"replies\": []}"}, "finish_reason": "stop"}],
            "usage": {"prompt_tokens": 10, "completion_tokens": 5, "total_tokens": 15}
        }"#;
        let completion = parse_chat_response(body).unwrap();
        assert_eq!(completion.content.as_deref(), Some("{\"replies\": []}"));
        assert_eq!(completion.finish_reason.as_deref(), Some("stop"));
        assert_eq!(completion.usage.unwrap().total_tokens, Some(15));
    }

    #[test]
    fn parse_response_surfaces_api_error() {
        let err = parse_chat_response(r#"{"error": {"message": "quota exhausted"}}"#).unwrap_err();
        assert!(matches!(err, GenerationError::Api(ref m) if m == "quota exhausted"));
    }

    #[test]
    fn parse_response_without_choices_is_empty() {
        let completion = parse_chat_response(r#"{"choices": []}"#).unwrap();
        assert!(completion.content.is_none());
    }

    #[test]
    fn debug_hides_api_key() {
        let client = OpenRouterClient::new("sk-secret").unwrap();
        assert!(!format!("{client:?}").contains("sk-secret"));
    }

    #[tokio::test]
    async fn unresponsive_endpoint_is_timeout() {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        // Accept connections and hold them open without ever answering.
        let _server = tokio::spawn(async move {
            let mut held = Vec::new();
            while let Ok((socket, _)) = listener.accept().await {
                held.push(socket);
            }
        });

        let timeout = Duration::from_millis(100);
        let client = OpenRouterClient::with_timeout("sk-test", timeout)
            .unwrap()
            .with_endpoint(format!("http://{addr}/api/v1/chat/completions"));
        let err = client.chat(&ChatRequest::default()).await.unwrap_err();
        assert!(
            matches!(err, GenerationError::Timeout(d) if d == timeout),
            "got {err:?}"
        );
    }

    #[tokio::test]
    async fn refused_connection_is_request_error() {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        drop(listener);

        let client = OpenRouterClient::new("sk-test")
            .unwrap()
            .with_endpoint(format!("http://{addr}/api/v1/chat/completions"));
        let err = client.chat(&ChatRequest::default()).await.unwrap_err();
        assert!(matches!(err, GenerationError::Request(_)), "got {err:?}");
    }
}
