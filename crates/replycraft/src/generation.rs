//! The generation-service seam.
//!
//! [`ReplyGenerator`] is what the gateway depends on: given a
//! [`RenderedPrompt`], produce a [`ReplyResponse`] or fail. One call per
//! request, no streaming. [`OpenRouterGenerator`] is the production
//! implementation; tests substitute their own.

use std::future::Future;
use std::pin::Pin;

use serde_json::Value;
use tracing::{debug, warn};

use crate::error::GenerationError;
use crate::prompt::{OUTPUT_SCHEMA_NAME, RenderedPrompt};
use crate::request::ReplyResponse;
use crate::{ChatRequest, DEFAULT_MODEL, Message, OpenRouterClient, ResponseFormat};

/// Boxed future returned by [`ReplyGenerator::generate`].
pub type GenerationFuture<'a> =
    Pin<Box<dyn Future<Output = Result<ReplyResponse, GenerationError>> + Send + 'a>>;

/// An external service that turns a prompt into reply suggestions.
pub trait ReplyGenerator: Send + Sync {
    /// Generate replies for `prompt`. The answer must conform to
    /// `prompt.output_schema`; anything else is a [`GenerationError`].
    fn generate(&self, prompt: &RenderedPrompt) -> GenerationFuture<'_>;
}

/// Sampling settings for [`OpenRouterGenerator`].
#[derive(Debug, Clone)]
pub struct GeneratorConfig {
    /// Model identifier. Default: [`DEFAULT_MODEL`].
    pub model: String,
    /// Maximum completion tokens. Default: `512`.
    pub max_tokens: u32,
    /// Sampling temperature. Default: `0.9`.
    pub temperature: f32,
}

impl Default for GeneratorConfig {
    fn default() -> Self {
        Self {
            model: DEFAULT_MODEL.to_string(),
            max_tokens: 512,
            temperature: 0.9,
        }
    }
}

/// [`ReplyGenerator`] backed by OpenRouter structured output.
#[derive(Debug)]
pub struct OpenRouterGenerator {
    client: OpenRouterClient,
    config: GeneratorConfig,
}

impl OpenRouterGenerator {
    pub fn new(client: OpenRouterClient, config: GeneratorConfig) -> Self {
        Self { client, config }
    }

    /// Build the chat request for `prompt`.
    pub fn chat_request(&self, prompt: &RenderedPrompt) -> ChatRequest {
        ChatRequest {
            model: Some(self.config.model.clone()),
            messages: vec![Message::user(prompt.text.as_str())],
            max_tokens: self.config.max_tokens,
            temperature: self.config.temperature,
            response_format: Some(ResponseFormat::json_schema(
                OUTPUT_SCHEMA_NAME,
                prompt.output_schema.clone(),
            )),
            ..Default::default()
        }
    }
}

impl ReplyGenerator for OpenRouterGenerator {
    fn generate(&self, prompt: &RenderedPrompt) -> GenerationFuture<'_> {
        let body = self.chat_request(prompt);
        let schema = prompt.output_schema.clone();
        Box::pin(async move {
            let completion = self.client.chat(&body).await?;
            let content = completion
                .content
                .filter(|c| !c.trim().is_empty())
                .ok_or(GenerationError::EmptyResponse)?;
            let response = parse_reply_content(&content, &schema)?;
            debug!("Generated {} replies", response.replies.len());
            Ok(response)
        })
    }
}

/// Parse a completion's text into a [`ReplyResponse`], checking it against
/// `schema` first.
///
/// Tolerates a surrounding markdown code fence, which some models add even
/// in structured-output mode.
pub fn parse_reply_content(content: &str, schema: &Value) -> Result<ReplyResponse, GenerationError> {
    let json = strip_code_fence(content);
    let value: Value =
        serde_json::from_str(json).map_err(|e| GenerationError::Malformed(e.to_string()))?;

    match jsonschema::validator_for(schema) {
        Ok(validator) => {
            let errors: Vec<String> = validator
                .iter_errors(&value)
                .map(|e| format!("{}: {e}", e.instance_path()))
                .collect();
            if !errors.is_empty() {
                return Err(GenerationError::NonConforming(errors.join("; ")));
            }
        }
        Err(e) => warn!("Output schema failed to compile, skipping validation: {e}"),
    }

    serde_json::from_value(value).map_err(|e| GenerationError::NonConforming(e.to_string()))
}

fn strip_code_fence(content: &str) -> &str {
    let trimmed = content.trim();
    let Some(rest) = trimmed.strip_prefix("```") else {
        return trimmed;
    };
    let Some(body) = rest.strip_suffix("```") else {
        return trimmed;
    };
    // Drop an info string such as `json` on the opening fence line.
    match body.split_once('\n') {
        Some((_info, inner)) => inner.trim(),
        None => body.trim(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::json_schema_for;
    use crate::prompt::ReplyPrompt;
    use crate::request::ReplyRequest;

    fn schema() -> Value {
        json_schema_for::<ReplyResponse>()
    }

    #[test]
    fn parses_conforming_object() {
        let resp = parse_reply_content(
            r#"{"replies": ["Not much, you?", "Just vibing, wyd?"]}"#,
            &schema(),
        )
        .unwrap();
        assert_eq!(resp.replies, ["Not much, you?", "Just vibing, wyd?"]);
    }

    #[test]
    fn empty_replies_are_valid() {
        let resp = parse_reply_content(r#"{"replies": []}"#, &schema()).unwrap();
        assert!(resp.replies.is_empty());
    }

    #[test]
    fn strips_markdown_fence() {
        let content = "```json\n{\"replies\": [\"ok\"]}\n```";
        let resp = parse_reply_content(content, &schema()).unwrap();
        assert_eq!(resp.replies, ["ok"]);
    }

    #[test]
    fn missing_replies_is_non_conforming() {
        let err = parse_reply_content(r#"{"suggestions": ["hi"]}"#, &schema()).unwrap_err();
        assert!(matches!(err, GenerationError::NonConforming(_)), "{err}");
    }

    #[test]
    fn wrong_item_type_is_non_conforming() {
        let err = parse_reply_content(r#"{"replies": ["ok", 7]}"#, &schema()).unwrap_err();
        assert!(matches!(err, GenerationError::NonConforming(_)), "{err}");
    }

    #[test]
    fn prose_is_malformed() {
        let err = parse_reply_content("Sure! Here are some replies:", &schema()).unwrap_err();
        assert!(matches!(err, GenerationError::Malformed(_)));
    }

    #[test]
    fn chat_request_declares_output_schema() {
        let generator = OpenRouterGenerator::new(
            OpenRouterClient::new("sk-test").unwrap(),
            GeneratorConfig::default(),
        );
        let prompt = ReplyPrompt::new().render(&ReplyRequest::new("hey"));
        let body = serde_json::to_value(generator.chat_request(&prompt)).unwrap();

        assert_eq!(body["model"], DEFAULT_MODEL);
        assert_eq!(body["messages"][0]["role"], "user");
        assert_eq!(body["messages"][0]["content"], prompt.text.as_str());
        assert_eq!(body["response_format"]["type"], "json_schema");
        assert_eq!(
            body["response_format"]["json_schema"]["name"],
            OUTPUT_SCHEMA_NAME
        );
        assert_eq!(
            body["response_format"]["json_schema"]["schema"],
            prompt.output_schema
        );
    }
}
