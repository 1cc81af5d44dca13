// file: src/llm/client.rs
// description: OpenAI-compatible completion client behind the LanguageModel trait
// reference: https://platform.openai.com/docs/api-reference/chat

use crate::config::{ApiMode, Config, LlmConfig};
use crate::error::{ChatError, Result};
use crate::network::build_http_client;
use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::debug;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MessageRole {
    System,
    User,
    Assistant,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChatMessage {
    pub role: MessageRole,
    pub content: String,
}

impl ChatMessage {
    pub fn system(content: impl Into<String>) -> Self {
        Self {
            role: MessageRole::System,
            content: content.into(),
        }
    }

    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: MessageRole::User,
            content: content.into(),
        }
    }
}

/// A remote model that turns messages into one text completion.
#[async_trait]
pub trait LanguageModel: Send + Sync {
    fn model_name(&self) -> &str;

    async fn complete(&self, messages: &[ChatMessage]) -> Result<String>;
}

#[derive(Debug, Serialize)]
struct ChatCompletionRequest<'a> {
    model: &'a str,
    messages: Vec<ChatMessage>,
    max_tokens: u32,
    temperature: f32,
    stream: bool,
}

#[derive(Debug, Serialize)]
struct CompletionRequest<'a> {
    model: &'a str,
    prompt: String,
    max_tokens: u32,
    temperature: f32,
    stream: bool,
}

#[derive(Debug, Deserialize)]
struct ChatCompletionResponse {
    choices: Vec<ChatChoice>,
}

#[derive(Debug, Deserialize)]
struct ChatChoice {
    message: ResponseMessage,
}

#[derive(Debug, Deserialize)]
struct ResponseMessage {
    #[serde(default)]
    content: Option<String>,
}

#[derive(Debug, Deserialize)]
struct CompletionResponse {
    choices: Vec<CompletionChoice>,
}

#[derive(Debug, Deserialize)]
struct CompletionChoice {
    #[serde(default)]
    text: String,
}

/// Client for any server speaking the OpenAI completions protocol. The
/// configured system prompt is sent with every call.
pub struct OpenAiLikeClient {
    client: Client,
    config: LlmConfig,
}

impl OpenAiLikeClient {
    pub fn new(client: Client, mut config: LlmConfig) -> Self {
        config.api_base = config.api_base.trim_end_matches('/').to_string();
        Self { client, config }
    }

    pub fn from_config(config: &Config) -> Result<Self> {
        config.validate_for_generation()?;
        let client = build_http_client(
            &config.network,
            Duration::from_secs(config.llm.request_timeout_secs),
        )?;
        Ok(Self::new(client, config.llm.clone()))
    }

    pub fn endpoint(&self) -> String {
        match self.config.api_mode {
            ApiMode::Chat => format!("{}/chat/completions", self.config.api_base),
            ApiMode::Completion => format!("{}/completions", self.config.api_base),
        }
    }

    fn with_system_prompt(&self, messages: &[ChatMessage]) -> Vec<ChatMessage> {
        let mut all = Vec::with_capacity(messages.len() + 1);
        let has_system = messages.first().is_some_and(|m| m.role == MessageRole::System);
        if !has_system && !self.config.system_prompt.trim().is_empty() {
            all.push(ChatMessage::system(self.config.system_prompt.clone()));
        }
        all.extend_from_slice(messages);
        all
    }

    fn request_body(&self, messages: &[ChatMessage]) -> Result<serde_json::Value> {
        let messages = self.with_system_prompt(messages);
        let body = match self.config.api_mode {
            ApiMode::Chat => serde_json::to_value(ChatCompletionRequest {
                model: &self.config.model,
                messages,
                max_tokens: self.config.max_tokens,
                temperature: self.config.temperature,
                stream: false,
            })?,
            ApiMode::Completion => serde_json::to_value(CompletionRequest {
                model: &self.config.model,
                prompt: flatten_messages(&messages),
                max_tokens: self.config.max_tokens,
                temperature: self.config.temperature,
                stream: false,
            })?,
        };
        Ok(body)
    }

    fn parse_response(&self, body: &str) -> Result<String> {
        let text = match self.config.api_mode {
            ApiMode::Chat => {
                let parsed: ChatCompletionResponse = serde_json::from_str(body).map_err(|e| {
                    ChatError::Generation(format!("Failed to parse completion response: {}", e))
                })?;
                parsed
                    .choices
                    .into_iter()
                    .next()
                    .map(|c| c.message.content.unwrap_or_default())
            }
            ApiMode::Completion => {
                let parsed: CompletionResponse = serde_json::from_str(body).map_err(|e| {
                    ChatError::Generation(format!("Failed to parse completion response: {}", e))
                })?;
                parsed.choices.into_iter().next().map(|c| c.text)
            }
        };

        text.ok_or_else(|| ChatError::Generation("Model returned no choices".to_string()))
    }
}

#[async_trait]
impl LanguageModel for OpenAiLikeClient {
    fn model_name(&self) -> &str {
        &self.config.model
    }

    async fn complete(&self, messages: &[ChatMessage]) -> Result<String> {
        let body = self.request_body(messages)?;
        debug!("Sending completion request to {}", self.endpoint());

        let mut builder = self.client.post(self.endpoint()).json(&body);
        if let Some(key) = &self.config.api_key {
            builder = builder.bearer_auth(key);
        }

        let response = builder.send().await.map_err(|e| {
            if e.is_timeout() {
                ChatError::Generation(format!(
                    "Model did not answer within {}s",
                    self.config.request_timeout_secs
                ))
            } else {
                ChatError::Generation(format!("Failed to reach model endpoint: {}", e))
            }
        })?;

        let status = response.status();
        let text = response
            .text()
            .await
            .map_err(|e| ChatError::Generation(format!("Failed to read model response: {}", e)))?;

        if !status.is_success() {
            return Err(ChatError::Generation(format!(
                "Model request failed with status {}: {}",
                status, text
            )));
        }

        self.parse_response(&text)
    }
}

/// Completion-mode prompt: system text first, then each message on its own paragraph.
fn flatten_messages(messages: &[ChatMessage]) -> String {
    messages
        .iter()
        .map(|m| m.content.as_str())
        .collect::<Vec<_>>()
        .join("\n\n")
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn client(mode: ApiMode) -> OpenAiLikeClient {
        client_at("http://127.0.0.1:9/v1/", mode, Duration::from_secs(1))
    }

    fn client_at(api_base: &str, mode: ApiMode, timeout: Duration) -> OpenAiLikeClient {
        let config = LlmConfig {
            api_base: api_base.to_string(),
            api_key: Some("secret".to_string()),
            model: "test-model".to_string(),
            api_mode: mode,
            max_tokens: 64,
            temperature: 0.5,
            system_prompt: "Only answer from the documents.".to_string(),
            request_timeout_secs: 1,
        };
        let http = Client::builder().timeout(timeout).build()
            .unwrap();
        OpenAiLikeClient::new(http, config)
    }

    #[test]
    fn test_endpoints() {
        assert_eq!(
            client(ApiMode::Chat).endpoint(),
            "http://127.0.0.1:9/v1/chat/completions"
        );
        assert_eq!(
            client(ApiMode::Completion).endpoint(),
            "http://127.0.0.1:9/v1/completions"
        );
    }

    #[test]
    fn test_chat_body_prepends_system_prompt() {
        let body = client(ApiMode::Chat)
            .request_body(&[ChatMessage::user("Is tuition free?")])
            .unwrap();

        assert_eq!(body["model"], "test-model");
        assert_eq!(body["max_tokens"], 64);
        assert_eq!(body["stream"], false);
        assert_eq!(body["messages"][0]["role"], "system");
        assert_eq!(body["messages"][0]["content"], "Only answer from the documents.");
        assert_eq!(body["messages"][1]["role"], "user");
        assert_eq!(body["messages"][1]["content"], "Is tuition free?");
    }

    #[test]
    fn test_completion_body_flattens_prompt() {
        let body = client(ApiMode::Completion)
            .request_body(&[ChatMessage::user("Is tuition free?")])
            .unwrap();

        assert_eq!(
            body["prompt"],
            "Only answer from the documents.\n\nIs tuition free?"
        );
        assert!(body.get("messages").is_none());
    }

    #[test]
    fn test_parse_chat_response() {
        let body = r#"{"id":"x","choices":[{"index":0,"message":{"role":"assistant","content":"Yes, it is free."},"finish_reason":"stop"}]}"#;
        assert_eq!(
            client(ApiMode::Chat).parse_response(body).unwrap(),
            "Yes, it is free."
        );
    }

    #[test]
    fn test_parse_completion_response() {
        let body = r#"{"choices":[{"text":" Yes.","index":0}]}"#;
        assert_eq!(
            client(ApiMode::Completion).parse_response(body).unwrap(),
            " Yes."
        );
    }

    #[test]
    fn test_parse_errors_are_generation_errors() {
        let chat = client(ApiMode::Chat);
        assert!(matches!(
            chat.parse_response(r#"{"choices":[]}"#),
            Err(ChatError::Generation(_))
        ));
        assert!(matches!(
            chat.parse_response("not json"),
            Err(ChatError::Generation(_))
        ));
    }

    #[tokio::test]
    async fn test_unreachable_endpoint_is_generation_error() {
        let result = client(ApiMode::Chat)
            .complete(&[ChatMessage::user("hello")])
            .await;
        assert!(matches!(result, Err(ChatError::Generation(_))));
    }

    #[tokio::test]
    async fn test_silent_endpoint_times_out_as_generation_error() {
        let base = crate::network::silent_endpoint().await;
        let result = client_at(&base, ApiMode::Chat, Duration::from_millis(200))
            .complete(&[ChatMessage::user("hello")])
            .await;

        match result {
            Err(ChatError::Generation(message)) => {
                assert!(message.contains("did not answer within"), "{}", message)
            }
            other => panic!("expected a generation timeout, got {:?}", other),
        }
    }

    #[test]
    fn test_from_config_requires_api_key() {
        let config = Config::default_config();
        assert!(matches!(
            OpenAiLikeClient::from_config(&config),
            Err(ChatError::Config(_))
        ));
    }
}
