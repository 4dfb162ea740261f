//! Chat-completions client used for tool selection and answer synthesis.

use async_trait::async_trait;
use biograph_config::OpenAiSettings;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::time::Duration;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum LlmError {
    #[error("LLM request timed out: {0}")]
    Timeout(String),

    #[error("LLM transport error: {0}")]
    Transport(String),

    #[error("LLM API returned {status}: {body}")]
    Api { status: u16, body: String },

    #[error("Malformed LLM response: {0}")]
    MalformedResponse(String),

    #[error("LLM returned no content")]
    EmptyResponse,
}

pub type LlmResult<T> = Result<T, LlmError>;

/// A tool directive exactly as the model emitted it, before validation
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RawToolCall {
    pub name: String,
    /// JSON-encoded argument object
    pub arguments: String,
}

#[async_trait]
pub trait LlmClient: Send + Sync {
    /// Ask the model which of `tools` to call. An empty vec means none.
    async fn select_tools(&self, prompt: &str, tools: &[Value]) -> LlmResult<Vec<RawToolCall>>;

    /// Plain completion; empty content is an error
    async fn complete(&self, prompt: &str) -> LlmResult<String>;
}

#[derive(Debug, Serialize)]
struct ChatMessage<'a> {
    role: &'a str,
    content: &'a str,
}

#[derive(Debug, Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: Vec<ChatMessage<'a>>,
    temperature: f32,
    max_tokens: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    tools: Option<&'a [Value]>,
    #[serde(skip_serializing_if = "Option::is_none")]
    tool_choice: Option<&'a str>,
}

#[derive(Debug, Deserialize)]
struct ChatResponse {
    #[serde(default)]
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
    #[serde(default)]
    tool_calls: Option<Vec<ResponseToolCall>>,
}

#[derive(Debug, Deserialize)]
struct ResponseToolCall {
    function: ResponseFunction,
}

#[derive(Debug, Deserialize)]
struct ResponseFunction {
    #[serde(default)]
    name: String,
    /// Normally a JSON-encoded string, but some providers send an object or null
    #[serde(default)]
    arguments: Value,
}

impl ResponseFunction {
    fn into_raw(self) -> RawToolCall {
        let arguments = match self.arguments {
            Value::Null => String::new(),
            Value::String(encoded) => encoded,
            other => other.to_string(),
        };
        RawToolCall {
            name: self.name,
            arguments,
        }
    }
}

/// OpenAI-compatible `/chat/completions` client
pub struct OpenAiChatClient {
    client: Client,
    api_key: String,
    base_url: String,
    model: String,
    temperature: f32,
    max_tokens: u32,
    timeout: Duration,
}

impl OpenAiChatClient {
    pub fn new(settings: &OpenAiSettings, timeout: Duration) -> Self {
        Self {
            client: Client::new(),
            api_key: settings.api_key.expose().to_string(),
            base_url: settings.base_url.trim_end_matches('/').to_string(),
            model: settings.model.clone(),
            temperature: settings.temperature,
            max_tokens: settings.max_tokens,
            timeout,
        }
    }

    async fn chat(&self, request: &ChatRequest<'_>) -> LlmResult<ResponseMessage> {
        let response = self
            .client
            .post(format!("{}/chat/completions", self.base_url))
            .header("Authorization", format!("Bearer {}", self.api_key))
            .header("Content-Type", "application/json")
            .timeout(self.timeout)
            .json(request)
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    LlmError::Timeout(format!("chat completion after {:?}", self.timeout))
                } else {
                    LlmError::Transport(e.to_string())
                }
            })?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(LlmError::Api {
                status: status.as_u16(),
                body,
            });
        }

        let body: ChatResponse = response.json().await.map_err(|e| {
            if e.is_timeout() {
                LlmError::Timeout(format!("chat completion body after {:?}", self.timeout))
            } else {
                LlmError::MalformedResponse(e.to_string())
            }
        })?;

        body.choices
            .into_iter()
            .next()
            .map(|choice| choice.message)
            .ok_or_else(|| LlmError::MalformedResponse("no choices returned".to_string()))
    }
}

#[async_trait]
impl LlmClient for OpenAiChatClient {
    async fn select_tools(&self, prompt: &str, tools: &[Value]) -> LlmResult<Vec<RawToolCall>> {
        let request = ChatRequest {
            model: &self.model,
            messages: vec![ChatMessage {
                role: "user",
                content: prompt,
            }],
            temperature: self.temperature,
            max_tokens: self.max_tokens,
            tools: Some(tools),
            tool_choice: Some("auto"),
        };

        let message = self.chat(&request).await?;
        Ok(message
            .tool_calls
            .unwrap_or_default()
            .into_iter()
            .map(|call| call.function.into_raw())
            .collect())
    }

    async fn complete(&self, prompt: &str) -> LlmResult<String> {
        let request = ChatRequest {
            model: &self.model,
            messages: vec![ChatMessage {
                role: "user",
                content: prompt,
            }],
            temperature: self.temperature,
            max_tokens: self.max_tokens,
            tools: None,
            tool_choice: None,
        };

        let message = self.chat(&request).await?;
        match message.content.map(|c| c.trim().to_string()) {
            Some(text) if !text.is_empty() => Ok(text),
            _ => Err(LlmError::EmptyResponse),
        }
    }
}
