use anyhow::Result;
use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::{Config, error::StageError};

use super::{CompletionMode, ServiceId, TextCompletionProvider, http_client, truncate_body};

/// OpenAI-compatible chat completions client.
#[derive(Debug, Clone)]
pub struct OpenAiProvider {
    api_key: String,
    model: String,
    base_url: String,
    http: Client,
}

impl OpenAiProvider {
    pub fn from_config(config: &Config) -> Result<Self> {
        let api_key = config.require_api_key(ServiceId::OpenAi)?;

        Ok(Self {
            api_key: api_key.to_owned(),
            model: config.llm_model().to_owned(),
            base_url: config.endpoints.openai.trim_end_matches('/').to_owned(),
            http: http_client(config.timeouts.llm())?,
        })
    }
}

#[derive(Debug, Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: [ChatMessage<'a>; 1],
    #[serde(skip_serializing_if = "Option::is_none")]
    response_format: Option<ResponseFormat>,
}

#[derive(Debug, Serialize)]
struct ChatMessage<'a> {
    role: &'static str,
    content: &'a str,
}

#[derive(Debug, Serialize)]
struct ResponseFormat {
    #[serde(rename = "type")]
    kind: &'static str,
}

#[derive(Debug, Deserialize)]
struct ChatResponse {
    choices: Vec<ChatChoice>,
}

#[derive(Debug, Deserialize)]
struct ChatChoice {
    message: ChatReply,
}

#[derive(Debug, Deserialize)]
struct ChatReply {
    content: Option<String>,
}

#[async_trait]
impl TextCompletionProvider for OpenAiProvider {
    async fn complete(&self, prompt: &str, mode: CompletionMode) -> Result<String, StageError> {
        let url = format!("{}/v1/chat/completions", self.base_url);

        let body = ChatRequest {
            model: &self.model,
            messages: [ChatMessage { role: "user", content: prompt }],
            response_format: match mode {
                CompletionMode::Json => Some(ResponseFormat { kind: "json_object" }),
                CompletionMode::Text => None,
            },
        };

        debug!(model = %self.model, ?mode, "requesting completion");

        let res = self.http.post(&url).bearer_auth(&self.api_key).json(&body).send().await?;

        let status = res.status();
        let text = res.text().await?;

        if !status.is_success() {
            warn!(%status, body = truncate_body(&text), "completion request failed");
            return Err(StageError::Status(status.as_u16()));
        }

        let parsed: ChatResponse = serde_json::from_str(&text)
            .map_err(|e| StageError::Malformed(format!("chat completion JSON: {e}")))?;

        let content = parsed
            .choices
            .into_iter()
            .next()
            .and_then(|choice| choice.message.content)
            .map(|content| content.trim().to_string())
            .unwrap_or_default();

        if content.is_empty() {
            return Err(StageError::Malformed("completion contained no text".to_string()));
        }

        Ok(content)
    }
}
