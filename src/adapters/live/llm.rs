//! Live adapter for the `LlmClient` port using an OpenAI-compatible chat
//! completions API.

use reqwest::Client;
use serde::{Deserialize, Serialize};

use super::http::{self, LLM_TIMEOUT};
use crate::config::LlmSettings;
use crate::ports::llm::{CompletionFuture, CompletionRequest, CompletionResponse, LlmClient};
use crate::ports::PortError;

/// Live LLM client that calls `{base_url}/chat/completions`.
pub struct LiveLlmClient {
    client: Client,
    endpoint: String,
    api_key: String,
}

impl LiveLlmClient {
    /// Creates a client from the model settings.
    #[must_use]
    pub fn new(settings: &LlmSettings) -> Self {
        Self {
            client: Client::new(),
            endpoint: http::join(&settings.base_url, "chat/completions"),
            api_key: settings.api_key.clone(),
        }
    }
}

/// Request body sent to the chat completions API.
#[derive(Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: [ChatMessage<'a>; 2],
    temperature: f32,
    max_tokens: u32,
}

/// A single message in the chat request.
#[derive(Serialize)]
struct ChatMessage<'a> {
    role: &'a str,
    content: &'a str,
}

/// Top-level response from the chat completions API.
#[derive(Deserialize)]
struct ChatResponse {
    choices: Vec<Choice>,
    #[serde(default)]
    usage: Usage,
}

#[derive(Deserialize)]
struct Choice {
    message: ResponseMessage,
}

#[derive(Deserialize)]
struct ResponseMessage {
    #[serde(default)]
    content: Option<String>,
}

/// Token usage reported by the API.
#[derive(Default, Deserialize)]
struct Usage {
    prompt_tokens: u32,
    completion_tokens: u32,
}

impl ChatResponse {
    fn into_completion(self) -> Result<CompletionResponse, PortError> {
        let text = self
            .choices
            .into_iter()
            .next()
            .and_then(|c| c.message.content)
            .ok_or("chat completion returned no message content")?;
        Ok(CompletionResponse {
            text,
            prompt_tokens: self.usage.prompt_tokens,
            completion_tokens: self.usage.completion_tokens,
        })
    }
}

impl LlmClient for LiveLlmClient {
    fn complete(&self, request: &CompletionRequest) -> CompletionFuture<'_> {
        let body = ChatRequest {
            model: &request.model,
            messages: [
                ChatMessage { role: "system", content: &request.system },
                ChatMessage { role: "user", content: &request.prompt },
            ],
            temperature: request.temperature,
            max_tokens: request.max_tokens,
        };
        let builder = self
            .client
            .post(&self.endpoint)
            .bearer_auth(&self.api_key)
            .timeout(LLM_TIMEOUT)
            .json(&body);

        Box::pin(async move {
            let response: ChatResponse = http::fetch("LLM", builder).await?;
            response.into_completion()
        })
    }
}
