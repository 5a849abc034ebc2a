use eventsource_stream::Eventsource;
use futures::{StreamExt, stream::Stream};
use reqwest::Client as HttpClient;
use serde::{Deserialize, Serialize};
use std::pin::Pin;
use std::sync::Arc;
use tracing::debug;

use crate::types::*;
use symposium_core::Result;

/// Generic provider trait for LLM backends
#[async_trait::async_trait]
pub trait Provider: Send + Sync {
    /// Stream a chat completion as incremental text chunks
    async fn stream_chat<'a>(
        &'a self, request: ChatRequest, cancel_token: CancelToken,
    ) -> Result<Pin<Box<dyn Stream<Item = StreamEvent> + Send + 'a>>>;
}

/// Provider for OpenAI-compatible chat completion endpoints (SSE streaming)
pub struct OpenAiProvider {
    client: HttpClient,
    api_key: String,
    base_url: String,
    model: String,
}

impl OpenAiProvider {
    pub fn new(api_key: String, model: String, base_url: Option<String>) -> Self {
        Self {
            client: HttpClient::new(),
            api_key,
            model,
            base_url: base_url.unwrap_or_else(|| "https://api.openai.com/v1".to_string()),
        }
    }

    /// Convert ChatRequest to the OpenAI wire format
    fn to_openai_request(&self, request: &ChatRequest) -> OpenAiChatRequest {
        OpenAiChatRequest {
            model: self.model.clone(),
            messages: request.messages.clone(),
            stream: true,
            temperature: request.temperature,
            max_tokens: request.max_tokens,
        }
    }

    /// Parse one SSE data payload into a StreamEvent
    fn parse_chunk(&self, chunk: &str) -> StreamEvent {
        if chunk.trim().is_empty() || chunk.starts_with("[DONE]") {
            return StreamEvent::Done;
        }

        match serde_json::from_str::<OpenAiChunk>(chunk) {
            Ok(data) => {
                if let Some(choices) = data.choices
                    && let Some(choice) = choices.first()
                {
                    if let Some(content) = &choice.delta.content
                        && !content.is_empty()
                    {
                        return StreamEvent::Token(content.clone());
                    }
                    if choice.finish_reason.is_some() {
                        return StreamEvent::Done;
                    }
                }
                // Keep-alive or role-only delta; nothing to show yet.
                StreamEvent::Token(String::new())
            }
            Err(_) => StreamEvent::Error(format!("failed to parse chunk: {}", chunk)),
        }
    }
}

#[async_trait::async_trait]
impl Provider for OpenAiProvider {
    async fn stream_chat<'a>(
        &'a self, request: ChatRequest, cancel_token: CancelToken,
    ) -> Result<Pin<Box<dyn Stream<Item = StreamEvent> + Send + 'a>>> {
        let openai_request = self.to_openai_request(&request);
        let url = format!("{}/chat/completions", self.base_url);
        debug!(model = %self.model, messages = request.messages.len(), "openai stream request");

        let stream = async_stream::stream! {
            if cancel_token.is_cancelled() {
                return;
            }

            let response = match self.client
                .post(&url)
                .header("Authorization", format!("Bearer {}", self.api_key))
                .header("Content-Type", "application/json")
                .json(&openai_request)
                .send()
                .await
            {
                Ok(resp) => resp,
                Err(e) => {
                    yield StreamEvent::Error(format!("request failed: {}", e));
                    return;
                }
            };

            if !response.status().is_success() {
                let status = response.status();
                let body = response.text().await.unwrap_or_default();
                yield StreamEvent::Error(format!("API error: {} - {}", status, body));
                return;
            }

            let eventsource = response.bytes_stream().eventsource();
            tokio::pin!(eventsource);

            while let Some(event_result) = eventsource.next().await {
                if cancel_token.is_cancelled() {
                    return;
                }

                match event_result {
                    Ok(event) => {
                        let parsed = self.parse_chunk(&event.data);
                        let is_done = matches!(parsed, StreamEvent::Done);
                        yield parsed;

                        if is_done {
                            break;
                        }
                    }
                    Err(e) => {
                        yield StreamEvent::Error(format!("SSE error: {}", e));
                        break;
                    }
                }
            }
        };

        Ok(Box::pin(stream))
    }
}

/// OpenAI API request format
#[derive(Debug, Serialize)]
struct OpenAiChatRequest {
    model: String,
    messages: Vec<ChatMessage>,
    stream: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    temperature: Option<f32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    max_tokens: Option<u32>,
}

/// OpenAI SSE chunk format
#[derive(Debug, Deserialize)]
#[allow(dead_code)]
struct OpenAiChunk {
    id: Option<String>,
    object: Option<String>,
    model: Option<String>,
    choices: Option<Vec<OpenAiChoice>>,
}

#[derive(Debug, Deserialize)]
struct OpenAiChoice {
    delta: OpenAiDelta,
    finish_reason: Option<String>,
}

#[derive(Debug, Deserialize)]
struct OpenAiDelta {
    #[serde(default)]
    content: Option<String>,
    #[serde(default)]
    #[allow(dead_code)]
    role: Option<String>,
}

/// Provider for the Ollama native chat endpoint (newline-delimited JSON)
pub struct OllamaProvider {
    client: HttpClient,
    base_url: String,
    model: String,
}

impl OllamaProvider {
    pub fn new(model: String, base_url: Option<String>) -> Self {
        Self {
            client: HttpClient::new(),
            model,
            base_url: base_url.unwrap_or_else(|| "http://localhost:11434".to_string()),
        }
    }

    fn to_ollama_request(&self, request: &ChatRequest) -> OllamaChatRequest {
        OllamaChatRequest {
            model: self.model.clone(),
            messages: request.messages.clone(),
            stream: true,
            options: request.temperature.map(|temperature| OllamaOptions { temperature }),
        }
    }

    /// Parse one NDJSON line into a StreamEvent
    fn parse_line(&self, line: &str) -> StreamEvent {
        match serde_json::from_str::<OllamaChunk>(line) {
            Ok(data) => {
                if let Some(error) = data.error {
                    return StreamEvent::Error(error);
                }
                if data.done {
                    return StreamEvent::Done;
                }
                match data.message {
                    Some(message) if !message.content.is_empty() => StreamEvent::Token(message.content),
                    _ => StreamEvent::Token(String::new()),
                }
            }
            Err(_) => StreamEvent::Error(format!("failed to parse chunk: {}", line)),
        }
    }
}

#[async_trait::async_trait]
impl Provider for OllamaProvider {
    async fn stream_chat<'a>(
        &'a self, request: ChatRequest, cancel_token: CancelToken,
    ) -> Result<Pin<Box<dyn Stream<Item = StreamEvent> + Send + 'a>>> {
        let ollama_request = self.to_ollama_request(&request);
        let url = format!("{}/api/chat", self.base_url);
        debug!(model = %self.model, messages = request.messages.len(), "ollama stream request");

        let stream = async_stream::stream! {
            if cancel_token.is_cancelled() {
                return;
            }

            let response = match self.client
                .post(&url)
                .header("Content-Type", "application/json")
                .json(&ollama_request)
                .send()
                .await
            {
                Ok(resp) => resp,
                Err(e) => {
                    yield StreamEvent::Error(format!("request failed: {}", e));
                    return;
                }
            };

            if !response.status().is_success() {
                let status = response.status();
                let body = response.text().await.unwrap_or_default();
                yield StreamEvent::Error(format!("API error: {} - {}", status, body));
                return;
            }

            let bytes_stream = response.bytes_stream();
            tokio::pin!(bytes_stream);

            let mut buffer = Vec::new();

            while let Some(item_result) = bytes_stream.next().await {
                if cancel_token.is_cancelled() {
                    return;
                }

                match item_result {
                    Ok(chunk) => {
                        buffer.extend_from_slice(&chunk);

                        while let Some(pos) = buffer.iter().position(|&b| b == b'\n') {
                            let line_bytes: Vec<u8> = buffer.drain(..=pos).collect();
                            let line = String::from_utf8_lossy(&line_bytes);

                            if line.trim().is_empty() {
                                continue;
                            }

                            let parsed = self.parse_line(line.trim());
                            let is_done = matches!(parsed, StreamEvent::Done);
                            yield parsed;

                            if is_done {
                                return;
                            }
                        }
                    }
                    Err(e) => {
                        yield StreamEvent::Error(format!("stream error: {}", e));
                        break;
                    }
                }
            }
        };

        Ok(Box::pin(stream))
    }
}

/// Ollama API request format
#[derive(Debug, Serialize)]
struct OllamaChatRequest {
    model: String,
    messages: Vec<ChatMessage>,
    stream: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    options: Option<OllamaOptions>,
}

#[derive(Debug, Serialize)]
struct OllamaOptions {
    temperature: f32,
}

/// Ollama NDJSON chunk format
#[derive(Debug, Deserialize)]
#[allow(dead_code)]
struct OllamaChunk {
    model: Option<String>,
    message: Option<OllamaMessage>,
    #[serde(default)]
    done: bool,
    #[serde(default)]
    error: Option<String>,
}

#[derive(Debug, Deserialize)]
struct OllamaMessage {
    #[allow(dead_code)]
    role: Option<String>,
    #[serde(default)]
    content: String,
}

/// Factory to create providers from config
pub struct ProviderFactory;

impl ProviderFactory {
    pub fn create_from_config(config: &symposium_core::ProviderConfig) -> Result<Arc<dyn Provider>> {
        match config {
            symposium_core::ProviderConfig::OpenAi { api_key, model, base_url } => Ok(Arc::new(
                OpenAiProvider::new(api_key.clone(), model.clone(), Some(base_url.clone())),
            )),
            symposium_core::ProviderConfig::Ollama { model, base_url } => {
                Ok(Arc::new(OllamaProvider::new(model.clone(), Some(base_url.clone()))))
            }
            symposium_core::ProviderConfig::Mock { responses_file } => {
                Ok(Arc::new(crate::mock::MockProvider::new(responses_file.clone())))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_openai_provider_creation() {
        let provider = OpenAiProvider::new("test-key".to_string(), "gpt-4o-mini".to_string(), None);
        assert_eq!(provider.api_key, "test-key");
        assert_eq!(provider.model, "gpt-4o-mini");
        assert_eq!(provider.base_url, "https://api.openai.com/v1");
    }

    #[test]
    fn test_openai_provider_custom_url() {
        let provider = OpenAiProvider::new(
            "test-key".to_string(),
            "gpt-4o-mini".to_string(),
            Some("https://custom.api.com/v1".to_string()),
        );
        assert_eq!(provider.base_url, "https://custom.api.com/v1");
    }

    #[test]
    fn test_ollama_provider_creation() {
        let provider = OllamaProvider::new("gemma3:27b".to_string(), None);
        assert_eq!(provider.model, "gemma3:27b");
        assert_eq!(provider.base_url, "http://localhost:11434");
    }

    #[test]
    fn test_openai_request_conversion() {
        let provider = OpenAiProvider::new("test-key".to_string(), "gpt-4o-mini".to_string(), None);
        let request = ChatRequest::builder()
            .add_message(ChatMessage::system("You are Nietzsche"))
            .add_message(ChatMessage::user("Speak"))
            .temperature(0.7)
            .build();

        let wire = provider.to_openai_request(&request);
        assert_eq!(wire.model, "gpt-4o-mini");
        assert_eq!(wire.messages.len(), 2);
        assert!(wire.stream);
        assert_eq!(wire.temperature, Some(0.7));
    }

    #[test]
    fn test_ollama_request_conversion() {
        let provider = OllamaProvider::new("gemma3:27b".to_string(), None);
        let request = ChatRequest::builder().add_message(ChatMessage::user("Speak")).build();

        let wire = provider.to_ollama_request(&request);
        assert_eq!(wire.model, "gemma3:27b");
        assert!(wire.stream);
        assert!(wire.options.is_none());
    }

    #[test]
    fn test_openai_parse_chunk_text() {
        let provider = OpenAiProvider::new("test-key".to_string(), "gpt-4o-mini".to_string(), None);
        let chunk = r#"{"choices":[{"delta":{"content":"Hello"},"finish_reason":null}]}"#;
        let event = provider.parse_chunk(chunk);
        assert!(matches!(event, StreamEvent::Token(text) if text == "Hello"));
    }

    #[test]
    fn test_openai_parse_chunk_done() {
        let provider = OpenAiProvider::new("test-key".to_string(), "gpt-4o-mini".to_string(), None);
        assert!(matches!(provider.parse_chunk("[DONE]"), StreamEvent::Done));

        let finish = r#"{"choices":[{"delta":{},"finish_reason":"stop"}]}"#;
        assert!(matches!(provider.parse_chunk(finish), StreamEvent::Done));
    }

    #[test]
    fn test_openai_parse_chunk_malformed() {
        let provider = OpenAiProvider::new("test-key".to_string(), "gpt-4o-mini".to_string(), None);
        let event = provider.parse_chunk("{not json");
        assert!(matches!(event, StreamEvent::Error(_)));
    }

    #[test]
    fn test_ollama_parse_line_token() {
        let provider = OllamaProvider::new("gemma3:27b".to_string(), None);
        let line = r#"{"model":"gemma3:27b","message":{"role":"assistant","content":"Thus"},"done":false}"#;
        let event = provider.parse_line(line);
        assert!(matches!(event, StreamEvent::Token(text) if text == "Thus"));
    }

    #[test]
    fn test_ollama_parse_line_done() {
        let provider = OllamaProvider::new("gemma3:27b".to_string(), None);
        let line = r#"{"model":"gemma3:27b","done":true}"#;
        assert!(matches!(provider.parse_line(line), StreamEvent::Done));
    }

    #[test]
    fn test_ollama_parse_line_error() {
        let provider = OllamaProvider::new("gemma3:27b".to_string(), None);
        let line = r#"{"error":"model not found"}"#;
        assert!(matches!(provider.parse_line(line), StreamEvent::Error(message) if message == "model not found"));
    }

    #[test]
    fn test_factory_creates_mock() {
        let config = symposium_core::ProviderConfig::Mock { responses_file: None };
        assert!(ProviderFactory::create_from_config(&config).is_ok());
    }
}
