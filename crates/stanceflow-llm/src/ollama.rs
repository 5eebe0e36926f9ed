use futures::future::BoxFuture;
use futures::StreamExt;
use serde::{Deserialize, Serialize};
use tracing::debug;

use stanceflow_core::config::ModelConfig;
use stanceflow_core::error::{Result, StanceflowError};
use stanceflow_core::traits::{AgentInvoker, Bindings};
use stanceflow_core::types::RoleId;

use crate::roles;
use crate::streaming::NdjsonParser;

const DEFAULT_BASE_URL: &str = "http://localhost:11434";

/// Ollama chat invoker.
///
/// Streams the response NDJSON line by line and drains it into one string:
/// the engine's contract is a single completed response per call.
pub struct OllamaInvoker {
    http: reqwest::Client,
    config: ModelConfig,
}

impl OllamaInvoker {
    pub fn new(config: ModelConfig) -> Self {
        Self {
            http: reqwest::Client::new(),
            config,
        }
    }

    fn chat_url(&self) -> String {
        let base = self
            .config
            .base_url
            .as_deref()
            .unwrap_or(DEFAULT_BASE_URL)
            .trim_end_matches('/');
        format!("{}/api/chat", base)
    }
}

#[derive(Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: Vec<ChatRequestMessage<'a>>,
    stream: bool,
    options: ChatOptions,
}

#[derive(Serialize)]
struct ChatRequestMessage<'a> {
    role: &'a str,
    content: &'a str,
}

#[derive(Serialize)]
struct ChatOptions {
    temperature: f32,
}

#[derive(Deserialize)]
struct ChatChunk {
    #[serde(default)]
    message: Option<ChunkMessage>,
    #[serde(default)]
    error: Option<String>,
}

#[derive(Deserialize)]
struct ChunkMessage {
    #[serde(default)]
    content: String,
}

impl AgentInvoker for OllamaInvoker {
    fn invoke(&self, role: RoleId, bindings: Bindings) -> BoxFuture<'_, Result<String>> {
        Box::pin(async move {
            let prompt = roles::render(role, &bindings);
            debug!(role = %role, prompt_chars = prompt.len(), "Invoking model");

            let request = ChatRequest {
                model: &self.config.model_id,
                messages: vec![ChatRequestMessage {
                    role: "user",
                    content: &prompt,
                }],
                stream: true,
                options: ChatOptions {
                    temperature: self.config.temperature,
                },
            };

            let resp = self
                .http
                .post(self.chat_url())
                .json(&request)
                .send()
                .await
                .map_err(|e| StanceflowError::ModelRequest(e.to_string()))?;

            let status = resp.status();
            if !status.is_success() {
                let body = resp.text().await.unwrap_or_default();
                return Err(StanceflowError::ModelRequest(format!(
                    "HTTP {}: {}",
                    status.as_u16(),
                    body
                )));
            }

            let mut stream = resp.bytes_stream();
            let mut parser = NdjsonParser::new();
            let mut full = String::new();

            while let Some(chunk) = stream.next().await {
                let bytes = chunk.map_err(|e| StanceflowError::ModelStream(e.to_string()))?;
                let text = std::str::from_utf8(&bytes)
                    .map_err(|e| StanceflowError::ModelStream(e.to_string()))?;
                for line in parser.feed(text) {
                    append_chunk(&line, &mut full)?;
                }
            }
            if let Some(line) = parser.finish() {
                append_chunk(&line, &mut full)?;
            }

            if full.trim().is_empty() {
                return Err(StanceflowError::EmptyModelResponse);
            }

            debug!(role = %role, response_chars = full.len(), "Model response drained");
            Ok(full)
        })
    }
}

/// Parse one NDJSON line and accumulate its content delta.
/// Non-JSON lines are skipped; an in-band error field surfaces as an error.
fn append_chunk(line: &str, full: &mut String) -> Result<()> {
    let chunk: ChatChunk = match serde_json::from_str(line) {
        Ok(c) => c,
        Err(_) => return Ok(()),
    };
    if let Some(error) = chunk.error {
        return Err(StanceflowError::ModelRequest(error));
    }
    if let Some(message) = chunk.message {
        full.push_str(&message.content);
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_append_chunk_accumulates_content() {
        let mut full = String::new();
        append_chunk(r#"{"message":{"content":"The tar"},"done":false}"#, &mut full).unwrap();
        append_chunk(r#"{"message":{"content":"get"},"done":true}"#, &mut full).unwrap();
        assert_eq!(full, "The target");
    }

    #[test]
    fn test_append_chunk_skips_non_json() {
        let mut full = String::new();
        append_chunk("not json", &mut full).unwrap();
        assert!(full.is_empty());
    }

    #[test]
    fn test_append_chunk_surfaces_inband_error() {
        let mut full = String::new();
        let err = append_chunk(r#"{"error":"model not found"}"#, &mut full).unwrap_err();
        assert!(matches!(err, StanceflowError::ModelRequest(_)));
    }

    #[test]
    fn test_chat_url_trims_trailing_slash() {
        let invoker = OllamaInvoker::new(ModelConfig {
            base_url: Some("http://10.0.0.2:11434/".into()),
            ..ModelConfig::default()
        });
        assert_eq!(invoker.chat_url(), "http://10.0.0.2:11434/api/chat");
    }
}
