use std::time::Duration;

use async_trait::async_trait;
use log::error;
use reqwest::Client;
use serde::{Deserialize, Serialize};

use crate::errors::ProviderError;
use crate::providers::{
    TranslationOutcome, TranslationRequest, Translator, classify_http_failure,
    classify_transport_error, protocol,
};

/// Ollama client for interacting with a local Ollama server
#[derive(Debug)]
pub struct Ollama {
    /// Base URL of the Ollama API
    base_url: String,
    /// HTTP client for making requests
    client: Client,
    /// Model name to chat with
    model: String,
    /// System prompt template from configuration
    system_template: String,
    /// Sampling temperature
    temperature: f32,
}

/// Chat message object
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatMessage {
    /// Role of the message sender (system, user or assistant)
    pub role: String,
    /// Content of the message
    pub content: String,
}

/// Chat request for the Ollama API
#[derive(Debug, Serialize)]
pub struct ChatRequest {
    /// Model name to use for generation
    model: String,
    /// Messages of the conversation
    messages: Vec<ChatMessage>,
    /// Additional model parameters
    #[serde(skip_serializing_if = "Option::is_none")]
    options: Option<GenerationOptions>,
    /// Whether to stream the response
    #[serde(skip_serializing_if = "Option::is_none")]
    stream: Option<bool>,
}

/// Generation options for the Ollama API
#[derive(Debug, Serialize)]
pub struct GenerationOptions {
    /// Temperature for generation
    #[serde(skip_serializing_if = "Option::is_none")]
    temperature: Option<f32>,
    /// Top-p sampling
    #[serde(skip_serializing_if = "Option::is_none")]
    top_p: Option<f32>,
    /// Maximum number of tokens to generate
    #[serde(skip_serializing_if = "Option::is_none")]
    num_predict: Option<u32>,
}

/// Chat response from the Ollama API
#[derive(Debug, Deserialize)]
pub struct ChatResponse {
    /// Model name
    pub model: String,
    /// Creation timestamp
    pub created_at: String,
    /// Response message
    pub message: ChatMessage,
    /// Whether the generation is complete
    pub done: bool,
    /// Number of prompt tokens
    #[serde(default)]
    pub prompt_eval_count: Option<u64>,
    /// Number of generated tokens
    #[serde(default)]
    pub eval_count: Option<u64>,
}

impl ChatRequest {
    /// Create a new chat request
    pub fn new(model: impl Into<String>, messages: Vec<ChatMessage>) -> Self {
        Self {
            model: model.into(),
            messages,
            options: None,
            stream: Some(false),
        }
    }

    /// Set the temperature
    pub fn temperature(mut self, temperature: f32) -> Self {
        if let Some(options) = &mut self.options {
            options.temperature = Some(temperature);
        } else {
            self.options = Some(GenerationOptions {
                temperature: Some(temperature),
                top_p: None,
                num_predict: None,
            });
        }
        self
    }
}

impl Ollama {
    /// Create a new Ollama client
    ///
    /// Uses connection pooling for better performance with concurrent
    /// requests. Ollama speaks HTTP/1.1, so HTTP/2 is not negotiated.
    pub fn new(
        host: impl Into<String>,
        port: u16,
        model: impl Into<String>,
        system_template: impl Into<String>,
        temperature: f32,
        timeout_secs: u64,
    ) -> Self {
        let host = host.into();

        // Construct a proper URL with scheme and port
        let base_url = if host.starts_with("http://") || host.starts_with("https://") {
            let url_parts: Vec<&str> = host.split("://").collect();
            if url_parts.len() == 2 {
                let scheme = url_parts[0];
                let host_part = url_parts[1];

                if host_part.contains(':') {
                    host
                } else {
                    format!("{}://{}:{}", scheme, host_part, port)
                }
            } else {
                format!("http://localhost:{}", port)
            }
        } else {
            format!("http://{}:{}", host, port)
        };

        Self {
            base_url,
            client: Client::builder()
                .timeout(Duration::from_secs(timeout_secs))
                .http1_only()
                .pool_idle_timeout(Duration::from_secs(90))
                .pool_max_idle_per_host(20)
                .tcp_keepalive(Duration::from_secs(60))
                .build()
                .unwrap_or_default(),
            model: model.into(),
            system_template: system_template.into(),
            temperature,
        }
    }

    /// Chat with the Ollama API
    pub async fn chat(&self, request: ChatRequest) -> Result<ChatResponse, ProviderError> {
        let url = format!("{}/api/chat", self.base_url);

        let response = self
            .client
            .post(&url)
            .json(&request)
            .send()
            .await
            .map_err(|e| classify_transport_error("Ollama", e))?;

        let status = response.status();
        let response_text = response.text().await.map_err(|e| {
            ProviderError::RequestFailed(format!(
                "Failed to get response text from Ollama API: {}",
                e
            ))
        })?;

        if !status.is_success() {
            error!("Ollama API error ({}): {}", status, response_text);
            return Err(classify_http_failure(
                "Ollama",
                status.as_u16(),
                &response_text,
            ));
        }

        match serde_json::from_str::<ChatResponse>(&response_text) {
            Ok(chat_response) => Ok(chat_response),
            Err(e) => {
                error!(
                    "Failed to parse Ollama API chat response: {}. Raw response (first 500 chars): {}",
                    e,
                    response_text.chars().take(500).collect::<String>()
                );
                Self::recover_streamed_response(&response_text, &e)
            }
        }
    }

    /// Reassemble a JSONL streaming response into a single chat response
    ///
    /// When streaming was not disabled server-side, the body is one JSON
    /// object per line with the message content split across them.
    fn recover_streamed_response(
        response_text: &str,
        parse_error: &serde_json::Error,
    ) -> Result<ChatResponse, ProviderError> {
        let mut full_content = String::new();
        let mut model = String::new();
        let mut created_at = String::new();
        let mut saw_done = false;
        let mut prompt_eval_count = None;
        let mut eval_count = None;

        for line in response_text.lines().filter(|l| !l.trim().is_empty()) {
            let Ok(value) = serde_json::from_str::<serde_json::Value>(line) else {
                continue;
            };

            if let Some(part) = value
                .get("message")
                .and_then(|m| m.get("content"))
                .and_then(|v| v.as_str())
            {
                full_content.push_str(part);
            }
            if let Some(m) = value.get("model").and_then(|v| v.as_str()) {
                model = m.to_string();
            }
            if let Some(c) = value.get("created_at").and_then(|v| v.as_str()) {
                created_at = c.to_string();
            }
            if value.get("done").and_then(|v| v.as_bool()).unwrap_or(false) {
                saw_done = true;
                prompt_eval_count = value.get("prompt_eval_count").and_then(|v| v.as_u64());
                eval_count = value.get("eval_count").and_then(|v| v.as_u64());
            }
        }

        if full_content.is_empty() && !saw_done {
            return Err(ProviderError::ParseError(format!(
                "Ollama chat response contains invalid JSON: {}",
                parse_error
            )));
        }

        Ok(ChatResponse {
            model: if model.is_empty() {
                "unknown".to_string()
            } else {
                model
            },
            created_at,
            message: ChatMessage {
                role: "assistant".to_string(),
                content: full_content,
            },
            done: true,
            prompt_eval_count,
            eval_count,
        })
    }

    /// Get the Ollama API version
    pub async fn version(&self) -> Result<String, ProviderError> {
        let url = format!("{}/api/version", self.base_url);

        let response = self
            .client
            .get(&url)
            .send()
            .await
            .map_err(|e| classify_transport_error("Ollama", e))?;

        let status = response.status();
        if !status.is_success() {
            let error_text = response
                .text()
                .await
                .unwrap_or_else(|_| "Failed to get error response text".to_string());
            return Err(classify_http_failure("Ollama", status.as_u16(), &error_text));
        }

        let value: serde_json::Value = response.json().await.map_err(|e| {
            ProviderError::ParseError(format!("Failed to parse Ollama version response: {}", e))
        })?;

        value["version"]
            .as_str()
            .map(|s| s.to_string())
            .ok_or_else(|| {
                ProviderError::ParseError("Invalid version format in response".to_string())
            })
    }
}

#[async_trait]
impl Translator for Ollama {
    async fn translate_lines(
        &self,
        request: &TranslationRequest,
    ) -> Result<TranslationOutcome, ProviderError> {
        let system = protocol::render_system_prompt(
            &self.system_template,
            &request.source_language,
            &request.target_language,
        );
        let prompt = protocol::render_batch_prompt(request);

        let chat_request = ChatRequest::new(
            &self.model,
            vec![
                ChatMessage {
                    role: "system".to_string(),
                    content: system,
                },
                ChatMessage {
                    role: "user".to_string(),
                    content: prompt,
                },
            ],
        )
        .temperature(self.temperature);

        let response = self.chat(chat_request).await?;
        let resolved = protocol::parse_batch_response(&response.message.content);

        Ok(TranslationOutcome { resolved })
    }

    async fn test_connection(&self) -> Result<(), ProviderError> {
        self.version().await.map(|_| ())
    }

    fn name(&self) -> &str {
        "ollama"
    }
}
