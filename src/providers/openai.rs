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

/// OpenAI client for interacting with the chat completions API
#[derive(Debug)]
pub struct OpenAI {
    /// HTTP client for API requests
    client: Client,
    /// API key for authentication
    api_key: String,
    /// API endpoint URL (optional, defaults to the public API)
    endpoint: String,
    /// Model name to use
    model: String,
    /// System prompt template from configuration
    system_template: String,
    /// Sampling temperature
    temperature: f32,
}

/// OpenAI chat completion request
#[derive(Debug, Serialize)]
pub struct OpenAIRequest {
    /// The model to use
    model: String,

    /// The messages for the conversation
    messages: Vec<OpenAIMessage>,

    /// Temperature for generation
    #[serde(skip_serializing_if = "Option::is_none")]
    temperature: Option<f32>,

    /// Maximum number of tokens to generate
    #[serde(skip_serializing_if = "Option::is_none")]
    max_tokens: Option<u32>,
}

/// OpenAI message format
#[derive(Debug, Serialize, Deserialize)]
pub struct OpenAIMessage {
    /// Role of the message sender (system, user, assistant)
    pub role: String,

    /// Content of the message
    pub content: String,
}

/// Token usage information
#[derive(Debug, Deserialize)]
pub struct OpenAIUsage {
    /// Number of prompt tokens
    pub prompt_tokens: u32,
    /// Number of completion tokens
    pub completion_tokens: u32,
    /// Total tokens billed
    pub total_tokens: u32,
}

/// One choice in an OpenAI chat completion response
#[derive(Debug, Deserialize)]
pub struct OpenAIChoice {
    /// The generated message
    pub message: OpenAIMessage,

    /// Why generation stopped
    #[serde(default)]
    pub finish_reason: Option<String>,
}

/// OpenAI chat completion response
#[derive(Debug, Deserialize)]
pub struct OpenAIResponse {
    /// Generated choices
    pub choices: Vec<OpenAIChoice>,

    /// Token usage information
    #[serde(default)]
    pub usage: Option<OpenAIUsage>,
}

impl OpenAIRequest {
    /// Create a new chat completion request
    pub fn new(model: impl Into<String>) -> Self {
        Self {
            model: model.into(),
            messages: Vec::new(),
            temperature: None,
            max_tokens: None,
        }
    }

    /// Add a message to the request
    pub fn add_message(mut self, role: impl Into<String>, content: impl Into<String>) -> Self {
        self.messages.push(OpenAIMessage {
            role: role.into(),
            content: content.into(),
        });
        self
    }

    /// Set the temperature
    pub fn temperature(mut self, temperature: f32) -> Self {
        self.temperature = Some(temperature);
        self
    }

    /// Set the maximum number of tokens
    pub fn max_tokens(mut self, max_tokens: u32) -> Self {
        self.max_tokens = Some(max_tokens);
        self
    }
}

impl OpenAI {
    /// Create a new OpenAI client
    pub fn new(
        api_key: impl Into<String>,
        endpoint: impl Into<String>,
        model: impl Into<String>,
        system_template: impl Into<String>,
        temperature: f32,
        timeout_secs: u64,
    ) -> Self {
        Self {
            client: Client::builder()
                .timeout(Duration::from_secs(timeout_secs))
                .build()
                .unwrap_or_default(),
            api_key: api_key.into(),
            endpoint: endpoint.into(),
            model: model.into(),
            system_template: system_template.into(),
            temperature,
        }
    }

    fn base_url(&self) -> String {
        if self.endpoint.is_empty() {
            "https://api.openai.com/v1".to_string()
        } else {
            self.endpoint.trim_end_matches('/').to_string()
        }
    }

    /// Complete a chat completion request
    pub async fn complete(&self, request: OpenAIRequest) -> Result<OpenAIResponse, ProviderError> {
        let api_url = format!("{}/chat/completions", self.base_url());

        let response = self
            .client
            .post(&api_url)
            .header("Content-Type", "application/json")
            .bearer_auth(&self.api_key)
            .json(&request)
            .send()
            .await
            .map_err(|e| classify_transport_error("OpenAI", e))?;

        let status = response.status();
        if !status.is_success() {
            let error_text = response
                .text()
                .await
                .unwrap_or_else(|_| "Failed to get error response text".to_string());
            error!("OpenAI API error ({}): {}", status, error_text);
            return Err(classify_http_failure(
                "OpenAI",
                status.as_u16(),
                &error_text,
            ));
        }

        response.json::<OpenAIResponse>().await.map_err(|e| {
            ProviderError::ParseError(format!("Failed to parse OpenAI API response: {}", e))
        })
    }

    /// Extract text from an OpenAI response
    pub fn extract_text_from_response(response: &OpenAIResponse) -> String {
        response
            .choices
            .first()
            .map(|choice| choice.message.content.clone())
            .unwrap_or_default()
    }
}

#[async_trait]
impl Translator for OpenAI {
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

        let api_request = OpenAIRequest::new(&self.model)
            .add_message("system", system)
            .add_message("user", prompt)
            .temperature(self.temperature);

        let response = self.complete(api_request).await?;
        let text = Self::extract_text_from_response(&response);
        let resolved = protocol::parse_batch_response(&text);

        Ok(TranslationOutcome { resolved })
    }

    async fn test_connection(&self) -> Result<(), ProviderError> {
        let api_url = format!("{}/models", self.base_url());

        let response = self
            .client
            .get(&api_url)
            .bearer_auth(&self.api_key)
            .send()
            .await
            .map_err(|e| classify_transport_error("OpenAI", e))?;

        let status = response.status();
        if !status.is_success() {
            let error_text = response
                .text()
                .await
                .unwrap_or_else(|_| "Failed to get error response text".to_string());
            return Err(classify_http_failure(
                "OpenAI",
                status.as_u16(),
                &error_text,
            ));
        }

        Ok(())
    }

    fn name(&self) -> &str {
        "openai"
    }
}
