/*!
 * Provider clients for the translation services dualsub can talk to.
 *
 * This module contains client implementations for the supported LLM providers:
 * - Ollama: Local LLM server
 * - OpenAI: OpenAI API integration
 * - Anthropic: Anthropic API integration
 *
 * All providers speak the same line-marker protocol (see `protocol`) and are
 * used through the `Translator` trait, so the pipeline never needs to know
 * which service is behind a request.
 */

use std::collections::HashMap;
use std::fmt::Debug;
use std::sync::Arc;

use anyhow::{Result, anyhow};
use async_trait::async_trait;
use url::Url;

use crate::app_config::{GlossaryTerm, TranslationConfig, TranslationProvider};
use crate::errors::ProviderError;
use crate::pipeline::chunk::ContextLine;
use crate::subtitle_processor::SubtitleEntry;
use crate::timing::{max_chars_for_budget, visible_char_count};

/// A single subtitle line submitted for translation
#[derive(Debug, Clone)]
pub struct RequestLine {
    /// Stable line identifier, carried through the marker protocol
    pub id: usize,

    /// Source dialogue text
    pub text: String,

    /// Character cap for the translation, present only when the line's
    /// duration budget is tighter than what the source already needs
    pub max_chars: Option<usize>,
}

impl RequestLine {
    /// Build a request line for a subtitle entry, attaching a length cap
    /// when the duration budget cannot absorb text longer than the source.
    pub fn for_entry(entry: &SubtitleEntry, budget_ms: Option<u64>) -> Self {
        let max_chars = budget_ms
            .map(max_chars_for_budget)
            .filter(|cap| *cap < visible_char_count(&entry.source_text).max(1));

        Self {
            id: entry.id,
            text: entry.source_text.clone(),
            max_chars,
        }
    }
}

/// A provider-agnostic batch translation request
#[derive(Debug, Clone)]
pub struct TranslationRequest {
    /// Lines to translate in this call
    pub lines: Vec<RequestLine>,

    /// Source language name or code
    pub source_language: String,

    /// Target language name or code
    pub target_language: String,

    /// Free-form description of the program, injected into the prompt
    pub context: Option<String>,

    /// Trailing dialogue from the preceding block, for continuity
    pub previous_lines: Vec<ContextLine>,

    /// Terminology the model must apply verbatim
    pub glossary: Vec<GlossaryTerm>,
}

impl TranslationRequest {
    /// Create a request template carrying the run-wide fields. Per-batch
    /// fields stay empty until `for_lines` stamps out a concrete request.
    pub fn template(
        source_language: impl Into<String>,
        target_language: impl Into<String>,
        context: Option<String>,
        glossary: Vec<GlossaryTerm>,
    ) -> Self {
        Self {
            lines: Vec::new(),
            source_language: source_language.into(),
            target_language: target_language.into(),
            context,
            previous_lines: Vec::new(),
            glossary,
        }
    }

    /// Derive a concrete request for one batch of lines
    pub fn for_lines(&self, lines: Vec<RequestLine>, previous_lines: Vec<ContextLine>) -> Self {
        Self {
            lines,
            previous_lines,
            ..self.clone()
        }
    }

    /// Identifiers of the lines in this request, in order
    pub fn line_ids(&self) -> Vec<usize> {
        self.lines.iter().map(|line| line.id).collect()
    }
}

/// Structured result of one batch translation call
#[derive(Debug, Default)]
pub struct TranslationOutcome {
    /// Translations keyed by line id. Ids absent here were requested but
    /// not returned by the service; that is not an error by itself.
    pub resolved: HashMap<usize, String>,
}

impl TranslationOutcome {
    /// Number of lines the service resolved
    pub fn resolved_count(&self) -> usize {
        self.resolved.len()
    }

    /// Requested ids the service did not resolve, in request order
    pub fn missing_from(&self, requested: &[usize]) -> Vec<usize> {
        requested
            .iter()
            .copied()
            .filter(|id| !self.resolved.contains_key(id))
            .collect()
    }
}

/// Common trait for all translation providers
///
/// The pipeline holds providers as `Arc<dyn Translator>`, so the trait is
/// object safe: requests and outcomes are concrete types rather than
/// per-provider associated types.
#[async_trait]
pub trait Translator: Send + Sync + Debug {
    /// Translate a batch of lines
    ///
    /// # Arguments
    /// * `request` - The lines to translate plus run-wide prompt material
    ///
    /// # Returns
    /// * `Result<TranslationOutcome, ProviderError>` - Whatever the service
    ///   resolved. A response covering only part of the batch is still `Ok`;
    ///   the caller decides what to do about the remainder.
    async fn translate_lines(
        &self,
        request: &TranslationRequest,
    ) -> Result<TranslationOutcome, ProviderError>;

    /// Probe the connection to the provider
    ///
    /// # Returns
    /// * `Result<(), ProviderError>` - Ok if the service is reachable and
    ///   credentials are accepted
    async fn test_connection(&self) -> Result<(), ProviderError>;

    /// Short provider name for logs and progress messages
    fn name(&self) -> &str;
}

/// Map a non-success HTTP status to the matching provider error
///
/// Auth and quota failures come back as terminal variants; rate limiting
/// and server overload as transient ones. A 429 whose body mentions quota
/// or billing is treated as exhausted credit rather than throttling.
pub(crate) fn classify_http_failure(provider: &str, status_code: u16, body: &str) -> ProviderError {
    let message = format!("{} API error ({}): {}", provider, status_code, body);
    match status_code {
        401 | 403 => ProviderError::AuthenticationError(message),
        402 => ProviderError::QuotaExhausted(message),
        429 => {
            let lowered = body.to_lowercase();
            if lowered.contains("quota") || lowered.contains("billing") || lowered.contains("credit")
            {
                ProviderError::QuotaExhausted(message)
            } else {
                ProviderError::RateLimitExceeded(message)
            }
        }
        500 | 502 | 503 | 529 => ProviderError::ServerOverloaded(message),
        _ => ProviderError::ApiError {
            status_code,
            message,
        },
    }
}

/// Map a transport-level failure to the matching provider error
pub(crate) fn classify_transport_error(provider: &str, err: reqwest::Error) -> ProviderError {
    let message = format!("Failed to send request to {} API: {}", provider, err);
    if err.is_timeout() {
        ProviderError::RequestTimeout(message)
    } else if err.is_connect() {
        ProviderError::ConnectionError(message)
    } else {
        ProviderError::RequestFailed(message)
    }
}

/// Parse an endpoint string into host and port components
fn parse_endpoint(endpoint: &str) -> Result<(String, u16)> {
    if endpoint.is_empty() {
        return Err(anyhow!("Endpoint cannot be empty"));
    }

    let url = if endpoint.starts_with("http://") || endpoint.starts_with("https://") {
        Url::parse(endpoint)?
    } else {
        Url::parse(&format!("http://{}", endpoint))?
    };

    let host = url
        .host_str()
        .ok_or_else(|| anyhow!("Invalid host in endpoint: {}", endpoint))?
        .to_string();

    let port = url
        .port()
        .unwrap_or(if url.scheme() == "https" { 443 } else { 80 });

    Ok((host, port))
}

/// Build the provider client selected by the configuration
pub fn create_translator(config: &TranslationConfig) -> Result<Arc<dyn Translator>> {
    let common = &config.common;

    match config.provider {
        TranslationProvider::Ollama => {
            let (host, port) = parse_endpoint(&config.get_endpoint())?;
            Ok(Arc::new(ollama::Ollama::new(
                host,
                port,
                config.get_model(),
                common.system_prompt.clone(),
                common.temperature,
                config.get_timeout_secs(),
            )))
        }
        TranslationProvider::OpenAI => Ok(Arc::new(openai::OpenAI::new(
            config.get_api_key(),
            config.get_endpoint(),
            config.get_model(),
            common.system_prompt.clone(),
            common.temperature,
            config.get_timeout_secs(),
        ))),
        TranslationProvider::Anthropic => Ok(Arc::new(anthropic::Anthropic::new(
            config.get_api_key(),
            config.get_endpoint(),
            config.get_model(),
            common.system_prompt.clone(),
            common.temperature,
            config.get_timeout_secs(),
        ))),
    }
}

pub mod protocol;
pub mod ollama;
pub mod openai;
pub mod anthropic;
pub mod mock;
