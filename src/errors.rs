/*!
 * Error types for the dualsub application.
 *
 * This module contains custom error types for different parts of the application,
 * using the thiserror crate for ergonomic error definitions. Provider failures
 * carry their classification as data: the retry machinery asks `is_terminal()`
 * instead of inspecting message text.
 */

// Allow dead code - error types are for library consumers
#![allow(dead_code)]

use thiserror::Error;

/// Errors that can occur when working with provider APIs
#[derive(Error, Debug)]
pub enum ProviderError {
    /// Error when making an API request fails
    #[error("API request failed: {0}")]
    RequestFailed(String),

    /// Error when parsing an API response fails
    #[error("Failed to parse API response: {0}")]
    ParseError(String),

    /// Error returned by the API itself
    #[error("API responded with error: {status_code} - {message}")]
    ApiError {
        /// HTTP status code
        status_code: u16,
        /// Error message from the API
        message: String
    },

    /// Error establishing or maintaining a connection
    #[error("Connection error: {0}")]
    ConnectionError(String),

    /// Request exceeded the client timeout
    #[error("Request timed out: {0}")]
    RequestTimeout(String),

    /// Error related to rate limiting
    #[error("Rate limit exceeded: {0}")]
    RateLimitExceeded(String),

    /// Service reported overload (HTTP 5xx with a retryable hint)
    #[error("Service overloaded: {0}")]
    ServerOverloaded(String),

    /// Error with authentication
    #[error("Authentication error: {0}")]
    AuthenticationError(String),

    /// Quota or billing exhaustion reported by the service
    #[error("Quota exhausted: {0}")]
    QuotaExhausted(String),
}

impl ProviderError {
    /// Whether this failure halts the run. Terminal failures cannot be
    /// resolved by retrying; everything else is treated as transient.
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            ProviderError::AuthenticationError(_) | ProviderError::QuotaExhausted(_)
        )
    }
}

/// Errors that can occur during subtitle processing
#[derive(Error, Debug)]
pub enum SubtitleError {
    /// Error parsing a timestamp in an SRT file
    #[error("Invalid timestamp: {0}")]
    InvalidTimestamp(String),

    /// A cue block was missing its timing separator
    #[error("Malformed cue at sequence {0}")]
    MalformedCue(usize),
}

/// Errors that can occur during a translation run
#[derive(Error, Debug)]
pub enum TranslationError {
    /// Error from the provider API
    #[error("Provider error: {0}")]
    Provider(#[from] ProviderError),

    /// Error with subtitle processing
    #[error("Subtitle error: {0}")]
    Subtitle(#[from] SubtitleError),

    /// The run was cancelled before completion
    #[error("Translation cancelled")]
    Cancelled,

    /// Lines remained untranslated after all recovery rounds
    #[error("Translation incomplete: {missing} lines missing")]
    Incomplete {
        /// Number of lines with no translation after the final sweep
        missing: usize
    },
}

/// Main application error type that wraps all other errors
#[derive(Error, Debug)]
pub enum AppError {
    /// Error from a file operation
    #[error("File error: {0}")]
    File(String),

    /// Error from a provider
    #[error("Provider error: {0}")]
    Provider(#[from] ProviderError),

    /// Error from subtitle processing
    #[error("Subtitle error: {0}")]
    Subtitle(#[from] SubtitleError),

    /// Error from translation
    #[error("Translation error: {0}")]
    Translation(#[from] TranslationError),

    /// Any other error
    #[error("Unknown error: {0}")]
    Unknown(String),
}

// Utility functions for error conversion
impl From<anyhow::Error> for AppError {
    fn from(error: anyhow::Error) -> Self {
        Self::Unknown(error.to_string())
    }
}

impl From<std::io::Error> for AppError {
    fn from(error: std::io::Error) -> Self {
        Self::File(error.to_string())
    }
}
