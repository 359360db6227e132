/*!
 * Error types for the reelingo pipeline.
 *
 * This module contains custom error types for the different layers of the
 * pipeline, using the thiserror crate for ergonomic error definitions:
 * - `ProviderError`: a translation backend rejected or failed a call
 * - `MediaError`: the video source or transcriber collaborator failed
 * - `TranslationError`: the strategy router could not produce a result
 * - `JobError`: the job orchestrator refused an operation
 * - `AppError`: top-level wrapper used by the binary
 */

use thiserror::Error;

use crate::providers::Method;

/// Errors that can occur when working with provider APIs
#[derive(Error, Debug, Clone, PartialEq)]
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
        message: String,
    },

    /// Error establishing or maintaining a connection
    #[error("Connection error: {0}")]
    ConnectionError(String),

    /// Error related to rate limiting
    #[error("Rate limit exceeded: {0}")]
    RateLimitExceeded(String),

    /// Error with authentication (bad or missing API key)
    #[error("Authentication error: {0}")]
    AuthenticationError(String),

    /// The request was rejected as malformed (HTTP 400/422 or a local check)
    #[error("Invalid request: {0}")]
    InvalidRequest(String),
}

impl ProviderError {
    /// Map a non-success HTTP status and body to the matching error kind
    pub fn from_status(status_code: u16, message: impl Into<String>) -> Self {
        let message = message.into();
        match status_code {
            401 | 403 => Self::AuthenticationError(message),
            429 => Self::RateLimitExceeded(message),
            400 | 422 => Self::InvalidRequest(message),
            _ => Self::ApiError { status_code, message },
        }
    }

    /// Map a transport-level reqwest failure
    pub fn from_transport(error: reqwest::Error) -> Self {
        if error.is_timeout() || error.is_connect() {
            Self::ConnectionError(error.to_string())
        } else if let Some(status) = error.status() {
            Self::from_status(status.as_u16(), error.to_string())
        } else {
            Self::RequestFailed(error.to_string())
        }
    }

    /// Whether a retry of the same call may succeed.
    ///
    /// Transport failures, throttling and 5xx responses are transient;
    /// authentication and validation failures are not.
    pub fn is_retryable(&self) -> bool {
        match self {
            Self::RequestFailed(_) | Self::ConnectionError(_) | Self::RateLimitExceeded(_) => true,
            Self::ApiError { status_code, .. } => *status_code >= 500 || *status_code == 408,
            Self::ParseError(_) | Self::AuthenticationError(_) | Self::InvalidRequest(_) => false,
        }
    }

    /// Whether this is a credential problem rather than a call problem
    pub fn is_credential_error(&self) -> bool {
        matches!(self, Self::AuthenticationError(_))
    }
}

/// Errors raised by the external media collaborators
#[derive(Error, Debug, Clone, PartialEq)]
pub enum MediaError {
    #[error("Video is private: {0}")]
    PrivateVideo(String),

    #[error("Video not found: {0}")]
    NotFound(String),

    #[error("Invalid audio format: {0}")]
    InvalidAudioFormat(String),

    #[error("No audio track: {0}")]
    NoAudioTrack(String),

    #[error("Network error: {0}")]
    Network(String),

    #[error("Media error: {0}")]
    Other(String),
}

/// Errors that can occur during translation
#[derive(Error, Debug, Clone, PartialEq)]
pub enum TranslationError {
    /// Bad input, never retried
    #[error("Validation error: {0}")]
    Validation(String),

    /// Error from the provider API
    #[error("Provider error: {0}")]
    Provider(#[from] ProviderError),

    /// No usable provider, or the provider is misconfigured
    #[error("Configuration error: {0}")]
    Configuration(String),

    /// Overlap detection produced an inconsistent result
    #[error("Chunk merge error: {0}")]
    ChunkMerge(String),

    /// The translation was cancelled by the caller
    #[error("Cancelled: {0}")]
    Cancelled(String),

    /// Both the preferred method and its fallback failed
    #[error("Translation failed with {preferred_method} ({preferred}){}", fallback_suffix(.fallback))]
    FallbackExhausted {
        /// Method that was tried first
        preferred_method: Method,
        /// Error from the preferred method
        preferred: Box<TranslationError>,
        /// Error from the fallback method, if one was attempted
        fallback: Option<Box<TranslationError>>,
    },
}

fn fallback_suffix(fallback: &Option<Box<TranslationError>>) -> String {
    match fallback {
        Some(err) => format!("; fallback failed ({})", err),
        None => "; no fallback available".to_string(),
    }
}

impl TranslationError {
    /// Whether resubmitting the same request might succeed
    pub fn is_retryable(&self) -> bool {
        match self {
            Self::Provider(e) => e.is_retryable(),
            Self::Validation(_) | Self::Configuration(_) | Self::Cancelled(_) => false,
            Self::ChunkMerge(_) => true,
            Self::FallbackExhausted { preferred, fallback, .. } => {
                preferred.is_retryable() || fallback.as_ref().is_some_and(|f| f.is_retryable())
            }
        }
    }

    /// Whether a fallback to the alternate method family makes sense
    pub fn allows_fallback(&self) -> bool {
        !matches!(self, Self::Validation(_) | Self::Cancelled(_))
    }
}

impl From<MediaError> for TranslationError {
    fn from(error: MediaError) -> Self {
        match error {
            MediaError::PrivateVideo(_)
            | MediaError::NotFound(_)
            | MediaError::InvalidAudioFormat(_)
            | MediaError::NoAudioTrack(_) => Self::Validation(error.to_string()),
            MediaError::Network(msg) => Self::Provider(ProviderError::ConnectionError(msg)),
            MediaError::Other(msg) => Self::Provider(ProviderError::RequestFailed(msg)),
        }
    }
}

/// Errors returned by the job orchestrator
#[derive(Error, Debug, Clone, PartialEq)]
pub enum JobError {
    #[error("Job not found: {0}")]
    NotFound(String),

    #[error("Job queue is full ({0} queued)")]
    QueueFull(usize),

    #[error("Orchestrator is shutting down")]
    ShuttingDown,
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

    /// Error from translation
    #[error("Translation error: {0}")]
    Translation(#[from] TranslationError),

    /// Error from the job orchestrator
    #[error("Job error: {0}")]
    Job(#[from] JobError),

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
