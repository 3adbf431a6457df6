//! Error types for the Cutout inference core
//!
//! The taxonomy mirrors the job lifecycle: configuration problems are
//! recovered locally (logged, never surfaced), every other kind terminates
//! the job and reaches the caller as a single normalized failure. The
//! caller owns user-facing presentation; `user_message` provides the text.

use std::time::Duration;
use thiserror::Error;

/// Result type for Cutout inference operations
pub type CutoutResult<T> = Result<T, CutoutError>;

/// Main error type for Cutout inference operations
#[derive(Error, Debug)]
pub enum CutoutError {
    /// Configuration errors
    ///
    /// Only surfaced when the caller loads settings explicitly; inside the
    /// best-effort configuration path these are logged and swallowed.
    #[error("Configuration error: {0}")]
    Configuration(#[from] CutoutConfigError),

    /// Engine module could not be loaded
    #[error("Engine load failed: {0}")]
    EngineLoad(String),

    /// Deadline elapsed before the engine call settled
    #[error("Operation timed out after {timeout_ms}ms: {operation}")]
    Timeout {
        /// Deadline duration in milliseconds
        timeout_ms: u64,
        /// Description of the operation that timed out
        operation: String,
    },

    /// Engine call rejected; wraps the original failure's description
    #[error("Inference failed: {0}")]
    Inference(String),

    /// Engine call succeeded but the payload could not be packaged
    #[error("Result packaging failed: {0}")]
    ResultPackaging(String),
}

/// Configuration-specific errors
#[derive(Error, Debug)]
pub enum CutoutConfigError {
    /// Missing required configuration field
    #[error("Missing required field: {0}")]
    MissingField(String),

    /// Invalid configuration value provided
    #[error("Invalid value for {field}: {value} (reason: {reason})")]
    InvalidValue {
        /// Configuration field name
        field: String,
        /// Invalid value provided
        value: String,
        /// Reason why value is invalid
        reason: String,
    },

    /// Configuration validation failed
    #[error("Configuration validation failed: {0}")]
    ValidationFailed(String),

    /// File read/write error
    #[error("File read error: {0}")]
    FileRead(String),

    /// Configuration parsing error
    #[error("Parse error: {0}")]
    Parse(String),
}

impl CutoutError {
    /// Creates an engine load error
    pub fn engine_load(message: impl Into<String>) -> Self {
        Self::EngineLoad(message.into())
    }

    /// Creates a timeout error with operation context
    pub fn timeout(timeout: Duration, operation: impl Into<String>) -> Self {
        Self::Timeout {
            timeout_ms: timeout.as_millis() as u64,
            operation: operation.into(),
        }
    }

    /// Creates an inference error wrapping the engine's failure description
    pub fn inference(message: impl Into<String>) -> Self {
        Self::Inference(message.into())
    }

    /// Creates a result packaging error
    pub fn result_packaging(message: impl Into<String>) -> Self {
        Self::ResultPackaging(message.into())
    }

    /// Get user-friendly error message
    ///
    /// The orchestration layer never renders UI; callers map jobs' failures
    /// to whatever surface they own using this text.
    #[must_use]
    pub fn user_message(&self) -> String {
        match self {
            Self::Configuration(_) => "The service is misconfigured.".to_string(),
            Self::EngineLoad(_) => {
                "The background removal engine is unavailable.".to_string()
            }
            Self::Timeout { .. } => {
                "Background removal timed out. Please try a smaller photo.".to_string()
            }
            Self::Inference(_) => "Background removal failed. Please try again.".to_string(),
            Self::ResultPackaging(_) => {
                "The processed photo could not be read. Please try again.".to_string()
            }
        }
    }

    /// Whether this failure leaves the input photo untouched and retriable
    #[must_use]
    pub const fn is_retriable(&self) -> bool {
        // No retries happen in this layer; the caller may re-run the job.
        match self {
            Self::Configuration(_) => false,
            Self::EngineLoad(_) | Self::Timeout { .. } | Self::Inference(_) => true,
            Self::ResultPackaging(_) => true,
        }
    }
}

/// Convert from validator errors
impl From<validator::ValidationErrors> for CutoutConfigError {
    fn from(err: validator::ValidationErrors) -> Self {
        let messages: Vec<String> = err
            .field_errors()
            .iter()
            .flat_map(|(field, errors)| {
                errors.iter().map(move |error| {
                    format!(
                        "{}: {}",
                        field,
                        error
                            .message
                            .as_ref()
                            .unwrap_or(&std::borrow::Cow::Borrowed("validation error"))
                    )
                })
            })
            .collect();

        Self::ValidationFailed(messages.join(", "))
    }
}

impl From<validator::ValidationErrors> for CutoutError {
    fn from(err: validator::ValidationErrors) -> Self {
        Self::Configuration(CutoutConfigError::from(err))
    }
}
