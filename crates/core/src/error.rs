//! Error types for the loopclaw domain.
//!
//! Uses `thiserror` for ergonomic error definitions.
//! Only [`Error`] ever leaves the agent loop; [`ToolError`] is always
//! turned into tool-result text by the dispatcher.

use thiserror::Error;

/// The top-level error type for a run. Every variant is fatal.
#[derive(Debug, Error)]
pub enum Error {
    // --- Configuration errors ---
    #[error("Configuration error: {message}")]
    Config { message: String },

    // --- Provider errors ---
    #[error("Provider error: {0}")]
    Provider(#[from] ProviderError),

    #[error("Provider returned no response candidates")]
    NoResponse,

    // --- Loop guard ---
    #[error("Model still requested tools after {max_turns} turns")]
    MaxTurnsExceeded { max_turns: u32 },
}

/// Result type alias using our Error.
pub type Result<T> = std::result::Result<T, Error>;

impl Error {
    pub fn config(message: impl Into<String>) -> Self {
        Self::Config {
            message: message.into(),
        }
    }
}

// --- Bounded context errors ---

#[derive(Debug, Clone, Error)]
pub enum ProviderError {
    #[error("API request failed: {message} (status: {status_code})")]
    ApiError { status_code: u16, message: String },

    #[error("Rate limited by provider{}", retry_hint(.retry_after_secs))]
    RateLimited { retry_after_secs: Option<u64> },

    #[error("Authentication failed: {0}")]
    AuthenticationFailed(String),

    #[error("Provider not configured: {0}")]
    NotConfigured(String),

    #[error("Request timed out: {0}")]
    Timeout(String),

    #[error("Network error: {0}")]
    Network(String),
}

fn retry_hint(retry_after_secs: &Option<u64>) -> String {
    match retry_after_secs {
        Some(secs) => format!(", retry after {secs}s"),
        None => String::new(),
    }
}

#[derive(Debug, Clone, Error)]
pub enum ToolError {
    #[error("Unsupported tool: {0}")]
    Unsupported(String),

    #[error("Invalid tool arguments: {0}")]
    InvalidArguments(String),

    #[error("Tool execution failed: {tool_name}: {reason}")]
    ExecutionFailed { tool_name: String, reason: String },

    #[error("Tool timed out: {tool_name} after {timeout_secs}s")]
    Timeout { tool_name: String, timeout_secs: u64 },

    #[error("Permission denied: {tool_name}: {reason}")]
    PermissionDenied { tool_name: String, reason: String },
}

impl ToolError {
    /// Shorthand for a required argument that is absent or not a string.
    pub fn missing_argument(key: &str) -> Self {
        Self::InvalidArguments(format!("Missing '{key}' argument"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn provider_error_displays_correctly() {
        let err = Error::Provider(ProviderError::ApiError {
            status_code: 429,
            message: "Too many requests".into(),
        });
        assert!(err.to_string().contains("429"));
        assert!(err.to_string().contains("Too many requests"));
    }

    #[test]
    fn rate_limit_mentions_delay_only_when_known() {
        let known = ProviderError::RateLimited {
            retry_after_secs: Some(7),
        };
        assert_eq!(
            known.to_string(),
            "Rate limited by provider, retry after 7s"
        );

        let unknown = ProviderError::RateLimited {
            retry_after_secs: None,
        };
        assert_eq!(unknown.to_string(), "Rate limited by provider");
    }

    #[test]
    fn max_turns_names_the_limit() {
        let err = Error::MaxTurnsExceeded { max_turns: 7 };
        assert!(err.to_string().contains('7'));
    }

    #[test]
    fn missing_argument_names_the_key() {
        let err = ToolError::missing_argument("file_path");
        assert_eq!(
            err.to_string(),
            "Invalid tool arguments: Missing 'file_path' argument"
        );
    }

    #[test]
    fn unsupported_tool_displays_name() {
        let err = ToolError::Unsupported("Delete".into());
        assert_eq!(err.to_string(), "Unsupported tool: Delete");
    }
}
