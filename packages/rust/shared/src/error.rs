//! Error types for the EDD research tool.
//!
//! Library crates use [`EddError`] via `thiserror`.
//! The CLI wraps this with `color-eyre` for rich diagnostics.

use std::path::PathBuf;

/// Top-level error type for all EDD operations.
#[derive(Debug, thiserror::Error)]
pub enum EddError {
    /// Configuration loading or validation error.
    #[error("config error: {message}")]
    Config { message: String },

    /// Invalid request input (empty query, malformed region, unknown mode).
    #[error("validation error: {message}")]
    Validation { message: String },

    /// The agent framework is not available in this process.
    #[error("backend unavailable: {0}")]
    BackendUnavailable(String),

    /// Network-level failure reaching a remote endpoint.
    #[error("transport error: {0}")]
    Transport(String),

    /// Non-2xx response from a remote endpoint.
    #[error("upstream error (HTTP {status}): {message}")]
    Upstream { status: u16, message: String },

    /// A 2xx response whose body could not be decoded.
    #[error("decode error: {0}")]
    Decode(String),

    /// The agent pipeline failed.
    #[error("pipeline error: {0}")]
    Pipeline(String),

    /// Filesystem I/O error.
    #[error("I/O error at {path:?}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },
}

/// Convenience alias used throughout the codebase.
pub type Result<T> = std::result::Result<T, EddError>;

impl EddError {
    /// Create a config error from any displayable message.
    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config {
            message: msg.into(),
        }
    }

    /// Create a validation error from any displayable message.
    pub fn validation(msg: impl Into<String>) -> Self {
        Self::Validation {
            message: msg.into(),
        }
    }

    /// Wrap a `std::io::Error` with a path for context.
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }
}

/// Render an error followed by each of its sources, joined by `": "`.
pub fn error_chain(err: &dyn std::error::Error) -> String {
    let mut message = err.to_string();
    let mut source = err.source();
    while let Some(cause) = source {
        let text = cause.to_string();
        // Some wrappers repeat their source's text verbatim.
        if !message.ends_with(&text) {
            message.push_str(": ");
            message.push_str(&text);
        }
        source = cause.source();
    }
    message
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn error_display_formatting() {
        let err = EddError::config("missing API key");
        assert_eq!(err.to_string(), "config error: missing API key");

        let err = EddError::validation("query must not be empty");
        assert!(err.to_string().contains("must not be empty"));
    }

    #[test]
    fn upstream_display_includes_status() {
        let err = EddError::Upstream {
            status: 401,
            message: "401 Unauthorized".into(),
        };
        assert_eq!(err.to_string(), "upstream error (HTTP 401): 401 Unauthorized");
    }

    #[test]
    fn error_chain_includes_sources() {
        let io = std::io::Error::new(std::io::ErrorKind::ConnectionRefused, "connection refused");
        let err = EddError::io("/tmp/edd.toml", io);
        assert_eq!(
            error_chain(&err),
            "I/O error at \"/tmp/edd.toml\": connection refused"
        );

        let plain = EddError::validation("bad region");
        assert_eq!(error_chain(&plain), "validation error: bad region");
    }
}
