//! Error types for the Agora crates.

/// Errors that can occur across the Agora crates.
///
/// All error variants are marked with `#[non_exhaustive]` to allow
/// adding new error types without breaking changes.
#[derive(Debug, thiserror::Error)]
#[non_exhaustive]
pub enum Error {
    /// Search backend error (connection failures, rejected requests, etc.)
    #[error("Search backend error: {message}")]
    Backend {
        /// Human-readable error message
        message: String,
        /// Source error if available
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    /// A requested resource does not exist
    #[error("Not found: {what}")]
    NotFound {
        /// What was looked up
        what: String,
    },

    /// Generic operation failure
    #[error("Operation failed: {message}")]
    Operation {
        /// What went wrong
        message: String,
    },

    /// Configuration error
    #[error("Configuration error: {message}")]
    Config {
        /// What configuration is problematic
        message: String,
    },

    /// I/O error (file operations, network, etc.)
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON serialization/deserialization error
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

/// Convenience `Result` type alias for Agora operations.
pub type Result<T> = std::result::Result<T, Error>;

impl Error {
    /// Returns whether this error is retryable.
    ///
    /// Retryable errors include transient failures like network timeouts
    /// and temporary backend unavailability.
    pub fn is_retryable(&self) -> bool {
        match self {
            Error::Backend { .. } => true,
            Error::Io(_) => true,
            Error::NotFound { .. } => false,
            Error::Operation { .. } => false,
            Error::Config { .. } => false,
            Error::Serialization(_) => false,
        }
    }

    /// Creates a new backend error with a message.
    pub fn backend<S: Into<String>>(message: S) -> Self {
        Error::Backend {
            message: message.into(),
            source: None,
        }
    }

    /// Creates a new backend error with a message and source error.
    pub fn backend_with_source<S, E>(message: S, source: E) -> Self
    where
        S: Into<String>,
        E: std::error::Error + Send + Sync + 'static,
    {
        Error::Backend {
            message: message.into(),
            source: Some(Box::new(source)),
        }
    }

    /// Creates a new not-found error.
    pub fn not_found<S: Into<String>>(what: S) -> Self {
        Error::NotFound { what: what.into() }
    }

    /// Creates a new operation error.
    pub fn operation<S: Into<String>>(message: S) -> Self {
        Error::Operation {
            message: message.into(),
        }
    }

    /// Creates a new configuration error.
    pub fn config<S: Into<String>>(message: S) -> Self {
        Error::Config {
            message: message.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = Error::backend("connection refused");
        assert_eq!(err.to_string(), "Search backend error: connection refused");
    }

    #[test]
    fn test_retryable_classification() {
        assert!(Error::backend("timeout").is_retryable());
        assert!(!Error::config("bad boost table").is_retryable());
        assert!(!Error::not_found("collection 'topic'").is_retryable());
        assert!(!Error::operation("schema mismatch").is_retryable());
    }

    #[test]
    fn test_backend_error_with_source() {
        let io_error = std::io::Error::other("broken pipe");
        let err = Error::backend_with_source("import failed", io_error);
        assert!(err.to_string().contains("import failed"));
        assert!(err.is_retryable());
    }

    #[test]
    fn test_error_implements_send_sync() {
        fn assert_send_sync<T: Send + Sync>() {}
        assert_send_sync::<Error>();
    }

    #[test]
    fn test_io_error_is_retryable() {
        let io_error = std::io::Error::new(std::io::ErrorKind::TimedOut, "timed out");
        let err: Error = io_error.into();
        assert!(err.is_retryable());
    }

    #[test]
    fn test_serde_error_not_retryable() {
        let serde_err = serde_json::from_str::<serde_json::Value>("{oops}").unwrap_err();
        let err: Error = serde_err.into();
        assert!(!err.is_retryable());
    }
}
