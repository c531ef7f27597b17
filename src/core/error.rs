//! Unified error handling for reqflow
//!
//! This module provides a centralized error type so that the transport,
//! identity, and form layers do not need to depend on each other for
//! error handling.

use std::fmt;

/// Unified error types for the request client
#[derive(Debug)]
pub enum FlowError {
    /// Network and I/O errors raised by a transport
    Network(std::io::Error),

    /// Transport-level timeout
    Timeout(String),

    /// JSON serialization/deserialization failures
    Serialization(serde_json::Error),

    /// Query-string encoding failures
    Encoding(String),

    /// Invalid caller input (bad URL, non-object params, ...)
    InvalidInput(String),

    /// Internal system errors
    Internal(String),
}

impl fmt::Display for FlowError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FlowError::Network(err) => write!(f, "Network error: {err}"),
            FlowError::Timeout(msg) => write!(f, "Timeout: {msg}"),
            FlowError::Serialization(err) => write!(f, "Serialization error: {err}"),
            FlowError::Encoding(msg) => write!(f, "Encoding error: {msg}"),
            FlowError::InvalidInput(msg) => write!(f, "Invalid input: {msg}"),
            FlowError::Internal(msg) => write!(f, "Internal error: {msg}"),
        }
    }
}

impl std::error::Error for FlowError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            FlowError::Network(err) => Some(err),
            FlowError::Serialization(err) => Some(err),
            _ => None,
        }
    }
}

// Error conversions
impl From<std::io::Error> for FlowError {
    fn from(err: std::io::Error) -> Self {
        FlowError::Network(err)
    }
}

impl From<serde_json::Error> for FlowError {
    fn from(err: serde_json::Error) -> Self {
        FlowError::Serialization(err)
    }
}

/// Result type alias for client operations
pub type FlowResult<T> = std::result::Result<T, FlowError>;

/// Helper trait for adding context to errors
pub trait ErrorContext<T> {
    fn with_context(self, context: &str) -> FlowResult<T>;
}

impl<T, E> ErrorContext<T> for std::result::Result<T, E>
where
    E: fmt::Display,
{
    fn with_context(self, context: &str) -> FlowResult<T> {
        self.map_err(|e| FlowError::Internal(format!("{context}: {e}")))
    }
}

/// Convenience macro for error creation
#[macro_export]
macro_rules! internal_error {
    ($msg:expr) => {
        $crate::core::error::FlowError::Internal($msg.to_string())
    };
    ($fmt:expr, $($arg:tt)*) => {
        $crate::core::error::FlowError::Internal(format!($fmt, $($arg)*))
    };
}
