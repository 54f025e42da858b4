//! Error types for backend operations.

/// Errors reported by a backend connection.
#[derive(Debug, thiserror::Error)]
pub enum BackendError {
    /// Could not reach the backend (refused, reset, dropped).
    #[error("connection error: {0}")]
    Connection(String),

    /// The backend did not answer within its deadline.
    #[error("operation timed out: {0}")]
    Timeout(String),

    /// The backend answered with something unintelligible.
    #[error("protocol error: {0}")]
    Protocol(String),

    /// The key holds a value of a different data type.
    #[error("wrong type: key {key} does not hold a {expected}")]
    WrongType {
        /// The key that was accessed.
        key: String,
        /// The data type the operation expected.
        expected: &'static str,
    },

    /// An I/O error occurred.
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}
