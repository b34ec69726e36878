//! Error types for tds-login

use thiserror::Error;

use crate::protocol::tokens::DecodeError;

/// Main error type for a login attempt
#[derive(Error, Debug)]
pub enum TdsError {
    /// I/O error from the packet transport
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// LOGIN7 encoding precondition violated (caller bug)
    #[error("Encoding error: {0}")]
    Encoding(String),

    /// Token stream decoding error; fatal for the connection
    #[error("Protocol error: {0}")]
    Protocol(String),

    /// The security context provider could not produce an initial token
    #[error("Authentication setup error: {0}")]
    AuthSetup(String),

    /// The security context provider rejected a server continuation token
    #[error("Authentication handshake error: {0}")]
    AuthHandshake(String),

    /// The server rejected the login with an error-severity message
    #[error("Server rejected login (number {number}, severity {severity}): {message}")]
    ServerRejection {
        /// Server-provided error number
        number: i32,
        /// Error severity class
        severity: u8,
        /// Server-provided message text
        message: String,
    },

    /// The connection was torn down mid-handshake
    #[error("Connection closed: {0}")]
    ConnectionClosed(String),
}

/// Result type alias for TdsError
pub type Result<T> = std::result::Result<T, TdsError>;

impl From<DecodeError> for TdsError {
    fn from(err: DecodeError) -> Self {
        TdsError::Protocol(err.to_string())
    }
}
