//! Error types module
//!
//! Every fallible client operation returns a `ClientError`. The variants follow
//! the four-way taxonomy the engine reacts to:
//!
//! * `Validation` - detected locally, never sent to the network
//! * `Network` - transport failure or timeout, retryable by the user
//! * `Server` - non-2xx response or an error envelope
//! * `Auth` - 401 class, invalidates the whole session
//!
//! `SessionClosed` is raised when an operation starts (or finishes) after the
//! session was cleared; its result must not be applied anywhere.

use std::io;

use crate::validation::ValidationError;

/// Generic message shown when the server gives no reason.
pub const GENERIC_SERVER_MESSAGE: &str = "Request failed";

/// Log level for error reporting
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogLevel {
    /// Debug level - for expected errors like validation failures
    Debug,
    /// Warning level - for recoverable issues like transient network failures
    Warn,
    /// Error level - for unexpected failures
    Error,
}

/// Coarse classification of a `ClientError`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    Validation,
    Network,
    Server,
    Auth,
    Session,
    Decode,
    Io,
}

#[derive(Debug, thiserror::Error)]
pub enum ClientError {
    #[error("Validation error: {0}")]
    Validation(#[from] ValidationError),

    #[error("Network error: {0}")]
    Network(String),

    #[error("Server error: {message}")]
    Server {
        status: Option<u16>,
        message: String,
    },

    #[error("Unauthorized: {0}")]
    Auth(String),

    #[error("No active session")]
    SessionClosed,

    #[error("Failed to decode response: {0}")]
    Decode(String),

    #[error("IO error: {0}")]
    Io(#[from] io::Error),
}

impl ClientError {
    /// Build a server error, falling back to the generic message when the
    /// server did not provide one.
    pub fn server(status: Option<u16>, message: Option<String>) -> Self {
        let message = message
            .map(|m| m.trim().to_string())
            .filter(|m| !m.is_empty())
            .unwrap_or_else(|| GENERIC_SERVER_MESSAGE.to_string());
        ClientError::Server { status, message }
    }

    pub fn kind(&self) -> ErrorKind {
        match self {
            ClientError::Validation(_) => ErrorKind::Validation,
            ClientError::Network(_) => ErrorKind::Network,
            ClientError::Server { .. } => ErrorKind::Server,
            ClientError::Auth(_) => ErrorKind::Auth,
            ClientError::SessionClosed => ErrorKind::Session,
            ClientError::Decode(_) => ErrorKind::Decode,
            ClientError::Io(_) => ErrorKind::Io,
        }
    }

    /// Whether offering the user a retry makes sense. Nothing retries
    /// automatically.
    pub fn is_retryable(&self) -> bool {
        match self {
            ClientError::Network(_) => true,
            ClientError::Server { status, .. } => matches!(status, Some(s) if *s >= 500),
            _ => false,
        }
    }

    /// Whether this error invalidates the whole session.
    pub fn is_auth(&self) -> bool {
        matches!(self, ClientError::Auth(_))
    }

    pub fn is_validation(&self) -> bool {
        matches!(self, ClientError::Validation(_))
    }

    /// Message suitable for display at the point of the action.
    ///
    /// Server messages are passed through verbatim.
    pub fn user_message(&self) -> String {
        match self {
            ClientError::Validation(err) => err.to_string(),
            ClientError::Network(_) => {
                "Could not reach the server. Check your connection and try again".to_string()
            }
            ClientError::Server { message, .. } => message.clone(),
            ClientError::Auth(_) => "Your session has expired. Please sign in again".to_string(),
            ClientError::SessionClosed => "You are not signed in".to_string(),
            ClientError::Decode(_) => "The server sent an unexpected response".to_string(),
            ClientError::Io(err) => format!("Local file error: {}", err),
        }
    }

    pub fn log_level(&self) -> LogLevel {
        match self {
            ClientError::Validation(_) | ClientError::SessionClosed => LogLevel::Debug,
            ClientError::Network(_) | ClientError::Auth(_) => LogLevel::Warn,
            ClientError::Server { status, .. } => match status {
                Some(s) if *s < 500 => LogLevel::Warn,
                _ => LogLevel::Error,
            },
            ClientError::Decode(_) | ClientError::Io(_) => LogLevel::Error,
        }
    }
}

impl From<serde_json::Error> for ClientError {
    fn from(err: serde_json::Error) -> Self {
        ClientError::Decode(err.to_string())
    }
}
