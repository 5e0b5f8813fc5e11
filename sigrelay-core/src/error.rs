//! Error types for sigrelay-core

use thiserror::Error;

/// Errors related to session bookkeeping
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SessionError {
    #[error("session not found: {0}")]
    NotFound(String),

    #[error("session is full: {0}")]
    Full(String),

    #[error("no free share code after {attempts} attempts")]
    CodeSpace { attempts: usize },

    #[error("failed to generate share code: {0}")]
    Entropy(String),
}

/// Errors from writing to a client's connection
#[derive(Error, Debug)]
pub enum TransportError {
    #[error("failed to encode message: {0}")]
    Serialize(#[from] serde_json::Error),

    #[error("failed to send message: {0}")]
    Send(String),

    #[error("connection closed")]
    Closed,
}
