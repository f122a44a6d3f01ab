//! Error handling for the application

use thiserror::Error;

/// Chain RPC errors
#[derive(Error, Debug)]
pub enum ChainError {
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Node returned status {status}: {body}")]
    Status { status: u16, body: String },

    #[error("Invalid response payload: {0}")]
    Decode(#[from] serde_json::Error),

    #[error("Send returned no request keys")]
    MissingRequestKey,
}

/// Wallet signing errors
#[derive(Error, Debug, Clone, PartialEq)]
pub enum SigningError {
    #[error("Command not signed correctly: {0}")]
    SigningFailure(String),
}

/// Configuration errors
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Unknown token: {0}")]
    UnknownToken(String),

    #[error("Invalid pair name: {0}")]
    InvalidPair(String),

    #[error("Invalid network settings: {0}")]
    InvalidNetwork(String),

    #[error("Invalid vote kind: {0}")]
    InvalidVote(String),
}
