// src/error.rs
//! Error taxonomy shared by the codec, the registry client and the tools.

use thiserror::Error;

/// Every failure an identity tool can report.
///
/// A DID that is well formed but not Ethereum-controlled is not an error:
/// decoding reports it as `Ok(None)`.
#[derive(Debug, Error)]
pub enum AgentIdError {
    /// A required field is missing or malformed.
    #[error("{0}")]
    InvalidInput(String),

    /// The DID string is structurally invalid.
    #[error("Invalid DID format: {0}")]
    MalformedDid(String),

    /// The registry has no record for the requested DID or endpoint.
    #[error("Agent not found: {0}")]
    AgentNotFound(String),

    #[error("Agent already registered")]
    AlreadyRegistered,

    #[error("Unsupported chainId: {0}")]
    UnsupportedChain(u64),

    /// HTTP call to a peer agent failed.
    #[error("Transport error: {0}")]
    Transport(#[from] reqwest::Error),

    /// RPC or contract call failed.
    #[error("Contract error: {0}")]
    Contract(String),

    #[error("Signing error: {0}")]
    Signing(String),

    /// A peer answered with a body we cannot use.
    #[error("Unexpected response: {0}")]
    UnexpectedResponse(String),

    /// A handshake with this session id is already waiting for its callback.
    #[error("Handshake session already pending: {0}")]
    SessionPending(String),

    /// The responder holds as many unanswered challenges as it allows.
    #[error("Too many pending handshakes (limit {0})")]
    TooManyPendingHandshakes(usize),

    #[error("Identity creation failed: {0}")]
    IdentityCreation(Box<AgentIdError>),

    #[error("Configuration error: {0}")]
    Config(#[from] config::ConfigError),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, AgentIdError>;
