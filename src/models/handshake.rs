// src/models/handshake.rs
//! Wire messages exchanged between two agents during a handshake.
//!
//! Every body is JSON with camelCase keys. Responses from the receiver are
//! wrapped in a `{ "data": ... }` envelope.

use crate::error::Result;
use serde::{Deserialize, Deserializer, Serialize};

/// Status reported by a receiver that accepted the signed challenge.
pub const STATUS_COMPLETED: &str = "handshake_completed";
pub const STATUS_INVALID_SIGNATURE: &str = "invalid_signature";
pub const STATUS_UNKNOWN_SESSION: &str = "unknown_session";
pub const STATUS_CHALLENGE_MISMATCH: &str = "challenge_mismatch";

/// `{ "data": T }` wrapper used by receiver responses.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct Envelope<T> {
    pub data: T,
}

/// The exact payload that gets signed. Field order is part of the protocol.
#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct SignedPayload<'a> {
    session_id: &'a str,
    challenge: &'a str,
}

/// JSON text `{"sessionId":...,"challenge":...}` signed by the initiator.
pub fn handshake_message(session_id: &str, challenge: &str) -> Result<String> {
    Ok(serde_json::to_string(&SignedPayload {
        session_id,
        challenge,
    })?)
}

/// Body POSTed to `<receiverEndpoint>/initiate`.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct InitiateRequest {
    #[serde(deserialize_with = "string_or_number")]
    pub session_id: String,
    pub initiator_did: String,
    pub initiator_chain_id: u64,
}

/// Accepts a session id sent either as a JSON string or as a bare integer
/// timestamp.
fn string_or_number<'de, D>(deserializer: D) -> std::result::Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum SessionId {
        Text(String),
        Number(u64),
    }

    Ok(match SessionId::deserialize(deserializer)? {
        SessionId::Text(s) => s,
        SessionId::Number(n) => n.to_string(),
    })
}

/// Receiver's answer to an initiate request.
#[derive(Serialize, Deserialize, Debug, Clone, Default, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct ChallengeData {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub session_id: Option<String>,
    #[serde(default)]
    pub challenge: Option<String>,
}

/// Body POSTed to the receiver's callback endpoint.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct CallbackRequest {
    pub session_id: String,
    pub challenge: String,
    pub signature: String,
}

/// Receiver's answer to a callback.
#[derive(Serialize, Deserialize, Debug, Clone, Default, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct CallbackStatus {
    #[serde(default)]
    pub session_id: Option<String>,
    #[serde(default)]
    pub status: Option<String>,
}

impl CallbackStatus {
    pub fn new(session_id: &str, status: &str) -> Self {
        CallbackStatus {
            session_id: Some(session_id.to_string()),
            status: Some(status.to_string()),
        }
    }

    /// True when the receiver confirmed completion of `session_id`.
    pub fn is_completed(&self, session_id: &str) -> bool {
        self.session_id.as_deref() == Some(session_id)
            && self.status.as_deref() == Some(STATUS_COMPLETED)
    }
}

/// What the initiator needs to finish a handshake.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct HandshakeSession {
    pub session_id: String,
    #[serde(rename = "receiverAgentCallbackEndPoint")]
    pub receiver_agent_callback_endpoint: String,
    pub challenge: String,
}

/// Appends `path` to a service endpoint with exactly one `/` between them.
pub fn join_endpoint(base: &str, path: &str) -> String {
    format!("{}/{}", base.trim_end_matches('/'), path.trim_start_matches('/'))
}
