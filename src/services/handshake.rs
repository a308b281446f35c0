// src/services/handshake.rs
//! Initiator side of the agent handshake.
//!
//! 1. [`HandshakeService::initiate`] resolves both agents on the registry and
//!    asks the receiver for a challenge.
//! 2. [`HandshakeService::complete`] signs `{sessionId, challenge}` and posts
//!    the signature to the receiver's callback endpoint.
//!
//! Sessions are not stored anywhere; the session id travels in the messages.

use crate::contracts::identity_registry::AgentRegistry;
use crate::error::{AgentIdError, Result};
use crate::models::handshake::{
    handshake_message, join_endpoint, CallbackRequest, CallbackStatus, ChallengeData, Envelope,
    HandshakeSession, InitiateRequest,
};
use crate::services::identity_service::IdentityService;
use crate::wallet::key_management::KeyManager;
use chrono::Utc;
use log::{debug, warn};

/// Input of [`HandshakeService::initiate`].
#[derive(Debug, Clone, Default)]
pub struct HandshakeInitiation<'a> {
    pub initiator_did: &'a str,
    pub initiator_chain_id: u64,
    pub receiver_did: &'a str,
    pub receiver_chain_id: u64,
    pub initiator_rpc_url: Option<&'a str>,
    pub receiver_rpc_url: Option<&'a str>,
}

pub struct HandshakeService<R> {
    identity: IdentityService<R>,
    http: reqwest::Client,
}

impl<R> Clone for HandshakeService<R> {
    fn clone(&self) -> Self {
        Self {
            identity: self.identity.clone(),
            http: self.http.clone(),
        }
    }
}

/// Session identifier: creation time in Unix milliseconds.
pub fn new_session_id() -> String {
    Utc::now().timestamp_millis().to_string()
}

impl<R: AgentRegistry> HandshakeService<R> {
    pub fn new(identity: IdentityService<R>, http: reqwest::Client) -> Self {
        Self { identity, http }
    }

    /// Starts a handshake with the receiver agent.
    ///
    /// # Errors
    /// - [`AgentIdError::InvalidInput`] if either DID is empty
    /// - [`AgentIdError::AgentNotFound`] if either DID is not registered
    /// - [`AgentIdError::Transport`] if the receiver cannot be reached or
    ///   answers with an error status
    /// - [`AgentIdError::UnexpectedResponse`] if the receiver sends no challenge
    pub async fn initiate(&self, request: &HandshakeInitiation<'_>) -> Result<HandshakeSession> {
        if request.initiator_did.is_empty() || request.receiver_did.is_empty() {
            return Err(AgentIdError::InvalidInput(
                "initiatorDid and receiverDid are required".into(),
            ));
        }

        let session_id = new_session_id();

        self.identity
            .validate_agent(
                request.initiator_did,
                request.initiator_chain_id,
                request.initiator_rpc_url,
            )
            .await?;
        let receiver = self
            .identity
            .validate_agent(
                request.receiver_did,
                request.receiver_chain_id,
                request.receiver_rpc_url,
            )
            .await?;

        debug!(
            target: "agent_id::handshake",
            "session {session_id}: receiver agent service endpoint {}",
            receiver.service_endpoint
        );

        let response = self
            .http
            .post(join_endpoint(&receiver.service_endpoint, "initiate"))
            .json(&InitiateRequest {
                session_id: session_id.clone(),
                initiator_did: request.initiator_did.to_string(),
                initiator_chain_id: request.initiator_chain_id,
            })
            .send()
            .await?
            .error_for_status()?;

        let body: Envelope<ChallengeData> = response.json().await?;
        let challenge = body
            .data
            .challenge
            .filter(|c| !c.is_empty())
            .ok_or_else(|| {
                AgentIdError::UnexpectedResponse("receiver did not return a challenge".into())
            })?;

        Ok(HandshakeSession {
            session_id,
            receiver_agent_callback_endpoint: join_endpoint(&receiver.service_endpoint, "callback"),
            challenge,
        })
    }

    /// Signs the challenge and hands it to the receiver.
    ///
    /// Returns `Ok(true)` only when the receiver answers
    /// `{data: {sessionId, status: "handshake_completed"}}` for this session.
    /// Transport failures and any other answer yield `Ok(false)`.
    ///
    /// # Errors
    /// [`AgentIdError::InvalidInput`] for missing arguments or a bad key.
    pub async fn complete(
        &self,
        private_key: &str,
        session_id: &str,
        callback_endpoint: &str,
        challenge: &str,
    ) -> Result<bool> {
        if private_key.is_empty()
            || session_id.is_empty()
            || callback_endpoint.is_empty()
            || challenge.is_empty()
        {
            return Err(AgentIdError::InvalidInput(
                "privateKey, sessionId, receiverAgentCallbackEndPoint and challenge are required"
                    .into(),
            ));
        }

        let key = KeyManager::from_private_key(private_key)?;
        let message = handshake_message(session_id, challenge)?;
        let signature = key.sign_message(&message).await?;

        let request = CallbackRequest {
            session_id: session_id.to_string(),
            challenge: challenge.to_string(),
            signature,
        };

        match self.post_callback(callback_endpoint, &request).await {
            Ok(status) => {
                let completed = status.is_completed(session_id);
                if !completed {
                    debug!(
                        target: "agent_id::handshake",
                        "session {session_id}: receiver answered {status:?}"
                    );
                }
                Ok(completed)
            }
            Err(e) => {
                warn!(target: "agent_id::handshake", "session {session_id}: callback failed: {e}");
                Ok(false)
            }
        }
    }

    async fn post_callback(&self, endpoint: &str, request: &CallbackRequest) -> Result<CallbackStatus> {
        let response = self
            .http
            .post(endpoint)
            .json(request)
            .send()
            .await?
            .error_for_status()?;
        let body: Envelope<CallbackStatus> = response.json().await?;
        Ok(body.data)
    }
}
