// src/services/responder.rs
//! Receiver side of the agent handshake.
//!
//! Answers `POST <endpoint>/initiate` with a fresh challenge and
//! `POST <endpoint>/callback` with the verification outcome. Each issued
//! challenge is consumed by the first callback that presents it, and the
//! number of unanswered challenges is bounded.

use crate::error::{AgentIdError, Result};
use crate::models::handshake::{
    CallbackRequest, CallbackStatus, ChallengeData, Envelope, InitiateRequest,
    STATUS_CHALLENGE_MISMATCH, STATUS_COMPLETED, STATUS_INVALID_SIGNATURE, STATUS_UNKNOWN_SESSION,
};
use crate::services::verifier::verify_signature;
use crate::utils::challenge::random_string;
use axum::extract::{Json, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::routing::post;
use axum::Router;
use log::{debug, info, warn};
use serde_json::json;
use std::collections::HashMap;
use std::sync::{Arc, Mutex, PoisonError};

struct PendingHandshake {
    initiator_did: String,
    challenge: String,
}

/// Issues challenges and verifies the signed answers.
pub struct HandshakeResponder {
    challenge_length: i64,
    max_pending: usize,
    pending: Mutex<HashMap<String, PendingHandshake>>,
}

impl HandshakeResponder {
    /// # Arguments
    /// * `challenge_length` - Characters per issued challenge
    /// * `max_pending` - Unanswered challenges held before new sessions are refused
    pub fn new(challenge_length: i64, max_pending: usize) -> Self {
        Self {
            challenge_length,
            max_pending,
            pending: Mutex::new(HashMap::new()),
        }
    }

    /// Number of challenges issued and not yet answered.
    pub fn pending_sessions(&self) -> usize {
        self.pending.lock().unwrap_or_else(PoisonError::into_inner).len()
    }

    /// Issues a challenge for the session in `request`.
    ///
    /// # Errors
    /// - [`AgentIdError::SessionPending`] if the session id already waits for
    ///   its callback
    /// - [`AgentIdError::TooManyPendingHandshakes`] if the pending table is full
    pub fn issue_challenge(&self, request: InitiateRequest) -> Result<ChallengeData> {
        let challenge = random_string(self.challenge_length)?;

        let mut pending = self.pending.lock().unwrap_or_else(PoisonError::into_inner);
        if pending.contains_key(&request.session_id) {
            return Err(AgentIdError::SessionPending(request.session_id));
        }
        if pending.len() >= self.max_pending {
            warn!(target: "agent_id::responder", "refusing session {}: pending table full", request.session_id);
            return Err(AgentIdError::TooManyPendingHandshakes(self.max_pending));
        }

        debug!(
            target: "agent_id::responder",
            "session {}: challenge issued to {}",
            request.session_id, request.initiator_did
        );
        pending.insert(
            request.session_id.clone(),
            PendingHandshake {
                initiator_did: request.initiator_did,
                challenge: challenge.clone(),
            },
        );

        Ok(ChallengeData {
            session_id: Some(request.session_id),
            challenge: Some(challenge),
        })
    }

    /// Verifies a signed challenge and reports the outcome.
    ///
    /// A session is consumed only by a callback carrying its challenge; a
    /// mismatched challenge leaves it pending.
    pub fn complete(&self, request: &CallbackRequest) -> CallbackStatus {
        let claimed = {
            let mut pending = self.pending.lock().unwrap_or_else(PoisonError::into_inner);
            let challenge_matches = pending
                .get(&request.session_id)
                .map(|p| p.challenge == request.challenge);
            match challenge_matches {
                None => Err(STATUS_UNKNOWN_SESSION),
                Some(false) => Err(STATUS_CHALLENGE_MISMATCH),
                Some(true) => pending.remove(&request.session_id).ok_or(STATUS_UNKNOWN_SESSION),
            }
        };

        let status = match claimed {
            Err(status) => status,
            Ok(p) => match verify_signature(
                &request.session_id,
                &request.challenge,
                &request.signature,
                &p.initiator_did,
            ) {
                Ok(true) => {
                    info!(
                        target: "agent_id::responder",
                        "session {}: handshake completed with {}",
                        request.session_id, p.initiator_did
                    );
                    STATUS_COMPLETED
                }
                _ => STATUS_INVALID_SIGNATURE,
            },
        };

        CallbackStatus::new(&request.session_id, status)
    }

    /// Routes `/initiate` and `/callback`, to be nested under the agent's
    /// service endpoint path.
    pub fn routes(self: Arc<Self>) -> Router {
        Router::new()
            .route("/initiate", post(Self::initiate_handler))
            .route("/callback", post(Self::callback_handler))
            .with_state(self)
    }

    async fn initiate_handler(
        State(responder): State<Arc<HandshakeResponder>>,
        Json(request): Json<InitiateRequest>,
    ) -> Response {
        match responder.issue_challenge(request) {
            Ok(data) => (StatusCode::OK, Json(Envelope { data })).into_response(),
            Err(e) => {
                let status = match e {
                    AgentIdError::SessionPending(_) => StatusCode::CONFLICT,
                    AgentIdError::TooManyPendingHandshakes(_) => StatusCode::SERVICE_UNAVAILABLE,
                    _ => StatusCode::BAD_REQUEST,
                };
                (status, Json(json!({ "error": e.to_string() }))).into_response()
            }
        }
    }

    async fn callback_handler(
        State(responder): State<Arc<HandshakeResponder>>,
        Json(request): Json<CallbackRequest>,
    ) -> Json<Envelope<CallbackStatus>> {
        Json(Envelope {
            data: responder.complete(&request),
        })
    }
}
