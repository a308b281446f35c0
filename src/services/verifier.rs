// src/services/verifier.rs
//! Handshake signature verification.
//!
//! A signature is valid when the address recovered from the signed
//! `{sessionId, challenge}` message equals the address carried by the
//! claimed DID.

use crate::error::{AgentIdError, Result};
use crate::models::did::decode_did;
use crate::models::handshake::handshake_message;
use crate::wallet::key_management::recover_signer;
use log::debug;

/// Verifies that `signature` over `{sessionId, challenge}` was produced by the
/// key behind `did`.
///
/// # Returns
/// - `Ok(true)` if the recovered signer matches the DID's address
/// - `Ok(false)` if it does not, if the signature cannot be recovered, or if
///   the DID does not decode to an address
///
/// # Errors
/// [`AgentIdError::InvalidInput`] if any argument is empty.
pub fn verify_signature(session_id: &str, challenge: &str, signature: &str, did: &str) -> Result<bool> {
    if session_id.is_empty() || challenge.is_empty() || signature.is_empty() || did.is_empty() {
        return Err(AgentIdError::InvalidInput(
            "sessionId, challenge, signature and did are required".into(),
        ));
    }

    let message = handshake_message(session_id, challenge)?;

    let recovered = match recover_signer(&message, signature) {
        Ok(address) => address,
        Err(e) => {
            debug!(target: "agent_id::verifier", "signature rejected: {e}");
            return Ok(false);
        }
    };

    let expected = match decode_did(did) {
        Ok(Some(address)) => address,
        Ok(None) => return Ok(false),
        Err(e) => {
            debug!(target: "agent_id::verifier", "cannot derive address from {did}: {e}");
            return Ok(false);
        }
    };

    // H160 equality is byte equality, i.e. case-insensitive on the hex form.
    Ok(recovered == expected)
}
