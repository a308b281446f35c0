// src/utils/challenge.rs
//! Random alphanumeric strings used as handshake challenges.
//!
//! Both `generate_random_challenge` and `generate_random_signature` are
//! served by [`random_string`].

use crate::error::{AgentIdError, Result};
use rand::distributions::Alphanumeric;
use rand::Rng;

/// Characters a challenge may contain.
pub const CHALLENGE_ALPHABET: &str =
    "ABCDEFGHIJKLMNOPQRSTUVWXYZabcdefghijklmnopqrstuvwxyz0123456789";

/// Longest string [`random_string`] will produce.
pub const MAX_CHALLENGE_LENGTH: i64 = 4096;

/// Generates a string of `length` characters drawn uniformly from
/// `[A-Za-z0-9]`.
///
/// # Errors
/// [`AgentIdError::InvalidInput`] if `length` is zero, negative or above
/// [`MAX_CHALLENGE_LENGTH`].
pub fn random_string(length: i64) -> Result<String> {
    if length <= 0 {
        return Err(AgentIdError::InvalidInput(
            "length is required and must be greater than 0".into(),
        ));
    }
    if length > MAX_CHALLENGE_LENGTH {
        return Err(AgentIdError::InvalidInput(format!(
            "length must not exceed {MAX_CHALLENGE_LENGTH}"
        )));
    }
    let length = usize::try_from(length)
        .map_err(|_| AgentIdError::InvalidInput(format!("length {length} is too large")))?;

    Ok(rand::thread_rng()
        .sample_iter(&Alphanumeric)
        .take(length)
        .map(char::from)
        .collect())
}
