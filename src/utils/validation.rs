// src/utils/validation.rs
//! Parameter checks applied before any tool logic runs.

use crate::blockchain::rpc::HEDERA_CHAIN_ID;
use crate::error::{AgentIdError, Result};
use reqwest::Url;

/// `0x` followed by exactly `hex_len` hex digits.
fn is_prefixed_hex(s: &str, hex_len: usize) -> bool {
    s.strip_prefix("0x")
        .map(|hex| hex.len() == hex_len && hex.chars().all(|c| c.is_ascii_hexdigit()))
        .unwrap_or(false)
}

/// `0x` + 40 hex characters.
pub fn is_eth_address(s: &str) -> bool {
    is_prefixed_hex(s, 40)
}

/// `0x` + 64 hex characters.
pub fn is_private_key(s: &str) -> bool {
    is_prefixed_hex(s, 64)
}

pub fn require_eth_address(field: &str, value: &str) -> Result<()> {
    if is_eth_address(value) {
        Ok(())
    } else {
        Err(AgentIdError::InvalidInput(format!(
            "{field}: Must be a valid 0x-prefixed Ethereum address"
        )))
    }
}

pub fn require_private_key(field: &str, value: &str) -> Result<()> {
    if is_private_key(value) {
        Ok(())
    } else {
        Err(AgentIdError::InvalidInput(format!(
            "{field}: Must be a valid 0x-prefixed 64-hex private key"
        )))
    }
}

pub fn require_non_empty(field: &str, value: &str) -> Result<()> {
    if value.is_empty() {
        Err(AgentIdError::InvalidInput(format!("{field}: must not be empty")))
    } else {
        Ok(())
    }
}

/// Absolute `http(s)` URL.
pub fn require_url(field: &str, value: &str) -> Result<()> {
    match Url::parse(value) {
        Ok(url) if matches!(url.scheme(), "http" | "https") => Ok(()),
        _ => Err(AgentIdError::InvalidInput(format!("{field}: Invalid url"))),
    }
}

/// The tools only target the Hedera registry deployment.
pub fn require_hedera_chain(field: &str, chain_id: u64) -> Result<()> {
    if chain_id == HEDERA_CHAIN_ID {
        Ok(())
    } else {
        Err(AgentIdError::InvalidInput(format!(
            "{field}: Must be a supported chain ID ({HEDERA_CHAIN_ID} for Hedera)"
        )))
    }
}
