// src/blockchain/rpc.rs
//! JSON-RPC endpoint selection per chain id.

use crate::error::{AgentIdError, Result};

/// Hedera mainnet EVM chain id.
pub const HEDERA_CHAIN_ID: u64 = 296;
/// Polygon Amoy testnet chain id.
pub const POLYGON_AMOY_CHAIN_ID: u64 = 80002;

pub const HEDERA_RPC_URL: &str = "https://mainnet.hashio.io/api";
pub const POLYGON_AMOY_RPC_URL: &str = "https://rpc-amoy.polygon.technology";

/// Resolves the RPC URL for `chain_id`.
///
/// An explicit, non-empty `rpc_url` always wins. Otherwise the known public
/// endpoint for the chain is returned.
///
/// # Errors
/// [`AgentIdError::UnsupportedChain`] when no URL is given and the chain is
/// not in the table.
pub fn rpc_url_for(chain_id: u64, rpc_url: Option<&str>) -> Result<String> {
    if let Some(url) = rpc_url.filter(|url| !url.is_empty()) {
        return Ok(url.to_string());
    }

    match chain_id {
        HEDERA_CHAIN_ID => Ok(HEDERA_RPC_URL.to_string()),
        POLYGON_AMOY_CHAIN_ID => Ok(POLYGON_AMOY_RPC_URL.to_string()),
        other => Err(AgentIdError::UnsupportedChain(other)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn hedera_default() {
        assert_eq!(rpc_url_for(296, None).unwrap(), HEDERA_RPC_URL);
    }

    #[test]
    fn empty_url_falls_back_to_default() {
        assert_eq!(rpc_url_for(296, Some("")).unwrap(), HEDERA_RPC_URL);
    }

    #[test]
    fn amoy_default() {
        assert_eq!(rpc_url_for(80002, None).unwrap(), POLYGON_AMOY_RPC_URL);
    }

    #[test]
    fn explicit_url_overrides() {
        let url = "http://localhost:8545";
        assert_eq!(rpc_url_for(296, Some(url)).unwrap(), url);
        assert_eq!(rpc_url_for(1, Some(url)).unwrap(), url);
    }

    #[test]
    fn unsupported_chain() {
        let err = rpc_url_for(1, None).unwrap_err();
        assert!(matches!(err, AgentIdError::UnsupportedChain(1)));
        assert_eq!(err.to_string(), "Unsupported chainId: 1");
    }
}
