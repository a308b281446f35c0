// src/wallet/key_management.rs
//! Signing keys for agents.
//!
//! Messages are signed with EIP-191 personal-message signatures (the
//! `"\x19Ethereum Signed Message:\n" + len` prefix followed by Keccak-256),
//! so signatures interoperate with any Ethereum wallet.

use crate::error::{AgentIdError, Result};
use crate::models::did::format_address;
use crate::utils::validation::require_private_key;
use ethers::signers::{LocalWallet, Signer};
use ethers_core::types::{Address, Signature};
use ethers_core::utils::hex;
use std::str::FromStr;

/// Holds an agent's secp256k1 key.
#[derive(Clone, Debug)]
pub struct KeyManager {
    wallet: LocalWallet,
}

impl KeyManager {
    /// Loads a key from a `0x`-prefixed 64-hex string.
    ///
    /// # Errors
    /// [`AgentIdError::InvalidInput`] if the string is malformed or not a valid
    /// secp256k1 scalar.
    pub fn from_private_key(private_key: &str) -> Result<Self> {
        require_private_key("privateKey", private_key)?;
        let wallet = private_key
            .parse::<LocalWallet>()
            .map_err(|e| AgentIdError::InvalidInput(format!("Invalid private key: {e}")))?;
        Ok(KeyManager { wallet })
    }

    /// Generates a fresh key from the thread RNG.
    pub fn random() -> Self {
        KeyManager {
            wallet: LocalWallet::new(&mut rand::thread_rng()),
        }
    }

    pub fn address(&self) -> Address {
        self.wallet.address()
    }

    /// Address as `0x` + 40 lowercase hex digits.
    pub fn address_hex(&self) -> String {
        format_address(&self.address())
    }

    pub fn wallet(&self) -> &LocalWallet {
        &self.wallet
    }

    /// Private key as `0x` + 64 hex digits.
    pub fn private_key_hex(&self) -> String {
        format!("0x{}", hex::encode(self.wallet.signer().to_bytes()))
    }

    /// Signs `message` and returns the 65-byte signature as `0x`-prefixed hex.
    pub async fn sign_message(&self, message: &str) -> Result<String> {
        let signature = self
            .wallet
            .sign_message(message)
            .await
            .map_err(|e| AgentIdError::Signing(e.to_string()))?;
        Ok(format!("0x{}", hex::encode(signature.to_vec())))
    }
}

/// Recovers the address that produced `signature` over `message`.
///
/// # Errors
/// [`AgentIdError::Signing`] if the signature is not 65 bytes of hex or the
/// public key cannot be recovered.
pub fn recover_signer(message: &str, signature: &str) -> Result<Address> {
    let signature = Signature::from_str(signature)
        .map_err(|e| AgentIdError::Signing(format!("Invalid signature: {e}")))?;
    signature
        .recover(message.as_bytes())
        .map_err(|e| AgentIdError::Signing(e.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;

    const KEY: &str = "0x4c0883a69102937d6231471b5dbb6204fe5129617082792ae468d01a3f362318";

    #[test]
    fn loads_known_key() {
        let key = KeyManager::from_private_key(KEY).unwrap();
        assert_eq!(key.address_hex(), "0x2c7536e3605d9c16a7a3d7b1898e529396a65c23");
        assert_eq!(key.private_key_hex(), KEY);
    }

    #[test]
    fn rejects_malformed_key() {
        assert!(matches!(
            KeyManager::from_private_key(&KEY[2..]),
            Err(AgentIdError::InvalidInput(_))
        ));
        assert!(matches!(
            KeyManager::from_private_key("0x1234"),
            Err(AgentIdError::InvalidInput(_))
        ));
    }

    #[test]
    fn rejects_zero_scalar() {
        let zero = format!("0x{}", "0".repeat(64));
        assert!(matches!(
            KeyManager::from_private_key(&zero),
            Err(AgentIdError::InvalidInput(_))
        ));
    }

    #[tokio::test]
    async fn sign_then_recover() {
        let key = KeyManager::random();
        let signature = key.sign_message("hello agent").await.unwrap();
        assert!(signature.starts_with("0x"));
        assert_eq!(signature.len(), 2 + 130);
        assert_eq!(recover_signer("hello agent", &signature).unwrap(), key.address());
    }

    #[tokio::test]
    async fn other_message_recovers_other_address() {
        let key = KeyManager::random();
        let signature = key.sign_message("hello agent").await.unwrap();
        assert_ne!(recover_signer("hello agent!", &signature).unwrap(), key.address());
    }

    #[test]
    fn garbage_signature_is_an_error() {
        assert!(matches!(
            recover_signer("m", "0xnothex"),
            Err(AgentIdError::Signing(_))
        ));
        assert!(matches!(recover_signer("m", "0x1234"), Err(AgentIdError::Signing(_))));
    }
}
