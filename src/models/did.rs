// src/models/did.rs
//! iden3 Decentralized Identifier (DID) codec for Ethereum-controlled identities.
//!
//! A DID has the form `did:iden3:<chain>:<network>:<base58id>` where
//! `base58id` decodes to a 31-byte identifier:
//!
//! | offset | length | field |
//! |--------|--------|-------|
//! | 0      | 2      | identity type tag (`0x0d 0x01`) |
//! | 2      | 7      | genesis padding, all zero when Ethereum-controlled |
//! | 9      | 20     | Ethereum address |
//! | 29     | 2      | CRC-16/XMODEM of bytes `[0, 29)`, little-endian |
//!
//! Decoding only checks the structure and the length. The embedded checksum
//! is exposed through [`Iden3Id::checksum_matches`] but never enforced.

use crate::error::{AgentIdError, Result};
use crate::utils::crypto::crc16_xmodem;
use ethers_core::types::Address;
use ethers_core::utils::hex;
use log::warn;
use std::fmt;
use std::str::FromStr;

pub const DID_METHOD: &str = "iden3";

/// Identity type tag for Ethereum-controlled iden3 identities.
pub const ID_TYPE: [u8; 2] = [0x0d, 0x01];

/// Total decoded identifier length.
pub const ID_LENGTH: usize = 31;

const PADDING_OFFSET: usize = 2;
const ADDRESS_OFFSET: usize = 9;
const CHECKSUM_OFFSET: usize = 29;

/// The 31-byte identifier carried in the last DID segment.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Iden3Id {
    bytes: [u8; ID_LENGTH],
}

impl Iden3Id {
    /// Builds the identifier for an Ethereum-controlled identity.
    pub fn from_address(address: &Address) -> Self {
        let mut bytes = [0u8; ID_LENGTH];
        bytes[..PADDING_OFFSET].copy_from_slice(&ID_TYPE);
        bytes[ADDRESS_OFFSET..CHECKSUM_OFFSET].copy_from_slice(address.as_bytes());

        let checksum = crc16_xmodem(&bytes[..CHECKSUM_OFFSET]);
        bytes[CHECKSUM_OFFSET..].copy_from_slice(&checksum.to_le_bytes());

        Iden3Id { bytes }
    }

    /// Decodes a base58 identifier.
    ///
    /// # Errors
    /// [`AgentIdError::MalformedDid`] if the string is not base58 or does not
    /// decode to exactly 31 bytes.
    pub fn from_base58(encoded: &str) -> Result<Self> {
        let decoded = bs58::decode(encoded)
            .into_vec()
            .map_err(|e| AgentIdError::MalformedDid(format!("invalid base58 identifier: {e}")))?;

        let bytes: [u8; ID_LENGTH] = decoded.try_into().map_err(|v: Vec<u8>| {
            AgentIdError::MalformedDid(format!(
                "Unexpected decoded length {}, must be {ID_LENGTH} bytes",
                v.len()
            ))
        })?;

        Ok(Iden3Id { bytes })
    }

    pub fn to_base58(&self) -> String {
        bs58::encode(&self.bytes).into_string()
    }

    pub fn as_bytes(&self) -> &[u8; ID_LENGTH] {
        &self.bytes
    }

    pub fn id_type(&self) -> [u8; 2] {
        [self.bytes[0], self.bytes[1]]
    }

    /// The 7 genesis bytes between the type tag and the address.
    pub fn padding(&self) -> &[u8] {
        &self.bytes[PADDING_OFFSET..ADDRESS_OFFSET]
    }

    pub fn is_ethereum_controlled(&self) -> bool {
        self.padding().iter().all(|&b| b == 0)
    }

    /// The embedded address, or `None` when the identity is not
    /// Ethereum-controlled.
    pub fn address(&self) -> Option<Address> {
        self.is_ethereum_controlled()
            .then(|| Address::from_slice(&self.bytes[ADDRESS_OFFSET..CHECKSUM_OFFSET]))
    }

    /// Checksum as stored in the identifier.
    pub fn checksum(&self) -> u16 {
        u16::from_le_bytes([self.bytes[CHECKSUM_OFFSET], self.bytes[CHECKSUM_OFFSET + 1]])
    }

    pub fn checksum_matches(&self) -> bool {
        self.checksum() == crc16_xmodem(&self.bytes[..CHECKSUM_OFFSET])
    }
}

/// A parsed `did:<method>:<chain>:<network>:<id>` string.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Did {
    pub method: String,
    pub chain: String,
    pub network: String,
    pub id: Iden3Id,
}

impl Did {
    /// Builds an iden3 DID for an Ethereum address.
    ///
    /// # Errors
    /// [`AgentIdError::InvalidInput`] if `chain` or `network` is empty.
    pub fn from_address(address: &Address, chain: &str, network: &str) -> Result<Self> {
        if chain.is_empty() || network.is_empty() {
            return Err(AgentIdError::InvalidInput(
                "ethAddress, chain and network are required".into(),
            ));
        }
        Ok(Did {
            method: DID_METHOD.to_string(),
            chain: chain.to_string(),
            network: network.to_string(),
            id: Iden3Id::from_address(address),
        })
    }

    /// Parses a DID string.
    ///
    /// Only the segment count and the identifier are checked; the method,
    /// chain and network segments are taken as given.
    pub fn parse(did: &str) -> Result<Self> {
        let parts: Vec<&str> = did.split(':').collect();
        if parts.len() < 5 {
            return Err(AgentIdError::MalformedDid(format!(
                "expected at least 5 colon-separated segments: {did}"
            )));
        }

        Ok(Did {
            method: parts[1].to_string(),
            chain: parts[2].to_string(),
            network: parts[3].to_string(),
            id: Iden3Id::from_base58(parts[4])?,
        })
    }

    pub fn address(&self) -> Option<Address> {
        self.id.address()
    }
}

impl fmt::Display for Did {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "did:{}:{}:{}:{}",
            self.method,
            self.chain,
            self.network,
            self.id.to_base58()
        )
    }
}

impl FromStr for Did {
    type Err = AgentIdError;

    fn from_str(s: &str) -> Result<Self> {
        Did::parse(s)
    }
}

/// Parses a hex Ethereum address, with or without the `0x` prefix.
///
/// # Errors
/// [`AgentIdError::InvalidInput`] unless the input is exactly 20 bytes of hex.
pub fn parse_address(eth_address: &str) -> Result<Address> {
    let normalized = eth_address.to_ascii_lowercase();
    let hex_part = normalized.strip_prefix("0x").unwrap_or(&normalized);
    let bytes = hex::decode(hex_part)
        .map_err(|e| AgentIdError::InvalidInput(format!("Invalid Ethereum address: {e}")))?;
    if bytes.len() != 20 {
        return Err(AgentIdError::InvalidInput(
            "Ethereum address must be 20 bytes".into(),
        ));
    }
    Ok(Address::from_slice(&bytes))
}

/// Formats an address as `0x` + 40 lowercase hex digits.
pub fn format_address(address: &Address) -> String {
    format!("0x{}", hex::encode(address.as_bytes()))
}

/// Generates the iden3 DID for `eth_address` on `chain`/`network`.
pub fn generate_did(eth_address: &str, chain: &str, network: &str) -> Result<String> {
    if eth_address.is_empty() {
        return Err(AgentIdError::InvalidInput(
            "ethAddress, chain and network are required".into(),
        ));
    }
    let address = parse_address(eth_address)?;
    Ok(Did::from_address(&address, chain, network)?.to_string())
}

/// Recovers the Ethereum address behind a DID.
///
/// Returns `Ok(None)` for a well-formed DID that is not Ethereum-controlled.
///
/// # Errors
/// [`AgentIdError::MalformedDid`] if the DID is structurally invalid.
pub fn decode_did(did: &str) -> Result<Option<Address>> {
    let parsed = Did::parse(did)?;
    let address = parsed.address();
    if address.is_none() {
        warn!(
            target: "agent_id::did",
            "DID {did} is not Ethereum-controlled, genesis state is non-zero"
        );
    }
    Ok(address)
}

/// Same as [`decode_did`], formatted as a `0x`-prefixed hex string.
pub fn eth_address_from_did(did: &str) -> Result<Option<String>> {
    Ok(decode_did(did)?.map(|address| format_address(&address)))
}
