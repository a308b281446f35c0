// src/contracts/identity_registry.rs
//! Identity Registry smart contract interface.
//!
//! The registry maps agent addresses and service endpoints to agent records
//! and accepts paid registrations:
//!
//! - `getAgentByAddress(address)` → `(did, agentId, description, serviceEndpoint)`
//! - `getAgentByServiceEndpoint(string)` → same tuple
//! - `registerAgent(did, description, serviceEndpoint)` payable
//!
//! [`AgentRegistry`] is the seam between the identity services and the
//! chain; [`crate::blockchain::registry_client::EthRegistry`] is the
//! production implementation.

use crate::error::Result;
use crate::models::agent::{AgentRecord, AgentRegistration};
use crate::wallet::key_management::KeyManager;
use ethers_contract::BaseContract;
use ethers_core::abi::parse_abi;
use ethers_core::types::{Address, H256};
use once_cell::sync::Lazy;
use std::future::Future;

pub const GET_AGENT_BY_ADDRESS: &str = "getAgentByAddress";
pub const GET_AGENT_BY_SERVICE_ENDPOINT: &str = "getAgentByServiceEndpoint";
pub const REGISTER_AGENT: &str = "registerAgent";

/// Human-readable ABI of the registry functions this crate calls.
pub const IDENTITY_REGISTRY_ABI: &[&str] = &[
    "function getAgentByAddress(address agentAddress) view returns (string, uint256, string, string)",
    "function getAgentByServiceEndpoint(string serviceEndpoint) view returns (string, uint256, string, string)",
    "function registerAgent(string did, string description, string serviceEndpoint) payable",
];

/// Parsed registry ABI.
pub static IDENTITY_REGISTRY: Lazy<BaseContract> = Lazy::new(|| {
    BaseContract::from(parse_abi(IDENTITY_REGISTRY_ABI).expect("Failed to load contract ABI"))
});

/// Read/write access to the agent registry.
///
/// Every call carries the RPC URL to use, since each tool invocation may
/// target a different endpoint.
pub trait AgentRegistry: Send + Sync {
    /// Looks up the agent controlled by `address`. `Ok(None)` when unregistered.
    fn agent_by_address(
        &self,
        rpc_url: &str,
        address: Address,
    ) -> impl Future<Output = Result<Option<AgentRecord>>> + Send;

    /// Looks up the agent serving `service_endpoint`. `Ok(None)` when unknown.
    fn agent_by_service_endpoint(
        &self,
        rpc_url: &str,
        service_endpoint: &str,
    ) -> impl Future<Output = Result<Option<AgentRecord>>> + Send;

    /// Registers `registration` on behalf of `signer` and waits for the
    /// transaction to be mined. Returns the transaction hash.
    fn register_agent(
        &self,
        rpc_url: &str,
        signer: &KeyManager,
        registration: &AgentRegistration,
    ) -> impl Future<Output = Result<H256>> + Send;
}
