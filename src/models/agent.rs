// src/models/agent.rs
//! Agent records as stored in the identity registry contract.

use crate::error::{AgentIdError, Result};
use ethers_core::types::U256;
use serde::{Deserialize, Serialize};

/// Raw `(did, agentId, description, serviceEndpoint)` tuple returned by the
/// registry getters.
pub type AgentTuple = (String, U256, String, String);

/// An agent registered on-chain.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct AgentRecord {
    pub did: String,
    pub agent_id: u64,
    pub description: String,
    #[serde(rename = "serviceEndPoint")]
    pub service_endpoint: String,
}

impl AgentRecord {
    /// Converts a registry tuple. An empty DID means the slot is unset.
    pub fn from_tuple((did, agent_id, description, service_endpoint): AgentTuple) -> Result<Option<Self>> {
        if did.is_empty() {
            return Ok(None);
        }
        let agent_id = u64::try_from(agent_id)
            .map_err(|e| AgentIdError::Contract(format!("agentId out of range: {e}")))?;
        Ok(Some(AgentRecord {
            did,
            agent_id,
            description,
            service_endpoint,
        }))
    }
}

/// Arguments of `registerAgent`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AgentRegistration {
    pub did: String,
    pub description: String,
    pub service_endpoint: String,
}

/// Result of a successful `create_identity`.
#[derive(Serialize, Deserialize, Debug, Clone)]
#[serde(rename_all = "camelCase")]
pub struct IdentityReceipt {
    pub tx_hash: String,
    pub did: String,
    pub description: String,
    pub service_endpoint: String,
    pub agent_id: String,
    pub public_key: String,
}
