// src/blockchain/registry_client.rs
//! JSON-RPC client for the on-chain identity registry.
//!
//! A fresh HTTP provider is built for every call because each tool invocation
//! may name its own RPC endpoint. Reads go through the bare provider; writes
//! are signed locally through a `SignerMiddleware`.

use crate::contracts::identity_registry::{
    AgentRegistry, GET_AGENT_BY_ADDRESS, GET_AGENT_BY_SERVICE_ENDPOINT, IDENTITY_REGISTRY,
    REGISTER_AGENT,
};
use crate::error::{AgentIdError, Result};
use crate::models::agent::{AgentRecord, AgentRegistration, AgentTuple};
use crate::models::did::format_address;
use crate::wallet::key_management::KeyManager;
use ethers::middleware::SignerMiddleware;
use ethers::providers::{Http, Middleware, Provider};
use ethers::signers::Signer;
use ethers_contract::{Contract, ContractError};
use ethers_core::abi::Tokenize;
use ethers_core::types::{Address, H256, U256};
use log::debug;
use std::str::FromStr;
use std::sync::Arc;

/// Registry deployed at a fixed address, reached over HTTP JSON-RPC.
#[derive(Clone, Debug)]
pub struct EthRegistry {
    registry_address: Address,
    registration_fee: U256,
}

impl EthRegistry {
    /// # Arguments
    /// * `registry_address` - Hex address of the deployed registry contract
    /// * `registration_fee` - Value (wei) sent with `registerAgent`
    pub fn new(registry_address: &str, registration_fee: U256) -> Result<Self> {
        let registry_address = Address::from_str(registry_address).map_err(|e| {
            AgentIdError::InvalidInput(format!("Invalid registry address: {e}"))
        })?;
        Ok(Self {
            registry_address,
            registration_fee,
        })
    }

    pub fn registry_address(&self) -> Address {
        self.registry_address
    }

    fn provider(rpc_url: &str) -> Result<Provider<Http>> {
        Provider::<Http>::try_from(rpc_url)
            .map_err(|e| AgentIdError::InvalidInput(format!("Invalid RPC URL {rpc_url}: {e}")))
    }

    /// Calls one of the registry getters.
    ///
    /// A revert is how the registry reports an unknown key, so it maps to
    /// `Ok(None)`. Any other failure is a contract error.
    async fn query_agent<T: Tokenize + Send>(
        &self,
        rpc_url: &str,
        method: &str,
        params: T,
    ) -> Result<Option<AgentRecord>> {
        let provider = Arc::new(Self::provider(rpc_url)?);
        let contract = Contract::new(self.registry_address, IDENTITY_REGISTRY.clone(), provider);

        let call = contract
            .method::<_, AgentTuple>(method, params)
            .map_err(|e| AgentIdError::Contract(e.to_string()))?;

        match call.call().await {
            Ok(tuple) => AgentRecord::from_tuple(tuple),
            Err(ContractError::Revert(data)) => {
                debug!(target: "agent_id::registry", "{method} reverted ({data}), treating as not found");
                Ok(None)
            }
            Err(e) => Err(AgentIdError::Contract(e.to_string())),
        }
    }
}

impl AgentRegistry for EthRegistry {
    async fn agent_by_address(&self, rpc_url: &str, address: Address) -> Result<Option<AgentRecord>> {
        debug!(
            target: "agent_id::registry",
            "getAgentByAddress({}) via {rpc_url}",
            format_address(&address)
        );
        self.query_agent(rpc_url, GET_AGENT_BY_ADDRESS, address).await
    }

    async fn agent_by_service_endpoint(
        &self,
        rpc_url: &str,
        service_endpoint: &str,
    ) -> Result<Option<AgentRecord>> {
        debug!(
            target: "agent_id::registry",
            "getAgentByServiceEndpoint({service_endpoint}) via {rpc_url}"
        );
        self.query_agent(rpc_url, GET_AGENT_BY_SERVICE_ENDPOINT, service_endpoint.to_string())
            .await
    }

    async fn register_agent(
        &self,
        rpc_url: &str,
        signer: &KeyManager,
        registration: &AgentRegistration,
    ) -> Result<H256> {
        let provider = Self::provider(rpc_url)?;
        let chain_id = provider
            .get_chainid()
            .await
            .map_err(|e| AgentIdError::Contract(format!("Failed to read chain id: {e}")))?
            .as_u64();

        let wallet = signer.wallet().clone().with_chain_id(chain_id);
        let client = Arc::new(SignerMiddleware::new(provider, wallet));
        let contract = Contract::new(self.registry_address, IDENTITY_REGISTRY.clone(), client);

        let call = contract
            .method::<_, ()>(
                REGISTER_AGENT,
                (
                    registration.did.clone(),
                    registration.description.clone(),
                    registration.service_endpoint.clone(),
                ),
            )
            .map_err(|e| AgentIdError::Contract(e.to_string()))?
            .value(self.registration_fee);

        let pending = call
            .send()
            .await
            .map_err(|e| AgentIdError::Contract(e.to_string()))?;
        let tx_hash = pending.tx_hash();
        debug!(target: "agent_id::registry", "registerAgent sent: 0x{tx_hash:x}");

        match pending
            .await
            .map_err(|e| AgentIdError::Contract(e.to_string()))?
        {
            Some(_receipt) => Ok(tx_hash),
            None => Err(AgentIdError::Contract(format!(
                "registerAgent transaction 0x{tx_hash:x} was dropped"
            ))),
        }
    }
}
