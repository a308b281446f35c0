// src/contracts/memory_registry.rs
//! In-process [`AgentRegistry`] used for local runs and tests.

use crate::contracts::identity_registry::AgentRegistry;
use crate::error::{AgentIdError, Result};
use crate::models::agent::{AgentRecord, AgentRegistration};
use crate::wallet::key_management::KeyManager;
use ethers_core::types::{Address, H256};
use ethers_core::utils::keccak256;
use std::collections::HashMap;
use std::sync::{Mutex, PoisonError};

#[derive(Default)]
struct Entries {
    by_address: HashMap<Address, AgentRecord>,
    next_id: u64,
}

/// Registry kept in memory. The RPC URL argument is ignored.
#[derive(Default)]
pub struct MemoryRegistry {
    entries: Mutex<Entries>,
}

impl MemoryRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Inserts a record directly, bypassing registration checks.
    pub fn insert(&self, address: Address, record: AgentRecord) {
        let mut entries = self.entries.lock().unwrap_or_else(PoisonError::into_inner);
        entries.next_id = entries.next_id.max(record.agent_id + 1);
        entries.by_address.insert(address, record);
    }

    pub fn len(&self) -> usize {
        self.entries
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .by_address
            .len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl AgentRegistry for MemoryRegistry {
    async fn agent_by_address(&self, _rpc_url: &str, address: Address) -> Result<Option<AgentRecord>> {
        let entries = self.entries.lock().unwrap_or_else(PoisonError::into_inner);
        Ok(entries.by_address.get(&address).cloned())
    }

    async fn agent_by_service_endpoint(
        &self,
        _rpc_url: &str,
        service_endpoint: &str,
    ) -> Result<Option<AgentRecord>> {
        let entries = self.entries.lock().unwrap_or_else(PoisonError::into_inner);
        Ok(entries
            .by_address
            .values()
            .find(|record| record.service_endpoint == service_endpoint)
            .cloned())
    }

    async fn register_agent(
        &self,
        _rpc_url: &str,
        signer: &KeyManager,
        registration: &AgentRegistration,
    ) -> Result<H256> {
        let mut entries = self.entries.lock().unwrap_or_else(PoisonError::into_inner);
        let address = signer.address();
        if entries.by_address.contains_key(&address) {
            return Err(AgentIdError::Contract("execution reverted: agent exists".into()));
        }

        entries.next_id += 1;
        let record = AgentRecord {
            did: registration.did.clone(),
            agent_id: entries.next_id,
            description: registration.description.clone(),
            service_endpoint: registration.service_endpoint.clone(),
        };
        entries.by_address.insert(address, record);

        Ok(H256::from(keccak256(registration.did.as_bytes())))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn registration(endpoint: &str) -> AgentRegistration {
        AgentRegistration {
            did: format!("did:iden3:privado:main:{endpoint}"),
            description: "test agent".into(),
            service_endpoint: endpoint.into(),
        }
    }

    #[tokio::test]
    async fn register_and_lookup() {
        let registry = MemoryRegistry::new();
        let key = KeyManager::random();

        registry
            .register_agent("", &key, &registration("https://a.example/"))
            .await
            .unwrap();

        let by_address = registry.agent_by_address("", key.address()).await.unwrap().unwrap();
        assert_eq!(by_address.agent_id, 1);
        let by_endpoint = registry
            .agent_by_service_endpoint("", "https://a.example/")
            .await
            .unwrap();
        assert_eq!(by_endpoint, Some(by_address));
    }

    #[tokio::test]
    async fn double_registration_reverts() {
        let registry = MemoryRegistry::new();
        let key = KeyManager::random();
        registry.register_agent("", &key, &registration("https://a/")).await.unwrap();
        assert!(registry.register_agent("", &key, &registration("https://b/")).await.is_err());
        assert_eq!(registry.len(), 1);
    }

    #[tokio::test]
    async fn unknown_lookups_are_none() {
        let registry = MemoryRegistry::new();
        assert!(registry.agent_by_address("", Address::zero()).await.unwrap().is_none());
        assert!(registry.agent_by_service_endpoint("", "https://x/").await.unwrap().is_none());
    }
}
