// src/services/identity_service.rs
//! Identity service
//!
//! Registers agents on the identity registry and resolves them by DID or by
//! service endpoint. All chain access goes through an [`AgentRegistry`].

use crate::blockchain::rpc::rpc_url_for;
use crate::contracts::identity_registry::AgentRegistry;
use crate::error::{AgentIdError, Result};
use crate::models::agent::{AgentRecord, AgentRegistration, IdentityReceipt};
use crate::models::did::{decode_did, format_address, Did};
use crate::wallet::key_management::KeyManager;
use log::{debug, info, warn};
use std::sync::Arc;
use std::time::Duration;

/// Input of [`IdentityService::create_identity`].
#[derive(Debug, Clone)]
pub struct NewIdentity<'a> {
    pub private_key: &'a str,
    pub chain_id: u64,
    pub description: &'a str,
    pub service_endpoint: &'a str,
    pub rpc_url: Option<&'a str>,
}

/// Service for registering and resolving agents.
pub struct IdentityService<R> {
    registry: Arc<R>,
    settle_delay: Duration,
    did_chain: String,
    did_network: String,
}

impl<R> Clone for IdentityService<R> {
    fn clone(&self) -> Self {
        Self {
            registry: self.registry.clone(),
            settle_delay: self.settle_delay,
            did_chain: self.did_chain.clone(),
            did_network: self.did_network.clone(),
        }
    }
}

impl<R: AgentRegistry> IdentityService<R> {
    /// # Arguments
    /// * `registry` - Registry backend
    /// * `settle_delay` - Wait between a mined registration and the read-back
    /// * `did_chain`, `did_network` - DID segments for newly minted identities
    pub fn new(registry: Arc<R>, settle_delay: Duration, did_chain: &str, did_network: &str) -> Self {
        Self {
            registry,
            settle_delay,
            did_chain: did_chain.to_string(),
            did_network: did_network.to_string(),
        }
    }

    pub fn registry(&self) -> &Arc<R> {
        &self.registry
    }

    /// Registers a new agent controlled by `identity.private_key`.
    ///
    /// Every failure is wrapped in [`AgentIdError::IdentityCreation`].
    pub async fn create_identity(&self, identity: &NewIdentity<'_>) -> Result<IdentityReceipt> {
        self.try_create_identity(identity)
            .await
            .map_err(|e| AgentIdError::IdentityCreation(Box::new(e)))
    }

    async fn try_create_identity(&self, identity: &NewIdentity<'_>) -> Result<IdentityReceipt> {
        let rpc_url = rpc_url_for(identity.chain_id, identity.rpc_url)?;
        let key = KeyManager::from_private_key(identity.private_key)?;
        let public_key = key.address_hex();

        // A failed lookup means "not registered yet"; only a record blocks us.
        match self.registry.agent_by_address(&rpc_url, key.address()).await {
            Ok(Some(existing)) => {
                debug!(target: "agent_id::identity", "{public_key} already registered as {}", existing.did);
                return Err(AgentIdError::AlreadyRegistered);
            }
            Ok(None) => {}
            Err(e) => {
                debug!(target: "agent_id::identity", "agent lookup for {public_key} failed ({e}), registering");
            }
        }

        let did = Did::from_address(&key.address(), &self.did_chain, &self.did_network)?.to_string();
        let registration = AgentRegistration {
            did: did.clone(),
            description: identity.description.to_string(),
            service_endpoint: identity.service_endpoint.to_string(),
        };
        let tx_hash = self
            .registry
            .register_agent(&rpc_url, &key, &registration)
            .await?;
        info!(target: "agent_id::identity", "registered {did} in tx 0x{tx_hash:x}");

        if !self.settle_delay.is_zero() {
            tokio::time::sleep(self.settle_delay).await;
        }

        let agent = self
            .registry
            .agent_by_address(&rpc_url, key.address())
            .await?
            .ok_or_else(|| AgentIdError::AgentNotFound(did.clone()))?;

        Ok(IdentityReceipt {
            tx_hash: format!("0x{tx_hash:x}"),
            did,
            description: registration.description,
            service_endpoint: registration.service_endpoint,
            agent_id: agent.agent_id.to_string(),
            public_key,
        })
    }

    /// Resolves the registry record behind `did`.
    ///
    /// # Errors
    /// - [`AgentIdError::MalformedDid`] / [`AgentIdError::InvalidInput`] when
    ///   the DID yields no address
    /// - [`AgentIdError::AgentNotFound`] when the registry has no record
    pub async fn validate_agent(
        &self,
        did: &str,
        chain_id: u64,
        rpc_url: Option<&str>,
    ) -> Result<AgentRecord> {
        let result = self.lookup_did(did, chain_id, rpc_url).await;
        if let Err(e) = &result {
            warn!(target: "agent_id::identity", "Error in validate_agent: {e}");
        }
        result
    }

    async fn lookup_did(&self, did: &str, chain_id: u64, rpc_url: Option<&str>) -> Result<AgentRecord> {
        let rpc_url = rpc_url_for(chain_id, rpc_url)?;
        let address = decode_did(did)?.ok_or_else(|| {
            AgentIdError::InvalidInput("Failed to extract Ethereum address from DID".into())
        })?;
        debug!(target: "agent_id::identity", "resolving {did} -> {}", format_address(&address));

        self.registry
            .agent_by_address(&rpc_url, address)
            .await?
            .ok_or_else(|| AgentIdError::AgentNotFound(did.to_string()))
    }

    /// Resolves the agent serving `service_endpoint`.
    pub async fn agent_from_service_endpoint(
        &self,
        service_endpoint: &str,
        chain_id: u64,
        rpc_url: Option<&str>,
    ) -> Result<AgentRecord> {
        let result = async {
            let rpc_url = rpc_url_for(chain_id, rpc_url)?;
            self.registry
                .agent_by_service_endpoint(&rpc_url, service_endpoint)
                .await?
                .ok_or_else(|| AgentIdError::AgentNotFound(service_endpoint.to_string()))
        }
        .await;
        if let Err(e) = &result {
            warn!(target: "agent_id::identity", "Error in agent_from_service_endpoint: {e}");
        }
        result
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::contracts::memory_registry::MemoryRegistry;
    use crate::models::did::generate_did;

    fn service() -> IdentityService<MemoryRegistry> {
        IdentityService::new(Arc::new(MemoryRegistry::new()), Duration::ZERO, "privado", "main")
    }

    #[tokio::test]
    async fn create_then_validate() {
        let svc = service();
        let key = KeyManager::random();
        let pk = key.private_key_hex();
        let receipt = svc
            .create_identity(&NewIdentity {
                private_key: &pk,
                chain_id: 296,
                description: "weather agent",
                service_endpoint: "https://weather.example/",
                rpc_url: None,
            })
            .await
            .unwrap();

        assert_eq!(receipt.public_key, key.address_hex());
        assert_eq!(receipt.did, generate_did(&key.address_hex(), "privado", "main").unwrap());
        assert_eq!(receipt.agent_id, "1");
        assert!(receipt.tx_hash.starts_with("0x"));

        let record = svc.validate_agent(&receipt.did, 296, None).await.unwrap();
        assert_eq!(record.service_endpoint, "https://weather.example/");

        let by_endpoint = svc
            .agent_from_service_endpoint("https://weather.example/", 296, None)
            .await
            .unwrap();
        assert_eq!(by_endpoint, record);
    }

    #[tokio::test]
    async fn second_registration_is_rejected() {
        let svc = service();
        let pk = KeyManager::random().private_key_hex();
        let identity = NewIdentity {
            private_key: &pk,
            chain_id: 296,
            description: "a",
            service_endpoint: "https://a.example/",
            rpc_url: None,
        };
        svc.create_identity(&identity).await.unwrap();

        let err = svc.create_identity(&identity).await.unwrap_err();
        assert!(matches!(
            &err,
            AgentIdError::IdentityCreation(inner) if matches!(**inner, AgentIdError::AlreadyRegistered)
        ));
        assert_eq!(err.to_string(), "Identity creation failed: Agent already registered");
    }

    #[tokio::test]
    async fn unsupported_chain_without_url() {
        let svc = service();
        let pk = KeyManager::random().private_key_hex();
        let err = svc
            .create_identity(&NewIdentity {
                private_key: &pk,
                chain_id: 1,
                description: "a",
                service_endpoint: "https://a.example/",
                rpc_url: None,
            })
            .await
            .unwrap_err();
        assert_eq!(err.to_string(), "Identity creation failed: Unsupported chainId: 1");
    }

    #[tokio::test]
    async fn unknown_did_is_not_found() {
        let svc = service();
        let did = generate_did(&KeyManager::random().address_hex(), "privado", "main").unwrap();
        assert!(matches!(
            svc.validate_agent(&did, 296, None).await,
            Err(AgentIdError::AgentNotFound(_))
        ));
    }

    #[tokio::test]
    async fn malformed_did_is_rejected() {
        let svc = service();
        assert!(matches!(
            svc.validate_agent("did:iden3:privado", 296, None).await,
            Err(AgentIdError::MalformedDid(_))
        ));
    }

    #[tokio::test]
    async fn unknown_endpoint_is_not_found() {
        let svc = service();
        assert!(matches!(
            svc.agent_from_service_endpoint("https://nobody.example/", 296, None).await,
            Err(AgentIdError::AgentNotFound(_))
        ));
    }
}
