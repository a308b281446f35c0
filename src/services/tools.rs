// src/services/tools.rs
//! Tool registry.
//!
//! Each tool takes a JSON parameter object and returns a JSON result:
//! `{ "success": true, ...data }` on success or
//! `{ "success": false, "error": message }` on failure. Tools never fail
//! outside of that envelope. Failed registry lookups also carry a `message`
//! naming the DID or endpoint.

use crate::config::Settings;
use crate::contracts::identity_registry::AgentRegistry;
use crate::error::{AgentIdError, Result};
use crate::models::did::{eth_address_from_did, generate_did};
use crate::services::handshake::{HandshakeInitiation, HandshakeService};
use crate::services::identity_service::{IdentityService, NewIdentity};
use crate::services::verifier::verify_signature;
use crate::utils::challenge::random_string;
use crate::utils::serialization::{parse_params, to_object};
use crate::utils::validation::{
    require_eth_address, require_hedera_chain, require_non_empty, require_private_key,
    require_url,
};
use log::debug;
use serde::{Deserialize, Serialize};
use serde_json::{json, Map, Value};
use std::sync::Arc;

pub const GENERATE_DID_TOOL: &str = "generate_agent_did";
pub const GET_PUBLICKEY_FROM_DID_TOOL: &str = "get_publickey_from_did";
pub const CREATE_IDENTITY_TOOL: &str = "create_identity";
pub const VALIDATE_AGENT_TOOL: &str = "validate_agent";
pub const GET_AGENT_FROM_SERVICE_ENDPOINT_TOOL: &str = "get_agent_from_service_endpoint";
pub const VERIFY_SIGNATURE_TOOL: &str = "verify_signature";
pub const GENERATE_CHALLENGE_TOOL: &str = "generate_random_challenge";
pub const GENERATE_SIGNATURE_TOOL: &str = "generate_random_signature";
pub const INITIATE_HANDSHAKE_TOOL: &str = "initiate_agent_handshake";
pub const COMPLETE_HANDSHAKE_TOOL: &str = "complete_agent_handshake";

/// Name and description a host shows for a tool.
#[derive(Serialize, Debug, Clone, Copy, PartialEq, Eq)]
pub struct ToolDescriptor {
    pub method: &'static str,
    pub name: &'static str,
    pub description: &'static str,
}

pub const TOOLS: &[ToolDescriptor] = &[
    ToolDescriptor {
        method: GENERATE_DID_TOOL,
        name: "Generate Agent DID",
        description: "Generates a did:iden3:<chain>:<network>:<base58Id> DID from a 0x-prefixed Ethereum address. \
                      Parameters: ethAddress, chain (e.g. \"privado\"), network (e.g. \"main\").",
    },
    ToolDescriptor {
        method: GET_PUBLICKEY_FROM_DID_TOOL,
        name: "Get Public Key from DID",
        description: "Extracts the Ethereum address from an Ethereum-controlled iden3 DID. Parameters: didFull.",
    },
    ToolDescriptor {
        method: CREATE_IDENTITY_TOOL,
        name: "Create Identity",
        description: "Registers a new agent on the identity registry. \
                      Parameters: privateKey, chainId (296), description, serviceEndpoint, rpcUrl (optional).",
    },
    ToolDescriptor {
        method: VALIDATE_AGENT_TOOL,
        name: "Validate Agent",
        description: "Looks up an agent on the identity registry by DID. Parameters: did, chainId (296), rpcUrl (optional).",
    },
    ToolDescriptor {
        method: GET_AGENT_FROM_SERVICE_ENDPOINT_TOOL,
        name: "Get Agent From Service Endpoint",
        description: "Looks up an agent on the identity registry by service endpoint. \
                      Parameters: serviceEndpoint, chainId (296), rpcUrl (optional).",
    },
    ToolDescriptor {
        method: VERIFY_SIGNATURE_TOOL,
        name: "Verify Signature",
        description: "Checks that a handshake signature over {sessionId, challenge} was made by the key behind a DID. \
                      Parameters: sessionId, challenge, signature, did.",
    },
    ToolDescriptor {
        method: GENERATE_CHALLENGE_TOOL,
        name: "Generate Random Challenge",
        description: "Generates a random alphanumeric string. Parameters: length (positive integer).",
    },
    ToolDescriptor {
        method: GENERATE_SIGNATURE_TOOL,
        name: "Generate Random Signature",
        description: "Generates a random alphanumeric string. Parameters: length (positive integer).",
    },
    ToolDescriptor {
        method: INITIATE_HANDSHAKE_TOOL,
        name: "Initiate Agent Handshake",
        description: "Asks a registered receiver agent for a handshake challenge. \
                      Parameters: initiatorDid, initiatorChainId (296), receiverDid, receiverChainId (296), \
                      initiatorRpcUrl (optional), receiverRpcUrl (optional).",
    },
    ToolDescriptor {
        method: COMPLETE_HANDSHAKE_TOOL,
        name: "Complete Agent Handshake",
        description: "Signs the challenge and posts it to the receiver's callback endpoint. \
                      Parameters: privateKey, sessionId, receiverAgentCallbackEndPoint, challenge.",
    },
];

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct GenerateDidParams {
    eth_address: String,
    chain: String,
    network: String,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct DidParams {
    did_full: String,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct CreateIdentityParams {
    private_key: String,
    chain_id: u64,
    description: String,
    service_endpoint: String,
    #[serde(default)]
    rpc_url: Option<String>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct ValidateAgentParams {
    did: String,
    chain_id: u64,
    #[serde(default)]
    rpc_url: Option<String>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct ServiceEndpointParams {
    service_endpoint: String,
    chain_id: u64,
    #[serde(default)]
    rpc_url: Option<String>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct VerifySignatureParams {
    session_id: String,
    challenge: String,
    signature: String,
    did: String,
}

#[derive(Deserialize)]
struct LengthParams {
    length: i64,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct InitiateHandshakeParams {
    initiator_did: String,
    initiator_chain_id: u64,
    receiver_did: String,
    receiver_chain_id: u64,
    #[serde(default)]
    initiator_rpc_url: Option<String>,
    #[serde(default)]
    receiver_rpc_url: Option<String>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct CompleteHandshakeParams {
    private_key: String,
    session_id: String,
    #[serde(rename = "receiverAgentCallbackEndPoint")]
    receiver_agent_callback_endpoint: String,
    challenge: String,
}

/// Extra `message` attached to a failed registry lookup.
fn failure_message(method: &str, params: &Value) -> Option<String> {
    let field = |name: &str| params.get(name).and_then(Value::as_str).map(str::to_owned);
    match method {
        VALIDATE_AGENT_TOOL => {
            field("did").map(|did| format!("Failed to validate agent with DID: {did}"))
        }
        GET_AGENT_FROM_SERVICE_ENDPOINT_TOOL => field("serviceEndpoint")
            .map(|endpoint| format!("Failed to get agent for service endpoint: {endpoint}")),
        _ => None,
    }
}

/// Dispatches tool calls to the identity and handshake services.
pub struct ToolKit<R> {
    identity: IdentityService<R>,
    handshake: HandshakeService<R>,
}

impl<R: AgentRegistry> ToolKit<R> {
    pub fn new(registry: Arc<R>, settings: &Settings) -> Result<Self> {
        let identity = IdentityService::new(
            registry,
            settings.settle_delay(),
            &settings.did_chain,
            &settings.did_network,
        );
        let handshake = HandshakeService::new(identity.clone(), settings.http_client()?);
        Ok(Self { identity, handshake })
    }

    pub fn tools(&self) -> &'static [ToolDescriptor] {
        TOOLS
    }

    /// Runs `method` with `params` and wraps the outcome in the result envelope.
    pub async fn call(&self, method: &str, params: Value) -> Value {
        debug!(target: "agent_id::tools", "calling {method}");
        let failure_message = failure_message(method, &params);
        match self.dispatch(method, params).await {
            Ok(mut data) => {
                data.insert("success".into(), Value::Bool(true));
                Value::Object(data)
            }
            Err(e) => {
                debug!(target: "agent_id::tools", "{method} failed: {e}");
                let mut out = json!({ "success": false, "error": e.to_string() });
                if let Some(message) = failure_message {
                    out["message"] = Value::String(message);
                }
                out
            }
        }
    }

    async fn dispatch(&self, method: &str, params: Value) -> Result<Map<String, Value>> {
        match method {
            GENERATE_DID_TOOL => Self::generate_did(parse_params(params)?),
            GET_PUBLICKEY_FROM_DID_TOOL => Self::get_public_key(parse_params(params)?),
            CREATE_IDENTITY_TOOL => self.create_identity(parse_params(params)?).await,
            VALIDATE_AGENT_TOOL => self.validate_agent(parse_params(params)?).await,
            GET_AGENT_FROM_SERVICE_ENDPOINT_TOOL => {
                self.agent_from_service_endpoint(parse_params(params)?).await
            }
            VERIFY_SIGNATURE_TOOL => Self::verify_signature(parse_params(params)?),
            GENERATE_CHALLENGE_TOOL | GENERATE_SIGNATURE_TOOL => {
                Self::random_challenge(parse_params(params)?)
            }
            INITIATE_HANDSHAKE_TOOL => self.initiate_handshake(parse_params(params)?).await,
            COMPLETE_HANDSHAKE_TOOL => self.complete_handshake(parse_params(params)?).await,
            other => Err(AgentIdError::InvalidInput(format!("Unknown tool: {other}"))),
        }
    }

    fn generate_did(params: GenerateDidParams) -> Result<Map<String, Value>> {
        require_eth_address("ethAddress", &params.eth_address)?;
        require_non_empty("chain", &params.chain)?;
        require_non_empty("network", &params.network)?;
        let did = generate_did(&params.eth_address, &params.chain, &params.network)?;
        to_object(&json!({ "did": did }))
    }

    fn get_public_key(params: DidParams) -> Result<Map<String, Value>> {
        require_non_empty("didFull", &params.did_full)?;
        let eth_address = eth_address_from_did(&params.did_full)?.ok_or_else(|| {
            AgentIdError::InvalidInput("Failed to extract Ethereum address from DID".into())
        })?;
        to_object(&json!({ "ethAddress": eth_address }))
    }

    async fn create_identity(&self, params: CreateIdentityParams) -> Result<Map<String, Value>> {
        require_private_key("privateKey", &params.private_key)?;
        require_hedera_chain("chainId", params.chain_id)?;
        require_non_empty("description", &params.description)?;
        require_url("serviceEndpoint", &params.service_endpoint)?;
        if let Some(url) = params.rpc_url.as_deref() {
            require_url("rpcUrl", url)?;
        }

        let receipt = self
            .identity
            .create_identity(&NewIdentity {
                private_key: &params.private_key,
                chain_id: params.chain_id,
                description: &params.description,
                service_endpoint: &params.service_endpoint,
                rpc_url: params.rpc_url.as_deref(),
            })
            .await?;
        to_object(&receipt)
    }

    async fn validate_agent(&self, params: ValidateAgentParams) -> Result<Map<String, Value>> {
        require_non_empty("did", &params.did)?;
        require_hedera_chain("chainId", params.chain_id)?;

        let record = self
            .identity
            .validate_agent(&params.did, params.chain_id, params.rpc_url.as_deref())
            .await?;
        to_object(&json!({
            "data": record,
            "message": format!("Successfully validated agent with DID: {}", params.did),
        }))
    }

    async fn agent_from_service_endpoint(
        &self,
        params: ServiceEndpointParams,
    ) -> Result<Map<String, Value>> {
        require_url("serviceEndpoint", &params.service_endpoint)?;
        require_hedera_chain("chainId", params.chain_id)?;

        let record = self
            .identity
            .agent_from_service_endpoint(
                &params.service_endpoint,
                params.chain_id,
                params.rpc_url.as_deref(),
            )
            .await?;
        to_object(&json!({
            "data": record,
            "message": format!(
                "Successfully retrieved agent for service endpoint: {}",
                params.service_endpoint
            ),
        }))
    }

    fn verify_signature(params: VerifySignatureParams) -> Result<Map<String, Value>> {
        let is_valid = verify_signature(
            &params.session_id,
            &params.challenge,
            &params.signature,
            &params.did,
        )?;
        to_object(&json!({ "isValid": is_valid }))
    }

    fn random_challenge(params: LengthParams) -> Result<Map<String, Value>> {
        let signature = random_string(params.length)?;
        to_object(&json!({ "signature": signature }))
    }

    async fn initiate_handshake(&self, params: InitiateHandshakeParams) -> Result<Map<String, Value>> {
        require_non_empty("initiatorDid", &params.initiator_did)?;
        require_non_empty("receiverDid", &params.receiver_did)?;
        require_hedera_chain("initiatorChainId", params.initiator_chain_id)?;
        require_hedera_chain("receiverChainId", params.receiver_chain_id)?;

        let session = self
            .handshake
            .initiate(&HandshakeInitiation {
                initiator_did: &params.initiator_did,
                initiator_chain_id: params.initiator_chain_id,
                receiver_did: &params.receiver_did,
                receiver_chain_id: params.receiver_chain_id,
                initiator_rpc_url: params.initiator_rpc_url.as_deref(),
                receiver_rpc_url: params.receiver_rpc_url.as_deref(),
            })
            .await?;
        to_object(&json!({ "handshake": session }))
    }

    async fn complete_handshake(&self, params: CompleteHandshakeParams) -> Result<Map<String, Value>> {
        require_private_key("privateKey", &params.private_key)?;
        require_non_empty("sessionId", &params.session_id)?;
        require_url(
            "receiverAgentCallbackEndPoint",
            &params.receiver_agent_callback_endpoint,
        )?;
        require_non_empty("challenge", &params.challenge)?;

        let completed = self
            .handshake
            .complete(
                &params.private_key,
                &params.session_id,
                &params.receiver_agent_callback_endpoint,
                &params.challenge,
            )
            .await?;
        to_object(&json!({ "handshakeCompleted": completed }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::contracts::memory_registry::MemoryRegistry;
    use crate::wallet::key_management::KeyManager;

    fn toolkit() -> ToolKit<MemoryRegistry> {
        let settings = Settings {
            settle_delay_ms: 0,
            ..Settings::default()
        };
        ToolKit::new(Arc::new(MemoryRegistry::new()), &settings).unwrap()
    }

    #[test]
    fn every_tool_is_listed_once() {
        let mut methods: Vec<_> = TOOLS.iter().map(|t| t.method).collect();
        methods.sort_unstable();
        methods.dedup();
        assert_eq!(methods.len(), TOOLS.len());
        assert_eq!(TOOLS.len(), 10);
    }

    #[tokio::test]
    async fn unknown_tool() {
        let out = toolkit().call("launch_rockets", json!({})).await;
        assert_eq!(out, json!({ "success": false, "error": "Unknown tool: launch_rockets" }));
    }

    #[tokio::test]
    async fn both_generator_names_share_one_implementation() {
        let tk = toolkit();
        for method in [GENERATE_CHALLENGE_TOOL, GENERATE_SIGNATURE_TOOL] {
            let out = tk.call(method, json!({ "length": 24 })).await;
            assert_eq!(out["success"], true);
            assert_eq!(out["signature"].as_str().unwrap().len(), 24);
        }
    }

    #[tokio::test]
    async fn failed_lookups_carry_a_message() {
        let tk = toolkit();
        let did = generate_did(&KeyManager::random().address_hex(), "privado", "main").unwrap();
        let out = tk.call(VALIDATE_AGENT_TOOL, json!({ "did": did, "chainId": 296 })).await;
        assert_eq!(out["success"], false);
        assert_eq!(out["message"], format!("Failed to validate agent with DID: {did}"));

        let out = tk
            .call(
                GET_AGENT_FROM_SERVICE_ENDPOINT_TOOL,
                json!({ "serviceEndpoint": "https://nobody.example/", "chainId": 296 }),
            )
            .await;
        assert_eq!(out["success"], false);
        assert_eq!(
            out["message"],
            "Failed to get agent for service endpoint: https://nobody.example/"
        );

        let out = tk.call(GENERATE_CHALLENGE_TOOL, json!({ "length": 0 })).await;
        assert!(out.get("message").is_none());
    }

    #[tokio::test]
    async fn fractional_length_is_rejected() {
        let out = toolkit().call(GENERATE_CHALLENGE_TOOL, json!({ "length": 1.5 })).await;
        assert_eq!(out["success"], false);
    }
}
