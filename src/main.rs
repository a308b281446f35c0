// src/main.rs

//! # Agent identity server - Main Entry Point
//!
//! Loads configuration, connects the tool registry to the on-chain identity
//! registry and starts the API server.
//!
//! ## Configuration
//! See [`iden3_agent_id::config`]. Commonly set:
//! - `AGENT_ID_REGISTRY_ADDRESS`: deployed identity registry contract
//! - `AGENT_ID_BIND_ADDR`: listen address (default 127.0.0.1:3000)
//! - `RUST_LOG`: log filter, e.g. `agent_id=debug`

use anyhow::Context;
use dotenv::dotenv;
use iden3_agent_id::blockchain::registry_client::EthRegistry;
use iden3_agent_id::services::api_server::AGENT_PATH;
use iden3_agent_id::services::responder::HandshakeResponder;
use iden3_agent_id::services::tools::TOOLS;
use iden3_agent_id::{ApiServer, Settings, ToolKit};
use log::{info, warn};
use std::net::SocketAddr;
use std::sync::Arc;

/// # Initialization Sequence
/// 1. Load `.env` and configuration
/// 2. Build the registry client and tool registry
/// 3. Start API server
#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenv().ok();
    env_logger::init();

    let settings = Settings::load().context("failed to load configuration")?;
    if settings.uses_placeholder_registry() {
        warn!("registry_address is the zero address; set AGENT_ID_REGISTRY_ADDRESS");
    }

    let registry = EthRegistry::new(&settings.registry_address, settings.registration_fee()?)
        .context("invalid registry address")?;
    let tools = ToolKit::new(Arc::new(registry), &settings)?;
    let responder = HandshakeResponder::new(settings.challenge_length, settings.max_pending_handshakes);
    let api_server = ApiServer::new(tools, Some(responder));

    let addr: SocketAddr = settings
        .bind_addr
        .parse()
        .with_context(|| format!("invalid bind_addr {}", settings.bind_addr))?;

    info!("Available endpoints:");
    info!("- GET  /tools");
    for tool in TOOLS {
        info!("- POST /tools/{}", tool.method);
    }
    info!("- POST {AGENT_PATH}/initiate");
    info!("- POST {AGENT_PATH}/callback");

    api_server.run(addr).await?;
    Ok(())
}
