// src/config.rs
//! Runtime configuration.
//!
//! Sources, lowest precedence first:
//! 1. built-in defaults
//! 2. optional `agent-id.toml` (or any format `config` understands) in the
//!    working directory
//! 3. environment variables prefixed with `AGENT_ID_`, e.g.
//!    `AGENT_ID_REGISTRY_ADDRESS`, `AGENT_ID_BIND_ADDR`
//!
//! `.env` files are loaded by the binary before [`Settings::load`] runs.

use crate::error::{AgentIdError, Result};
use config::{Config, ConfigError, Environment, File};
use ethers_core::types::U256;
use serde::Deserialize;
use std::time::Duration;

/// Placeholder registry address. Deployments must override it.
pub const DEFAULT_REGISTRY_ADDRESS: &str = "0x0000000000000000000000000000000000000000";

/// 0.01 of the native currency, in wei.
pub const DEFAULT_REGISTRATION_FEE_WEI: &str = "10000000000000000";

pub const DEFAULT_SETTLE_DELAY_MS: u64 = 5_000;
pub const DEFAULT_BIND_ADDR: &str = "127.0.0.1:3000";
pub const DEFAULT_DID_CHAIN: &str = "privado";
pub const DEFAULT_DID_NETWORK: &str = "main";
pub const DEFAULT_CHALLENGE_LENGTH: i64 = 32;
pub const DEFAULT_MAX_PENDING_HANDSHAKES: usize = 1024;

#[derive(Debug, Clone, Deserialize)]
pub struct Settings {
    /// Address of the deployed identity registry contract.
    pub registry_address: String,
    /// Value sent with `registerAgent`, decimal wei.
    pub registration_fee_wei: String,
    /// Pause between a mined registration and reading the record back.
    pub settle_delay_ms: u64,
    /// Listen address of the API server.
    pub bind_addr: String,
    /// Timeout applied to handshake HTTP calls. None waits indefinitely.
    #[serde(default)]
    pub http_timeout_ms: Option<u64>,
    /// Chain segment of DIDs minted by `create_identity`.
    pub did_chain: String,
    /// Network segment of DIDs minted by `create_identity`.
    pub did_network: String,
    /// Challenge length used when this process answers handshakes.
    pub challenge_length: i64,
    /// Unanswered challenges the responder holds before refusing new ones.
    pub max_pending_handshakes: usize,
}

impl Default for Settings {
    fn default() -> Self {
        Settings {
            registry_address: DEFAULT_REGISTRY_ADDRESS.to_string(),
            registration_fee_wei: DEFAULT_REGISTRATION_FEE_WEI.to_string(),
            settle_delay_ms: DEFAULT_SETTLE_DELAY_MS,
            bind_addr: DEFAULT_BIND_ADDR.to_string(),
            http_timeout_ms: None,
            did_chain: DEFAULT_DID_CHAIN.to_string(),
            did_network: DEFAULT_DID_NETWORK.to_string(),
            challenge_length: DEFAULT_CHALLENGE_LENGTH,
            max_pending_handshakes: DEFAULT_MAX_PENDING_HANDSHAKES,
        }
    }
}

impl Settings {
    /// Loads settings from defaults, `agent-id.*` and `AGENT_ID_*` variables.
    pub fn load() -> Result<Self> {
        Self::builder()?
            .add_source(File::with_name("agent-id").required(false))
            .add_source(Environment::with_prefix("AGENT_ID"))
            .build()?
            .try_deserialize()
            .map_err(Into::into)
    }

    fn builder() -> std::result::Result<config::ConfigBuilder<config::builder::DefaultState>, ConfigError> {
        Config::builder()
            .set_default("registry_address", DEFAULT_REGISTRY_ADDRESS)?
            .set_default("registration_fee_wei", DEFAULT_REGISTRATION_FEE_WEI)?
            .set_default("settle_delay_ms", DEFAULT_SETTLE_DELAY_MS as i64)?
            .set_default("bind_addr", DEFAULT_BIND_ADDR)?
            .set_default("did_chain", DEFAULT_DID_CHAIN)?
            .set_default("did_network", DEFAULT_DID_NETWORK)?
            .set_default("challenge_length", DEFAULT_CHALLENGE_LENGTH)?
            .set_default("max_pending_handshakes", DEFAULT_MAX_PENDING_HANDSHAKES as i64)
    }

    pub fn registration_fee(&self) -> Result<U256> {
        U256::from_dec_str(&self.registration_fee_wei).map_err(|e| {
            AgentIdError::Config(ConfigError::Message(format!(
                "registration_fee_wei must be a decimal integer: {e}"
            )))
        })
    }

    pub fn settle_delay(&self) -> Duration {
        Duration::from_millis(self.settle_delay_ms)
    }

    /// HTTP client used for handshake calls to other agents.
    pub fn http_client(&self) -> Result<reqwest::Client> {
        let mut builder = reqwest::Client::builder();
        if let Some(ms) = self.http_timeout_ms {
            builder = builder.timeout(Duration::from_millis(ms));
        }
        Ok(builder.build()?)
    }

    pub fn uses_placeholder_registry(&self) -> bool {
        self.registry_address == DEFAULT_REGISTRY_ADDRESS
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_deserialize() {
        let settings: Settings = Settings::builder()
            .unwrap()
            .build()
            .unwrap()
            .try_deserialize()
            .unwrap();
        assert_eq!(settings.registry_address, DEFAULT_REGISTRY_ADDRESS);
        assert_eq!(settings.settle_delay(), Duration::from_secs(5));
        assert_eq!(settings.http_timeout_ms, None);
        assert_eq!(settings.did_chain, "privado");
        assert_eq!(settings.max_pending_handshakes, DEFAULT_MAX_PENDING_HANDSHAKES);
        assert!(settings.uses_placeholder_registry());
    }

    #[test]
    fn registration_fee_is_one_hundredth_ether() {
        let fee = Settings::default().registration_fee().unwrap();
        assert_eq!(fee, ethers_core::utils::parse_ether("0.01").unwrap());
    }

    #[test]
    fn bad_fee_is_config_error() {
        let settings = Settings {
            registration_fee_wei: "0.01".into(),
            ..Settings::default()
        };
        assert!(matches!(settings.registration_fee(), Err(AgentIdError::Config(_))));
    }

    #[test]
    fn http_client_builds_with_timeout() {
        let settings = Settings {
            http_timeout_ms: Some(250),
            ..Settings::default()
        };
        assert!(settings.http_client().is_ok());
    }
}
