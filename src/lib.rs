//! # iden3 agent identity
//!
//! Identity tooling for autonomous agents:
//! 1. **DIDs**: `did:iden3:<chain>:<network>:<base58Id>` identifiers derived
//!    from Ethereum addresses, and the reverse mapping
//! 2. **Registry**: agent records on an identity registry contract, reached
//!    through the [`AgentRegistry`] trait
//! 3. **Handshake**: challenge/response between two registered agents over
//!    HTTP, signed with EIP-191 personal messages
//!
//! The [`ToolKit`] wraps every operation as a JSON tool with a uniform
//! `{success, ...}` envelope; [`ApiServer`] serves it over HTTP.

pub mod blockchain;
pub mod config;
pub mod contracts;
pub mod error;
pub mod models;
pub mod services;
pub mod utils;
pub mod wallet;

pub use crate::config::Settings;
pub use crate::contracts::identity_registry::AgentRegistry;
pub use crate::error::{AgentIdError, Result};
pub use crate::models::did::{decode_did, generate_did, Did, Iden3Id};
pub use crate::services::api_server::ApiServer;
pub use crate::services::tools::ToolKit;
