// src/blockchain/mod.rs
pub mod registry_client;
pub mod rpc;
