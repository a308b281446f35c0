// src/models/mod.rs
//! Data structures: DIDs, registry records and handshake messages.

pub mod agent;
pub mod did;
pub mod handshake;
