pub mod api_server;
pub mod handshake;
pub mod identity_service;
pub mod responder;
pub mod tools;
pub mod verifier;
