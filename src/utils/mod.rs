// src/utils/mod.rs
//! Small helpers shared across the crate.

pub mod challenge;
pub mod crypto;
pub mod serialization;
pub mod validation;
