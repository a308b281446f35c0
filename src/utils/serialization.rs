// src/utils/serialization.rs
//! JSON helpers for tool parameters and results.

use crate::error::{AgentIdError, Result};
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::{Map, Value};

/// Deserializes tool parameters, reporting schema mismatches as invalid input.
pub fn parse_params<T: DeserializeOwned>(params: Value) -> Result<T> {
    serde_json::from_value(params)
        .map_err(|e| AgentIdError::InvalidInput(format!("Invalid parameters: {e}")))
}

/// Serializes a value into a JSON object so extra fields can be merged in.
pub fn to_object<T: Serialize>(data: &T) -> Result<Map<String, Value>> {
    match serde_json::to_value(data)? {
        Value::Object(map) => Ok(map),
        other => {
            let mut map = Map::new();
            map.insert("data".into(), other);
            Ok(map)
        }
    }
}
