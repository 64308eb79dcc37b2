//! Typed access to tool call arguments.

use crate::error::TetherError;

/// Wrapper around tool call arguments providing typed extraction.
#[derive(Debug, Clone)]
pub struct ToolArguments {
    value: serde_json::Value,
}

impl ToolArguments {
    pub fn new(value: serde_json::Value) -> Self {
        Self { value }
    }

    pub fn raw(&self) -> &serde_json::Value {
        &self.value
    }

    /// Get a string argument by key.
    pub fn get_str(&self, key: &str) -> Result<&str, TetherError> {
        self.value
            .get(key)
            .and_then(|v| v.as_str())
            .ok_or_else(|| TetherError::InvalidArgument(format!("Missing string argument: {key}")))
    }

    pub fn get_str_opt(&self, key: &str) -> Option<&str> {
        self.value.get(key).and_then(|v| v.as_str())
    }

    /// Deserialize the entire arguments into a typed struct.
    pub fn deserialize<T: serde::de::DeserializeOwned>(&self) -> Result<T, TetherError> {
        serde_json::from_value(self.value.clone()).map_err(|e| {
            TetherError::InvalidArgument(format!("Failed to deserialize arguments: {e}"))
        })
    }
}
