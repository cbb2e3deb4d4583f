//! Input/output schemas exchanged with agents.

use schemars::JsonSchema;
use serde::{de::DeserializeOwned, Serialize};

/// A structured record an agent consumes or produces.
///
/// Field doc comments become the JSON schema descriptions sent to the model.
pub trait IoSchema: Serialize + DeserializeOwned + JsonSchema + Send + Sync {
    /// Check invariants serde cannot express, such as non-empty required text.
    fn validate(&self) -> Result<(), String> {
        Ok(())
    }

    /// JSON schema of this record.
    fn schema_value() -> serde_json::Value
    where
        Self: Sized,
    {
        serde_json::to_value(schemars::schema_for!(Self)).unwrap_or_default()
    }
}

/// Require a text field to contain something other than whitespace.
pub fn require_text(field: &str, value: &str) -> Result<(), String> {
    if value.trim().is_empty() {
        Err(format!("`{}` must not be empty", field))
    } else {
        Ok(())
    }
}

/// Require a list to have at least one non-blank entry, and no blank entries.
pub fn require_items(field: &str, items: &[String]) -> Result<(), String> {
    if items.is_empty() {
        return Err(format!("`{}` must contain at least one entry", field));
    }
    forbid_blank_items(field, items)
}

/// Reject blank entries in a list that may itself be empty.
pub fn forbid_blank_items(field: &str, items: &[String]) -> Result<(), String> {
    match items.iter().position(|i| i.trim().is_empty()) {
        Some(index) => Err(format!("`{}[{}]` must not be empty", field, index)),
        None => Ok(()),
    }
}
