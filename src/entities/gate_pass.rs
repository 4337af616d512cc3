//! Gate pass entity types - authoring metadata, submission payload and stored record

use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};

use crate::entities::product::{ProductType, TransportMode};

/// Shipment metadata collected while authoring a gate pass
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GatePassMetadata {
    /// Where the items are going (required)
    pub destination: String,

    /// Who prepared the pass (required)
    pub prepared_by: String,

    #[serde(default)]
    pub checked_by: String,

    #[serde(default)]
    pub authorized_by: String,
}

impl GatePassMetadata {
    pub fn new(destination: impl Into<String>, prepared_by: impl Into<String>) -> Self {
        Self {
            destination: destination.into(),
            prepared_by: prepared_by.into(),
            ..Default::default()
        }
    }

    pub fn with_checked_by(mut self, checked_by: impl Into<String>) -> Self {
        self.checked_by = checked_by.into();
        self
    }

    pub fn with_authorized_by(mut self, authorized_by: impl Into<String>) -> Self {
        self.authorized_by = authorized_by.into();
        self
    }

    /// Reset every field to blank
    pub fn clear(&mut self) {
        *self = Self::default();
    }
}

/// One product line on a gate pass
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GatePassLine {
    pub product_id: String,
    pub name: String,
    #[serde(default)]
    pub transport: TransportMode,
    #[serde(default)]
    pub description: String,
    pub selected_quantity: u32,
    #[serde(rename = "type", default)]
    pub product_type: ProductType,
    #[serde(default)]
    pub remarks: String,
}

/// Payload sent to the gate pass store
///
/// Field names must stay as they are; the store reads them verbatim.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GatePassSubmission {
    pub date: String,
    pub to: String,
    pub products: Vec<GatePassLine>,
    pub prepared_by: String,
    pub checked_by: String,
    pub authorized_by: String,
}

/// A gate pass as persisted and returned by the store
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GatePassRecord {
    #[serde(rename = "_id", default)]
    pub key: String,

    /// Store-assigned gate pass number
    #[serde(deserialize_with = "string_or_number")]
    pub gate_pass_number: String,

    pub date: String,
    pub to: String,
    #[serde(default)]
    pub products: Vec<GatePassLine>,
    pub prepared_by: String,
    #[serde(default)]
    pub checked_by: String,
    #[serde(default)]
    pub authorized_by: String,

    /// Store-assigned creation time
    pub generated_at: DateTime<Utc>,
}

impl GatePassRecord {
    /// Total number of units across all lines
    pub fn total_quantity(&self) -> u64 {
        self.products
            .iter()
            .map(|l| u64::from(l.selected_quantity))
            .sum()
    }
}

/// Some stores emit numeric gate pass numbers, others strings
fn string_or_number<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    match serde_json::Value::deserialize(deserializer)? {
        serde_json::Value::String(s) => Ok(s),
        serde_json::Value::Number(n) => Ok(n.to_string()),
        other => Err(serde::de::Error::custom(format!(
            "expected gate pass number, found {}",
            other
        ))),
    }
}
