//! Discovery catalog
//!
//! The catalog lists every stream a tap can produce. Stream selection is
//! read from the root (empty breadcrumb) metadata entry: an explicit
//! `selected` wins, otherwise `selected-by-default` applies.

use crate::Result;
use serde::{Deserialize, Serialize};
use serde_json::{json, Map, Value};
use std::fs;
use std::path::Path;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ReplicationMethod {
    Incremental,
    FullTable,
}

/// Metadata attached to a breadcrumb (empty breadcrumb = the stream itself)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MetadataEntry {
    #[serde(default)]
    pub breadcrumb: Vec<String>,
    #[serde(default)]
    pub metadata: Map<String, Value>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CatalogEntry {
    pub tap_stream_id: String,
    pub stream: String,
    pub schema: Value,
    #[serde(default)]
    pub key_properties: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub replication_key: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub replication_method: Option<ReplicationMethod>,
    #[serde(default)]
    pub metadata: Vec<MetadataEntry>,
}

impl CatalogEntry {
    /// Build an entry with standard root metadata
    pub fn new(
        name: &str,
        schema: Value,
        key_properties: &[&str],
        replication_key: Option<&str>,
        selected_by_default: bool,
    ) -> Self {
        let replication_method = if replication_key.is_some() {
            ReplicationMethod::Incremental
        } else {
            ReplicationMethod::FullTable
        };

        let mut root = Map::new();
        root.insert("inclusion".to_string(), json!("available"));
        root.insert("selected-by-default".to_string(), json!(selected_by_default));
        root.insert("table-key-properties".to_string(), json!(key_properties));
        root.insert(
            "forced-replication-method".to_string(),
            serde_json::to_value(replication_method).unwrap_or(Value::Null),
        );
        if let Some(key) = replication_key {
            root.insert("valid-replication-keys".to_string(), json!([key]));
        }

        Self {
            tap_stream_id: name.to_string(),
            stream: name.to_string(),
            schema,
            key_properties: key_properties.iter().map(|k| k.to_string()).collect(),
            replication_key: replication_key.map(str::to_string),
            replication_method: Some(replication_method),
            metadata: vec![MetadataEntry {
                breadcrumb: Vec::new(),
                metadata: root,
            }],
        }
    }

    fn root_metadata(&self) -> Option<&Map<String, Value>> {
        self.metadata
            .iter()
            .find(|m| m.breadcrumb.is_empty())
            .map(|m| &m.metadata)
    }

    pub fn is_selected(&self) -> bool {
        let Some(root) = self.root_metadata() else {
            return false;
        };
        root.get("selected")
            .or_else(|| root.get("selected-by-default"))
            .and_then(Value::as_bool)
            .unwrap_or(false)
    }

    /// Mark the stream as explicitly selected or deselected
    pub fn set_selected(&mut self, selected: bool) {
        match self.metadata.iter_mut().find(|m| m.breadcrumb.is_empty()) {
            Some(root) => {
                root.metadata.insert("selected".to_string(), json!(selected));
            }
            None => {
                let mut metadata = Map::new();
                metadata.insert("selected".to_string(), json!(selected));
                self.metadata.push(MetadataEntry {
                    breadcrumb: Vec::new(),
                    metadata,
                });
            }
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Catalog {
    pub streams: Vec<CatalogEntry>,
}

impl Catalog {
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let content = fs::read_to_string(path)?;
        Ok(serde_json::from_str(&content)?)
    }

    pub fn get(&self, tap_stream_id: &str) -> Option<&CatalogEntry> {
        self.streams.iter().find(|s| s.tap_stream_id == tap_stream_id)
    }

    pub fn get_mut(&mut self, tap_stream_id: &str) -> Option<&mut CatalogEntry> {
        self.streams
            .iter_mut()
            .find(|s| s.tap_stream_id == tap_stream_id)
    }

    /// Stream ids selected for sync, in catalog order
    pub fn selected(&self) -> Vec<&str> {
        self.streams
            .iter()
            .filter(|s| s.is_selected())
            .map(|s| s.tap_stream_id.as_str())
            .collect()
    }

    pub fn to_json_pretty(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }
}
