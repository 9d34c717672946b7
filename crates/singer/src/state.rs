//! Replication state
//!
//! Bookmarks keyed by stream name, persisted by the caller between runs.
//!
//! Entries are parsed leniently: other taps write `{}` for full-table and
//! child streams and `progress_markers` for unsorted ones. Fields this crate
//! does not model are carried through untouched.

use crate::Result;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::collections::BTreeMap;
use std::fs;
use std::path::Path;

/// Replication bookmark for one stream
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Bookmark {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub replication_key: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub replication_key_value: Option<String>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl Bookmark {
    /// Replication-key value, when the entry carries one as a string
    pub fn value(&self) -> Option<&str> {
        self.replication_key_value.as_deref()
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct State {
    #[serde(default)]
    pub bookmarks: BTreeMap<String, Bookmark>,
}

impl State {
    pub fn new() -> Self {
        Self::default()
    }

    /// Load state from a JSON file
    ///
    /// Accepts either a bare state document or the `value` payload of a
    /// STATE message, which is what targets usually persist.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let content = fs::read_to_string(path)?;
        Self::from_json(&content)
    }

    /// Parse a state document. Blank input is an empty state.
    pub fn from_json(content: &str) -> Result<Self> {
        if content.trim().is_empty() {
            return Ok(Self::new());
        }
        let raw: Value = serde_json::from_str(content)?;
        let inner = match raw.get("value") {
            Some(value) if raw.get("type").and_then(|t| t.as_str()) == Some("STATE") => {
                value.clone()
            }
            _ => raw,
        };
        Ok(serde_json::from_value(inner)?)
    }

    pub fn bookmark(&self, stream: &str) -> Option<&Bookmark> {
        self.bookmarks.get(stream)
    }

    pub fn set_bookmark(
        &mut self,
        stream: impl Into<String>,
        replication_key: impl Into<String>,
        value: impl Into<String>,
    ) {
        self.bookmarks.insert(
            stream.into(),
            Bookmark {
                replication_key: Some(replication_key.into()),
                replication_key_value: Some(value.into()),
                extra: Map::new(),
            },
        );
    }
}
