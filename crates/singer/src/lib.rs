//! Singer protocol support for Rust taps
//!
//! Typed SCHEMA / RECORD / STATE messages, a line-oriented writer, the
//! discovery catalog, replication state and a small JSON schema builder.
//!
//! # Example
//!
//! ```
//! use singer::{MessageWriter, PropertiesList, PropertyType};
//! use serde_json::json;
//!
//! let schema = PropertiesList::new()
//!     .property("id", PropertyType::Integer)
//!     .property("name", PropertyType::String)
//!     .to_schema();
//!
//! let mut writer = MessageWriter::new(Vec::new());
//! writer.write_schema("users", schema, &["id"], &[])?;
//! writer.write_record("users", json!({"id": 1, "name": "Ada"}))?;
//!
//! let output = String::from_utf8(writer.into_inner()).unwrap();
//! assert_eq!(output.lines().count(), 2);
//! # Ok::<(), singer::Error>(())
//! ```

pub mod catalog;
pub mod schema;
pub mod state;

pub use catalog::{Catalog, CatalogEntry, MetadataEntry, ReplicationMethod};
pub use schema::{Property, PropertiesList, PropertyType};
pub use state::{Bookmark, State};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::io::{Stdout, Write};
use thiserror::Error;

/// Errors raised while reading or writing Singer artifacts
#[derive(Error, Debug)]
pub enum Error {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Invalid message: {0}")]
    InvalidMessage(String),
}

/// Result type for Singer operations
pub type Result<T> = std::result::Result<T, Error>;

/// A single Singer message, one per output line
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Message {
    Schema {
        stream: String,
        schema: Value,
        key_properties: Vec<String>,
        #[serde(default, skip_serializing_if = "Vec::is_empty")]
        bookmark_properties: Vec<String>,
    },
    Record {
        stream: String,
        record: Value,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        time_extracted: Option<DateTime<Utc>>,
    },
    State {
        value: Value,
    },
}

impl Message {
    /// Stream name for SCHEMA and RECORD messages
    pub fn stream(&self) -> Option<&str> {
        match self {
            Message::Schema { stream, .. } | Message::Record { stream, .. } => Some(stream),
            Message::State { .. } => None,
        }
    }

    pub fn is_record(&self) -> bool {
        matches!(self, Message::Record { .. })
    }
}

/// Parse one line of tap output into a message
pub fn parse_message(line: &str) -> Result<Message> {
    let line = line.trim();
    if line.is_empty() {
        return Err(Error::InvalidMessage("empty line".to_string()));
    }
    Ok(serde_json::from_str(line)?)
}

/// Writes Singer messages as JSON lines, flushing after each message
pub struct MessageWriter<W: Write> {
    out: W,
    records_written: u64,
}

impl MessageWriter<Stdout> {
    /// Writer bound to the process stdout
    pub fn stdout() -> Self {
        Self::new(std::io::stdout())
    }
}

impl<W: Write> MessageWriter<W> {
    pub fn new(out: W) -> Self {
        Self {
            out,
            records_written: 0,
        }
    }

    /// Serialize and write one message
    pub fn write(&mut self, message: &Message) -> Result<()> {
        serde_json::to_writer(&mut self.out, message)?;
        self.out.write_all(b"\n")?;
        self.out.flush()?;
        if message.is_record() {
            self.records_written += 1;
        }
        Ok(())
    }

    pub fn write_schema(
        &mut self,
        stream: &str,
        schema: Value,
        key_properties: &[&str],
        bookmark_properties: &[&str],
    ) -> Result<()> {
        self.write(&Message::Schema {
            stream: stream.to_string(),
            schema,
            key_properties: key_properties.iter().map(|k| k.to_string()).collect(),
            bookmark_properties: bookmark_properties.iter().map(|k| k.to_string()).collect(),
        })
    }

    /// Write a record stamped with the current extraction time
    pub fn write_record(&mut self, stream: &str, record: Value) -> Result<()> {
        self.write(&Message::Record {
            stream: stream.to_string(),
            record,
            time_extracted: Some(Utc::now()),
        })
    }

    pub fn write_state(&mut self, state: &State) -> Result<()> {
        self.write(&Message::State {
            value: serde_json::to_value(state)?,
        })
    }

    /// Total RECORD messages written so far
    pub fn records_written(&self) -> u64 {
        self.records_written
    }

    pub fn into_inner(self) -> W {
        self.out
    }
}
