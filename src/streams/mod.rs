//! Stream definitions
//!
//! Each Gorgias entity is a [`Stream`]: a path, keys, a pagination scheme
//! and a schema. Most streams are purely declarative; tickets hook
//! [`Stream::prepare`] and [`Stream::cleanup`] to own a temporary view.
//!
//! # Registry
//!
//! | stream | pagination | parent |
//! |---|---|---|
//! | tickets | cursor in next-link query | |
//! | messages | cursor | tickets |
//! | satisfaction_surveys | page number | |
//! | customers | cursor | |
//! | ticket_details | single object | tickets |
//! | integrations | next-link path | |

mod customers;
mod integrations;
mod messages;
mod satisfaction_surveys;
mod ticket_details;
mod tickets;
pub mod view;

pub use customers::CustomersStream;
pub use integrations::IntegrationsStream;
pub use messages::MessagesStream;
pub use satisfaction_surveys::SatisfactionSurveysStream;
pub use ticket_details::TicketDetailsStream;
pub use tickets::TicketsStream;
pub use view::TicketView;

use crate::client::{extract_records, GorgiasClient, Pagination};
use crate::{Result, TapError};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde_json::Value;
use singer::{CatalogEntry, PropertiesList, PropertyType};
use std::collections::BTreeMap;

/// Values substituted into `{placeholder}` segments of a stream path
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StreamContext {
    values: BTreeMap<String, String>,
}

impl StreamContext {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, key: impl Into<String>, value: impl ToString) -> Self {
        self.insert(key, value);
        self
    }

    pub fn insert(&mut self, key: impl Into<String>, value: impl ToString) {
        self.values.insert(key.into(), value.to_string());
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.values.get(key).map(String::as_str)
    }

    /// Fill the placeholders of `template`
    pub fn render_path(&self, template: &str) -> Result<String> {
        let mut path = template.to_string();
        for (key, value) in &self.values {
            path = path.replace(&format!("{{{}}}", key), value);
        }
        if path.contains('{') {
            return Err(TapError::MissingContext(template.to_string()));
        }
        Ok(path)
    }
}

#[async_trait]
pub trait Stream: Send + Sync {
    fn name(&self) -> &'static str;

    /// Path template relative to the API base URL
    fn path(&self) -> &'static str;

    fn primary_keys(&self) -> &'static [&'static str] {
        &["id"]
    }

    /// Field used as the incremental watermark, if any
    fn replication_key(&self) -> Option<&'static str> {
        None
    }

    fn pagination(&self) -> Pagination {
        Pagination::Cursor
    }

    /// Parent stream whose records drive this one
    fn parent(&self) -> Option<&'static str> {
        None
    }

    fn selected_by_default(&self) -> bool {
        true
    }

    fn schema(&self) -> Value;

    fn parse_response(&self, body: Value) -> Result<Vec<Value>> {
        extract_records(body)
    }

    /// Transform a row before emission; None drops it
    fn post_process(&self, row: Value) -> Option<Value> {
        Some(row)
    }

    /// Context handed to child streams for one of this stream's records
    fn child_context(&self, _record: &Value) -> Option<StreamContext> {
        None
    }

    /// Runs before the first page is requested. A failure aborts the stream.
    async fn prepare(
        &self,
        _client: &GorgiasClient,
        _context: &mut StreamContext,
        _starting: Option<DateTime<Utc>>,
    ) -> Result<()> {
        Ok(())
    }

    /// Runs after paging ends, whether it succeeded or not
    async fn cleanup(&self, _client: &GorgiasClient, _context: &StreamContext) {}

    fn catalog_entry(&self) -> CatalogEntry {
        CatalogEntry::new(
            self.name(),
            self.schema(),
            self.primary_keys(),
            self.replication_key(),
            self.selected_by_default(),
        )
    }
}

static REGISTRY: &[&dyn Stream] = &[
    &TicketsStream,
    &MessagesStream,
    &SatisfactionSurveysStream,
    &CustomersStream,
    &TicketDetailsStream,
    &IntegrationsStream,
];

/// Every stream the tap knows, parents before children
pub fn registry() -> &'static [&'static dyn Stream] {
    REGISTRY
}

pub fn find(name: &str) -> Option<&'static dyn Stream> {
    REGISTRY.iter().copied().find(|s| s.name() == name)
}

pub fn stream_names() -> Vec<&'static str> {
    REGISTRY.iter().map(|s| s.name()).collect()
}

pub fn children_of(parent: &str) -> Vec<&'static dyn Stream> {
    REGISTRY
        .iter()
        .copied()
        .filter(|s| s.parent() == Some(parent))
        .collect()
}

/// Person reference embedded in tickets and messages
pub(crate) fn person_type() -> PropertyType {
    PropertyType::object(
        PropertiesList::new()
            .property("id", PropertyType::Integer)
            .property("email", PropertyType::String)
            .property("name", PropertyType::String)
            .property("firstname", PropertyType::String)
            .property("lastname", PropertyType::String),
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_render_path() {
        let context = StreamContext::new().with("ticket_id", 42);
        assert_eq!(
            context.render_path("/api/tickets/{ticket_id}/messages").unwrap(),
            "/api/tickets/42/messages"
        );
        assert_eq!(
            context.render_path("/api/customers").unwrap(),
            "/api/customers"
        );
    }

    #[test]
    fn test_render_path_missing_value() {
        let err = StreamContext::new()
            .render_path("/api/views/{view_id}/items")
            .unwrap_err();
        assert!(matches!(err, TapError::MissingContext(_)));
    }

    #[test]
    fn test_registry_names_are_unique_and_ordered() {
        let names = stream_names();
        assert_eq!(
            names,
            vec![
                "tickets",
                "messages",
                "satisfaction_surveys",
                "customers",
                "ticket_details",
                "integrations"
            ]
        );
    }

    #[test]
    fn test_children_and_parents_line_up() {
        let children: Vec<&str> = children_of("tickets").iter().map(|s| s.name()).collect();
        assert_eq!(children, vec!["messages", "ticket_details"]);
        for stream in registry() {
            if let Some(parent) = stream.parent() {
                assert!(find(parent).is_some(), "{} has unknown parent", stream.name());
            }
        }
    }

    #[test]
    fn test_default_selection() {
        let defaults: Vec<&str> = registry()
            .iter()
            .filter(|s| s.selected_by_default())
            .map(|s| s.name())
            .collect();
        assert_eq!(
            defaults,
            vec!["tickets", "messages", "satisfaction_surveys", "customers"]
        );
    }

    #[test]
    fn test_every_schema_declares_its_keys() {
        for stream in registry() {
            let schema = stream.schema();
            for key in stream.primary_keys() {
                assert!(
                    schema["properties"].get(*key).is_some(),
                    "{} schema lacks key {}",
                    stream.name(),
                    key
                );
            }
            if let Some(key) = stream.replication_key() {
                assert_eq!(schema["properties"][key]["format"], json!("date-time"));
            }
        }
    }
}
