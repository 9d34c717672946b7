use super::view::TicketView;
use super::{person_type, Stream, StreamContext};
use crate::client::{GorgiasClient, Pagination};
use crate::Result;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde_json::Value;
use singer::{PropertiesList, PropertyType};
use tracing::{info, warn};

/// Tickets, read through a temporary view filtered on `updated_datetime`
pub struct TicketsStream;

const VIEW_ID: &str = "view_id";

fn team_type() -> PropertyType {
    let emoji = PropertiesList::new()
        .property("id", PropertyType::String)
        .property("name", PropertyType::String)
        .property("skin", PropertyType::Integer)
        .property("colons", PropertyType::String)
        .property("native", PropertyType::String)
        .property("unified", PropertyType::String);

    PropertyType::object(
        PropertiesList::new()
            .property("id", PropertyType::Integer)
            .property("name", PropertyType::String)
            .property(
                "decoration",
                PropertyType::object(
                    PropertiesList::new().property("emoji", PropertyType::object(emoji)),
                ),
            ),
    )
}

#[async_trait]
impl Stream for TicketsStream {
    fn name(&self) -> &'static str {
        "tickets"
    }

    fn path(&self) -> &'static str {
        "/api/views/{view_id}/items"
    }

    fn replication_key(&self) -> Option<&'static str> {
        Some("updated_datetime")
    }

    fn pagination(&self) -> Pagination {
        Pagination::CursorInQuery
    }

    fn schema(&self) -> Value {
        let integration = PropertiesList::new()
            .property("name", PropertyType::String)
            .property("address", PropertyType::String)
            .property("type", PropertyType::String);
        let tag = PropertiesList::new()
            .property("id", PropertyType::Integer)
            .property("name", PropertyType::String)
            .property("uri", PropertyType::String);

        PropertiesList::new()
            .property("id", PropertyType::Integer)
            .property("uri", PropertyType::String)
            .property("external_id", PropertyType::String)
            .property("language", PropertyType::String)
            .property("status", PropertyType::String)
            .property("priority", PropertyType::String)
            .property("channel", PropertyType::String)
            .property("via", PropertyType::String)
            .property("from_agent", PropertyType::Boolean)
            .property("requester", person_type())
            .property("customer", person_type())
            .property("assignee_user", person_type())
            .property("assignee_team", team_type())
            .property("subject", PropertyType::String)
            .property("excerpt", PropertyType::String)
            .property(
                "integrations",
                PropertyType::array(PropertyType::object(integration)),
            )
            .property("tags", PropertyType::array(PropertyType::object(tag)))
            .property("messages_count", PropertyType::Integer)
            .property("is_unread", PropertyType::Boolean)
            .property("created_datetime", PropertyType::DateTime)
            .property("opened_datetime", PropertyType::DateTime)
            .property("last_received_message_datetime", PropertyType::DateTime)
            .property("last_message_datetime", PropertyType::DateTime)
            .property("updated_datetime", PropertyType::DateTime)
            .property("closed_datetime", PropertyType::DateTime)
            .property("snooze_datetime", PropertyType::DateTime)
            .to_schema()
    }

    fn child_context(&self, record: &Value) -> Option<StreamContext> {
        record["id"]
            .as_i64()
            .map(|id| StreamContext::new().with("ticket_id", id))
    }

    async fn prepare(
        &self,
        client: &GorgiasClient,
        context: &mut StreamContext,
        starting: Option<DateTime<Utc>>,
    ) -> Result<()> {
        info!(
            starting = ?starting.map(|s| s.to_rfc3339()),
            "Starting timestamp"
        );
        let view = TicketView::create(client, starting).await?;
        context.insert(VIEW_ID, view.id);
        Ok(())
    }

    async fn cleanup(&self, client: &GorgiasClient, context: &StreamContext) {
        let Some(id) = context.get(VIEW_ID).and_then(|v| v.parse::<i64>().ok()) else {
            return;
        };
        if let Err(e) = (TicketView { id }).delete(client).await {
            warn!(view_id = id, error = %e, "Failed to delete ticket view");
        }
    }
}
