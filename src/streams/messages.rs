use super::{person_type, Stream};
use serde_json::Value;
use singer::{PropertiesList, PropertyType};

/// Messages of each ticket in the ticket view
///
/// Only tickets updated since the watermark are visited, so a ticket
/// receiving a new message is picked up through its own `updated_datetime`.
pub struct MessagesStream;

fn address_type() -> PropertyType {
    PropertyType::object(
        PropertiesList::new()
            .property("name", PropertyType::String)
            .property("address", PropertyType::String),
    )
}

impl Stream for MessagesStream {
    fn name(&self) -> &'static str {
        "messages"
    }

    fn path(&self) -> &'static str {
        "/api/tickets/{ticket_id}/messages"
    }

    fn parent(&self) -> Option<&'static str> {
        Some("tickets")
    }

    fn schema(&self) -> Value {
        let source = PropertiesList::new()
            .property("type", PropertyType::String)
            .property("to", PropertyType::array(address_type()))
            .property("from", address_type());

        PropertiesList::new()
            .property("id", PropertyType::Integer)
            .property("uri", PropertyType::String)
            .property("message_id", PropertyType::String)
            .property("ticket_id", PropertyType::Integer)
            .property("external_id", PropertyType::String)
            .property("public", PropertyType::Boolean)
            .property("channel", PropertyType::String)
            .property("via", PropertyType::String)
            .property("source", PropertyType::object(source))
            .property("sender", person_type())
            .property("integration_id", PropertyType::Integer)
            .property("rule_id", PropertyType::Integer)
            .property("from_agent", PropertyType::Boolean)
            .property("receiver", person_type())
            .property("subject", PropertyType::String)
            .property("body_text", PropertyType::String)
            .property("body_html", PropertyType::String)
            .property("stripped_text", PropertyType::String)
            .property("stripped_html", PropertyType::String)
            .property("stripped_signature", PropertyType::String)
            .property("created_datetime", PropertyType::DateTime)
            .property("sent_datetime", PropertyType::DateTime)
            .property("failed_datetime", PropertyType::DateTime)
            .property("deleted_datetime", PropertyType::DateTime)
            .property("opened_datetime", PropertyType::DateTime)
            .to_schema()
    }
}
