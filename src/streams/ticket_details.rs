use super::Stream;
use crate::client::Pagination;
use crate::{Result, TapError};
use serde_json::{Map, Value};
use singer::{PropertiesList, PropertyType};

/// Full ticket objects, fetched once per ticket in the view
///
/// Carries what the list view leaves out, such as the spam flag, events
/// and customer integration data.
pub struct TicketDetailsStream;

/// Message body fields dropped from detail rows; the messages stream has them
const BODY_FIELDS: [&str; 4] = ["body_text", "body_html", "stripped_text", "stripped_html"];

const INTEGRATION_TYPE: &str = "__integration_type__";

impl Stream for TicketDetailsStream {
    fn name(&self) -> &'static str {
        "ticket_details"
    }

    fn path(&self) -> &'static str {
        "/api/tickets/{ticket_id}"
    }

    fn pagination(&self) -> Pagination {
        Pagination::Single
    }

    fn parent(&self) -> Option<&'static str> {
        Some("tickets")
    }

    fn selected_by_default(&self) -> bool {
        false
    }

    fn schema(&self) -> Value {
        let assignee = PropertiesList::new()
            .property("id", PropertyType::Integer)
            .property("email", PropertyType::String)
            .property("name", PropertyType::String)
            .property("first_name", PropertyType::String)
            .property("last_name", PropertyType::String);

        let line_item = PropertiesList::new().property("id", PropertyType::Integer);
        let order = PropertiesList::new()
            .property("id", PropertyType::Integer)
            .property("name", PropertyType::String)
            .property("line_items", PropertyType::array(PropertyType::object(line_item)));
        let shopify = PropertiesList::new()
            .property("id", PropertyType::Integer)
            .property("orders", PropertyType::array(PropertyType::object(order)));
        let customer = PropertiesList::new()
            .property("id", PropertyType::Integer)
            .property("name", PropertyType::String)
            .property("email", PropertyType::String)
            .property(
                "integrations",
                PropertyType::object(
                    PropertiesList::new().property("shopify", PropertyType::object(shopify)),
                ),
            );

        let event = PropertiesList::new()
            .property("id", PropertyType::Integer)
            .property("context", PropertyType::String)
            .property("created_datetime", PropertyType::DateTime)
            .property("object_id", PropertyType::Integer)
            .property("date", PropertyType::DateTime)
            .property("object_type", PropertyType::String)
            .property("type", PropertyType::String)
            .property("user_id", PropertyType::Integer)
            .property("uri", PropertyType::String);

        let tag = PropertiesList::new()
            .property("id", PropertyType::Integer)
            .property("name", PropertyType::String)
            .property(
                "decoration",
                PropertyType::object(PropertiesList::new().property("color", PropertyType::String)),
            );

        PropertiesList::new()
            .property("id", PropertyType::Integer)
            .property("assignee_user", PropertyType::object(assignee))
            .property("channel", PropertyType::String)
            .property("closed_datetime", PropertyType::DateTime)
            .property("created_datetime", PropertyType::DateTime)
            .property("customer", PropertyType::object(customer))
            .property("events", PropertyType::array(PropertyType::object(event)))
            .property("external_id", PropertyType::String)
            .property("from_agent", PropertyType::Boolean)
            .property("is_unread", PropertyType::Boolean)
            .property("language", PropertyType::String)
            .property("last_message_datetime", PropertyType::DateTime)
            .property("last_received_message_datetime", PropertyType::DateTime)
            .property("opened_datetime", PropertyType::DateTime)
            .property("priority", PropertyType::String)
            .property("snooze_datetime", PropertyType::DateTime)
            .property("spam", PropertyType::Boolean)
            .property("status", PropertyType::String)
            .property("subject", PropertyType::String)
            .property("tags", PropertyType::array(PropertyType::object(tag)))
            .property("trashed_datetime", PropertyType::DateTime)
            .property("updated_datetime", PropertyType::DateTime)
            .property("via", PropertyType::String)
            .property("uri", PropertyType::String)
            .to_schema()
    }

    fn parse_response(&self, body: Value) -> Result<Vec<Value>> {
        let Value::Object(mut ticket) = body else {
            return Err(TapError::Parse(format!(
                "ticket detail response is not an object: {}",
                body
            )));
        };
        if let Some(Value::Object(integrations)) = ticket
            .get_mut("customer")
            .and_then(|c| c.get_mut("integrations"))
        {
            rename_shopify(integrations);
        }
        Ok(vec![Value::Object(ticket)])
    }

    fn post_process(&self, mut row: Value) -> Option<Value> {
        strip_bodies(&mut row);
        if let Some(Value::Array(messages)) = row.get_mut("messages") {
            messages.iter_mut().for_each(strip_bodies);
        }
        Some(row)
    }
}

/// Integrations are keyed by their numeric id. Move the Shopify one under a
/// fixed `shopify` key so every row fits one schema, keeping the id inside.
fn rename_shopify(integrations: &mut Map<String, Value>) {
    let shopify_keys: Vec<String> = integrations
        .iter()
        .filter(|(_, v)| v[INTEGRATION_TYPE] == "shopify")
        .map(|(k, _)| k.clone())
        .collect();

    for key in shopify_keys {
        if let Some(mut integration) = integrations.remove(&key) {
            integration["id"] = key
                .parse::<i64>()
                .map(Value::from)
                .unwrap_or_else(|_| Value::String(key.clone()));
            integrations.insert("shopify".to_string(), integration);
        }
    }
}

fn strip_bodies(value: &mut Value) {
    if let Value::Object(map) = value {
        for field in BODY_FIELDS {
            map.remove(field);
        }
    }
}
