use super::Stream;
use serde_json::Value;
use singer::{PropertiesList, PropertyType};

/// Customers, full refresh
///
/// The endpoint only orders by creation time, so updates cannot be
/// picked up incrementally.
pub struct CustomersStream;

impl Stream for CustomersStream {
    fn name(&self) -> &'static str {
        "customers"
    }

    fn path(&self) -> &'static str {
        "/api/customers"
    }

    fn schema(&self) -> Value {
        PropertiesList::new()
            .property("id", PropertyType::Integer)
            .property("created_datetime", PropertyType::DateTime)
            .property("email", PropertyType::String)
            .property("external_id", PropertyType::String)
            .property("firstname", PropertyType::String)
            .property("language", PropertyType::String)
            .property("lastname", PropertyType::String)
            .property("name", PropertyType::String)
            .property("timezone", PropertyType::String)
            .property("updated_datetime", PropertyType::DateTime)
            .property("note", PropertyType::String)
            .property("active", PropertyType::Boolean)
            .property(
                "meta",
                PropertyType::object(
                    PropertiesList::new().property("name_set_via", PropertyType::String),
                ),
            )
            .property("error", PropertyType::String)
            .to_schema()
    }
}
