use super::Stream;
use crate::client::Pagination;
use serde_json::Value;
use singer::{PropertiesList, PropertyType};

/// Installed integrations (Shopify stores, email, chat, ...)
pub struct IntegrationsStream;

impl Stream for IntegrationsStream {
    fn name(&self) -> &'static str {
        "integrations"
    }

    fn path(&self) -> &'static str {
        "/api/integrations"
    }

    fn pagination(&self) -> Pagination {
        Pagination::CursorInPath
    }

    fn selected_by_default(&self) -> bool {
        false
    }

    fn schema(&self) -> Value {
        let meta = PropertiesList::new()
            .property("shop_name", PropertyType::String)
            .property("shop_display_name", PropertyType::String)
            .property("shop_domain", PropertyType::String)
            .property("shop_plan", PropertyType::String)
            .property("shop_id", PropertyType::Integer)
            .property(
                "shopify_integration_ids",
                PropertyType::array(PropertyType::Integer),
            )
            .property("shopify_integration_id", PropertyType::Integer)
            .property("shop_integration_id", PropertyType::Integer);

        PropertiesList::new()
            .property("id", PropertyType::Integer)
            .property("uri", PropertyType::String)
            .property(
                "user",
                PropertyType::object(PropertiesList::new().property("id", PropertyType::Integer)),
            )
            .property("type", PropertyType::String)
            .property("name", PropertyType::String)
            .property("description", PropertyType::String)
            .property("meta", PropertyType::object(meta))
            .property("created_datetime", PropertyType::DateTime)
            .property("updated_datetime", PropertyType::DateTime)
            .property("deactivated_datetime", PropertyType::DateTime)
            .property("locked_datetime", PropertyType::DateTime)
            .property("deleted_datetime", PropertyType::DateTime)
            .to_schema()
    }
}
