use super::Stream;
use crate::client::Pagination;
use serde_json::Value;
use singer::{PropertiesList, PropertyType};

/// Satisfaction surveys
///
/// The endpoint has no filtering, custom ordering or cursor, and surveys
/// carry no reliable updated timestamp, so every sync is a full refresh
/// paged by page number. Surveys added mid-sync can be missed.
pub struct SatisfactionSurveysStream;

impl Stream for SatisfactionSurveysStream {
    fn name(&self) -> &'static str {
        "satisfaction_surveys"
    }

    fn path(&self) -> &'static str {
        "/api/satisfaction-surveys"
    }

    fn pagination(&self) -> Pagination {
        Pagination::PageNumber
    }

    fn schema(&self) -> Value {
        PropertiesList::new()
            .property("id", PropertyType::Integer)
            .property("body_text", PropertyType::String)
            .property("created_datetime", PropertyType::DateTime)
            .property("customer_id", PropertyType::Integer)
            .property("score", PropertyType::Integer)
            .property("scored_datetime", PropertyType::DateTime)
            .property("sent_datetime", PropertyType::DateTime)
            .property("should_send_datetime", PropertyType::DateTime)
            .property("ticket_id", PropertyType::Integer)
            .property("uri", PropertyType::String)
            .to_schema()
    }
}
