//! Temporary ticket views
//!
//! The ticket list endpoint cannot filter on `updated_datetime`, but a
//! saved view can. A private view sorted by `updated_datetime` ascending is
//! created for the duration of one sync and deleted afterwards.

use crate::client::GorgiasClient;
use crate::{Result, TapError};
use chrono::{DateTime, Utc};
use serde_json::{json, Value};
use tracing::info;

/// The authenticated user
const CURRENT_USER_PATH: &str = "/api/users/0";
const VIEWS_PATH: &str = "/api/views";

/// A view created by this process
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TicketView {
    pub id: i64,
}

impl TicketView {
    /// Request body for a private view shared with `user_id`
    pub fn payload(user_id: i64, watermark: Option<DateTime<Utc>>) -> Value {
        let mut payload = json!({
            "category": "user",
            "order_by": "updated_datetime",
            "order_dir": "asc",
            "visibility": "private",
            "shared_with_users": [user_id],
            "type": "ticket-list",
            "slug": "could-be-anything",
        });
        if let Some(watermark) = watermark {
            payload["filters"] = json!(format!(
                "gte(ticket.updated_datetime, '{}')",
                watermark.to_rfc3339()
            ));
        }
        payload
    }

    /// Resolve the current user and create a view filtered from `watermark`
    pub async fn create(client: &GorgiasClient, watermark: Option<DateTime<Utc>>) -> Result<Self> {
        let user_id = current_user_id(client).await?;
        let payload = Self::payload(user_id, watermark);
        info!(user_id, payload = %payload, "Creating ticket view");

        let response = client.post_json(VIEWS_PATH, &payload).await?;
        let id = read_id(&response, "view")?;

        info!(view_id = id, "View successfully created");
        Ok(Self { id })
    }

    pub async fn delete(&self, client: &GorgiasClient) -> Result<()> {
        client
            .delete(&format!("{}/{}/", VIEWS_PATH, self.id))
            .await?;
        info!(view_id = self.id, "Deleted ticket view");
        Ok(())
    }
}

pub async fn current_user_id(client: &GorgiasClient) -> Result<i64> {
    let user = client.get_json(CURRENT_USER_PATH, &[]).await?;
    read_id(&user, "user")
}

fn read_id(body: &Value, what: &str) -> Result<i64> {
    body["id"]
        .as_i64()
        .ok_or_else(|| TapError::Parse(format!("{} response has no integer id: {}", what, body)))
}
