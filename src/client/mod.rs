//! Gorgias REST client
//!
//! Thin wrapper over reqwest that owns the base URL, basic-auth credentials
//! and status classification. Every call goes through [`retry::with_retry`].
//!
//! # Status mapping
//!
//! - 429: retriable, honoring `Retry-after`
//! - other 4xx: fatal
//! - 5xx: retriable
//! - anything else unsuccessful: fatal

pub mod pagination;
pub mod retry;

pub use pagination::{extract_records, PageToken, Pagination};
pub use retry::{RetryConfig, RetryDecision, RetryableError};

use crate::config::TapConfig;
use crate::{Result, TapError};
use reqwest::{header, Client, Method, Response, StatusCode};
use serde_json::Value;
use std::time::Duration;
use tracing::debug;

const USER_AGENT: &str = concat!("tap-gorgias/", env!("CARGO_PKG_VERSION"));

/// HTTP client for one Gorgias account
#[derive(Clone)]
pub struct GorgiasClient {
    client: Client,
    base_url: String,
    email_address: String,
    api_key: String,
    retry: RetryConfig,
}

impl GorgiasClient {
    /// Build a client for `https://{subdomain}.gorgias.com`
    pub fn new(config: &TapConfig) -> Result<Self> {
        let mut headers = header::HeaderMap::new();
        headers.insert(
            header::ACCEPT,
            header::HeaderValue::from_static("application/json"),
        );
        headers.insert(
            header::CONTENT_TYPE,
            header::HeaderValue::from_static("application/json"),
        );

        let client = Client::builder()
            .default_headers(headers)
            .user_agent(USER_AGENT)
            .timeout(Duration::from_secs(config.request_timeout_secs))
            .build()?;

        Ok(Self {
            client,
            base_url: config.base_url(),
            email_address: config.email_address.clone(),
            api_key: config.api_key.clone(),
            retry: RetryConfig::with_max_retries(config.max_retries),
        })
    }

    /// Point the client at another host (e.g. a mock server)
    pub fn with_base_url(mut self, base_url: &str) -> Self {
        self.base_url = base_url.trim_end_matches('/').to_string();
        self
    }

    pub fn with_retry_config(mut self, retry: RetryConfig) -> Self {
        self.retry = retry;
        self
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub async fn get_json(&self, path: &str, params: &[(String, String)]) -> Result<Value> {
        self.request(Method::GET, path, params, None).await
    }

    pub async fn post_json(&self, path: &str, body: &Value) -> Result<Value> {
        self.request(Method::POST, path, &[], Some(body)).await
    }

    pub async fn delete(&self, path: &str) -> Result<()> {
        self.request(Method::DELETE, path, &[], None).await?;
        Ok(())
    }

    async fn request(
        &self,
        method: Method,
        path: &str,
        params: &[(String, String)],
        body: Option<&Value>,
    ) -> Result<Value> {
        let operation = format!("{} {}", method, path);
        retry::with_retry(&self.retry, &operation, || {
            self.send_once(method.clone(), path, params, body)
        })
        .await
    }

    async fn send_once(
        &self,
        method: Method,
        path: &str,
        params: &[(String, String)],
        body: Option<&Value>,
    ) -> Result<Value> {
        let url = format!("{}{}", self.base_url, path);
        debug!(method = %method, url = %url, params = ?params, "Sending request");

        let mut request = self
            .client
            .request(method, &url)
            .basic_auth(&self.email_address, Some(&self.api_key));
        if !params.is_empty() {
            request = request.query(params);
        }
        if let Some(body) = body {
            request = request.json(body);
        }

        let response = request.send().await?;
        let response = check_status(response, path).await?;

        let text = response.text().await?;
        if text.trim().is_empty() {
            return Ok(Value::Null);
        }
        Ok(serde_json::from_str(&text)?)
    }
}

/// Map non-success statuses onto the tap's error classes
async fn check_status(response: Response, path: &str) -> Result<Response> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }

    let code = status.as_u16();
    let reason = status.canonical_reason().unwrap_or("");

    if status == StatusCode::TOO_MANY_REQUESTS {
        let retry_after = response
            .headers()
            .get("Retry-after")
            .and_then(|v| v.to_str().ok())
            .and_then(|v| v.trim().parse::<u64>().ok())
            .unwrap_or(0);
        return Err(TapError::RateLimited {
            retry_after,
            message: format!(
                "{} Server Error: {} for path: {}. Waiting for 'Retry-after' value of {}.",
                code, reason, path, retry_after
            ),
        });
    }

    let error_body = response.text().await.unwrap_or_default();
    debug!(status = code, path = %path, body = %error_body, "Request failed");

    if status.is_client_error() {
        Err(TapError::Client {
            status: code,
            message: format!("{} Client Error: {} for path: {}", code, reason, path),
        })
    } else if status.is_server_error() {
        Err(TapError::Server {
            status: code,
            message: format!("{} Server Error: {} for path: {}", code, reason, path),
        })
    } else {
        Err(TapError::UnexpectedStatus {
            status: code,
            message: format!("{} Unexpected Status: {} for path: {}", code, reason, path),
        })
    }
}
