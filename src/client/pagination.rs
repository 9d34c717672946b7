//! Page token strategies
//!
//! Gorgias list endpoints paginate in several ways depending on the
//! resource. Each stream picks one [`Pagination`] scheme; the scheme reads
//! the next token out of a page body and turns a token back into request
//! parameters.

use crate::{Result, TapError};
use reqwest::Url;
use serde_json::Value;

/// Base used to resolve relative next links before reading their query
const LINK_BASE: &str = "https://localhost";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Pagination {
    /// `meta.next_cursor` replayed as the `cursor` parameter
    Cursor,
    /// `meta.next_items` is a full path, requested as-is against the base URL
    CursorInPath,
    /// `meta.page` / `meta.nb_pages`, next page sent as `page`
    PageNumber,
    /// `meta.next_items` query string parsed for `cursor` and `ignored_item`
    CursorInQuery,
    /// Single-object endpoint, no paging parameters
    Single,
}

/// Opaque position of the next page
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PageToken {
    Cursor(String),
    /// Path plus query string, relative to the API base URL
    Path(String),
    Page(u64),
    Query {
        cursor: String,
        ignored_item: Option<String>,
    },
}

impl Pagination {
    /// Query parameters for a request at `token` (None = first page)
    pub fn request_params(&self, token: Option<&PageToken>, page_size: u32) -> Vec<(String, String)> {
        if *self == Pagination::Single {
            return Vec::new();
        }

        let mut params = vec![("limit".to_string(), page_size.to_string())];
        match token {
            Some(PageToken::Cursor(cursor)) => {
                params.push(("cursor".to_string(), cursor.clone()));
            }
            Some(PageToken::Page(page)) => {
                params.push(("page".to_string(), page.to_string()));
            }
            Some(PageToken::Query {
                cursor,
                ignored_item,
            }) => {
                params.push(("cursor".to_string(), cursor.clone()));
                if let Some(item) = ignored_item {
                    params.push(("ignored_item".to_string(), item.clone()));
                }
                params.push(("direction".to_string(), "next".to_string()));
            }
            // The path already encodes every parameter the server wants
            Some(PageToken::Path(_)) => return Vec::new(),
            None => {}
        }
        params
    }

    /// Token for the page after `body`, or None when paging is done
    pub fn next_token(&self, body: &Value) -> Result<Option<PageToken>> {
        let meta = &body["meta"];
        match self {
            Pagination::Single => Ok(None),
            Pagination::Cursor => Ok(non_empty_str(&meta["next_cursor"])
                .map(|c| PageToken::Cursor(c.to_string()))),
            Pagination::PageNumber => {
                let (Some(page), Some(nb_pages)) = (meta["page"].as_u64(), meta["nb_pages"].as_u64())
                else {
                    return Ok(None);
                };
                Ok((page < nb_pages).then(|| PageToken::Page(page + 1)))
            }
            Pagination::CursorInPath => match non_empty_str(&meta["next_items"]) {
                Some(link) => Ok(Some(PageToken::Path(reroot(link)?))),
                None => Ok(None),
            },
            Pagination::CursorInQuery => match non_empty_str(&meta["next_items"]) {
                Some(link) => query_token(link).map(Some),
                None => Ok(None),
            },
        }
    }
}

fn non_empty_str(value: &Value) -> Option<&str> {
    value.as_str().filter(|s| !s.trim().is_empty())
}

fn parse_link(link: &str) -> Result<Url> {
    Url::parse(link)
        .or_else(|_| Url::parse(LINK_BASE).and_then(|base| base.join(link)))
        .map_err(|e| TapError::Pagination(format!("Invalid next link '{}': {}", link, e)))
}

/// Strip scheme and host so the link can be joined to the configured base URL
fn reroot(link: &str) -> Result<String> {
    let url = parse_link(link)?;
    Ok(match url.query() {
        Some(query) => format!("{}?{}", url.path(), query),
        None => url.path().to_string(),
    })
}

fn query_token(link: &str) -> Result<PageToken> {
    let url = parse_link(link)?;
    let mut cursor = None;
    let mut ignored_item = None;
    for (key, value) in url.query_pairs() {
        match key.as_ref() {
            "cursor" => cursor = Some(value.into_owned()),
            "ignored_item" => ignored_item = Some(value.into_owned()),
            _ => {}
        }
    }

    let cursor = cursor.ok_or_else(|| {
        TapError::Pagination(format!("Next link has no cursor parameter: {}", link))
    })?;
    Ok(PageToken::Query {
        cursor,
        ignored_item,
    })
}

/// Records of a list response (`data` array)
pub fn extract_records(body: Value) -> Result<Vec<Value>> {
    match body {
        Value::Object(mut map) => match map.remove("data") {
            Some(Value::Array(items)) => Ok(items),
            Some(Value::Null) | None => Ok(Vec::new()),
            Some(other) => Err(TapError::Parse(format!(
                "Expected 'data' to be an array, got {}",
                other
            ))),
        },
        other => Err(TapError::Parse(format!(
            "Expected an object response, got {}",
            other
        ))),
    }
}
