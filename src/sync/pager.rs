//! Page loop over one stream endpoint

use crate::client::{GorgiasClient, PageToken};
use crate::streams::{Stream, StreamContext};
use crate::{Result, TapError};
use serde_json::Value;
use tracing::debug;

/// Walks the pages of a stream until its pagination scheme runs out
pub struct Pager<'a> {
    client: &'a GorgiasClient,
    stream: &'a dyn Stream,
    path: String,
    page_size: u32,
    token: Option<PageToken>,
    pages: u64,
    done: bool,
}

impl<'a> Pager<'a> {
    pub fn new(
        client: &'a GorgiasClient,
        stream: &'a dyn Stream,
        context: &StreamContext,
        page_size: u32,
    ) -> Result<Self> {
        Ok(Self {
            client,
            stream,
            path: context.render_path(stream.path())?,
            page_size,
            token: None,
            pages: 0,
            done: false,
        })
    }

    /// Fetch the next page of records, or None once exhausted
    pub async fn next_page(&mut self) -> Result<Option<Vec<Value>>> {
        if self.done {
            return Ok(None);
        }

        let body = match &self.token {
            Some(PageToken::Path(path)) => self.client.get_json(path, &[]).await?,
            token => {
                let params = self
                    .stream
                    .pagination()
                    .request_params(token.as_ref(), self.page_size);
                self.client.get_json(&self.path, &params).await?
            }
        };

        let next = self.stream.pagination().next_token(&body)?;
        if next.is_some() && next == self.token {
            return Err(TapError::Pagination(format!(
                "{} returned the same next page token twice: {:?}",
                self.stream.name(),
                next
            )));
        }

        let records = self.stream.parse_response(body)?;
        self.pages += 1;
        debug!(
            stream = self.stream.name(),
            page = self.pages,
            records = records.len(),
            "Fetched page"
        );

        self.done = next.is_none();
        self.token = next;
        Ok(Some(records))
    }

    pub fn pages(&self) -> u64 {
        self.pages
    }
}
