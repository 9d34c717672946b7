//! Sync engine
//!
//! Runs the selected streams in registry order and writes Singer messages.
//! Child streams are driven by their parent: after each parent record is
//! written, every selected child is paged with the parent's context.
//!
//! Streams that own server-side resources (the tickets view) get their
//! [`Stream::cleanup`] hook called whether paging succeeded or not.

mod pager;
mod state;

pub use pager::Pager;
pub use state::StateTracker;

use crate::client::GorgiasClient;
use crate::config::TapConfig;
use crate::streams::{self, Stream, StreamContext};
use crate::{Result, TapError};
use singer::{Catalog, MessageWriter, State};
use std::collections::{BTreeMap, HashSet};
use std::io::Write;
use std::path::Path;
use tracing::{debug, error, info};

/// Records written per stream during one sync
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SyncSummary {
    pub records: BTreeMap<String, u64>,
}

impl SyncSummary {
    fn add(&mut self, stream: &str, count: u64) {
        *self.records.entry(stream.to_string()).or_insert(0) += count;
    }

    pub fn count(&self, stream: &str) -> u64 {
        self.records.get(stream).copied().unwrap_or(0)
    }

    pub fn total(&self) -> u64 {
        self.records.values().sum()
    }
}

/// Catalog of every known stream, with default selection metadata
pub fn discover() -> Catalog {
    Catalog {
        streams: streams::registry()
            .iter()
            .map(|s| s.catalog_entry())
            .collect(),
    }
}

pub struct Tap {
    config: TapConfig,
    client: GorgiasClient,
}

impl Tap {
    pub fn new(config: TapConfig) -> Result<Self> {
        let client = GorgiasClient::new(&config)?;
        Ok(Self { config, client })
    }

    /// Use a preconfigured client (e.g. pointed at a mock server)
    pub fn with_client(config: TapConfig, client: GorgiasClient) -> Self {
        Self { config, client }
    }

    pub fn config(&self) -> &TapConfig {
        &self.config
    }

    /// Streams to sync: catalog selection, else the `streams` config key,
    /// else every stream selected by default
    pub fn selected_streams(&self, catalog: Option<&Catalog>) -> Result<HashSet<&'static str>> {
        let names: Vec<String> = match (catalog, &self.config.streams) {
            (Some(catalog), _) => catalog.selected().into_iter().map(String::from).collect(),
            (None, Some(names)) => names.clone(),
            (None, None) => {
                return Ok(streams::registry()
                    .iter()
                    .filter(|s| s.selected_by_default())
                    .map(|s| s.name())
                    .collect())
            }
        };

        names
            .iter()
            .map(|name| {
                streams::find(name)
                    .map(|s| s.name())
                    .ok_or_else(|| TapError::StreamNotFound(name.clone()))
            })
            .collect()
    }

    /// Run every selected stream, writing SCHEMA, RECORD and STATE messages
    ///
    /// Returns the state after all streams completed. A stream failure stops
    /// the sync; STATE already written for earlier streams stands.
    pub async fn sync<W: Write>(
        &self,
        writer: &mut MessageWriter<W>,
        mut state: State,
        catalog: Option<&Catalog>,
    ) -> Result<SyncSummary> {
        let selected = self.selected_streams(catalog)?;
        let start_date = self.config.start_date()?;
        let mut summary = SyncSummary::default();

        let mut names: Vec<&str> = selected.iter().copied().collect();
        names.sort_unstable();
        info!(streams = ?names, "Starting sync");

        for stream in streams::registry().iter().copied() {
            if stream.parent().is_some() {
                continue;
            }
            let children: Vec<&'static dyn Stream> = streams::children_of(stream.name())
                .into_iter()
                .filter(|c| selected.contains(c.name()))
                .collect();
            let emit = selected.contains(stream.name());
            if !emit && children.is_empty() {
                continue;
            }

            if emit {
                write_schema(writer, stream)?;
            }
            for child in &children {
                write_schema(writer, *child)?;
            }

            let mut tracker = StateTracker::new(stream, &state, start_date)?;
            info!(stream = stream.name(), "Beginning stream sync");

            if let Err(e) = self
                .sync_stream(writer, stream, emit, &children, &mut tracker, &mut summary)
                .await
            {
                error!(stream = stream.name(), error = %e, "Stream sync failed");
                return Err(e);
            }

            if emit && tracker.finalize(&mut state) {
                debug!(
                    stream = stream.name(),
                    bookmark = tracker.max_value().unwrap_or_default(),
                    "Advanced bookmark"
                );
            }
            writer.write_state(&state)?;
            info!(
                stream = stream.name(),
                records = summary.count(stream.name()),
                "Completed stream sync"
            );
        }

        info!(
            total = summary.total(),
            written = writer.records_written(),
            per_stream = ?summary.records,
            "Sync complete"
        );
        Ok(summary)
    }

    /// Prepare, page and clean up one top-level stream
    async fn sync_stream<W: Write>(
        &self,
        writer: &mut MessageWriter<W>,
        stream: &'static dyn Stream,
        emit: bool,
        children: &[&'static dyn Stream],
        tracker: &mut StateTracker,
        summary: &mut SyncSummary,
    ) -> Result<()> {
        let mut context = StreamContext::new();
        stream
            .prepare(&self.client, &mut context, tracker.starting_timestamp())
            .await?;

        let result = self
            .page_parent(writer, stream, &context, emit, children, tracker, summary)
            .await;
        stream.cleanup(&self.client, &context).await;
        result
    }

    #[allow(clippy::too_many_arguments)]
    async fn page_parent<W: Write>(
        &self,
        writer: &mut MessageWriter<W>,
        stream: &'static dyn Stream,
        context: &StreamContext,
        emit: bool,
        children: &[&'static dyn Stream],
        tracker: &mut StateTracker,
        summary: &mut SyncSummary,
    ) -> Result<()> {
        let mut pager = Pager::new(&self.client, stream, context, self.config.page_size)?;
        while let Some(records) = pager.next_page().await? {
            for row in records {
                let Some(row) = stream.post_process(row) else {
                    continue;
                };
                tracker.observe(&row);
                let child_context = stream.child_context(&row);

                if emit {
                    writer.write_record(stream.name(), row)?;
                    summary.add(stream.name(), 1);
                }

                if let Some(child_context) = child_context {
                    for child in children {
                        self.sync_child(writer, *child, child_context.clone(), summary)
                            .await?;
                    }
                }
            }
        }
        debug!(stream = stream.name(), pages = pager.pages(), "Paging complete");
        Ok(())
    }

    /// Page one child stream for a single parent record
    async fn sync_child<W: Write>(
        &self,
        writer: &mut MessageWriter<W>,
        child: &'static dyn Stream,
        mut context: StreamContext,
        summary: &mut SyncSummary,
    ) -> Result<()> {
        child.prepare(&self.client, &mut context, None).await?;
        let result = self.drain(writer, child, &context, summary).await;
        child.cleanup(&self.client, &context).await;
        result
    }

    async fn drain<W: Write>(
        &self,
        writer: &mut MessageWriter<W>,
        stream: &'static dyn Stream,
        context: &StreamContext,
        summary: &mut SyncSummary,
    ) -> Result<()> {
        let mut pager = Pager::new(&self.client, stream, context, self.config.page_size)?;
        while let Some(records) = pager.next_page().await? {
            for row in records {
                if let Some(row) = stream.post_process(row) {
                    writer.write_record(stream.name(), row)?;
                    summary.add(stream.name(), 1);
                }
            }
        }
        Ok(())
    }
}

fn write_schema<W: Write>(writer: &mut MessageWriter<W>, stream: &dyn Stream) -> Result<()> {
    let bookmark_properties: Vec<&str> = stream.replication_key().into_iter().collect();
    writer.write_schema(
        stream.name(),
        stream.schema(),
        stream.primary_keys(),
        &bookmark_properties,
    )?;
    Ok(())
}

/// State from a previous run, or empty state when no file is given
pub fn load_state(path: Option<&Path>) -> Result<State> {
    match path {
        Some(path) => Ok(State::load(path)?),
        None => Ok(State::new()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::streams::{CustomersStream, TicketsStream};
    use tempfile::NamedTempFile;

    fn tap(config: TapConfig) -> Tap {
        Tap::new(config).unwrap()
    }

    fn base() -> TapConfig {
        TapConfig::new("acme", "agent@acme.io", "key")
    }

    #[test]
    fn test_discover_lists_every_stream() {
        let catalog = discover();
        let ids: Vec<&str> = catalog
            .streams
            .iter()
            .map(|s| s.tap_stream_id.as_str())
            .collect();
        assert_eq!(ids, streams::stream_names());
        assert_eq!(
            catalog.selected(),
            vec!["tickets", "messages", "satisfaction_surveys", "customers"]
        );
    }

    #[test]
    fn test_default_selection() {
        let selected = tap(base()).selected_streams(None).unwrap();
        assert!(selected.contains("tickets"));
        assert!(selected.contains("customers"));
        assert!(!selected.contains("integrations"));
        assert!(!selected.contains("ticket_details"));
    }

    #[test]
    fn test_config_streams_selection() {
        let selected = tap(base().with_streams(&["integrations"]))
            .selected_streams(None)
            .unwrap();
        assert_eq!(selected.len(), 1);
        assert!(selected.contains("integrations"));
    }

    #[test]
    fn test_catalog_overrides_config() {
        let mut catalog = discover();
        for entry in &mut catalog.streams {
            entry.set_selected(entry.tap_stream_id == "ticket_details");
        }
        let selected = tap(base().with_streams(&["customers"]))
            .selected_streams(Some(&catalog))
            .unwrap();
        assert_eq!(selected.into_iter().collect::<Vec<_>>(), vec!["ticket_details"]);
    }

    #[test]
    fn test_unknown_catalog_stream() {
        let mut catalog = discover();
        catalog.streams[0].tap_stream_id = "orders".to_string();
        catalog.streams[0].set_selected(true);
        let err = tap(base()).selected_streams(Some(&catalog)).unwrap_err();
        assert!(matches!(err, TapError::StreamNotFound(name) if name == "orders"));
    }

    #[test]
    fn test_load_state() {
        assert_eq!(load_state(None).unwrap(), State::new());

        let mut file = NamedTempFile::new().unwrap();
        write!(
            file,
            r#"{{"bookmarks":{{"tickets":{{"replication_key":"updated_datetime","replication_key_value":"2024-01-01T00:00:00+00:00"}}}}}}"#
        )
        .unwrap();
        let state = load_state(Some(file.path())).unwrap();
        assert!(state.bookmark("tickets").is_some());
    }

    #[test]
    fn test_load_blank_state_file() {
        let file = NamedTempFile::new().unwrap();
        assert_eq!(load_state(Some(file.path())).unwrap(), State::new());
    }

    #[test]
    fn test_state_from_sdk_taps_is_accepted() {
        let mut file = NamedTempFile::new().unwrap();
        write!(
            file,
            r#"{{"bookmarks":{{
                "customers":{{}},
                "satisfaction_surveys":{{"progress_markers":{{"Note":"unsorted"}}}},
                "tickets":{{"replication_key":"updated_datetime","replication_key_value":"2024-04-01T00:00:00+00:00"}}
            }}}}"#
        )
        .unwrap();
        let state = load_state(Some(file.path())).unwrap();

        let tracker = StateTracker::new(&TicketsStream, &state, None).unwrap();
        assert_eq!(
            tracker.starting_timestamp().map(|t| t.to_rfc3339()),
            Some("2024-04-01T00:00:00+00:00".to_string())
        );
        assert!(StateTracker::new(&CustomersStream, &state, None).is_ok());
    }

    #[test]
    fn test_summary_counts() {
        let mut summary = SyncSummary::default();
        summary.add("tickets", 2);
        summary.add("messages", 3);
        summary.add("tickets", 1);
        assert_eq!(summary.count("tickets"), 3);
        assert_eq!(summary.count("customers"), 0);
        assert_eq!(summary.total(), 6);
    }
}
