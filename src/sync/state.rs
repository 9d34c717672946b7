//! Replication-key tracking for one stream run

use crate::streams::Stream;
use crate::{Result, TapError};
use chrono::{DateTime, Utc};
use serde_json::Value;
use singer::State;
use tracing::debug;

/// Watermark bookkeeping for a single stream
///
/// Records are not trusted to arrive sorted, so the maximum observed value
/// is held until the stream finishes and only then written as a bookmark.
#[derive(Debug)]
pub struct StateTracker {
    stream: &'static str,
    replication_key: Option<&'static str>,
    starting: Option<DateTime<Utc>>,
    max: Option<(DateTime<Utc>, String)>,
}

impl StateTracker {
    /// Resolve the starting watermark: bookmark, else `start_date`, else none
    pub fn new(
        stream: &dyn Stream,
        state: &State,
        start_date: Option<DateTime<Utc>>,
    ) -> Result<Self> {
        let replication_key = stream.replication_key();
        let bookmarked = replication_key
            .and_then(|_| state.bookmark(stream.name()))
            .and_then(|b| b.value());
        let starting = match (replication_key, bookmarked) {
            (None, _) => None,
            (Some(_), Some(raw)) => Some(parse_timestamp(raw).ok_or_else(|| {
                TapError::Parse(format!(
                    "Bookmark for {} is not an RFC 3339 timestamp: {}",
                    stream.name(),
                    raw
                ))
            })?),
            // Entries without a value (`{}`, progress markers) fall back
            (Some(_), None) => start_date,
        };

        Ok(Self {
            stream: stream.name(),
            replication_key,
            starting,
            max: None,
        })
    }

    pub fn starting_timestamp(&self) -> Option<DateTime<Utc>> {
        self.starting
    }

    /// Fold one record's replication-key value into the running maximum
    pub fn observe(&mut self, record: &Value) {
        let Some(key) = self.replication_key else {
            return;
        };
        let Some(raw) = record[key].as_str() else {
            return;
        };
        let Some(ts) = parse_timestamp(raw) else {
            debug!(stream = self.stream, value = raw, "Unparseable replication key value");
            return;
        };
        if self.max.as_ref().map_or(true, |(max, _)| ts > *max) {
            self.max = Some((ts, raw.to_string()));
        }
    }

    /// Highest value seen so far, as returned by the API
    pub fn max_value(&self) -> Option<&str> {
        self.max.as_ref().map(|(_, raw)| raw.as_str())
    }

    /// Write the bookmark into `state`. Returns false when nothing was observed.
    pub fn finalize(&self, state: &mut State) -> bool {
        match (self.replication_key, &self.max) {
            (Some(key), Some((_, raw))) => {
                state.set_bookmark(self.stream, key, raw.clone());
                true
            }
            _ => false,
        }
    }
}

fn parse_timestamp(raw: &str) -> Option<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(raw)
        .ok()
        .map(|dt| dt.with_timezone(&Utc))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::streams::{CustomersStream, TicketsStream};
    use chrono::TimeZone;
    use serde_json::json;

    #[test]
    fn test_starting_from_bookmark_over_start_date() {
        let mut state = State::new();
        state.set_bookmark("tickets", "updated_datetime", "2024-06-01T00:00:00+00:00");
        let start = Utc.with_ymd_and_hms(2020, 1, 1, 0, 0, 0).unwrap();

        let tracker = StateTracker::new(&TicketsStream, &state, Some(start)).unwrap();
        assert_eq!(
            tracker.starting_timestamp(),
            Some(Utc.with_ymd_and_hms(2024, 6, 1, 0, 0, 0).unwrap())
        );

        let tracker = StateTracker::new(&TicketsStream, &State::new(), Some(start)).unwrap();
        assert_eq!(tracker.starting_timestamp(), Some(start));

        let tracker = StateTracker::new(&TicketsStream, &State::new(), None).unwrap();
        assert_eq!(tracker.starting_timestamp(), None);
    }

    #[test]
    fn test_bad_bookmark_is_error() {
        let mut state = State::new();
        state.set_bookmark("tickets", "updated_datetime", "yesterday");
        assert!(StateTracker::new(&TicketsStream, &state, None).is_err());
    }

    #[test]
    fn test_valueless_bookmark_falls_back_to_start_date() {
        let state = State::from_json(
            r#"{"bookmarks":{"tickets":{"progress_markers":{"Note":"x"}}}}"#,
        )
        .unwrap();
        let start = Utc.with_ymd_and_hms(2023, 9, 1, 0, 0, 0).unwrap();
        let tracker = StateTracker::new(&TicketsStream, &state, Some(start)).unwrap();
        assert_eq!(tracker.starting_timestamp(), Some(start));
    }

    #[test]
    fn test_max_over_unsorted_records() {
        let mut tracker = StateTracker::new(&TicketsStream, &State::new(), None).unwrap();
        tracker.observe(&json!({"updated_datetime": "2024-03-02T10:00:00+00:00"}));
        tracker.observe(&json!({"updated_datetime": "2024-03-05T08:00:00.123456+00:00"}));
        tracker.observe(&json!({"updated_datetime": "2024-03-01T00:00:00+00:00"}));
        tracker.observe(&json!({"updated_datetime": null}));
        tracker.observe(&json!({"updated_datetime": "garbage"}));
        assert_eq!(tracker.max_value(), Some("2024-03-05T08:00:00.123456+00:00"));

        let mut state = State::new();
        assert!(tracker.finalize(&mut state));
        let bookmark = state.bookmark("tickets").unwrap();
        assert_eq!(bookmark.replication_key.as_deref(), Some("updated_datetime"));
        assert_eq!(bookmark.value(), Some("2024-03-05T08:00:00.123456+00:00"));
    }

    #[test]
    fn test_finalize_keeps_previous_bookmark_when_empty() {
        let mut state = State::new();
        state.set_bookmark("tickets", "updated_datetime", "2024-06-01T00:00:00+00:00");
        let tracker = StateTracker::new(&TicketsStream, &state, None).unwrap();
        assert!(!tracker.finalize(&mut state));
        assert_eq!(
            state.bookmark("tickets").unwrap().value(),
            Some("2024-06-01T00:00:00+00:00")
        );
    }

    #[test]
    fn test_full_table_stream_never_bookmarks() {
        let mut tracker = StateTracker::new(&CustomersStream, &State::new(), None).unwrap();
        tracker.observe(&json!({"updated_datetime": "2024-03-02T10:00:00+00:00"}));
        let mut state = State::new();
        assert!(!tracker.finalize(&mut state));
        assert!(state.bookmarks.is_empty());
    }
}
