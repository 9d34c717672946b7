//! tap-gorgias - Singer tap for the Gorgias helpdesk API
//!
//! Extracts tickets, messages, satisfaction surveys and customers from a
//! Gorgias account and writes them to stdout as Singer SCHEMA, RECORD and
//! STATE messages.
//!
//! # Architecture
//!
//! - **client**: Authenticated REST client, status mapping, retry, paging
//! - **config**: Config file loading, environment overrides, validation
//! - **streams**: Stream definitions and the ticket view lifecycle
//! - **sync**: Engine that drives streams and tracks bookmarks
//! - **logging**: tracing setup (stderr only)

pub mod client;
pub mod config;
pub mod error;
pub mod logging;
pub mod streams;
pub mod sync;

// Re-exports
pub use error::{Result, TapError};
pub use sync::{discover, SyncSummary, Tap};
