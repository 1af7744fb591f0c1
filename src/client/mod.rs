//! Terminal-side consumer of the merged feed.
//!
//! - [`document`] - parses the served RSS back into items
//! - [`state`] - the merged, deduplicated, bounded item list
//! - [`poller`] - periodic and on-demand polling in a background task

pub mod document;
pub mod poller;
pub mod state;

use thiserror::Error;

pub use document::{parse_document, UNKNOWN_SOURCE};
pub use poller::{fetch_document, Poller, PollerSettings};
pub use state::{ClientFeedState, MergeSummary, PollUpdate};

/// Errors from one poll of the merged feed.
#[derive(Debug, Error)]
pub enum ClientError {
    #[error("Request failed: {0}")]
    Network(#[from] reqwest::Error),
    #[error("HTTP error: status {0}")]
    HttpStatus(u16),
    #[error("Request timed out")]
    Timeout,
    #[error("Invalid feed document: {0}")]
    Parse(String),
}
