use chrono::{DateTime, Utc};
use serde::Deserialize;

/// A configured upstream feed.
///
/// Sources are loaded once from configuration and never change while the
/// process runs.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct Source {
    /// Display name stamped onto every item from this feed (e.g. "Punch").
    pub name: String,
    /// Absolute http(s) URL of the RSS/Atom document.
    pub url: String,
}

impl Source {
    pub fn new(name: impl Into<String>, url: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            url: url.into(),
        }
    }
}

/// A representative image for an item, serialized as an RSS `<enclosure>`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImageRef {
    pub url: String,
    /// Declared size in bytes, when the feed provided one.
    pub length: Option<u64>,
    /// MIME type, declared or guessed from the URL.
    pub mime_type: String,
}

/// One feed entry after normalization.
///
/// Both sides of the wire use this shape: the server produces it from
/// upstream feeds, and the client parses it back out of the merged document.
/// `link` is the deduplication key.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NormalizedItem {
    pub title: String,
    pub link: String,
    /// Raw item body (summary, or full content when no summary exists).
    pub description: String,
    /// Plain-text rendering of `description`, when it yields any text.
    pub snippet: Option<String>,
    /// `None` when the feed gave no parseable date. Sorts as the minimum.
    pub published: Option<DateTime<Utc>>,
    pub image: Option<ImageRef>,
    /// Name of the [`Source`] this item came from.
    pub source: String,
}

impl NormalizedItem {
    /// Text to publish as the item description: the snippet if there is one,
    /// otherwise the raw description.
    pub fn display_description(&self) -> &str {
        self.snippet.as_deref().unwrap_or(&self.description)
    }
}

/// Sort items newest-first. Undated items sink to the end.
///
/// The sort is stable, so equal timestamps keep their incoming order. That
/// order is an artifact of the input and callers should not rely on it.
pub fn sort_by_recency(items: &mut [NormalizedItem]) {
    // Option orders None below Some, so comparing b against a puts None last.
    items.sort_by(|a, b| b.published.cmp(&a.published));
}
