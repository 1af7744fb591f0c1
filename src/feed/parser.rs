use anyhow::Result;
use feed_rs::model::Entry;
use feed_rs::parser;

use super::image::{resolve_image, ImageExtractor};
use super::types::NormalizedItem;
use crate::util::html_to_snippet;

/// Parses an RSS/Atom/JSON feed body into normalized items stamped with
/// `source_name`.
///
/// Missing fields default to empty strings. An entry without a date keeps
/// `published = None` rather than failing the feed.
pub fn parse_feed(
    bytes: &[u8],
    source_name: &str,
    extractor: &dyn ImageExtractor,
) -> Result<Vec<NormalizedItem>> {
    let feed = parser::parse(bytes)?;

    let items = feed
        .entries
        .into_iter()
        .map(|entry| normalize_entry(entry, source_name, extractor))
        .collect();

    Ok(items)
}

fn normalize_entry(entry: Entry, source_name: &str, extractor: &dyn ImageExtractor) -> NormalizedItem {
    let image = resolve_image(&entry, extractor);

    let link = entry
        .links
        .iter()
        .find(|l| l.rel.as_deref().map_or(true, |rel| rel == "alternate"))
        .or_else(|| entry.links.first())
        .map(|l| l.href.trim().to_string())
        .unwrap_or_default();
    let published = entry.published.or(entry.updated);
    let title = entry
        .title
        .map(|t| t.content.trim().to_string())
        .unwrap_or_default();
    let description = entry
        .summary
        .map(|s| s.content)
        .or_else(|| entry.content.and_then(|c| c.body))
        .unwrap_or_default();
    let snippet = html_to_snippet(&description);

    NormalizedItem {
        title,
        link,
        description,
        snippet,
        published,
        image,
        source: source_name.to_string(),
    }
}
