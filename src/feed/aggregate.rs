use std::sync::Arc;
use std::time::Instant;

use futures::future::join_all;

use super::fetcher::{fetch_source, FetchError, FetchOptions, FetchResult};
use super::image::ImageExtractor;
use super::types::{sort_by_recency, NormalizedItem, Source};

/// Fetches every source concurrently and returns one result per source.
///
/// Each source runs in its own task. All tasks are awaited to completion;
/// one failing, panicking or cancelled task is reported for that source
/// alone and never affects its siblings.
///
/// Results are returned in `sources` order.
pub async fn fetch_all(
    client: &reqwest::Client,
    sources: &[Source],
    options: FetchOptions,
    extractor: Arc<dyn ImageExtractor>,
) -> Vec<FetchResult> {
    let handles: Vec<_> = sources
        .iter()
        .cloned()
        .map(|source| {
            let client = client.clone();
            let extractor = Arc::clone(&extractor);
            tokio::spawn(async move {
                fetch_source(&client, &source, options, extractor.as_ref()).await
            })
        })
        .collect();

    join_all(handles)
        .await
        .into_iter()
        .zip(sources)
        .map(|(joined, source)| {
            joined.unwrap_or_else(|e| FetchResult {
                source: source.name.clone(),
                result: Err(FetchError::TaskFailed(e.to_string())),
            })
        })
        .collect()
}

/// Builds the merged feed: fetch all sources, drop the failures, flatten
/// and sort newest-first.
///
/// Holds no state between calls. Failed sources are logged and contribute
/// nothing.
pub async fn aggregate(
    client: &reqwest::Client,
    sources: &[Source],
    options: FetchOptions,
    extractor: Arc<dyn ImageExtractor>,
) -> Vec<NormalizedItem> {
    let started = Instant::now();
    let results = fetch_all(client, sources, options, extractor).await;

    let mut failed = 0usize;
    let mut items = Vec::new();
    for result in results {
        if result.result.is_err() {
            failed += 1;
        }
        items.extend(result.into_items());
    }

    sort_by_recency(&mut items);

    tracing::info!(
        sources = sources.len(),
        failed = failed,
        items = items.len(),
        elapsed_ms = started.elapsed().as_millis() as u64,
        "Aggregated feeds"
    );

    items
}
