//! State shared by all request handlers.

use std::sync::Arc;

use anyhow::{Context, Result};

use crate::config::Config;
use crate::feed::{ChannelInfo, FetchOptions, ImageExtractor, RegexImageExtractor, Source};

/// Everything a request needs to rebuild the merged feed.
///
/// Read-only after startup. Cloning is cheap.
#[derive(Clone)]
pub struct AppState {
    /// Shared HTTP client for upstream fetches.
    pub http: reqwest::Client,
    pub sources: Arc<[Source]>,
    pub channel: Arc<ChannelInfo>,
    pub fetch: FetchOptions,
    pub extractor: Arc<dyn ImageExtractor>,
}

impl AppState {
    pub fn new(config: &Config) -> Result<Self> {
        let http = reqwest::Client::builder()
            .user_agent(config.fetch.user_agent.as_str())
            .build()
            .context("Failed to build HTTP client")?;

        tracing::info!(
            sources = config.sources.len(),
            timeout_secs = config.fetch.timeout_secs,
            max_feed_bytes = config.fetch.max_feed_bytes,
            "application state initialized"
        );

        Ok(Self {
            http,
            sources: config.sources.clone().into(),
            channel: Arc::new(config.channel.clone()),
            fetch: config.fetch.options(),
            extractor: Arc::new(RegexImageExtractor),
        })
    }

    /// Replaces the image extractor.
    pub fn with_extractor(mut self, extractor: Arc<dyn ImageExtractor>) -> Self {
        self.extractor = extractor;
        self
    }
}
