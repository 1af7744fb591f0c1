//! Upstream feed handling and the merged RSS output.
//!
//! - [`fetcher`] - HTTP retrieval of one source with timeout and size limits
//! - [`parser`] - `feed-rs` parsing into [`NormalizedItem`]s
//! - [`image`] - picks a representative image per entry
//! - [`aggregate`] - concurrent fan-out over all sources, merged and sorted
//! - [`serializer`] - RSS 2.0 rendering of the merged list
//!
//! # Example
//!
//! ```ignore
//! use feedmerge::feed::{aggregate, serialize, ChannelInfo, FetchOptions, RegexImageExtractor};
//!
//! let items = aggregate(&client, &sources, FetchOptions::default(), Arc::new(RegexImageExtractor)).await;
//! let xml = serialize(&items, &ChannelInfo::default())?;
//! ```

pub mod aggregate;
pub mod fetcher;
pub mod image;
pub mod parser;
pub mod serializer;
pub mod types;

pub use aggregate::{aggregate, fetch_all};
pub use fetcher::{
    fetch_items, fetch_source, FetchError, FetchOptions, FetchResult, DEFAULT_FETCH_TIMEOUT,
    DEFAULT_MAX_FEED_SIZE,
};
pub use image::{resolve_image, ImageExtractor, RegexImageExtractor};
pub use parser::parse_feed;
pub use serializer::{escape_xml, serialize, ChannelInfo};
pub use types::{sort_by_recency, ImageRef, NormalizedItem, Source};
