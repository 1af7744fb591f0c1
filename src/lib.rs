//! Merges several RSS/Atom feeds into one RSS 2.0 feed, and follows that
//! feed from the terminal.
//!
//! - [`feed`] - fetching, image resolution, aggregation and serialization
//! - [`server`] - the `/api/feed` HTTP endpoint
//! - [`client`] - polling and merging the served feed
//! - [`app`] / [`ui`] - the terminal view
//! - [`config`] - TOML configuration with environment overrides

pub mod app;
pub mod client;
pub mod config;
pub mod feed;
pub mod server;
pub mod ui;
pub mod util;

pub use config::{Config, ConfigError};
