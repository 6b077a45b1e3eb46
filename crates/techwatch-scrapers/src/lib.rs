//! Source plugins: each one turns an upstream API, feed, or page into
//! [`techwatch_core::NormalizedItem`]s. Plugins are pure `ScraperPlugin`
//! implementations; caching, rate limiting and retry live in
//! `techwatch-http` and are composed in by each plugin as needed.

pub mod arxiv;
pub mod devto;
pub mod error;
pub mod github_trending;
pub mod hackernews;
pub mod medium;
pub mod official_blogs;
pub mod plugin;
pub mod reddit;
pub mod registry;
pub mod twitter_nitter;
pub mod youtube_rss;
pub mod youtube_trending;

pub use error::{PluginError, Result};
pub use plugin::{ScrapeConfig, ScraperPlugin};
pub use registry::{ScraperRegistry, register_all};
