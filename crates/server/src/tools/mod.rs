//! MCP tool implementations.
//!
//! This module contains all tools exposed by the ficrecs server.

pub mod catalog;
pub mod refresh;
pub mod scrape;

pub use catalog::{TrendingParams, list_sources_impl, trending_impl};
pub use refresh::refresh_impl;
pub use scrape::{ScrapePopularParams, ScrapeSearchParams, scrape_popular_impl, scrape_search_impl};
