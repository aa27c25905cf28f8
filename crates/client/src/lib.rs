//! Scraping pipeline for ficrecs.
//!
//! This crate provides the rate-limited fetch engine, the source adapters
//! built on it, and the service that fans requests out across adapters and
//! persists what they return.

pub mod adapters;
pub mod fetch;
pub mod service;

pub use adapters::{Ao3Adapter, ScrapeError, SourceAdapter};
pub use fetch::{AttemptError, FetchConfig, FetchError, FetchResponse, Fetcher, ReqwestTransport, Transport};
pub use service::{RefreshReport, ScrapingService, StoreReport};
