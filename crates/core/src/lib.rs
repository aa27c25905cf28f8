//! Core types and shared functionality for ficrecs.
//!
//! This crate provides:
//! - The canonical story model produced by every source adapter
//! - The persistence gateway contract and its SQLite implementation
//! - Unified error types
//! - Layered configuration

pub mod config;
pub mod error;
pub mod gateway;
pub mod store;
pub mod story;

pub use config::{AppConfig, ConfigError, MAX_LIMIT, ScraperSettings};
pub use error::Error;
pub use gateway::StoryGateway;
pub use store::StoryDb;
pub use story::{Rating, ScrapedStory, Source, Story, StoryStatus, clean_text, estimate_weekly_views};
