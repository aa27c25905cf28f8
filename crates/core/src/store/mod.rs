//! SQLite-backed story store.
//!
//! This module provides the persistence gateway implementation using SQLite
//! with async access via tokio-rusqlite. It supports:
//!
//! - Natural-key lookup by (title, author)
//! - Transactional bulk insert of scraped stories
//! - Weekly-view updates and trending reads
//! - Automatic schema migrations in WAL mode

pub mod connection;
pub mod migrations;
pub mod stories;

pub use crate::Error;

pub use connection::StoryDb;
