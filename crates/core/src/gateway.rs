//! Persistence gateway contract used by the scraping pipeline.

use async_trait::async_trait;

use crate::Error;
use crate::story::{ScrapedStory, Story};

/// Storage operations the scraping pipeline depends on.
///
/// The pipeline only ever inserts new rows or rewrites `weekly_views`; every
/// other column of a stored story is left alone.
#[async_trait]
pub trait StoryGateway: Send + Sync {
    /// Look up a stored story by its natural key. Matching is exact and case-sensitive.
    async fn find_story_by_title_author(&self, title: &str, author: &str) -> Result<Option<Story>, Error>;

    /// Insert all records in one write. New rows are never featured.
    ///
    /// Returns the number of rows inserted; an empty slice writes nothing.
    async fn insert_stories(&self, records: &[ScrapedStory]) -> Result<u64, Error>;

    async fn list_all_stories(&self) -> Result<Vec<Story>, Error>;

    async fn update_weekly_views(&self, id: i64, weekly_views: u64) -> Result<(), Error>;
}
