//! Story CRUD operations.
//!
//! Implements [`StoryGateway`] for [`StoryDb`] and adds the catalog reads the
//! admin surface needs.

use async_trait::async_trait;
use chrono::NaiveDate;
use tokio_rusqlite::rusqlite::{self, Row};
use tokio_rusqlite::params;

use super::connection::StoryDb;
use crate::Error;
use crate::gateway::StoryGateway;
use crate::story::{ScrapedStory, Story};

const STORY_COLUMNS: &str = "id, title, author, summary, fandom, tags_json, rating, word_count, status,
     last_updated, source, original_url, view_count, weekly_views, is_featured, created_at";

/// Raw column values, decoded into a [`Story`] outside the rusqlite row callback.
struct StoryRow {
    id: i64,
    title: String,
    author: String,
    summary: String,
    fandom: String,
    tags_json: String,
    rating: String,
    word_count: i64,
    status: String,
    last_updated: String,
    source: String,
    original_url: Option<String>,
    view_count: i64,
    weekly_views: i64,
    is_featured: i32,
    created_at: String,
}

impl StoryRow {
    fn read(row: &Row<'_>) -> rusqlite::Result<Self> {
        Ok(Self {
            id: row.get(0)?,
            title: row.get(1)?,
            author: row.get(2)?,
            summary: row.get(3)?,
            fandom: row.get(4)?,
            tags_json: row.get(5)?,
            rating: row.get(6)?,
            word_count: row.get(7)?,
            status: row.get(8)?,
            last_updated: row.get(9)?,
            source: row.get(10)?,
            original_url: row.get(11)?,
            view_count: row.get(12)?,
            weekly_views: row.get(13)?,
            is_featured: row.get(14)?,
            created_at: row.get(15)?,
        })
    }

    fn into_story(self) -> Result<Story, Error> {
        let id = self.id;
        let invalid = |field: &str, detail: String| Error::InvalidRecord(format!("story {id} {field}: {detail}"));

        Ok(Story {
            id,
            tags: serde_json::from_str(&self.tags_json).map_err(|e| invalid("tags", e.to_string()))?,
            rating: self.rating.parse().map_err(|e| invalid("rating", e))?,
            word_count: u64::try_from(self.word_count).map_err(|e| invalid("word_count", e.to_string()))?,
            status: self.status.parse().map_err(|e| invalid("status", e))?,
            last_updated: NaiveDate::parse_from_str(&self.last_updated, "%Y-%m-%d")
                .map_err(|e| invalid("last_updated", e.to_string()))?,
            source: self.source.parse().map_err(|e| invalid("source", e))?,
            view_count: u64::try_from(self.view_count).map_err(|e| invalid("view_count", e.to_string()))?,
            weekly_views: u64::try_from(self.weekly_views).map_err(|e| invalid("weekly_views", e.to_string()))?,
            is_featured: self.is_featured == 1,
            title: self.title,
            author: self.author,
            summary: self.summary,
            fandom: self.fandom,
            original_url: self.original_url,
            created_at: self.created_at,
        })
    }
}

fn to_sql_count(value: u64) -> Result<i64, Error> {
    i64::try_from(value).map_err(|_| Error::InvalidInput(format!("count {value} exceeds storage range")))
}

#[async_trait]
impl StoryGateway for StoryDb {
    async fn find_story_by_title_author(&self, title: &str, author: &str) -> Result<Option<Story>, Error> {
        let title = title.to_string();
        let author = author.to_string();
        let row = self
            .conn
            .call(move |conn| -> Result<Option<StoryRow>, Error> {
                let mut stmt = conn.prepare(&format!(
                    "SELECT {STORY_COLUMNS} FROM stories WHERE title = ?1 AND author = ?2 ORDER BY id LIMIT 1"
                ))?;

                match stmt.query_row(params![title, author], StoryRow::read) {
                    Ok(row) => Ok(Some(row)),
                    Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
                    Err(e) => Err(e.into()),
                }
            })
            .await
            .map_err(Error::from)?;

        row.map(StoryRow::into_story).transpose()
    }

    async fn insert_stories(&self, records: &[ScrapedStory]) -> Result<u64, Error> {
        if records.is_empty() {
            return Ok(0);
        }

        let mut rows = Vec::with_capacity(records.len());
        for record in records {
            let tags_json = serde_json::to_string(&record.tags).map_err(|e| Error::InvalidInput(e.to_string()))?;
            rows.push((
                record.clone(),
                tags_json,
                to_sql_count(record.word_count)?,
                to_sql_count(record.view_count)?,
                to_sql_count(record.weekly_views)?,
            ));
        }
        let created_at = chrono::Utc::now().to_rfc3339();

        self.conn
            .call(move |conn| -> Result<u64, Error> {
                let tx = conn.transaction()?;
                {
                    let mut stmt = tx.prepare(
                        "INSERT INTO stories (
                        title, author, summary, fandom, tags_json, rating, word_count, status,
                        last_updated, source, original_url, view_count, weekly_views, is_featured, created_at
                    ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, 0, ?14)",
                    )?;

                    for (story, tags_json, word_count, view_count, weekly_views) in &rows {
                        stmt.execute(params![
                            &story.title,
                            &story.author,
                            &story.summary,
                            &story.fandom,
                            tags_json,
                            story.rating.to_string(),
                            word_count,
                            story.status.as_str(),
                            story.last_updated.format("%Y-%m-%d").to_string(),
                            story.source.as_str(),
                            &story.original_url,
                            view_count,
                            weekly_views,
                            &created_at,
                        ])?;
                    }
                }
                tx.commit()?;
                Ok(rows.len() as u64)
            })
            .await
            .map_err(Error::from)
    }

    async fn list_all_stories(&self) -> Result<Vec<Story>, Error> {
        let rows = self
            .conn
            .call(|conn| -> Result<Vec<StoryRow>, Error> {
                let mut stmt = conn.prepare(&format!("SELECT {STORY_COLUMNS} FROM stories ORDER BY view_count DESC, id"))?;
                let rows = stmt
                    .query_map([], StoryRow::read)?
                    .collect::<rusqlite::Result<Vec<_>>>()?;
                Ok(rows)
            })
            .await
            .map_err(Error::from)?;

        rows.into_iter().map(StoryRow::into_story).collect()
    }

    async fn update_weekly_views(&self, id: i64, weekly_views: u64) -> Result<(), Error> {
        let weekly_views = to_sql_count(weekly_views)?;
        let changed = self
            .conn
            .call(move |conn| -> Result<usize, Error> {
                let changed = conn.execute(
                    "UPDATE stories SET weekly_views = ?1 WHERE id = ?2",
                    params![weekly_views, id],
                )?;
                Ok(changed)
            })
            .await
            .map_err(Error::from)?;

        if changed == 0 {
            return Err(Error::StoryNotFound(id));
        }
        Ok(())
    }
}

impl StoryDb {
    /// Get a story by id.
    ///
    /// Returns None if no story has that id.
    pub async fn get_story(&self, id: i64) -> Result<Option<Story>, Error> {
        let row = self
            .conn
            .call(move |conn| -> Result<Option<StoryRow>, Error> {
                let mut stmt = conn.prepare(&format!("SELECT {STORY_COLUMNS} FROM stories WHERE id = ?1"))?;

                match stmt.query_row(params![id], StoryRow::read) {
                    Ok(row) => Ok(Some(row)),
                    Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
                    Err(e) => Err(e.into()),
                }
            })
            .await
            .map_err(Error::from)?;

        row.map(StoryRow::into_story).transpose()
    }

    /// Stories with at least one estimated weekly view, most viewed first.
    pub async fn trending_stories(&self, limit: usize) -> Result<Vec<Story>, Error> {
        let limit = i64::try_from(limit).unwrap_or(i64::MAX);
        let rows = self
            .conn
            .call(move |conn| -> Result<Vec<StoryRow>, Error> {
                let mut stmt = conn.prepare(&format!(
                    "SELECT {STORY_COLUMNS} FROM stories
                     WHERE weekly_views >= 1
                     ORDER BY weekly_views DESC, id
                     LIMIT ?1"
                ))?;
                let rows = stmt
                    .query_map(params![limit], StoryRow::read)?
                    .collect::<rusqlite::Result<Vec<_>>>()?;
                Ok(rows)
            })
            .await
            .map_err(Error::from)?;

        rows.into_iter().map(StoryRow::into_story).collect()
    }
}
