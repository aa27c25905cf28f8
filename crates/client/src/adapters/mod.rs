//! Source adapters: one per archive, each turning that archive's markup into
//! [`ScrapedStory`] records.
//!
//! ### Contract
//! - `scrape_story` fails only when the page cannot be fetched or a required
//!   field (title, author) is missing; optional fields degrade to empty.
//! - `search_stories` and `get_popular_stories` fetch one listing page, take
//!   the first `limit` entries and scrape each in order. A failing entry is
//!   logged and skipped; only a failed listing fetch fails the call.
//!
//! ### Status
//! - Chapters `"n/n"` is complete; `"n/?"` and `"n/m"` are in progress.
//!   Nothing emits on-hiatus.

pub mod ao3;
pub mod error;

pub use ao3::Ao3Adapter;
pub use error::ScrapeError;

use async_trait::async_trait;
use chrono::{NaiveDate, Utc};
use regex::Regex;
use std::sync::LazyLock;

use ficrecs_core::{ScrapedStory, Source, StoryStatus};

static COUNT_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\d[\d,]*").expect("invalid count pattern"));
static DATE_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\d{4}-\d{2}-\d{2}").expect("invalid date pattern"));

/// Capabilities shared by every archive adapter.
#[async_trait]
pub trait SourceAdapter: Send + Sync {
    /// Archive this adapter reads from.
    fn source(&self) -> Source;

    /// Fetch and parse one story page.
    async fn scrape_story(&self, url: &str) -> Result<ScrapedStory, ScrapeError>;

    /// Keyword search sorted by popularity, scraping up to `limit` results.
    async fn search_stories(&self, query: &str, limit: usize) -> Result<Vec<ScrapedStory>, ScrapeError>;

    /// Most viewed stories, optionally within one fandom.
    async fn get_popular_stories(&self, fandom: Option<&str>, limit: usize) -> Result<Vec<ScrapedStory>, ScrapeError>;
}

/// Scrape each URL in order, dropping entries that fail.
pub(crate) async fn collect_stories<A>(adapter: &A, urls: &[String]) -> Vec<ScrapedStory>
where
    A: SourceAdapter + ?Sized,
{
    let mut stories = Vec::with_capacity(urls.len());
    for (index, url) in urls.iter().enumerate() {
        match adapter.scrape_story(url).await {
            Ok(story) => stories.push(story),
            Err(e) => {
                tracing::warn!(
                    source = %adapter.source(),
                    url = %url,
                    entry = index + 1,
                    error = %e,
                    "skipping story that failed to scrape"
                );
            }
        }
    }
    stories
}

/// First number in `text`, thousands separators removed; 0 when absent.
pub fn parse_count(text: &str) -> u64 {
    COUNT_RE
        .find(text)
        .and_then(|m| m.as_str().replace(',', "").parse().ok())
        .unwrap_or(0)
}

/// Parse a `current/total` chapters string.
pub fn parse_status(chapters: &str) -> StoryStatus {
    match chapters.split_once('/') {
        Some((current, total)) => {
            let (current, total) = (current.trim(), total.trim());
            if current == total && total != "?" { StoryStatus::Complete } else { StoryStatus::InProgress }
        }
        None => StoryStatus::InProgress,
    }
}

/// First `YYYY-MM-DD` date in `text`, or today's date (UTC).
pub fn parse_date(text: &str) -> NaiveDate {
    DATE_RE
        .find(text)
        .and_then(|m| NaiveDate::parse_from_str(m.as_str(), "%Y-%m-%d").ok())
        .unwrap_or_else(|| Utc::now().date_naive())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;

    #[test]
    fn test_parse_status() {
        assert_eq!(parse_status("12/12"), StoryStatus::Complete);
        assert_eq!(parse_status("5/?"), StoryStatus::InProgress);
        assert_eq!(parse_status("3/10"), StoryStatus::InProgress);
        assert_eq!(parse_status(" 1 / 1 "), StoryStatus::Complete);
        assert_eq!(parse_status("?/?"), StoryStatus::InProgress);
        assert_eq!(parse_status(""), StoryStatus::InProgress);
    }

    #[test]
    fn test_parse_count() {
        assert_eq!(parse_count("1,234,567"), 1_234_567);
        assert_eq!(parse_count("Hits: 15420"), 15_420);
        assert_eq!(parse_count("  \n 42 \n"), 42);
        assert_eq!(parse_count(""), 0);
        assert_eq!(parse_count(", none"), 0);
    }

    #[test]
    fn test_parse_date() {
        assert_eq!(parse_date("Updated: 2024-01-15"), NaiveDate::from_ymd_opt(2024, 1, 15).unwrap());
        assert_eq!(parse_date("2023-12-01 and 2024-02-02"), NaiveDate::from_ymd_opt(2023, 12, 1).unwrap());
    }

    #[test]
    fn test_parse_date_falls_back_to_today() {
        let before = Utc::now().date_naive();
        let parsed = parse_date("last week");
        let after = Utc::now().date_naive();
        assert!(parsed == before || parsed == after);

        let invalid = parse_date("2024-13-45");
        assert!(invalid == before || invalid == after);
    }

    struct FlakyAdapter {
        scraped: Mutex<Vec<String>>,
    }

    #[async_trait]
    impl SourceAdapter for FlakyAdapter {
        fn source(&self) -> Source {
            Source::Ao3
        }

        async fn scrape_story(&self, url: &str) -> Result<ScrapedStory, ScrapeError> {
            self.scraped.lock().unwrap().push(url.to_string());
            if url.ends_with("bad") {
                return Err(ScrapeError::missing(url, "title"));
            }
            Ok(ScrapedStory {
                title: url.to_string(),
                author: "someone".into(),
                summary: String::new(),
                fandom: String::new(),
                tags: vec![],
                rating: ficrecs_core::Rating::NEUTRAL,
                word_count: 0,
                status: StoryStatus::InProgress,
                last_updated: NaiveDate::from_ymd_opt(2024, 1, 1).unwrap(),
                source: Source::Ao3,
                original_url: url.to_string(),
                view_count: 0,
                weekly_views: 0,
            })
        }

        async fn search_stories(&self, _query: &str, _limit: usize) -> Result<Vec<ScrapedStory>, ScrapeError> {
            Ok(vec![])
        }

        async fn get_popular_stories(&self, _: Option<&str>, _: usize) -> Result<Vec<ScrapedStory>, ScrapeError> {
            Ok(vec![])
        }
    }

    #[tokio::test]
    async fn test_collect_stories_skips_failures_in_order() {
        let adapter = FlakyAdapter { scraped: Mutex::new(vec![]) };
        let urls = vec!["https://x/1".to_string(), "https://x/bad".to_string(), "https://x/3".to_string()];

        let stories = collect_stories(&adapter, &urls).await;

        let titles: Vec<_> = stories.iter().map(|s| s.title.as_str()).collect();
        assert_eq!(titles, vec!["https://x/1", "https://x/3"]);
        assert_eq!(*adapter.scraped.lock().unwrap(), urls);
    }
}
