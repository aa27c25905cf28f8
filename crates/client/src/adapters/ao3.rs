//! Archive of Our Own adapter.

use async_trait::async_trait;
use reqwest::Url;
use scraper::{ElementRef, Html, Selector};
use std::sync::LazyLock;

use ficrecs_core::{Rating, ScrapedStory, Source, clean_text, estimate_weekly_views};

use super::{ScrapeError, SourceAdapter, collect_stories, parse_count, parse_date, parse_status};
use crate::fetch::{FetchConfig, FetchError, Fetcher, normalize_url, resolve_href};

pub const AO3_BASE_URL: &str = "https://archiveofourown.org";

/// AO3 maturity labels on the canonical rating scale, in tenths.
const RATING_TABLE: [(&str, u8); 5] = [
    ("General Audiences", 35),
    ("Teen And Up Audiences", 40),
    ("Mature", 45),
    ("Explicit", 48),
    ("Not Rated", 40),
];

fn selector(css: &'static str) -> Selector {
    Selector::parse(css).expect("invalid selector")
}

static WORK_BLURB: LazyLock<Selector> = LazyLock::new(|| selector("li.work.blurb"));
static BLURB_LINK: LazyLock<Selector> = LazyLock::new(|| selector(".heading a[href]"));
static TITLE: LazyLock<Selector> = LazyLock::new(|| selector("#workskin .title"));
static AUTHOR: LazyLock<Selector> = LazyLock::new(|| selector(r#".byline a[rel="author"]"#));
static SUMMARY: LazyLock<Selector> = LazyLock::new(|| selector(".summary blockquote"));
static FANDOM: LazyLock<Selector> = LazyLock::new(|| selector("dd.fandom a"));
static FREEFORM: LazyLock<Selector> = LazyLock::new(|| selector("dd.freeform a"));
static RATING: LazyLock<Selector> = LazyLock::new(|| selector("dd.rating a"));
static CHAPTERS: LazyLock<Selector> = LazyLock::new(|| selector("dd.chapters"));
static WORDS: LazyLock<Selector> = LazyLock::new(|| selector("dd.words"));
static HITS: LazyLock<Selector> = LazyLock::new(|| selector("dd.hits"));
static UPDATED: LazyLock<Selector> = LazyLock::new(|| selector("dd.status"));
static PUBLISHED: LazyLock<Selector> = LazyLock::new(|| selector("dd.published"));

/// Map an AO3 rating label to the canonical scale; unknown labels are neutral.
pub fn map_rating(label: &str) -> Rating {
    RATING_TABLE
        .iter()
        .find(|(name, _)| *name == label)
        .and_then(|(_, tenths)| Rating::from_tenths(*tenths))
        .unwrap_or(Rating::NEUTRAL)
}

/// Adapter for archiveofourown.org.
#[derive(Debug)]
pub struct Ao3Adapter {
    fetcher: Fetcher,
    base_url: Url,
}

impl Ao3Adapter {
    pub fn new(config: FetchConfig) -> Result<Self, FetchError> {
        Self::with_fetcher(Fetcher::new(config)?, AO3_BASE_URL)
    }

    /// Build an adapter around an existing fetcher and site root.
    pub fn with_fetcher(fetcher: Fetcher, base_url: &str) -> Result<Self, FetchError> {
        Ok(Self { fetcher, base_url: normalize_url(base_url)? })
    }

    fn endpoint(&self, path_and_query: &str) -> String {
        format!("{}{}", self.base_url.as_str().trim_end_matches('/'), path_and_query)
    }

    fn popular_url(&self, fandom: Option<&str>) -> String {
        let mut url = self.endpoint("/works?work_search[sort_column]=hits&work_search[sort_direction]=desc");
        if let Some(fandom) = fandom {
            url.push_str("&work_search[fandom_names]=");
            url.push_str(&encode(fandom));
        }
        url
    }

    fn search_url(&self, query: &str) -> String {
        self.endpoint(&format!(
            "/works/search?work_search[query]={}&work_search[sort_column]=hits&work_search[sort_direction]=desc",
            encode(query)
        ))
    }

    async fn scrape_listing(&self, listing_url: &str, limit: usize) -> Result<Vec<ScrapedStory>, ScrapeError> {
        let page = self.fetcher.fetch(listing_url).await?;
        let urls = listing_urls(&page.text(), &self.base_url, limit);
        tracing::debug!(source = %Source::Ao3, url = %listing_url, entries = urls.len(), "parsed listing");
        Ok(collect_stories(self, &urls).await)
    }
}

#[async_trait]
impl SourceAdapter for Ao3Adapter {
    fn source(&self) -> Source {
        Source::Ao3
    }

    async fn scrape_story(&self, url: &str) -> Result<ScrapedStory, ScrapeError> {
        let page = self.fetcher.fetch(url).await?;
        parse_work(&page.text(), url)
    }

    async fn search_stories(&self, query: &str, limit: usize) -> Result<Vec<ScrapedStory>, ScrapeError> {
        self.scrape_listing(&self.search_url(query), limit).await
    }

    async fn get_popular_stories(&self, fandom: Option<&str>, limit: usize) -> Result<Vec<ScrapedStory>, ScrapeError> {
        self.scrape_listing(&self.popular_url(fandom), limit).await
    }
}

fn encode(value: &str) -> String {
    url::form_urlencoded::byte_serialize(value.as_bytes()).collect()
}

fn text_of(element: ElementRef<'_>) -> String {
    clean_text(&element.text().collect::<String>())
}

fn first_text(document: &Html, selector: &Selector) -> String {
    document.select(selector).next().map(text_of).unwrap_or_default()
}

/// Detail-page URLs of the first `limit` works on a listing page.
fn listing_urls(html: &str, base_url: &Url, limit: usize) -> Vec<String> {
    let document = Html::parse_document(html);
    document
        .select(&WORK_BLURB)
        .take(limit)
        .enumerate()
        .filter_map(|(index, blurb)| {
            let href = blurb.select(&BLURB_LINK).next().and_then(|a| a.value().attr("href"));
            let resolved = href.and_then(|href| resolve_href(base_url, href));
            if resolved.is_none() {
                tracing::warn!(source = %Source::Ao3, entry = index + 1, "listing entry has no work link");
            }
            resolved
        })
        .collect()
}

/// Parse a work page into a story record.
fn parse_work(html: &str, url: &str) -> Result<ScrapedStory, ScrapeError> {
    let document = Html::parse_document(html);

    let title = first_text(&document, &TITLE);
    if title.is_empty() {
        return Err(ScrapeError::missing(url, "title"));
    }
    let author = first_text(&document, &AUTHOR);
    if author.is_empty() {
        return Err(ScrapeError::missing(url, "author"));
    }

    let summary = document.select(&SUMMARY).map(text_of).collect::<Vec<_>>().join(" ");
    let tags = document
        .select(&FREEFORM)
        .map(text_of)
        .filter(|tag| !tag.is_empty())
        .collect();

    let updated = first_text(&document, &UPDATED);
    let last_updated = if updated.is_empty() { first_text(&document, &PUBLISHED) } else { updated };
    let view_count = parse_count(&first_text(&document, &HITS));

    Ok(ScrapedStory {
        title,
        author,
        summary,
        fandom: first_text(&document, &FANDOM),
        tags,
        rating: map_rating(&first_text(&document, &RATING)),
        word_count: parse_count(&first_text(&document, &WORDS)),
        status: parse_status(&first_text(&document, &CHAPTERS)),
        last_updated: parse_date(&last_updated),
        source: Source::Ao3,
        original_url: url.to_string(),
        view_count,
        weekly_views: estimate_weekly_views(view_count),
    })
}
