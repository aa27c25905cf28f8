//! Canonical story model.
//!
//! [`ScrapedStory`] is the normalized record every source adapter produces,
//! independent of the markup it was parsed from. [`Story`] is the persisted
//! form handed back by the gateway.

use std::fmt;
use std::str::FromStr;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// Archive a story was scraped from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Source {
    #[serde(rename = "AO3")]
    Ao3,
    #[serde(rename = "FFN")]
    Ffn,
    #[serde(rename = "SpaceBattles")]
    SpaceBattles,
    #[serde(rename = "Sufficient Velocity")]
    SufficientVelocity,
}

impl Source {
    pub const ALL: [Source; 4] = [Source::Ao3, Source::Ffn, Source::SpaceBattles, Source::SufficientVelocity];

    pub fn as_str(&self) -> &'static str {
        match self {
            Source::Ao3 => "AO3",
            Source::Ffn => "FFN",
            Source::SpaceBattles => "SpaceBattles",
            Source::SufficientVelocity => "Sufficient Velocity",
        }
    }
}

impl fmt::Display for Source {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Source {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Source::ALL
            .into_iter()
            .find(|source| source.as_str() == s)
            .ok_or_else(|| format!("unknown source: {s}"))
    }
}

/// Publication status of a story.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum StoryStatus {
    Complete,
    InProgress,
    /// Only ever set by manual curation; no adapter emits it.
    OnHiatus,
}

impl StoryStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            StoryStatus::Complete => "complete",
            StoryStatus::InProgress => "in-progress",
            StoryStatus::OnHiatus => "on-hiatus",
        }
    }
}

impl FromStr for StoryStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "complete" => Ok(StoryStatus::Complete),
            "in-progress" => Ok(StoryStatus::InProgress),
            "on-hiatus" => Ok(StoryStatus::OnHiatus),
            other => Err(format!("unknown status: {other}")),
        }
    }
}

/// Story rating on a 0.0-5.0 scale with one decimal place.
///
/// Held as a count of tenths so comparisons never go through floats.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Rating(u8);

impl Rating {
    pub const MAX_TENTHS: u8 = 50;

    /// Rating assigned when a source label is not recognized.
    pub const NEUTRAL: Rating = Rating(40);

    pub const fn from_tenths(tenths: u8) -> Option<Rating> {
        if tenths <= Self::MAX_TENTHS { Some(Rating(tenths)) } else { None }
    }

    pub fn tenths(&self) -> u8 {
        self.0
    }
}

impl fmt::Display for Rating {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}", self.0 / 10, self.0 % 10)
    }
}

impl FromStr for Rating {
    type Err = String;

    /// Accepts `"4"`, `"4.8"` and `"4.80"`; anything finer than a tenth is rejected.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        let (whole, frac) = s.split_once('.').unwrap_or((s, "0"));
        let frac = frac.trim_end_matches('0');
        let frac = if frac.is_empty() { "0" } else { frac };

        let whole: u8 = whole.parse().map_err(|_| format!("invalid rating: {s}"))?;
        if frac.len() != 1 {
            return Err(format!("invalid rating: {s}"));
        }
        let frac: u8 = frac.parse().map_err(|_| format!("invalid rating: {s}"))?;

        whole
            .checked_mul(10)
            .and_then(|w| w.checked_add(frac))
            .and_then(Rating::from_tenths)
            .ok_or_else(|| format!("rating out of range: {s}"))
    }
}

impl TryFrom<String> for Rating {
    type Error = String;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<Rating> for String {
    fn from(rating: Rating) -> Self {
        rating.to_string()
    }
}

/// A normalized story record as produced by a source adapter.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScrapedStory {
    pub title: String,
    pub author: String,
    pub summary: String,
    pub fandom: String,
    pub tags: Vec<String>,
    pub rating: Rating,
    pub word_count: u64,
    pub status: StoryStatus,
    pub last_updated: NaiveDate,
    pub source: Source,
    pub original_url: String,
    pub view_count: u64,
    pub weekly_views: u64,
}

/// A story as stored by the persistence gateway.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Story {
    pub id: i64,
    pub title: String,
    pub author: String,
    pub summary: String,
    pub fandom: String,
    pub tags: Vec<String>,
    pub rating: Rating,
    pub word_count: u64,
    pub status: StoryStatus,
    pub last_updated: NaiveDate,
    pub source: Source,
    pub original_url: Option<String>,
    pub view_count: u64,
    pub weekly_views: u64,
    pub is_featured: bool,
    pub created_at: String,
}

/// Weekly views estimate: 10% of lifetime views, rounded half up.
///
/// Sources expose no time-windowed counters, so this stays a fixed ratio.
pub fn estimate_weekly_views(view_count: u64) -> u64 {
    view_count / 10 + u64::from(view_count % 10 >= 5)
}

/// Collapse every whitespace run to a single space and trim the ends.
pub fn clean_text(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_source_round_trip_strings() {
        for source in Source::ALL {
            assert_eq!(source.as_str().parse::<Source>().unwrap(), source);
        }
        assert_eq!(Source::SufficientVelocity.to_string(), "Sufficient Velocity");
        assert!("Wattpad".parse::<Source>().is_err());
    }

    #[test]
    fn test_source_serde_uses_archive_names() {
        let json = serde_json::to_string(&Source::Ao3).unwrap();
        assert_eq!(json, "\"AO3\"");
        let parsed: Source = serde_json::from_str("\"Sufficient Velocity\"").unwrap();
        assert_eq!(parsed, Source::SufficientVelocity);
    }

    #[test]
    fn test_status_strings() {
        assert_eq!(StoryStatus::InProgress.as_str(), "in-progress");
        assert_eq!("on-hiatus".parse::<StoryStatus>().unwrap(), StoryStatus::OnHiatus);
        assert_eq!(serde_json::to_string(&StoryStatus::Complete).unwrap(), "\"complete\"");
        assert!("hiatus".parse::<StoryStatus>().is_err());
    }

    #[test]
    fn test_rating_parse_and_display() {
        assert_eq!("4.8".parse::<Rating>().unwrap().tenths(), 48);
        assert_eq!("4".parse::<Rating>().unwrap().to_string(), "4.0");
        assert_eq!("3.50".parse::<Rating>().unwrap().to_string(), "3.5");
        assert_eq!("0.0".parse::<Rating>().unwrap().tenths(), 0);
        assert_eq!("5.0".parse::<Rating>().unwrap().tenths(), 50);
    }

    #[test]
    fn test_rating_rejects_out_of_range_and_precision() {
        assert!("5.1".parse::<Rating>().is_err());
        assert!("4.85".parse::<Rating>().is_err());
        assert!("-1".parse::<Rating>().is_err());
        assert!("four".parse::<Rating>().is_err());
        assert!(Rating::from_tenths(51).is_none());
    }

    #[test]
    fn test_rating_ordering_is_decimal() {
        let low: Rating = "3.9".parse().unwrap();
        let high: Rating = "4.0".parse().unwrap();
        assert!(low < high);
        assert_eq!(Rating::NEUTRAL, high);
    }

    #[test]
    fn test_rating_serde_as_text() {
        let rating: Rating = "4.5".parse().unwrap();
        assert_eq!(serde_json::to_string(&rating).unwrap(), "\"4.5\"");
        let back: Rating = serde_json::from_str("\"4.5\"").unwrap();
        assert_eq!(back, rating);
    }

    #[test]
    fn test_estimate_weekly_views() {
        assert_eq!(estimate_weekly_views(15420), 1542);
        assert_eq!(estimate_weekly_views(0), 0);
        assert_eq!(estimate_weekly_views(4), 0);
        assert_eq!(estimate_weekly_views(5), 1);
        assert_eq!(estimate_weekly_views(15), 2);
        assert_eq!(estimate_weekly_views(1234), 123);
    }

    #[test]
    fn test_clean_text() {
        assert_eq!(clean_text("  Hello\n\t  world \r\n"), "Hello world");
        assert_eq!(clean_text(""), "");
        assert_eq!(clean_text("one"), "one");
    }
}
