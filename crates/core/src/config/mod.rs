//! Application configuration with layered loading.
//!
//! This module provides configuration management using figment for layered
//! configuration loading from multiple sources:
//!
//! 1. Environment variables (FICRECS_*, nested keys split on `__`)
//! 2. TOML config file (if FICRECS_CONFIG_FILE set)
//! 3. Built-in defaults

use std::path::PathBuf;
use std::time::Duration;

use figment::{
    Figment,
    providers::{Env, Format, Serialized, Toml},
};
use serde::{Deserialize, Serialize};

use crate::story::Source;

mod validation;

pub use validation::ConfigError;

/// Largest story count a single scrape, search or listing may request.
pub const MAX_LIMIT: usize = 200;

/// Fetch policy for one source adapter.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScraperSettings {
    /// Minimum spacing between request starts, in milliseconds.
    pub rate_limit_ms: u64,
    /// Total attempts per URL before giving up.
    pub max_retries: u32,
    /// User-Agent sent on every request.
    pub user_agent: String,
    /// Policy flag recorded for operators; robots.txt is not fetched.
    pub respect_robots: bool,
}

impl Default for ScraperSettings {
    fn default() -> Self {
        Self {
            rate_limit_ms: 2000,
            max_retries: 3,
            user_agent: "FicRecs Bot 1.0 (Educational Project)".into(),
            respect_robots: true,
        }
    }
}

/// Per-source overrides layered on top of [`ScraperSettings`].
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScraperOverrides {
    #[serde(default)]
    pub rate_limit_ms: Option<u64>,
    #[serde(default)]
    pub max_retries: Option<u32>,
    #[serde(default)]
    pub user_agent: Option<String>,
    #[serde(default)]
    pub respect_robots: Option<bool>,
}

impl ScraperOverrides {
    fn apply(&self, base: &ScraperSettings) -> ScraperSettings {
        ScraperSettings {
            rate_limit_ms: self.rate_limit_ms.unwrap_or(base.rate_limit_ms),
            max_retries: self.max_retries.unwrap_or(base.max_retries),
            user_agent: self.user_agent.clone().unwrap_or_else(|| base.user_agent.clone()),
            respect_robots: self.respect_robots.unwrap_or(base.respect_robots),
        }
    }
}

/// Application configuration with layered loading.
///
/// Loading precedence (highest wins):
/// 1. Environment variables (FICRECS_*)
/// 2. TOML config file (if FICRECS_CONFIG_FILE set)
/// 3. Built-in defaults
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    /// Path to the SQLite story database.
    ///
    /// Set via FICRECS_DB_PATH environment variable.
    #[serde(default = "default_db_path")]
    pub db_path: PathBuf,

    /// HTTP request timeout in milliseconds.
    ///
    /// Set via FICRECS_TIMEOUT_MS environment variable.
    #[serde(default = "default_timeout_ms")]
    pub timeout_ms: u64,

    /// Sources to register, in registration order.
    #[serde(default = "default_sources")]
    pub sources: Vec<Source>,

    /// Fetch policy shared by every source unless overridden.
    #[serde(default)]
    pub scraper: ScraperSettings,

    /// AO3 overrides (e.g. FICRECS_AO3__RATE_LIMIT_MS).
    #[serde(default = "default_ao3_overrides")]
    pub ao3: ScraperOverrides,

    /// Limit used by the popular scrape when the caller gives none.
    #[serde(default = "default_limit")]
    pub default_popular_limit: usize,

    /// Limit used by the keyword search when the caller gives none.
    #[serde(default = "default_limit")]
    pub default_search_limit: usize,
}

fn default_db_path() -> PathBuf {
    PathBuf::from("./ficrecs.sqlite")
}

fn default_timeout_ms() -> u64 {
    20_000
}

fn default_sources() -> Vec<Source> {
    vec![Source::Ao3]
}

fn default_ao3_overrides() -> ScraperOverrides {
    ScraperOverrides {
        rate_limit_ms: Some(1000),
        user_agent: Some("FicRecs Educational Bot 1.0 - Contact: ficrecs@example.com".into()),
        ..Default::default()
    }
}

fn default_limit() -> usize {
    20
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            db_path: default_db_path(),
            timeout_ms: default_timeout_ms(),
            sources: default_sources(),
            scraper: ScraperSettings::default(),
            ao3: default_ao3_overrides(),
            default_popular_limit: default_limit(),
            default_search_limit: default_limit(),
        }
    }
}

impl AppConfig {
    /// Timeout as Duration for use with reqwest/tokio.
    pub fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }

    /// Effective fetch policy for a source: its overrides over the shared defaults.
    pub fn scraper_settings(&self, source: Source) -> ScraperSettings {
        match source {
            Source::Ao3 => self.ao3.apply(&self.scraper),
            _ => self.scraper.clone(),
        }
    }

    /// Load configuration from all sources with layered precedence.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if:
    /// - Configuration file cannot be read
    /// - Environment variables cannot be parsed
    /// - Validation fails after loading
    pub fn load() -> Result<Self, ConfigError> {
        Self::from_figment(Self::figment())
    }

    fn figment() -> Figment {
        let mut figment = Figment::from(Serialized::defaults(Self::default()));

        if let Ok(config_path) = std::env::var("FICRECS_CONFIG_FILE") {
            figment = figment.merge(Toml::file(&config_path));
        }

        figment.merge(
            Env::prefixed("FICRECS_")
                .ignore(&["CONFIG_FILE"])
                .map(|key| key.as_str().to_lowercase().into())
                .split("__"),
        )
    }

    fn from_figment(figment: Figment) -> Result<Self, ConfigError> {
        let config: Self = figment.extract().map_err(|e| ConfigError::LoadFailed(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }
}
