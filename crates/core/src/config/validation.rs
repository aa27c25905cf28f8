//! Configuration validation rules.
//!
//! This module provides validation logic for `AppConfig` values
//! after they have been loaded from environment, files, or defaults.

use crate::config::{AppConfig, MAX_LIMIT, ScraperSettings};
use crate::story::Source;
use thiserror::Error;

/// Configuration validation errors.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to load configuration: {0}")]
    LoadFailed(String),

    #[error("invalid configuration: {field} - {reason}")]
    Invalid { field: String, reason: String },
}

fn invalid(field: impl Into<String>, reason: &str) -> ConfigError {
    ConfigError::Invalid { field: field.into(), reason: reason.into() }
}

impl ScraperSettings {
    /// Validate one fetch policy; `prefix` names it in error messages.
    pub fn validate(&self, prefix: &str) -> Result<(), ConfigError> {
        if self.max_retries == 0 {
            return Err(invalid(format!("{prefix}.max_retries"), "must be at least 1"));
        }
        if self.max_retries > 10 {
            return Err(invalid(format!("{prefix}.max_retries"), "must not exceed 10"));
        }
        if self.rate_limit_ms > 60_000 {
            return Err(invalid(format!("{prefix}.rate_limit_ms"), "must not exceed 60000ms"));
        }
        if self.user_agent.trim().is_empty() {
            return Err(invalid(format!("{prefix}.user_agent"), "must not be empty"));
        }
        Ok(())
    }
}

impl AppConfig {
    /// Validate configuration values after loading.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::Invalid` if:
    /// - `timeout_ms` is less than 100ms or exceeds 5 minutes
    /// - any effective scraper policy has out-of-range retries or spacing, or an empty user agent
    /// - a default limit is 0 or above `MAX_LIMIT`
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.timeout_ms < 100 {
            return Err(invalid("timeout_ms", "must be at least 100ms"));
        }
        if self.timeout_ms > 300_000 {
            return Err(invalid("timeout_ms", "must not exceed 5 minutes (300000ms)"));
        }

        self.scraper.validate("scraper")?;
        self.scraper_settings(Source::Ao3).validate("ao3")?;

        for (field, limit) in [
            ("default_popular_limit", self.default_popular_limit),
            ("default_search_limit", self.default_search_limit),
        ] {
            if limit == 0 {
                return Err(invalid(field, "must be at least 1"));
            }
            if limit > MAX_LIMIT {
                return Err(invalid(field, &format!("must not exceed {MAX_LIMIT}")));
            }
        }

        if self.sources.is_empty() {
            tracing::warn!("no sources configured; scrape and search operations will store nothing");
        }

        Ok(())
    }
}
