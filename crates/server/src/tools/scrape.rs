//! scrape_popular and scrape_search tool implementations.
//!
//! Both run the whole scrape before answering; per-story failures only show
//! up in the logs and in the report counts.

use rmcp::{
    ErrorData as McpError,
    model::{CallToolResult, Content},
};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use ficrecs_client::{ScrapingService, StoreReport};
use ficrecs_core::{AppConfig, Error, MAX_LIMIT};

/// Parameters for the scrape_popular tool.
#[derive(Debug, Clone, Default, Serialize, Deserialize, JsonSchema)]
pub struct ScrapePopularParams {
    /// Fandoms to scrape; omit or leave empty to scrape across all fandoms.
    #[serde(default)]
    pub fandoms: Option<Vec<String>>,

    /// Total stories to request (1-200, default from config).
    #[serde(default)]
    pub limit: Option<usize>,
}

/// Parameters for the scrape_search tool.
#[derive(Debug, Clone, Default, Serialize, Deserialize, JsonSchema)]
pub struct ScrapeSearchParams {
    /// Keyword query (required).
    pub query: String,

    /// Total stories to request across all sources (1-200, default from config).
    #[serde(default)]
    pub limit: Option<usize>,
}

/// Output of both scrape tools.
#[derive(Debug, Clone, Serialize)]
pub struct ScrapeOutput {
    /// Single aggregate outcome message.
    pub message: String,
    pub report: StoreReport,
}

pub(crate) fn check_limit(limit: usize) -> Result<usize, Error> {
    if (1..=MAX_LIMIT).contains(&limit) {
        Ok(limit)
    } else {
        Err(Error::InvalidInput(format!("limit must be between 1 and {MAX_LIMIT}, got {limit}")))
    }
}

fn respond(report: StoreReport) -> Result<CallToolResult, McpError> {
    let message = format!(
        "Scraped {} stories: {} new, {} already stored",
        report.scraped, report.inserted, report.skipped
    );
    let output = ScrapeOutput { message, report };
    let json = serde_json::to_string_pretty(&output)
        .map_err(|e| Error::InvalidInput(format!("Failed to serialize report: {e}")))?;

    Ok(CallToolResult::success(vec![Content::text(json)]))
}

/// Implementation of the scrape_popular tool.
pub async fn scrape_popular_impl(
    service: &ScrapingService, config: &AppConfig, params: ScrapePopularParams,
) -> Result<CallToolResult, McpError> {
    let limit = check_limit(params.limit.unwrap_or(config.default_popular_limit))?;
    let fandoms = params.fandoms.unwrap_or_default();

    let report = service.scrape_and_store(&fandoms, limit).await?;
    respond(report)
}

/// Implementation of the scrape_search tool.
pub async fn scrape_search_impl(
    service: &ScrapingService, config: &AppConfig, params: ScrapeSearchParams,
) -> Result<CallToolResult, McpError> {
    let query = params.query.trim();
    if query.is_empty() {
        return Err(Error::InvalidInput("query must not be empty".into()).into());
    }
    let limit = check_limit(params.limit.unwrap_or(config.default_search_limit))?;

    let report = service.search_and_store(query, limit).await?;
    respond(report)
}
