//! list_sources and trending_stories tool implementations.

use rmcp::{
    ErrorData as McpError,
    model::{CallToolResult, Content},
};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use ficrecs_client::ScrapingService;
use ficrecs_core::{Error, Story, StoryDb};

use super::scrape::check_limit;

/// Output from the list_sources tool.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ListSourcesOutput {
    /// Registered sources in registration order.
    pub sources: Vec<String>,
}

/// Parameters for the trending_stories tool.
#[derive(Debug, Clone, Default, Serialize, Deserialize, JsonSchema)]
pub struct TrendingParams {
    /// Number of stories to return (default 3).
    #[serde(default)]
    pub limit: Option<usize>,
}

const DEFAULT_TRENDING_LIMIT: usize = 3;

/// Output from the trending_stories tool.
#[derive(Debug, Clone, Serialize)]
pub struct TrendingOutput {
    pub stories: Vec<Story>,
}

fn to_result<T: Serialize>(output: &T) -> Result<CallToolResult, McpError> {
    let json = serde_json::to_string_pretty(output)
        .map_err(|e| Error::InvalidInput(format!("Failed to serialize output: {e}")))?;
    Ok(CallToolResult::success(vec![Content::text(json)]))
}

/// Implementation of the list_sources tool.
pub fn list_sources_impl(service: &ScrapingService) -> Result<CallToolResult, McpError> {
    let sources = service.available_sources().iter().map(|s| s.to_string()).collect();
    to_result(&ListSourcesOutput { sources })
}

/// Implementation of the trending_stories tool.
pub async fn trending_impl(db: &StoryDb, params: TrendingParams) -> Result<CallToolResult, McpError> {
    let limit = check_limit(params.limit.unwrap_or(DEFAULT_TRENDING_LIMIT))?;
    let stories = db.trending_stories(limit).await?;
    to_result(&TrendingOutput { stories })
}
