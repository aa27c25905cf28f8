//! refresh_weekly_views tool implementation.

use rmcp::{
    ErrorData as McpError,
    model::{CallToolResult, Content},
};
use serde::Serialize;

use ficrecs_client::{RefreshReport, ScrapingService};
use ficrecs_core::Error;

/// Output from the refresh_weekly_views tool.
#[derive(Debug, Clone, Serialize)]
pub struct RefreshOutput {
    pub message: String,
    pub report: RefreshReport,
}

/// Implementation of the refresh_weekly_views tool.
pub async fn refresh_impl(service: &ScrapingService) -> Result<CallToolResult, McpError> {
    let report = service.refresh_weekly_views().await?;

    let message = if report.failed == 0 {
        format!("Updated weekly views for {} stories", report.updated)
    } else {
        format!("Updated weekly views for {} stories, {} failed", report.updated, report.failed)
    };
    let output = RefreshOutput { message, report };
    let json = serde_json::to_string_pretty(&output)
        .map_err(|e| Error::InvalidInput(format!("Failed to serialize report: {e}")))?;

    Ok(CallToolResult::success(vec![Content::text(json)]))
}
