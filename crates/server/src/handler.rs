//! MCP server handler implementation.
//!
//! This module defines the main server handler that
//! routes tool calls to the appropriate implementations.
use std::sync::Arc;

use crate::state::AppState;
use crate::tools::{
    ScrapePopularParams, ScrapeSearchParams, TrendingParams, list_sources_impl, refresh_impl, scrape_popular_impl,
    scrape_search_impl, trending_impl,
};

use rmcp::{
    ErrorData as McpError, ServerHandler,
    handler::server::{
        tool::{ToolCallContext, ToolRouter},
        wrapper::Parameters,
    },
    model::{
        CallToolRequestParam, CallToolResult, Implementation, ListToolsResult, PaginatedRequestParam, ProtocolVersion,
        ServerCapabilities, ServerInfo,
    },
    service::{RequestContext, RoleServer},
    tool, tool_router,
};

/// The main MCP server handler for ficrecs.
#[derive(Clone)]
pub struct FicRecsServer {
    state: Arc<AppState>,
    tool_router: ToolRouter<Self>,
}

/// Tool router implementation using the #[tool_router] macro.
///
/// This macro generates the routing logic that maps tool names to handler methods.
#[tool_router]
impl FicRecsServer {
    /// Create a new server handler.
    pub fn new(state: AppState) -> Self {
        Self { state: Arc::new(state), tool_router: Self::tool_router() }
    }

    /// Scrape the most viewed stories from every registered source.
    #[tool(
        description = "Scrape the most viewed stories from every registered source, optionally split across fandoms, and store the new ones."
    )]
    async fn scrape_popular(&self, params: Parameters<ScrapePopularParams>) -> Result<CallToolResult, McpError> {
        scrape_popular_impl(&self.state.service, &self.state.config, params.0).await
    }

    /// Keyword search across every registered source.
    #[tool(description = "Search every registered source for a keyword query and store the new results.")]
    async fn scrape_search(&self, params: Parameters<ScrapeSearchParams>) -> Result<CallToolResult, McpError> {
        scrape_search_impl(&self.state.service, &self.state.config, params.0).await
    }

    #[tool(description = "Recompute the weekly view estimate of every stored story from a registered source.")]
    async fn refresh_weekly_views(&self) -> Result<CallToolResult, McpError> {
        refresh_impl(&self.state.service).await
    }

    #[tool(description = "List the registered sources in registration order.")]
    async fn list_sources(&self) -> Result<CallToolResult, McpError> {
        list_sources_impl(&self.state.service)
    }

    #[tool(description = "Show the stored stories with the highest weekly views.")]
    async fn trending_stories(&self, params: Parameters<TrendingParams>) -> Result<CallToolResult, McpError> {
        trending_impl(&self.state.db, params.0).await
    }
}

impl ServerHandler for FicRecsServer {
    fn get_info(&self) -> ServerInfo {
        ServerInfo {
            server_info: Implementation {
                name: "ficrecs".into(),
                version: env!("CARGO_PKG_VERSION").into(),
                ..Default::default()
            },
            protocol_version: ProtocolVersion::LATEST,
            capabilities: ServerCapabilities::builder().enable_tools().build(),
            ..Default::default()
        }
    }

    async fn list_tools(
        &self, _request: Option<PaginatedRequestParam>, _context: RequestContext<RoleServer>,
    ) -> Result<ListToolsResult, rmcp::model::ErrorData> {
        Ok(ListToolsResult { meta: None, tools: self.tool_router.list_all(), next_cursor: None })
    }

    async fn call_tool(
        &self, request: CallToolRequestParam, context: RequestContext<RoleServer>,
    ) -> Result<CallToolResult, rmcp::model::ErrorData> {
        self.tool_router
            .call(ToolCallContext::new(self, request, context))
            .await
    }
}
