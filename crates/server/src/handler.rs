//! MCP server handler implementation.
//!
//! This module defines the main server handler that
//! routes tool calls to the appropriate implementations.
use crate::services::Services;
use crate::tools::{
    LogImpressionsParams, LogSearchParams, QueryListParams, ResolvePosterParams, ResolvePostersParams, log_search,
    posters, queries,
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

/// The main MCP server handler for cinedex.
#[derive(Clone)]
pub struct CinedexServer {
    tool_router: ToolRouter<Self>,
    services: Services,
}

/// Tool router implementation using the #[tool_router] macro.
///
/// This macro generates the routing logic that maps tool names to handler methods.
#[tool_router]
impl CinedexServer {
    /// Create a new server handler.
    pub fn new(services: Services) -> Self {
        Self { tool_router: Self::tool_router(), services }
    }

    /// Record one catalog search and the films it showed.
    #[tool(
        description = "Record a catalog search and count impressions for the film ids shown. \
                       Best effort; never fails when the log is down."
    )]
    async fn log_search(&self, params: Parameters<LogSearchParams>) -> Result<CallToolResult, McpError> {
        log_search::log_search_impl(&self.services, params.0).await
    }

    #[tool(description = "Count one search impression for each film id shown in a result page.")]
    async fn log_impressions(&self, params: Parameters<LogImpressionsParams>) -> Result<CallToolResult, McpError> {
        log_search::log_impressions_impl(&self.services, params.0).await
    }

    /// Most frequent distinct searches.
    #[tool(
        description = "List the most frequent distinct searches, most popular first. \
                       Returns an empty list when the log is unavailable."
    )]
    async fn popular_queries(&self, params: Parameters<QueryListParams>) -> Result<CallToolResult, McpError> {
        queries::popular_impl(&self.services, params.0).await
    }

    /// Most recently seen distinct searches.
    #[tool(
        description = "List distinct searches by when they were last run, newest first. \
                       Returns an empty list when the log is unavailable."
    )]
    async fn recent_queries(&self, params: Parameters<QueryListParams>) -> Result<CallToolResult, McpError> {
        queries::recent_impl(&self.services, params.0).await
    }

    #[tool(description = "Resolve a film title to a poster URL, or the placeholder image when none exists.")]
    async fn resolve_poster(&self, params: Parameters<ResolvePosterParams>) -> Result<CallToolResult, McpError> {
        posters::resolve_poster_impl(&self.services, params.0).await
    }

    /// Resolve a result page worth of titles.
    ///
    /// Each title is looked up at most once across the life of the cache file.
    #[tool(description = "Resolve several film titles to poster URLs, in order.")]
    async fn resolve_posters(&self, params: Parameters<ResolvePostersParams>) -> Result<CallToolResult, McpError> {
        posters::resolve_posters_impl(&self.services, params.0).await
    }
}

impl ServerHandler for CinedexServer {
    fn get_info(&self) -> ServerInfo {
        ServerInfo {
            server_info: Implementation {
                name: "cinedex".into(),
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

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tools::test_support::memory_services;

    #[tokio::test]
    async fn test_all_tools_registered() {
        let dir = tempfile::tempdir().unwrap();
        let server = CinedexServer::new(memory_services(&dir).await);

        let mut names: Vec<String> = server.tool_router.list_all().into_iter().map(|t| t.name.to_string()).collect();
        names.sort();
        assert_eq!(
            names,
            vec![
                "log_impressions",
                "log_search",
                "popular_queries",
                "recent_queries",
                "resolve_poster",
                "resolve_posters"
            ]
        );
    }

    #[tokio::test]
    async fn test_server_info() {
        let dir = tempfile::tempdir().unwrap();
        let server = CinedexServer::new(memory_services(&dir).await);
        assert_eq!(server.get_info().server_info.name, "cinedex");
    }
}
