//! popular_queries and recent_queries tool implementations.

use rmcp::{ErrorData as McpError, model::*};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use cinedex_core::AggregateEntry;

use super::json_result;
use crate::error::ToolError;
use crate::services::Services;

const MAX_LIMIT: u32 = 20;

/// Input parameters for popular_queries and recent_queries.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct QueryListParams {
    /// Number of entries to return (1-20, default 5).
    #[serde(default = "default_limit")]
    pub limit: u32,
}

impl Default for QueryListParams {
    fn default() -> Self {
        Self { limit: default_limit() }
    }
}

fn default_limit() -> u32 {
    5
}

impl QueryListParams {
    fn validated_limit(&self) -> Result<usize, ToolError> {
        if !(1..=MAX_LIMIT).contains(&self.limit) {
            return Err(ToolError::InvalidInput(format!("limit must be between 1 and {MAX_LIMIT}")));
        }
        Ok(self.limit as usize)
    }
}

/// Output structure for the query list tools.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QueryListOutput {
    pub items: Vec<AggregateEntry>,
    pub count: usize,
}

impl From<Vec<AggregateEntry>> for QueryListOutput {
    fn from(items: Vec<AggregateEntry>) -> Self {
        Self { count: items.len(), items }
    }
}

pub async fn popular_queries(services: &Services, params: &QueryListParams) -> Result<QueryListOutput, ToolError> {
    let limit = params.validated_limit()?;
    Ok(services.aggregator.top_popular(limit).await.into())
}

pub async fn recent_queries(services: &Services, params: &QueryListParams) -> Result<QueryListOutput, ToolError> {
    let limit = params.validated_limit()?;
    Ok(services.aggregator.top_recent(limit).await.into())
}

/// Implementation of the popular_queries tool.
pub async fn popular_impl(services: &Services, params: QueryListParams) -> Result<CallToolResult, McpError> {
    json_result(&popular_queries(services, &params).await?)
}

/// Implementation of the recent_queries tool.
pub async fn recent_impl(services: &Services, params: QueryListParams) -> Result<CallToolResult, McpError> {
    json_result(&recent_queries(services, &params).await?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tools::test_support::{memory_services, unreachable_services};
    use cinedex_core::SearchKind;
    use serde_json::json;
    use std::time::Duration;

    async fn log_keywords(services: &Services, queries: &[&str]) {
        for query in queries {
            let params = json!({"query": query}).as_object().cloned().unwrap();
            assert!(services.log.append(SearchKind::Keyword, params).await);
            tokio::time::sleep(Duration::from_millis(5)).await;
        }
    }

    #[tokio::test]
    async fn test_popular_and_recent() {
        let dir = tempfile::tempdir().unwrap();
        let services = memory_services(&dir).await;
        log_keywords(&services, &["A", "A", "A", "B", "B", "C"]).await;

        let popular = popular_queries(&services, &QueryListParams { limit: 2 }).await.unwrap();
        assert_eq!(popular.count, 2);
        assert_eq!(popular.items[0].query, "A");
        assert_eq!(popular.items[0].count, 3);
        assert_eq!(popular.items[1].query, "B");

        let recent = recent_queries(&services, &QueryListParams::default()).await.unwrap();
        let queries: Vec<_> = recent.items.iter().map(|e| e.query.as_str()).collect();
        assert_eq!(queries, vec!["C", "B", "A"]);
    }

    #[tokio::test]
    async fn test_limit_out_of_range() {
        let dir = tempfile::tempdir().unwrap();
        let services = memory_services(&dir).await;

        assert!(popular_queries(&services, &QueryListParams { limit: 0 }).await.is_err());
        assert!(recent_queries(&services, &QueryListParams { limit: 21 }).await.is_err());
        assert!(popular_impl(&services, QueryListParams { limit: 50 }).await.is_err());
    }

    #[tokio::test]
    async fn test_unreachable_store_returns_empty_list() {
        let dir = tempfile::tempdir().unwrap();
        let services = unreachable_services(&dir);

        let popular = popular_queries(&services, &QueryListParams::default()).await.unwrap();
        assert_eq!(popular.count, 0);
        assert!(recent_impl(&services, QueryListParams::default()).await.is_ok());
    }

    #[test]
    fn test_default_limit() {
        let params: QueryListParams = serde_json::from_value(json!({})).unwrap();
        assert_eq!(params.limit, 5);
    }
}
