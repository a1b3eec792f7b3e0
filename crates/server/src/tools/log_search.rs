//! log_search and log_impressions tool implementations.
//!
//! Called by the search routes after a result page has been produced. Both
//! are best effort: an unreachable log yields `logged: false` / `recorded: 0`,
//! never an error.

use rmcp::{ErrorData as McpError, model::*};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use cinedex_core::SearchKind;

use super::json_result;
use crate::services::Services;

/// Input parameters for log_search tool.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct LogSearchParams {
    /// Kind of search: keyword, genre, year or manual.
    pub search_kind: SearchKind,

    /// Search parameters. keyword: `query`; genre: `category_id`, `genre_name`;
    /// year: `year`; manual: `query`, `year_from`, `year_to`, `genres`.
    #[serde(default)]
    pub params: Map<String, Value>,

    /// Film ids shown in the result page, counted as impressions.
    #[serde(default)]
    pub result_ids: Vec<i64>,
}

/// Output structure for log_search tool.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LogSearchOutput {
    /// Whether the search event was stored.
    pub logged: bool,
    /// Number of impression counters updated.
    pub impressions_recorded: usize,
}

/// Input parameters for log_impressions tool.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct LogImpressionsParams {
    /// Film ids shown in a result page.
    pub result_ids: Vec<i64>,
}

/// Output structure for log_impressions tool.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LogImpressionsOutput {
    /// Number of impression counters updated.
    pub recorded: usize,
}

pub async fn log_search(services: &Services, params: LogSearchParams) -> LogSearchOutput {
    let logged = services.log.append(params.search_kind, params.params).await;
    let impressions_recorded = services.log.record_impressions(&params.result_ids).await;
    LogSearchOutput { logged, impressions_recorded }
}

pub async fn log_impressions(services: &Services, params: LogImpressionsParams) -> LogImpressionsOutput {
    LogImpressionsOutput { recorded: services.log.record_impressions(&params.result_ids).await }
}

/// Implementation of the log_search tool.
pub async fn log_search_impl(services: &Services, params: LogSearchParams) -> Result<CallToolResult, McpError> {
    json_result(&log_search(services, params).await)
}

/// Implementation of the log_impressions tool.
pub async fn log_impressions_impl(
    services: &Services, params: LogImpressionsParams,
) -> Result<CallToolResult, McpError> {
    json_result(&log_impressions(services, params).await)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tools::test_support::{memory_services, unreachable_services};
    use serde_json::json;

    fn keyword_params(query: &str, result_ids: Vec<i64>) -> LogSearchParams {
        LogSearchParams {
            search_kind: SearchKind::Keyword,
            params: json!({"query": query}).as_object().cloned().unwrap(),
            result_ids,
        }
    }

    #[tokio::test]
    async fn test_log_search_records_event_and_impressions() {
        let dir = tempfile::tempdir().unwrap();
        let services = memory_services(&dir).await;

        let output = log_search(&services, keyword_params("alien", vec![1, 2])).await;
        assert_eq!(output, LogSearchOutput { logged: true, impressions_recorded: 2 });

        let popular = services.aggregator.top_popular(5).await;
        assert_eq!(popular[0].query, "alien");
        assert_eq!(services.log.impressions(2).await.unwrap().search_impressions, 1);
    }

    #[tokio::test]
    async fn test_log_search_without_store() {
        let dir = tempfile::tempdir().unwrap();
        let services = unreachable_services(&dir);

        let output = log_search(&services, keyword_params("alien", vec![1])).await;
        assert_eq!(output, LogSearchOutput { logged: false, impressions_recorded: 0 });
        assert!(log_search_impl(&services, keyword_params("alien", vec![])).await.is_ok());
    }

    #[tokio::test]
    async fn test_log_impressions() {
        let dir = tempfile::tempdir().unwrap();
        let services = memory_services(&dir).await;

        let output = log_impressions(&services, LogImpressionsParams { result_ids: vec![5, 5, 6] }).await;
        assert_eq!(output.recorded, 3);
        assert_eq!(services.log.impressions(5).await.unwrap().search_impressions, 2);
    }

    #[test]
    fn test_params_deserialize() {
        let params: LogSearchParams =
            serde_json::from_value(json!({"search_kind": "genre", "params": {"category_id": 3}})).unwrap();
        assert_eq!(params.search_kind, SearchKind::Genre);
        assert!(params.result_ids.is_empty());

        let bad = serde_json::from_value::<LogSearchParams>(json!({"search_kind": "actor"}));
        assert!(bad.is_err());
    }
}
