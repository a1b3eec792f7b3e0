//! MCP tool implementations.
//!
//! This module contains all tools exposed by the cinedex server.

pub mod log_search;
pub mod posters;
pub mod queries;

pub use log_search::{LogImpressionsParams, LogSearchParams};
pub use posters::{ResolvePosterParams, ResolvePostersParams};
pub use queries::QueryListParams;

use rmcp::{ErrorData as McpError, model::*};
use serde::Serialize;

use crate::error::ToolError;

/// Encode tool output as a pretty-printed JSON text result.
pub(crate) fn json_result<T: Serialize>(output: &T) -> Result<CallToolResult, McpError> {
    let json = serde_json::to_string_pretty(output).map_err(|e| ToolError::Output(e.to_string()))?;
    Ok(CallToolResult::success(vec![Content::text(json)]))
}


#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_json_result_is_success() {
        let result = json_result(&json!({"count": 0})).unwrap();
        assert!(!result.is_error.unwrap_or(false));
        assert_eq!(result.content.len(), 1);
    }
}
