//! Structured errors for the cinedex server.
//!
//! Only parameter validation can fail a tool call; the operations behind the
//! tools degrade instead of erroring.

use rmcp::model::{ErrorCode, ErrorData as McpError};

/// Structured errors for the cinedex server.
#[derive(Debug, thiserror::Error)]
pub enum ToolError {
    /// Invalid input parameters (e.g., limit out of range).
    #[error("INVALID_INPUT: {0}")]
    InvalidInput(String),

    /// Tool output could not be encoded.
    #[error("OUTPUT_ERROR: {0}")]
    Output(String),
}

impl From<ToolError> for McpError {
    fn from(err: ToolError) -> Self {
        let (code, message) = match &err {
            ToolError::InvalidInput(msg) => (-32602, msg.clone()),
            ToolError::Output(msg) => (-32603, msg.clone()),
        };

        McpError { code: ErrorCode(code), message: message.into(), data: None }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_invalid_input_code() {
        let err: McpError = ToolError::InvalidInput("limit must be between 1 and 20".into()).into();
        assert_eq!(err.code.0, -32602);
        assert!(err.message.contains("limit"));
    }
}
