//! resolve_poster and resolve_posters tool implementations.
//!
//! Always succeed; unknown titles come back with the placeholder URL.

use rmcp::{ErrorData as McpError, model::*};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use super::json_result;
use crate::error::ToolError;
use crate::services::Services;

/// Upper bound on titles per resolve_posters call (one result page).
const MAX_TITLES: usize = 50;

/// Input parameters for resolve_poster tool.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct ResolvePosterParams {
    /// Film title.
    pub title: String,
}

/// Input parameters for resolve_posters tool.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct ResolvePostersParams {
    /// Film titles, in display order.
    pub titles: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PosterOutput {
    pub title: String,
    pub poster_url: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PosterListOutput {
    pub items: Vec<PosterOutput>,
    pub count: usize,
}

pub async fn resolve_poster(services: &Services, params: ResolvePosterParams) -> PosterOutput {
    let poster_url = services.posters.resolve(&params.title).await;
    PosterOutput { title: params.title, poster_url }
}

pub async fn resolve_posters(services: &Services, params: ResolvePostersParams) -> Result<PosterListOutput, ToolError> {
    if params.titles.len() > MAX_TITLES {
        return Err(ToolError::InvalidInput(format!("at most {MAX_TITLES} titles per call")));
    }

    let urls = services.posters.resolve_many(&params.titles).await;
    let items: Vec<PosterOutput> = params
        .titles
        .into_iter()
        .zip(urls)
        .map(|(title, poster_url)| PosterOutput { title, poster_url })
        .collect();

    Ok(PosterListOutput { count: items.len(), items })
}

/// Implementation of the resolve_poster tool.
pub async fn resolve_poster_impl(services: &Services, params: ResolvePosterParams) -> Result<CallToolResult, McpError> {
    json_result(&resolve_poster(services, params).await)
}

/// Implementation of the resolve_posters tool.
pub async fn resolve_posters_impl(
    services: &Services, params: ResolvePostersParams,
) -> Result<CallToolResult, McpError> {
    json_result(&resolve_posters(services, params).await?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tools::test_support::memory_services;

    #[tokio::test]
    async fn test_resolve_poster_uses_cache() {
        let dir = tempfile::tempdir().unwrap();
        let services = memory_services(&dir).await;

        let output = resolve_poster(&services, ResolvePosterParams { title: "Alien".into() }).await;
        assert_eq!(output.poster_url, "https://img/alien.jpg");

        let missing = resolve_poster(&services, ResolvePosterParams { title: "Unknown".into() }).await;
        assert_eq!(missing.poster_url, services.posters.placeholder_url());
    }

    #[tokio::test]
    async fn test_resolve_posters_keeps_order() {
        let dir = tempfile::tempdir().unwrap();
        let services = memory_services(&dir).await;

        let output = resolve_posters(&services, ResolvePostersParams { titles: vec!["Unknown".into(), "Alien".into()] })
            .await
            .unwrap();
        assert_eq!(output.count, 2);
        assert_eq!(output.items[0].title, "Unknown");
        assert_eq!(output.items[1].poster_url, "https://img/alien.jpg");
    }

    #[tokio::test]
    async fn test_resolve_posters_too_many_titles() {
        let dir = tempfile::tempdir().unwrap();
        let services = memory_services(&dir).await;

        let titles = (0..51).map(|i| format!("title {i}")).collect();
        assert!(resolve_posters(&services, ResolvePostersParams { titles }).await.is_err());
    }
}
