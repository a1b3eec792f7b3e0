//! TMDB multi-search client.
//!
//! Provides a client for The Movie Database search API used to find poster
//! images by title.
//!
//! ### Specification
//!
//! - **Endpoint**: `https://api.themoviedb.org/3/search/multi`
//! - **Authentication**: `api_key` query parameter.
//! - **Rate Limiting**:
//!   - Enforces a minimum interval between requests from one client.
//!   - 429 is surfaced as [`TmdbError::RateLimited`]; callers decide what to do.
//! - **Normalization**: Converts the raw response into ordered [`MediaCandidate`]s.

pub mod error;
pub mod request;
pub mod response;

pub use error::TmdbError;
pub use request::MultiSearchRequest;
pub use response::{MediaCandidate, MediaType};

use reqwest::header;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::Mutex;

/// Default base URL for the TMDB API.
const DEFAULT_BASE_URL: &str = "https://api.themoviedb.org/3";

/// Default request timeout.
const DEFAULT_TIMEOUT: Duration = Duration::from_secs(2);

/// Default user agent.
const DEFAULT_USER_AGENT: &str = "cinedex/0.1";

/// Minimum interval between requests (TMDB allows roughly 40 requests per second).
const MIN_REQUEST_INTERVAL: Duration = Duration::from_millis(25);

/// TMDB client configuration.
#[derive(Debug, Clone)]
pub struct TmdbConfig {
    /// API key (`CINEDEX_TMDB_API_KEY`).
    pub api_key: String,
    /// Base URL (default: https://api.themoviedb.org/3).
    pub base_url: String,
    /// Response language (default: en-US).
    pub language: String,
    /// Request timeout (default: 2s).
    pub timeout: Duration,
    /// User-agent string (default: cinedex/0.x).
    pub user_agent: String,
}

impl Default for TmdbConfig {
    fn default() -> Self {
        Self {
            api_key: String::new(),
            base_url: DEFAULT_BASE_URL.to_string(),
            language: "en-US".to_string(),
            timeout: DEFAULT_TIMEOUT,
            user_agent: DEFAULT_USER_AGENT.to_string(),
        }
    }
}

impl TmdbConfig {
    /// Build client settings from the application configuration.
    pub fn from_app_config(config: &cinedex_core::AppConfig) -> Result<Self, TmdbError> {
        let api_key = config
            .require_tmdb_api_key()
            .map_err(|_| TmdbError::MissingApiKey)?
            .to_string();

        Ok(Self {
            api_key,
            base_url: config.tmdb_base_url.trim_end_matches('/').to_string(),
            language: config.tmdb_language.clone(),
            timeout: config.tmdb_timeout(),
            user_agent: config.user_agent.clone(),
        })
    }
}

/// Rate limiter to enforce request intervals.
#[derive(Debug)]
struct RateLimiter {
    last_request: Mutex<Instant>,
    min_interval: Duration,
}

impl RateLimiter {
    fn new(min_interval: Duration) -> Self {
        Self {
            last_request: Mutex::new(Instant::now().checked_sub(min_interval).unwrap_or_else(Instant::now)),
            min_interval,
        }
    }

    /// Acquire permission to make a request, waiting if necessary.
    async fn acquire(&self) {
        let mut last = self.last_request.lock().await;
        let elapsed = last.elapsed();
        if elapsed < self.min_interval {
            tokio::time::sleep(self.min_interval - elapsed).await;
        }
        *last = Instant::now();
    }
}

/// TMDB API client.
#[derive(Debug, Clone)]
pub struct TmdbClient {
    http: reqwest::Client,
    config: TmdbConfig,
    rate_limiter: Arc<RateLimiter>,
}

impl TmdbClient {
    /// Create a new TMDB client with the given configuration.
    pub fn new(config: TmdbConfig) -> Result<Self, TmdbError> {
        if config.api_key.is_empty() {
            return Err(TmdbError::MissingApiKey);
        }

        let http = reqwest::Client::builder()
            .timeout(config.timeout)
            .build()
            .map_err(|e| TmdbError::Network(Arc::new(e)))?;

        Ok(Self { http, config, rate_limiter: Arc::new(RateLimiter::new(MIN_REQUEST_INTERVAL)) })
    }

    pub fn language(&self) -> &str {
        &self.config.language
    }

    /// Search movies, TV shows and people by title.
    ///
    /// Waits for the rate limiter, then sends. Candidates are returned in API order.
    pub async fn search_multi(&self, req: MultiSearchRequest) -> Result<Vec<MediaCandidate>, TmdbError> {
        req.validate()?;
        self.wait_turn().await;
        self.send_multi(&req).await
    }

    /// Wait until the rate limiter allows another request.
    pub async fn wait_turn(&self) {
        self.rate_limiter.acquire().await;
    }

    /// Send one validated search without consulting the rate limiter.
    pub(crate) async fn send_multi(&self, req: &MultiSearchRequest) -> Result<Vec<MediaCandidate>, TmdbError> {
        let start = Instant::now();
        let url = format!("{}/search/multi", self.config.base_url);

        tracing::debug!(query = %req.query, "searching TMDB");

        let http_response = self
            .http
            .get(&url)
            .header("Accept", "application/json")
            .header(header::USER_AGENT, &self.config.user_agent)
            .query(&[("api_key", self.config.api_key.as_str())])
            .query(req)
            .send()
            .await?;

        let status = http_response.status();
        tracing::debug!(%status, "TMDB response status");

        if status == 401 || status == 403 {
            return Err(TmdbError::AuthError);
        }

        if status == 429 {
            return Err(TmdbError::RateLimited);
        }

        if !status.is_success() {
            return Err(TmdbError::HttpError { status: status.as_u16() });
        }

        let bytes = http_response.bytes().await?;
        let api_response: response::TmdbApiResponse =
            serde_json::from_slice(&bytes).map_err(|e| TmdbError::Parse(e.to_string()))?;

        let candidates: Vec<MediaCandidate> = api_response.into();
        tracing::debug!(elapsed = ?start.elapsed(), candidates = candidates.len(), "TMDB search completed");

        Ok(candidates)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::io::{AsyncReadExt, AsyncWriteExt};
    use tokio::net::TcpListener;

    /// Serve one canned HTTP response on a local port and return its base URL.
    async fn canned_tmdb(status_line: &'static str, body: &'static str) -> String {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();

        tokio::spawn(async move {
            let Ok((mut socket, _)) = listener.accept().await else {
                return;
            };
            let mut request = [0u8; 4096];
            let _ = socket.read(&mut request).await;
            let response = format!(
                "HTTP/1.1 {status_line}\r\ncontent-type: application/json\r\n\
                 content-length: {}\r\nconnection: close\r\n\r\n{body}",
                body.len()
            );
            let _ = socket.write_all(response.as_bytes()).await;
            let _ = socket.shutdown().await;
        });

        format!("http://{addr}")
    }

    async fn search_against(status_line: &'static str, body: &'static str) -> Result<Vec<MediaCandidate>, TmdbError> {
        let base_url = canned_tmdb(status_line, body).await;
        let client = TmdbClient::new(TmdbConfig {
            api_key: "k".into(),
            base_url,
            timeout: Duration::from_secs(2),
            ..Default::default()
        })
        .unwrap();
        client.search_multi(MultiSearchRequest::new("Alien", "en-US")).await
    }

    #[test]
    fn test_config_from_app_config() {
        let app = cinedex_core::AppConfig {
            tmdb_api_key: Some("secret".into()),
            tmdb_base_url: "https://tmdb.test/3/".into(),
            tmdb_language: "ru-RU".into(),
            ..Default::default()
        };

        let config = TmdbConfig::from_app_config(&app).unwrap();
        assert_eq!(config.api_key, "secret");
        assert_eq!(config.base_url, "https://tmdb.test/3");
        assert_eq!(config.language, "ru-RU");
        assert_eq!(config.timeout, Duration::from_millis(2_000));
    }

    #[test]
    fn test_config_from_app_config_without_key() {
        let app = cinedex_core::AppConfig::default();
        assert!(matches!(TmdbConfig::from_app_config(&app), Err(TmdbError::MissingApiKey)));
    }

    #[test]
    fn test_client_new_missing_key() {
        let config = TmdbConfig::default();
        let result = TmdbClient::new(config);
        assert!(matches!(result, Err(TmdbError::MissingApiKey)));
    }

    #[tokio::test]
    async fn test_invalid_query_fails_before_network() {
        let client = TmdbClient::new(TmdbConfig { api_key: "k".into(), ..Default::default() }).unwrap();
        let result = client.search_multi(MultiSearchRequest::new("", "en-US")).await;
        assert!(matches!(result, Err(TmdbError::InvalidQuery(_))));
    }

    #[tokio::test]
    async fn test_unreachable_host_is_an_error() {
        let client = TmdbClient::new(TmdbConfig {
            api_key: "k".into(),
            base_url: "http://127.0.0.1:9".into(),
            timeout: Duration::from_millis(500),
            ..Default::default()
        })
        .unwrap();

        let result = client.search_multi(MultiSearchRequest::new("Alien", "en-US")).await;
        assert!(matches!(result, Err(TmdbError::Network(_)) | Err(TmdbError::Timeout)));
    }

    #[tokio::test]
    async fn test_successful_search_is_normalized() {
        let body = r#"{"page":1,"total_results":2,"results":[
            {"id":1,"media_type":"person","name":"Sigourney Weaver"},
            {"id":348,"media_type":"movie","title":"Alien","poster_path":"/alien.jpg"}
        ]}"#;

        let candidates = search_against("200 OK", body).await.unwrap();
        assert_eq!(candidates.len(), 2);
        assert_eq!(candidates[1].media_type, MediaType::Movie);
        assert_eq!(candidates[1].poster_path(), Some("/alien.jpg"));
    }

    #[tokio::test]
    async fn test_not_found_is_http_error() {
        let result = search_against("404 Not Found", r#"{"status_code":34}"#).await;
        assert!(matches!(result, Err(TmdbError::HttpError { status: 404 })));
    }

    #[tokio::test]
    async fn test_server_error_is_http_error() {
        let result = search_against("503 Service Unavailable", "").await;
        assert!(matches!(result, Err(TmdbError::HttpError { status: 503 })));
    }

    #[tokio::test]
    async fn test_too_many_requests_is_rate_limited() {
        let result = search_against("429 Too Many Requests", "{}").await;
        assert!(matches!(result, Err(TmdbError::RateLimited)));
    }

    #[tokio::test]
    async fn test_unauthorized_is_auth_error() {
        let result = search_against("401 Unauthorized", r#"{"status_code":7}"#).await;
        assert!(matches!(result, Err(TmdbError::AuthError)));
    }

    #[tokio::test]
    async fn test_malformed_body_is_parse_error() {
        let result = search_against("200 OK", "<html>definitely not json").await;
        assert!(matches!(result, Err(TmdbError::Parse(_))));
    }

    #[tokio::test]
    async fn test_rate_limiter_spaces_requests() {
        let limiter = RateLimiter::new(Duration::from_millis(40));
        let start = Instant::now();
        limiter.acquire().await;
        limiter.acquire().await;
        assert!(start.elapsed() >= Duration::from_millis(40));
    }
}
