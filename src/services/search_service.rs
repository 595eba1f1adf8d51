use std::time::Duration;

use reqwest::Client;
use url::Url;

use crate::config::ExtensionConfig;
use crate::error::AppError;
use crate::models::search::{Query, RawResult, RawSearchResponse, SearchRequest, SearchResult};

const SEARCH_PATH: &str = "search";

/// Hostname of `url`, or the raw string when it is not an absolute URL with a host.
pub fn title_from_url(url: &str) -> String {
    Url::parse(url)
        .ok()
        .and_then(|parsed| parsed.host_str().map(str::to_string))
        .unwrap_or_else(|| url.to_string())
}

pub fn normalize_result(raw: RawResult) -> SearchResult {
    let title = match raw.title {
        Some(title) if !title.trim().is_empty() => title,
        _ => title_from_url(&raw.url),
    };
    SearchResult {
        url: raw.url,
        title,
        snippet: raw.content,
        score: raw.similarity_score,
    }
}

/// Keeps the service's order; no sorting or deduplication.
pub fn normalize(raw: Vec<RawResult>) -> Vec<SearchResult> {
    raw.into_iter().map(normalize_result).collect()
}

pub fn search_url(endpoint: &str) -> String {
    format!("{}/{SEARCH_PATH}", endpoint.trim_end_matches('/'))
}

/// Client for the external passage search service. Cheap to clone; holds no
/// per-request state.
#[derive(Debug, Clone)]
pub struct SearchClient {
    http: Client,
    search_url: String,
}

impl SearchClient {
    pub fn new(config: &ExtensionConfig) -> Result<Self, AppError> {
        let http = Client::builder()
            .timeout(Duration::from_secs(config.request_timeout_secs))
            .build()?;
        Ok(Self {
            http,
            search_url: search_url(&config.endpoint),
        })
    }

    pub async fn search(&self, query: &Query) -> Result<Vec<SearchResult>, AppError> {
        tracing::info!(query = %query, url = %self.search_url, "searching");

        let response = self
            .http
            .post(&self.search_url)
            .json(&SearchRequest { query })
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            tracing::debug!(status = status.as_u16(), %body, "search service rejected request");
            return Err(AppError::Status(status.as_u16()));
        }

        let body = response.text().await?;
        let parsed: RawSearchResponse = serde_json::from_str(&body).map_err(|e| {
            tracing::warn!(error = %e, "search response did not match the expected shape");
            AppError::MalformedResponse(e.to_string())
        })?;

        let results = normalize(parsed.results);
        tracing::info!(count = results.len(), "search completed");
        Ok(results)
    }
}
