//! GitHub search client: the repository source behind [`RepoSource`].
//!
//! Issues read-only queries against the `/search/repositories` endpoint and
//! normalizes the response into [`RepoRecord`]s. Connection errors and
//! timeouts map to [`SourceError::UpstreamUnavailable`]; HTTP 403/429 (how
//! GitHub signals primary and secondary quota exhaustion) map to
//! [`SourceError::RateLimited`]. The caller decides how to degrade.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use reqwest::StatusCode;
use serde::Deserialize;
use tracing::{debug, error, info};

use crate::config::GithubConfig;
use crate::contract::{MatchMode, RepoQuery, RepoRecord, RepoSource, SourceError};

const ACCEPT_HEADER: &str = "application/vnd.github+json";
const API_VERSION_HEADER: &str = "2022-11-28";
const USER_AGENT: &str = concat!("trend-digest/", env!("CARGO_PKG_VERSION"));

pub struct GithubClient {
    http: reqwest::Client,
    config: GithubConfig,
}

impl GithubClient {
    pub fn new(config: GithubConfig) -> Self {
        Self {
            http: reqwest::Client::new(),
            config,
        }
    }

    async fn search_one(&self, keyword: &str, query: &RepoQuery) -> Result<Vec<RepoRecord>, SourceError> {
        let q = build_query(keyword, query);
        let url = format!(
            "{}/search/repositories",
            self.config.base_url.trim_end_matches('/')
        );
        debug!(query = %q, url = %url, "Searching repositories");

        let params = [
            ("q", q),
            ("sort", query.sort.as_str().to_string()),
            ("order", "desc".to_string()),
            ("per_page", query.limit.to_string()),
        ];
        let mut request = self
            .http
            .get(&url)
            .timeout(self.config.timeout)
            .header("Accept", ACCEPT_HEADER)
            .header("X-GitHub-Api-Version", API_VERSION_HEADER)
            .header("User-Agent", USER_AGENT)
            .query(&params);
        if let Some(token) = &self.config.token {
            request = request.bearer_auth(token);
        }

        let response = request.send().await.map_err(|e| {
            error!(error = ?e, keyword = keyword, "GitHub search request failed");
            SourceError::UpstreamUnavailable(e.to_string())
        })?;

        let status = response.status();
        if status == StatusCode::FORBIDDEN || status == StatusCode::TOO_MANY_REQUESTS {
            error!(%status, keyword = keyword, "GitHub search rate limited");
            return Err(SourceError::RateLimited);
        }
        if !status.is_success() {
            let body = response
                .text()
                .await
                .unwrap_or_else(|_| String::from("<failed to decode response body>"));
            error!(%status, keyword = keyword, body = %body, "GitHub search returned error status");
            return Err(SourceError::UpstreamUnavailable(format!("status {status}")));
        }

        let body = response.text().await.map_err(|e| {
            error!(error = ?e, keyword = keyword, "Failed to read GitHub search response body");
            SourceError::UpstreamUnavailable(e.to_string())
        })?;
        let parsed: SearchResponse = serde_json::from_str(&body).map_err(|e| {
            error!(error = ?e, keyword = keyword, "Failed to decode GitHub search response");
            SourceError::UpstreamUnavailable(format!("malformed response: {e}"))
        })?;

        info!(
            keyword = keyword,
            count = parsed.items.len(),
            "GitHub search succeeded"
        );
        Ok(parsed.items.into_iter().map(RepoRecord::from).collect())
    }
}

#[async_trait]
impl RepoSource for GithubClient {
    async fn search(&self, query: RepoQuery) -> Result<Vec<RepoRecord>, SourceError> {
        let mut records = Vec::new();
        for keyword in &query.keywords {
            records.extend(self.search_one(keyword, &query).await?);
        }
        Ok(records)
    }
}

/// Builds one search-qualifier string, e.g. `topic:mcp stars:>10 pushed:>2026-07-30`.
fn build_query(keyword: &str, query: &RepoQuery) -> String {
    let mut parts = Vec::new();
    match query.mode {
        MatchMode::Topic => parts.push(format!("topic:{keyword}")),
        MatchMode::Keyword => parts.push(keyword.to_string()),
    }
    if query.min_stars > 0 {
        parts.push(format!("stars:>{}", query.min_stars));
    }
    if let Some(date) = query.pushed_after {
        parts.push(format!("pushed:>{}", date.format("%Y-%m-%d")));
    }
    if let Some(date) = query.created_after {
        parts.push(format!("created:>{}", date.format("%Y-%m-%d")));
    }
    parts.join(" ")
}

#[derive(Debug, Deserialize)]
struct SearchResponse {
    #[serde(default)]
    items: Vec<SearchItem>,
}

/// The subset of the upstream search item we consume. Everything else in the
/// payload is ignored on purpose: field access is best effort and additions
/// upstream must not break decoding.
#[derive(Debug, Deserialize)]
struct SearchItem {
    full_name: String,
    html_url: String,
    description: Option<String>,
    stargazers_count: u64,
    created_at: DateTime<Utc>,
    pushed_at: DateTime<Utc>,
    #[serde(default)]
    topics: Vec<String>,
}

impl From<SearchItem> for RepoRecord {
    fn from(item: SearchItem) -> Self {
        Self {
            name: item.full_name,
            url: item.html_url,
            description: item.description.unwrap_or_default(),
            stars: item.stargazers_count,
            created_at: item.created_at,
            pushed_at: item.pushed_at,
            topics: item.topics,
        }
    }
}
