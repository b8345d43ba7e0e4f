//! HTTP-level tests for the GitHub search client, against a local mock
//! server. The base URL is injected through config, so no test ever talks to
//! the real API.

use chrono::NaiveDate;
use trend_digest_core::config::GithubConfig;
use trend_digest_core::contract::{MatchMode, RepoQuery, RepoSort, RepoSource, SourceError};
use trend_digest_core::github::GithubClient;
use wiremock::matchers::{header, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn trending_query(keywords: &[&str]) -> RepoQuery {
    RepoQuery {
        keywords: keywords.iter().map(|k| (*k).to_string()).collect(),
        min_stars: 10,
        pushed_after: NaiveDate::from_ymd_opt(2026, 7, 1),
        created_after: None,
        limit: 5,
        sort: RepoSort::Stars,
        mode: MatchMode::Topic,
    }
}

fn client_for(server: &MockServer, token: Option<&str>) -> GithubClient {
    GithubClient::new(GithubConfig {
        base_url: server.uri(),
        token: token.map(str::to_string),
        ..GithubConfig::default()
    })
}

fn search_body() -> serde_json::Value {
    serde_json::json!({
        "total_count": 1,
        "items": [{
            "full_name": "acme/mcp-kit",
            "html_url": "https://github.com/acme/mcp-kit",
            "description": "An MCP toolkit",
            "stargazers_count": 1234,
            "forks_count": 5,
            "language": "Rust",
            "topics": ["mcp", "llm"],
            "created_at": "2026-06-01T00:00:00Z",
            "updated_at": "2026-08-01T00:00:00Z",
            "pushed_at": "2026-08-01T12:00:00Z"
        }]
    })
}

#[tokio::test]
async fn search_decodes_repository_records() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/search/repositories"))
        .respond_with(ResponseTemplate::new(200).set_body_json(search_body()))
        .mount(&server)
        .await;

    let client = client_for(&server, None);
    let records = client
        .search(trending_query(&["mcp"]))
        .await
        .expect("search should succeed");

    assert_eq!(records.len(), 1);
    let record = &records[0];
    assert_eq!(record.name, "acme/mcp-kit");
    assert_eq!(record.url, "https://github.com/acme/mcp-kit");
    assert_eq!(record.description, "An MCP toolkit");
    assert_eq!(record.stars, 1234);
    assert_eq!(record.topics, vec!["mcp", "llm"]);
}

#[tokio::test]
async fn search_sends_expected_query_and_headers() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/search/repositories"))
        .and(query_param("q", "topic:mcp stars:>10 pushed:>2026-07-01"))
        .and(query_param("sort", "stars"))
        .and(query_param("order", "desc"))
        .and(query_param("per_page", "5"))
        .and(header("Accept", "application/vnd.github+json"))
        .and(header("X-GitHub-Api-Version", "2022-11-28"))
        .and(header("Authorization", "Bearer test-token"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "total_count": 0,
            "items": []
        })))
        .expect(1)
        .mount(&server)
        .await;

    let client = client_for(&server, Some("test-token"));
    let records = client
        .search(trending_query(&["mcp"]))
        .await
        .expect("search should succeed");
    assert!(records.is_empty());
}

#[tokio::test]
async fn search_issues_one_request_per_keyword() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/search/repositories"))
        .respond_with(ResponseTemplate::new(200).set_body_json(search_body()))
        .expect(2)
        .mount(&server)
        .await;

    let client = client_for(&server, None);
    let records = client
        .search(trending_query(&["mcp", "model-context-protocol"]))
        .await
        .expect("search should succeed");
    assert_eq!(records.len(), 2, "one page of results per keyword");
}

#[tokio::test]
async fn forbidden_status_maps_to_rate_limited() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/search/repositories"))
        .respond_with(ResponseTemplate::new(403))
        .mount(&server)
        .await;

    let client = client_for(&server, None);
    let err = client
        .search(trending_query(&["mcp"]))
        .await
        .expect_err("403 must fail");
    assert!(matches!(err, SourceError::RateLimited), "got: {err:?}");
}

#[tokio::test]
async fn too_many_requests_maps_to_rate_limited() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/search/repositories"))
        .respond_with(ResponseTemplate::new(429))
        .mount(&server)
        .await;

    let client = client_for(&server, None);
    let err = client
        .search(trending_query(&["mcp"]))
        .await
        .expect_err("429 must fail");
    assert!(matches!(err, SourceError::RateLimited), "got: {err:?}");
}

#[tokio::test]
async fn server_error_maps_to_upstream_unavailable() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/search/repositories"))
        .respond_with(ResponseTemplate::new(500))
        .mount(&server)
        .await;

    let client = client_for(&server, None);
    let err = client
        .search(trending_query(&["mcp"]))
        .await
        .expect_err("500 must fail");
    assert!(
        matches!(err, SourceError::UpstreamUnavailable(_)),
        "got: {err:?}"
    );
}

#[tokio::test]
async fn connection_failure_maps_to_upstream_unavailable() {
    // Nothing listens on port 1; the connection is refused immediately.
    let client = GithubClient::new(GithubConfig {
        base_url: "http://127.0.0.1:1".to_string(),
        ..GithubConfig::default()
    });
    let err = client
        .search(trending_query(&["mcp"]))
        .await
        .expect_err("refused connection must fail");
    assert!(
        matches!(err, SourceError::UpstreamUnavailable(_)),
        "got: {err:?}"
    );
}

#[tokio::test]
async fn malformed_body_maps_to_upstream_unavailable() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/search/repositories"))
        .respond_with(ResponseTemplate::new(200).set_body_string("not json"))
        .mount(&server)
        .await;

    let client = client_for(&server, None);
    let err = client
        .search(trending_query(&["mcp"]))
        .await
        .expect_err("garbage body must fail");
    assert!(
        matches!(err, SourceError::UpstreamUnavailable(_)),
        "got: {err:?}"
    );
}
