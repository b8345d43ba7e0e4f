//! # contract: interfaces between the aggregator and its data sources
//!
//! This module defines the two source traits the aggregator consumes
//! ([`RepoSource`] for the repository-hosting search API, [`CuratedSource`]
//! for the community-maintained link list), the record types they return,
//! and the recoverable error taxonomy shared by both.
//!
//! ## Mocking & Testing
//! - Both traits are annotated for `mockall`, so integration tests can drive
//!   the aggregator with deterministic mocks (including call-count
//!   assertions that prove input validation happens before any fetch).
//! - Mocks are exported behind the `test-export-mocks` feature for
//!   downstream consumers.
//!
//! ## Failure policy
//! A source either returns its records or a [`SourceError`]. Neither variant
//! may escape to the tool caller: the aggregator recovers both at its own
//! boundary and degrades the failed source to an empty contribution.

use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, Utc};
use mockall::automock;
use thiserror::Error;

/// One repository listing as returned by the hosting search API.
///
/// An immutable snapshot with no identity beyond its URL; records are
/// created, merged and discarded within a single request.
#[derive(Debug, Clone, serde::Serialize)]
pub struct RepoRecord {
    /// Fully-qualified name, e.g. `owner/repo`.
    pub name: String,
    /// Browser-facing URL; also the deduplication key after normalization.
    pub url: String,
    /// Short description, empty when the upstream field is null.
    pub description: String,
    pub stars: u64,
    pub created_at: DateTime<Utc>,
    pub pushed_at: DateTime<Utc>,
    pub topics: Vec<String>,
}

/// One entry extracted from the curated list.
#[derive(Debug, Clone, serde::Serialize)]
pub struct CuratedEntry {
    pub name: String,
    pub url: String,
    pub description: String,
    /// Best-effort classification, derived from the surrounding section
    /// heading with a fallback scan of name and description.
    pub category: String,
}

impl CuratedEntry {
    /// Case-insensitive substring match over name, description and category.
    pub fn matches_keyword(&self, keyword: &str) -> bool {
        let keyword = keyword.to_lowercase();
        self.name.to_lowercase().contains(&keyword)
            || self.description.to_lowercase().contains(&keyword)
            || self.category.to_lowercase().contains(&keyword)
    }
}

/// How a query keyword is matched by the search API.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MatchMode {
    /// Match as a repository topic label (`topic:<keyword>`).
    Topic,
    /// Match as free text over name/description/readme.
    Keyword,
}

/// Sort field requested from the search API. The aggregator re-sorts merged
/// results itself, so this only influences which records survive truncation
/// upstream.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RepoSort {
    Stars,
    Updated,
}

impl RepoSort {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Stars => "stars",
            Self::Updated => "updated",
        }
    }
}

/// One search request against the repository source.
#[derive(Debug, Clone)]
pub struct RepoQuery {
    /// Keywords searched individually; results are concatenated.
    pub keywords: Vec<String>,
    /// Minimum star count, skipped when zero.
    pub min_stars: u64,
    /// Only repositories pushed at/after this date.
    pub pushed_after: Option<NaiveDate>,
    /// Only repositories created at/after this date.
    pub created_after: Option<NaiveDate>,
    /// Result cap per keyword.
    pub limit: u8,
    pub sort: RepoSort,
    pub mode: MatchMode,
}

/// Recoverable source failures. Both variants degrade the affected source to
/// an empty contribution plus a note in the rendered report.
#[derive(Debug, Error)]
pub enum SourceError {
    #[error("upstream request failed: {0}")]
    UpstreamUnavailable(String),
    #[error("upstream rate limit exhausted")]
    RateLimited,
}

/// Read-only client for the repository-hosting search API.
#[cfg_attr(any(test, feature = "test-export-mocks"), automock)]
#[async_trait]
pub trait RepoSource: Send + Sync {
    /// Run one search, most-relevant first, truncated per keyword to the
    /// query limit. One outbound call per keyword.
    async fn search(&self, query: RepoQuery) -> Result<Vec<RepoRecord>, SourceError>;
}

/// Fetcher/parser for the curated community list.
#[cfg_attr(any(test, feature = "test-export-mocks"), automock)]
#[async_trait]
pub trait CuratedSource: Send + Sync {
    /// Fetch the list and return every entry matching the documented link
    /// pattern. Best effort: lines that do not match are skipped.
    async fn entries(&self) -> Result<Vec<CuratedEntry>, SourceError>;
}
