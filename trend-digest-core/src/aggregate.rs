//! High-level pipeline: orchestrates fetch → filter → dedupe → rank → render.
//!
//! This module provides the trend aggregation entrypoints exposed to tool
//! callers. Each operation:
//!   - Validates caller input before anything touches the network
//!   - Fetches the repository source and the curated list concurrently
//!   - Degrades a failed source to an empty contribution plus a note line
//!   - Merges both lists, deduplicating by canonical URL (repository
//!     entries win over curated entries on conflict)
//!   - Sorts by the recency/popularity metric available and renders a
//!     markdown report
//!
//! # Major Types
//! - [`TrendAggregator`]: holds the two sources, generic so tests can
//!   substitute mocks
//! - [`Focus`] / [`Timeframe`]: validated caller parameters
//! - [`RequestError`]: the only caller-visible failure, raised for
//!   malformed input and never for upstream trouble
//!
//! # Error Handling
//! Source failures never escape: both are recovered here and the report
//! still renders. A report is never the empty string; when both sources
//! contribute nothing the designated [`NO_RESULTS`] line is returned.

use std::collections::HashSet;
use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Duration, Utc};
use futures::join;
use thiserror::Error;
use tracing::{debug, info, warn};
use url::Url;

use crate::config::DigestConfig;
use crate::contract::{
    CuratedEntry, CuratedSource, MatchMode, RepoQuery, RepoRecord, RepoSort, RepoSource,
    SourceError,
};
use crate::curated::{self, AwesomeListClient};
use crate::github::GithubClient;

/// Returned verbatim when both sources contribute nothing; the caller must
/// never receive a blank report.
pub const NO_RESULTS: &str = "No matching repositories or curated entries were found.";

const PER_KEYWORD_LIMIT: u8 = 5;
const SEARCH_LIMIT: u8 = 10;
const RELEASE_LIMIT: u8 = 3;
const SEARCH_MIN_STARS: u64 = 10;
const MAX_REPORT_ENTRIES: usize = 15;
const OVERVIEW_TOP_PER_CATEGORY: usize = 3;

const REPO_UNAVAILABLE_NOTE: &str =
    "Note: repository search was unavailable; results may be incomplete.";
const REPO_RATE_LIMITED_NOTE: &str =
    "Note: repository search hit the upstream rate limit; results may be incomplete.";
const CURATED_UNAVAILABLE_NOTE: &str =
    "Note: the curated list was unavailable; results may be incomplete.";

/// Caller-selected topical filter narrowing which keywords are searched.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Focus {
    All,
    Mcp,
    Agents,
    Llm,
}

/// One search group: the keywords queried together and the star floor
/// applied to them. Younger ecosystems get a lower floor.
#[derive(Clone, Copy)]
struct KeywordGroup {
    keywords: &'static [&'static str],
    min_stars: u64,
}

const MCP_GROUP: KeywordGroup = KeywordGroup {
    keywords: &["mcp", "model-context-protocol"],
    min_stars: 10,
};
const AGENTS_GROUP: KeywordGroup = KeywordGroup {
    keywords: &["ai-agent", "autonomous-agent"],
    min_stars: 50,
};
const LLM_GROUP: KeywordGroup = KeywordGroup {
    keywords: &["llm", "large-language-model"],
    min_stars: 100,
};

impl Focus {
    fn keyword_groups(self) -> &'static [KeywordGroup] {
        match self {
            Self::Mcp => &[MCP_GROUP],
            Self::Agents => &[AGENTS_GROUP],
            Self::Llm => &[LLM_GROUP],
            Self::All => &[MCP_GROUP, AGENTS_GROUP, LLM_GROUP],
        }
    }

    fn keywords(self) -> Vec<&'static str> {
        self.keyword_groups()
            .iter()
            .flat_map(|group| group.keywords.iter().copied())
            .collect()
    }
}

impl fmt::Display for Focus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::All => "all",
            Self::Mcp => "mcp",
            Self::Agents => "agents",
            Self::Llm => "llm",
        };
        f.write_str(name)
    }
}

impl FromStr for Focus {
    type Err = RequestError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "all" => Ok(Self::All),
            "mcp" => Ok(Self::Mcp),
            "agents" => Ok(Self::Agents),
            "llm" => Ok(Self::Llm),
            _ => Err(RequestError::UnknownFocus(s.to_string())),
        }
    }
}

/// Caller-selected recency window.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Timeframe {
    Daily,
    Weekly,
}

impl Timeframe {
    pub fn days(self) -> i64 {
        match self {
            Self::Daily => 7,
            Self::Weekly => 30,
        }
    }

    fn title(self) -> &'static str {
        match self {
            Self::Daily => "Daily",
            Self::Weekly => "Weekly",
        }
    }
}

impl FromStr for Timeframe {
    type Err = RequestError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "daily" => Ok(Self::Daily),
            "weekly" => Ok(Self::Weekly),
            _ => Err(RequestError::UnknownTimeframe(s.to_string())),
        }
    }
}

/// Malformed caller input. Raised before any network call is made; the only
/// failure a tool caller ever sees.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum RequestError {
    #[error("unknown focus '{0}': expected one of all, mcp, agents, llm")]
    UnknownFocus(String),
    #[error("unknown timeframe '{0}': expected one of daily, weekly")]
    UnknownTimeframe(String),
    #[error("topic must not be empty")]
    EmptyTopic,
    #[error("days must be at least 1")]
    EmptyWindow,
}

/// A unified row the aggregator ranks and renders, from either source.
struct TrendEntry {
    name: String,
    url: String,
    description: String,
    stars: Option<u64>,
    pushed_at: Option<DateTime<Utc>>,
    created_at: Option<DateTime<Utc>>,
    category: Option<String>,
}

impl From<RepoRecord> for TrendEntry {
    fn from(record: RepoRecord) -> Self {
        Self {
            name: record.name,
            url: record.url,
            description: record.description,
            stars: Some(record.stars),
            pushed_at: Some(record.pushed_at),
            created_at: Some(record.created_at),
            category: None,
        }
    }
}

impl From<CuratedEntry> for TrendEntry {
    fn from(entry: CuratedEntry) -> Self {
        Self {
            name: entry.name,
            url: entry.url,
            description: entry.description,
            stars: None,
            pushed_at: None,
            created_at: None,
            category: Some(entry.category),
        }
    }
}

/// Combines the repository source and the curated list into rendered trend
/// reports. Holds no state between calls; every invocation fetches fresh.
pub struct TrendAggregator<R, C> {
    repos: R,
    curated: C,
}

impl TrendAggregator<GithubClient, AwesomeListClient> {
    /// Wires the real clients from explicit configuration.
    pub fn from_config(config: &DigestConfig) -> Self {
        Self::new(
            GithubClient::new(config.github.clone()),
            AwesomeListClient::new(config.curated.clone()),
        )
    }
}

impl<R, C> TrendAggregator<R, C>
where
    R: RepoSource,
    C: CuratedSource,
{
    pub fn new(repos: R, curated: C) -> Self {
        Self { repos, curated }
    }

    /// Renders the trend report for a focus/timeframe pair.
    ///
    /// Input is validated before any fetch. Both sources are queried
    /// concurrently; a failed source degrades to empty plus a note.
    pub async fn ai_trends(&self, focus: &str, timeframe: &str) -> Result<String, RequestError> {
        let focus: Focus = focus.parse()?;
        let timeframe: Timeframe = timeframe.parse()?;
        let days = timeframe.days();
        let cutoff = Utc::now() - Duration::days(days);
        info!(%focus, timeframe = %timeframe.title(), days, "Generating trend report");

        let ((mut repos, repo_note), (curated_all, curated_note)) =
            join!(self.fetch_trending(focus, cutoff), self.fetch_curated());

        let mut notes = Vec::new();
        notes.extend(repo_note);
        notes.extend(curated_note);

        if repos.is_empty() && curated_all.is_empty() && notes.is_empty() {
            return Ok(NO_RESULTS.to_string());
        }

        // Upstream date filtering is best effort; enforce the window here.
        repos.retain(|record| record.pushed_at >= cutoff);

        let keywords = focus.keywords();
        let matched: Vec<CuratedEntry> = curated_all
            .iter()
            .filter(|entry| keywords.iter().any(|k| entry.matches_keyword(k)))
            .cloned()
            .collect();
        debug!(
            repos = repos.len(),
            curated = matched.len(),
            "Merging source contributions"
        );

        let mut entries = merge(repos, matched);
        sort_by_rank(&mut entries);

        let mut report = String::new();
        report.push_str(&format!(
            "# AI/Tech Trends - {} Update ({focus})\n\n",
            timeframe.title()
        ));
        report.push_str(&format!("*Data from the last {days} days*\n\n"));
        render_entries(&mut report, &entries, false);
        if matches!(focus, Focus::All | Focus::Mcp) && !curated_all.is_empty() {
            report.push_str("\n---\n\n");
            render_overview(&mut report, &curated_all);
        }
        render_notes(&mut report, &notes);
        Ok(report)
    }

    /// Deep dive on one caller-supplied keyword: the keyword is passed
    /// straight through to the search (topic qualifier first, free-text
    /// fallback) and curated entries are matched by substring.
    pub async fn search_topic(&self, topic: &str, days: u32) -> Result<String, RequestError> {
        let topic = topic.trim();
        if topic.is_empty() {
            return Err(RequestError::EmptyTopic);
        }
        if days == 0 {
            return Err(RequestError::EmptyWindow);
        }
        let cutoff = Utc::now() - Duration::days(i64::from(days));
        info!(topic, days, "Generating topic report");

        let ((mut repos, repo_note), (curated_all, curated_note)) =
            join!(self.fetch_topic(topic, cutoff), self.fetch_curated());

        let mut notes = Vec::new();
        notes.extend(repo_note);
        notes.extend(curated_note);

        if repos.is_empty() && curated_all.is_empty() && notes.is_empty() {
            return Ok(NO_RESULTS.to_string());
        }

        repos.retain(|record| record.pushed_at >= cutoff);

        let matched: Vec<CuratedEntry> = curated_all
            .iter()
            .filter(|entry| entry.matches_keyword(topic))
            .cloned()
            .collect();

        let mut entries = merge(repos, matched);
        sort_by_rank(&mut entries);

        let mut report = String::new();
        report.push_str(&format!("# Deep Dive: {topic}\n\n"));
        report.push_str(&format!("*Data from the last {days} days*\n\n"));
        render_entries(&mut report, &entries, false);
        render_notes(&mut report, &notes);
        Ok(report)
    }

    /// Newly created projects within the window, ranked purely by creation
    /// date descending. The curated list has no creation-date field and is
    /// not consulted.
    pub async fn new_releases(&self, days: u32) -> Result<String, RequestError> {
        if days == 0 {
            return Err(RequestError::EmptyWindow);
        }
        let cutoff = Utc::now() - Duration::days(i64::from(days));
        info!(days, "Generating new-releases report");

        let (mut repos, repo_note) = self.fetch_created(cutoff).await;
        let notes: Vec<String> = repo_note.into_iter().collect();

        if repos.is_empty() && notes.is_empty() {
            return Ok(NO_RESULTS.to_string());
        }

        repos.retain(|record| record.created_at >= cutoff);

        let mut entries = merge(repos, Vec::new());
        entries.sort_by(|a, b| {
            b.created_at
                .cmp(&a.created_at)
                .then_with(|| a.name.to_lowercase().cmp(&b.name.to_lowercase()))
        });

        let mut report = String::new();
        report.push_str(&format!("# New Releases (Last {days} Days)\n\n"));
        render_entries(&mut report, &entries, true);
        render_notes(&mut report, &notes);
        Ok(report)
    }

    async fn fetch_trending(
        &self,
        focus: Focus,
        cutoff: DateTime<Utc>,
    ) -> (Vec<RepoRecord>, Option<String>) {
        let mut records = Vec::new();
        for group in focus.keyword_groups() {
            let query = RepoQuery {
                keywords: group.keywords.iter().map(|k| (*k).to_string()).collect(),
                min_stars: group.min_stars,
                pushed_after: Some(cutoff.date_naive()),
                created_after: None,
                limit: PER_KEYWORD_LIMIT,
                sort: RepoSort::Stars,
                mode: MatchMode::Topic,
            };
            match self.repos.search(query).await {
                Ok(mut found) => records.append(&mut found),
                Err(e) => {
                    warn!(error = %e, "Repository search degraded to empty");
                    return (records, Some(repo_note(&e)));
                }
            }
        }
        (records, None)
    }

    async fn fetch_topic(
        &self,
        topic: &str,
        cutoff: DateTime<Utc>,
    ) -> (Vec<RepoRecord>, Option<String>) {
        let base = RepoQuery {
            keywords: vec![topic.to_string()],
            min_stars: SEARCH_MIN_STARS,
            pushed_after: Some(cutoff.date_naive()),
            created_after: None,
            limit: SEARCH_LIMIT,
            sort: RepoSort::Stars,
            mode: MatchMode::Topic,
        };
        let fallback = RepoQuery {
            mode: MatchMode::Keyword,
            ..base.clone()
        };
        match self.repos.search(base).await {
            Ok(found) if found.is_empty() => {
                debug!(topic, "No topic-qualified results, retrying as free-text search");
                match self.repos.search(fallback).await {
                    Ok(found) => (found, None),
                    Err(e) => {
                        warn!(error = %e, "Repository search degraded to empty");
                        (Vec::new(), Some(repo_note(&e)))
                    }
                }
            }
            Ok(found) => (found, None),
            Err(e) => {
                warn!(error = %e, "Repository search degraded to empty");
                (Vec::new(), Some(repo_note(&e)))
            }
        }
    }

    async fn fetch_created(&self, cutoff: DateTime<Utc>) -> (Vec<RepoRecord>, Option<String>) {
        let mut records = Vec::new();
        for group in Focus::All.keyword_groups() {
            let query = RepoQuery {
                keywords: group.keywords.iter().map(|k| (*k).to_string()).collect(),
                min_stars: 0,
                pushed_after: None,
                created_after: Some(cutoff.date_naive()),
                limit: RELEASE_LIMIT,
                sort: RepoSort::Stars,
                mode: MatchMode::Topic,
            };
            match self.repos.search(query).await {
                Ok(mut found) => records.append(&mut found),
                Err(e) => {
                    warn!(error = %e, "Repository search degraded to empty");
                    return (records, Some(repo_note(&e)));
                }
            }
        }
        (records, None)
    }

    async fn fetch_curated(&self) -> (Vec<CuratedEntry>, Option<String>) {
        match self.curated.entries().await {
            Ok(entries) => (entries, None),
            Err(e) => {
                warn!(error = %e, "Curated list degraded to empty");
                (Vec::new(), Some(CURATED_UNAVAILABLE_NOTE.to_string()))
            }
        }
    }
}

fn repo_note(error: &SourceError) -> String {
    match error {
        SourceError::RateLimited => REPO_RATE_LIMITED_NOTE.to_string(),
        SourceError::UpstreamUnavailable(_) => REPO_UNAVAILABLE_NOTE.to_string(),
    }
}

/// Concatenates both lists into unified entries, deduplicating by canonical
/// URL. Repository records are inserted first, so they win on conflict.
fn merge(repos: Vec<RepoRecord>, curated: Vec<CuratedEntry>) -> Vec<TrendEntry> {
    let mut seen = HashSet::new();
    let mut entries = Vec::new();
    for record in repos {
        if seen.insert(canonical_url(&record.url)) {
            entries.push(TrendEntry::from(record));
        }
    }
    for entry in curated {
        if seen.insert(canonical_url(&entry.url)) {
            entries.push(TrendEntry::from(entry));
        }
    }
    entries
}

/// Deduplication key: lowercased host + path, trailing slash trimmed,
/// scheme ignored.
fn canonical_url(raw: &str) -> String {
    match Url::parse(raw) {
        Ok(url) => {
            let host = url.host_str().unwrap_or("").to_lowercase();
            let path = url.path().trim_end_matches('/').to_lowercase();
            format!("{host}{path}")
        }
        Err(_) => raw.trim_end_matches('/').to_lowercase(),
    }
}

/// Stars descending, then most recent push, then name. Entries without a
/// star count or push date (curated) sort after those with one.
fn sort_by_rank(entries: &mut [TrendEntry]) {
    entries.sort_by(|a, b| {
        b.stars
            .unwrap_or(0)
            .cmp(&a.stars.unwrap_or(0))
            .then_with(|| b.pushed_at.cmp(&a.pushed_at))
            .then_with(|| a.name.to_lowercase().cmp(&b.name.to_lowercase()))
    });
}

fn render_entries(out: &mut String, entries: &[TrendEntry], show_created: bool) {
    if entries.is_empty() {
        out.push_str("*No significant activity in the last period*\n");
        return;
    }
    for (index, entry) in entries.iter().take(MAX_REPORT_ENTRIES).enumerate() {
        match (entry.stars, &entry.category) {
            (Some(stars), _) => out.push_str(&format!(
                "{}. **{}** (⭐ {})\n",
                index + 1,
                entry.name,
                format_count(stars)
            )),
            (None, Some(category)) => {
                out.push_str(&format!("{}. **{}** [{}]\n", index + 1, entry.name, category));
            }
            (None, None) => out.push_str(&format!("{}. **{}**\n", index + 1, entry.name)),
        }
        if !entry.description.is_empty() {
            out.push_str(&format!("   {}\n", entry.description));
        }
        if show_created {
            if let Some(created) = entry.created_at {
                out.push_str(&format!("   Created: {}\n", created.format("%Y-%m-%d")));
            }
        }
        out.push_str(&format!("   {}\n\n", entry.url));
    }
    if entries.len() > MAX_REPORT_ENTRIES {
        out.push_str(&format!(
            "*... and {} more*\n",
            entries.len() - MAX_REPORT_ENTRIES
        ));
    }
}

/// Categorized overview of the full curated list, appended to reports whose
/// focus covers the MCP ecosystem.
fn render_overview(out: &mut String, entries: &[CuratedEntry]) {
    out.push_str("## Curated MCP Ecosystem\n\n");
    out.push_str(&format!("**Total entries tracked**: {}\n", entries.len()));
    for category in curated::category_order() {
        let members: Vec<&CuratedEntry> = entries
            .iter()
            .filter(|entry| entry.category == category)
            .collect();
        if members.is_empty() {
            continue;
        }
        out.push_str(&format!("\n### {} ({})\n", category, members.len()));
        for entry in members.iter().take(OVERVIEW_TOP_PER_CATEGORY) {
            out.push_str(&format!("- **{}**: {}\n", entry.name, entry.description));
            out.push_str(&format!("  {}\n", entry.url));
        }
        if members.len() > OVERVIEW_TOP_PER_CATEGORY {
            out.push_str(&format!(
                "  ... and {} more\n",
                members.len() - OVERVIEW_TOP_PER_CATEGORY
            ));
        }
    }
}

fn render_notes(out: &mut String, notes: &[String]) {
    for note in notes {
        out.push_str(&format!("\n*{note}*\n"));
    }
}

/// Renders 1234567 as "1,234,567", matching the report format upstream
/// consumers already parse.
fn format_count(value: u64) -> String {
    let digits = value.to_string();
    let mut out = String::with_capacity(digits.len() + digits.len() / 3);
    for (index, ch) in digits.chars().enumerate() {
        if index > 0 && (digits.len() - index) % 3 == 0 {
            out.push(',');
        }
        out.push(ch);
    }
    out
}
