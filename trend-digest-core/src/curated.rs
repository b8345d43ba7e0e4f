//! Curated-list source: fetches the community awesome-mcp-servers README and
//! extracts structured entries from it.
//!
//! The list is a human-edited markdown file, so parsing is best effort by
//! contract: every line matching the documented link pattern
//! (`- [Name](url) - Description` or `- [Name](url): Description`) becomes a
//! [`CuratedEntry`]; everything else is skipped without failing the fetch.
//! Categories come from the most recent section heading, with a fallback
//! scan of the entry's own text. Any change to the upstream formatting is an
//! expected, recoverable miss rather than a defect.

use async_trait::async_trait;
use regex::Regex;
use tracing::{debug, error, info};

use crate::config::CuratedListConfig;
use crate::contract::{CuratedEntry, CuratedSource, SourceError};

/// Matches `- [Name](url) - Description` and `- [Name](url): Description`,
/// with `*` bullets accepted as well.
const ENTRY_PATTERN: &str = r"^\s*[-*]\s+\[([^\]]+)\]\(([^)]+)\)\s*[-:]\s*(.+)$";

/// Category keyword table. The first table whose keyword appears in the
/// section heading wins; entries whose heading matches nothing are
/// classified by their own name and description instead.
const CATEGORY_KEYWORDS: &[(&str, &[&str])] = &[
    ("Databases", &["postgres", "sqlite", "database", "db", "sql", "mongo"]),
    ("APIs", &["api", "rest", "graphql", "http"]),
    ("Dev Tools", &["git", "github", "docker", "kubernetes", "ci", "cd"]),
    ("File Systems", &["file", "filesystem", "fs", "directory", "storage"]),
    ("Web", &["browser", "web", "html", "puppeteer", "selenium"]),
    ("AI/ML", &["llm", "ai", "ml", "model", "openai", "anthropic"]),
];

/// Fallback category for entries no keyword claims.
pub const OTHER_CATEGORY: &str = "Other";

pub struct AwesomeListClient {
    http: reqwest::Client,
    config: CuratedListConfig,
}

impl AwesomeListClient {
    pub fn new(config: CuratedListConfig) -> Self {
        Self {
            http: reqwest::Client::new(),
            config,
        }
    }
}

#[async_trait]
impl CuratedSource for AwesomeListClient {
    async fn entries(&self) -> Result<Vec<CuratedEntry>, SourceError> {
        info!(url = %self.config.url, "Fetching curated list");
        let response = self
            .http
            .get(&self.config.url)
            .timeout(self.config.timeout)
            .send()
            .await
            .map_err(|e| {
                error!(error = ?e, url = %self.config.url, "Curated list fetch failed");
                SourceError::UpstreamUnavailable(e.to_string())
            })?;

        let status = response.status();
        if !status.is_success() {
            error!(%status, url = %self.config.url, "Curated list fetch returned error status");
            return Err(SourceError::UpstreamUnavailable(format!("status {status}")));
        }

        let markdown = response.text().await.map_err(|e| {
            error!(error = ?e, "Failed to read curated list body");
            SourceError::UpstreamUnavailable(e.to_string())
        })?;

        let entries = parse_entries(&markdown);
        info!(count = entries.len(), "Parsed curated list entries");
        Ok(entries)
    }
}

/// Extracts every entry matching the link pattern from the raw markdown.
///
/// Pure function so the parse can be tested without a network fixture.
pub fn parse_entries(markdown: &str) -> Vec<CuratedEntry> {
    let entry_re = Regex::new(ENTRY_PATTERN).unwrap();

    let mut current_heading = String::new();
    let mut entries = Vec::new();

    for line in markdown.lines() {
        if line.starts_with('#') {
            current_heading = line.trim_start_matches('#').trim().to_string();
            continue;
        }

        let Some(caps) = entry_re.captures(line) else {
            if line.trim_start().starts_with("- [") {
                // Link-shaped line that misses the pattern (e.g. no
                // description separator). Skipped by contract.
                debug!(line = line.trim(), "Curated line did not match entry pattern");
            }
            continue;
        };

        let url = caps[2].trim();
        if !url.starts_with("http") {
            // Anchors, badges and relative links are not entries.
            continue;
        }

        let name = caps[1].trim();
        let description = caps[3].trim();
        entries.push(CuratedEntry {
            name: name.to_string(),
            url: url.to_string(),
            description: description.to_string(),
            category: classify(&current_heading, name, description),
        });
    }

    entries
}

/// Best-effort category assignment: section heading first, then the entry's
/// own name and description, then [`OTHER_CATEGORY`].
fn classify(heading: &str, name: &str, description: &str) -> String {
    let heading = heading.to_lowercase();
    for (category, keywords) in CATEGORY_KEYWORDS {
        if keywords.iter().any(|k| heading.contains(k)) {
            return (*category).to_string();
        }
    }

    let text = format!("{name} {description}").to_lowercase();
    for (category, keywords) in CATEGORY_KEYWORDS {
        if keywords.iter().any(|k| text.contains(k)) {
            return (*category).to_string();
        }
    }

    OTHER_CATEGORY.to_string()
}

/// Canonical ordering of categories for rendering, matching the keyword
/// table with the fallback bucket last.
pub fn category_order() -> impl Iterator<Item = &'static str> {
    CATEGORY_KEYWORDS
        .iter()
        .map(|(category, _)| *category)
        .chain(std::iter::once(OTHER_CATEGORY))
}
