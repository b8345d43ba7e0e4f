use std::fmt;
use std::time::Duration;
use tracing::info;

/// Default base URL for the repository-hosting search API.
pub const GITHUB_API_BASE: &str = "https://api.github.com";

/// Default location of the community-maintained curated list, served raw so
/// it can be fetched without authentication.
pub const AWESOME_LIST_URL: &str =
    "https://raw.githubusercontent.com/punkpeye/awesome-mcp-servers/main/README.md";

/// Per-request timeout applied to every outbound call.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

/// Settings for the GitHub search client.
///
/// Without a token, unauthenticated requests are limited to 60/hour;
/// with one the quota is 5000/hour. The token is optional either way.
#[derive(Clone)]
pub struct GithubConfig {
    pub base_url: String,
    pub token: Option<String>,
    pub timeout: Duration,
}

impl Default for GithubConfig {
    fn default() -> Self {
        Self {
            base_url: GITHUB_API_BASE.to_string(),
            token: None,
            timeout: DEFAULT_TIMEOUT,
        }
    }
}

impl fmt::Debug for GithubConfig {
    // Manual impl: the token must never end up in logs.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("GithubConfig")
            .field("base_url", &self.base_url)
            .field("token", &self.token.as_ref().map(|_| "<redacted>"))
            .field("timeout", &self.timeout)
            .finish()
    }
}

/// Settings for the curated-list fetch.
#[derive(Debug, Clone)]
pub struct CuratedListConfig {
    pub url: String,
    pub timeout: Duration,
}

impl Default for CuratedListConfig {
    fn default() -> Self {
        Self {
            url: AWESOME_LIST_URL.to_string(),
            timeout: DEFAULT_TIMEOUT,
        }
    }
}

/// Bundled configuration for the whole pipeline, built at the program edge
/// and injected into components. Business logic never reads the environment.
#[derive(Debug, Clone, Default)]
pub struct DigestConfig {
    pub github: GithubConfig,
    pub curated: CuratedListConfig,
}

impl DigestConfig {
    pub fn trace_loaded(&self) {
        info!(
            github_base = %self.github.base_url,
            curated_url = %self.curated.url,
            token_set = self.github.token.is_some(),
            "Loaded configuration"
        );
    }
}
