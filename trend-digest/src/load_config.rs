use anyhow::Result;
use tracing::info;
use trend_digest_core::config::{CuratedListConfig, DigestConfig, GithubConfig};

/// Reads process environment into an explicit [`DigestConfig`].
///
/// All environment access happens here, at the program edge; the core
/// components only ever see the injected config. Recognised variables:
/// `GITHUB_TOKEN` (optional, raises the search quota), `GITHUB_API_URL` and
/// `AWESOME_LIST_URL` (optional upstream overrides, mainly for tests).
pub fn load_config() -> Result<DigestConfig> {
    let mut github = GithubConfig::default();

    match env_var("GITHUB_TOKEN") {
        Some(token) => {
            info!("GITHUB_TOKEN found in env, authenticated quota applies");
            github.token = Some(token);
        }
        None => {
            info!("GITHUB_TOKEN not set, unauthenticated rate limits apply");
        }
    }

    if let Some(base_url) = env_var("GITHUB_API_URL") {
        info!(base_url = %base_url, "Overriding repository API base URL");
        github.base_url = base_url;
    }

    let mut curated = CuratedListConfig::default();
    if let Some(url) = env_var("AWESOME_LIST_URL") {
        info!(url = %url, "Overriding curated list URL");
        curated.url = url;
    }

    let config = DigestConfig { github, curated };
    config.trace_loaded();
    Ok(config)
}

fn env_var(key: &str) -> Option<String> {
    std::env::var(key).ok().filter(|value| !value.trim().is_empty())
}
