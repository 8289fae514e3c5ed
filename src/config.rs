use anyhow::{anyhow, Context, Result};
use std::env;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::{debug, warn};

pub const DEFAULT_BASE_URL: &str = "https://api.hubapi.com/content/api/v2/blog-posts";
pub const DEFAULT_PORT: u16 = 5000;
pub const ALLOWED_DOMAINS: [&str; 2] = ["hs-sites.com", "tradegecko.com"];
pub const CACHE_LIFESPAN: Duration = Duration::from_secs(60 * 60 * 6);

/// Fixed, non-search parameters sent with every upstream request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UpstreamQueryConfig {
    pub base_url: String,
    pub api_key: String,
    pub archived: bool,
    pub state: String,
    pub order_by: String,
    pub content_group_id: String,
}

impl UpstreamQueryConfig {
    pub fn new(api_key: impl Into<String>) -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            api_key: api_key.into(),
            archived: false,
            state: "PUBLISHED".to_string(),
            order_by: "-publish_date".to_string(),
            content_group_id: "2125467268".to_string(),
        }
    }
}

#[derive(Debug, Clone)]
pub struct Config {
    pub port: u16,
    pub upstream: UpstreamQueryConfig,
    pub allowed_domains: Vec<String>,
    pub cache_lifespan: Duration,
}

impl Config {
    /// Builds a config with the built-in defaults and the given API credential.
    pub fn with_api_key(api_key: impl Into<String>) -> Self {
        Self {
            port: DEFAULT_PORT,
            upstream: UpstreamQueryConfig::new(api_key),
            allowed_domains: ALLOWED_DOMAINS.iter().map(|d| d.to_string()).collect(),
            cache_lifespan: CACHE_LIFESPAN,
        }
    }

    /// Reads `HUBSPOT_KEY` (required) and `PORT` (optional) from the environment.
    pub fn from_env() -> Result<Self> {
        let api_key = env::var("HUBSPOT_KEY")
            .ok()
            .filter(|key| !key.trim().is_empty())
            .ok_or_else(|| anyhow!("HUBSPOT_KEY must be set"))?;

        let mut config = Self::with_api_key(api_key);
        if let Ok(port) = env::var("PORT") {
            config.port = parse_port(&port)?;
        }
        Ok(config)
    }

    /// Sweeps run four times per lifespan, so nothing outlives its TTL by more than a quarter.
    pub fn prune_interval(&self) -> Duration {
        self.cache_lifespan / 4
    }
}

/// Loads the nearest `.env` file into the process environment, if there is one.
/// Variables already exported take precedence over the file.
pub fn load_dotenv() -> Option<PathBuf> {
    match dotenvy::dotenv() {
        Ok(path) => {
            debug!("Loaded environment from {}", path.display());
            Some(path)
        }
        Err(e) => {
            report_dotenv_error(&e);
            None
        }
    }
}

/// Same as [`load_dotenv`] for an explicit file. Returns whether the file was loaded.
pub fn load_dotenv_from(path: &Path) -> bool {
    match dotenvy::from_path(path) {
        Ok(()) => true,
        Err(e) => {
            report_dotenv_error(&e);
            false
        }
    }
}

fn report_dotenv_error(e: &dotenvy::Error) {
    if !e.not_found() {
        warn!("Ignoring unreadable .env file: {}", e);
    }
}

fn parse_port(raw: &str) -> Result<u16> {
    raw.trim()
        .parse::<u16>()
        .with_context(|| format!("Invalid PORT value: {}", raw))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = Config::with_api_key("secret");
        assert_eq!(config.port, 5000);
        assert_eq!(config.upstream.api_key, "secret");
        assert_eq!(config.upstream.base_url, DEFAULT_BASE_URL);
        assert_eq!(config.allowed_domains, vec!["hs-sites.com", "tradegecko.com"]);
        assert_eq!(config.cache_lifespan, Duration::from_secs(21_600));
    }

    #[test]
    fn test_prune_interval_is_quarter_lifespan() {
        let config = Config::with_api_key("secret");
        assert_eq!(config.prune_interval(), Duration::from_secs(90 * 60));
    }

    #[test]
    fn test_missing_dotenv_is_ignored() {
        let path = env::temp_dir().join("blog-search-proxy-no-such-file.env");
        assert!(!load_dotenv_from(&path));
    }

    #[test]
    fn test_dotenv_fills_environment() {
        let path = env::temp_dir().join(format!("blog-search-proxy-{}.env", std::process::id()));
        std::fs::write(&path, "BLOG_SEARCH_PROXY_DOTENV_CHECK=from-file\n").unwrap();

        assert!(load_dotenv_from(&path));
        assert_eq!(
            env::var("BLOG_SEARCH_PROXY_DOTENV_CHECK").as_deref(),
            Ok("from-file")
        );
        std::fs::remove_file(&path).unwrap();
    }

    #[test]
    fn test_parse_port() {
        assert_eq!(parse_port("8080").unwrap(), 8080);
        assert_eq!(parse_port(" 3000 ").unwrap(), 3000);
        assert!(parse_port("eighty").is_err());
        assert!(parse_port("70000").is_err());
    }
}
