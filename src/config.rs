use anyhow::{bail, Context, Result};
use std::env;
use std::str::FromStr;
use std::time::Duration;

pub const DEFAULT_OKKO_BASE_URL: &str = "https://okko.tv";
pub const DEFAULT_MAX_DISTANCE: usize = 3;
pub const DEFAULT_DESCRIPTION_WORDS: usize = 50;
const DEFAULT_PORT: u16 = 3000;
const DEFAULT_HTTP_TIMEOUT_SECS: u64 = 30;

/// Runtime settings, read from the environment (after `.env` is loaded).
#[derive(Debug, Clone, PartialEq)]
pub struct SearchConfig {
    pub port: u16,
    pub okko_base_url: String,
    /// Acceptance gate: a title matches when its edit distance is below this.
    pub max_distance: usize,
    /// Word budget for the scraped description.
    pub description_words: usize,
    pub http_timeout: Duration,
    pub default_platform: String,
}

impl Default for SearchConfig {
    fn default() -> Self {
        Self {
            port: DEFAULT_PORT,
            okko_base_url: DEFAULT_OKKO_BASE_URL.to_string(),
            max_distance: DEFAULT_MAX_DISTANCE,
            description_words: DEFAULT_DESCRIPTION_WORDS,
            http_timeout: Duration::from_secs(DEFAULT_HTTP_TIMEOUT_SECS),
            default_platform: "Okko".to_string(),
        }
    }
}

impl SearchConfig {
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults = Self::default();

        let max_distance = parse_var(&lookup, "MATCH_MAX_DISTANCE", defaults.max_distance)?;
        if max_distance == 0 {
            bail!("MATCH_MAX_DISTANCE must be at least 1 (0 would reject every title)");
        }
        let description_words =
            parse_var(&lookup, "DESCRIPTION_WORDS", defaults.description_words)?;
        if description_words == 0 {
            bail!("DESCRIPTION_WORDS must be at least 1");
        }

        let okko_base_url = lookup("OKKO_BASE_URL")
            .map(|url| url.trim().trim_end_matches('/').to_string())
            .filter(|url| !url.is_empty())
            .unwrap_or(defaults.okko_base_url);

        let default_platform = lookup("DEFAULT_PLATFORM")
            .map(|p| p.trim().to_string())
            .filter(|p| !p.is_empty())
            .unwrap_or(defaults.default_platform);

        let http_timeout_secs =
            parse_var(&lookup, "HTTP_TIMEOUT_SECS", DEFAULT_HTTP_TIMEOUT_SECS)?;
        if http_timeout_secs == 0 {
            bail!("HTTP_TIMEOUT_SECS must be at least 1 (0 would time out every request)");
        }

        Ok(Self {
            port: parse_var(&lookup, "PORT", defaults.port)?,
            okko_base_url,
            max_distance,
            description_words,
            http_timeout: Duration::from_secs(http_timeout_secs),
            default_platform,
        })
    }
}

fn parse_var<F, T>(lookup: &F, key: &str, default: T) -> Result<T>
where
    F: Fn(&str) -> Option<String>,
    T: FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    match lookup(key) {
        Some(raw) if !raw.trim().is_empty() => raw
            .trim()
            .parse()
            .with_context(|| format!("invalid value for {}: {:?}", key, raw)),
        _ => Ok(default),
    }
}
