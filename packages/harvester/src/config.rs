use anyhow::{Context, Result};
use dotenvy::dotenv;
use std::env;
use std::path::PathBuf;
use std::str::FromStr;
use water_extraction::{HarvestConfig, RetryPolicy};

/// Harvester configuration loaded from environment variables
#[derive(Debug, Clone)]
pub struct Config {
    pub harvest: HarvestConfig,
    pub store_path: PathBuf,
    pub template_path: Option<PathBuf>,
    /// Skip search and detail; only enrich the existing store
    pub skip_search: bool,
}

impl Config {
    /// Load configuration from environment variables
    pub fn from_env() -> Result<Self> {
        // Load .env file if present (development)
        let _ = dotenv();
        Self::from_lookup(|key| env::var(key).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let defaults = HarvestConfig::default();
        let mut harvest = defaults.clone();

        if let Some(base_url) = lookup("WATER_BASE_URL") {
            harvest = harvest.with_base_url(base_url);
        }
        harvest = harvest
            .with_concurrency(parsed(&lookup, "WATER_CONCURRENCY", defaults.concurrency)?)
            .with_requests_per_second(parsed(
                &lookup,
                "WATER_REQUESTS_PER_SECOND",
                defaults.requests_per_second,
            )?)
            .with_checkpoint_every(parsed(&lookup, "WATER_CHECKPOINT_EVERY", defaults.checkpoint_every)?)
            .with_search_limit(parsed(&lookup, "WATER_SEARCH_LIMIT", defaults.search_limit)?);

        let max_retries = parsed(&lookup, "WATER_MAX_RETRIES", defaults.retry.max_retries)?;
        harvest = harvest.with_retry(RetryPolicy::default().with_max_retries(max_retries));

        Ok(Self {
            harvest,
            store_path: lookup("WATER_STORE_PATH")
                .unwrap_or_else(|| "data.json".to_string())
                .into(),
            template_path: lookup("WATER_TEMPLATE_PATH")
                .filter(|p| !p.trim().is_empty())
                .map(PathBuf::from),
            skip_search: parsed(&lookup, "WATER_SKIP_SEARCH", false)?,
        })
    }
}

fn parsed<T>(lookup: &impl Fn(&str) -> Option<String>, key: &str, default: T) -> Result<T>
where
    T: FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    match lookup(key) {
        Some(raw) => raw
            .trim()
            .parse()
            .with_context(|| format!("{key} must be a valid value, got {raw:?}")),
        None => Ok(default),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn load(vars: &[(&str, &str)]) -> Result<Config> {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        Config::from_lookup(|key| vars.get(key).cloned())
    }

    #[test]
    fn test_defaults() {
        let config = load(&[]).unwrap();
        assert_eq!(config.store_path, PathBuf::from("data.json"));
        assert_eq!(config.template_path, None);
        assert!(!config.skip_search);
        assert_eq!(config.harvest.concurrency, HarvestConfig::default().concurrency);
    }

    #[test]
    fn test_overrides() {
        let config = load(&[
            ("WATER_BASE_URL", "https://water.test"),
            ("WATER_CONCURRENCY", "8"),
            ("WATER_MAX_RETRIES", "0"),
            ("WATER_SKIP_SEARCH", "true"),
            ("WATER_TEMPLATE_PATH", "index.html"),
        ])
        .unwrap();
        assert_eq!(config.harvest.base_url, "https://water.test");
        assert_eq!(config.harvest.concurrency, 8);
        assert_eq!(config.harvest.retry.max_retries, 0);
        assert!(config.skip_search);
        assert_eq!(config.template_path, Some(PathBuf::from("index.html")));
    }

    #[test]
    fn test_invalid_number_is_an_error() {
        let err = load(&[("WATER_CONCURRENCY", "many")]).unwrap_err();
        assert!(err.to_string().contains("WATER_CONCURRENCY"));
    }
}
