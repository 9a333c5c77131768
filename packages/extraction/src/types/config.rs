//! Configuration types for harvesting and transport.

use indexmap::IndexSet;
use serde::{Deserialize, Serialize};
use std::time::Duration;

use super::product::normalize_slug;

/// Browser-like User-Agent; the site serves bots an empty shell.
pub const DEFAULT_USER_AGENT: &str = "Mozilla/5.0 (X11; Linux x86_64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/120.0.0.0 Safari/537.36";

/// Known product slugs tried directly, whether or not search returns them.
const PROBE_SLUGS: &[&str] = &[
    "evian-natural-spring-water",
    "fiji-natural-artesian-water",
    "aqua-carpatica-spring-water",
    "icelandic-glacial-water",
    "perrier-sparkling-water",
    "gerolsteiner-sparkling-mineral-water",
    "hallstein-water",
    "hawaii-volcanic-water",
    "voss-water",
    "smartwater",
    "dasani",
    "aquafina",
    "crystal-geyser",
    "mountain-valley-spring-water",
    "saratoga-spring-water",
];

/// Packaging variants appended to each probe slug.
const PROBE_SUFFIXES: &[&str] = &["", "-plastic-bottle", "-glass-bottle", "-can"];

/// Configuration for a harvest run.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct HarvestConfig {
    /// Site root, without a trailing slash.
    pub base_url: String,

    /// Path of the streamed search endpoint.
    pub search_path: String,

    /// Path prefix of product pages; the slug is appended.
    pub product_path: String,

    /// Result limit sent with every search request.
    pub search_limit: usize,

    /// Maximum requests in flight at once.
    pub concurrency: usize,

    /// Sustained request rate across the whole run.
    pub requests_per_second: u32,

    /// Retry behavior for transient transport failures.
    pub retry: RetryPolicy,

    /// Write the store after this many detail pages (0 disables).
    pub checkpoint_every: usize,

    /// Token identifying the site's own branding in page titles.
    pub site_brand_token: String,

    /// Per-request timeout in seconds.
    pub request_timeout_secs: u64,

    pub user_agent: String,

    /// Slugs probed by URL pattern (empty disables probing).
    pub probe_slugs: Vec<String>,

    /// Suffixes combined with every probe slug.
    pub probe_suffixes: Vec<String>,
}

impl Default for HarvestConfig {
    fn default() -> Self {
        Self {
            base_url: "https://www.live-oasis.com".to_string(),
            search_path: "/search".to_string(),
            product_path: "/product/".to_string(),
            search_limit: 40,
            concurrency: 4,
            requests_per_second: 2,
            retry: RetryPolicy::default(),
            checkpoint_every: 10,
            site_brand_token: "oasis".to_string(),
            request_timeout_secs: 15,
            user_agent: DEFAULT_USER_AGENT.to_string(),
            probe_slugs: PROBE_SLUGS.iter().map(|s| s.to_string()).collect(),
            probe_suffixes: PROBE_SUFFIXES.iter().map(|s| s.to_string()).collect(),
        }
    }
}

impl HarvestConfig {
    /// Create a new config with default values.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the site root.
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into().trim_end_matches('/').to_string();
        self
    }

    /// Set the search result limit.
    pub fn with_search_limit(mut self, limit: usize) -> Self {
        self.search_limit = limit;
        self
    }

    /// Set the concurrency limit (at least 1).
    pub fn with_concurrency(mut self, concurrency: usize) -> Self {
        self.concurrency = concurrency.max(1);
        self
    }

    /// Set the sustained request rate (at least 1).
    pub fn with_requests_per_second(mut self, rps: u32) -> Self {
        self.requests_per_second = rps.max(1);
        self
    }

    pub fn with_retry(mut self, retry: RetryPolicy) -> Self {
        self.retry = retry;
        self
    }

    pub fn with_checkpoint_every(mut self, every: usize) -> Self {
        self.checkpoint_every = every;
        self
    }

    pub fn with_site_brand_token(mut self, token: impl Into<String>) -> Self {
        self.site_brand_token = token.into();
        self
    }

    pub fn with_probe_slugs<S: Into<String>>(mut self, slugs: impl IntoIterator<Item = S>) -> Self {
        self.probe_slugs = slugs.into_iter().map(Into::into).collect();
        self
    }

    pub fn with_probe_suffixes<S: Into<String>>(mut self, suffixes: impl IntoIterator<Item = S>) -> Self {
        self.probe_suffixes = suffixes.into_iter().map(Into::into).collect();
        self
    }

    /// Every probe slug with every suffix, slug-major, without repeats.
    pub fn probe_candidates(&self) -> Vec<String> {
        let candidates: IndexSet<String> = self
            .probe_slugs
            .iter()
            .flat_map(|slug| {
                self.probe_suffixes
                    .iter()
                    .map(move |suffix| normalize_slug(&format!("{slug}{suffix}")))
            })
            .filter(|candidate| !candidate.is_empty())
            .collect();
        candidates.into_iter().collect()
    }

    /// Full search endpoint URL.
    pub fn search_url(&self) -> String {
        format!("{}{}", self.base_url, self.search_path)
    }

    /// Canonical page URL for a product identity.
    pub fn product_url(&self, slug: &str) -> String {
        format!("{}{}{}", self.base_url, self.product_path, slug)
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }
}

/// Exponential backoff for transient failures.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RetryPolicy {
    /// Retries after the first attempt (0 disables retrying).
    pub max_retries: u32,

    /// Delay before the first retry, in milliseconds.
    pub base_delay_ms: u64,

    /// Upper bound on any single delay, in milliseconds.
    pub max_delay_ms: u64,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_retries: 3,
            base_delay_ms: 500,
            max_delay_ms: 8_000,
        }
    }
}

impl RetryPolicy {
    /// No retries at all.
    pub fn none() -> Self {
        Self {
            max_retries: 0,
            ..Self::default()
        }
    }

    pub fn with_max_retries(mut self, max_retries: u32) -> Self {
        self.max_retries = max_retries;
        self
    }

    /// Delay before retry number `attempt` (0-based): `base * 2^attempt`, capped.
    pub fn delay_for(&self, attempt: u32) -> Duration {
        let factor = 2u64.saturating_pow(attempt);
        Duration::from_millis(self.base_delay_ms.saturating_mul(factor).min(self.max_delay_ms))
    }
}
