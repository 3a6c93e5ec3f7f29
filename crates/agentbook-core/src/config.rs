use anyhow::Context;
use serde::Deserialize;
use std::path::Path;
use std::time::Duration;

/// One configured site. The per-site session token is discovered at scrape
/// time, never configured.
#[derive(Debug, Clone, Deserialize)]
pub struct SiteConfig {
    pub name: String,
    pub url: String,
}

/// Full run configuration: ordered sites, the tab sequence applied to every
/// site, and the retry/timing knobs.
#[derive(Debug, Clone, Deserialize)]
pub struct ScrapeConfig {
    pub sites: Vec<SiteConfig>,
    pub tabs: Vec<String>,
    #[serde(default)]
    pub retry: RetryPolicy,
    #[serde(default)]
    pub timings: Timings,
}

impl ScrapeConfig {
    pub fn load(path: impl AsRef<Path>) -> anyhow::Result<Self> {
        let path = path.as_ref();
        let raw = std::fs::read_to_string(path)
            .with_context(|| format!("reading config {}", path.display()))?;
        serde_json::from_str(&raw).with_context(|| format!("parsing config {}", path.display()))
    }
}

/// Tab-fetch retry policy. The delay after the n-th failed attempt (0-based)
/// is `backoff_unit_ms << n`, so the default unit gives the 1s/2s schedule.
#[derive(Debug, Clone, Copy, Deserialize)]
#[serde(default)]
pub struct RetryPolicy {
    pub max_attempts: u32,
    pub backoff_unit_ms: u64,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            backoff_unit_ms: 1_000,
        }
    }
}

impl RetryPolicy {
    pub fn backoff(&self, attempt: u32) -> Duration {
        Duration::from_millis(self.backoff_unit_ms << attempt)
    }
}

/// Fixed waits around navigation and AJAX triggering.
#[derive(Debug, Clone, Copy, Deserialize)]
#[serde(default)]
pub struct Timings {
    /// Upper bound on any single navigation.
    pub nav_timeout_ms: u64,
    /// Settle after landing on the site root.
    pub root_settle_ms: u64,
    /// Settle after landing on the org-chart page.
    pub org_settle_ms: u64,
    /// How long a triggered AJAX response gets to arrive.
    pub ajax_settle_ms: u64,
}

impl Default for Timings {
    fn default() -> Self {
        Self {
            nav_timeout_ms: 30_000,
            root_settle_ms: 1_000,
            org_settle_ms: 2_000,
            ajax_settle_ms: 2_000,
        }
    }
}

impl Timings {
    pub fn nav_timeout(&self) -> Duration {
        Duration::from_millis(self.nav_timeout_ms)
    }

    pub fn root_settle(&self) -> Duration {
        Duration::from_millis(self.root_settle_ms)
    }

    pub fn org_settle(&self) -> Duration {
        Duration::from_millis(self.org_settle_ms)
    }

    pub fn ajax_settle(&self) -> Duration {
        Duration::from_millis(self.ajax_settle_ms)
    }
}
