use regex::Regex;
use std::sync::LazyLock;
use tracing::{error, info, warn};

use super::{SitePage, TabScraper};
use crate::config::{RetryPolicy, SiteConfig, Timings};
use crate::record::{Record, SeenSet};

/// Page hosting the tab UI and the grade-change handler, off the site root.
pub const ORG_CHART_PATH: &str = "ptemplate/construction.asp";

// The token sits in an inline script on the root page.
static SESSION_TOKEN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r#"var\s+code1\s*=\s*['"](\w+)['"]"#).unwrap());

/// Drives one full site: session token discovery, org-chart navigation and
/// the ordered tab loop.
pub struct SiteScraper {
    timings: Timings,
    tab_scraper: TabScraper,
}

impl SiteScraper {
    pub fn new(timings: Timings, retry: RetryPolicy) -> Self {
        Self {
            timings,
            tab_scraper: TabScraper::new(retry, timings.ajax_settle()),
        }
    }

    /// Any navigation-level failure aborts the remaining tabs but keeps
    /// whatever was collected up to that point; nothing propagates.
    pub async fn scrape_site(
        &self,
        page: &dyn SitePage,
        site: &SiteConfig,
        tabs: &[String],
        seen: &mut SeenSet,
    ) -> Vec<Record> {
        info!(site = %site.name, url = %site.url, "site scrape started");

        let mut records = Vec::new();
        if let Err(e) = self.run_tabs(page, site, tabs, seen, &mut records).await {
            error!(site = %site.name, error = %e, "site unreachable, keeping partial results");
        }

        info!(site = %site.name, count = records.len(), "site scrape finished");
        records
    }

    async fn run_tabs(
        &self,
        page: &dyn SitePage,
        site: &SiteConfig,
        tabs: &[String],
        seen: &mut SeenSet,
        out: &mut Vec<Record>,
    ) -> anyhow::Result<()> {
        // The root page establishes the session and carries the token.
        page.goto(&site.url, self.timings.nav_timeout()).await?;
        tokio::time::sleep(self.timings.root_settle()).await;

        let html = page.content().await?;
        let token = extract_session_token(&html);
        if token.is_empty() {
            // Degraded but non-fatal: the triggered fetches will likely come
            // back empty. Warn loudly so a site redesign is not mistaken for
            // an ordinary no-data tab.
            warn!(site = %site.name, "session token not found on root page");
        } else {
            info!(site = %site.name, token = %token, "session token extracted");
        }

        let org_url = format!("{}/{}", site.url.trim_end_matches('/'), ORG_CHART_PATH);
        page.goto(&org_url, self.timings.nav_timeout()).await?;
        tokio::time::sleep(self.timings.org_settle()).await;

        for tab in tabs {
            let tab_records = self
                .tab_scraper
                .scrape_tab(page, tab, &site.name, &token, seen)
                .await;
            out.extend(tab_records);
        }
        Ok(())
    }
}

/// Absence of a match yields an empty token.
pub fn extract_session_token(html: &str) -> String {
    SESSION_TOKEN
        .captures(html)
        .map(|caps| caps[1].to_string())
        .unwrap_or_default()
}
