use std::path::Path;
use tracing::{error, info};

use super::{CdpBrowser, SessionFactory, SiteScraper};
use crate::config::ScrapeConfig;
use crate::record::{Record, SeenSet};
use crate::snapshot;

/// Scrapes every configured site strictly in order against one shared
/// seen-set, so the first occurrence of an identity always wins. A session
/// that fails to open skips only that site.
pub async fn run_all<F: SessionFactory>(factory: &F, config: &ScrapeConfig) -> Vec<Record> {
    let scraper = SiteScraper::new(config.timings, config.retry);
    let mut seen = SeenSet::new();
    let mut all = Vec::new();

    for site in &config.sites {
        match factory.open_session().await {
            Ok(page) => {
                let records = scraper
                    .scrape_site(page.as_ref(), site, &config.tabs, &mut seen)
                    .await;
                all.extend(records);
            }
            Err(e) => error!(site = %site.name, error = %e, "failed to open browser session"),
        }
    }

    all
}

/// Top-level entry point: one headless browser for the whole run, then a
/// full overwrite of the snapshot. Only browser launch/close failures are
/// fatal; everything below degrades per site or per tab.
pub async fn run(config: &ScrapeConfig, out_path: &Path) -> anyhow::Result<Vec<Record>> {
    let browser = CdpBrowser::launch().await?;
    let records = run_all(&browser, config).await;
    browser.close().await?;

    snapshot::write(out_path, &records).await?;
    info!(total = records.len(), path = %out_path.display(), "snapshot written");
    Ok(records)
}
