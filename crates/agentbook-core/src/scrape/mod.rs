//! Scrape orchestration: browser capability traits, per-tab and per-site
//! drivers, and the run coordinator.
//!
//! The traits keep the scrapers independent of chromiumoxide so retry and
//! failure paths are testable without a browser; [`browser`] holds the
//! production CDP implementation.

pub mod browser;
pub mod coordinator;
pub mod site;
pub mod tab;

pub use browser::{CdpBrowser, SiteSession};
pub use coordinator::{run, run_all};
pub use site::SiteScraper;
pub use tab::TabScraper;

use async_trait::async_trait;
use std::time::Duration;

/// A page positioned on the tab UI: can run a script in page context and
/// capture the first matching AJAX response it triggers.
#[async_trait]
pub trait TabPage: Send + Sync {
    /// Evaluates `script`, then waits up to `settle` for a roster AJAX
    /// response. Returns the raw body bytes, or `None` if nothing matched.
    async fn trigger_and_capture(
        &self,
        script: &str,
        settle: Duration,
    ) -> anyhow::Result<Option<Vec<u8>>>;
}

/// A full browsing session for one site.
#[async_trait]
pub trait SitePage: TabPage {
    /// Navigates and waits for the load to finish, bounded by `timeout`.
    async fn goto(&self, url: &str, timeout: Duration) -> anyhow::Result<()>;

    /// Fully rendered page markup.
    async fn content(&self) -> anyhow::Result<String>;
}

/// Opens isolated per-site sessions off one shared browser instance.
#[async_trait]
pub trait SessionFactory: Send + Sync {
    async fn open_session(&self) -> anyhow::Result<Box<dyn SitePage>>;
}
