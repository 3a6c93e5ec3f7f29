use std::time::Duration;
use tracing::{info, warn};

use super::TabPage;
use crate::cards;
use crate::config::RetryPolicy;
use crate::error::TabError;
use crate::record::{Record, SeenSet};

/// Fetches one tab's roster by invoking the page-side grade-change handler.
pub struct TabScraper {
    retry: RetryPolicy,
    settle: Duration,
}

impl TabScraper {
    pub fn new(retry: RetryPolicy, settle: Duration) -> Self {
        Self { retry, settle }
    }

    /// Never escalates: transient failures retry with exponential backoff
    /// (no sleep after the final attempt), exhausted retries yield an empty
    /// list so the rest of the site keeps going.
    pub async fn scrape_tab<P: TabPage + ?Sized>(
        &self,
        page: &P,
        tab: &str,
        site: &str,
        session_token: &str,
        seen: &mut SeenSet,
    ) -> Vec<Record> {
        let script = format!("fnChangeGrade('{session_token}', '', '{tab}')");

        for attempt in 0..self.retry.max_attempts {
            match self.fetch_once(page, &script).await {
                Ok(body) => {
                    let html = decode_body(&body);
                    let records = cards::parse_cards(&html, tab, site, seen);
                    info!(site, tab, count = records.len(), "tab scraped");
                    return records;
                }
                Err(e) if attempt + 1 < self.retry.max_attempts => {
                    let wait = self.retry.backoff(attempt);
                    warn!(
                        site,
                        tab,
                        attempt = attempt + 1,
                        error = %e,
                        "tab fetch failed, retrying in {:?}",
                        wait
                    );
                    tokio::time::sleep(wait).await;
                }
                Err(e) => {
                    warn!(site, tab, attempt = attempt + 1, error = %e, "tab fetch failed, skipping tab");
                }
            }
        }

        Vec::new()
    }

    async fn fetch_once<P: TabPage + ?Sized>(
        &self,
        page: &P,
        script: &str,
    ) -> anyhow::Result<Vec<u8>> {
        page.trigger_and_capture(script, self.settle)
            .await?
            .ok_or_else(|| TabError::NoAjaxResponse.into())
    }
}

/// These sites serve legacy EUC-KR fragments; bytes that do not decode
/// cleanly fall back to lossy UTF-8.
pub fn decode_body(body: &[u8]) -> String {
    let (text, _, had_errors) = encoding_rs::EUC_KR.decode(body);
    if had_errors {
        String::from_utf8_lossy(body).into_owned()
    } else {
        text.into_owned()
    }
}
