//! chromiumoxide-backed implementation of the browser capability traits.

use async_trait::async_trait;
use base64::Engine;
use chromiumoxide::cdp::browser_protocol::emulation::SetUserAgentOverrideParams;
use chromiumoxide::cdp::browser_protocol::network::{
    ClearBrowserCookiesParams, EventResponseReceived, GetResponseBodyParams,
};
use chromiumoxide::{Browser, BrowserConfig, Page};
use futures::StreamExt;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Mutex;
use tokio::task::JoinHandle;
use tracing::debug;

use super::{SessionFactory, SitePage, TabPage};

/// Fixed desktop identity presented to every site.
const DESKTOP_USER_AGENT: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) \
     AppleWebKit/537.36 (KHTML, like Gecko) Chrome/120.0.0.0 Safari/537.36";

/// The two endpoint names the known site families use for roster fetches.
const AJAX_ENDPOINT_MARKERS: [&str; 2] = ["construction_ajax", "construction_gn_ajax"];

pub(crate) fn is_roster_endpoint(url: &str) -> bool {
    AJAX_ENDPOINT_MARKERS.iter().any(|m| url.contains(m))
}

/// The single headless browser owned for the whole run.
pub struct CdpBrowser {
    browser: Browser,
    handle: JoinHandle<()>,
}

impl CdpBrowser {
    pub async fn launch() -> anyhow::Result<Self> {
        let (browser, mut handler) = Browser::launch(
            BrowserConfig::builder()
                .build()
                .map_err(|e| anyhow::anyhow!(e))?,
        )
        .await?;

        let handle = tokio::spawn(async move {
            while let Some(h) = handler.next().await {
                if h.is_err() {
                    debug!("browser handler error: {:?}", h);
                    break;
                }
            }
        });

        Ok(Self { browser, handle })
    }

    pub async fn close(mut self) -> anyhow::Result<()> {
        self.browser.close().await?;
        self.handle.abort();
        Ok(())
    }
}

#[async_trait]
impl SessionFactory for CdpBrowser {
    async fn open_session(&self) -> anyhow::Result<Box<dyn SitePage>> {
        let page = self.browser.new_page("about:blank").await?;

        // Fresh target, but cookies are browser-wide: reset them so one
        // site's session state cannot leak into the next.
        page.execute(
            SetUserAgentOverrideParams::builder()
                .user_agent(DESKTOP_USER_AGENT)
                .accept_language("ko-KR")
                .build()
                .map_err(|e| anyhow::anyhow!(e))?,
        )
        .await?;
        page.execute(ClearBrowserCookiesParams::default()).await?;

        Ok(Box::new(SiteSession { page }))
    }
}

/// One site's browsing session. Closes its page when dropped.
pub struct SiteSession {
    page: Page,
}

impl Drop for SiteSession {
    fn drop(&mut self) {
        let page = self.page.clone();
        tokio::spawn(async move {
            if let Err(e) = page.close().await {
                debug!("failed to close page on drop: {e}");
            }
        });
    }
}

#[async_trait]
impl TabPage for SiteSession {
    async fn trigger_and_capture(
        &self,
        script: &str,
        settle: Duration,
    ) -> anyhow::Result<Option<Vec<u8>>> {
        let mut responses = self.page.event_listener::<EventResponseReceived>().await?;

        let captured: Arc<Mutex<Option<Vec<u8>>>> = Arc::new(Mutex::new(None));
        let slot = captured.clone();
        let page = self.page.clone();
        let listener = tokio::spawn(async move {
            while let Some(event) = responses.next().await {
                if !is_roster_endpoint(&event.response.url) {
                    continue;
                }
                match page
                    .execute(GetResponseBodyParams::new(event.request_id.clone()))
                    .await
                {
                    Ok(body) => {
                        let bytes = if body.base64_encoded {
                            match base64::engine::general_purpose::STANDARD.decode(&body.body) {
                                Ok(bytes) => bytes,
                                Err(e) => {
                                    debug!("undecodable AJAX body: {e}");
                                    continue;
                                }
                            }
                        } else {
                            body.body.clone().into_bytes()
                        };
                        *slot.lock().await = Some(bytes);
                    }
                    Err(e) => debug!("failed to read AJAX response body: {e}"),
                }
            }
        });

        let result = self.page.evaluate(script.to_string()).await;
        tokio::time::sleep(settle).await;
        listener.abort();
        result?;

        let body = captured.lock().await.take();
        Ok(body)
    }
}

#[async_trait]
impl SitePage for SiteSession {
    async fn goto(&self, url: &str, timeout: Duration) -> anyhow::Result<()> {
        tokio::time::timeout(timeout, async {
            self.page.goto(url).await?;
            self.page.wait_for_navigation().await?;
            anyhow::Ok(())
        })
        .await
        .map_err(|_| anyhow::anyhow!("navigation to {url} timed out"))??;
        Ok(())
    }

    async fn content(&self) -> anyhow::Result<String> {
        Ok(self.page.content().await?)
    }
}
