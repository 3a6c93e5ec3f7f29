use async_trait::async_trait;
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::Mutex;
use std::time::Duration;

use agentbook_core::{
    run_all, RetryPolicy, ScrapeConfig, SeenSet, SessionFactory, SiteConfig, SitePage,
    SiteScraper, TabPage, TabScraper, Timings,
};

fn list_card(name: &str, phone: &str) -> String {
    format!(
        r#"<div class="name_card"><table>
            <tr><td>이름</td><td>{name}</td></tr>
            <tr><td>사무소소재지</td><td>서울특별시 강남구 역삼동</td></tr>
            <tr><td>일반전화</td><td>{phone}</td></tr>
        </table></div>"#
    )
}

/// Fails the first `fail_first` trigger calls with "no response", then
/// serves `body`.
struct FlakyTabPage {
    calls: AtomicU32,
    fail_first: u32,
    body: Vec<u8>,
}

impl FlakyTabPage {
    fn new(fail_first: u32, body: impl Into<Vec<u8>>) -> Self {
        Self {
            calls: AtomicU32::new(0),
            fail_first,
            body: body.into(),
        }
    }
}

#[async_trait]
impl TabPage for FlakyTabPage {
    async fn trigger_and_capture(
        &self,
        _script: &str,
        _settle: Duration,
    ) -> anyhow::Result<Option<Vec<u8>>> {
        let call = self.calls.fetch_add(1, Ordering::SeqCst);
        if call < self.fail_first {
            Ok(None)
        } else {
            Ok(Some(self.body.clone()))
        }
    }
}

#[tokio::test(start_paused = true)]
async fn test_tab_retry_succeeds_on_third_attempt() {
    let page = FlakyTabPage::new(2, list_card("홍길동", "02-1234-5678"));
    let scraper = TabScraper::new(RetryPolicy::default(), Duration::from_secs(2));
    let mut seen = SeenSet::new();

    let start = tokio::time::Instant::now();
    let records = scraper
        .scrape_tab(&page, "시도회장", "서울", "tok", &mut seen)
        .await;

    assert_eq!(records.len(), 1);
    assert_eq!(records[0].name, "홍길동");
    assert_eq!(page.calls.load(Ordering::SeqCst), 3);
    // Exactly two backoff sleeps: 1s after the first failure, 2s after the
    // second. The mock itself never sleeps.
    assert_eq!(start.elapsed(), Duration::from_secs(3));
}

#[tokio::test(start_paused = true)]
async fn test_tab_exhausted_retries_yield_empty() {
    let page = FlakyTabPage::new(u32::MAX, Vec::new());
    let scraper = TabScraper::new(RetryPolicy::default(), Duration::from_secs(2));
    let mut seen = SeenSet::new();

    let start = tokio::time::Instant::now();
    let records = scraper
        .scrape_tab(&page, "지회장", "서울", "tok", &mut seen)
        .await;

    assert!(records.is_empty());
    assert_eq!(page.calls.load(Ordering::SeqCst), 3);
    // No sleep after the final attempt.
    assert_eq!(start.elapsed(), Duration::from_secs(3));
}

#[tokio::test(start_paused = true)]
async fn test_tab_first_try_success_never_sleeps() {
    let page = FlakyTabPage::new(0, list_card("홍길동", "02-1234-5678"));
    let scraper = TabScraper::new(RetryPolicy::default(), Duration::from_secs(2));
    let mut seen = SeenSet::new();

    let start = tokio::time::Instant::now();
    let records = scraper
        .scrape_tab(&page, "시도회장", "서울", "tok", &mut seen)
        .await;

    assert_eq!(records.len(), 1);
    assert_eq!(start.elapsed(), Duration::ZERO);
}

/// Serves a fixed root page and one roster fragment per tab; records every
/// evaluated trigger script.
struct ScriptedSitePage {
    root_html: String,
    scripts: Mutex<Vec<String>>,
    fail_nav: bool,
}

impl ScriptedSitePage {
    fn new(root_html: impl Into<String>) -> Self {
        Self {
            root_html: root_html.into(),
            scripts: Mutex::new(Vec::new()),
            fail_nav: false,
        }
    }

    fn unreachable() -> Self {
        Self {
            root_html: String::new(),
            scripts: Mutex::new(Vec::new()),
            fail_nav: true,
        }
    }
}

#[async_trait]
impl TabPage for ScriptedSitePage {
    async fn trigger_and_capture(
        &self,
        script: &str,
        _settle: Duration,
    ) -> anyhow::Result<Option<Vec<u8>>> {
        self.scripts.lock().unwrap().push(script.to_string());
        if script.contains("'지회장'") {
            // This tab's AJAX never answers.
            return Ok(None);
        }
        let fragment = if script.contains("'시도회장'") {
            list_card("홍길동", "02-1234-5678")
        } else {
            list_card("김철수", "031-987-6543")
        };
        let (encoded, _, _) = encoding_rs::EUC_KR.encode(&fragment);
        Ok(Some(encoded.into_owned()))
    }
}

#[async_trait]
impl SitePage for ScriptedSitePage {
    async fn goto(&self, url: &str, _timeout: Duration) -> anyhow::Result<()> {
        if self.fail_nav {
            anyhow::bail!("connection refused: {url}");
        }
        Ok(())
    }

    async fn content(&self) -> anyhow::Result<String> {
        Ok(self.root_html.clone())
    }
}

fn test_timings() -> Timings {
    Timings::default()
}

#[tokio::test(start_paused = true)]
async fn test_site_scrape_passes_token_and_survives_tab_failure() {
    let page = ScriptedSitePage::new("<script>var code1 = 'abc123';</script>");
    let scraper = SiteScraper::new(test_timings(), RetryPolicy::default());
    let site = SiteConfig {
        name: "서울".into(),
        url: "http://seoul.example.org/".into(),
    };
    let tabs = vec![
        "시도회장".to_string(),
        "지회장".to_string(),
        "분회장".to_string(),
    ];
    let mut seen = SeenSet::new();

    let records = scraper.scrape_site(&page, &site, &tabs, &mut seen).await;

    // The dead 지회장 tab degraded to nothing; the other two still landed.
    assert_eq!(records.len(), 2);
    assert_eq!(records[0].name, "홍길동");
    assert_eq!(records[1].name, "김철수");

    let scripts = page.scripts.lock().unwrap();
    assert!(scripts[0].contains("fnChangeGrade('abc123', '', '시도회장')"));
    // The failed tab was retried the full three times.
    assert_eq!(scripts.iter().filter(|s| s.contains("'지회장'")).count(), 3);
}

#[tokio::test(start_paused = true)]
async fn test_unreachable_site_yields_partial_results_without_panic() {
    let page = ScriptedSitePage::unreachable();
    let scraper = SiteScraper::new(test_timings(), RetryPolicy::default());
    let site = SiteConfig {
        name: "경기".into(),
        url: "http://gg.example.org".into(),
    };
    let mut seen = SeenSet::new();

    let records = scraper
        .scrape_site(&page, &site, &["시도회장".to_string()], &mut seen)
        .await;

    assert!(records.is_empty());
    assert!(page.scripts.lock().unwrap().is_empty());
}

struct ScriptedFactory;

#[async_trait]
impl SessionFactory for ScriptedFactory {
    async fn open_session(&self) -> anyhow::Result<Box<dyn SitePage>> {
        Ok(Box::new(ScriptedSitePage::new(
            "<script>var code1 = 'tok';</script>",
        )))
    }
}

#[tokio::test(start_paused = true)]
async fn test_run_all_dedups_across_sites() {
    let config = ScrapeConfig {
        sites: vec![
            SiteConfig {
                name: "서울".into(),
                url: "http://seoul.example.org".into(),
            },
            SiteConfig {
                name: "경기".into(),
                url: "http://gg.example.org".into(),
            },
        ],
        tabs: vec!["시도회장".to_string()],
        retry: RetryPolicy::default(),
        timings: test_timings(),
    };

    let records = run_all(&ScriptedFactory, &config).await;

    // Both sites serve the same 홍길동 card; only the first-encountered
    // record survives and it is attributed to the first site.
    assert_eq!(records.len(), 1);
    assert_eq!(records[0].site, "서울");
}

mod snapshot_io {
    use agentbook_core::{snapshot, Record};

    fn record(name: &str) -> Record {
        Record {
            site: "서울".into(),
            tab: "시도회장".into(),
            name: name.into(),
            office: "한빛공인".into(),
            address: "서울특별시 강남구".into(),
            phone: "02-1234-5678".into(),
            fax: String::new(),
            region: "강남구".into(),
        }
    }

    #[tokio::test]
    async fn test_write_is_full_overwrite() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("data").join("agents.json");

        snapshot::write(&path, &[record("홍길동"), record("김철수")])
            .await
            .unwrap();
        snapshot::write(&path, &[record("박영희")]).await.unwrap();

        let loaded = snapshot::load(&path).await.unwrap();
        assert_eq!(loaded.len(), 1);
        assert_eq!(loaded[0].name, "박영희");
    }

    #[tokio::test]
    async fn test_missing_snapshot_loads_as_empty() {
        let dir = tempfile::tempdir().unwrap();
        let loaded = snapshot::load(&dir.path().join("nope.json")).await.unwrap();
        assert!(loaded.is_empty());
    }

    #[tokio::test]
    async fn test_snapshot_is_readable_utf8_json() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("agents.json");
        snapshot::write(&path, &[record("홍길동")]).await.unwrap();

        let raw = tokio::fs::read_to_string(&path).await.unwrap();
        // Human-readable: indented, Korean kept as-is rather than escaped.
        assert!(raw.contains("\n  "));
        assert!(raw.contains("홍길동"));
    }
}
