//! Real content fetcher implementation using chromiumoxide.
//!
//! This module provides `ChromiumFetcher`, which implements the
//! `ContentFetcher` trait by driving an actual Chrome/Chromium browser via
//! the DevTools Protocol. Searches go through DuckDuckGo.
//!
//! Requires the `browser` feature flag:
//! ```toml
//! webscout-core = { path = "webscout-core", features = ["browser"] }
//! ```

use super::fetcher::{ContentFetcher, SearchResult, is_valid_url};
use crate::config::{BrowserConfig, ResearchConfig};
use crate::error::BrowserError;
use crate::text::truncate_chars;
use async_trait::async_trait;
use futures::StreamExt;
use serde::Deserialize;
use tokio::sync::Mutex;
use tracing::{debug, warn};

/// Hard cap on harvested result links per search, before URL filtering.
const MAX_RAW_RESULTS: usize = 8;

/// Content-region selectors tried in priority order before falling back to
/// the whole document body.
const CONTENT_SELECTORS: &[&str] = &[
    "article",
    "main",
    ".content",
    "#content",
    ".post-content",
    ".entry-content",
    ".article-content",
];

struct BrowserSession {
    browser: chromiumoxide::Browser,
    page: chromiumoxide::Page,
    handler: tokio::task::JoinHandle<()>,
}

/// A real content fetcher backed by chromiumoxide.
///
/// Holds one browser process and one page for the duration of a session.
pub struct ChromiumFetcher {
    config: BrowserConfig,
    research: ResearchConfig,
    session: Mutex<Option<BrowserSession>>,
}

/// Shape of the objects produced by the result-harvesting script.
#[derive(Debug, Deserialize)]
struct RawHit {
    title: String,
    url: String,
}

impl ChromiumFetcher {
    /// Create a fetcher from configuration. No browser is launched until
    /// `start_session` runs.
    pub fn new(config: BrowserConfig, research: ResearchConfig) -> Self {
        Self {
            config,
            research,
            session: Mutex::new(None),
        }
    }

    async fn settle(&self) {
        if self.config.slow_motion_ms > 0 {
            tokio::time::sleep(std::time::Duration::from_millis(self.config.slow_motion_ms))
                .await;
        }
    }

    /// Poll for an element matching the selector until it appears or the
    /// timeout elapses.
    async fn wait_for_selector(
        page: &chromiumoxide::Page,
        selector: &str,
        timeout_ms: u64,
    ) -> Result<(), BrowserError> {
        let start = std::time::Instant::now();
        let timeout = std::time::Duration::from_millis(timeout_ms);
        loop {
            if page.find_element(selector).await.is_ok() {
                return Ok(());
            }
            if start.elapsed() >= timeout {
                return Err(BrowserError::Timeout { timeout_ms });
            }
            tokio::time::sleep(std::time::Duration::from_millis(100)).await;
        }
    }

    /// JavaScript that extracts page text through the prioritized selector
    /// list, falling back to the document body when no region yields more
    /// than 100 characters.
    fn extraction_script() -> String {
        let selectors = CONTENT_SELECTORS
            .iter()
            .map(|s| format!("'{}'", s))
            .collect::<Vec<_>>()
            .join(", ");
        format!(
            r#"(() => {{
                const selectors = [{selectors}];
                for (const sel of selectors) {{
                    const el = document.querySelector(sel);
                    if (el && el.innerText && el.innerText.trim().length > 100) {{
                        return el.innerText;
                    }}
                }}
                return document.body ? document.body.innerText : '';
            }})()"#
        )
    }
}

#[async_trait]
impl ContentFetcher for ChromiumFetcher {
    async fn start_session(&self) -> Result<(), BrowserError> {
        let mut session = self.session.lock().await;
        if session.is_some() {
            return Ok(());
        }

        let chrome_path = find_chrome_binary(&self.config)?;

        let mut builder = chromiumoxide::BrowserConfig::builder().chrome_executable(chrome_path);

        if self.config.headless {
            builder = builder.arg("--headless=new");
        }

        builder = builder.window_size(self.config.viewport_width, self.config.viewport_height);

        let user_data_dir = match &self.config.user_data_dir {
            Some(dir) => dir.clone(),
            // Unique temporary profile to allow parallel instances
            None => std::env::temp_dir().join(format!(
                "webscout-chrome-{}-{}",
                std::process::id(),
                std::time::SystemTime::now()
                    .duration_since(std::time::UNIX_EPOCH)
                    .unwrap_or_default()
                    .subsec_nanos()
            )),
        };
        builder = builder.user_data_dir(user_data_dir);

        // Common stability args
        builder = builder
            .arg("--no-first-run")
            .arg("--no-default-browser-check")
            .arg("--disable-gpu")
            .arg("--disable-extensions")
            .arg("--disable-dev-shm-usage");

        let browser_config = builder.build().map_err(|e| BrowserError::SessionStart {
            message: format!("Failed to build browser config: {}", e),
        })?;

        let (browser, mut handler) = chromiumoxide::Browser::launch(browser_config)
            .await
            .map_err(|e| BrowserError::SessionStart {
                message: format!("Failed to launch Chrome: {}", e),
            })?;

        // Drain CDP events in the background
        let handler_task = tokio::spawn(async move { while handler.next().await.is_some() {} });

        let page = match browser.new_page("about:blank").await {
            Ok(page) => page,
            Err(e) => {
                handler_task.abort();
                return Err(BrowserError::SessionStart {
                    message: format!("Failed to create page: {}", e),
                });
            }
        };

        debug!("Browser session started");
        *session = Some(BrowserSession {
            browser,
            page,
            handler: handler_task,
        });
        Ok(())
    }

    async fn search(&self, query: &str) -> Result<Vec<SearchResult>, BrowserError> {
        let session = self.session.lock().await;
        let session = session.as_ref().ok_or(BrowserError::NotConnected)?;

        let url = format!("https://duckduckgo.com/?q={}", urlencoding::encode(query));
        session
            .page
            .goto(&url)
            .await
            .map_err(|e| BrowserError::SearchFailed {
                message: format!("navigation to results page failed: {}", e),
            })?;
        self.settle().await;

        // Result headings render asynchronously
        Self::wait_for_selector(&session.page, "h2", self.config.default_timeout_ms).await?;

        let harvest = format!(
            r#"Array.from(document.querySelectorAll('h2 a'))
                .slice(0, {MAX_RAW_RESULTS})
                .map(a => ({{ title: a.innerText, url: a.href }}))"#
        );
        let evaluated =
            session
                .page
                .evaluate(harvest)
                .await
                .map_err(|e| BrowserError::SearchFailed {
                    message: format!("result harvesting failed: {}", e),
                })?;

        let raw: Vec<RawHit> = evaluated.into_value().unwrap_or_default();
        let results: Vec<SearchResult> = raw
            .into_iter()
            .filter(|hit| is_valid_url(&hit.url))
            .enumerate()
            .map(|(i, hit)| SearchResult {
                title: hit.title,
                url: hit.url,
                rank: i + 1,
            })
            .collect();

        debug!(query, count = results.len(), "Search complete");
        Ok(results)
    }

    async fn fetch(&self, url: &str) -> Result<String, BrowserError> {
        let session = self.session.lock().await;
        let session = session.as_ref().ok_or(BrowserError::NotConnected)?;

        session
            .page
            .goto(url)
            .await
            .map_err(|e| BrowserError::NavigationFailed {
                message: format!("{}", e),
            })?;
        self.settle().await;

        let evaluated = session
            .page
            .evaluate(Self::extraction_script())
            .await
            .map_err(|e| BrowserError::ExtractionFailed {
                message: format!("{}", e),
            })?;

        let text: String = evaluated.into_value().unwrap_or_default();
        Ok(truncate_chars(&text, self.research.max_page_chars).to_string())
    }

    async fn close_session(&self) {
        let mut session = self.session.lock().await;
        if let Some(mut active) = session.take() {
            if let Err(e) = active.browser.close().await {
                warn!(error = %e, "Failed to close browser cleanly");
            }
            active.handler.abort();
            debug!("Browser session closed");
        }
    }
}

/// Find a Chrome or Chromium binary on the system.
fn find_chrome_binary(config: &BrowserConfig) -> Result<std::path::PathBuf, BrowserError> {
    // 1. User-specified path from config
    if let Some(ref path) = config.chrome_path {
        let p = std::path::PathBuf::from(path);
        if p.exists() {
            return Ok(p);
        }
    }

    // 2. macOS default locations
    #[cfg(target_os = "macos")]
    {
        let candidates = [
            "/Applications/Google Chrome.app/Contents/MacOS/Google Chrome",
            "/Applications/Chromium.app/Contents/MacOS/Chromium",
            "/Applications/Brave Browser.app/Contents/MacOS/Brave Browser",
        ];
        for candidate in &candidates {
            let p = std::path::PathBuf::from(candidate);
            if p.exists() {
                return Ok(p);
            }
        }
    }

    // 3. Linux default locations
    #[cfg(target_os = "linux")]
    {
        let candidates = [
            "/usr/bin/google-chrome",
            "/usr/bin/google-chrome-stable",
            "/usr/bin/chromium",
            "/usr/bin/chromium-browser",
            "/snap/bin/chromium",
        ];
        for candidate in &candidates {
            let p = std::path::PathBuf::from(candidate);
            if p.exists() {
                return Ok(p);
            }
        }
    }

    // 4. Windows default locations
    #[cfg(target_os = "windows")]
    {
        let candidates = [
            r"C:\Program Files\Google\Chrome\Application\chrome.exe",
            r"C:\Program Files (x86)\Google\Chrome\Application\chrome.exe",
        ];
        for candidate in &candidates {
            let p = std::path::PathBuf::from(candidate);
            if p.exists() {
                return Ok(p);
            }
        }
    }

    Err(BrowserError::SessionStart {
        message: "no Chrome/Chromium binary found; set browser.chrome_path".to_string(),
    })
}
