//! Content fetcher trait and mock implementation.
//!
//! The `ContentFetcher` trait abstracts search and page-text extraction,
//! enabling mock-based testing of the research pipeline without a real
//! browser.

use crate::error::BrowserError;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::Mutex;

/// One candidate hit for a search term.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SearchResult {
    /// Result title as rendered by the search engine.
    pub title: String,
    /// Absolute http(s) URL. Always passes `is_valid_url`.
    pub url: String,
    /// 1-based rank in the engine's result order.
    pub rank: usize,
}

/// Trait abstracting web search and page-content extraction.
///
/// Implementors include `MockContentFetcher` (for tests) and
/// `ChromiumFetcher` (driving a real browser, behind the `browser` feature).
#[async_trait]
pub trait ContentFetcher: Send + Sync {
    /// Start the underlying browser session. Fatal for the research run
    /// when it fails.
    async fn start_session(&self) -> Result<(), BrowserError>;

    /// Search the web and return up to a bounded count of valid results,
    /// in engine rank order.
    async fn search(&self, query: &str) -> Result<Vec<SearchResult>, BrowserError>;

    /// Navigate to `url` and return extracted page text, truncated to the
    /// configured length.
    async fn fetch(&self, url: &str) -> Result<String, BrowserError>;

    /// Close the session. Idempotent; tolerates a session that never
    /// started and never raises (failures are logged internally).
    async fn close_session(&self);
}

/// Check whether a search-result URL is worth offering to the pipeline.
///
/// Accepts absolute http(s) URLs only. Rejects search-engine internal
/// links, ad hosts, and non-navigable schemes (`javascript:`, `mailto:`,
/// bare anchors).
pub fn is_valid_url(raw: &str) -> bool {
    let parsed = match url::Url::parse(raw) {
        Ok(parsed) => parsed,
        // Relative URLs and bare anchors fail to parse
        Err(_) => return false,
    };

    if parsed.scheme() != "http" && parsed.scheme() != "https" {
        return false;
    }

    // DuckDuckGo internal result-page links
    if raw.contains("/?t=h_&q=") {
        return false;
    }

    match parsed.host_str() {
        Some(host) => !(host.starts_with("ads.") || host.contains(".ads.")),
        None => false,
    }
}

/// A mock content fetcher for testing. Records all calls and returns
/// configurable results.
pub struct MockContentFetcher {
    /// Search results keyed by query.
    pub search_results: Mutex<HashMap<String, Vec<SearchResult>>>,
    /// Page text keyed by URL. Fetching an unknown URL fails.
    pub pages: Mutex<HashMap<String, String>>,
    /// If set, start_session will return this error.
    pub start_error: Mutex<Option<BrowserError>>,
    /// If set, search will return this error.
    pub search_error: Mutex<Option<BrowserError>>,
    /// Record of all method calls for assertion: (method, arg).
    pub call_log: Mutex<Vec<(String, String)>>,
    /// Whether close_session has run.
    pub closed: Mutex<bool>,
}

impl Default for MockContentFetcher {
    fn default() -> Self {
        Self {
            search_results: Mutex::new(HashMap::new()),
            pages: Mutex::new(HashMap::new()),
            start_error: Mutex::new(None),
            search_error: Mutex::new(None),
            call_log: Mutex::new(Vec::new()),
            closed: Mutex::new(false),
        }
    }
}

impl MockContentFetcher {
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the results returned for a search query.
    pub fn set_search_results(&self, query: impl Into<String>, results: Vec<SearchResult>) {
        self.search_results
            .lock()
            .unwrap()
            .insert(query.into(), results);
    }

    /// Set the text returned when fetching a URL.
    pub fn set_page(&self, url: impl Into<String>, text: impl Into<String>) {
        self.pages.lock().unwrap().insert(url.into(), text.into());
    }

    /// Set an error that start_session() will return.
    pub fn set_start_error(&self, err: BrowserError) {
        *self.start_error.lock().unwrap() = Some(err);
    }

    /// Set an error that search() will return.
    pub fn set_search_error(&self, err: BrowserError) {
        *self.search_error.lock().unwrap() = Some(err);
    }

    fn log_call(&self, method: &str, arg: &str) {
        self.call_log
            .lock()
            .unwrap()
            .push((method.to_string(), arg.to_string()));
    }

    /// Get the number of calls to a given method.
    pub fn call_count(&self, method: &str) -> usize {
        self.call_log
            .lock()
            .unwrap()
            .iter()
            .filter(|(m, _)| m == method)
            .count()
    }

    /// Get all recorded calls.
    pub fn calls(&self) -> Vec<(String, String)> {
        self.call_log.lock().unwrap().clone()
    }

    /// Whether close_session has run.
    pub fn is_closed(&self) -> bool {
        *self.closed.lock().unwrap()
    }
}

#[async_trait]
impl ContentFetcher for MockContentFetcher {
    async fn start_session(&self) -> Result<(), BrowserError> {
        self.log_call("start_session", "");
        if let Some(err) = self.start_error.lock().unwrap().take() {
            return Err(err);
        }
        Ok(())
    }

    async fn search(&self, query: &str) -> Result<Vec<SearchResult>, BrowserError> {
        self.log_call("search", query);
        if let Some(err) = self.search_error.lock().unwrap().take() {
            return Err(err);
        }
        Ok(self
            .search_results
            .lock()
            .unwrap()
            .get(query)
            .cloned()
            .unwrap_or_default())
    }

    async fn fetch(&self, url: &str) -> Result<String, BrowserError> {
        self.log_call("fetch", url);
        match self.pages.lock().unwrap().get(url) {
            Some(text) => Ok(text.clone()),
            None => Err(BrowserError::NavigationFailed {
                message: format!("no page configured for {}", url),
            }),
        }
    }

    async fn close_session(&self) {
        self.log_call("close_session", "");
        *self.closed.lock().unwrap() = true;
    }
}
