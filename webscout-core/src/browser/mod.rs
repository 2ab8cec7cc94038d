//! Browser-backed content fetching.

pub mod fetcher;

#[cfg(feature = "browser")]
pub mod chromium;

pub use fetcher::{ContentFetcher, MockContentFetcher, SearchResult, is_valid_url};

#[cfg(feature = "browser")]
pub use chromium::ChromiumFetcher;
