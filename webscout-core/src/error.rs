//! Error types for the webscout core.
//!
//! Uses `thiserror` for public API error types with structured variants
//! covering the language-model backend, the browser fetcher, and
//! configuration.

/// Top-level error type for the webscout core library.
#[derive(Debug, thiserror::Error)]
pub enum WebscoutError {
    #[error("LLM error: {0}")]
    Llm(#[from] LlmError),

    #[error("Browser error: {0}")]
    Browser(#[from] BrowserError),

    #[error("Configuration error: {message}")]
    Config { message: String },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

/// Errors from language-model provider interactions.
#[derive(Debug, thiserror::Error)]
pub enum LlmError {
    #[error("API request failed: {message}")]
    ApiRequest { message: String },

    #[error("API response parse error: {message}")]
    ResponseParse { message: String },

    #[error("Response did not match the expected format: {message}")]
    UnparsableResponse { message: String },

    #[error("Authentication failed for provider {provider}")]
    AuthFailed { provider: String },

    #[error("Rate limited by provider, retry after {retry_after_secs}s")]
    RateLimited { retry_after_secs: u64 },

    #[error("Request timed out after {timeout_secs}s")]
    Timeout { timeout_secs: u64 },

    #[error("Provider connection failed: {message}")]
    Connection { message: String },

    #[error("Provider not supported: {provider}")]
    UnsupportedProvider { provider: String },
}

/// Errors from the browser-backed content fetcher.
#[derive(Debug, thiserror::Error)]
pub enum BrowserError {
    #[error("Browser session failed to start: {message}")]
    SessionStart { message: String },

    #[error("Navigation failed: {message}")]
    NavigationFailed { message: String },

    #[error("Content extraction failed: {message}")]
    ExtractionFailed { message: String },

    #[error("Search failed: {message}")]
    SearchFailed { message: String },

    #[error("Operation timed out after {timeout_ms}ms")]
    Timeout { timeout_ms: u64 },

    #[error("No browser session is connected")]
    NotConnected,
}

/// A type alias for results using the top-level `WebscoutError`.
pub type Result<T> = std::result::Result<T, WebscoutError>;
