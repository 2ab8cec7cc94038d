//! Core library for webscout, a layered web research agent.
//!
//! A user query is decomposed into layered search terms, each term is
//! researched by driving a real browser through a search engine and
//! candidate pages, an extraction model pulls answers out of page text,
//! verification findings are cross-checked for contradictions, and the
//! whole run is scored and synthesized into one report.
//!
//! Browser automation lives behind the `browser` feature so the research
//! pipeline can be tested against mock fetchers without a Chrome install.

pub mod browser;
pub mod config;
pub mod error;
pub mod llm;
pub mod providers;
pub mod research;
mod text;

pub use config::{load_config, BrowserConfig, LlmConfig, ResearchConfig, WebscoutConfig};
pub use error::{BrowserError, LlmError, Result, WebscoutError};
pub use llm::{CompletionOptions, LlmClient};
pub use research::{PipelinePhase, ResearchOrchestrator};
