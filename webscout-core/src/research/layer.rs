//! Per-layer research: search, fetch, and extract one answer per term.

use super::plan::Layer;
use super::record::{AnswerRecord, NO_CLEAR_ANSWER, NO_RELIABLE_ANSWER, NO_SEARCH_RESULTS};
use crate::browser::{ContentFetcher, SearchResult};
use crate::config::ResearchConfig;
use crate::llm::{CompletionOptions, LlmClient};
use crate::text::truncate_chars;
use std::sync::Arc;
use std::time::Duration;
use tracing::debug;

/// Researches one layer's search terms, producing exactly one
/// `AnswerRecord` per term with multi-candidate fallback.
///
/// No fetcher or model error escapes this component; failures degrade to
/// sentinel records or to skipping a candidate.
pub struct LayerResearcher {
    fetcher: Arc<dyn ContentFetcher>,
    llm: Arc<dyn LlmClient>,
    config: ResearchConfig,
    options: CompletionOptions,
}

impl LayerResearcher {
    pub fn new(
        fetcher: Arc<dyn ContentFetcher>,
        llm: Arc<dyn LlmClient>,
        config: ResearchConfig,
    ) -> Self {
        Self {
            fetcher,
            llm,
            config,
            // Extraction wants grounded, short answers
            options: CompletionOptions {
                temperature: 0.3,
                max_output_tokens: 256,
            },
        }
    }

    /// Research every term in order. Always returns exactly one record per
    /// term, in input order.
    pub async fn research(&self, terms: &[String], layer: Layer) -> Vec<AnswerRecord> {
        let mut records = Vec::with_capacity(terms.len());
        for term in terms {
            records.push(self.research_term(term, layer).await);
        }
        records
    }

    async fn research_term(&self, term: &str, layer: Layer) -> AnswerRecord {
        let timeout = Duration::from_millis(self.config.call_timeout_ms);

        let results = match tokio::time::timeout(timeout, self.fetcher.search(term)).await {
            Ok(Ok(results)) => results,
            Ok(Err(e)) => {
                debug!(term, layer = %layer, error = %e, "Search failed for term");
                Vec::new()
            }
            Err(_) => {
                debug!(term, layer = %layer, "Search timed out for term");
                Vec::new()
            }
        };

        if results.is_empty() {
            return AnswerRecord::sentinel(term, layer, NO_SEARCH_RESULTS);
        }

        // First acceptable answer wins; remaining candidates are never
        // fetched.
        for candidate in results.iter().take(self.config.max_candidates_per_term) {
            if let Some(record) = self.try_candidate(term, layer, candidate, timeout).await {
                return record;
            }
        }

        AnswerRecord::sentinel(term, layer, NO_RELIABLE_ANSWER)
    }

    /// Fetch one candidate page and attempt extraction. `None` means the
    /// candidate did not produce an acceptable answer.
    async fn try_candidate(
        &self,
        term: &str,
        layer: Layer,
        candidate: &SearchResult,
        timeout: Duration,
    ) -> Option<AnswerRecord> {
        let content = match tokio::time::timeout(timeout, self.fetcher.fetch(&candidate.url)).await
        {
            Ok(Ok(content)) if !content.trim().is_empty() => content,
            Ok(Ok(_)) => {
                debug!(url = candidate.url.as_str(), "Page had no extractable text");
                return None;
            }
            Ok(Err(e)) => {
                debug!(url = candidate.url.as_str(), error = %e, "Fetch failed, trying next candidate");
                return None;
            }
            Err(_) => {
                debug!(url = candidate.url.as_str(), "Fetch timed out, trying next candidate");
                return None;
            }
        };

        let prompt = self.extraction_prompt(term, layer, &content);
        let answer = match tokio::time::timeout(timeout, self.llm.complete(&prompt, &self.options))
            .await
        {
            Ok(Ok(answer)) => answer,
            Ok(Err(e)) => {
                debug!(term, error = %e, "Extraction request failed, trying next candidate");
                return None;
            }
            Err(_) => {
                debug!(term, "Extraction timed out, trying next candidate");
                return None;
            }
        };

        let answer = answer.trim();
        if answer.is_empty() || answer.contains(NO_CLEAR_ANSWER) {
            return None;
        }

        Some(AnswerRecord::new(term, layer, answer, &candidate.url))
    }

    fn extraction_prompt(&self, term: &str, layer: Layer, content: &str) -> String {
        let content = truncate_chars(content, self.config.max_content_chars);

        if layer == Layer::Verification {
            format!(
                "Analyze this content in relation to the claim: {term}\n\
                 \n\
                 Content: {content}\n\
                 \n\
                 Respond in three labeled parts:\n\
                 SUPPORTS: evidence in the content supporting the claim\n\
                 CONTRADICTS: evidence in the content contradicting the claim\n\
                 NEUTRAL: related facts that do neither\n\
                 \n\
                 Keep each part under 40 words."
            )
        } else {
            format!(
                "From this webpage content, extract the specific answer for: {term}\n\
                 \n\
                 Content: {content}\n\
                 \n\
                 Give a direct factual answer in under {limit} words. If the content \
                 does not answer this, say exactly '{NO_CLEAR_ANSWER}'.",
                limit = self.config.extraction_word_limit
            )
        }
    }
}
