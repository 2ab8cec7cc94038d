//! Answer records, sentinel answers, and the per-layer findings
//! accumulator.

use super::plan::Layer;
use serde::{Deserialize, Serialize};

/// Sentinel answer: a search produced zero usable results for a term.
pub const NO_SEARCH_RESULTS: &str = "No search results found";

/// Sentinel answer: every candidate page for a term was tried and none
/// yielded an accepted extraction.
pub const NO_RELIABLE_ANSWER: &str = "Could not find reliable answer";

/// Sentinel phrase the model is instructed to emit when page content does
/// not answer a term. Matched by substring, since models often wrap it.
pub const NO_CLEAR_ANSWER: &str = "No clear answer found";

/// Sentinel answer: extraction itself failed. The pipeline never emits
/// this (a failed extraction skips the candidate instead); it is
/// recognized by `is_sentinel` so externally produced records carrying
/// it score as failures.
pub const EXTRACTION_FAILED: &str = "Could not extract answer";

/// The outcome of researching one search term: exactly one per term.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AnswerRecord {
    /// The search term this record answers.
    pub term: String,
    /// The layer the term belongs to.
    pub layer: Layer,
    /// Extracted answer text, or a sentinel.
    pub answer: String,
    /// URL of the page the answer came from. Absent for sentinels.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source: Option<String>,
}

impl AnswerRecord {
    pub fn new(
        term: impl Into<String>,
        layer: Layer,
        answer: impl Into<String>,
        source: impl Into<String>,
    ) -> Self {
        Self {
            term: term.into(),
            layer,
            answer: answer.into(),
            source: Some(source.into()),
        }
    }

    /// A record carrying a sentinel answer and no source.
    pub fn sentinel(term: impl Into<String>, layer: Layer, answer: &str) -> Self {
        Self {
            term: term.into(),
            layer,
            answer: answer.to_string(),
            source: None,
        }
    }

    /// Whether this record carries a sentinel rather than genuine content.
    pub fn is_sentinel(&self) -> bool {
        self.answer == NO_SEARCH_RESULTS
            || self.answer == NO_RELIABLE_ANSWER
            || self.answer == EXTRACTION_FAILED
            || self.answer.contains(NO_CLEAR_ANSWER)
    }
}

/// Accumulated answer records for all four layers of one research run.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ResearchFindings {
    pub primary: Vec<AnswerRecord>,
    pub secondary: Vec<AnswerRecord>,
    pub verification: Vec<AnswerRecord>,
    pub recent: Vec<AnswerRecord>,
}

impl ResearchFindings {
    /// Records for one layer, in term order.
    pub fn records(&self, layer: Layer) -> &[AnswerRecord] {
        match layer {
            Layer::Primary => &self.primary,
            Layer::Secondary => &self.secondary,
            Layer::Verification => &self.verification,
            Layer::Recent => &self.recent,
        }
    }

    /// Replace the records for one layer.
    pub fn set_records(&mut self, layer: Layer, records: Vec<AnswerRecord>) {
        match layer {
            Layer::Primary => self.primary = records,
            Layer::Secondary => self.secondary = records,
            Layer::Verification => self.verification = records,
            Layer::Recent => self.recent = records,
        }
    }

    /// Iterate over all records in layer order.
    pub fn iter_all(&self) -> impl Iterator<Item = &AnswerRecord> {
        self.primary
            .iter()
            .chain(self.secondary.iter())
            .chain(self.verification.iter())
            .chain(self.recent.iter())
    }

    /// Total record count across all layers.
    pub fn total(&self) -> usize {
        Layer::ALL
            .iter()
            .map(|&layer| self.records(layer).len())
            .sum()
    }

    /// Count of layers that produced at least one record.
    pub fn researched_layer_count(&self) -> usize {
        Layer::ALL
            .iter()
            .filter(|&&layer| !self.records(layer).is_empty())
            .count()
    }

    /// Distinct source URLs across all records, in first-seen order.
    pub fn distinct_sources(&self) -> Vec<String> {
        let mut seen = Vec::new();
        for record in self.iter_all() {
            if let Some(source) = &record.source
                && !source.is_empty()
                && !seen.contains(source)
            {
                seen.push(source.clone());
            }
        }
        seen
    }
}
