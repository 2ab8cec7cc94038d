//! Contradiction and consensus analysis over verification-layer records.

use super::record::AnswerRecord;
use crate::llm::{CompletionOptions, LlmClient};
use std::sync::Arc;
use tracing::warn;

/// Returned when the verification layer produced no records. Emitted
/// without any model call.
pub const NO_VERIFICATION_DATA: &str = "No verification data was gathered for this query.";

/// Returned when the analysis request itself fails.
pub const ANALYSIS_UNAVAILABLE: &str = "Verification analysis could not be completed.";

/// Summarizes verification findings into a contradiction/consensus report.
pub struct VerificationAnalyzer {
    llm: Arc<dyn LlmClient>,
    options: CompletionOptions,
}

impl VerificationAnalyzer {
    pub fn new(llm: Arc<dyn LlmClient>) -> Self {
        Self {
            llm,
            options: CompletionOptions {
                temperature: 0.4,
                max_output_tokens: 1024,
            },
        }
    }

    /// Analyze the verification records. Infallible: model failure yields
    /// a fixed message instead of an error.
    pub async fn analyze(&self, records: &[AnswerRecord]) -> String {
        if records.is_empty() {
            return NO_VERIFICATION_DATA.to_string();
        }

        let prompt = Self::build_prompt(records);
        match self.llm.complete(&prompt, &self.options).await {
            Ok(summary) => summary,
            Err(e) => {
                warn!(error = %e, "Verification analysis request failed");
                ANALYSIS_UNAVAILABLE.to_string()
            }
        }
    }

    fn build_prompt(records: &[AnswerRecord]) -> String {
        let mut findings = String::new();
        for record in records {
            findings.push_str(&format!("- {}: {}\n", record.term, record.answer));
        }

        format!(
            "Review these fact-checking findings:\n\
             \n\
             {findings}\
             \n\
             Respond with four labeled sections:\n\
             CONSENSUS: points the findings agree on\n\
             CONTRADICTIONS: points where the findings conflict\n\
             RELIABILITY: how trustworthy the findings appear overall\n\
             GAPS: what remains unverified"
        )
    }
}
