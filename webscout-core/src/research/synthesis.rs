//! Final report synthesis.
//!
//! The model writes the report body; the header and footer (confidence,
//! layer count, source list) are assembled deterministically so they are
//! trustworthy even when the model is not.

use super::plan::Layer;
use super::record::ResearchFindings;
use crate::llm::{CompletionOptions, LlmClient};
use std::sync::Arc;
use tracing::warn;

const REPORT_TITLE: &str = "COMPREHENSIVE RESEARCH REPORT";
const RULE: &str =
    "================================================================================";
const FOOTER_RULE: &str =
    "--------------------------------------------------------------------------------";

/// Fixed body used when the synthesis request fails. The collected
/// findings are appended so the run is still useful.
const SYNTHESIS_FAILED_BODY: &str =
    "The final report could not be generated. The findings below were collected but \
     could not be synthesized.";

/// Produces the final research report from all collected findings.
pub struct AnswerSynthesizer {
    llm: Arc<dyn LlmClient>,
    options: CompletionOptions,
}

impl AnswerSynthesizer {
    pub fn new(llm: Arc<dyn LlmClient>) -> Self {
        Self {
            llm,
            options: CompletionOptions {
                temperature: 0.7,
                max_output_tokens: 2048,
            },
        }
    }

    /// Synthesize the final report. Infallible: model failure yields a
    /// fixed failure body inside the same deterministic frame.
    pub async fn synthesize(
        &self,
        user_query: &str,
        findings: &ResearchFindings,
        verification_summary: &str,
        confidence: f64,
    ) -> String {
        let prompt = Self::build_prompt(user_query, findings, verification_summary);

        let body = match self.llm.complete(&prompt, &self.options).await {
            Ok(text) => text,
            Err(e) => {
                warn!(error = %e, "Synthesis request failed, using fallback report body");
                format!(
                    "{SYNTHESIS_FAILED_BODY}\n\n{}",
                    Self::findings_bullets(findings)
                )
            }
        };

        Self::wrap_report(user_query, &body, findings, confidence)
    }

    fn build_prompt(
        user_query: &str,
        findings: &ResearchFindings,
        verification_summary: &str,
    ) -> String {
        let mut prompt = format!(
            "Write a research report answering the query: {user_query}\n\nFindings:\n\n"
        );
        prompt.push_str(&Self::findings_bullets(findings));
        prompt.push_str(&format!(
            "\nVerification analysis:\n{verification_summary}\n\n\
             Structure the report as:\n\
             1. Executive summary\n\
             2. Detailed findings\n"
        ));
        let mut section = 3;
        if !findings.records(Layer::Recent).is_empty() {
            prompt.push_str(&format!("{section}. Recent developments\n"));
            section += 1;
        }
        prompt.push_str(&format!(
            "{section}. Verification results\n{}. Limitations\n",
            section + 1
        ));
        prompt
    }

    /// One bullet per record, grouped by layer in research order.
    fn findings_bullets(findings: &ResearchFindings) -> String {
        let mut out = String::new();
        for layer in Layer::ALL {
            let records = findings.records(layer);
            if records.is_empty() {
                continue;
            }
            out.push_str(&format!("{} FINDINGS:\n", layer.as_str().to_uppercase()));
            for record in records {
                out.push_str(&format!("- {}: {}\n", record.term, record.answer));
            }
            out.push('\n');
        }
        out
    }

    /// Deterministic frame around the report body.
    fn wrap_report(
        user_query: &str,
        body: &str,
        findings: &ResearchFindings,
        confidence: f64,
    ) -> String {
        let sources = findings.distinct_sources();

        let mut report = String::new();
        report.push_str(RULE);
        report.push('\n');
        report.push_str(REPORT_TITLE);
        report.push('\n');
        report.push_str(&format!("Query: {user_query}\n"));
        report.push_str(RULE);
        report.push_str("\n\n");
        report.push_str(body.trim());
        report.push_str("\n\n");
        report.push_str(FOOTER_RULE);
        report.push('\n');
        report.push_str(&format!("Confidence score: {confidence:.1}%\n"));
        report.push_str(&format!(
            "Layers researched: {}\n",
            findings.researched_layer_count()
        ));
        report.push_str(&format!("Distinct sources: {}\n", sources.len()));
        if sources.is_empty() {
            report.push_str("Sources: (none collected)\n");
        } else {
            report.push_str("Sources:\n");
            for source in &sources {
                report.push_str(&format!("  - {source}\n"));
            }
        }
        report.push_str(FOOTER_RULE);
        report
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::LlmError;
    use crate::llm::MockLlmClient;
    use crate::research::record::AnswerRecord;

    fn sample_findings() -> ResearchFindings {
        let mut findings = ResearchFindings::default();
        findings.set_records(
            Layer::Primary,
            vec![AnswerRecord::new(
                "instagram founders",
                Layer::Primary,
                "Kevin Systrom and Mike Krieger",
                "https://en.wikipedia.org/wiki/Instagram",
            )],
        );
        findings
    }

    #[tokio::test]
    async fn test_report_frame_carries_confidence_and_sources() {
        let llm = Arc::new(MockLlmClient::with_response("Executive summary: founded 2010."));
        let synthesizer = AnswerSynthesizer::new(llm);

        let report = synthesizer
            .synthesize("Who founded Instagram", &sample_findings(), "no issues", 100.0)
            .await;

        assert!(report.contains(REPORT_TITLE));
        assert!(report.contains("Query: Who founded Instagram"));
        assert!(report.contains("Executive summary: founded 2010."));
        assert!(report.contains("Confidence score: 100.0%"));
        assert!(report.contains("Layers researched: 1"));
        assert!(report.contains("Distinct sources: 1"));
        assert!(report.contains("  - https://en.wikipedia.org/wiki/Instagram"));
    }

    #[tokio::test]
    async fn test_no_sources_placeholder() {
        let llm = Arc::new(MockLlmClient::with_response("body"));
        let synthesizer = AnswerSynthesizer::new(llm);

        let report = synthesizer
            .synthesize("q", &ResearchFindings::default(), "none", 0.0)
            .await;
        assert!(report.contains("Sources: (none collected)"));
        assert!(report.contains("Confidence score: 0.0%"));
    }

    #[tokio::test]
    async fn test_model_failure_yields_fixed_body_in_frame() {
        let llm = Arc::new(MockLlmClient::new());
        llm.queue_error(LlmError::Connection {
            message: "unreachable".into(),
        });
        let synthesizer = AnswerSynthesizer::new(llm);

        let report = synthesizer
            .synthesize("q", &sample_findings(), "summary", 42.0)
            .await;
        assert!(report.contains(SYNTHESIS_FAILED_BODY));
        // The raw findings are still present
        assert!(report.contains("Kevin Systrom and Mike Krieger"));
        assert!(report.contains("Confidence score: 42.0%"));
    }

    #[tokio::test]
    async fn test_prompt_embeds_query_findings_and_verification() {
        let llm = Arc::new(MockLlmClient::with_response("body"));
        let synthesizer = AnswerSynthesizer::new(llm.clone());

        synthesizer
            .synthesize(
                "Who founded Instagram",
                &sample_findings(),
                "CONSENSUS: agreement",
                80.0,
            )
            .await;

        let prompt = &llm.prompts()[0];
        assert!(prompt.contains("Who founded Instagram"));
        assert!(prompt.contains("PRIMARY FINDINGS:"));
        assert!(prompt.contains("- instagram founders: Kevin Systrom and Mike Krieger"));
        assert!(prompt.contains("CONSENSUS: agreement"));
        // No recent records, so no recent-developments section is requested
        assert!(!prompt.contains("Recent developments"));
    }

    #[tokio::test]
    async fn test_prompt_requests_recent_section_when_present() {
        let llm = Arc::new(MockLlmClient::with_response("body"));
        let synthesizer = AnswerSynthesizer::new(llm.clone());

        let mut findings = sample_findings();
        findings.set_records(
            Layer::Recent,
            vec![AnswerRecord::new(
                "instagram news",
                Layer::Recent,
                "New features shipped",
                "https://news.example",
            )],
        );

        synthesizer.synthesize("q", &findings, "none", 90.0).await;
        let prompt = &llm.prompts()[0];
        assert!(prompt.contains("Recent developments"));
        assert!(prompt.contains("RECENT FINDINGS:"));
    }
}
