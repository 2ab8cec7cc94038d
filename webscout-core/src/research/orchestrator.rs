//! Pipeline orchestration: plan, research, verify, score, synthesize.

use super::confidence;
use super::layer::LayerResearcher;
use super::plan::Layer;
use super::planner::QueryPlanner;
use super::record::ResearchFindings;
use super::synthesis::AnswerSynthesizer;
use super::verification::VerificationAnalyzer;
use crate::browser::ContentFetcher;
use crate::config::ResearchConfig;
use crate::error::WebscoutError;
use crate::llm::LlmClient;
use std::fmt;
use std::sync::{Arc, Mutex};
use tracing::{debug, info, warn};

/// Returned when the browser session cannot be launched. No research
/// is attempted and no teardown runs.
pub const BROWSER_START_FAILED: &str =
    "Research could not start: the browser session failed to launch.";

/// Where the pipeline currently is. Observable from other tasks while a
/// run is in flight.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PipelinePhase {
    Idle,
    BrowserStarting,
    Planning,
    Researching(Layer),
    Verifying,
    Scoring,
    Synthesizing,
    Done,
    Failed,
}

impl fmt::Display for PipelinePhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Idle => write!(f, "idle"),
            Self::BrowserStarting => write!(f, "starting browser"),
            Self::Planning => write!(f, "planning"),
            Self::Researching(layer) => write!(f, "researching {layer}"),
            Self::Verifying => write!(f, "verifying"),
            Self::Scoring => write!(f, "scoring"),
            Self::Synthesizing => write!(f, "synthesizing"),
            Self::Done => write!(f, "done"),
            Self::Failed => write!(f, "failed"),
        }
    }
}

/// Drives a full research run end to end.
///
/// `run` never returns an error: every failure mode degrades to a
/// human-readable message. The browser session is closed exactly once
/// after a successful start, whether the pipeline succeeds or not.
pub struct ResearchOrchestrator {
    fetcher: Arc<dyn ContentFetcher>,
    planner: QueryPlanner,
    researcher: LayerResearcher,
    analyzer: VerificationAnalyzer,
    synthesizer: AnswerSynthesizer,
    phase: Mutex<PipelinePhase>,
}

impl ResearchOrchestrator {
    pub fn new(
        fetcher: Arc<dyn ContentFetcher>,
        llm: Arc<dyn LlmClient>,
        config: ResearchConfig,
    ) -> Self {
        Self {
            fetcher: fetcher.clone(),
            planner: QueryPlanner::new(llm.clone()),
            researcher: LayerResearcher::new(fetcher, llm.clone(), config),
            analyzer: VerificationAnalyzer::new(llm.clone()),
            synthesizer: AnswerSynthesizer::new(llm),
            phase: Mutex::new(PipelinePhase::Idle),
        }
    }

    /// The current pipeline phase.
    pub fn phase(&self) -> PipelinePhase {
        *self.phase.lock().unwrap()
    }

    fn transition(&self, next: PipelinePhase) {
        debug!(phase = %next, "Pipeline phase");
        *self.phase.lock().unwrap() = next;
    }

    /// Run the full pipeline for one query and return the report text.
    pub async fn run(&self, user_query: &str) -> String {
        info!(query = user_query, "Starting research run");

        self.transition(PipelinePhase::BrowserStarting);
        if let Err(e) = self.fetcher.start_session().await {
            warn!(error = %e, "Browser session failed to start");
            self.transition(PipelinePhase::Failed);
            return BROWSER_START_FAILED.to_string();
        }

        let outcome = self.run_pipeline(user_query).await;

        // The session launched, so it is torn down no matter how the
        // pipeline itself fared.
        self.fetcher.close_session().await;

        match outcome {
            Ok(report) => {
                self.transition(PipelinePhase::Done);
                report
            }
            Err(e) => {
                warn!(error = %e, "Research pipeline failed");
                self.transition(PipelinePhase::Failed);
                format!("Sorry, research failed: {e}")
            }
        }
    }

    async fn run_pipeline(&self, user_query: &str) -> Result<String, WebscoutError> {
        self.transition(PipelinePhase::Planning);
        let plan = self.planner.plan(user_query).await;
        info!(terms = plan.total_terms(), "Search plan ready");

        let mut findings = ResearchFindings::default();
        for layer in Layer::ALL {
            let terms = plan.terms(layer);
            if terms.is_empty() {
                debug!(%layer, "No terms planned, skipping layer");
                continue;
            }
            self.transition(PipelinePhase::Researching(layer));
            let records = self.researcher.research(terms, layer).await;
            findings.set_records(layer, records);
        }

        self.transition(PipelinePhase::Verifying);
        let verification_summary = self
            .analyzer
            .analyze(findings.records(Layer::Verification))
            .await;

        self.transition(PipelinePhase::Scoring);
        let confidence = confidence::score(&findings);
        info!(confidence, total_records = findings.total(), "Findings scored");

        self.transition(PipelinePhase::Synthesizing);
        let report = self
            .synthesizer
            .synthesize(user_query, &findings, &verification_summary, confidence)
            .await;

        Ok(report)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::browser::{MockContentFetcher, SearchResult};
    use crate::llm::MockLlmClient;
    use pretty_assertions::assert_eq;

    fn searcher() -> (Arc<MockContentFetcher>, Arc<MockLlmClient>) {
        (Arc::new(MockContentFetcher::new()), Arc::new(MockLlmClient::new()))
    }

    #[tokio::test]
    async fn test_failed_browser_start_skips_everything() {
        let (fetcher, llm) = searcher();
        fetcher.set_start_error(crate::error::BrowserError::SessionStart {
            message: "no chrome binary".into(),
        });
        let orchestrator =
            ResearchOrchestrator::new(fetcher.clone(), llm.clone(), ResearchConfig::default());

        let report = orchestrator.run("any query").await;

        assert_eq!(report, BROWSER_START_FAILED);
        assert_eq!(orchestrator.phase(), PipelinePhase::Failed);
        assert_eq!(llm.call_count(), 0);
        assert_eq!(fetcher.call_count("search"), 0);
        // No teardown after a failed start
        assert!(!fetcher.is_closed());
    }

    #[tokio::test]
    async fn test_session_closed_once_after_successful_start() {
        let (fetcher, llm) = searcher();
        llm.queue_response("PRIMARY: a\nSECONDARY:\nVERIFICATION:\nRECENT:");
        // Extraction never runs (no search results), synthesis still does
        llm.queue_response("report body");
        let orchestrator =
            ResearchOrchestrator::new(fetcher.clone(), llm, ResearchConfig::default());

        orchestrator.run("query").await;

        assert!(fetcher.is_closed());
        assert_eq!(orchestrator.phase(), PipelinePhase::Done);
    }

    #[tokio::test]
    async fn test_layers_without_terms_are_skipped() {
        let (fetcher, llm) = searcher();
        llm.queue_response("PRIMARY: only term\nSECONDARY:\nVERIFICATION:\nRECENT:");
        llm.queue_response("report body");
        fetcher.set_search_results(
            "only term",
            vec![SearchResult {
                title: "t".into(),
                url: "https://example.com/a".into(),
                rank: 1,
            }],
        );
        let orchestrator =
            ResearchOrchestrator::new(fetcher.clone(), llm, ResearchConfig::default());

        orchestrator.run("query").await;

        // One search for the single planned term; empty layers never search
        assert_eq!(fetcher.call_count("search"), 1);
    }

    #[tokio::test]
    async fn test_full_run_produces_framed_report() {
        let (fetcher, llm) = searcher();
        llm.queue_response("PRIMARY: instagram founders\nSECONDARY:\nVERIFICATION:\nRECENT:");
        llm.queue_response("Kevin Systrom and Mike Krieger");
        llm.queue_response("Instagram was founded by Kevin Systrom and Mike Krieger.");
        fetcher.set_search_results(
            "instagram founders",
            vec![SearchResult {
                title: "Instagram - Wikipedia".into(),
                url: "https://en.wikipedia.org/wiki/Instagram".into(),
                rank: 1,
            }],
        );
        fetcher.set_page(
            "https://en.wikipedia.org/wiki/Instagram",
            "Instagram was created by Kevin Systrom and Mike Krieger in 2010.",
        );
        let orchestrator =
            ResearchOrchestrator::new(fetcher, llm, ResearchConfig::default());

        let report = orchestrator.run("Who founded Instagram").await;

        assert!(report.contains("COMPREHENSIVE RESEARCH REPORT"));
        assert!(report.contains("Kevin Systrom and Mike Krieger"));
        assert!(report.contains("Confidence score: 100.0%"));
        assert_eq!(orchestrator.phase(), PipelinePhase::Done);
    }

    #[test]
    fn test_phase_display() {
        assert_eq!(PipelinePhase::Idle.to_string(), "idle");
        assert_eq!(
            PipelinePhase::Researching(Layer::Verification).to_string(),
            "researching verification"
        );
        assert_eq!(PipelinePhase::Done.to_string(), "done");
    }
}
