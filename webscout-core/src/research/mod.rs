//! Multi-layer web research pipeline.
//!
//! One user query flows through: query planning (layered search terms) →
//! per-layer research (search, fetch, extract with candidate fallback) →
//! verification analysis → confidence scoring → report synthesis. The
//! orchestrator sequences the stages and owns the browser session
//! lifecycle.

pub mod confidence;
pub mod layer;
pub mod orchestrator;
pub mod plan;
pub mod planner;
pub mod record;
pub mod synthesis;
pub mod verification;

pub use layer::LayerResearcher;
pub use orchestrator::{PipelinePhase, ResearchOrchestrator};
pub use plan::{Layer, SearchPlan};
pub use planner::QueryPlanner;
pub use record::{AnswerRecord, ResearchFindings};
pub use synthesis::AnswerSynthesizer;
pub use verification::VerificationAnalyzer;
