//! Query planning: one user query becomes a layered search plan.

use super::plan::{Layer, SearchPlan};
use crate::error::LlmError;
use crate::llm::{CompletionOptions, LlmClient};
use std::sync::Arc;
use tracing::{debug, warn};

/// Turns a user query into a `SearchPlan` via the language model.
///
/// Never fails: any model or parsing problem degrades to
/// `SearchPlan::fallback`.
pub struct QueryPlanner {
    llm: Arc<dyn LlmClient>,
    options: CompletionOptions,
}

impl QueryPlanner {
    pub fn new(llm: Arc<dyn LlmClient>) -> Self {
        Self {
            llm,
            // Planning wants short, predictable output
            options: CompletionOptions {
                temperature: 0.3,
                max_output_tokens: 512,
            },
        }
    }

    /// Produce a search plan for the query. Infallible: the caller always
    /// receives a valid plan.
    pub async fn plan(&self, user_query: &str) -> SearchPlan {
        let prompt = Self::build_prompt(user_query);

        match self.llm.complete(&prompt, &self.options).await {
            Ok(text) => match Self::parse_plan(&text) {
                Ok(plan) => {
                    debug!(terms = plan.total_terms(), "Search plan ready");
                    plan
                }
                Err(e) => {
                    // Distinct from a transport failure: the model answered
                    // but not in the requested shape.
                    warn!(error = %e, "Planner response was unparsable, using fallback plan");
                    SearchPlan::fallback(user_query)
                }
            },
            Err(e) => {
                warn!(error = %e, "Planning request failed, using fallback plan");
                SearchPlan::fallback(user_query)
            }
        }
    }

    fn build_prompt(user_query: &str) -> String {
        format!(
            "Break down this research query into specific search terms.\n\
             \n\
             Query: {user_query}\n\
             \n\
             Respond with exactly four lines:\n\
             PRIMARY: comma-separated terms for the core facts\n\
             SECONDARY: comma-separated terms for background and context\n\
             VERIFICATION: comma-separated terms for fact-checking the claims\n\
             RECENT: comma-separated terms for the latest developments\n\
             \n\
             List at most 3 terms per line. Plain text only."
        )
    }

    /// Parse the four labeled lines. A line whose label is missing yields
    /// an empty layer; a response with no recognizable label at all is an
    /// `UnparsableResponse`.
    fn parse_plan(text: &str) -> Result<SearchPlan, LlmError> {
        let mut plan = SearchPlan::default();
        let mut any_label = false;

        for line in text.lines() {
            let line = line.trim();
            for layer in Layer::ALL {
                let label = match layer {
                    Layer::Primary => "PRIMARY:",
                    Layer::Secondary => "SECONDARY:",
                    Layer::Verification => "VERIFICATION:",
                    Layer::Recent => "RECENT:",
                };
                let matches = line
                    .get(..label.len())
                    .is_some_and(|prefix| prefix.eq_ignore_ascii_case(label));
                if matches {
                    any_label = true;
                    let terms = line[label.len()..]
                        .split(',')
                        .map(str::trim)
                        .filter(|t| !t.is_empty())
                        .map(str::to_string);
                    plan.terms_mut(layer).extend(terms);
                    break;
                }
            }
        }

        if !any_label {
            return Err(LlmError::UnparsableResponse {
                message: "no layer labels found in planning response".to_string(),
            });
        }
        Ok(plan)
    }
}
