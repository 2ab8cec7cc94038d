//! Deterministic confidence scoring over research findings.

use super::plan::Layer;
use super::record::ResearchFindings;

/// Answers longer than this many characters count as substantive
/// verification findings.
const SUBSTANTIVE_ANSWER_CHARS: usize = 50;

/// Maximum bonus awarded for substantive verification findings.
const VERIFICATION_BONUS: f64 = 15.0;

/// Compute a confidence percentage in [0, 100] for a research run.
///
/// The base is the share of records carrying genuine (non-sentinel)
/// answers. Substantive verification findings add a bonus of up to 15
/// points. The result is capped at 100 and is exactly 0 when there are no
/// records at all.
pub fn score(findings: &ResearchFindings) -> f64 {
    let total = findings.total();
    if total == 0 {
        return 0.0;
    }

    let successful = findings.iter_all().filter(|r| !r.is_sentinel()).count();
    let base = 100.0 * successful as f64 / total as f64;

    let verification = findings.records(Layer::Verification);
    let substantive = verification
        .iter()
        .filter(|r| r.answer.chars().count() > SUBSTANTIVE_ANSWER_CHARS)
        .count();
    let bonus = VERIFICATION_BONUS * substantive as f64 / verification.len().max(1) as f64;

    (base + bonus).min(100.0)
}
