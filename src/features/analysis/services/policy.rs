//! Decides whether an analysis is usable evidence of damage.

use crate::features::analysis::models::{AnalysisResult, Severity};
use crate::shared::constants::REJECTION_ADVISORY;

/// A result is unusable when the model saw no damage, or when the detector
/// found nothing at all regardless of what the model said.
pub fn is_acceptable(result: &AnalysisResult) -> bool {
    result.severity != Severity::NoDamage && !result.detections.is_empty()
}

/// Advisory to show the citizen when the result is rejected
pub fn rejection_advisory(result: &AnalysisResult) -> Option<&'static str> {
    (!is_acceptable(result)).then_some(REJECTION_ADVISORY)
}
