//! Validation stage: probabilistic issue detection
//!
//! The clarification decision is drawn once per artifact against a
//! threshold keyed to the declared complexity. When triggered, one to three
//! distinct issue categories are sampled without replacement.

use crate::config::ClarificationThresholds;
use crate::metrics::MetricTracker;
use crate::types::{Issue, IssueCategory, ReceivedArtifact, Severity, ValidationResult};
use rand::seq::{index, IndexedRandom};
use rand::Rng;
use serde::Serialize;

/// Upper bound on issues raised for one artifact
pub const MAX_ISSUES: usize = 3;

/// Validates received artifacts
#[derive(Debug, Clone)]
pub struct ValidationStage {
    thresholds: ClarificationThresholds,
    metrics: MetricTracker,
    issues_detected: u64,
}

/// Validation performance snapshot
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct ValidationStats {
    /// Running average processing time (seconds)
    pub avg_processing_time: f64,
    /// Artifacts that required clarification
    pub issues_detected: u64,
    /// Artifacts validated so far
    pub files_validated: u64,
    /// Advertised accuracy
    pub accuracy: f64,
}

impl ValidationStage {
    /// Create stage with clarification thresholds
    #[inline]
    #[must_use]
    pub fn new(thresholds: ClarificationThresholds) -> Self {
        Self {
            thresholds,
            metrics: MetricTracker::new(1.5),
            issues_detected: 0,
        }
    }

    /// Validate an artifact
    pub fn validate<R: Rng>(
        &mut self,
        artifact: &ReceivedArtifact,
        rng: &mut R,
    ) -> ValidationResult {
        let processing_time = rng.random_range(1.0..3.0);
        self.metrics.record(processing_time);

        let threshold = self.thresholds.for_complexity(artifact.item.complexity);
        let needs_clarification = rng.random::<f64>() < threshold;

        let issues = if needs_clarification {
            self.issues_detected += 1;
            sample_issues(rng)
        } else {
            Vec::new()
        };

        tracing::debug!(
            "Validated {}: {} issue(s), threshold {:.2}",
            artifact.item.filename,
            issues.len(),
            threshold
        );

        ValidationResult {
            artifact: artifact.clone(),
            is_valid: true,
            needs_clarification,
            issues,
            processing_time,
        }
    }

    /// Performance snapshot
    #[must_use]
    pub fn stats(&self) -> ValidationStats {
        ValidationStats {
            avg_processing_time: self.metrics.average(),
            issues_detected: self.issues_detected,
            files_validated: self.metrics.count(),
            accuracy: 0.98,
        }
    }
}

impl Default for ValidationStage {
    fn default() -> Self {
        Self::new(ClarificationThresholds::default())
    }
}

/// Sample 1..=3 distinct categories, each with a uniform severity
fn sample_issues<R: Rng>(rng: &mut R) -> Vec<Issue> {
    let count = rng.random_range(1..=MAX_ISSUES);

    index::sample(rng, IssueCategory::ALL.len(), count)
        .into_iter()
        .map(|i| {
            let category = IssueCategory::ALL[i];
            let severity = *Severity::ALL.choose(rng).unwrap_or(&Severity::Medium);
            Issue {
                category,
                severity,
                description: format!("Found {} in the file", category.label().to_lowercase()),
            }
        })
        .collect()
}
