//! Storage stage: simulated writes to downstream systems
//!
//! Target systems are picked by keyword from the filename and subject. The
//! warehouse is always selected, and at least one core system joins it.

use crate::metrics::MetricTracker;
use crate::types::{RecordShape, StorageOutcome, SystemWriteResult, TargetSystem, TransformedRecord};
use chrono::Utc;
use rand::seq::IndexedRandom;
use rand::Rng;
use serde::Serialize;

/// Default per-write success probability
pub const DEFAULT_SUCCESS_RATE: f64 = 0.995;

/// Writes transformed records to target systems
#[derive(Debug, Clone)]
pub struct StorageStage {
    success_rate: f64,
    metrics: MetricTracker,
    records_stored: u64,
    bytes_stored: u64,
}

/// Storage performance snapshot
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct StorageStats {
    /// Running average processing time (seconds)
    pub avg_processing_time: f64,
    /// Records written so far, summed over systems
    pub records_stored: u64,
    /// Configured success probability
    pub storage_success_rate: f64,
    /// Bytes stored so far
    pub bytes_stored: u64,
}

impl StorageStage {
    /// Create stage with a per-write success probability
    #[inline]
    #[must_use]
    pub fn new(success_rate: f64) -> Self {
        Self {
            success_rate,
            metrics: MetricTracker::new(1.8),
            records_stored: 0,
            bytes_stored: 0,
        }
    }

    /// Store a transformed record
    #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss, clippy::cast_precision_loss)]
    pub fn store<R: Rng>(&mut self, record: &TransformedRecord, rng: &mut R) -> StorageOutcome {
        let processing_time = rng.random_range(1.0..3.0);
        let item = &record.artifact.item;

        let target_systems = select_target_systems(&item.filename, &item.subject, rng);
        let total_records = total_records(&record.shape, rng);

        let storage_results: Vec<SystemWriteResult> = target_systems
            .iter()
            .map(|&system| {
                let latency = system.declared_latency() * rng.random_range(0.8..1.2);
                let success = rng.random::<f64>() < self.success_rate;
                let records_stored = if success {
                    total_records
                } else {
                    (total_records as f64 * rng.random_range(0.5..0.95)).floor() as u64
                };
                SystemWriteResult {
                    system,
                    success,
                    records_stored,
                    latency,
                    timestamp: Utc::now(),
                }
            })
            .collect();

        let overall_success = storage_results.iter().all(|r| r.success);

        self.records_stored += storage_results.iter().map(|r| r.records_stored).sum::<u64>();
        self.bytes_stored += record.file_size;

        // Divisor is this call's write count
        self.metrics
            .record_over(storage_results.len() as u64, processing_time);

        let outcome = StorageOutcome {
            artifact: record.artifact.clone(),
            target_systems,
            storage_results,
            total_records,
            bytes_stored: record.file_size,
            overall_success,
            processing_time,
        };

        if !overall_success {
            tracing::warn!(
                "{} of {} writes failed for {}",
                outcome.failed_writes(),
                outcome.storage_results.len(),
                item.filename
            );
        }

        outcome
    }

    /// Performance snapshot
    #[must_use]
    pub fn stats(&self) -> StorageStats {
        StorageStats {
            avg_processing_time: self.metrics.average(),
            records_stored: self.records_stored,
            storage_success_rate: self.success_rate,
            bytes_stored: self.bytes_stored,
        }
    }
}

impl Default for StorageStage {
    fn default() -> Self {
        Self::new(DEFAULT_SUCCESS_RATE)
    }
}

/// Select target systems by keyword
///
/// The warehouse is always first. Claims, policy and CRM join on keyword
/// hits in the lowercased filename or subject; with no hit, one core system
/// is drawn uniformly.
pub fn select_target_systems<R: Rng>(
    filename: &str,
    subject: &str,
    rng: &mut R,
) -> Vec<TargetSystem> {
    let filename = filename.to_lowercase();
    let subject = subject.to_lowercase();
    let mentions = |keyword: &str| filename.contains(keyword) || subject.contains(keyword);

    let mut systems = vec![TargetSystem::Warehouse];
    if mentions("claim") {
        systems.push(TargetSystem::Claims);
    }
    if mentions("policy") {
        systems.push(TargetSystem::Policy);
    }
    if mentions("customer") || mentions("client") {
        systems.push(TargetSystem::Crm);
    }

    if systems.len() == 1 {
        systems.push(*TargetSystem::CORE.choose(rng).unwrap_or(&TargetSystem::Claims));
    }

    systems
}

/// Records offered to each system
fn total_records<R: Rng>(shape: &RecordShape, rng: &mut R) -> u64 {
    match shape {
        RecordShape::Tabular { record_count, .. } => u64::from(*record_count),
        RecordShape::Hierarchical { object_count, .. } => u64::from(*object_count),
        RecordShape::Document { .. } => rng.random_range(10..=100),
        RecordShape::MultiSheet { .. } | RecordShape::Unknown { .. } => 0,
    }
}
