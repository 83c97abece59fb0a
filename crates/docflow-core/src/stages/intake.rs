//! Intake stage: simulated email receipt

use crate::config::DEFAULT_STORAGE_PREFIX;
use crate::error::PipelineError;
use crate::metrics::MetricTracker;
use crate::types::{
    Complexity, FileType, ReceivedArtifact, WorkItem, WorkItemDescriptor, WorkItemId,
};
use chrono::Utc;
use rand::Rng;
use serde::Serialize;

/// Receives work items and records them as artifacts
#[derive(Debug, Clone)]
pub struct IntakeStage {
    storage_prefix: String,
    metrics: MetricTracker,
}

/// Intake performance snapshot
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct IntakeStats {
    /// Running average processing time (seconds)
    pub avg_processing_time: f64,
    /// Advertised success rate
    pub success_rate: f64,
    /// Items received so far
    pub emails_processed: u64,
}

impl IntakeStage {
    /// Create stage with a storage path prefix
    #[inline]
    #[must_use]
    pub fn new(storage_prefix: impl Into<String>) -> Self {
        Self {
            storage_prefix: storage_prefix.into(),
            metrics: MetricTracker::new(1.2),
        }
    }

    /// Receive a work item
    ///
    /// # Errors
    /// - `PipelineError::MissingField` if a required field is absent
    /// - `PipelineError::InvalidField` if the complexity tier is unrecognized
    pub fn receive<R: Rng>(
        &mut self,
        id: &WorkItemId,
        descriptor: &WorkItemDescriptor,
        rng: &mut R,
    ) -> Result<ReceivedArtifact, PipelineError> {
        let item = normalize(id, descriptor)?;

        let processing_time = rng.random_range(0.8..2.0);
        self.metrics.record(processing_time);

        tracing::debug!(
            "Received {} from {} ({:.2}s)",
            item.filename,
            item.sender,
            processing_time
        );

        Ok(ReceivedArtifact {
            storage_path: format!("{}{}", self.storage_prefix, item.filename),
            received_at: Utc::now(),
            processing_time,
            item,
        })
    }

    /// Performance snapshot
    #[must_use]
    pub fn stats(&self) -> IntakeStats {
        IntakeStats {
            avg_processing_time: self.metrics.average(),
            success_rate: 0.99,
            emails_processed: self.metrics.count(),
        }
    }
}

impl Default for IntakeStage {
    fn default() -> Self {
        Self::new(DEFAULT_STORAGE_PREFIX)
    }
}

/// Turn a descriptor into a work item, checking required fields
fn normalize(id: &WorkItemId, descriptor: &WorkItemDescriptor) -> Result<WorkItem, PipelineError> {
    fn required<'a>(
        value: Option<&'a String>,
        field: &'static str,
    ) -> Result<&'a String, PipelineError> {
        value.ok_or_else(|| PipelineError::missing(field))
    }

    let filename = required(descriptor.filename.as_ref(), "filename")?;
    let file_type = required(descriptor.file_type.as_ref(), "file_type")?;
    let sender = required(descriptor.sender.as_ref(), "sender")?;
    let sender_email = required(descriptor.sender_email.as_ref(), "sender_email")?;
    let subject = required(descriptor.subject.as_ref(), "subject")?;
    let complexity = required(descriptor.complexity.as_ref(), "complexity")?;

    let complexity = complexity
        .parse::<Complexity>()
        .map_err(|value| PipelineError::InvalidField {
            field: "complexity",
            value,
        })?;

    Ok(WorkItem {
        id: id.clone(),
        filename: filename.clone(),
        file_type: FileType::parse(file_type),
        sender: sender.clone(),
        sender_email: sender_email.clone(),
        subject: subject.clone(),
        body: descriptor.email_body.clone().unwrap_or_default(),
        complexity,
    })
}
