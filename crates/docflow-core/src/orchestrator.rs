//! Pipeline orchestrator
//!
//! Drives one selected work item at a time through:
//! - Intake
//! - Validation
//! - Clarification (only when validation flags the item)
//! - Transformation
//! - Storage
//!
//! One log entry is appended per executed stage. After the item finishes
//! (or fails) the next not-complete id is popped from the queue.

use crate::catalog::WorkCatalog;
use crate::config::PipelineConfig;
use crate::error::PipelineError;
use crate::stages::{
    ClarificationStage, ClarificationStats, IntakeStage, IntakeStats, StageKind, StorageStage,
    StorageStats, TransformationStage, TransformationStats, ValidationStage, ValidationStats,
};
use crate::state::{AgentLogEntry, ItemStatus, LogStatus, PipelineRun, PipelineState};
use crate::types::WorkItemId;
use rand::rngs::StdRng;
use rand::SeedableRng;
use serde::Serialize;

/// What a single tick did
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TickOutcome {
    /// Nothing was selected
    Idle,
    /// Selected item was already complete; nothing ran
    Skipped(WorkItemId),
    /// Selected item ran through every stage
    Completed(WorkItemId),
}

/// Result of draining the queue
#[derive(Debug, Default)]
pub struct RunReport {
    /// Items that completed, in order
    pub completed: Vec<WorkItemId>,
    /// Items skipped because they were already complete
    pub skipped: Vec<WorkItemId>,
    /// Items that failed, with the stage error
    pub failed: Vec<(WorkItemId, PipelineError)>,
}

impl RunReport {
    /// Check if every processed item completed
    #[inline]
    #[must_use]
    pub fn is_clean(&self) -> bool {
        self.failed.is_empty()
    }
}

/// Stats for every stage
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct PipelineStats {
    /// Intake stats
    pub intake: IntakeStats,
    /// Validation stats
    pub validation: ValidationStats,
    /// Clarification stats
    pub clarification: ClarificationStats,
    /// Transformation stats
    pub transformation: TransformationStats,
    /// Storage stats
    pub storage: StorageStats,
}

/// The pipeline orchestrator
///
/// Owns the stages, their metrics and the RNG; session state is passed in.
#[derive(Debug)]
pub struct PipelineOrchestrator<C> {
    /// Configuration
    config: PipelineConfig,
    /// Work-item catalog
    catalog: C,
    /// Shared RNG for every stage
    rng: StdRng,
    intake: IntakeStage,
    validation: ValidationStage,
    clarification: ClarificationStage,
    transformation: TransformationStage,
    storage: StorageStage,
}

impl<C: WorkCatalog> PipelineOrchestrator<C> {
    /// Create orchestrator
    ///
    /// Seeds the RNG from `config.seed`, or from the OS when unset.
    #[must_use]
    pub fn new(config: PipelineConfig, catalog: C) -> Self {
        let rng = config
            .seed
            .map_or_else(StdRng::from_os_rng, StdRng::seed_from_u64);

        Self {
            intake: IntakeStage::new(config.storage_path_prefix.clone()),
            validation: ValidationStage::new(config.clarification),
            clarification: ClarificationStage::new(),
            transformation: TransformationStage::new(),
            storage: StorageStage::new(config.storage_success_rate),
            config,
            catalog,
            rng,
        }
    }

    /// Get configuration
    #[inline]
    #[must_use]
    pub fn config(&self) -> &PipelineConfig {
        &self.config
    }

    /// Get catalog
    #[inline]
    #[must_use]
    pub fn catalog(&self) -> &C {
        &self.catalog
    }

    /// Run the selected item, if any, then advance the queue
    ///
    /// # Errors
    /// Returns `PipelineError::ItemFailed` if a stage failed. The item is
    /// marked failed and the queue has already advanced.
    pub async fn tick(&mut self, state: &mut PipelineState) -> Result<TickOutcome, PipelineError> {
        let Some(id) = state.selected().cloned() else {
            return Ok(TickOutcome::Idle);
        };

        if state.status(&id).is_complete() {
            tracing::debug!("{} already complete, skipping", id);
            state.advance_selection();
            return Ok(TickOutcome::Skipped(id));
        }

        match self.process(&id, state).await {
            Ok(()) => {
                state.advance_selection();
                Ok(TickOutcome::Completed(id))
            }
            Err(e) => {
                tracing::warn!("Work item {} failed: {}", id, e);
                if state.status(&id) == ItemStatus::Processing {
                    state.transition(&id, ItemStatus::Failed)?;
                }
                state.advance_selection();
                Err(PipelineError::ItemFailed {
                    id,
                    source: Box::new(e),
                })
            }
        }
    }

    /// Tick until nothing is selected and the queue is empty
    ///
    /// Item failures are collected in the report; the run continues.
    ///
    /// # Errors
    /// Returns any error that is not confined to a single item.
    pub async fn run_until_idle(
        &mut self,
        state: &mut PipelineState,
    ) -> Result<RunReport, PipelineError> {
        let mut report = RunReport::default();

        loop {
            match self.tick(state).await {
                Ok(TickOutcome::Idle) => break,
                Ok(TickOutcome::Skipped(id)) => report.skipped.push(id),
                Ok(TickOutcome::Completed(id)) => report.completed.push(id),
                Err(PipelineError::ItemFailed { id, source }) => report.failed.push((id, *source)),
                Err(e) => return Err(e),
            }
        }

        tracing::info!(
            "Run finished: {} completed, {} failed, {} skipped",
            report.completed.len(),
            report.failed.len(),
            report.skipped.len()
        );
        Ok(report)
    }

    /// Snapshot of every stage's stats
    #[must_use]
    pub fn stats(&self) -> PipelineStats {
        PipelineStats {
            intake: self.intake.stats(),
            validation: self.validation.stats(),
            clarification: self.clarification.stats(),
            transformation: self.transformation.stats(),
            storage: self.storage.stats(),
        }
    }

    /// Run every stage for one item
    async fn process(
        &mut self,
        id: &WorkItemId,
        state: &mut PipelineState,
    ) -> Result<(), PipelineError> {
        // A dropped tick can leave the item mid-flight
        if state.status(id) != ItemStatus::Processing {
            state.transition(id, ItemStatus::Processing)?;
        }
        tracing::info!("Processing work item {}", id);

        let descriptor = self
            .catalog
            .get(id)
            .ok_or_else(|| PipelineError::UnknownWorkItem(id.clone()))?;

        let artifact = self.intake.receive(id, &descriptor, &mut self.rng)?;
        state.push_log(AgentLogEntry::new(
            id.clone(),
            StageKind::Intake,
            format!(
                "Received email from {} with subject '{}'",
                artifact.item.sender, artifact.item.subject
            ),
            LogStatus::Complete,
            artifact.processing_time,
        ));
        let mut total_time = artifact.processing_time;
        self.pause().await;

        let validation = self.validation.validate(&artifact, &mut self.rng);
        state.push_log(AgentLogEntry::new(
            id.clone(),
            StageKind::Validation,
            format!(
                "Validated {}: {} issue(s) found",
                artifact.item.filename,
                validation.issues.len()
            ),
            LogStatus::Complete,
            validation.processing_time,
        ));
        total_time += validation.processing_time;
        self.pause().await;

        let questions = if validation.needs_clarification {
            let (questions, duration) = self
                .clarification
                .generate_timed(&validation, &mut self.rng);
            state.push_log(AgentLogEntry::new(
                id.clone(),
                StageKind::Clarification,
                format!("Generated {} questions about the file", questions.len()),
                LogStatus::Pending,
                duration,
            ));
            state.push_clarification(id, questions.clone());
            total_time += duration;
            self.pause().await;
            questions
        } else {
            Vec::new()
        };

        let transformed = self
            .transformation
            .transform(&artifact, &validation, &mut self.rng);
        state.push_log(AgentLogEntry::new(
            id.clone(),
            StageKind::Transformation,
            format!(
                "Transformed {} into {} format",
                artifact.item.filename,
                transformed.data_format()
            ),
            LogStatus::Complete,
            transformed.processing_time,
        ));
        total_time += transformed.processing_time;
        self.pause().await;

        let storage = self.storage.store(&transformed, &mut self.rng);
        let action = if storage.overall_success {
            "Data uploaded successfully in common format".to_string()
        } else {
            format!(
                "Data uploaded with {} failed write(s)",
                storage.failed_writes()
            )
        };
        state.push_log(AgentLogEntry::new(
            id.clone(),
            StageKind::Storage,
            action,
            LogStatus::Complete,
            storage.processing_time,
        ));
        total_time += storage.processing_time;

        state.transition(id, ItemStatus::Complete)?;
        state.push_run(PipelineRun {
            artifact,
            validation,
            questions,
            transformed,
            storage,
            processing_time: total_time,
        });

        tracing::info!("Work item {} complete ({:.2}s simulated)", id, total_time);
        Ok(())
    }

    /// Artificial delay between stages
    async fn pause(&self) {
        let delay = self.config.stage_delay();
        if !delay.is_zero() {
            tokio::time::sleep(delay).await;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::MockWorkCatalog;
    use crate::config::ClarificationThresholds;
    use crate::types::WorkItemDescriptor;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    fn descriptor() -> WorkItemDescriptor {
        WorkItemDescriptor::new(
            "claims_data_A100.csv",
            "csv",
            "Acme Insurance",
            "data@acmeinsurance.com",
            "Monthly Claims Data",
            "low",
        )
    }

    fn config(threshold: f64) -> PipelineConfig {
        PipelineConfig::new()
            .with_seed(7)
            .with_clarification(ClarificationThresholds::uniform(threshold))
    }

    fn catalog_with_descriptor() -> MockWorkCatalog {
        let mut catalog = MockWorkCatalog::new();
        catalog.expect_get().returning(|_| Some(descriptor()));
        catalog
    }

    #[tokio::test]
    async fn tick_without_selection_is_idle() {
        let mut orchestrator = PipelineOrchestrator::new(config(0.0), MockWorkCatalog::new());
        let mut state = PipelineState::new();

        let outcome = orchestrator.tick(&mut state).await.unwrap();
        assert_eq!(outcome, TickOutcome::Idle);
    }

    #[tokio::test]
    async fn clean_item_logs_four_stages() {
        let mut orchestrator = PipelineOrchestrator::new(config(0.0), catalog_with_descriptor());
        let mut state = PipelineState::new();
        let id = WorkItemId::from("example_1");
        state.select_item(id.clone());

        let outcome = orchestrator.tick(&mut state).await.unwrap();

        assert_eq!(outcome, TickOutcome::Completed(id.clone()));
        assert_eq!(state.status(&id), ItemStatus::Complete);
        let stages: Vec<_> = state.logs_for(&id).map(|e| e.stage).collect();
        assert_eq!(
            stages,
            vec![
                StageKind::Intake,
                StageKind::Validation,
                StageKind::Transformation,
                StageKind::Storage
            ]
        );
        assert_eq!(
            state.logs()[0].action,
            "Received email from Acme Insurance with subject 'Monthly Claims Data'"
        );
        assert!(state.clarifications().is_empty());
        assert_eq!(state.last_stage(&id), Some(StageKind::Storage));
        assert!(state.is_idle());
    }

    #[tokio::test]
    async fn flagged_item_logs_pending_clarification() {
        let mut orchestrator = PipelineOrchestrator::new(config(1.0), catalog_with_descriptor());
        let mut state = PipelineState::new();
        let id = WorkItemId::from("example_2");
        state.select_item(id.clone());

        orchestrator.tick(&mut state).await.unwrap();

        let entries: Vec<_> = state.logs_for(&id).collect();
        assert_eq!(entries.len(), 5);
        assert_eq!(entries[2].stage, StageKind::Clarification);
        assert_eq!(entries[2].status, LogStatus::Pending);

        let run = state.run(&id).unwrap();
        assert_eq!(run.questions.len(), run.validation.issues.len());
        assert_eq!(state.clarifications().len(), 1);

        let expected: f64 = entries.iter().map(|e| e.duration).sum();
        assert!((run.processing_time - expected).abs() < 1e-9);
    }

    #[tokio::test]
    async fn reselecting_complete_item_is_noop() {
        let mut orchestrator = PipelineOrchestrator::new(config(0.0), catalog_with_descriptor());
        let mut state = PipelineState::new();
        let id = WorkItemId::from("example_3");

        state.select_item(id.clone());
        orchestrator.tick(&mut state).await.unwrap();
        let logs_before = state.logs().len();

        state.select_item(id.clone());
        let outcome = orchestrator.tick(&mut state).await.unwrap();

        assert_eq!(outcome, TickOutcome::Skipped(id));
        assert_eq!(state.logs().len(), logs_before);
        assert_eq!(orchestrator.stats().intake.emails_processed, 1);
        assert!(state.selected().is_none());
    }

    #[tokio::test]
    async fn unknown_item_fails_and_advances() {
        let mut catalog = MockWorkCatalog::new();
        catalog
            .expect_get()
            .returning(|id| (id.as_str() != "ghost").then(descriptor));
        let mut orchestrator = PipelineOrchestrator::new(config(0.0), catalog);
        let mut state = PipelineState::new();
        state.enqueue_all(["ghost", "example_1"]);

        let err = orchestrator.tick(&mut state).await.unwrap_err();

        assert!(matches!(
            err.root_cause(),
            PipelineError::UnknownWorkItem(id) if id.as_str() == "ghost"
        ));
        assert_eq!(state.status(&WorkItemId::from("ghost")), ItemStatus::Failed);
        assert_eq!(state.selected(), Some(&WorkItemId::from("example_1")));
        assert!(state.logs().is_empty());
    }

    #[tokio::test]
    async fn failed_item_can_be_retried() {
        let calls = Arc::new(AtomicUsize::new(0));
        let counter = Arc::clone(&calls);
        let mut catalog = MockWorkCatalog::new();
        catalog.expect_get().returning(move |_| {
            if counter.fetch_add(1, Ordering::SeqCst) == 0 {
                let mut broken = descriptor();
                broken.filename = None;
                Some(broken)
            } else {
                Some(descriptor())
            }
        });
        let mut orchestrator = PipelineOrchestrator::new(config(0.0), catalog);
        let mut state = PipelineState::new();
        let id = WorkItemId::from("example_4");

        state.select_item(id.clone());
        let err = orchestrator.tick(&mut state).await.unwrap_err();
        assert!(matches!(
            err.root_cause(),
            PipelineError::MissingField { field: "filename" }
        ));
        assert_eq!(state.status(&id), ItemStatus::Failed);

        state.select_item(id.clone());
        orchestrator.tick(&mut state).await.unwrap();
        assert_eq!(state.status(&id), ItemStatus::Complete);
        assert_eq!(calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn run_until_idle_collects_failures() {
        let mut catalog = MockWorkCatalog::new();
        catalog
            .expect_get()
            .returning(|id| (id.as_str() != "example_2").then(descriptor));
        let mut orchestrator = PipelineOrchestrator::new(config(0.4), catalog);
        let mut state = PipelineState::new();
        state.enqueue_all(["example_1", "example_2", "example_3"]);

        let report = orchestrator.run_until_idle(&mut state).await.unwrap();

        assert_eq!(report.completed.len(), 2);
        assert_eq!(report.failed.len(), 1);
        assert_eq!(report.failed[0].0.as_str(), "example_2");
        assert!(!report.is_clean());
        assert!(state.is_idle());
    }

    #[tokio::test]
    async fn stage_delay_still_completes() {
        let config = config(0.0).with_stage_delay_ms(1);
        let mut orchestrator = PipelineOrchestrator::new(config, catalog_with_descriptor());
        let mut state = PipelineState::new();
        state.select_item("example_5");

        let outcome = orchestrator.tick(&mut state).await.unwrap();
        assert!(matches!(outcome, TickOutcome::Completed(_)));
    }

    #[tokio::test]
    async fn seeded_runs_are_reproducible() {
        async fn run_once() -> Vec<f64> {
            let mut orchestrator =
                PipelineOrchestrator::new(config(0.5), catalog_with_descriptor());
            let mut state = PipelineState::new();
            state.enqueue_all(["example_1", "example_2", "example_3"]);
            orchestrator.run_until_idle(&mut state).await.unwrap();
            state.logs().iter().map(|e| e.duration).collect()
        }

        assert_eq!(run_once().await, run_once().await);
    }
}
