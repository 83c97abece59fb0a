//! docflow Core - Staged document-intake pipeline
//!
//! Simulates a document-intake workflow in which every stage manufactures
//! plausible results instead of parsing real files:
//! - Intake receives a work item from the catalog
//! - Validation decides whether the sender must be asked questions
//! - Clarification turns issues into questions
//! - Transformation synthesizes a canonical record per file format
//! - Storage writes the record to keyword-selected target systems
//!
//! # Example
//!
//! ```rust,ignore
//! use docflow_core::prelude::*;
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let catalog = InMemoryCatalog::load("demos/catalog.json")?;
//! let mut state = PipelineState::new();
//! state.enqueue_all(catalog.ids());
//!
//! let mut orchestrator = PipelineOrchestrator::new(PipelineConfig::new().with_seed(42), catalog);
//! let report = orchestrator.run_until_idle(&mut state).await?;
//!
//! println!("Completed {} items", report.completed.len());
//! # Ok(())
//! # }
//! ```

#![warn(unreachable_pub)]

// Core modules
pub mod catalog;
pub mod config;
pub mod error;
pub mod metrics;
pub mod orchestrator;
pub mod stages;
pub mod state;
pub mod types;

// Re-exports for convenience
pub use catalog::{InMemoryCatalog, WorkCatalog};
pub use config::{ClarificationThresholds, PipelineConfig};
pub use error::{CatalogError, ConfigError, PipelineError};
pub use metrics::{update_running_average, MetricTracker};
pub use orchestrator::{PipelineOrchestrator, PipelineStats, RunReport, TickOutcome};
pub use stages::{
    select_target_systems, ClarificationStage, IntakeStage, StageKind, StageProfile, StorageStage,
    TransformationStage, ValidationStage,
};
pub use state::{
    AgentLogEntry, ClarificationRequest, ItemStatus, LogStatus, PipelineRun, PipelineState,
    ProcessedFile, ProcessingStatus,
};
pub use types::{
    Complexity, DataFormat, FileType, Issue, IssueCategory, Priority, Question, ReceivedArtifact,
    RecordShape, Severity, StorageOutcome, SystemWriteResult, TargetSystem, TransformedRecord,
    ValidationResult, WorkItem, WorkItemDescriptor, WorkItemId,
};

/// Prelude module for common imports
pub mod prelude {
    //! Common imports for working with docflow Core
    pub use crate::{
        InMemoryCatalog, ItemStatus, PipelineConfig, PipelineError, PipelineOrchestrator,
        PipelineState, StageKind, TickOutcome, WorkCatalog, WorkItemDescriptor, WorkItemId,
    };
}

/// Version of this crate
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
