//! Pipeline stages
//!
//! Each stage is a plain struct owning its private metrics. Stage methods
//! are synchronous functions of their input, the injected RNG, and those
//! metrics; they never touch another stage's state.

pub mod clarification;
pub mod intake;
pub mod storage;
pub mod transformation;
pub mod validation;

pub use clarification::{ClarificationStage, ClarificationStats};
pub use intake::{IntakeStage, IntakeStats};
pub use storage::{select_target_systems, StorageStage, StorageStats};
pub use transformation::{TransformationStage, TransformationStats, UNSUPPORTED_FORMAT};
pub use validation::{ValidationStage, ValidationStats};

use serde::{Deserialize, Serialize};

/// Stage identity, used in log entries and stage tracking
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StageKind {
    /// Receives the simulated email
    Intake,
    /// Checks the file and raises issues
    Validation,
    /// Turns issues into questions
    Clarification,
    /// Produces the canonical record
    Transformation,
    /// Writes to downstream systems
    Storage,
}

impl StageKind {
    /// Stages in pipeline order
    pub const ALL: [StageKind; 5] = [
        StageKind::Intake,
        StageKind::Validation,
        StageKind::Clarification,
        StageKind::Transformation,
        StageKind::Storage,
    ];

    /// Display name
    #[must_use]
    pub fn name(self) -> &'static str {
        match self {
            StageKind::Intake => "Intake",
            StageKind::Validation => "Validation",
            StageKind::Clarification => "Clarification",
            StageKind::Transformation => "Transformation",
            StageKind::Storage => "Storage",
        }
    }

    /// One-line description
    #[must_use]
    pub fn description(self) -> &'static str {
        match self {
            StageKind::Intake => "Monitors incoming emails and extracts file attachments",
            StageKind::Validation => "Validates file structure, content, and identifies issues",
            StageKind::Clarification => "Generates clarifying questions for files with issues",
            StageKind::Transformation => {
                "Transforms data from various formats into a common structure"
            }
            StageKind::Storage => "Stores transformed data into core systems and data warehouse",
        }
    }

    /// Name, description and capabilities in one serializable record
    #[must_use]
    pub fn profile(self) -> StageProfile {
        StageProfile {
            stage: self,
            name: self.name(),
            description: self.description(),
            capabilities: self.capabilities(),
        }
    }

    /// Advertised capabilities
    #[must_use]
    pub fn capabilities(self) -> &'static [&'static str] {
        match self {
            StageKind::Intake => &["Email monitoring", "File extraction", "Sender verification"],
            StageKind::Validation => &[
                "Format validation",
                "Schema validation",
                "Data quality checks",
            ],
            StageKind::Clarification => &[
                "Question generation",
                "Context analysis",
                "Priority determination",
            ],
            StageKind::Transformation => &[
                "CSV processing",
                "Excel processing",
                "JSON processing",
                "Word processing",
                "PDF extraction",
            ],
            StageKind::Storage => &[
                "Data warehouse integration",
                "Core system integration",
                "Data validation",
                "Schema mapping",
            ],
        }
    }
}

impl std::fmt::Display for StageKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

/// What a stage is and what it advertises
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct StageProfile {
    /// Stage identity
    pub stage: StageKind,
    /// Display name
    pub name: &'static str,
    /// One-line description
    pub description: &'static str,
    /// Advertised capabilities
    pub capabilities: &'static [&'static str],
}
