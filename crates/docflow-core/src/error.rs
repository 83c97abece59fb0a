//! Error types for docflow Core
//!
//! Provides error handling for:
//! - Work-item descriptors missing required fields
//! - Catalog lookups and catalog loading
//! - Work-item status transitions
//! - Configuration loading
//!
//! Simulated storage write failures and unsupported file formats are not
//! errors: they are recorded in the stage output.

use crate::state::ItemStatus;
use crate::types::WorkItemId;

/// Main pipeline error type
#[derive(Debug, thiserror::Error)]
pub enum PipelineError {
    /// A required work-item field is absent
    #[error("missing required field `{field}`")]
    MissingField {
        /// Field name as it appears in the catalog
        field: &'static str,
    },

    /// A work-item field is present but cannot be interpreted
    #[error("invalid value {value:?} for field `{field}`")]
    InvalidField {
        /// Field name as it appears in the catalog
        field: &'static str,
        /// Offending value
        value: String,
    },

    /// Selected id has no catalog entry
    #[error("unknown work item: {0}")]
    UnknownWorkItem(WorkItemId),

    /// Status map rejected a transition
    #[error("illegal status transition for {id}: {from:?} -> {to:?}")]
    IllegalTransition {
        /// Work item whose status was being changed
        id: WorkItemId,
        /// Current status
        from: ItemStatus,
        /// Requested status
        to: ItemStatus,
    },

    /// A work item failed part-way through the pipeline
    #[error("work item {id} failed: {source}")]
    ItemFailed {
        /// Failed work item
        id: WorkItemId,
        /// Stage error
        #[source]
        source: Box<PipelineError>,
    },

    /// Catalog could not be loaded
    #[error("catalog error: {0}")]
    Catalog(#[from] CatalogError),

    /// Configuration could not be loaded
    #[error("configuration error: {0}")]
    Config(#[from] ConfigError),
}

impl PipelineError {
    /// Check if the error is confined to a single work item
    ///
    /// Item-fatal errors mark the item failed; the queue keeps advancing.
    #[inline]
    #[must_use]
    pub fn is_item_fatal(&self) -> bool {
        matches!(
            self,
            Self::MissingField { .. }
                | Self::InvalidField { .. }
                | Self::UnknownWorkItem(_)
                | Self::ItemFailed { .. }
        )
    }

    /// Unwrap [`PipelineError::ItemFailed`] down to the stage error
    #[must_use]
    pub fn root_cause(&self) -> &PipelineError {
        match self {
            Self::ItemFailed { source, .. } => source.root_cause(),
            other => other,
        }
    }

    /// Create a missing-field error
    #[inline]
    #[must_use]
    pub fn missing(field: &'static str) -> Self {
        Self::MissingField { field }
    }
}

/// Work catalog errors
#[derive(Debug, thiserror::Error)]
pub enum CatalogError {
    /// Catalog file could not be read
    #[error("failed to read catalog: {0}")]
    Io(#[from] std::io::Error),

    /// Catalog JSON is malformed
    #[error("failed to parse catalog: {0}")]
    Parse(#[from] serde_json::Error),
}

/// Configuration errors
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// Config file could not be read
    #[error("failed to read config: {0}")]
    Io(#[from] std::io::Error),

    /// Config TOML is malformed
    #[error("failed to parse config: {0}")]
    Parse(#[from] toml::de::Error),

    /// A value is out of range
    #[error("invalid config value `{key}`: {reason}")]
    Invalid {
        /// Config key
        key: &'static str,
        /// What is wrong with it
        reason: String,
    },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_field_display() {
        let err = PipelineError::missing("filename");
        assert_eq!(err.to_string(), "missing required field `filename`");
    }

    #[test]
    fn item_failed_root_cause() {
        let err = PipelineError::ItemFailed {
            id: WorkItemId::from("example_1"),
            source: Box::new(PipelineError::missing("subject")),
        };

        assert!(err.is_item_fatal());
        assert!(matches!(
            err.root_cause(),
            PipelineError::MissingField { field: "subject" }
        ));
        assert!(err.to_string().contains("example_1"));
    }

    #[test]
    fn config_errors_are_not_item_fatal() {
        let err = PipelineError::from(ConfigError::Invalid {
            key: "storage_success_rate",
            reason: "must be within [0, 1]".to_string(),
        });
        assert!(!err.is_item_fatal());
    }
}
