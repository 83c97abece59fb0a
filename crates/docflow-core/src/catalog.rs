//! Work catalog
//!
//! The catalog is the read-only source of work-item descriptors. The
//! orchestrator only ever looks items up by id; listing is for bulk
//! enqueueing.

use crate::error::CatalogError;
use crate::types::{WorkItemDescriptor, WorkItemId};
use indexmap::IndexMap;
use std::path::Path;

/// Read-only mapping from work-item id to descriptor
#[cfg_attr(test, mockall::automock)]
pub trait WorkCatalog {
    /// Look up a descriptor
    fn get(&self, id: &WorkItemId) -> Option<WorkItemDescriptor>;

    /// All ids, in catalog order
    fn ids(&self) -> Vec<WorkItemId>;
}

/// Catalog held in memory, preserving insertion order
#[derive(Debug, Clone, Default)]
pub struct InMemoryCatalog {
    entries: IndexMap<WorkItemId, WorkItemDescriptor>,
}

impl InMemoryCatalog {
    /// Create empty catalog
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Parse a JSON object of `{ "<id>": { descriptor fields } }`
    ///
    /// # Errors
    /// Returns `CatalogError::Parse` if the source is not such an object.
    pub fn from_json_str(source: &str) -> Result<Self, CatalogError> {
        let entries: IndexMap<WorkItemId, WorkItemDescriptor> = serde_json::from_str(source)?;
        tracing::debug!("Loaded catalog with {} entries", entries.len());
        Ok(Self { entries })
    }

    /// Load a JSON catalog file
    ///
    /// # Errors
    /// Returns `CatalogError::Io` if the file cannot be read, otherwise the
    /// errors of [`InMemoryCatalog::from_json_str`].
    pub fn load(path: impl AsRef<Path>) -> Result<Self, CatalogError> {
        let source = std::fs::read_to_string(path)?;
        Self::from_json_str(&source)
    }

    /// Insert or replace an entry
    pub fn insert(&mut self, id: impl Into<WorkItemId>, descriptor: WorkItemDescriptor) {
        self.entries.insert(id.into(), descriptor);
    }

    /// With entry
    #[inline]
    #[must_use]
    pub fn with_item(mut self, id: impl Into<WorkItemId>, descriptor: WorkItemDescriptor) -> Self {
        self.insert(id, descriptor);
        self
    }

    /// Number of entries
    #[inline]
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Check if empty
    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl FromIterator<(WorkItemId, WorkItemDescriptor)> for InMemoryCatalog {
    fn from_iter<I: IntoIterator<Item = (WorkItemId, WorkItemDescriptor)>>(iter: I) -> Self {
        Self {
            entries: iter.into_iter().collect(),
        }
    }
}

impl WorkCatalog for InMemoryCatalog {
    fn get(&self, id: &WorkItemId) -> Option<WorkItemDescriptor> {
        self.entries.get(id).cloned()
    }

    fn ids(&self) -> Vec<WorkItemId> {
        self.entries.keys().cloned().collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const CATALOG: &str = r#"{
        "example_2": {
            "filename": "claims_analysis_C310.xlsx",
            "file_type": "excel",
            "sender": "Global Reinsurance",
            "sender_email": "reports@globalre.com",
            "subject": "Claims Analysis for C310",
            "complexity": "medium"
        },
        "example_1": {
            "filename": "monthly_claims_A120.csv",
            "file_type": "csv",
            "sender": "Acme Insurance",
            "sender_email": "data@acmeinsurance.com",
            "subject": "Monthly Claims Data for A120",
            "complexity": "low",
            "email_body": "Please find attached the monthly claims data."
        }
    }"#;

    #[test]
    fn json_catalog_preserves_order() {
        let catalog = InMemoryCatalog::from_json_str(CATALOG).unwrap();
        assert_eq!(catalog.len(), 2);
        assert_eq!(
            catalog.ids(),
            vec![WorkItemId::from("example_2"), WorkItemId::from("example_1")]
        );
    }

    #[test]
    fn get_returns_descriptor() {
        let catalog = InMemoryCatalog::from_json_str(CATALOG).unwrap();
        let descriptor = catalog.get(&WorkItemId::from("example_1")).unwrap();
        assert_eq!(descriptor.filename.as_deref(), Some("monthly_claims_A120.csv"));
        assert!(catalog.get(&WorkItemId::from("example_9")).is_none());
    }

    #[test]
    fn malformed_json_is_parse_error() {
        let err = InMemoryCatalog::from_json_str("[1, 2").unwrap_err();
        assert!(matches!(err, CatalogError::Parse(_)));
    }

    #[test]
    fn builder_insert() {
        let catalog = InMemoryCatalog::new().with_item(
            "a",
            WorkItemDescriptor::new("a.csv", "csv", "S", "s@x.com", "Subject", "low"),
        );
        assert!(!catalog.is_empty());
        assert_eq!(catalog.ids(), vec![WorkItemId::from("a")]);
    }
}
