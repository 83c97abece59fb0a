//! Core types for docflow
//!
//! Defines the records that flow between stages:
//! - Work items and their raw catalog descriptors
//! - Received artifacts and validation results
//! - Clarifying questions
//! - Transformed records and storage outcomes

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::str::FromStr;

/// Work item identifier (key into the external catalog)
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct WorkItemId(pub String);

impl WorkItemId {
    /// Create new identifier
    #[inline]
    #[must_use]
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Borrow as string slice
    #[inline]
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<&str> for WorkItemId {
    fn from(id: &str) -> Self {
        Self(id.to_string())
    }
}

impl From<String> for WorkItemId {
    fn from(id: String) -> Self {
        Self(id)
    }
}

impl std::fmt::Display for WorkItemId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// Declared file type of a work item
///
/// Anything outside the five known formats is carried as
/// [`FileType::Unsupported`] and handled by the transformation stage.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum FileType {
    /// Comma-separated values
    Csv,
    /// Excel workbook
    Excel,
    /// JSON document
    Json,
    /// Word document
    Word,
    /// PDF document
    Pdf,
    /// Any other declared type
    Unsupported(String),
}

impl FileType {
    /// Parse a declared type, case-insensitively
    #[must_use]
    pub fn parse(declared: &str) -> Self {
        match declared.trim().to_lowercase().as_str() {
            "csv" => Self::Csv,
            "excel" => Self::Excel,
            "json" => Self::Json,
            "word" => Self::Word,
            "pdf" => Self::Pdf,
            other => Self::Unsupported(other.to_string()),
        }
    }

    /// Canonical lowercase name
    #[must_use]
    pub fn as_str(&self) -> &str {
        match self {
            Self::Csv => "csv",
            Self::Excel => "excel",
            Self::Json => "json",
            Self::Word => "word",
            Self::Pdf => "pdf",
            Self::Unsupported(other) => other,
        }
    }

    /// Check if one of the five known formats
    #[inline]
    #[must_use]
    pub fn is_supported(&self) -> bool {
        !matches!(self, Self::Unsupported(_))
    }
}

impl From<String> for FileType {
    fn from(declared: String) -> Self {
        Self::parse(&declared)
    }
}

impl From<FileType> for String {
    fn from(file_type: FileType) -> Self {
        file_type.as_str().to_string()
    }
}

impl std::fmt::Display for FileType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Declared complexity tier
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Complexity {
    /// Low complexity
    Low,
    /// Medium complexity
    Medium,
    /// High complexity
    High,
}

impl Complexity {
    /// All tiers, lowest first
    pub const ALL: [Complexity; 3] = [Complexity::Low, Complexity::Medium, Complexity::High];

    /// Processing-time and size multiplier used by transformation
    #[inline]
    #[must_use]
    pub fn multiplier(self) -> f64 {
        match self {
            Complexity::Low => 1.0,
            Complexity::Medium => 2.0,
            Complexity::High => 3.5,
        }
    }

    /// Lowercase name
    #[inline]
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Complexity::Low => "low",
            Complexity::Medium => "medium",
            Complexity::High => "high",
        }
    }
}

impl FromStr for Complexity {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "low" => Ok(Complexity::Low),
            "medium" => Ok(Complexity::Medium),
            "high" => Ok(Complexity::High),
            _ => Err(s.to_string()),
        }
    }
}

/// Issue severity
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    /// Low severity
    Low,
    /// Medium severity
    Medium,
    /// High severity
    High,
}

impl Severity {
    /// All severities, sampled uniformly by validation
    pub const ALL: [Severity; 3] = [Severity::Low, Severity::Medium, Severity::High];
}

/// Question priority
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Priority {
    /// High priority
    High,
    /// Medium priority
    Medium,
    /// Low priority
    Low,
}

impl From<Severity> for Priority {
    fn from(severity: Severity) -> Self {
        match severity {
            Severity::Low => Priority::Low,
            Severity::Medium => Priority::Medium,
            Severity::High => Priority::High,
        }
    }
}

/// Raw work-item fields as supplied by the catalog
///
/// Every field is optional here; intake turns a descriptor into a
/// [`WorkItem`] and rejects missing required fields.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct WorkItemDescriptor {
    /// Attachment filename
    pub filename: Option<String>,
    /// Declared file type
    pub file_type: Option<String>,
    /// Sender display name
    pub sender: Option<String>,
    /// Sender address
    pub sender_email: Option<String>,
    /// Email subject
    pub subject: Option<String>,
    /// Email body (optional)
    pub email_body: Option<String>,
    /// Declared complexity tier
    pub complexity: Option<String>,
}

impl WorkItemDescriptor {
    /// Create a descriptor with every required field set
    #[must_use]
    pub fn new(
        filename: impl Into<String>,
        file_type: impl Into<String>,
        sender: impl Into<String>,
        sender_email: impl Into<String>,
        subject: impl Into<String>,
        complexity: impl Into<String>,
    ) -> Self {
        Self {
            filename: Some(filename.into()),
            file_type: Some(file_type.into()),
            sender: Some(sender.into()),
            sender_email: Some(sender_email.into()),
            subject: Some(subject.into()),
            email_body: None,
            complexity: Some(complexity.into()),
        }
    }

    /// With email body
    #[inline]
    #[must_use]
    pub fn with_body(mut self, body: impl Into<String>) -> Self {
        self.email_body = Some(body.into());
        self
    }
}

/// One unit of inbound content
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WorkItem {
    /// Catalog key
    pub id: WorkItemId,
    /// Attachment filename
    pub filename: String,
    /// Declared file type
    pub file_type: FileType,
    /// Sender display name
    pub sender: String,
    /// Sender address
    pub sender_email: String,
    /// Email subject
    pub subject: String,
    /// Email body
    pub body: String,
    /// Declared complexity tier
    pub complexity: Complexity,
}

/// Work item as recorded by intake
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReceivedArtifact {
    /// Source work item
    pub item: WorkItem,
    /// Receipt time
    pub received_at: DateTime<Utc>,
    /// Derived storage path
    pub storage_path: String,
    /// Simulated processing duration (seconds)
    pub processing_time: f64,
}

/// Data-quality issue categories raised by validation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum IssueCategory {
    /// Missing required fields
    MissingRequiredFields,
    /// Data type mismatch
    DataTypeMismatch,
    /// Invalid date format
    InvalidDateFormat,
    /// Inconsistent naming convention
    InconsistentNamingConvention,
    /// Duplicate records detected
    DuplicateRecords,
    /// Invalid values in numeric fields
    InvalidNumericValues,
    /// Unexpected file structure
    UnexpectedFileStructure,
    /// Encoding issues detected
    EncodingIssues,
}

impl IssueCategory {
    /// The fixed category set validation samples from
    pub const ALL: [IssueCategory; 8] = [
        IssueCategory::MissingRequiredFields,
        IssueCategory::DataTypeMismatch,
        IssueCategory::InvalidDateFormat,
        IssueCategory::InconsistentNamingConvention,
        IssueCategory::DuplicateRecords,
        IssueCategory::InvalidNumericValues,
        IssueCategory::UnexpectedFileStructure,
        IssueCategory::EncodingIssues,
    ];

    /// Human-readable label
    #[must_use]
    pub fn label(self) -> &'static str {
        match self {
            IssueCategory::MissingRequiredFields => "Missing required fields",
            IssueCategory::DataTypeMismatch => "Data type mismatch",
            IssueCategory::InvalidDateFormat => "Invalid date format",
            IssueCategory::InconsistentNamingConvention => "Inconsistent naming convention",
            IssueCategory::DuplicateRecords => "Duplicate records detected",
            IssueCategory::InvalidNumericValues => "Invalid values in numeric fields",
            IssueCategory::UnexpectedFileStructure => "Unexpected file structure",
            IssueCategory::EncodingIssues => "Encoding issues detected",
        }
    }
}

impl std::fmt::Display for IssueCategory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.label())
    }
}

/// Categorized data-quality concern
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Issue {
    /// Issue category
    pub category: IssueCategory,
    /// Sampled severity
    pub severity: Severity,
    /// Templated description
    pub description: String,
}

/// Validation stage output
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ValidationResult {
    /// Validated artifact
    pub artifact: ReceivedArtifact,
    /// Always true: the flag below separates clean from questionable
    pub is_valid: bool,
    /// Whether clarification is required
    pub needs_clarification: bool,
    /// Issues found (empty unless clarification is required)
    pub issues: Vec<Issue>,
    /// Simulated processing duration (seconds)
    pub processing_time: f64,
}

/// Clarifying question for the sender
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Question {
    /// Question text
    pub question: String,
    /// Where the issue was found
    pub context: String,
    /// Question priority
    pub priority: Priority,
    /// Recipient (the work item's sender)
    pub sender: String,
}

/// Coarse data format of a transformed record
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DataFormat {
    /// Rows and columns
    Tabular,
    /// Several sheets of rows and columns
    MultiSheet,
    /// Nested objects
    Hierarchical,
    /// Paged text
    Document,
    /// Unsupported input
    Unknown,
}

impl DataFormat {
    /// Snake-case name
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            DataFormat::Tabular => "tabular",
            DataFormat::MultiSheet => "multi_sheet",
            DataFormat::Hierarchical => "hierarchical",
            DataFormat::Document => "document",
            DataFormat::Unknown => "unknown",
        }
    }
}

impl std::fmt::Display for DataFormat {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One sheet of a multi-sheet record
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SheetSummary {
    /// Sheet name (`Sheet1`, `Sheet2`, ...)
    pub name: String,
    /// Rows in the sheet
    pub record_count: u32,
    /// Columns in the sheet
    pub column_count: u32,
}

/// Format-specific structure of a transformed record
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "data_format", rename_all = "snake_case")]
pub enum RecordShape {
    /// CSV output
    Tabular {
        /// Row count
        record_count: u32,
        /// Column count
        column_count: u32,
    },
    /// Excel output
    MultiSheet {
        /// Sheet count
        sheet_count: u32,
        /// One entry per sheet
        sheets: Vec<SheetSummary>,
    },
    /// JSON output
    Hierarchical {
        /// Nesting depth
        depth: u32,
        /// Object count
        object_count: u32,
    },
    /// Word or PDF output
    Document {
        /// Page count
        page_count: u32,
        /// Word count (Word only)
        word_count: Option<u32>,
        /// Whether the PDF was scanned (PDF only)
        is_scanned: Option<bool>,
        /// Tables extracted
        tables_extracted: u32,
    },
    /// Unsupported input
    Unknown {
        /// Unsupported-format marker
        error: String,
    },
}

impl RecordShape {
    /// Coarse data format tag
    #[must_use]
    pub fn data_format(&self) -> DataFormat {
        match self {
            RecordShape::Tabular { .. } => DataFormat::Tabular,
            RecordShape::MultiSheet { .. } => DataFormat::MultiSheet,
            RecordShape::Hierarchical { .. } => DataFormat::Hierarchical,
            RecordShape::Document { .. } => DataFormat::Document,
            RecordShape::Unknown { .. } => DataFormat::Unknown,
        }
    }

    /// Explicit record count, when the shape carries one
    #[must_use]
    pub fn record_count(&self) -> Option<u32> {
        match self {
            RecordShape::Tabular { record_count, .. } => Some(*record_count),
            _ => None,
        }
    }
}

/// Transformation stage output
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TransformedRecord {
    /// Source artifact
    pub artifact: ReceivedArtifact,
    /// Declared format that selected the synthesizer
    pub format: FileType,
    /// Format-specific structure
    pub shape: RecordShape,
    /// Sample schema for the coarse format
    pub schema: Option<serde_json::Value>,
    /// Sample data for the coarse format
    pub sample_data: Option<serde_json::Value>,
    /// Steps applied, in order
    pub transformation_steps: Vec<String>,
    /// Number of validation issues resolved
    pub issues_resolved: usize,
    /// Simulated processing duration (seconds)
    pub processing_time: f64,
    /// Estimated size in bytes
    pub file_size: u64,
}

impl TransformedRecord {
    /// Coarse data format tag
    #[inline]
    #[must_use]
    pub fn data_format(&self) -> DataFormat {
        self.shape.data_format()
    }

    /// Check if the declared format was unsupported
    #[inline]
    #[must_use]
    pub fn is_unsupported(&self) -> bool {
        matches!(self.shape, RecordShape::Unknown { .. })
    }
}

/// Downstream system eligible to receive stored data
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TargetSystem {
    /// Data warehouse (always selected)
    Warehouse,
    /// Claims processing
    Claims,
    /// Policy management
    Policy,
    /// Customer relationship management
    Crm,
}

impl TargetSystem {
    /// All systems, warehouse first
    pub const ALL: [TargetSystem; 4] = [
        TargetSystem::Warehouse,
        TargetSystem::Claims,
        TargetSystem::Policy,
        TargetSystem::Crm,
    ];

    /// Core systems (everything but the warehouse)
    pub const CORE: [TargetSystem; 3] =
        [TargetSystem::Claims, TargetSystem::Policy, TargetSystem::Crm];

    /// Display name
    #[must_use]
    pub fn name(self) -> &'static str {
        match self {
            TargetSystem::Warehouse => "Data Warehouse",
            TargetSystem::Claims => "Claims Processing System",
            TargetSystem::Policy => "Policy Management System",
            TargetSystem::Crm => "Customer Relationship Management",
        }
    }

    /// System class (`warehouse` or `core`)
    #[must_use]
    pub fn kind(self) -> &'static str {
        match self {
            TargetSystem::Warehouse => "warehouse",
            _ => "core",
        }
    }

    /// Declared write latency (seconds)
    #[must_use]
    pub fn declared_latency(self) -> f64 {
        match self {
            TargetSystem::Warehouse => 0.8,
            TargetSystem::Claims => 0.5,
            TargetSystem::Policy => 0.6,
            TargetSystem::Crm => 0.7,
        }
    }
}

impl std::fmt::Display for TargetSystem {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

/// Result of one simulated write
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SystemWriteResult {
    /// Target system
    pub system: TargetSystem,
    /// Whether the write succeeded
    pub success: bool,
    /// Records written
    pub records_stored: u64,
    /// Simulated latency (seconds)
    pub latency: f64,
    /// Write time
    pub timestamp: DateTime<Utc>,
}

/// Storage stage output
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StorageOutcome {
    /// Source artifact
    pub artifact: ReceivedArtifact,
    /// Systems selected for this record
    pub target_systems: Vec<TargetSystem>,
    /// One result per selected system
    pub storage_results: Vec<SystemWriteResult>,
    /// Records offered to each system
    pub total_records: u64,
    /// Bytes stored
    pub bytes_stored: u64,
    /// Logical AND of all write results
    pub overall_success: bool,
    /// Simulated processing duration (seconds)
    pub processing_time: f64,
}

impl StorageOutcome {
    /// Number of failed writes
    #[must_use]
    pub fn failed_writes(&self) -> usize {
        self.storage_results.iter().filter(|r| !r.success).count()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn file_type_parse_is_case_insensitive() {
        assert_eq!(FileType::parse("CSV"), FileType::Csv);
        assert_eq!(FileType::parse(" Pdf "), FileType::Pdf);
        assert_eq!(
            FileType::parse("xml"),
            FileType::Unsupported("xml".to_string())
        );
        assert!(!FileType::parse("xml").is_supported());
    }

    #[test]
    fn file_type_serde_as_string() {
        let json = serde_json::to_string(&FileType::Excel).unwrap();
        assert_eq!(json, "\"excel\"");

        let parsed: FileType = serde_json::from_str("\"parquet\"").unwrap();
        assert_eq!(parsed, FileType::Unsupported("parquet".to_string()));
    }

    #[test]
    fn complexity_multiplier() {
        assert_eq!(Complexity::Low.multiplier(), 1.0);
        assert_eq!(Complexity::Medium.multiplier(), 2.0);
        assert_eq!(Complexity::High.multiplier(), 3.5);
        assert_eq!("HIGH".parse::<Complexity>(), Ok(Complexity::High));
        assert!("extreme".parse::<Complexity>().is_err());
    }

    #[test]
    fn issue_categories_are_distinct() {
        let mut labels: Vec<_> = IssueCategory::ALL.iter().map(|c| c.label()).collect();
        labels.sort_unstable();
        labels.dedup();
        assert_eq!(labels.len(), 8);
    }

    #[test]
    fn record_shape_tags_data_format() {
        let shape = RecordShape::Hierarchical {
            depth: 3,
            object_count: 40,
        };
        assert_eq!(shape.data_format(), DataFormat::Hierarchical);
        assert_eq!(shape.record_count(), None);

        let value = serde_json::to_value(&shape).unwrap();
        assert_eq!(value["data_format"], "hierarchical");
    }

    #[test]
    fn descriptor_deserializes_with_missing_fields() {
        let descriptor: WorkItemDescriptor =
            serde_json::from_str(r#"{"file_type": "csv", "sender": "Acme"}"#).unwrap();
        assert_eq!(descriptor.filename, None);
        assert_eq!(descriptor.file_type.as_deref(), Some("csv"));
    }

    #[test]
    fn target_system_metadata() {
        assert_eq!(TargetSystem::Warehouse.kind(), "warehouse");
        assert_eq!(TargetSystem::Crm.kind(), "core");
        assert_eq!(TargetSystem::Claims.declared_latency(), 0.5);
        assert!(!TargetSystem::CORE.contains(&TargetSystem::Warehouse));
    }
}
