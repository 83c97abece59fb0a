//! Transformation stage: format-specific record synthesis
//!
//! Dispatches on the declared file type to one of five synthesizers. Each
//! produces a format-appropriate [`RecordShape`]; the sample schema and sample
//! data depend only on the coarse data format. Unsupported types yield an
//! explicit unknown record instead of an error.

use crate::metrics::MetricTracker;
use crate::types::{
    DataFormat, FileType, ReceivedArtifact, RecordShape, SheetSummary, TransformedRecord,
    ValidationResult,
};
use rand::Rng;
use serde::Serialize;
use serde_json::{json, Value};

/// Marker carried by records whose declared format is unsupported
pub const UNSUPPORTED_FORMAT: &str = "Unsupported file format";

/// Transforms artifacts into canonical records
#[derive(Debug, Clone)]
pub struct TransformationStage {
    metrics: MetricTracker,
    bytes_processed: u64,
}

/// Transformation performance snapshot
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct TransformationStats {
    /// Running average processing time (seconds)
    pub avg_processing_time: f64,
    /// Artifacts transformed so far
    pub files_processed: u64,
    /// Advertised accuracy
    pub transformation_accuracy: f64,
    /// Estimated bytes transformed so far
    pub bytes_processed: u64,
}

/// Synthesizer output before timing and size are attached
struct Synthesized {
    shape: RecordShape,
    steps: Vec<&'static str>,
    issues_resolved: usize,
}

impl TransformationStage {
    /// Create stage
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self {
            metrics: MetricTracker::new(2.5),
            bytes_processed: 0,
        }
    }

    /// Transform a validated artifact
    #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
    pub fn transform<R: Rng>(
        &mut self,
        artifact: &ReceivedArtifact,
        validation: &ValidationResult,
        rng: &mut R,
    ) -> TransformedRecord {
        let multiplier = artifact.item.complexity.multiplier();
        let processing_time = rng.random_range(1.0..2.0) * multiplier;

        // True cumulative mean, unlike the other stages
        self.metrics.record_cumulative(processing_time);

        let size_units: u32 = rng.random_range(10..=100);
        let file_size = (f64::from(size_units) * multiplier * 1024.0).round() as u64;
        self.bytes_processed += file_size;

        let issues = validation.issues.len();
        let synthesized = match &artifact.item.file_type {
            FileType::Csv => synthesize_csv(artifact, issues, rng),
            FileType::Excel => synthesize_excel(issues, rng),
            FileType::Json => synthesize_json(issues, rng),
            FileType::Word => synthesize_word(issues, rng),
            FileType::Pdf => synthesize_pdf(issues, rng),
            FileType::Unsupported(declared) => {
                tracing::warn!(
                    "No synthesizer for {} (declared type {:?})",
                    artifact.item.filename,
                    declared
                );
                synthesize_unknown()
            }
        };

        let data_format = synthesized.shape.data_format();

        TransformedRecord {
            artifact: artifact.clone(),
            format: artifact.item.file_type.clone(),
            schema: sample_schema(data_format),
            sample_data: sample_data(data_format),
            shape: synthesized.shape,
            transformation_steps: synthesized.steps.into_iter().map(String::from).collect(),
            issues_resolved: synthesized.issues_resolved,
            processing_time,
            file_size,
        }
    }

    /// Performance snapshot
    #[must_use]
    pub fn stats(&self) -> TransformationStats {
        TransformationStats {
            avg_processing_time: self.metrics.average(),
            files_processed: self.metrics.count(),
            transformation_accuracy: 0.97,
            bytes_processed: self.bytes_processed,
        }
    }
}

impl Default for TransformationStage {
    fn default() -> Self {
        Self::new()
    }
}

fn synthesize_csv<R: Rng>(artifact: &ReceivedArtifact, issues: usize, rng: &mut R) -> Synthesized {
    let record_count = rng.random_range(50..=5000);
    let column_count = rng.random_range(5..=30);

    let mut steps = vec![
        "Header normalization",
        "Data type conversion",
        "Missing value handling",
    ];
    if rng.random::<f64>() > 0.7 {
        steps.push("Duplicate removal");
    }
    if artifact.item.filename.to_lowercase().contains("date") {
        steps.push("Date format standardization");
    }

    Synthesized {
        shape: RecordShape::Tabular {
            record_count,
            column_count,
        },
        steps,
        issues_resolved: issues,
    }
}

fn synthesize_excel<R: Rng>(issues: usize, rng: &mut R) -> Synthesized {
    let sheet_count: u32 = rng.random_range(1..=5);
    let sheets = (1..=sheet_count)
        .map(|n| SheetSummary {
            name: format!("Sheet{n}"),
            record_count: rng.random_range(20..=1000),
            column_count: rng.random_range(5..=20),
        })
        .collect();

    let mut steps = Vec::with_capacity(5);
    if sheet_count > 1 {
        steps.push("Sheet consolidation");
    }
    steps.extend([
        "Formula evaluation",
        "Header normalization",
        "Data type conversion",
        "Missing value handling",
    ]);

    Synthesized {
        shape: RecordShape::MultiSheet {
            sheet_count,
            sheets,
        },
        steps,
        issues_resolved: issues,
    }
}

fn synthesize_json<R: Rng>(issues: usize, rng: &mut R) -> Synthesized {
    Synthesized {
        shape: RecordShape::Hierarchical {
            depth: rng.random_range(2..=6),
            object_count: rng.random_range(10..=1000),
        },
        steps: vec![
            "Flattening nested structures",
            "Array normalization",
            "Key standardization",
            "Type conversion",
        ],
        issues_resolved: issues,
    }
}

fn synthesize_word<R: Rng>(issues: usize, rng: &mut R) -> Synthesized {
    Synthesized {
        shape: RecordShape::Document {
            page_count: rng.random_range(1..=50),
            word_count: Some(rng.random_range(100..=10_000)),
            is_scanned: None,
            tables_extracted: rng.random_range(0..=5),
        },
        steps: vec![
            "Text extraction",
            "Table detection and extraction",
            "Structure identification",
            "Content classification",
            "Metadata extraction",
        ],
        issues_resolved: issues,
    }
}

fn synthesize_pdf<R: Rng>(issues: usize, rng: &mut R) -> Synthesized {
    let page_count = rng.random_range(1..=100);
    let is_scanned = rng.random::<bool>();
    let tables_extracted = rng.random_range(0..=10);

    let mut steps = Vec::with_capacity(6);
    if rng.random::<f64>() > 0.5 {
        steps.push("OCR processing");
    }
    steps.extend([
        "Text extraction",
        "Layout analysis",
        "Table detection and extraction",
        "Form field identification",
        "Content classification",
    ]);

    Synthesized {
        shape: RecordShape::Document {
            page_count,
            word_count: None,
            is_scanned: Some(is_scanned),
            tables_extracted,
        },
        steps,
        issues_resolved: issues,
    }
}

fn synthesize_unknown() -> Synthesized {
    Synthesized {
        shape: RecordShape::Unknown {
            error: UNSUPPORTED_FORMAT.to_string(),
        },
        steps: Vec::new(),
        issues_resolved: 0,
    }
}

/// Fixed sample schema for a coarse data format
fn sample_schema(format: DataFormat) -> Option<Value> {
    match format {
        DataFormat::Tabular | DataFormat::MultiSheet => Some(json!({
            "fields": [
                {"name": "id", "type": "string", "required": true},
                {"name": "date", "type": "date", "required": true},
                {"name": "amount", "type": "decimal", "required": true},
                {"name": "category", "type": "string", "required": false},
                {"name": "description", "type": "string", "required": false}
            ]
        })),
        DataFormat::Hierarchical => Some(json!({
            "type": "object",
            "properties": {
                "id": {"type": "string"},
                "timestamp": {"type": "string", "format": "date-time"},
                "data": {
                    "type": "array",
                    "items": {
                        "type": "object",
                        "properties": {
                            "key": {"type": "string"},
                            "value": {"type": "number"}
                        }
                    }
                }
            }
        })),
        DataFormat::Document => Some(json!({
            "sections": [
                {"name": "header", "type": "metadata"},
                {"name": "body", "type": "content"},
                {"name": "tables", "type": "structured_data"}
            ]
        })),
        DataFormat::Unknown => None,
    }
}

/// Fixed sample data for a coarse data format
fn sample_data(format: DataFormat) -> Option<Value> {
    match format {
        DataFormat::Tabular | DataFormat::MultiSheet => Some(json!([
            {
                "id": "A001",
                "date": "2025-01-15",
                "amount": 1250.00,
                "category": "Insurance",
                "description": "Annual premium"
            },
            {
                "id": "A002",
                "date": "2025-01-16",
                "amount": 750.50,
                "category": "Claims",
                "description": "Property damage"
            }
        ])),
        DataFormat::Hierarchical => Some(json!({
            "id": "TX123456",
            "timestamp": "2025-01-15T14:30:00Z",
            "data": [
                {"key": "premium", "value": 1250.00},
                {"key": "coverage", "value": 500_000.00}
            ]
        })),
        DataFormat::Document => Some(json!({
            "header": {"title": "Insurance Policy", "date": "2025-01-15"},
            "body": "This document contains policy information...",
            "tables": [{"name": "Coverage", "rows": 5, "columns": 3}]
        })),
        DataFormat::Unknown => None,
    }
}
