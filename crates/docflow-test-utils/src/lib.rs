//! Testing utilities for docflow workspace
//!
//! Shared fixtures: descriptors, a scenario catalog and seeded orchestrators.

#![allow(missing_docs)]

use docflow_core::{
    InMemoryCatalog, PipelineConfig, PipelineOrchestrator, WorkItemDescriptor, WorkItemId,
};
use rand::seq::IndexedRandom;
use rand::Rng;

/// Ids in the scenario catalog that carry every required field
pub const SCENARIO_IDS: [&str; 3] = ["example_1", "example_2", "example_3"];

/// Scenario id whose descriptor has no filename
pub const MISSING_FILENAME_ID: &str = "example_broken";

pub fn descriptor(
    filename: &str,
    file_type: &str,
    subject: &str,
    complexity: &str,
) -> WorkItemDescriptor {
    WorkItemDescriptor::new(
        filename,
        file_type,
        "Acme Insurance",
        "data@acmeinsurance.com",
        subject,
        complexity,
    )
    .with_body("Please find the attached file.")
}

pub fn policy_renewals() -> WorkItemDescriptor {
    descriptor("policy_renewals_A101.csv", "csv", "Policy Renewals for Q1", "low")
}

pub fn api_response() -> WorkItemDescriptor {
    descriptor("api_response_B200.json", "json", "API Integration Data", "high")
}

pub fn claims_report() -> WorkItemDescriptor {
    descriptor("claims_report_C300.pdf", "pdf", "Claims Report for March", "high")
}

pub fn missing_filename() -> WorkItemDescriptor {
    let mut d = descriptor("unused.csv", "csv", "Broken Upload", "low");
    d.filename = None;
    d
}

pub fn scenario_catalog() -> InMemoryCatalog {
    InMemoryCatalog::new()
        .with_item(SCENARIO_IDS[0], policy_renewals())
        .with_item(SCENARIO_IDS[1], api_response())
        .with_item(SCENARIO_IDS[2], claims_report())
        .with_item(MISSING_FILENAME_ID, missing_filename())
}

pub fn scenario_ids() -> Vec<WorkItemId> {
    SCENARIO_IDS.iter().map(|id| WorkItemId::from(*id)).collect()
}

pub fn deterministic_config(seed: u64) -> PipelineConfig {
    PipelineConfig::new().with_seed(seed)
}

pub fn setup_test_orchestrator(seed: u64) -> PipelineOrchestrator<InMemoryCatalog> {
    PipelineOrchestrator::new(deterministic_config(seed), scenario_catalog())
}

/// Descriptor with every required field, drawn from small fixed pools
pub fn random_descriptor<R: Rng>(rng: &mut R) -> WorkItemDescriptor {
    const STEMS: [&str; 6] = [
        "claims_data",
        "policy_update",
        "customer_list",
        "market_trends",
        "risk_dates",
        "legacy_export",
    ];
    const TYPES: [(&str, &str); 6] = [
        ("csv", "csv"),
        ("xlsx", "excel"),
        ("json", "json"),
        ("docx", "word"),
        ("pdf", "pdf"),
        ("xml", "xml"),
    ];
    const COMPLEXITY: [&str; 3] = ["low", "medium", "high"];

    let stem = STEMS.choose(rng).copied().unwrap_or("file");
    let (ext, file_type) = TYPES.choose(rng).copied().unwrap_or(("csv", "csv"));
    let complexity = COMPLEXITY.choose(rng).copied().unwrap_or("low");
    let code = rng.random_range(100..1000);

    descriptor(
        &format!("{stem}_{code}.{ext}"),
        file_type,
        &format!("{} {code}", stem.replace('_', " ")),
        complexity,
    )
}
