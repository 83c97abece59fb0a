//! Session state: queue, status map, log ledger
//!
//! [`PipelineState`] is the single mutable record of a session. The
//! presentation layer reads it freely and writes only through the command
//! methods (`select_item`, `enqueue_all`, `reset_all`, `mark_answered`).
//! Everything else is mutated by the orchestrator.
//!
//! Item status follows a fixed transition table:
//!
//! ```text
//! Unset ──► Processing ──► Complete
//!              │  ▲
//!              ▼  │
//!             Failed
//! ```

use crate::error::PipelineError;
use crate::stages::StageKind;
use crate::types::{
    Complexity, FileType, Question, ReceivedArtifact, StorageOutcome, TransformedRecord,
    ValidationResult, WorkItemId,
};
use chrono::{DateTime, Utc};
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use std::collections::VecDeque;
use ulid::Ulid;

/// Per-item processing status
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ItemStatus {
    /// Never selected
    #[default]
    Unset,
    /// Currently running through the stages
    Processing,
    /// All stages finished (terminal)
    Complete,
    /// A stage errored; may be selected again
    Failed,
}

impl ItemStatus {
    /// Statuses reachable from this one
    #[must_use]
    pub fn allowed_transitions(self) -> &'static [ItemStatus] {
        use ItemStatus::{Complete, Failed, Processing, Unset};
        match self {
            Unset | Failed => &[Processing],
            Processing => &[Complete, Failed],
            Complete => &[],
        }
    }

    /// Check if `to` is reachable in one step
    #[inline]
    #[must_use]
    pub fn can_transition_to(self, to: ItemStatus) -> bool {
        self.allowed_transitions().contains(&to)
    }

    /// Check if terminal
    #[inline]
    #[must_use]
    pub fn is_complete(self) -> bool {
        self == ItemStatus::Complete
    }
}

/// Validates a status transition for a work item
///
/// # Errors
/// Returns `PipelineError::IllegalTransition` if `to` is not reachable from `from`.
pub fn validate_transition(
    id: &WorkItemId,
    from: ItemStatus,
    to: ItemStatus,
) -> Result<(), PipelineError> {
    if from.can_transition_to(to) {
        Ok(())
    } else {
        Err(PipelineError::IllegalTransition {
            id: id.clone(),
            from,
            to,
        })
    }
}

/// Log entry identifier
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct EntryId(pub Ulid);

impl EntryId {
    /// Generate new entry ID
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self(Ulid::new())
    }
}

impl Default for EntryId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for EntryId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Status shown on a log entry
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogStatus {
    /// Awaiting a reply (clarification)
    Pending,
    /// Stage finished
    Complete,
}

/// One executed stage, as recorded in the ledger
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AgentLogEntry {
    /// Entry id
    pub id: EntryId,
    /// When the stage finished
    pub timestamp: DateTime<Utc>,
    /// Stage that ran
    pub stage: StageKind,
    /// What the stage did
    pub action: String,
    /// Entry status
    pub status: LogStatus,
    /// Simulated stage duration (seconds)
    pub duration: f64,
    /// Work item the stage ran for
    pub work_item_id: WorkItemId,
}

impl AgentLogEntry {
    /// Create entry stamped now
    #[must_use]
    pub fn new(
        work_item_id: WorkItemId,
        stage: StageKind,
        action: impl Into<String>,
        status: LogStatus,
        duration: f64,
    ) -> Self {
        Self {
            id: EntryId::new(),
            timestamp: Utc::now(),
            stage,
            action: action.into(),
            status,
            duration,
            work_item_id,
        }
    }
}

/// Questions sent to a sender for one work item
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClarificationRequest {
    /// Work item the questions concern
    pub work_item_id: WorkItemId,
    /// Questions, one per issue
    pub questions: Vec<Question>,
    /// Whether the sender has answered
    pub answered: bool,
    /// When the questions were generated
    pub timestamp: DateTime<Utc>,
}

/// Outcome shown for a processed file
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ProcessingStatus {
    /// Went through cleanly
    Processed,
    /// Went through with open questions
    AwaitingClarification,
}

/// Summary of one completed work item
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProcessedFile {
    /// Work item id
    pub work_item_id: WorkItemId,
    /// Attachment filename
    pub filename: String,
    /// Declared file type
    pub file_type: FileType,
    /// Sender display name
    pub sender: String,
    /// Email subject
    pub subject: String,
    /// Receipt time
    pub received_at: DateTime<Utc>,
    /// Sum of the executed stages' durations (seconds)
    pub processing_time: f64,
    /// Declared complexity tier
    pub complexity: Complexity,
    /// Display status
    pub status: ProcessingStatus,
}

/// Every record one work item produced
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PipelineRun {
    /// Intake output
    pub artifact: ReceivedArtifact,
    /// Validation output
    pub validation: ValidationResult,
    /// Clarification output (empty when not flagged)
    pub questions: Vec<Question>,
    /// Transformation output
    pub transformed: TransformedRecord,
    /// Storage output
    pub storage: StorageOutcome,
    /// Sum of the executed stages' durations (seconds)
    pub processing_time: f64,
}

impl PipelineRun {
    /// Summarize for the processed-files list
    #[must_use]
    pub fn summary(&self) -> ProcessedFile {
        let item = &self.artifact.item;
        ProcessedFile {
            work_item_id: item.id.clone(),
            filename: item.filename.clone(),
            file_type: item.file_type.clone(),
            sender: item.sender.clone(),
            subject: item.subject.clone(),
            received_at: self.artifact.received_at,
            processing_time: self.processing_time,
            complexity: item.complexity,
            status: if self.validation.needs_clarification {
                ProcessingStatus::AwaitingClarification
            } else {
                ProcessingStatus::Processed
            },
        }
    }
}

/// Session state
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PipelineState {
    queue: VecDeque<WorkItemId>,
    statuses: IndexMap<WorkItemId, ItemStatus>,
    selected: Option<WorkItemId>,
    logs: Vec<AgentLogEntry>,
    clarifications: Vec<ClarificationRequest>,
    processed: Vec<ProcessedFile>,
    runs: IndexMap<WorkItemId, PipelineRun>,
    stages: IndexMap<WorkItemId, StageKind>,
}

impl PipelineState {
    /// Create empty state
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    // ---- commands ----

    /// Select a work item for the next tick
    ///
    /// Selecting an already complete item is allowed; the next tick skips it.
    pub fn select_item(&mut self, id: impl Into<WorkItemId>) {
        self.selected = Some(id.into());
    }

    /// Queue every id that is not complete
    ///
    /// Ids already queued or currently selected are not queued twice. If
    /// nothing is selected, the first queued id moves into selection.
    pub fn enqueue_all<I>(&mut self, ids: I)
    where
        I: IntoIterator,
        I::Item: Into<WorkItemId>,
    {
        for id in ids {
            let id = id.into();
            if self.status(&id).is_complete()
                || self.selected.as_ref() == Some(&id)
                || self.queue.contains(&id)
            {
                continue;
            }
            self.queue.push_back(id);
        }

        if self.selected.is_none() {
            self.advance_selection();
        }
    }

    /// Clear the whole session
    pub fn reset_all(&mut self) {
        *self = Self::default();
    }

    /// Mark the clarification requests for an item answered
    ///
    /// Returns false if the item has no open request.
    pub fn mark_answered(&mut self, id: &WorkItemId) -> bool {
        let mut marked = false;
        for request in self
            .clarifications
            .iter_mut()
            .filter(|r| &r.work_item_id == id && !r.answered)
        {
            request.answered = true;
            marked = true;
        }
        marked
    }

    // ---- queries ----

    /// Pending ids, front first
    #[must_use]
    pub fn queue(&self) -> &VecDeque<WorkItemId> {
        &self.queue
    }

    /// Status of an item (`Unset` if never seen)
    #[must_use]
    pub fn status(&self, id: &WorkItemId) -> ItemStatus {
        self.statuses.get(id).copied().unwrap_or_default()
    }

    /// Currently selected id
    #[must_use]
    pub fn selected(&self) -> Option<&WorkItemId> {
        self.selected.as_ref()
    }

    /// Check if there is nothing left to run
    #[must_use]
    pub fn is_idle(&self) -> bool {
        self.selected.is_none() && self.queue.is_empty()
    }

    /// Full log ledger, oldest first
    #[must_use]
    pub fn logs(&self) -> &[AgentLogEntry] {
        &self.logs
    }

    /// Log entries for one item
    pub fn logs_for<'a>(
        &'a self,
        id: &'a WorkItemId,
    ) -> impl Iterator<Item = &'a AgentLogEntry> + 'a {
        self.logs.iter().filter(move |e| &e.work_item_id == id)
    }

    /// Clarification requests, oldest first
    #[must_use]
    pub fn clarifications(&self) -> &[ClarificationRequest] {
        &self.clarifications
    }

    /// Processed-file summaries, oldest first
    #[must_use]
    pub fn processed(&self) -> &[ProcessedFile] {
        &self.processed
    }

    /// Records produced for an item
    #[must_use]
    pub fn run(&self, id: &WorkItemId) -> Option<&PipelineRun> {
        self.runs.get(id)
    }

    /// Last stage that finished for an item
    #[must_use]
    pub fn last_stage(&self, id: &WorkItemId) -> Option<StageKind> {
        self.stages.get(id).copied()
    }

    /// Ids with the given status, in first-seen order
    #[must_use]
    pub fn ids_with_status(&self, status: ItemStatus) -> Vec<WorkItemId> {
        self.statuses
            .iter()
            .filter(|(_, s)| **s == status)
            .map(|(id, _)| id.clone())
            .collect()
    }

    // ---- orchestrator mutators ----

    /// Move an item to a new status
    pub(crate) fn transition(
        &mut self,
        id: &WorkItemId,
        to: ItemStatus,
    ) -> Result<(), PipelineError> {
        let from = self.status(id);
        validate_transition(id, from, to)?;
        self.statuses.insert(id.clone(), to);
        tracing::debug!("{}: {:?} -> {:?}", id, from, to);
        Ok(())
    }

    /// Append a log entry and track the stage
    pub(crate) fn push_log(&mut self, entry: AgentLogEntry) {
        self.stages.insert(entry.work_item_id.clone(), entry.stage);
        self.logs.push(entry);
    }

    /// Record questions sent for an item
    pub(crate) fn push_clarification(&mut self, id: &WorkItemId, questions: Vec<Question>) {
        self.clarifications.push(ClarificationRequest {
            work_item_id: id.clone(),
            questions,
            answered: false,
            timestamp: Utc::now(),
        });
    }

    /// Retain a finished run and its summary
    pub(crate) fn push_run(&mut self, run: PipelineRun) {
        self.processed.push(run.summary());
        self.runs.insert(run.artifact.item.id.clone(), run);
    }

    /// Pop the next not-complete id into selection, or clear it
    pub(crate) fn advance_selection(&mut self) {
        while let Some(next) = self.queue.pop_front() {
            if !self.status(&next).is_complete() {
                self.selected = Some(next);
                return;
            }
        }
        self.selected = None;
    }
}
