//! Lifecycle markers for chatbot creation and deletion.
//!
//! Creation is a saga: each step moves [`CreationState`] forward, and any
//! failure before `Submitted` triggers compensation ending in `RolledBack`.
//! Deletion is a fixed pipeline of [`DeletionStage`]s with no compensation.

use serde::{Deserialize, Serialize};

use std::fmt;

/// States of the creation saga.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CreationState {
    Start,
    RecordCreated,
    ObjectsUploaded,
    /// Terminal success.
    Submitted,
    /// Terminal failure, compensation has run.
    RolledBack,
}

impl CreationState {
    pub fn is_terminal(self) -> bool {
        matches!(self, CreationState::Submitted | CreationState::RolledBack)
    }

    /// Legal saga transitions: one step forward, or rollback from any
    /// non-terminal state.
    pub fn can_advance_to(self, next: CreationState) -> bool {
        use CreationState::*;
        match (self, next) {
            (Start, RecordCreated) | (RecordCreated, ObjectsUploaded) | (ObjectsUploaded, Submitted) => {
                true
            }
            (current, RolledBack) => !current.is_terminal(),
            _ => false,
        }
    }
}

impl fmt::Display for CreationState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CreationState::Start => write!(f, "start"),
            CreationState::RecordCreated => write!(f, "record_created"),
            CreationState::ObjectsUploaded => write!(f, "objects_uploaded"),
            CreationState::Submitted => write!(f, "submitted"),
            CreationState::RolledBack => write!(f, "rolled_back"),
        }
    }
}

/// Steps of the deletion pipeline, in execution order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DeletionStage {
    PurgeObjects,
    DeleteProcessingData,
    DeleteRecord,
}

impl DeletionStage {
    /// Whether the chatbot's stored objects were already purged when this
    /// stage failed.
    pub fn objects_purged(self) -> bool {
        self > DeletionStage::PurgeObjects
    }

    /// Whether the processing service had already discarded the chatbot's
    /// data when this stage failed.
    pub fn processing_data_deleted(self) -> bool {
        self > DeletionStage::DeleteProcessingData
    }
}

impl fmt::Display for DeletionStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DeletionStage::PurgeObjects => write!(f, "purge_objects"),
            DeletionStage::DeleteProcessingData => write!(f, "delete_processing_data"),
            DeletionStage::DeleteRecord => write!(f, "delete_record"),
        }
    }
}

/// Outcome of one compensating action.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "outcome", content = "detail", rename_all = "snake_case")]
pub enum CompensationOutcome {
    /// Nothing to undo.
    Skipped,
    Succeeded,
    Failed(String),
}

impl fmt::Display for CompensationOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CompensationOutcome::Skipped => write!(f, "skipped"),
            CompensationOutcome::Succeeded => write!(f, "succeeded"),
            CompensationOutcome::Failed(reason) => write!(f, "failed ({reason})"),
        }
    }
}

/// What the creation rollback managed to undo.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CompensationReport {
    /// Keys that were uploaded before the failure and targeted by rollback.
    pub uploaded_keys: Vec<String>,
    pub objects: CompensationOutcome,
    pub record: CompensationOutcome,
}

impl CompensationReport {
    /// True when nothing was left behind.
    pub fn is_clean(&self) -> bool {
        !matches!(self.objects, CompensationOutcome::Failed(_))
            && !matches!(self.record, CompensationOutcome::Failed(_))
    }
}

impl fmt::Display for CompensationReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "objects: {} ({} keys), record: {}",
            self.objects,
            self.uploaded_keys.len(),
            self.record
        )
    }
}
