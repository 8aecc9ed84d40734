//! Case context: which workflow is editing and what state the case is in.

use serde::{Deserialize, Serialize};

/// Lifecycle status of a case, owned by the backend.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum CaseStatus {
    #[default]
    Pending,
    InProgress,
    Completed,
    Reviewed,
}

impl CaseStatus {
    pub fn name(&self) -> &'static str {
        match self {
            CaseStatus::Pending => "pending",
            CaseStatus::InProgress => "in_progress",
            CaseStatus::Completed => "completed",
            CaseStatus::Reviewed => "reviewed",
        }
    }
}

/// Which editing flow a session belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Workflow {
    /// Clinician uploads an image and corrects fresh model output.
    Upload,
    /// Reviewer reopens a submitted case.
    Review,
}

/// Read-only inputs that decide whether editing is allowed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CaseContext {
    pub workflow: Workflow,
    pub status: CaseStatus,
}

impl CaseContext {
    pub fn new(workflow: Workflow, status: CaseStatus) -> Self {
        Self { workflow, status }
    }

    /// Upload flow edits only after analysis completed; review flow edits
    /// until the case is marked reviewed.
    pub fn editing_permitted(&self) -> bool {
        match self.workflow {
            Workflow::Upload => self.status == CaseStatus::Completed,
            Workflow::Review => self.status != CaseStatus::Reviewed,
        }
    }
}
