use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Execution status of a step as reported by the backend.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum StepStatus {
    Pending,
    #[serde(rename = "In_Progress")]
    InProgress,
    #[serde(rename = "Not_Ready")]
    NotReady,
    Completed,
    Failed,
}

impl StepStatus {
    pub fn is_terminal(self) -> bool {
        matches!(self, StepStatus::Completed | StepStatus::Failed)
    }
}

impl fmt::Display for StepStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            StepStatus::Pending => "Pending",
            StepStatus::InProgress => "In_Progress",
            StepStatus::NotReady => "Not_Ready",
            StepStatus::Completed => "Completed",
            StepStatus::Failed => "Failed",
        };
        f.write_str(s)
    }
}

/// A single stage of a task, as read back from the store.
///
/// Required fields are enforced by deserialization, so a malformed payload is
/// rejected before it reaches any handler.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Step {
    pub step_id: String,
    pub task_id: String,
    pub did: String,
    pub name: String,
    pub step_status: StepStatus,
    #[serde(default)]
    pub input_query: String,
    #[serde(default)]
    pub output: Option<String>,
    #[serde(default)]
    pub predecessor: Option<String>,
    #[serde(default)]
    pub is_last: bool,
    #[serde(default)]
    pub is_waiting: bool,
    #[serde(default)]
    pub order: i64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub updated_at: Option<DateTime<Utc>>,
}

impl Step {
    pub fn is_pending(&self) -> bool {
        self.step_status == StepStatus::Pending
    }
}

/// Definition of a step to be created. The store assigns the initial status.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StepDef {
    pub task_id: String,
    pub step_id: String,
    pub name: String,
    pub predecessor: String,
    pub input_query: String,
    pub is_last: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub is_waiting: Option<bool>,
    pub order: i64,
}

/// Partial update of an existing step.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StepPatch {
    pub step_id: String,
    pub task_id: String,
    pub step_status: StepStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub input_query: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub output: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub is_last: Option<bool>,
}

impl StepPatch {
    pub fn completed(step: &Step, output: impl Into<String>, is_last: bool) -> Self {
        Self {
            step_id: step.step_id.clone(),
            task_id: step.task_id.clone(),
            step_status: StepStatus::Completed,
            input_query: None,
            output: Some(output.into()),
            is_last: Some(is_last),
        }
    }

    pub fn failed(step: &Step) -> Self {
        Self {
            step_id: step.step_id.clone(),
            task_id: step.task_id.clone(),
            step_status: StepStatus::Failed,
            input_query: None,
            output: None,
            is_last: None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogLevel {
    Debug,
    Info,
    Warning,
    Error,
}

/// Progress notice attached to a task, visible to the job submitter.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TaskLog {
    pub task_id: String,
    pub message: String,
    pub level: LogLevel,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub task_status: Option<StepStatus>,
}

impl TaskLog {
    pub fn new(task_id: impl Into<String>, level: LogLevel, message: impl Into<String>) -> Self {
        Self {
            task_id: task_id.into(),
            message: message.into(),
            level,
            task_status: None,
        }
    }

    pub fn with_status(mut self, status: StepStatus) -> Self {
        self.task_status = Some(status);
        self
    }
}

/// Generates an identifier for a step created by the agent itself.
pub fn generate_step_id() -> String {
    format!("step-{}", uuid::Uuid::new_v4())
}
