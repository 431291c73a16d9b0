//! Local projections of the records served by the task gateway.
//!
//! These types are never authoritative; they only exist to deserialize gateway
//! responses and to render them back to callers.

use serde::{Deserialize, Serialize};
use std::fmt;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Project {
    #[serde(rename = "_id")]
    pub id: String,
    pub name: String,
    pub description: String,
    #[serde(rename = "userId")]
    pub owner: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub client_name: Option<String>,
    #[serde(default = "default_active")]
    pub is_active: bool,
    pub created_at: String,
    pub updated_at: String,
}

fn default_active() -> bool {
    true
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum TaskStatus {
    Pending,
    OnHold,
    InProgress,
    UnderReview,
    Completed,
}

impl TaskStatus {
    #[cfg(test)]
    pub const ALL: [TaskStatus; 5] = [
        TaskStatus::Pending,
        TaskStatus::OnHold,
        TaskStatus::InProgress,
        TaskStatus::UnderReview,
        TaskStatus::Completed,
    ];

    /// Wire name as the gateway spells it.
    pub fn as_str(&self) -> &'static str {
        match self {
            TaskStatus::Pending => "pending",
            TaskStatus::OnHold => "onHold",
            TaskStatus::InProgress => "inProgress",
            TaskStatus::UnderReview => "underReview",
            TaskStatus::Completed => "completed",
        }
    }
}

impl fmt::Display for TaskStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CompletedBy {
    pub user_id: String,
    pub status: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Task {
    #[serde(rename = "_id")]
    pub id: String,
    pub name: String,
    pub description: String,
    pub project_id: String,
    pub status: TaskStatus,
    #[serde(default)]
    pub completed_by: Vec<CompletedBy>,
    pub created_at: String,
    pub updated_at: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Note {
    #[serde(rename = "_id")]
    pub id: String,
    pub content: String,
    pub created_by: String,
    pub task_id: String,
    pub created_at: String,
    pub updated_at: String,
}

/// Acknowledgment returned by delete operations in place of a record.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Deleted {
    pub message: String,
}

impl Deleted {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}
