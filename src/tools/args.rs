//! Typed arguments for each tool, decoded from the model's JSON object.
//!
//! Field names follow the declared schema (snake_case), not the gateway's wire names.

use serde::de::DeserializeOwned;
use serde::Deserialize;
use serde_json::{Map, Value};

use super::ToolKind;
use crate::error::{AgentError, AgentResult};
use crate::models::TaskStatus;

#[derive(Debug, Deserialize)]
pub struct ProjectRef {
    pub project_id: String,
}

#[derive(Debug, Deserialize)]
pub struct CreateProjectArgs {
    pub name: String,
    pub description: String,
    pub client_name: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct UpdateProjectArgs {
    pub project_id: String,
    pub name: Option<String>,
    pub description: Option<String>,
    pub client_name: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct TaskRef {
    pub project_id: String,
    pub task_id: String,
}

#[derive(Debug, Deserialize)]
pub struct CreateTaskArgs {
    pub project_id: String,
    pub name: String,
    pub description: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct UpdateTaskArgs {
    pub project_id: String,
    pub task_id: String,
    pub name: Option<String>,
    pub description: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct UpdateTaskStatusArgs {
    pub project_id: String,
    pub task_id: String,
    pub status: TaskStatus,
}

#[derive(Debug, Deserialize)]
pub struct CreateNoteArgs {
    pub project_id: String,
    pub task_id: String,
    pub content: String,
}

#[derive(Debug, Deserialize)]
pub struct NoteRef {
    pub project_id: String,
    pub task_id: String,
    pub note_id: String,
}

/// Decode the argument object for `kind`.
///
/// A missing required argument or a value outside its declared type is a
/// malformed selection from the model, reported as an interpreter error.
pub fn decode<T: DeserializeOwned>(kind: ToolKind, args: &Map<String, Value>) -> AgentResult<T> {
    serde_json::from_value(Value::Object(args.clone())).map_err(|e| {
        AgentError::Interpreter(format!("invalid arguments for {}: {}", kind.name(), e))
    })
}
