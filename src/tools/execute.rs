use serde::Serialize;
use serde_json::{Map, Value};

use super::args::{
    decode, CreateNoteArgs, CreateProjectArgs, CreateTaskArgs, NoteRef, ProjectRef, TaskRef,
    UpdateProjectArgs, UpdateTaskArgs, UpdateTaskStatusArgs,
};
use super::ToolKind;
use crate::error::AgentResult;
use crate::gateway::{GatewayClient, NewProject, NewTask, ProjectPatch, TaskPatch};
use crate::models::{Deleted, Note, Project, Task};

/// What a tool hands back, rendered to callers as plain JSON.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum ToolOutput {
    Projects(Vec<Project>),
    Project(Project),
    Tasks(Vec<Task>),
    Task(Task),
    Notes(Vec<Note>),
    Note(Note),
    Deleted(Deleted),
}

impl ToolKind {
    /// Run the gateway operation bound to this tool. Exactly one gateway call
    /// is made, and only after the arguments decoded cleanly.
    pub async fn invoke(
        self,
        gateway: &GatewayClient,
        args: &Map<String, Value>,
    ) -> AgentResult<ToolOutput> {
        match self {
            ToolKind::GetAllProjects => gateway.list_projects().await.map(ToolOutput::Projects),
            ToolKind::GetProjectById => {
                let a: ProjectRef = decode(self, args)?;
                gateway.get_project(&a.project_id).await.map(ToolOutput::Project)
            }
            ToolKind::CreateProject => {
                let a: CreateProjectArgs = decode(self, args)?;
                let project = NewProject {
                    name: a.name,
                    description: a.description,
                    client_name: a.client_name,
                };
                gateway.create_project(&project).await.map(ToolOutput::Project)
            }
            ToolKind::UpdateProject => {
                let a: UpdateProjectArgs = decode(self, args)?;
                let patch = ProjectPatch {
                    name: a.name,
                    description: a.description,
                    client_name: a.client_name,
                };
                gateway
                    .update_project(&a.project_id, &patch)
                    .await
                    .map(ToolOutput::Project)
            }
            ToolKind::DeleteProject => {
                let a: ProjectRef = decode(self, args)?;
                gateway.delete_project(&a.project_id).await.map(ToolOutput::Deleted)
            }
            ToolKind::GetTasksByProject => {
                let a: ProjectRef = decode(self, args)?;
                gateway.list_tasks(&a.project_id).await.map(ToolOutput::Tasks)
            }
            ToolKind::GetTaskById => {
                let a: TaskRef = decode(self, args)?;
                gateway
                    .get_task(&a.project_id, &a.task_id)
                    .await
                    .map(ToolOutput::Task)
            }
            ToolKind::CreateTask => {
                let a: CreateTaskArgs = decode(self, args)?;
                let task = NewTask {
                    name: a.name,
                    description: a.description,
                };
                gateway.create_task(&a.project_id, &task).await.map(ToolOutput::Task)
            }
            ToolKind::UpdateTask => {
                let a: UpdateTaskArgs = decode(self, args)?;
                let patch = TaskPatch {
                    name: a.name,
                    description: a.description,
                };
                gateway
                    .update_task(&a.project_id, &a.task_id, &patch)
                    .await
                    .map(ToolOutput::Task)
            }
            ToolKind::UpdateTaskStatus => {
                let a: UpdateTaskStatusArgs = decode(self, args)?;
                gateway
                    .update_task_status(&a.project_id, &a.task_id, a.status)
                    .await
                    .map(ToolOutput::Task)
            }
            ToolKind::DeleteTask => {
                let a: TaskRef = decode(self, args)?;
                gateway
                    .delete_task(&a.project_id, &a.task_id)
                    .await
                    .map(ToolOutput::Deleted)
            }
            ToolKind::GetNotesByTask => {
                let a: TaskRef = decode(self, args)?;
                gateway
                    .list_notes(&a.project_id, &a.task_id)
                    .await
                    .map(ToolOutput::Notes)
            }
            ToolKind::CreateNote => {
                let a: CreateNoteArgs = decode(self, args)?;
                gateway
                    .create_note(&a.project_id, &a.task_id, &a.content)
                    .await
                    .map(ToolOutput::Note)
            }
            ToolKind::DeleteNote => {
                let a: NoteRef = decode(self, args)?;
                gateway
                    .delete_note(&a.project_id, &a.task_id, &a.note_id)
                    .await
                    .map(ToolOutput::Deleted)
            }
        }
    }
}
