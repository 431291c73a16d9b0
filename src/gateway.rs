use reqwest::{Method, Url};
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::{json, Value};
use std::sync::Arc;

use crate::auth::CredentialManager;
use crate::error::{AgentError, AgentResult};
use crate::models::{Deleted, Note, Project, Task, TaskStatus};

/// Fields for a new project. An empty client name is not sent.
#[derive(Debug, Clone, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct NewProject {
    pub name: String,
    pub description: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub client_name: Option<String>,
}

/// Partial project update: only the fields that are set and non-empty go out.
#[derive(Debug, Clone, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ProjectPatch {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub client_name: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct NewTask {
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct TaskPatch {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

/// Keep a field only if it carries something.
pub(crate) fn non_empty(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.trim().is_empty())
}

impl NewProject {
    fn compact(&self) -> Self {
        Self {
            client_name: non_empty(self.client_name.clone()),
            ..self.clone()
        }
    }
}

impl ProjectPatch {
    fn compact(&self) -> Self {
        Self {
            name: non_empty(self.name.clone()),
            description: non_empty(self.description.clone()),
            client_name: non_empty(self.client_name.clone()),
        }
    }
}

impl NewTask {
    fn compact(&self) -> Self {
        Self {
            name: self.name.clone(),
            description: non_empty(self.description.clone()),
        }
    }
}

impl TaskPatch {
    fn compact(&self) -> Self {
        Self {
            name: non_empty(self.name.clone()),
            description: non_empty(self.description.clone()),
        }
    }
}

/// Authenticated client for the task gateway's REST API.
///
/// The inner `reqwest::Client` is a connection pool; clone the gateway's `Arc`
/// rather than building new clients per request.
pub struct GatewayClient {
    base_url: String,
    client: reqwest::Client,
    credentials: Arc<CredentialManager>,
}

impl GatewayClient {
    pub fn new(
        base_url: &str,
        client: reqwest::Client,
        credentials: Arc<CredentialManager>,
    ) -> Self {
        Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            client,
            credentials,
        }
    }

    // ==================== PROJECTS ====================

    pub async fn list_projects(&self) -> AgentResult<Vec<Project>> {
        self.fetch(Method::GET, &["api", "projects"], None).await
    }

    pub async fn get_project(&self, project_id: &str) -> AgentResult<Project> {
        self.fetch(Method::GET, &["api", "projects", project_id], None)
            .await
    }

    pub async fn create_project(&self, project: &NewProject) -> AgentResult<Project> {
        let body = to_body(&project.compact())?;
        self.fetch(Method::POST, &["api", "projects"], Some(body))
            .await
    }

    pub async fn update_project(
        &self,
        project_id: &str,
        patch: &ProjectPatch,
    ) -> AgentResult<Project> {
        let body = to_body(&patch.compact())?;
        self.fetch(Method::PUT, &["api", "projects", project_id], Some(body))
            .await
    }

    pub async fn delete_project(&self, project_id: &str) -> AgentResult<Deleted> {
        self.send(Method::DELETE, &["api", "projects", project_id], None)
            .await?;
        Ok(Deleted::new("Project deleted successfully"))
    }

    // ==================== TASKS ====================

    pub async fn list_tasks(&self, project_id: &str) -> AgentResult<Vec<Task>> {
        self.fetch(Method::GET, &tasks_path(project_id), None).await
    }

    pub async fn get_task(&self, project_id: &str, task_id: &str) -> AgentResult<Task> {
        self.fetch(Method::GET, &task_path(project_id, task_id), None)
            .await
    }

    pub async fn create_task(&self, project_id: &str, task: &NewTask) -> AgentResult<Task> {
        let body = to_body(&task.compact())?;
        self.fetch(Method::POST, &tasks_path(project_id), Some(body))
            .await
    }

    pub async fn update_task(
        &self,
        project_id: &str,
        task_id: &str,
        patch: &TaskPatch,
    ) -> AgentResult<Task> {
        let body = to_body(&patch.compact())?;
        self.fetch(Method::PUT, &task_path(project_id, task_id), Some(body))
            .await
    }

    pub async fn update_task_status(
        &self,
        project_id: &str,
        task_id: &str,
        status: TaskStatus,
    ) -> AgentResult<Task> {
        log::info!("Gateway: moving task {} to {}", task_id, status);
        let mut path = task_path(project_id, task_id);
        path.push("status");
        self.fetch(Method::POST, &path, Some(json!({ "status": status })))
            .await
    }

    pub async fn delete_task(&self, project_id: &str, task_id: &str) -> AgentResult<Deleted> {
        self.send(Method::DELETE, &task_path(project_id, task_id), None)
            .await?;
        Ok(Deleted::new("Task deleted successfully"))
    }

    // ==================== NOTES ====================

    pub async fn list_notes(&self, project_id: &str, task_id: &str) -> AgentResult<Vec<Note>> {
        self.fetch(Method::GET, &notes_path(project_id, task_id), None)
            .await
    }

    pub async fn create_note(
        &self,
        project_id: &str,
        task_id: &str,
        content: &str,
    ) -> AgentResult<Note> {
        let body = json!({ "content": content });
        self.fetch(Method::POST, &notes_path(project_id, task_id), Some(body))
            .await
    }

    pub async fn delete_note(
        &self,
        project_id: &str,
        task_id: &str,
        note_id: &str,
    ) -> AgentResult<Deleted> {
        let mut path = notes_path(project_id, task_id);
        path.push(note_id);
        self.send(Method::DELETE, &path, None).await?;
        Ok(Deleted::new("Note deleted successfully"))
    }

    // ==================== TRANSPORT ====================

    async fn fetch<T: DeserializeOwned>(
        &self,
        method: Method,
        segments: &[&str],
        body: Option<Value>,
    ) -> AgentResult<T> {
        let response = self.send(method, segments, body).await?;
        response
            .json::<T>()
            .await
            .map_err(|e| AgentError::GatewayDecode(e.to_string()))
    }

    /// Each segment is percent-encoded on its own, so an id can never reach
    /// a different resource.
    fn url(&self, segments: &[&str]) -> AgentResult<Url> {
        let invalid = |reason: String| {
            let message = format!("invalid gateway URL {}: {}", self.base_url, reason);
            AgentError::GatewayTransport(message)
        };

        let mut url = Url::parse(&self.base_url).map_err(|e| invalid(e.to_string()))?;
        url.path_segments_mut()
            .map_err(|_| invalid("cannot be a base".to_string()))?
            .pop_if_empty()
            .extend(segments);
        Ok(url)
    }

    async fn send(
        &self,
        method: Method,
        segments: &[&str],
        body: Option<Value>,
    ) -> AgentResult<reqwest::Response> {
        let url = self.url(segments)?;

        self.credentials.get_token().await?;
        let headers = self.credentials.get_auth_headers()?;

        log::info!("Gateway: {} {}", method, url.path());

        let mut request = self.client.request(method, url.clone()).headers(headers);
        if let Some(body) = body {
            request = request.json(&body);
        }

        let response = request
            .send()
            .await
            .map_err(|e| AgentError::GatewayTransport(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            log::warn!("Gateway: {} for {}", status, url.path());
            return Err(AgentError::Gateway {
                status: status.as_u16(),
                body,
            });
        }

        Ok(response)
    }
}

fn to_body<T: Serialize>(payload: &T) -> AgentResult<Value> {
    serde_json::to_value(payload).map_err(|e| AgentError::GatewayDecode(e.to_string()))
}

fn tasks_path(project_id: &str) -> Vec<&str> {
    vec!["api", "projects", project_id, "tasks"]
}

fn task_path<'a>(project_id: &'a str, task_id: &'a str) -> Vec<&'a str> {
    let mut path = tasks_path(project_id);
    path.push(task_id);
    path
}

fn notes_path<'a>(project_id: &'a str, task_id: &'a str) -> Vec<&'a str> {
    let mut path = task_path(project_id, task_id);
    path.push("notes");
    path
}
