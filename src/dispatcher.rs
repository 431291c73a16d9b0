use std::sync::Arc;

use crate::auth::CredentialManager;
use crate::config::Config;
use crate::error::{AgentError, AgentResult};
use crate::gateway::GatewayClient;
use crate::interpreter::{Decision, GeminiInterpreter, QueryInterpreter};
use crate::tools::{ToolKind, ToolOutput};

/// Whether the dispatcher narrates its progress on stdout.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Mode {
    /// For the HTTP front end: only the result or the error comes back.
    Silent,
    /// For the terminal: progress lines are printed as the query is handled.
    Verbose,
}

/// Result of handling one query.
#[derive(Debug, Clone, PartialEq)]
pub enum Reply {
    Text(String),
    Tool { name: String, output: ToolOutput },
}

impl Reply {
    /// Text shown to a user: free text as-is, tool output as pretty JSON.
    pub fn render(&self) -> String {
        match self {
            Reply::Text(text) if text.trim().is_empty() => {
                "Operación completada exitosamente".to_string()
            }
            Reply::Text(text) => text.clone(),
            Reply::Tool { output, .. } => {
                serde_json::to_string_pretty(output).unwrap_or_else(|_| format!("{:?}", output))
            }
        }
    }
}

/// Runs the interpret → dispatch pipeline for one query at a time.
pub struct Dispatcher {
    interpreter: Arc<dyn QueryInterpreter>,
    gateway: Arc<GatewayClient>,
}

impl Dispatcher {
    pub fn new(interpreter: Arc<dyn QueryInterpreter>, gateway: Arc<GatewayClient>) -> Self {
        Self {
            interpreter,
            gateway,
        }
    }

    /// Wire up Gemini, the credential manager and the gateway from configuration.
    ///
    /// Fails with a configuration error when no provider key is present.
    pub fn from_config(config: &Config) -> AgentResult<Self> {
        let api_key = config.require_api_key()?;
        let interpreter = GeminiInterpreter::from_config(&config.gemini, api_key)?;

        let client = reqwest::Client::builder()
            .timeout(config.gateway.timeout())
            .build()
            .map_err(|e| {
                AgentError::GatewayTransport(format!("failed to build HTTP client: {}", e))
            })?;
        let credentials = Arc::new(CredentialManager::new(&config.gateway, client.clone()));
        let gateway = GatewayClient::new(&config.gateway.base_url, client, credentials);

        Ok(Self::new(Arc::new(interpreter), Arc::new(gateway)))
    }

    pub async fn handle(&self, query: &str, mode: Mode) -> AgentResult<Reply> {
        let verbose = mode == Mode::Verbose;

        if verbose {
            println!("🤔 Analizando con Gemini: '{}'", query);
        }
        let decision = self.interpreter.interpret(query).await?;

        let call = match decision {
            Decision::FreeText(text) => {
                log::info!("Dispatcher: free-text answer ({} chars)", text.len());
                if verbose {
                    println!("\n💬 Respuesta de Gemini:");
                    println!("{}", text);
                }
                return Ok(Reply::Text(text));
            }
            Decision::ToolCall(call) => call,
        };

        let kind = ToolKind::from_name(&call.name).ok_or_else(|| {
            log::error!("Dispatcher: model selected unregistered tool {}", call.name);
            AgentError::Dispatch(format!("unknown tool: {}", call.name))
        })?;

        log::info!("Dispatcher: running {}", kind.name());
        if verbose {
            println!("🔧 Herramienta seleccionada: {}", kind.name());
            println!("📋 Argumentos: {}", serde_json::Value::Object(call.arguments.clone()));
            println!("⚙️  Ejecutando herramienta...");
        }

        let output = kind.invoke(&self.gateway, &call.arguments).await?;
        let reply = Reply::Tool {
            name: kind.name().to_string(),
            output,
        };

        if verbose {
            println!("\n✅ Resultado:");
            println!("{}", reply.render());
        }
        Ok(reply)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::interpreter::ToolCall;
    use crate::models::TaskStatus;
    use crate::testing::{gateway_for, project_json, task_json, MockServer};
    use serde_json::{json, Map, Value};
    use std::sync::Mutex;

    /// Interpreter that replays a fixed decision and remembers what it was asked.
    struct Scripted {
        decision: AgentResult<Decision>,
        queries: Mutex<Vec<String>>,
    }

    impl Scripted {
        fn new(decision: Decision) -> Arc<Self> {
            Arc::new(Self {
                decision: Ok(decision),
                queries: Mutex::new(Vec::new()),
            })
        }

        fn failing() -> Arc<Self> {
            Arc::new(Self {
                decision: Err(AgentError::Interpreter("quota exceeded".to_string())),
                queries: Mutex::new(Vec::new()),
            })
        }
    }

    #[async_trait::async_trait]
    impl QueryInterpreter for Scripted {
        async fn interpret(&self, query: &str) -> AgentResult<Decision> {
            self.queries.lock().unwrap().push(query.to_string());
            match &self.decision {
                Ok(decision) => Ok(decision.clone()),
                Err(e) => Err(AgentError::Interpreter(e.to_string())),
            }
        }
    }

    fn tool_call(name: &str, args: Value) -> Decision {
        let arguments: Map<String, Value> = args.as_object().cloned().unwrap_or_default();
        Decision::ToolCall(ToolCall {
            name: name.to_string(),
            arguments,
        })
    }

    fn dispatcher(server: &MockServer, interpreter: Arc<Scripted>) -> Dispatcher {
        Dispatcher::new(interpreter, Arc::new(gateway_for(server)))
    }

    #[tokio::test]
    async fn test_free_text_is_returned_verbatim() {
        let server = MockServer::start().await;
        let text = "Puedo ayudarte con proyectos, tareas y notas.";
        let dispatcher = dispatcher(&server, Scripted::new(Decision::FreeText(text.to_string())));

        for mode in [Mode::Silent, Mode::Verbose] {
            let reply = dispatcher.handle("¿Qué puedes hacer?", mode).await.unwrap();
            assert_eq!(reply, Reply::Text(text.to_string()));
        }
        assert!(server.requests().is_empty());
        assert_eq!(server.logins(), 0);
    }

    #[tokio::test]
    async fn test_list_projects_end_to_end() {
        let server = MockServer::start().await;
        server.on("GET", "/api/projects", 200, json!([project_json("1", "A")]));
        let interpreter = Scripted::new(tool_call("get_all_projects", json!({})));
        let dispatcher = dispatcher(&server, interpreter.clone());

        let reply = dispatcher
            .handle("Muéstrame todos los proyectos", Mode::Silent)
            .await
            .unwrap();

        assert_eq!(interpreter.queries.lock().unwrap()[0], "Muéstrame todos los proyectos");
        match reply {
            Reply::Tool {
                name,
                output: ToolOutput::Projects(projects),
            } => {
                assert_eq!(name, "get_all_projects");
                assert_eq!(projects.len(), 1);
                assert_eq!(projects[0].id, "1");
            }
            other => panic!("unexpected reply: {:?}", other),
        }
        assert_eq!(server.requests().len(), 1);
    }

    #[tokio::test]
    async fn test_update_task_status_end_to_end() {
        let server = MockServer::start().await;
        server.on(
            "POST",
            "/api/projects/p1/tasks/t1/status",
            200,
            task_json("t1", "p1", "completed"),
        );
        let interpreter = Scripted::new(tool_call(
            "update_task_status",
            json!({ "project_id": "p1", "task_id": "t1", "status": "completed" }),
        ));

        let reply = dispatcher(&server, interpreter)
            .handle("Marca la tarea t1 como completada", Mode::Verbose)
            .await
            .unwrap();

        let Reply::Tool { output: ToolOutput::Task(task), .. } = reply else {
            panic!("expected a task");
        };
        assert_eq!(task.status, TaskStatus::Completed);

        let requests = server.requests();
        assert_eq!(requests.len(), 1);
        assert_eq!(requests[0].method, "POST");
        assert_eq!(requests[0].path, "/api/projects/p1/tasks/t1/status");
        assert_eq!(requests[0].body, Some(json!({ "status": "completed" })));
    }

    #[tokio::test]
    async fn test_update_project_forwards_only_set_fields() {
        let server = MockServer::start().await;
        server.on("PUT", "/api/projects/p1", 200, project_json("p1", "Renombrado"));
        let interpreter = Scripted::new(tool_call(
            "update_project",
            json!({ "project_id": "p1", "name": "Renombrado" }),
        ));

        dispatcher(&server, interpreter)
            .handle("Renombra el proyecto p1", Mode::Silent)
            .await
            .unwrap();

        let requests = server.requests();
        assert_eq!(requests.len(), 1);
        assert_eq!(requests[0].body, Some(json!({ "name": "Renombrado" })));
    }

    #[tokio::test]
    async fn test_unknown_tool_is_dispatch_error() {
        let server = MockServer::start().await;
        let interpreter = Scripted::new(tool_call("archive_everything", json!({})));

        let err = dispatcher(&server, interpreter)
            .handle("archiva todo", Mode::Silent)
            .await
            .unwrap_err();

        assert!(matches!(err, AgentError::Dispatch(ref m) if m.contains("archive_everything")));
        assert!(server.requests().is_empty());
        assert_eq!(server.logins(), 0);
    }

    #[tokio::test]
    async fn test_gateway_errors_pass_through() {
        let server = MockServer::start().await;
        server.on("GET", "/api/projects/zz", 404, json!({ "error": "Project not found" }));
        let interpreter =
            Scripted::new(tool_call("get_project_by_id", json!({ "project_id": "zz" })));

        let err = dispatcher(&server, interpreter)
            .handle("Muéstrame el proyecto zz", Mode::Silent)
            .await
            .unwrap_err();

        assert!(matches!(err, AgentError::Gateway { status: 404, .. }));
    }

    #[tokio::test]
    async fn test_interpreter_errors_pass_through() {
        let server = MockServer::start().await;

        let err = dispatcher(&server, Scripted::failing())
            .handle("hola", Mode::Silent)
            .await
            .unwrap_err();

        assert!(matches!(err, AgentError::Interpreter(_)));
        assert!(server.requests().is_empty());
    }

    #[test]
    fn test_render() {
        assert_eq!(Reply::Text("hola".to_string()).render(), "hola");
        assert_eq!(Reply::Text(String::new()).render(), "Operación completada exitosamente");

        let project = serde_json::from_value(project_json("1", "A")).unwrap();
        let reply = Reply::Tool {
            name: "get_project_by_id".to_string(),
            output: ToolOutput::Project(project),
        };
        let rendered: Value = serde_json::from_str(&reply.render()).unwrap();
        assert_eq!(rendered["_id"], "1");
    }

    #[test]
    fn test_from_config_requires_api_key() {
        let err = Dispatcher::from_config(&Config::default()).err().unwrap();
        assert!(err.is_config());
    }
}
