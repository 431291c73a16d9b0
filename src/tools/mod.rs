pub mod args;
pub mod execute;

pub use execute::ToolOutput;

use serde_json::{json, Map, Value};

/// Every operation the model may select. Adding a variant forces a schema
/// entry in [`ToolKind::spec`] and a binding in [`ToolKind::invoke`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ToolKind {
    GetAllProjects,
    GetProjectById,
    CreateProject,
    UpdateProject,
    DeleteProject,
    GetTasksByProject,
    GetTaskById,
    CreateTask,
    UpdateTask,
    UpdateTaskStatus,
    DeleteTask,
    GetNotesByTask,
    CreateNote,
    DeleteNote,
}

/// One declared argument of a tool.
#[derive(Debug, Clone, Copy)]
pub struct ToolParam {
    pub name: &'static str,
    /// JSON Schema type; every argument here is a string.
    pub param_type: &'static str,
    pub description: &'static str,
    pub required: bool,
    /// Closed set of accepted values, empty when unconstrained.
    pub allowed: &'static [&'static str],
}

impl ToolParam {
    const fn required(name: &'static str, description: &'static str) -> Self {
        Self {
            name,
            param_type: "string",
            description,
            required: true,
            allowed: &[],
        }
    }

    const fn optional(name: &'static str, description: &'static str) -> Self {
        Self {
            required: false,
            ..Self::required(name, description)
        }
    }
}

#[derive(Debug)]
pub struct ToolSpec {
    pub kind: ToolKind,
    pub name: &'static str,
    pub description: &'static str,
    pub params: &'static [ToolParam],
}

const PROJECT_ID: ToolParam = ToolParam::required("project_id", "ID del proyecto");
const TASK_ID: ToolParam = ToolParam::required("task_id", "ID de la tarea");

const TASK_STATUSES: &[&str] = &["pending", "onHold", "inProgress", "underReview", "completed"];

static GET_ALL_PROJECTS: ToolSpec = ToolSpec {
    kind: ToolKind::GetAllProjects,
    name: "get_all_projects",
    description: "Obtiene todos los proyectos disponibles",
    params: &[],
};

static GET_PROJECT_BY_ID: ToolSpec = ToolSpec {
    kind: ToolKind::GetProjectById,
    name: "get_project_by_id",
    description: "Obtiene un proyecto específico por su ID",
    params: &[ToolParam::required("project_id", "ID del proyecto a buscar")],
};

static CREATE_PROJECT: ToolSpec = ToolSpec {
    kind: ToolKind::CreateProject,
    name: "create_project",
    description: "Crea un nuevo proyecto",
    params: &[
        ToolParam::required("name", "Nombre del proyecto"),
        ToolParam::required("description", "Descripción del proyecto"),
        ToolParam::optional("client_name", "Nombre del cliente"),
    ],
};

static UPDATE_PROJECT: ToolSpec = ToolSpec {
    kind: ToolKind::UpdateProject,
    name: "update_project",
    description: "Actualiza un proyecto existente",
    params: &[
        PROJECT_ID,
        ToolParam::optional("name", "Nuevo nombre del proyecto"),
        ToolParam::optional("description", "Nueva descripción"),
        ToolParam::optional("client_name", "Nuevo nombre del cliente"),
    ],
};

static DELETE_PROJECT: ToolSpec = ToolSpec {
    kind: ToolKind::DeleteProject,
    name: "delete_project",
    description: "Elimina un proyecto",
    params: &[ToolParam::required("project_id", "ID del proyecto a eliminar")],
};

static GET_TASKS_BY_PROJECT: ToolSpec = ToolSpec {
    kind: ToolKind::GetTasksByProject,
    name: "get_tasks_by_project",
    description: "Obtiene todas las tareas de un proyecto",
    params: &[PROJECT_ID],
};

static GET_TASK_BY_ID: ToolSpec = ToolSpec {
    kind: ToolKind::GetTaskById,
    name: "get_task_by_id",
    description: "Obtiene una tarea específica",
    params: &[PROJECT_ID, TASK_ID],
};

static CREATE_TASK: ToolSpec = ToolSpec {
    kind: ToolKind::CreateTask,
    name: "create_task",
    description: "Crea una nueva tarea en un proyecto",
    params: &[
        PROJECT_ID,
        ToolParam::required("name", "Nombre de la tarea"),
        ToolParam::optional("description", "Descripción de la tarea"),
    ],
};

static UPDATE_TASK: ToolSpec = ToolSpec {
    kind: ToolKind::UpdateTask,
    name: "update_task",
    description: "Actualiza una tarea existente",
    params: &[
        PROJECT_ID,
        TASK_ID,
        ToolParam::optional("name", "Nuevo nombre"),
        ToolParam::optional("description", "Nueva descripción"),
    ],
};

static UPDATE_TASK_STATUS: ToolSpec = ToolSpec {
    kind: ToolKind::UpdateTaskStatus,
    name: "update_task_status",
    description: "Actualiza el estado de una tarea",
    params: &[
        PROJECT_ID,
        TASK_ID,
        ToolParam {
            allowed: TASK_STATUSES,
            ..ToolParam::required("status", "Nuevo estado")
        },
    ],
};

static DELETE_TASK: ToolSpec = ToolSpec {
    kind: ToolKind::DeleteTask,
    name: "delete_task",
    description: "Elimina una tarea",
    params: &[PROJECT_ID, TASK_ID],
};

static GET_NOTES_BY_TASK: ToolSpec = ToolSpec {
    kind: ToolKind::GetNotesByTask,
    name: "get_notes_by_task",
    description: "Obtiene todas las notas de una tarea",
    params: &[PROJECT_ID, TASK_ID],
};

static CREATE_NOTE: ToolSpec = ToolSpec {
    kind: ToolKind::CreateNote,
    name: "create_note",
    description: "Crea una nota en una tarea",
    params: &[
        PROJECT_ID,
        TASK_ID,
        ToolParam::required("content", "Contenido de la nota"),
    ],
};

static DELETE_NOTE: ToolSpec = ToolSpec {
    kind: ToolKind::DeleteNote,
    name: "delete_note",
    description: "Elimina una nota",
    params: &[
        PROJECT_ID,
        TASK_ID,
        ToolParam::required("note_id", "ID de la nota"),
    ],
};

impl ToolKind {
    pub const ALL: [ToolKind; 14] = [
        ToolKind::GetAllProjects,
        ToolKind::GetProjectById,
        ToolKind::CreateProject,
        ToolKind::UpdateProject,
        ToolKind::DeleteProject,
        ToolKind::GetTasksByProject,
        ToolKind::GetTaskById,
        ToolKind::CreateTask,
        ToolKind::UpdateTask,
        ToolKind::UpdateTaskStatus,
        ToolKind::DeleteTask,
        ToolKind::GetNotesByTask,
        ToolKind::CreateNote,
        ToolKind::DeleteNote,
    ];

    pub fn spec(self) -> &'static ToolSpec {
        match self {
            ToolKind::GetAllProjects => &GET_ALL_PROJECTS,
            ToolKind::GetProjectById => &GET_PROJECT_BY_ID,
            ToolKind::CreateProject => &CREATE_PROJECT,
            ToolKind::UpdateProject => &UPDATE_PROJECT,
            ToolKind::DeleteProject => &DELETE_PROJECT,
            ToolKind::GetTasksByProject => &GET_TASKS_BY_PROJECT,
            ToolKind::GetTaskById => &GET_TASK_BY_ID,
            ToolKind::CreateTask => &CREATE_TASK,
            ToolKind::UpdateTask => &UPDATE_TASK,
            ToolKind::UpdateTaskStatus => &UPDATE_TASK_STATUS,
            ToolKind::DeleteTask => &DELETE_TASK,
            ToolKind::GetNotesByTask => &GET_NOTES_BY_TASK,
            ToolKind::CreateNote => &CREATE_NOTE,
            ToolKind::DeleteNote => &DELETE_NOTE,
        }
    }

    pub fn name(self) -> &'static str {
        self.spec().name
    }

    /// The only name → tag lookup; the model sees exactly these names.
    pub fn from_name(name: &str) -> Option<ToolKind> {
        all_tools()
            .into_iter()
            .find(|spec| spec.name == name)
            .map(|spec| spec.kind)
    }
}

/// Return the whole catalog in declaration order.
pub fn all_tools() -> Vec<&'static ToolSpec> {
    ToolKind::ALL.into_iter().map(ToolKind::spec).collect()
}

/// Build the JSON Schema `properties` / `required` pair for a parameter list.
fn params_to_json_schema(params: &[ToolParam]) -> (Value, Value) {
    let mut properties = Map::new();
    let mut required = Vec::new();

    for p in params {
        let mut prop = Map::new();
        prop.insert("type".into(), json!(p.param_type));
        prop.insert("description".into(), json!(p.description));

        if !p.allowed.is_empty() {
            prop.insert("format".into(), json!("enum"));
            prop.insert("enum".into(), json!(p.allowed));
        }

        properties.insert(p.name.to_string(), Value::Object(prop));
        if p.required {
            required.push(json!(p.name));
        }
    }

    (Value::Object(properties), Value::Array(required))
}

/// Google Gemini function-declaration format.
///
/// ```json
/// { "name", "description", "parameters": { … } }
/// ```
///
/// Gemini rejects object schemas without properties, so parameterless tools
/// carry no `parameters` key at all.
pub fn tools_google() -> Vec<Value> {
    all_tools()
        .into_iter()
        .map(|t| {
            if t.params.is_empty() {
                return json!({ "name": t.name, "description": t.description });
            }
            let (properties, required) = params_to_json_schema(t.params);
            json!({
                "name": t.name,
                "description": t.description,
                "parameters": {
                    "type": "object",
                    "properties": properties,
                    "required": required,
                }
            })
        })
        .collect()
}
