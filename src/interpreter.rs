use serde_json::{Map, Value};

use crate::config::GeminiConfig;
use crate::error::{AgentError, AgentResult};
use crate::gemini::{GeminiClient, GenerateRequest, Part};
use crate::tools;

/// A tool picked by the model, with only the arguments it actually set.
#[derive(Debug, Clone, PartialEq)]
pub struct ToolCall {
    pub name: String,
    pub arguments: Map<String, Value>,
}

/// What the model decided to do with a query.
#[derive(Debug, Clone, PartialEq)]
pub enum Decision {
    FreeText(String),
    ToolCall(ToolCall),
}

/// Maps a user query to a [`Decision`].
///
/// Object-safe so the dispatcher can hold any implementation behind an `Arc`.
#[async_trait::async_trait]
pub trait QueryInterpreter: Send + Sync {
    async fn interpret(&self, query: &str) -> AgentResult<Decision>;
}

/// Interpreter backed by a Gemini function-calling request.
pub struct GeminiInterpreter {
    gemini: GeminiClient,
    temperature: f32,
    declarations: Vec<Value>,
}

impl GeminiInterpreter {
    pub fn new(gemini: GeminiClient, temperature: f32) -> Self {
        Self {
            gemini,
            temperature,
            declarations: tools::tools_google(),
        }
    }

    pub fn from_config(config: &GeminiConfig, api_key: &str) -> AgentResult<Self> {
        let gemini = GeminiClient::new(
            config.endpoint.clone(),
            config.model.clone(),
            api_key.to_string(),
            std::time::Duration::from_secs(config.timeout_secs),
        )?;
        Ok(Self::new(gemini, config.temperature))
    }

    fn build_prompt(query: &str) -> String {
        format!(
            "Usuario: {}\n\nAnaliza la consulta y usa la herramienta apropiada para gestionar proyectos, tareas y notas.",
            query
        )
    }
}

#[async_trait::async_trait]
impl QueryInterpreter for GeminiInterpreter {
    async fn interpret(&self, query: &str) -> AgentResult<Decision> {
        log::info!("Interpreter: analysing query with {}", self.gemini.model);

        let parts = self
            .gemini
            .generate(GenerateRequest {
                prompt: Self::build_prompt(query),
                tools: self.declarations.clone(),
                temperature: self.temperature,
            })
            .await?;

        decide(parts)
    }
}

/// Turn the model's reply parts into a decision.
///
/// The first function call wins; without one, all text parts are joined.
pub fn decide(parts: Vec<Part>) -> AgentResult<Decision> {
    let mut text = String::new();

    for part in parts {
        if let Some(call) = part.function_call {
            if call.name.trim().is_empty() {
                return Err(AgentError::Interpreter(
                    "function call without a name".to_string(),
                ));
            }
            return Ok(Decision::ToolCall(ToolCall {
                name: call.name,
                arguments: explicit_arguments(call.args.unwrap_or_default()),
            }));
        }
        if let Some(t) = part.text {
            text.push_str(&t);
        }
    }

    if text.trim().is_empty() {
        log::warn!("Interpreter: model returned neither text nor a tool call");
    }
    Ok(Decision::FreeText(text))
}

/// Drop arguments the model left unset so they never overwrite gateway data.
fn explicit_arguments(args: Map<String, Value>) -> Map<String, Value> {
    args.into_iter()
        .filter(|(_, value)| match value {
            Value::Null => false,
            Value::String(s) => !s.trim().is_empty(),
            _ => true,
        })
        .collect()
}
