use serde::Deserialize;
use serde_json::{Map, Value};
use std::time::Duration;

use crate::error::{AgentError, AgentResult};

/// Shared HTTP client for Gemini `generateContent` calls.
pub struct GeminiClient {
    pub endpoint: String,
    pub model: String,
    api_key: String,
    client: reqwest::Client,
}

/// Parameters for a single-turn generation request.
pub struct GenerateRequest {
    pub prompt: String,
    /// Function declarations offered to the model; empty disables tool use.
    pub tools: Vec<Value>,
    pub temperature: f32,
}

/// One part of the model's reply: either text or a function call.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Part {
    pub text: Option<String>,
    pub function_call: Option<FunctionCall>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct FunctionCall {
    pub name: String,
    #[serde(default)]
    pub args: Option<Map<String, Value>>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct GenerateResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
    prompt_feedback: Option<PromptFeedback>,
}

#[derive(Debug, Deserialize)]
struct Candidate {
    content: Option<Content>,
}

#[derive(Debug, Deserialize)]
struct Content {
    #[serde(default)]
    parts: Vec<Part>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct PromptFeedback {
    block_reason: Option<String>,
}

impl GeminiClient {
    pub fn new(
        endpoint: String,
        model: String,
        api_key: String,
        timeout: Duration,
    ) -> AgentResult<Self> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| AgentError::Interpreter(format!("failed to build HTTP client: {}", e)))?;

        Ok(Self {
            endpoint: endpoint.trim_end_matches('/').to_string(),
            model,
            api_key,
            client,
        })
    }

    /// Send a generation request and return the parts of the first candidate.
    pub async fn generate(&self, request: GenerateRequest) -> AgentResult<Vec<Part>> {
        let mut body = serde_json::json!({
            "contents": [
                { "role": "user", "parts": [{ "text": request.prompt }] }
            ],
            "generationConfig": {
                "temperature": request.temperature
            }
        });

        if !request.tools.is_empty() {
            body["tools"] = serde_json::json!([{ "functionDeclarations": request.tools }]);
        }

        let response = self
            .client
            .post(format!(
                "{}/v1beta/models/{}:generateContent",
                self.endpoint, self.model
            ))
            .header("x-goog-api-key", &self.api_key)
            .json(&body)
            .send()
            .await
            .map_err(|e| AgentError::Interpreter(format!("failed to reach Gemini: {}", e)))?;

        if !response.status().is_success() {
            let status = response.status();
            let error_text = response.text().await.unwrap_or_default();
            return Err(AgentError::Interpreter(format!(
                "Gemini API error ({}): {}",
                status, error_text
            )));
        }

        let response: GenerateResponse = response
            .json()
            .await
            .map_err(|e| {
                AgentError::Interpreter(format!("failed to parse Gemini response: {}", e))
            })?;

        if let Some(reason) = response.prompt_feedback.and_then(|f| f.block_reason) {
            return Err(AgentError::Interpreter(format!("prompt blocked: {}", reason)));
        }

        response
            .candidates
            .into_iter()
            .next()
            .and_then(|c| c.content)
            .map(|c| c.parts)
            .ok_or_else(|| AgentError::Interpreter("no candidates in Gemini response".to_string()))
    }
}
