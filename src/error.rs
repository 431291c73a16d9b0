use thiserror::Error;

/// Failures surfaced by the interpret → dispatch → gateway pipeline.
///
/// Every variant travels unmodified to the request boundary; nothing in the
/// pipeline retries.
#[derive(Debug, Error)]
pub enum AgentError {
    #[error("configuration error: {0}")]
    Config(String),

    #[error("authentication failed: {0}")]
    Auth(String),

    #[error("gateway returned {status}: {body}")]
    Gateway { status: u16, body: String },

    #[error("gateway request failed: {0}")]
    GatewayTransport(String),

    #[error("unexpected gateway response: {0}")]
    GatewayDecode(String),

    #[error("interpreter error: {0}")]
    Interpreter(String),

    #[error("dispatch error: {0}")]
    Dispatch(String),
}

pub type AgentResult<T> = std::result::Result<T, AgentError>;

impl AgentError {
    /// Whether this error means the process is missing its provider credential.
    pub fn is_config(&self) -> bool {
        matches!(self, AgentError::Config(_))
    }
}
