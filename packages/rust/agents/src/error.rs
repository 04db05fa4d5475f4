/// Errors raised while an agent performs a task.
#[derive(Debug, Clone, thiserror::Error)]
pub enum AgentError {
    #[error("LLM API key not configured")]
    MissingApiKey,

    #[error("failed to build HTTP client: {0}")]
    Client(String),

    #[error("model request failed: {0}")]
    Transport(String),

    #[error("model endpoint returned HTTP {status}: {message}")]
    Upstream { status: u16, message: String },

    #[error("invalid model response: {0}")]
    InvalidResponse(String),

    #[error("agent '{role}' gave no answer within {limit} model turns")]
    IterationLimit { role: String, limit: u32 },

    #[error("agent '{role}' returned an empty answer")]
    EmptyAnswer { role: String },
}
