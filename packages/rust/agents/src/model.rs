use async_trait::async_trait;

use crate::error::AgentError;
use crate::types::{ChatRequest, ChatResponse};

/// A chat-completion backend that can drive agents.
#[async_trait]
pub trait ChatModel: Send + Sync {
    async fn chat(&self, request: ChatRequest) -> Result<ChatResponse, AgentError>;

    /// Model identifier, for logs.
    fn name(&self) -> &str;
}
