use async_trait::async_trait;

use crate::types::ToolDefinition;

/// A capability an agent may invoke while performing a task.
///
/// Tools report problems as text in their answer (prefixed `Error:`) so the
/// agent can react; they never abort the task.
#[async_trait]
pub trait AgentTool: Send + Sync {
    fn definition(&self) -> ToolDefinition;

    async fn invoke(&self, arguments: serde_json::Value) -> String;

    fn name(&self) -> String {
        self.definition().name
    }
}
