//! Minimal tool-using agent framework.
//!
//! An [`Agent`] has a role, goal, backstory and a set of [`AgentTool`]s. It
//! performs a [`Task`] by looping against a [`ChatModel`]: the model either
//! answers, or asks for tool calls whose results are fed back until it does.
//!
//! Whether the framework can run at all in this process is decided once at
//! startup by [`probe_framework`].

mod agent;
mod error;
mod model;
mod openai;
mod probe;
#[cfg(any(test, feature = "testing"))]
mod scripted;
mod tool;
mod types;

pub use agent::{Agent, Task};
pub use error::AgentError;
pub use model::ChatModel;
pub use openai::OpenAiChatModel;
pub use probe::{FrameworkAvailability, probe_framework};
#[cfg(any(test, feature = "testing"))]
pub use scripted::ScriptedModel;
pub use tool::AgentTool;
pub use types::{ChatMessage, ChatRequest, ChatResponse, MessageRole, ToolCall, ToolDefinition};
