//! Agents and the task loop.

use std::fmt::Write as _;
use std::sync::Arc;

use tracing::{debug, info, instrument, warn};

use crate::error::AgentError;
use crate::model::ChatModel;
use crate::tool::AgentTool;
use crate::types::{ChatMessage, ChatRequest};

/// Default upper bound on model turns for one task.
const DEFAULT_MAX_ITERATIONS: u32 = 8;

/// A unit of work handed to an agent.
#[derive(Debug, Clone)]
pub struct Task {
    pub description: String,
    pub expected_output: String,
}

impl Task {
    pub fn new(description: impl Into<String>, expected_output: impl Into<String>) -> Self {
        Self {
            description: description.into(),
            expected_output: expected_output.into(),
        }
    }

    /// User prompt for this task, with an optional prior result as context.
    fn prompt(&self, context: Option<&str>) -> String {
        let mut prompt = String::new();
        let _ = writeln!(prompt, "Current Task: {}\n", self.description.trim());
        let _ = writeln!(
            prompt,
            "This is the expected criteria for your final answer: {}",
            self.expected_output.trim()
        );
        prompt.push_str("You MUST return the actual complete content as the final answer, not a summary.");

        if let Some(context) = context {
            let _ = write!(
                prompt,
                "\n\nThis is the context you're working with:\n{}",
                context.trim()
            );
        }

        prompt
    }
}

/// A role-playing agent bound to a set of tools.
pub struct Agent {
    role: String,
    goal: String,
    backstory: String,
    tools: Vec<Arc<dyn AgentTool>>,
    max_iterations: u32,
}

impl std::fmt::Debug for Agent {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Agent")
            .field("role", &self.role)
            .field("tools", &self.tools.iter().map(|t| t.name()).collect::<Vec<_>>())
            .field("max_iterations", &self.max_iterations)
            .finish()
    }
}

impl Agent {
    pub fn new(
        role: impl Into<String>,
        goal: impl Into<String>,
        backstory: impl Into<String>,
    ) -> Self {
        Self {
            role: role.into(),
            goal: goal.into(),
            backstory: backstory.into(),
            tools: Vec::new(),
            max_iterations: DEFAULT_MAX_ITERATIONS,
        }
    }

    pub fn with_tool(mut self, tool: Arc<dyn AgentTool>) -> Self {
        self.tools.push(tool);
        self
    }

    pub fn with_max_iterations(mut self, max_iterations: u32) -> Self {
        self.max_iterations = max_iterations.max(1);
        self
    }

    fn system_prompt(&self) -> String {
        format!(
            "You are {}. {}\nYour personal goal is: {}",
            self.role,
            self.backstory.trim(),
            self.goal
        )
    }

    /// Perform `task`, looping over tool calls until the model answers.
    #[instrument(skip_all, fields(role = %self.role, model = %model.name()))]
    pub async fn perform(
        &self,
        model: &dyn ChatModel,
        task: &Task,
        context: Option<&str>,
    ) -> Result<String, AgentError> {
        let definitions: Vec<_> = self.tools.iter().map(|t| t.definition()).collect();
        let mut messages = vec![
            ChatMessage::system(self.system_prompt()),
            ChatMessage::user(task.prompt(context)),
        ];

        for turn in 1..=self.max_iterations {
            let request = ChatRequest::new(messages.clone()).with_tools(definitions.clone());
            let response = model.chat(request).await?;

            if !response.has_tool_calls() {
                let answer = response.content.trim();
                if answer.is_empty() {
                    return Err(AgentError::EmptyAnswer {
                        role: self.role.clone(),
                    });
                }
                info!(turn, chars = answer.len(), "agent produced final answer");
                return Ok(answer.to_string());
            }

            debug!(turn, calls = response.tool_calls.len(), "agent requested tools");
            messages.push(ChatMessage::assistant_with_tools(
                response.content.clone(),
                response.tool_calls.clone(),
            ));

            for call in response.tool_calls {
                let output = match self.tools.iter().find(|t| t.name() == call.name) {
                    Some(tool) => tool.invoke(call.arguments).await,
                    None => {
                        warn!(tool = %call.name, "agent requested unknown tool");
                        format!("Error: unknown tool '{}'", call.name)
                    }
                };
                messages.push(ChatMessage::tool_response(call.call_id, output));
            }
        }

        Err(AgentError::IterationLimit {
            role: self.role.clone(),
            limit: self.max_iterations,
        })
    }
}
