//! Tool trait — the abstraction over agent capabilities.
//!
//! Tools are what let an agent act beyond text generation: consult a
//! retrieval chatflow, analyze a prompt, or hand the conversation to
//! another agent.

use async_trait::async_trait;

use crate::agent::AgentDefinition;
use crate::error::ToolError;
use crate::schema::ToolSchema;

/// What a tool invocation produced.
///
/// A handoff is an explicit, tagged result — never inferred from the shape
/// of a returned value — so a tool that wants to *describe* an agent can do
/// so in text without accidentally transferring control.
#[derive(Debug)]
pub enum ToolOutcome {
    /// Plain text, appended verbatim as the tool-result message content.
    Text(String),

    /// Transfer the conversation to another agent. The turn engine
    /// substitutes a fixed notice string for the tool-result content and
    /// services subsequent provider calls with the new agent.
    Handoff(AgentDefinition),
}

/// The core Tool trait.
///
/// Each capability implements this trait and is attached to one or more
/// `AgentDefinition`s. The turn engine uses `schema()` both to advertise
/// the tool to the provider and to dispatch requested calls by name.
#[async_trait]
pub trait Tool: Send + Sync {
    /// The declarative schema for this tool.
    fn schema(&self) -> &ToolSchema;

    /// The unique name of this tool within an agent.
    fn name(&self) -> &str {
        self.schema().name()
    }

    /// Execute the tool with the arguments supplied by the provider.
    async fn invoke(&self, arguments: serde_json::Value) -> Result<ToolOutcome, ToolError>;
}

/// A tool backed by a plain function.
///
/// Covers the common case of a synchronous, side-effect-free capability
/// without a dedicated type.
pub struct FunctionTool {
    schema: ToolSchema,
    #[allow(clippy::type_complexity)]
    func: Box<dyn Fn(serde_json::Value) -> Result<String, ToolError> + Send + Sync>,
}

impl FunctionTool {
    pub fn new<F>(schema: ToolSchema, func: F) -> Self
    where
        F: Fn(serde_json::Value) -> Result<String, ToolError> + Send + Sync + 'static,
    {
        Self {
            schema,
            func: Box::new(func),
        }
    }
}

#[async_trait]
impl Tool for FunctionTool {
    fn schema(&self) -> &ToolSchema {
        &self.schema
    }

    async fn invoke(&self, arguments: serde_json::Value) -> Result<ToolOutcome, ToolError> {
        (self.func)(arguments).map(ToolOutcome::Text)
    }
}

/// Extract a required string argument from a tool-call arguments object.
pub fn required_str<'a>(
    arguments: &'a serde_json::Value,
    name: &str,
) -> Result<&'a str, ToolError> {
    arguments[name]
        .as_str()
        .ok_or_else(|| ToolError::InvalidArguments(format!("missing string argument '{name}'")))
}
