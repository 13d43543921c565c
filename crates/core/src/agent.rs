//! Agent definitions — immutable persona descriptions.
//!
//! An `AgentDefinition` bundles a name, system-level instructions, a model
//! identifier, and an ordered tool list. Definitions are constructed once
//! by a factory, validated at build time, and shared read-only across any
//! number of concurrent turn executions.

use std::sync::Arc;

use crate::error::ConfigError;
use crate::tool::Tool;

/// Immutable description of an agent persona.
#[derive(Clone)]
pub struct AgentDefinition {
    name: String,
    instructions: String,
    model: String,
    tools: Vec<Arc<dyn Tool>>,
}

impl AgentDefinition {
    /// Start building an agent definition.
    pub fn builder(name: impl Into<String>) -> AgentBuilder {
        AgentBuilder {
            name: name.into(),
            instructions: String::new(),
            model: String::new(),
            tools: Vec::new(),
        }
    }

    /// Stable identifier, unique within a running session.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// The persona text sent as the leading system message on every
    /// provider call.
    pub fn instructions(&self) -> &str {
        &self.instructions
    }

    /// Opaque model identifier, passed through to the provider unchanged.
    pub fn model(&self) -> &str {
        &self.model
    }

    /// The agent's tools, in declaration order.
    pub fn tools(&self) -> &[Arc<dyn Tool>] {
        &self.tools
    }

    /// Look up a tool by its derived name.
    pub fn tool(&self, name: &str) -> Option<&Arc<dyn Tool>> {
        self.tools.iter().find(|t| t.name() == name)
    }
}

impl std::fmt::Debug for AgentDefinition {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AgentDefinition")
            .field("name", &self.name)
            .field("model", &self.model)
            .field(
                "tools",
                &self.tools.iter().map(|t| t.name()).collect::<Vec<_>>(),
            )
            .finish()
    }
}

/// Builder for `AgentDefinition`.
pub struct AgentBuilder {
    name: String,
    instructions: String,
    model: String,
    tools: Vec<Arc<dyn Tool>>,
}

impl AgentBuilder {
    /// Set the persona instructions.
    pub fn instructions(mut self, instructions: impl Into<String>) -> Self {
        self.instructions = instructions.into();
        self
    }

    /// Set the model identifier.
    pub fn model(mut self, model: impl Into<String>) -> Self {
        self.model = model.into();
        self
    }

    /// Attach a tool. Order of attachment is the order advertised to the
    /// provider.
    pub fn tool(mut self, tool: Arc<dyn Tool>) -> Self {
        self.tools.push(tool);
        self
    }

    /// Validate and build the definition.
    ///
    /// Fails if two tools share a derived name — the dispatch map would be
    /// ambiguous.
    pub fn build(self) -> Result<AgentDefinition, ConfigError> {
        for (i, tool) in self.tools.iter().enumerate() {
            if self.tools[..i].iter().any(|t| t.name() == tool.name()) {
                return Err(ConfigError::DuplicateToolName {
                    agent: self.name,
                    tool: tool.name().to_string(),
                });
            }
        }

        Ok(AgentDefinition {
            name: self.name,
            instructions: self.instructions,
            model: self.model,
            tools: self.tools,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::{ParamType, ToolSchema};
    use crate::tool::FunctionTool;

    fn named_tool(name: &str) -> Arc<dyn Tool> {
        let schema = ToolSchema::builder(name)
            .param("input", ParamType::String, true)
            .build()
            .unwrap();
        Arc::new(FunctionTool::new(schema, |_| Ok(String::new())))
    }

    #[test]
    fn builder_produces_definition() {
        let agent = AgentDefinition::builder("Prompt Analyzer")
            .instructions("Analyze and enhance the user's prompt.")
            .model("gpt-4o-mini")
            .tool(named_tool("analyze_prompt_context"))
            .build()
            .unwrap();

        assert_eq!(agent.name(), "Prompt Analyzer");
        assert_eq!(agent.model(), "gpt-4o-mini");
        assert_eq!(agent.tools().len(), 1);
        assert!(agent.tool("analyze_prompt_context").is_some());
        assert!(agent.tool("nonexistent").is_none());
    }

    #[test]
    fn duplicate_tool_name_rejected() {
        let err = AgentDefinition::builder("Broken")
            .model("gpt-4o-mini")
            .tool(named_tool("lookup"))
            .tool(named_tool("lookup"))
            .build()
            .unwrap_err();
        assert!(matches!(
            err,
            ConfigError::DuplicateToolName { ref tool, .. } if tool == "lookup"
        ));
    }

    #[test]
    fn clones_share_tools() {
        let agent = AgentDefinition::builder("A")
            .model("m")
            .tool(named_tool("t"))
            .build()
            .unwrap();
        let copy = agent.clone();
        assert!(Arc::ptr_eq(&agent.tools()[0], &copy.tools()[0]));
    }
}
