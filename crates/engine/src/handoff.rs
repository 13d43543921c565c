//! Handoff tools — transferring a conversation between agents.
//!
//! A handoff is an ordinary tool call whose outcome is
//! `ToolOutcome::Handoff`: the engine swaps the active agent and
//! substitutes a fixed notice string for the tool result. Factories build
//! handoff targets before the agents that hand off to them.

use std::sync::Arc;

use async_trait::async_trait;
use medwing_core::error::ToolError;
use medwing_core::schema::ToolSchema;
use medwing_core::tool::{Tool, ToolOutcome};
use medwing_core::AgentDefinition;

/// A tool that transfers the conversation to a fixed target agent.
pub struct HandoffTool {
    schema: ToolSchema,
    target: AgentDefinition,
}

impl HandoffTool {
    /// Build a `transfer_to_<name>` tool for `target`.
    pub fn to(target: &AgentDefinition) -> Arc<dyn Tool> {
        let name = format!("transfer_to_{}", snake_case(target.name()));
        let schema = ToolSchema::new(
            name,
            format!("Hand the conversation to {}.", target.name()),
        );
        Arc::new(Self {
            schema,
            target: target.clone(),
        })
    }
}

#[async_trait]
impl Tool for HandoffTool {
    fn schema(&self) -> &ToolSchema {
        &self.schema
    }

    async fn invoke(&self, _arguments: serde_json::Value) -> Result<ToolOutcome, ToolError> {
        Ok(ToolOutcome::Handoff(self.target.clone()))
    }
}

/// Lower-case a display name into a tool-name fragment.
fn snake_case(name: &str) -> String {
    let mut out = String::with_capacity(name.len());
    let mut last_was_sep = true;
    for ch in name.chars() {
        if ch.is_ascii_alphanumeric() {
            out.push(ch.to_ascii_lowercase());
            last_was_sep = false;
        } else if !last_was_sep {
            out.push('_');
            last_was_sep = true;
        }
    }
    while out.ends_with('_') {
        out.pop();
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    fn specialist() -> AgentDefinition {
        AgentDefinition::builder("Aeromedical Risk Assessor")
            .instructions("Assess aeromedical risk.")
            .model("gpt-4o-mini")
            .build()
            .unwrap()
    }

    #[test]
    fn derives_tool_name_from_agent_name() {
        let tool = HandoffTool::to(&specialist());
        assert_eq!(tool.name(), "transfer_to_aeromedical_risk_assessor");
        assert!(tool.schema().params().is_empty());
    }

    #[tokio::test]
    async fn invoke_yields_handoff_outcome() {
        let tool = HandoffTool::to(&specialist());
        let outcome = tool.invoke(serde_json::json!({})).await.unwrap();
        match outcome {
            ToolOutcome::Handoff(agent) => {
                assert_eq!(agent.name(), "Aeromedical Risk Assessor");
            }
            ToolOutcome::Text(_) => panic!("expected handoff outcome"),
        }
    }

    #[test]
    fn snake_case_collapses_separators() {
        assert_eq!(snake_case("Prompt  Analyzer"), "prompt_analyzer");
        assert_eq!(snake_case("Specialist"), "specialist");
        assert_eq!(snake_case("O3 / Web-Search"), "o3_web_search");
    }
}
