//! The turn execution loop.
//!
//! One turn: call the provider with the current agent's persona and tools,
//! execute any requested tool calls in order, follow handoffs, and repeat
//! until the model answers without requesting tools.

use std::collections::HashMap;
use std::sync::Arc;

use medwing_core::message::{Message, Role};
use medwing_core::provider::{CompletionProvider, CompletionRequest};
use medwing_core::schema::ToolSchema;
use medwing_core::tool::{Tool, ToolOutcome};
use medwing_core::{AgentDefinition, Result};
use tracing::{debug, info, warn};

/// Tunables for the turn engine, fixed at construction.
#[derive(Debug, Clone)]
pub struct EngineSettings {
    /// Sampling temperature passed to every provider call.
    pub temperature: f32,

    /// Maximum tokens per provider response.
    pub max_tokens: Option<u32>,

    /// Maximum provider calls per turn (safety limit).
    pub max_tool_iterations: u32,

    /// Optional operating-guidelines text appended to every synthesized
    /// system message. Loaded once at startup; never re-read mid-run.
    pub guidelines: Option<String>,
}

impl Default for EngineSettings {
    fn default() -> Self {
        Self {
            temperature: 0.3,
            max_tokens: Some(4000),
            max_tool_iterations: 25,
            guidelines: None,
        }
    }
}

/// Immutable record of one completed turn: the agent left active after any
/// handoffs, and only the messages produced during the turn. The caller
/// owns concatenation onto its conversation history.
#[derive(Debug, Clone)]
pub struct TurnResponse {
    /// The agent servicing the conversation when the turn settled.
    pub agent: AgentDefinition,

    /// Assistant and tool messages produced this turn, in order.
    pub messages: Vec<Message>,
}

impl TurnResponse {
    /// The last assistant message's text, if the turn produced one.
    pub fn final_text(&self) -> Option<&str> {
        self.messages
            .iter()
            .rev()
            .find(|m| m.role == Role::Assistant)
            .map(|m| m.content.as_str())
    }
}

/// The turn execution engine.
///
/// Holds the completion provider and settings; stateless across turns, so
/// one engine may service any number of conversations concurrently. All
/// per-turn state lives on the stack of `run_turn`.
pub struct TurnEngine {
    provider: Arc<dyn CompletionProvider>,
    settings: EngineSettings,
}

impl TurnEngine {
    /// Create an engine with default settings.
    pub fn new(provider: Arc<dyn CompletionProvider>) -> Self {
        Self {
            provider,
            settings: EngineSettings::default(),
        }
    }

    /// Replace the engine settings.
    pub fn with_settings(mut self, settings: EngineSettings) -> Self {
        self.settings = settings;
        self
    }

    /// Synthesize the leading system message for an agent.
    fn system_message(&self, agent: &AgentDefinition) -> Message {
        let mut prompt = agent.instructions().to_string();
        if let Some(guidelines) = &self.settings.guidelines {
            prompt.push_str("\n\n## Operating guidelines\n");
            prompt.push_str(guidelines);
        }
        Message::system(prompt)
    }

    /// Run one full turn against `agent`, starting from `history`.
    ///
    /// `history` is never mutated; the returned `TurnResponse` carries only
    /// the delta produced during this turn. Tool failures and unknown tool
    /// names become tool-result messages and the turn continues; provider
    /// errors propagate unretried.
    pub async fn run_turn(
        &self,
        agent: &AgentDefinition,
        history: &[Message],
    ) -> Result<TurnResponse> {
        let mut current = agent.clone();
        let mut messages: Vec<Message> = history.to_vec();
        let initial_len = messages.len();
        let mut iteration: u32 = 0;

        loop {
            iteration += 1;
            if iteration > self.settings.max_tool_iterations {
                warn!(
                    agent = %current.name(),
                    iterations = iteration - 1,
                    "Max tool iterations reached, settling turn"
                );
                break;
            }

            // Recomputed every iteration: a handoff may have swapped the
            // tool list since the previous provider call.
            let schemas: Vec<ToolSchema> =
                current.tools().iter().map(|t| t.schema().clone()).collect();

            let request = CompletionRequest {
                model: current.model().to_string(),
                messages: std::iter::once(self.system_message(&current))
                    .chain(messages.iter().cloned())
                    .collect(),
                temperature: self.settings.temperature,
                max_tokens: self.settings.max_tokens,
                tools: schemas,
            };

            debug!(
                agent = %current.name(),
                model = %current.model(),
                iteration,
                "Requesting completion"
            );

            let response = self.provider.complete(request).await?;
            let tool_calls = response.message.tool_calls.clone();
            messages.push(response.message);

            if tool_calls.is_empty() {
                break;
            }

            debug!(
                agent = %current.name(),
                tool_count = tool_calls.len(),
                "Executing tool calls"
            );

            // A handoff mid-batch takes effect for subsequent provider
            // calls only; the rest of the batch still dispatches against
            // the pre-handoff agent's tool map.
            let batch_agent = current.clone();
            let dispatch: HashMap<&str, &Arc<dyn Tool>> = batch_agent
                .tools()
                .iter()
                .map(|t| (t.name(), t))
                .collect();

            for call in &tool_calls {
                let content = match dispatch.get(call.name.as_str()) {
                    None => {
                        warn!(tool = %call.name, agent = %batch_agent.name(), "Unknown tool requested");
                        format!("Error: tool '{}' is not available to this agent.", call.name)
                    }
                    Some(tool) => match decode_arguments(&call.arguments) {
                        Err(reason) => {
                            warn!(tool = %call.name, %reason, "Malformed tool arguments");
                            format!("Error executing {}: {reason}", call.name)
                        }
                        Ok(arguments) => match tool.invoke(arguments).await {
                            Ok(ToolOutcome::Text(text)) => text,
                            Ok(ToolOutcome::Handoff(next)) => {
                                info!(from = %current.name(), to = %next.name(), "Agent handoff");
                                let notice = format!(
                                    "Transferred to {}. Adopt persona immediately.",
                                    next.name()
                                );
                                current = next;
                                notice
                            }
                            Err(e) => {
                                warn!(tool = %call.name, error = %e, "Tool execution failed");
                                format!("Error executing {}: {e}", call.name)
                            }
                        },
                    },
                };
                messages.push(Message::tool_result(&call.id, content));
            }
        }

        Ok(TurnResponse {
            agent: current,
            messages: messages.split_off(initial_len),
        })
    }
}

/// Decode a provider-supplied arguments string into a JSON object.
///
/// Providers send `""` for tools invoked without arguments.
fn decode_arguments(raw: &str) -> std::result::Result<serde_json::Value, String> {
    if raw.trim().is_empty() {
        return Ok(serde_json::Value::Object(serde_json::Map::new()));
    }
    serde_json::from_str(raw).map_err(|e| format!("invalid arguments: {e}"))
}
