//! CompletionProvider trait — the abstraction over LLM backends.
//!
//! A provider knows how to send a conversation to a completion service and
//! get one assistant message back, possibly carrying tool-call requests.
//! The turn engine calls `complete()` without knowing which backend is
//! behind it.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::error::ProviderError;
use crate::message::Message;
use crate::schema::ToolSchema;

/// One completion request.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CompletionRequest {
    /// The model to use (e.g. "gpt-4o-mini", "o3-deep-research")
    pub model: String,

    /// The conversation messages, including the synthesized leading system
    /// message
    pub messages: Vec<Message>,

    /// Temperature (0.0 = deterministic, 1.0 = creative)
    pub temperature: f32,

    /// Maximum tokens to generate
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_tokens: Option<u32>,

    /// Tools the model may request, empty if the agent has none
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub tools: Vec<ToolSchema>,
}

/// A complete response from a provider.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CompletionResponse {
    /// The generated assistant message (text and/or tool-call requests)
    pub message: Message,

    /// Token usage statistics
    pub usage: Option<Usage>,

    /// Which model actually responded (may differ from requested)
    pub model: String,
}

/// Token usage information.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Usage {
    pub prompt_tokens: u32,
    pub completion_tokens: u32,
    pub total_tokens: u32,
}

/// The core CompletionProvider trait.
///
/// A failed call raises a `ProviderError` of unspecified subtype; the turn
/// engine propagates it without interpretation or retry. Retry discipline
/// lives at the transport boundary inside implementations (see
/// `medwing_core::retry`).
#[async_trait]
pub trait CompletionProvider: Send + Sync {
    /// A human-readable name for this provider (e.g. "openai", "flowise").
    fn name(&self) -> &str;

    /// Send a request and get a complete response.
    async fn complete(
        &self,
        request: CompletionRequest,
    ) -> std::result::Result<CompletionResponse, ProviderError>;
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::{ParamType, ToolSchema};

    #[test]
    fn request_serialization_skips_empty_tools() {
        let req = CompletionRequest {
            model: "gpt-4o-mini".into(),
            messages: vec![Message::system("persona"), Message::user("hello")],
            temperature: 0.3,
            max_tokens: None,
            tools: vec![],
        };
        let json = serde_json::to_string(&req).unwrap();
        assert!(!json.contains("\"tools\""));
        assert!(!json.contains("max_tokens"));
    }

    #[test]
    fn request_carries_tool_schemas() {
        let schema = ToolSchema::builder("consult_pubmed")
            .param("question", ParamType::String, true)
            .build()
            .unwrap();
        let req = CompletionRequest {
            model: "gpt-4o-mini".into(),
            messages: vec![],
            temperature: 0.3,
            max_tokens: Some(4000),
            tools: vec![schema],
        };
        assert_eq!(req.tools.len(), 1);
        assert_eq!(req.tools[0].name(), "consult_pubmed");
    }
}
