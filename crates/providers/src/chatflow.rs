//! Chatflow client — Flowise-style retrieval-augmented backends.
//!
//! A chatflow is a hosted RAG pipeline addressed by id; the service takes
//! one question and returns one answer. Chatflows enter the turn engine
//! only as plain tools (`ChatflowTool`), never as completion providers.

use std::sync::Arc;

use async_trait::async_trait;
use medwing_core::error::{ProviderError, ToolError};
use medwing_core::retry::{with_retry, RetryPolicy};
use medwing_core::schema::{ParamType, ToolSchema};
use medwing_core::tool::{required_str, Tool, ToolOutcome};
use serde::Deserialize;
use tracing::{debug, warn};

/// Client for a Flowise-compatible prediction API.
pub struct ChatflowClient {
    base_url: String,
    api_key: String,
    client: reqwest::Client,
    retry: RetryPolicy,
}

impl ChatflowClient {
    pub fn new(
        base_url: impl Into<String>,
        api_key: impl Into<String>,
        timeout: std::time::Duration,
        retry: RetryPolicy,
    ) -> Self {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .unwrap_or_default();

        Self {
            base_url: base_url.into().trim_end_matches('/').to_string(),
            api_key: api_key.into(),
            client,
            retry,
        }
    }

    /// Send one question to a chatflow and return its answer text.
    pub async fn predict(
        &self,
        chatflow_id: &str,
        question: &str,
    ) -> Result<String, ProviderError> {
        let url = format!("{}/api/v1/prediction/{chatflow_id}", self.base_url);
        let body = serde_json::json!({
            "question": question,
            "streaming": false,
        });

        debug!(chatflow_id, "Sending chatflow prediction request");

        let response = with_retry(&self.retry, ProviderError::is_retryable, || {
            self.send_once(&url, &body)
        })
        .await?;

        Ok(response.text)
    }

    async fn send_once(
        &self,
        url: &str,
        body: &serde_json::Value,
    ) -> Result<PredictionResponse, ProviderError> {
        let response = self
            .client
            .post(url)
            .header("Authorization", format!("Bearer {}", self.api_key))
            .header("Content-Type", "application/json")
            .json(body)
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    ProviderError::Timeout(e.to_string())
                } else {
                    ProviderError::Network(e.to_string())
                }
            })?;

        let status = response.status().as_u16();

        if status == 429 {
            return Err(ProviderError::RateLimited {
                retry_after_secs: 5,
            });
        }

        if status == 401 || status == 403 {
            return Err(ProviderError::AuthenticationFailed(
                "Authentication failed - check chatflow API key".into(),
            ));
        }

        if status == 404 {
            return Err(ProviderError::ApiError {
                status_code: 404,
                message: "Chatflow not found - check chatflow ID".into(),
            });
        }

        if status != 200 {
            let error_body = response.text().await.unwrap_or_default();
            warn!(status, body = %error_body, "Chatflow service returned error");
            return Err(ProviderError::ApiError {
                status_code: status,
                message: error_body,
            });
        }

        response.json().await.map_err(|e| ProviderError::ApiError {
            status_code: 200,
            message: format!("Failed to parse prediction response: {e}"),
        })
    }
}

/// The answer payload of a prediction call.
#[derive(Debug, Deserialize)]
struct PredictionResponse {
    text: String,
}

/// A `Tool` that exposes one chatflow as a single-question capability.
///
/// Failures surface as `ToolError`, which the turn engine converts into a
/// tool-result message; a dead retrieval backend never aborts a turn.
pub struct ChatflowTool {
    schema: ToolSchema,
    client: Arc<ChatflowClient>,
    chatflow_id: String,
}

impl ChatflowTool {
    /// Build a chatflow tool.
    ///
    /// Fails only if the schema itself is malformed, which a fixed
    /// single-parameter schema never is; the error is still propagated so
    /// callers see one construction path for all tools.
    pub fn new(
        name: impl Into<String>,
        description: impl Into<String>,
        client: Arc<ChatflowClient>,
        chatflow_id: impl Into<String>,
    ) -> Result<Arc<dyn Tool>, medwing_core::error::ConfigError> {
        let schema = ToolSchema::builder(name)
            .description(description)
            .described_param(
                "question",
                ParamType::String,
                true,
                "The question to send to the retrieval backend",
            )
            .build()?;

        Ok(Arc::new(Self {
            schema,
            client,
            chatflow_id: chatflow_id.into(),
        }))
    }
}

#[async_trait]
impl Tool for ChatflowTool {
    fn schema(&self) -> &ToolSchema {
        &self.schema
    }

    async fn invoke(&self, arguments: serde_json::Value) -> Result<ToolOutcome, ToolError> {
        let question = required_str(&arguments, "question")?;

        let answer = self
            .client
            .predict(&self.chatflow_id, question)
            .await
            .map_err(|e| ToolError::ExecutionFailed {
                tool_name: self.schema.name().to_string(),
                reason: e.to_string(),
            })?;

        Ok(ToolOutcome::Text(answer))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn test_client() -> Arc<ChatflowClient> {
        Arc::new(ChatflowClient::new(
            "https://flowise.example.com/",
            "test-key",
            std::time::Duration::from_secs(10),
            RetryPolicy::default(),
        ))
    }

    #[test]
    fn base_url_trailing_slash_trimmed() {
        let client = test_client();
        assert_eq!(client.base_url, "https://flowise.example.com");
    }

    #[test]
    fn tool_advertises_single_question_parameter() {
        let tool = ChatflowTool::new(
            "consult_deep_research",
            "Query the deep research chatflow for comprehensive analysis",
            test_client(),
            "43677137-d307-4ff4-96c9-5019b6e10879",
        )
        .unwrap();

        assert_eq!(tool.name(), "consult_deep_research");
        let params = tool.schema().params();
        assert_eq!(params.len(), 1);
        assert_eq!(params[0].name, "question");
        assert!(params[0].required);
    }

    #[test]
    fn prediction_response_parses_text_field() {
        let data = r#"{"text": "Hypoxia onset varies with altitude.", "chatId": "abc"}"#;
        let parsed: PredictionResponse = serde_json::from_str(data).unwrap();
        assert_eq!(parsed.text, "Hypoxia onset varies with altitude.");
    }

    #[tokio::test]
    async fn missing_question_argument_is_an_error() {
        let tool = ChatflowTool::new("consult_pubmed", "", test_client(), "id").unwrap();
        let err = tool.invoke(serde_json::json!({})).await.unwrap_err();
        assert!(matches!(err, ToolError::InvalidArguments(_)));
    }
}
