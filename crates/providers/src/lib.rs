//! # medwing Providers
//!
//! Backend implementations for the medwing agent runtime: the
//! OpenAI-compatible completion provider the turn engine talks to, and the
//! chatflow client that exposes retrieval-augmented backends as tools.

pub mod chatflow;
pub mod openai_compat;

pub use chatflow::{ChatflowClient, ChatflowTool};
pub use openai_compat::OpenAiCompatProvider;

use std::sync::Arc;
use std::time::Duration;

use medwing_core::provider::CompletionProvider;
use medwing_config::AppConfig;

/// Build the completion provider described by the configuration.
pub fn build_provider(config: &AppConfig) -> Arc<dyn CompletionProvider> {
    Arc::new(OpenAiCompatProvider::new(
        "openai",
        &config.provider.base_url,
        config.provider.api_key.clone().unwrap_or_default(),
        Duration::from_secs(config.provider.timeout_secs),
        config.retry.policy(),
    ))
}

/// Build the chatflow client described by the configuration.
pub fn build_chatflow_client(config: &AppConfig) -> Arc<ChatflowClient> {
    Arc::new(ChatflowClient::new(
        &config.chatflows.base_url,
        config.chatflows.api_key.clone().unwrap_or_default(),
        Duration::from_secs(config.provider.timeout_secs),
        config.retry.policy(),
    ))
}
