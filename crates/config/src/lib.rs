//! Configuration loading, validation, and management for medwing.
//!
//! Loads configuration from `medwing.toml` with environment variable
//! overrides. Validates all settings at startup. Operating guidelines are
//! read from disk exactly once at load time; nothing re-reads files or
//! mutates process-wide state afterwards.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::Path;
use std::time::Duration;

use medwing_core::error::ConfigError;
use medwing_core::retry::RetryPolicy;

/// The root configuration structure.
///
/// Maps directly to `medwing.toml`.
#[derive(Clone, Serialize, Deserialize)]
pub struct AppConfig {
    /// Completion-provider settings
    #[serde(default)]
    pub provider: ProviderConfig,

    /// Retry schedule applied at the transport boundary
    #[serde(default)]
    pub retry: RetryConfig,

    /// Turn-engine settings
    #[serde(default)]
    pub engine: EngineConfig,

    /// Mode-router settings
    #[serde(default)]
    pub router: RouterConfig,

    /// Flowise-style chatflow backends
    #[serde(default)]
    pub chatflows: ChatflowsConfig,

    /// Optional operating-guidelines file
    #[serde(default)]
    pub guidelines: GuidelinesConfig,
}

/// Redact a secret string for Debug output.
fn redact(s: &Option<String>) -> &'static str {
    match s {
        Some(_) => "[REDACTED]",
        None => "None",
    }
}

impl std::fmt::Debug for AppConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AppConfig")
            .field("provider", &self.provider)
            .field("retry", &self.retry)
            .field("engine", &self.engine)
            .field("router", &self.router)
            .field("chatflows", &self.chatflows)
            .field("guidelines", &self.guidelines)
            .finish()
    }
}

/// Settings for the OpenAI-compatible completion provider.
#[derive(Clone, Serialize, Deserialize)]
pub struct ProviderConfig {
    /// API key (env `MEDWING_API_KEY` or `OPENAI_API_KEY` overrides)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub api_key: Option<String>,

    /// Base URL of the completions endpoint
    #[serde(default = "default_base_url")]
    pub base_url: String,

    /// Default model for agents that do not name one
    #[serde(default = "default_model")]
    pub model: String,

    /// Sampling temperature
    #[serde(default = "default_temperature")]
    pub temperature: f32,

    /// Maximum tokens per response
    #[serde(default = "default_max_tokens")]
    pub max_tokens: u32,

    /// Outbound request timeout in seconds
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

fn default_base_url() -> String {
    "https://api.openai.com/v1".into()
}
fn default_model() -> String {
    "gpt-4o-mini".into()
}
fn default_temperature() -> f32 {
    0.3
}
fn default_max_tokens() -> u32 {
    4000
}
fn default_timeout_secs() -> u64 {
    60
}

impl Default for ProviderConfig {
    fn default() -> Self {
        Self {
            api_key: None,
            base_url: default_base_url(),
            model: default_model(),
            temperature: default_temperature(),
            max_tokens: default_max_tokens(),
            timeout_secs: default_timeout_secs(),
        }
    }
}

impl std::fmt::Debug for ProviderConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ProviderConfig")
            .field("api_key", &redact(&self.api_key))
            .field("base_url", &self.base_url)
            .field("model", &self.model)
            .field("temperature", &self.temperature)
            .field("max_tokens", &self.max_tokens)
            .field("timeout_secs", &self.timeout_secs)
            .finish()
    }
}

/// Backoff-retrier settings, mapped onto `RetryPolicy` at startup.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RetryConfig {
    #[serde(default = "default_max_attempts")]
    pub max_attempts: u32,

    #[serde(default = "default_base_delay_secs")]
    pub base_delay_secs: f64,

    #[serde(default = "default_backoff_factor")]
    pub backoff_factor: f64,

    #[serde(default = "default_true")]
    pub jitter: bool,
}

fn default_max_attempts() -> u32 {
    3
}
fn default_base_delay_secs() -> f64 {
    1.0
}
fn default_backoff_factor() -> f64 {
    2.0
}
fn default_true() -> bool {
    true
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_attempts: default_max_attempts(),
            base_delay_secs: default_base_delay_secs(),
            backoff_factor: default_backoff_factor(),
            jitter: true,
        }
    }
}

impl RetryConfig {
    /// The `RetryPolicy` this configuration describes.
    pub fn policy(&self) -> RetryPolicy {
        RetryPolicy {
            max_attempts: self.max_attempts,
            base_delay: Duration::from_secs_f64(self.base_delay_secs),
            backoff_factor: self.backoff_factor,
            jitter: self.jitter,
        }
    }
}

/// Turn-engine settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EngineConfig {
    /// Maximum provider calls per turn before the engine settles
    #[serde(default = "default_max_tool_iterations")]
    pub max_tool_iterations: u32,
}

fn default_max_tool_iterations() -> u32 {
    25
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            max_tool_iterations: default_max_tool_iterations(),
        }
    }
}

/// Mode-router settings. Route order in the `modes` list is load-bearing:
/// classification is first-match-wins.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RouterConfig {
    /// Fallback mode when no pattern matches
    #[serde(default = "default_mode")]
    pub default_mode: String,

    /// Switch modes automatically instead of suggesting
    #[serde(default)]
    pub auto_switch: bool,

    /// Minimum classification confidence to act on
    #[serde(default = "default_min_confidence")]
    pub min_confidence: f32,

    /// Ordered route table
    #[serde(default = "default_modes")]
    pub modes: Vec<ModeRouteConfig>,
}

/// One entry in the ordered route table.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ModeRouteConfig {
    pub name: String,
    pub patterns: Vec<String>,
}

fn default_mode() -> String {
    "prompt".into()
}
fn default_min_confidence() -> f32 {
    0.6
}

fn default_modes() -> Vec<ModeRouteConfig> {
    vec![
        ModeRouteConfig {
            name: "deep_research".into(),
            patterns: vec![
                "deep research".into(),
                "systematic review".into(),
                "literature".into(),
                "meta-analysis".into(),
                "comprehensive analysis".into(),
            ],
        },
        ModeRouteConfig {
            name: "aeromedical_risk".into(),
            patterns: vec![
                "aeromedical".into(),
                "flight risk".into(),
                "pilot".into(),
                "aviation medicine".into(),
                "flight surgeon".into(),
            ],
        },
        ModeRouteConfig {
            name: "aerospace_medicine_rag".into(),
            patterns: vec![
                "aerospace medicine".into(),
                "astronaut".into(),
                "microgravity".into(),
                "spaceflight".into(),
                "space medicine".into(),
            ],
        },
    ]
}

impl Default for RouterConfig {
    fn default() -> Self {
        Self {
            default_mode: default_mode(),
            auto_switch: false,
            min_confidence: default_min_confidence(),
            modes: default_modes(),
        }
    }
}

/// Flowise-style chatflow backends, keyed by flow name.
#[derive(Clone, Serialize, Deserialize)]
pub struct ChatflowsConfig {
    /// Base URL of the chatflow service
    #[serde(default = "default_chatflow_base_url")]
    pub base_url: String,

    /// API key (env `FLOWISE_API_KEY` overrides)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub api_key: Option<String>,

    /// Flow name -> chatflow id
    #[serde(default)]
    pub flows: HashMap<String, String>,
}

fn default_chatflow_base_url() -> String {
    "https://cloud.flowiseai.com".into()
}

impl Default for ChatflowsConfig {
    fn default() -> Self {
        Self {
            base_url: default_chatflow_base_url(),
            api_key: None,
            flows: HashMap::new(),
        }
    }
}

impl std::fmt::Debug for ChatflowsConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ChatflowsConfig")
            .field("base_url", &self.base_url)
            .field("api_key", &redact(&self.api_key))
            .field("flows", &self.flows)
            .finish()
    }
}

impl ChatflowsConfig {
    /// Look up a chatflow id by flow name.
    pub fn flow_id(&self, name: &str) -> Option<&str> {
        self.flows.get(name).map(String::as_str)
    }
}

/// Optional operating-guidelines file, appended to every agent's system
/// message. The file is read once at config load; a missing file simply
/// turns the feature off.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct GuidelinesConfig {
    /// Path to a markdown guidelines file
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub path: Option<String>,

    /// File content, populated at load time
    #[serde(skip)]
    content: Option<String>,
}

impl GuidelinesConfig {
    /// The loaded guidelines text, if the file existed at startup.
    pub fn content(&self) -> Option<&str> {
        self.content.as_deref()
    }

    fn load_content(&mut self) {
        let Some(path) = &self.path else {
            return;
        };
        match std::fs::read_to_string(path) {
            Ok(text) => self.content = Some(text),
            Err(e) => {
                tracing::debug!(path = %path, error = %e, "No guidelines file, feature disabled");
            }
        }
    }
}

impl AppConfig {
    /// Load configuration from `medwing.toml` in the working directory.
    ///
    /// Environment variable overrides (highest priority):
    /// - `MEDWING_API_KEY` / `OPENAI_API_KEY` — provider API key
    /// - `MEDWING_MODEL` — default model
    /// - `MEDWING_BASE_URL` — provider base URL
    /// - `FLOWISE_API_KEY` / `FLOWISE_API_URL` — chatflow service
    pub fn load() -> Result<Self, ConfigError> {
        let mut config = Self::load_from(Path::new("medwing.toml"))?;

        if config.provider.api_key.is_none() {
            config.provider.api_key = std::env::var("MEDWING_API_KEY")
                .ok()
                .or_else(|| std::env::var("OPENAI_API_KEY").ok());
        }
        if let Ok(model) = std::env::var("MEDWING_MODEL") {
            config.provider.model = model;
        }
        if let Ok(url) = std::env::var("MEDWING_BASE_URL") {
            config.provider.base_url = url;
        }
        if config.chatflows.api_key.is_none() {
            config.chatflows.api_key = std::env::var("FLOWISE_API_KEY").ok();
        }
        if let Ok(url) = std::env::var("FLOWISE_API_URL") {
            config.chatflows.base_url = url;
        }

        Ok(config)
    }

    /// Load configuration from a specific file path.
    pub fn load_from(path: &Path) -> Result<Self, ConfigError> {
        let mut config = if path.exists() {
            let content = std::fs::read_to_string(path).map_err(|e| ConfigError::Io {
                path: path.display().to_string(),
                reason: e.to_string(),
            })?;
            toml::from_str::<Self>(&content).map_err(|e| ConfigError::Parse(e.to_string()))?
        } else {
            tracing::info!("No config file found at {}, using defaults", path.display());
            Self::default()
        };

        config.validate()?;
        config.guidelines.load_content();
        Ok(config)
    }

    /// Validate the configuration.
    fn validate(&self) -> Result<(), ConfigError> {
        if self.provider.temperature < 0.0 || self.provider.temperature > 2.0 {
            return Err(ConfigError::Invalid(
                "provider.temperature must be between 0.0 and 2.0".into(),
            ));
        }
        if self.retry.max_attempts == 0 {
            return Err(ConfigError::Invalid(
                "retry.max_attempts must be at least 1".into(),
            ));
        }
        if self.retry.backoff_factor < 1.0 {
            return Err(ConfigError::Invalid(
                "retry.backoff_factor must be >= 1.0".into(),
            ));
        }
        if !(0.0..=1.0).contains(&self.router.min_confidence) {
            return Err(ConfigError::Invalid(
                "router.min_confidence must be between 0.0 and 1.0".into(),
            ));
        }
        if self.engine.max_tool_iterations == 0 {
            return Err(ConfigError::Invalid(
                "engine.max_tool_iterations must be at least 1".into(),
            ));
        }
        Ok(())
    }

    /// Check if a provider API key is available (from config or environment).
    pub fn has_api_key(&self) -> bool {
        self.provider.api_key.is_some()
    }
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            provider: ProviderConfig::default(),
            retry: RetryConfig::default(),
            engine: EngineConfig::default(),
            router: RouterConfig::default(),
            chatflows: ChatflowsConfig::default(),
            guidelines: GuidelinesConfig::default(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_is_valid() {
        let config = AppConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.provider.model, "gpt-4o-mini");
        assert_eq!(config.retry.max_attempts, 3);
        assert_eq!(config.router.default_mode, "prompt");
        assert_eq!(config.engine.max_tool_iterations, 25);
    }

    #[test]
    fn config_roundtrip_toml() {
        let config = AppConfig::default();
        let toml_str = toml::to_string_pretty(&config).unwrap();
        let parsed: AppConfig = toml::from_str(&toml_str).unwrap();
        assert_eq!(parsed.provider.model, config.provider.model);
        assert_eq!(parsed.router.modes.len(), config.router.modes.len());
    }

    #[test]
    fn invalid_temperature_rejected() {
        let config = AppConfig {
            provider: ProviderConfig {
                temperature: 5.0,
                ..ProviderConfig::default()
            },
            ..AppConfig::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn zero_retry_attempts_rejected() {
        let config = AppConfig {
            retry: RetryConfig {
                max_attempts: 0,
                ..RetryConfig::default()
            },
            ..AppConfig::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn missing_config_file_returns_defaults() {
        let config = AppConfig::load_from(Path::new("/nonexistent/medwing.toml")).unwrap();
        assert_eq!(config.provider.model, "gpt-4o-mini");
    }

    #[test]
    fn retry_config_maps_to_policy() {
        let retry = RetryConfig {
            max_attempts: 5,
            base_delay_secs: 0.5,
            backoff_factor: 3.0,
            jitter: false,
        };
        let policy = retry.policy();
        assert_eq!(policy.max_attempts, 5);
        assert_eq!(policy.base_delay, Duration::from_millis(500));
        assert_eq!(policy.backoff_factor, 3.0);
        assert!(!policy.jitter);
    }

    #[test]
    fn route_table_order_is_preserved() {
        let toml_str = r#"
[router]
default_mode = "prompt"

[[router.modes]]
name = "aeromedical_risk"
patterns = ["aeromedical", "pilot"]

[[router.modes]]
name = "deep_research"
patterns = ["literature"]
"#;
        let config: AppConfig = toml::from_str(toml_str).unwrap();
        let names: Vec<&str> = config.router.modes.iter().map(|m| m.name.as_str()).collect();
        assert_eq!(names, ["aeromedical_risk", "deep_research"]);
    }

    #[test]
    fn chatflow_ids_parse() {
        let toml_str = r#"
[chatflows]
base_url = "https://flowise.example.com"

[chatflows.flows]
deep_research = "43677137-d307-4ff4-96c9-5019b6e10879"
aeromedical_risk = "d0bf0d84-1343-4f3b-a887-780d20f9e3c6"
"#;
        let config: AppConfig = toml::from_str(toml_str).unwrap();
        assert_eq!(
            config.chatflows.flow_id("deep_research"),
            Some("43677137-d307-4ff4-96c9-5019b6e10879")
        );
        assert_eq!(config.chatflows.flow_id("unknown"), None);
    }

    #[test]
    fn missing_guidelines_file_disables_feature() {
        let mut guidelines = GuidelinesConfig {
            path: Some("/nonexistent/AGENTS.md".into()),
            content: None,
        };
        guidelines.load_content();
        assert!(guidelines.content().is_none());
    }

    #[test]
    fn guidelines_file_is_read_at_load() {
        let path = std::env::temp_dir().join("medwing_guidelines_test.md");
        std::fs::write(&path, "Cite primary sources.").unwrap();

        let mut guidelines = GuidelinesConfig {
            path: Some(path.display().to_string()),
            content: None,
        };
        guidelines.load_content();
        assert_eq!(guidelines.content(), Some("Cite primary sources."));

        std::fs::remove_file(&path).ok();
    }

    #[test]
    fn debug_redacts_secrets() {
        let config = AppConfig {
            provider: ProviderConfig {
                api_key: Some("sk-very-secret".into()),
                ..ProviderConfig::default()
            },
            ..AppConfig::default()
        };
        let debug = format!("{config:?}");
        assert!(!debug.contains("sk-very-secret"));
        assert!(debug.contains("[REDACTED]"));
    }
}
