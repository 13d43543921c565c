//! # medwing Router
//!
//! Deterministic keyword-based mode routing: an ordered list of
//! (mode, pattern-set) pairs is tested against the lower-cased query and
//! the first mode with any match wins. Classification is side-effect-free
//! and idempotent; whether a detected mode actually switches the session
//! is a policy decision (`ModePolicy`), not the classifier's.

pub mod policy;

pub use policy::{ModeDecision, ModePolicy};

use std::collections::HashMap;

use medwing_core::error::ConfigError;
use medwing_core::AgentDefinition;
use regex_lite::Regex;
use tracing::debug;

/// The outcome of classifying one query.
#[derive(Debug, Clone, PartialEq)]
pub struct Classification {
    /// The winning mode name.
    pub mode: String,

    /// 1.0 for a pattern match, 0.0 for the default-mode fallback. The
    /// interface leaves room for a probabilistic classifier without
    /// changing callers.
    pub confidence: f32,
}

/// One entry in the ordered route table.
#[derive(Debug)]
struct ModeRoute {
    mode: String,
    patterns: Vec<Regex>,
}

/// Maps free-text queries to named modes, and modes to agent definitions.
///
/// Route order is load-bearing: classification is first-match-wins, not
/// best-match.
#[derive(Debug)]
pub struct ModeRouter {
    routes: Vec<ModeRoute>,
    default_mode: String,
    agents: HashMap<String, AgentDefinition>,
}

impl ModeRouter {
    /// Create a router that falls back to `default_mode` when nothing
    /// matches.
    pub fn new(default_mode: impl Into<String>) -> Self {
        Self {
            routes: Vec::new(),
            default_mode: default_mode.into(),
            agents: HashMap::new(),
        }
    }

    /// Append a route. Patterns are matched against the lower-cased query,
    /// so they should be written in lower case.
    pub fn route(mut self, mode: impl Into<String>, patterns: &[&str]) -> Result<Self, ConfigError> {
        let mode = mode.into();
        let mut compiled = Vec::with_capacity(patterns.len());
        for pattern in patterns {
            let regex = Regex::new(pattern).map_err(|e| ConfigError::InvalidPattern {
                mode: mode.clone(),
                pattern: (*pattern).to_string(),
                reason: e.to_string(),
            })?;
            compiled.push(regex);
        }
        self.routes.push(ModeRoute {
            mode,
            patterns: compiled,
        });
        Ok(self)
    }

    /// Register the agent that services a mode.
    pub fn register(&mut self, mode: impl Into<String>, agent: AgentDefinition) {
        self.agents.insert(mode.into(), agent);
    }

    /// Classify a query into a mode.
    pub fn classify(&self, query: &str) -> Classification {
        let query = query.to_lowercase();

        for route in &self.routes {
            if route.patterns.iter().any(|p| p.is_match(&query)) {
                debug!(mode = %route.mode, "Query matched mode");
                return Classification {
                    mode: route.mode.clone(),
                    confidence: 1.0,
                };
            }
        }

        Classification {
            mode: self.default_mode.clone(),
            confidence: 0.0,
        }
    }

    /// Resolve a mode to its registered agent.
    pub fn resolve(&self, mode: &str) -> Option<&AgentDefinition> {
        self.agents.get(mode)
    }

    /// The configured fallback mode.
    pub fn default_mode(&self) -> &str {
        &self.default_mode
    }

    /// Route modes, in table order.
    pub fn modes(&self) -> impl Iterator<Item = &str> {
        self.routes.iter().map(|r| r.mode.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn research_router() -> ModeRouter {
        ModeRouter::new("prompt")
            .route(
                "deep_research",
                &["deep research", "systematic review", "literature"],
            )
            .unwrap()
            .route("aeromedical_risk", &["aeromedical", "flight risk", "pilot"])
            .unwrap()
            .route(
                "aerospace_medicine_rag",
                &["aerospace medicine", "astronaut", "microgravity"],
            )
            .unwrap()
    }

    #[test]
    fn first_match_wins_over_later_routes() {
        let router = research_router();
        // Matches both deep_research ("literature") and aeromedical_risk
        // ("pilot") — the earlier route must win.
        let c = router.classify("literature on pilot fatigue");
        assert_eq!(c.mode, "deep_research");
        assert_eq!(c.confidence, 1.0);
    }

    #[test]
    fn unmatched_query_falls_back_to_default() {
        let router = research_router();
        let c = router.classify("what is the weather like today");
        assert_eq!(c.mode, "prompt");
        assert_eq!(c.confidence, 0.0);
    }

    #[test]
    fn matching_is_case_insensitive() {
        let router = research_router();
        let c = router.classify("ASTRONAUT bone density in MICROGRAVITY");
        assert_eq!(c.mode, "aerospace_medicine_rag");
        assert_eq!(c.confidence, 1.0);
    }

    #[test]
    fn classification_is_idempotent() {
        let router = research_router();
        let first = router.classify("flight risk for a diabetic pilot");
        let second = router.classify("flight risk for a diabetic pilot");
        assert_eq!(first, second);
    }

    #[test]
    fn invalid_pattern_fails_construction() {
        let err = ModeRouter::new("prompt")
            .route("broken", &["(unclosed"])
            .unwrap_err();
        assert!(matches!(
            err,
            ConfigError::InvalidPattern { ref mode, .. } if mode == "broken"
        ));
    }

    #[test]
    fn resolve_returns_registered_agent() {
        let mut router = research_router();
        let agent = AgentDefinition::builder("Deep Research")
            .model("o3-deep-research")
            .build()
            .unwrap();
        router.register("deep_research", agent);

        assert!(router.resolve("deep_research").is_some());
        assert!(router.resolve("prisma").is_none());
    }

    #[test]
    fn modes_preserve_table_order() {
        let router = research_router();
        let modes: Vec<&str> = router.modes().collect();
        assert_eq!(
            modes,
            ["deep_research", "aeromedical_risk", "aerospace_medicine_rag"]
        );
    }
}
