//! Agent personas and the mode-router table.
//!
//! The prompt-enhancement chain is built in reverse order of handoff:
//! the processor exists before the analyzer that hands off to it, and the
//! analyzer before the triage agent that fronts the whole chain. The
//! research modes are single agents whose only capability is one chatflow
//! consultation tool.

use std::sync::Arc;

use medwing_config::AppConfig;
use medwing_core::error::ConfigError;
use medwing_core::schema::{ParamType, ToolSchema};
use medwing_core::tool::{required_str, FunctionTool, Tool};
use medwing_core::AgentDefinition;
use medwing_engine::HandoffTool;
use medwing_providers::{ChatflowClient, ChatflowTool};
use medwing_router::ModeRouter;

/// Build the full mode router: the ordered route table from configuration,
/// with an agent registered for every built-in mode.
pub fn build_router(
    config: &AppConfig,
    chatflows: &Arc<ChatflowClient>,
) -> Result<ModeRouter, ConfigError> {
    let mut router = ModeRouter::new(&config.router.default_mode);
    for mode in &config.router.modes {
        let patterns: Vec<&str> = mode.patterns.iter().map(String::as_str).collect();
        router = router.route(&mode.name, &patterns)?;
    }

    router.register("prompt", triage_agent(config, chatflows)?);
    router.register(
        "deep_research",
        research_agent(
            config,
            chatflows,
            "Deep Research",
            "deep_research",
            "consult_deep_research",
            "Query the deep research chatflow for comprehensive, citation-backed analysis.",
            "You are a deep research specialist. For every user question, call \
             consult_deep_research with a focused research question, then synthesize \
             the returned evidence into a structured answer with explicit citations.",
        )?,
    );
    router.register(
        "aeromedical_risk",
        research_agent(
            config,
            chatflows,
            "Aeromedical Risk Assessor",
            "aeromedical_risk",
            "consult_aeromedical_risk",
            "Query the aeromedical risk assessment chatflow.",
            "You are an aeromedical risk assessor. Use consult_aeromedical_risk to \
             ground every assessment in the aviation-medicine knowledge base, and be \
             conservative: flag uncertainty explicitly rather than guessing.",
        )?,
    );
    router.register(
        "aerospace_medicine_rag",
        research_agent(
            config,
            chatflows,
            "Aerospace Medicine RAG",
            "aerospace_medicine_rag",
            "consult_aerospace_medicine",
            "Query the aerospace medicine retrieval chatflow.",
            "You are an aerospace medicine assistant backed by a retrieval system. \
             Answer questions about spaceflight physiology and clinical aerospace \
             medicine by consulting consult_aerospace_medicine and citing what it returns.",
        )?,
    );

    Ok(router)
}

/// The triage agent fronting the prompt-enhancement chain.
///
/// Built last: it hands off to the analyzer, which hands off to the
/// processor.
fn triage_agent(
    config: &AppConfig,
    chatflows: &Arc<ChatflowClient>,
) -> Result<AgentDefinition, ConfigError> {
    let processor = processor_agent(config, chatflows)?;
    let analyzer = analyzer_agent(config, &processor)?;

    AgentDefinition::builder("Triage Agent")
        .instructions(
            "You are a Triage Agent. Greet the user and route their request to the \
             Prompt Analyzer for enhancement and processing. Almost all requests \
             should be handed off; only escalate to a human when the request is \
             clearly out of scope for an automated research system.",
        )
        .model(&config.provider.model)
        .tool(escalate_tool()?)
        .tool(HandoffTool::to(&analyzer))
        .build()
}

fn analyzer_agent(
    config: &AppConfig,
    processor: &AgentDefinition,
) -> Result<AgentDefinition, ConfigError> {
    AgentDefinition::builder("Prompt Analyzer")
        .instructions(
            "You are a Prompt Analyzer and Enhancer. You receive a user prompt from \
             the Triage Agent. Analyze its domain, intent, and complexity, then \
             rewrite it to be significantly more detailed, contextual, and structured. \
             Once you have the enhanced prompt, hand off to the Prompt Processor, \
             keeping the original question visible alongside the enhanced one.",
        )
        .model(&config.provider.model)
        .tool(HandoffTool::to(processor))
        .build()
}

/// The processor closes the chain: it holds the chatflow consultation tools
/// and picks the backend that fits the enhanced prompt.
fn processor_agent(
    config: &AppConfig,
    chatflows: &Arc<ChatflowClient>,
) -> Result<AgentDefinition, ConfigError> {
    AgentDefinition::builder("Prompt Processor")
        .instructions(
            "You are a Prompt Processing Specialist. You receive an enhanced prompt \
             and the original user question from the Analyzer. Route the enhanced \
             prompt to the most appropriate retrieval backend: deep research for \
             comprehensive literature synthesis, PubMed for clinical literature, or \
             the NASA human-research backend for spaceflight questions. Synthesize \
             the backend's answer for the user.",
        )
        .model(&config.provider.model)
        .tool(chatflow_tool(
            config,
            chatflows,
            "consult_deep_research",
            "Query the deep research chatflow for comprehensive analysis.",
            "deep_research",
        )?)
        .tool(chatflow_tool(
            config,
            chatflows,
            "consult_pubmed",
            "Query PubMed medical literature.",
            "pubmed",
        )?)
        .tool(chatflow_tool(
            config,
            chatflows,
            "consult_nasa_hrp",
            "Query NASA Human Research Program data.",
            "nasa_hrp",
        )?)
        .build()
}

/// A single-tool research agent for one chatflow-backed mode.
#[allow(clippy::too_many_arguments)]
fn research_agent(
    config: &AppConfig,
    chatflows: &Arc<ChatflowClient>,
    name: &str,
    flow_name: &str,
    tool_name: &str,
    tool_description: &str,
    instructions: &str,
) -> Result<AgentDefinition, ConfigError> {
    AgentDefinition::builder(name)
        .instructions(instructions)
        .model(&config.provider.model)
        .tool(chatflow_tool(
            config,
            chatflows,
            tool_name,
            tool_description,
            flow_name,
        )?)
        .build()
}

/// A consultation tool for a named chatflow. An unconfigured chatflow id is
/// left empty; the service rejects it at call time and the engine converts
/// that into a tool-result error, mirroring every other backend failure.
fn chatflow_tool(
    config: &AppConfig,
    chatflows: &Arc<ChatflowClient>,
    name: &str,
    description: &str,
    flow_name: &str,
) -> Result<Arc<dyn Tool>, ConfigError> {
    ChatflowTool::new(
        name,
        description,
        Arc::clone(chatflows),
        config.chatflows.flow_id(flow_name).unwrap_or_default(),
    )
}

fn escalate_tool() -> Result<Arc<dyn Tool>, ConfigError> {
    let schema = ToolSchema::builder("escalate_to_human")
        .description("Escalate complex issues to human assistance.")
        .described_param(
            "summary",
            ParamType::String,
            true,
            "A short summary of the issue being escalated",
        )
        .build()?;

    Ok(Arc::new(FunctionTool::new(schema, |args| {
        let summary = required_str(&args, "summary")?;
        tracing::info!(summary, "Escalating to human");
        Ok(format!("Escalated to human assistance: {summary}"))
    })))
}

#[cfg(test)]
mod tests {
    use super::*;
    use medwing_core::retry::RetryPolicy;

    fn test_setup() -> (AppConfig, Arc<ChatflowClient>) {
        let config = AppConfig::default();
        let chatflows = Arc::new(ChatflowClient::new(
            "https://flowise.example.com",
            "test-key",
            std::time::Duration::from_secs(10),
            RetryPolicy::default(),
        ));
        (config, chatflows)
    }

    #[test]
    fn router_has_all_modes_registered() {
        let (config, chatflows) = test_setup();
        let router = build_router(&config, &chatflows).unwrap();

        for mode in [
            "prompt",
            "deep_research",
            "aeromedical_risk",
            "aerospace_medicine_rag",
        ] {
            assert!(router.resolve(mode).is_some(), "mode {mode} not registered");
        }
        assert_eq!(router.default_mode(), "prompt");
    }

    #[test]
    fn route_table_follows_config_order() {
        let (config, chatflows) = test_setup();
        let router = build_router(&config, &chatflows).unwrap();
        let modes: Vec<&str> = router.modes().collect();
        assert_eq!(
            modes,
            ["deep_research", "aeromedical_risk", "aerospace_medicine_rag"]
        );
    }

    #[test]
    fn triage_chain_is_wired_in_reverse() {
        let (config, chatflows) = test_setup();
        let router = build_router(&config, &chatflows).unwrap();

        let triage = router.resolve("prompt").unwrap();
        assert_eq!(triage.name(), "Triage Agent");
        assert!(triage.tool("escalate_to_human").is_some());
        assert!(triage.tool("transfer_to_prompt_analyzer").is_some());

        // The analyzer the triage agent hands off to must itself hand off
        // to the processor, which holds the chatflow tools.
        let handoff = triage.tool("transfer_to_prompt_analyzer").unwrap();
        assert!(handoff.schema().params().is_empty());
    }

    #[tokio::test]
    async fn triage_handoff_yields_analyzer_with_processor_handoff() {
        use medwing_core::tool::ToolOutcome;

        let (config, chatflows) = test_setup();
        let router = build_router(&config, &chatflows).unwrap();
        let triage = router.resolve("prompt").unwrap();

        let handoff = triage.tool("transfer_to_prompt_analyzer").unwrap();
        let outcome = handoff.invoke(serde_json::json!({})).await.unwrap();
        let analyzer = match outcome {
            ToolOutcome::Handoff(agent) => agent,
            ToolOutcome::Text(_) => panic!("expected handoff"),
        };
        assert_eq!(analyzer.name(), "Prompt Analyzer");
        assert!(analyzer.tool("transfer_to_prompt_processor").is_some());

        let next = analyzer.tool("transfer_to_prompt_processor").unwrap();
        let outcome = next.invoke(serde_json::json!({})).await.unwrap();
        let processor = match outcome {
            ToolOutcome::Handoff(agent) => agent,
            ToolOutcome::Text(_) => panic!("expected handoff"),
        };
        assert_eq!(processor.name(), "Prompt Processor");
        assert!(processor.tool("consult_deep_research").is_some());
        assert!(processor.tool("consult_pubmed").is_some());
        assert!(processor.tool("consult_nasa_hrp").is_some());
    }

    #[test]
    fn research_agents_expose_one_consultation_tool() {
        let (config, chatflows) = test_setup();
        let router = build_router(&config, &chatflows).unwrap();

        let risk = router.resolve("aeromedical_risk").unwrap();
        assert_eq!(risk.tools().len(), 1);
        assert_eq!(risk.tools()[0].name(), "consult_aeromedical_risk");

        let rag = router.resolve("aerospace_medicine_rag").unwrap();
        assert_eq!(rag.tools()[0].name(), "consult_aerospace_medicine");
    }

    #[test]
    fn classification_routes_to_registered_agents() {
        let (config, chatflows) = test_setup();
        let router = build_router(&config, &chatflows).unwrap();

        let c = router.classify("systematic review of pilot fatigue literature");
        assert_eq!(c.mode, "deep_research");
        assert!(router.resolve(&c.mode).is_some());

        let c = router.classify("tell me a joke");
        assert_eq!(c.mode, "prompt");
        assert_eq!(c.confidence, 0.0);
    }
}
