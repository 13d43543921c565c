//! `medwing ask` — answer a single query and exit.

use medwing_config::AppConfig;
use medwing_core::message::Message;
use medwing_engine::{EngineSettings, TurnEngine};

use crate::personas;

pub async fn run(query: &str, mode: Option<&str>) -> Result<(), Box<dyn std::error::Error>> {
    let config = AppConfig::load()?;

    let provider = medwing_providers::build_provider(&config);
    let chatflows = medwing_providers::build_chatflow_client(&config);
    let router = personas::build_router(&config, &chatflows)?;

    // An explicit --mode wins; otherwise this is an "auto" entry point and
    // the classifier picks the agent.
    let mode = match mode {
        Some(m) => {
            if router.resolve(m).is_none() {
                return Err(format!("Unknown mode: {m} (see `medwing modes`)").into());
            }
            m.to_string()
        }
        None => router.classify(query).mode,
    };
    let agent = router
        .resolve(&mode)
        .ok_or_else(|| format!("No agent registered for mode '{mode}'"))?;

    tracing::debug!(%mode, agent = %agent.name(), "Answering single query");

    let engine = TurnEngine::new(provider).with_settings(EngineSettings {
        temperature: config.provider.temperature,
        max_tokens: Some(config.provider.max_tokens),
        max_tool_iterations: config.engine.max_tool_iterations,
        guidelines: config.guidelines.content().map(str::to_string),
    });

    let history = vec![Message::user(query)];
    let turn = engine.run_turn(agent, &history).await?;

    match turn.final_text() {
        Some(text) => println!("{text}"),
        None => eprintln!("(no answer produced)"),
    }

    Ok(())
}
