//! `medwing chat` — interactive research session.
//!
//! Owns the conversation: each turn's delta is appended here, never inside
//! the engine. Before every turn the query is classified and the mode
//! policy decides whether to switch agents or merely suggest a better mode.

use std::io::Write;

use medwing_config::AppConfig;
use medwing_core::message::{Conversation, Message};
use medwing_engine::{EngineSettings, TurnEngine};
use medwing_router::{ModeDecision, ModePolicy, ModeRouter};

use crate::export::MarkdownExporter;
use crate::personas;

pub async fn run() -> Result<(), Box<dyn std::error::Error>> {
    let config = AppConfig::load()?;

    if !config.has_api_key() {
        eprintln!();
        eprintln!("  ERROR: No API key configured!");
        eprintln!();
        eprintln!("  Set one of these environment variables:");
        eprintln!("    MEDWING_API_KEY = 'sk-...'");
        eprintln!("    OPENAI_API_KEY  = 'sk-...'");
        eprintln!();
        eprintln!("  Or add it to medwing.toml under [provider].");
        eprintln!();
        return Err("No API key found. See above for setup instructions.".into());
    }

    let provider = medwing_providers::build_provider(&config);
    let chatflows = medwing_providers::build_chatflow_client(&config);
    let router = personas::build_router(&config, &chatflows)?;
    let policy = ModePolicy {
        auto_switch: config.router.auto_switch,
        min_confidence: config.router.min_confidence,
    };

    let engine = TurnEngine::new(provider).with_settings(EngineSettings {
        temperature: config.provider.temperature,
        max_tokens: Some(config.provider.max_tokens),
        max_tool_iterations: config.engine.max_tool_iterations,
        guidelines: config.guidelines.content().map(str::to_string),
    });

    let exporter = MarkdownExporter::new("exports")?;

    let mut mode = config.router.default_mode.clone();
    let mut agent = router
        .resolve(&mode)
        .ok_or_else(|| format!("No agent registered for default mode '{mode}'"))?
        .clone();
    let mut conversation = Conversation::new();

    println!();
    println!("  ╔══════════════════════════════════════════════╗");
    println!("  ║    medwing — Aeromedical Evidence Review     ║");
    println!("  ╚══════════════════════════════════════════════╝");
    println!();
    println!("  Model:  {}", config.provider.model);
    println!("  Mode:   {mode} (auto-detection {})",
        if config.router.auto_switch { "switches automatically" } else { "suggests only" });
    println!();
    println!("  Commands: /mode <name>, /modes, /export, /quit");
    println!();

    let stdin = std::io::stdin();
    loop {
        print!("  You > ");
        std::io::stdout().flush()?;

        let mut line = String::new();
        if stdin.read_line(&mut line)? == 0 {
            break;
        }
        let input = line.trim();
        if input.is_empty() {
            continue;
        }

        match input {
            "/quit" | "/exit" | "/q" => break,
            "/modes" => {
                print_modes(&router, &mode);
                continue;
            }
            "/export" => {
                match exporter.export_conversation(&conversation, &mode, agent.name()) {
                    Ok(path) => println!("  Exported to {}", path.display()),
                    Err(e) => eprintln!("  [Export Error] {e}"),
                }
                continue;
            }
            _ => {}
        }

        if let Some(requested) = input.strip_prefix("/mode ") {
            let requested = requested.trim();
            match router.resolve(requested) {
                Some(new_agent) => {
                    mode = requested.to_string();
                    agent = new_agent.clone();
                    println!("  Switched to {mode}");
                }
                None => eprintln!("  Unknown mode: {requested} (see /modes)"),
            }
            continue;
        }

        // Smart mode detection before the turn runs.
        let classification = router.classify(input);
        match policy.decide(&mode, &classification) {
            ModeDecision::Switch { mode: detected, .. } => {
                if let Some(new_agent) = router.resolve(&detected) {
                    mode = detected;
                    agent = new_agent.clone();
                    println!("  Auto-switched to {mode}");
                }
            }
            ModeDecision::Suggest { mode: detected, .. } => {
                println!("  Tip: this looks like a {detected} query (switch with /mode {detected})");
            }
            ModeDecision::Stay => {}
        }

        conversation.push(Message::user(input));

        eprint!("  ...");
        match engine.run_turn(&agent, &conversation.messages).await {
            Ok(turn) => {
                eprint!("\r     \r");
                if let Some(text) = turn.final_text() {
                    println!();
                    for line in text.lines() {
                        println!("  {} > {line}", turn.agent.name());
                    }
                    println!();
                }
                // A handoff leaves the settled agent active for the next turn.
                agent = turn.agent.clone();
                conversation.extend(turn.messages);
            }
            Err(e) => {
                eprint!("\r     \r");
                eprintln!("  [Error] {e}");
                println!();
            }
        }
    }

    println!();
    println!("  Goodbye!");
    println!();

    Ok(())
}

fn print_modes(router: &ModeRouter, current: &str) {
    println!();
    for mode in router.modes() {
        let marker = if mode == current { "*" } else { " " };
        println!("  {marker} {mode}");
    }
    let default = router.default_mode();
    let marker = if default == current { "*" } else { " " };
    println!("  {marker} {default} (default)");
    println!();
}
