//! `medwing modes` — list the configured routing modes.

use medwing_config::AppConfig;

pub fn run() -> Result<(), Box<dyn std::error::Error>> {
    let config = AppConfig::load()?;

    println!();
    println!("  Routing modes (first match wins, in this order):");
    println!();
    for mode in &config.router.modes {
        println!("  {}", mode.name);
        println!("      patterns: {}", mode.patterns.join(", "));
    }
    println!();
    println!("  default: {} (used when nothing matches)", config.router.default_mode);
    println!(
        "  auto-switch: {}",
        if config.router.auto_switch { "on" } else { "off (suggestions only)" }
    );
    println!();

    Ok(())
}
