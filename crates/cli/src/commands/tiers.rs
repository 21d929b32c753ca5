//! `wrenchwise tiers` — Show the model ladder.

use std::path::Path;

pub fn run(config_path: Option<&Path>) -> Result<(), Box<dyn std::error::Error>> {
    let config = super::load_config(config_path)?;
    let ladder = config.cascade.ladder()?;

    println!("🪜 Model ladder ({:?} provider)", config.provider.kind);
    println!();
    for (i, tier) in ladder.iter().enumerate() {
        let tools = if tier.supports_tools { "tools" } else { "-" };
        println!("  {}. {:<32} {}", i + 1, tier.id, tools);
    }
    println!();
    match config.cascade.attempt_timeout() {
        Some(timeout) => println!("  Attempt timeout: {}s", timeout.as_secs()),
        None => println!("  Attempt timeout: none"),
    }
    println!("  History limit:   {} turns", config.cascade.history_limit);

    Ok(())
}
