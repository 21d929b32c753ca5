//! `wrenchwise serve` — Start the HTTP gateway.

use std::path::Path;

pub async fn run(
    config_path: Option<&Path>,
    port_override: Option<u16>,
) -> Result<(), Box<dyn std::error::Error>> {
    let mut config = super::load_config(config_path)?;

    if let Some(port) = port_override {
        config.gateway.port = port;
    }

    println!("🔧 Wrenchwise Gateway");
    println!("   Listening: http://{}:{}", config.gateway.host, config.gateway.port);
    println!(
        "   Tiers:     {}",
        config
            .cascade
            .tiers
            .iter()
            .map(|t| t.id.as_str())
            .collect::<Vec<_>>()
            .join(" → ")
    );

    wrenchwise_gateway::start(config).await?;

    Ok(())
}
