//! `wrenchwise personas` — List the persona catalog.

use std::path::Path;

pub fn run(
    config_path: Option<&Path>,
    lang: Option<&str>,
) -> Result<(), Box<dyn std::error::Error>> {
    let config = super::load_config(config_path)?;
    let language = super::language(&config, lang)?;

    println!("🧰 Personas ({})", language.native_name());
    println!();
    for persona in &config.personas {
        println!("  {:<14} {} · {}", persona.id, persona.name, persona.title.get(language));
        println!("  {:<14} {}", "", persona.description.get(language));
    }

    Ok(())
}
