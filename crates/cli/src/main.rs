//! Wrenchwise CLI — the main entry point.
//!
//! Commands:
//! - `chat`      — Talk to a persona, streaming by default
//! - `serve`     — Start the HTTP gateway
//! - `tiers`     — Show the model ladder
//! - `personas`  — List the persona catalog
//! - `config`    — Show or initialize configuration

use clap::{Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

mod commands;

#[derive(Parser)]
#[command(
    name = "wrenchwise",
    about = "Wrenchwise — DIY repair assistant with a resilient model cascade",
    version,
    author
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Log output format
    #[arg(long, global = true, value_enum, default_value_t = LogFormat::Text)]
    log_format: LogFormat,

    /// Config file (defaults to ~/.wrenchwise/config.toml)
    #[arg(long, global = true, env = "WRENCHWISE_CONFIG")]
    config: Option<PathBuf>,
}

#[derive(Clone, Copy, ValueEnum)]
enum LogFormat {
    Text,
    Json,
}

#[derive(Subcommand)]
enum Commands {
    /// Chat with a persona
    Chat {
        /// Send a single message instead of entering interactive mode
        #[arg(short, long)]
        message: Option<String>,

        /// Persona id
        #[arg(short, long, default_value = "handyman")]
        persona: String,

        /// Response language (en, de); defaults to the configured language
        #[arg(short, long)]
        lang: Option<String>,

        /// Ask for web-search grounding on tiers that support tools
        #[arg(long)]
        web: bool,

        /// Wait for the full answer instead of streaming it
        #[arg(long)]
        no_stream: bool,
    },

    /// Start the HTTP gateway server
    Serve {
        /// Override the port
        #[arg(short, long)]
        port: Option<u16>,
    },

    /// Show the model ladder in fallback order
    Tiers,

    /// List available personas
    Personas {
        /// Language for titles and descriptions
        #[arg(short, long)]
        lang: Option<String>,
    },

    /// Configuration management
    Config {
        #[command(subcommand)]
        action: ConfigAction,
    },
}

#[derive(Subcommand)]
enum ConfigAction {
    /// Print the effective configuration (API key redacted)
    Show,

    /// Write a default config file
    Init {
        /// Overwrite an existing file
        #[arg(long)]
        force: bool,
    },
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    // Initialize tracing; stdout is reserved for answers
    let filter = if cli.verbose { "debug" } else { "info" };
    let builder = tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(filter)),
        )
        .with_target(false)
        .with_writer(std::io::stderr);
    match cli.log_format {
        LogFormat::Text => builder.init(),
        LogFormat::Json => builder.json().init(),
    }

    let config_path = cli.config.as_deref();
    match cli.command {
        Commands::Chat {
            message,
            persona,
            lang,
            web,
            no_stream,
        } => {
            let options = commands::chat::ChatOptions {
                persona,
                lang,
                web,
                stream: !no_stream,
            };
            commands::chat::run(config_path, message, options).await?
        }
        Commands::Serve { port } => commands::serve::run(config_path, port).await?,
        Commands::Tiers => commands::tiers::run(config_path)?,
        Commands::Personas { lang } => commands::personas::run(config_path, lang.as_deref())?,
        Commands::Config { action } => match action {
            ConfigAction::Show => commands::config_cmd::show(config_path)?,
            ConfigAction::Init { force } => commands::config_cmd::init(config_path, force)?,
        },
    }

    Ok(())
}
