//! `wrenchwise chat` — Interactive or single-message chat mode.

use std::io::Write;
use std::path::Path;
use tokio::io::{AsyncBufReadExt, BufReader};
use wrenchwise_cascade::{CascadeStream, ModelCascadeExecutor};
use wrenchwise_core::{AgentPersona, ConversationTurn, Language, Part, ToolDeclaration};

pub struct ChatOptions {
    pub persona: String,
    pub lang: Option<String>,
    pub web: bool,
    pub stream: bool,
}

/// One conversation with one persona; history lives only in memory.
struct Session {
    executor: ModelCascadeExecutor,
    persona: AgentPersona,
    language: Language,
    tools: Vec<ToolDeclaration>,
    stream: bool,
    history: Vec<ConversationTurn>,
}

impl Session {
    /// Ask one question and print the answer. Returns false when no tier answered.
    async fn ask(&mut self, text: &str, out: &mut impl Write) -> std::io::Result<bool> {
        let parts = vec![Part::text(text)];

        let reply = if self.stream {
            let stream = self.executor.stream(
                &self.persona,
                &self.history,
                parts,
                self.language,
                self.tools.clone(),
            );
            render_stream(stream, out).await?
        } else {
            let result = self
                .executor
                .send(&self.persona, &self.history, parts, self.language)
                .await;
            writeln!(out, "{}", result.text)?;
            tracing::debug!(tier = %result.active_model_tier, "Answered");

            // Remember the answer only, as the streaming path does.
            let preface = self.executor.safety().check_risk(text, self.language);
            let answer = preface
                .as_deref()
                .and_then(|p| result.text.strip_prefix(p))
                .unwrap_or(&result.text);
            result.succeeded().then(|| answer.to_string())
        };

        match reply {
            Some(reply) => {
                self.history.push(ConversationTurn::user(text));
                self.history.push(ConversationTurn::model(reply));
                Ok(true)
            }
            None => Ok(false),
        }
    }
}

/// Print a cascade as it arrives.
///
/// Returns the serving tier's text (without preface or transition notices),
/// or `None` when the cascade ended in failure.
async fn render_stream(
    mut stream: CascadeStream,
    out: &mut impl Write,
) -> std::io::Result<Option<String>> {
    let mut reply = String::new();

    while let Some(chunk) = stream.next().await {
        if let Some(tier) = &chunk.active_model {
            tracing::debug!(tier = %tier, "Tier active");
            reply.clear();
        }
        if let Some(text) = &chunk.text {
            write!(out, "{text}")?;
            out.flush()?;
            reply.push_str(text);
        }
        if let Some(error) = &chunk.error_message {
            writeln!(out, "{error}")?;
            return Ok(None);
        }
    }

    writeln!(out)?;
    Ok(Some(reply))
}

pub async fn run(
    config_path: Option<&Path>,
    message: Option<String>,
    options: ChatOptions,
) -> Result<(), Box<dyn std::error::Error>> {
    let config = super::load_config(config_path)?;
    let language = super::language(&config, options.lang.as_deref())?;

    let persona = config.persona(&options.persona).cloned().ok_or_else(|| {
        let ids: Vec<&str> = config.personas.iter().map(|p| p.id.as_str()).collect();
        format!(
            "Unknown persona '{}'. Available: {}",
            options.persona,
            ids.join(", ")
        )
    })?;

    let provider = wrenchwise_providers::build_from_config(&config).map_err(|e| {
        format!("{e}\n  Config file: {}", config_location(config_path))
    })?;
    let executor = ModelCascadeExecutor::from_config(&config, provider)?;

    let mut session = Session {
        executor,
        persona,
        language,
        tools: if options.web {
            vec![ToolDeclaration::WebSearch]
        } else {
            vec![]
        },
        stream: options.stream,
        history: Vec::new(),
    };
    let mut stdout = std::io::stdout();

    if let Some(msg) = message {
        // Single message mode
        if !session.ask(&msg, &mut stdout).await? {
            return Err("No model tier could answer".into());
        }
        return Ok(());
    }

    // Interactive mode
    println!();
    println!("  🔧 Wrenchwise — {} ({})", session.persona.name, session.persona.title.get(language));
    println!("  {}", session.persona.warning.get(language));
    println!();
    println!("  Type your message and press Enter.");
    println!("  '/reset' clears the conversation, 'exit' or Ctrl+D quits.");
    println!();

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    loop {
        print!("  You > ");
        stdout.flush()?;

        let Some(line) = lines.next_line().await? else {
            break;
        };
        match line.trim() {
            "" => continue,
            "exit" | "quit" => break,
            "/reset" => {
                session.history.clear();
                println!("  (conversation cleared)");
                continue;
            }
            text => {
                print!("\n  {} > ", session.persona.name);
                stdout.flush()?;
                session.ask(text, &mut stdout).await?;
                println!();
            }
        }
    }

    println!();
    println!("  Bye! 🔧");
    println!();

    Ok(())
}

/// Where the config was read from, for error hints.
fn config_location(path: Option<&Path>) -> String {
    path.map(Path::to_path_buf)
        .unwrap_or_else(|| wrenchwise_config::AppConfig::config_dir().join("config.toml"))
        .display()
        .to_string()
}
