#![warn(clippy::all, clippy::pedantic)]
#![allow(
    clippy::doc_markdown,
    clippy::missing_errors_doc,
    clippy::module_name_repetitions,
    clippy::too_many_lines,
    clippy::uninlined_format_args
)]

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use tracing_subscriber::{fmt, EnvFilter};

use llm_npc::config::{resolve_config_dir, Config};
use llm_npc::context::ActInput;
use llm_npc::response::ActionResult;
use llm_npc::{ConfigCommands, NpcClient, NpcCommands, ToolCommands};

/// `llm-npc` - talk to an LLM NPC backend from the command line.
#[derive(Parser, Debug)]
#[command(name = "llm-npc")]
#[command(version)]
#[command(about = "Command-line client for the LLM NPC backend.", long_about = None)]
struct Cli {
    /// Directory holding config.toml (default: $LLM_NPC_CONFIG_DIR or ~/.llm-npc)
    #[arg(long, global = true)]
    config_dir: Option<String>,

    /// Backend URL, overriding config and LLM_NPC_BASE_URL
    #[arg(long, global = true)]
    base_url: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Check that the backend answers /health
    Health,

    /// Manage NPCs (list, show, create, delete, act)
    #[command(long_about = "\
Manage NPCs on the backend.

Examples:
  llm-npc npc list
  llm-npc npc create --name Elara --background \"Runs the tavern\"
  llm-npc npc act <id> --surrounding \"Bar counter\" --event \"A stranger walks in\"
  llm-npc npc delete <id>")]
    Npc {
        #[command(subcommand)]
        npc_command: NpcCommands,
    },

    /// Inspect tool sessions
    Tools {
        #[command(subcommand)]
        tool_command: ToolCommands,
    },

    /// Manage configuration
    #[command(long_about = "\
Inspect configuration.

Use 'schema' to dump the JSON Schema for the config file, which documents \
every available key, type, and default value.

Examples:
  llm-npc config show
  llm-npc config schema > schema.json")]
    Config {
        #[command(subcommand)]
        config_command: ConfigCommands,
    },
}

async fn load_config(cli: &Cli) -> Result<Config> {
    let dir = match &cli.config_dir {
        Some(dir) if dir.trim().is_empty() => bail!("--config-dir cannot be empty"),
        Some(dir) => PathBuf::from(
            shellexpand::full(dir)
                .with_context(|| format!("Failed to expand --config-dir {dir}"))?
                .into_owned(),
        ),
        None => resolve_config_dir()?,
    };

    let mut config = Config::load_from(&dir).await?;
    if let Some(base_url) = &cli.base_url {
        config.base_url = base_url.clone();
        config.validate()?;
    }
    Ok(config)
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Initialize logging - respects RUST_LOG env var, defaults to INFO
    let subscriber = fmt::Subscriber::builder()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .finish();
    tracing::subscriber::set_global_default(subscriber)
        .context("setting default subscriber failed")?;

    let config = load_config(&cli).await?;

    if let Commands::Config { config_command } = &cli.command {
        return match config_command {
            ConfigCommands::Show => {
                println!("# {}", config.config_path.display());
                print!(
                    "{}",
                    toml::to_string_pretty(&config).context("Failed to serialize config")?
                );
                Ok(())
            }
            ConfigCommands::Schema => {
                println!(
                    "{}",
                    serde_json::to_string_pretty(&Config::json_schema()?)
                        .context("Failed to serialize JSON Schema")?
                );
                Ok(())
            }
        };
    }

    let client = NpcClient::from_config(&config);

    match cli.command {
        Commands::Config { .. } => Ok(()),

        Commands::Health => {
            if client.health_check().await {
                println!("✅ {} is up", client.base_url());
                Ok(())
            } else {
                bail!("{} did not answer /health with pong", client.base_url())
            }
        }

        Commands::Npc { npc_command } => handle_npc_command(npc_command, &client).await,

        Commands::Tools { tool_command } => match tool_command {
            ToolCommands::Show { session } => {
                let session_id = session
                    .or_else(|| config.session.default_session_id.clone())
                    .context("No session id given and session.default_session_id is unset")?;
                let tools = client.session_tools(&session_id).await?;
                println!("Session {} ({} tools)", tools.session_id, tools.tools_count);
                for tool in &tools.tools {
                    println!("  {:<20} {}", tool.name, tool.description);
                    for (name, spec) in tool.parameters.iter() {
                        let required = if spec.required { "required" } else { "optional" };
                        println!("      {name}: {} ({required}) {}", spec.kind, spec.description);
                    }
                }
                Ok(())
            }
        },
    }
}

async fn handle_npc_command(command: NpcCommands, client: &NpcClient) -> Result<()> {
    match command {
        NpcCommands::List => {
            let listing = client.list_npcs().await?;
            println!("NPCs ({} total):\n", listing.count);
            for (id, npc) in &listing.npcs {
                println!("  {id}  {}", npc.name);
            }
            Ok(())
        }

        NpcCommands::Show { id } => {
            let npc = client.get_npc(&id).await?;
            println!("Id:          {id}");
            println!("Name:        {}", npc.name);
            println!("Background:  {}", npc.background_story);
            Ok(())
        }

        NpcCommands::Create { name, background } => {
            let npc = client
                .session_with_random_id()
                .create_npc(&name, &background)
                .await?;
            println!("Created {} ({})", npc.name(), npc.id());
            Ok(())
        }

        NpcCommands::Delete { id } => {
            client.delete_npc(&id).await?;
            println!("Deleted {id}");
            Ok(())
        }

        NpcCommands::Act {
            id,
            surroundings,
            events,
            json,
        } => {
            let info = client.get_npc(&id).await?;
            let npc = client
                .session_with_random_id()
                .attach_npc(id, info.name, info.background_story);

            let mut input = ActInput::new(surroundings);
            if !events.is_empty() {
                input = input.with_events(events);
            }
            let result = npc.act(input).await;

            if json {
                // Failures that never produced a body have no raw payload.
                let rendered = if result.raw.is_empty() {
                    serde_json::to_string_pretty(&result)
                } else {
                    serde_json::to_string_pretty(&result.raw)
                };
                println!(
                    "{}",
                    rendered.context("Failed to serialize action result")?
                );
            } else {
                print_action(npc.name(), &result);
            }

            if result.success {
                Ok(())
            } else {
                bail!(
                    "action failed: {}",
                    result.error.as_deref().unwrap_or("unknown error")
                )
            }
        }
    }
}

fn print_action(name: &str, result: &ActionResult) {
    if !result.text.is_empty() {
        println!("{name}: {}", result.text);
    }
    for (i, round) in result.rounds.iter().enumerate() {
        for call in &round.tool_calls {
            let status = if call.success { "ok" } else { "failed" };
            println!(
                "  [round {}] {}({}) {status}",
                i + 1,
                call.name,
                serde_json::Value::Object(call.args.clone())
            );
            if let Some(response) = &call.response {
                println!("      -> {response}");
            }
        }
    }
}
