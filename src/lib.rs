#![warn(clippy::all, clippy::pedantic)]
#![allow(
    clippy::doc_markdown,
    clippy::field_reassign_with_default,
    clippy::items_after_statements,
    clippy::map_unwrap_or,
    clippy::manual_let_else,
    clippy::missing_errors_doc,
    clippy::missing_panics_doc,
    clippy::module_name_repetitions,
    clippy::must_use_candidate,
    clippy::new_without_default,
    clippy::needless_pass_by_value,
    clippy::needless_raw_string_hashes,
    clippy::redundant_closure_for_method_calls,
    clippy::return_self_not_must_use,
    clippy::similar_names,
    clippy::single_match_else,
    clippy::struct_field_names,
    clippy::too_many_lines,
    clippy::uninlined_format_args,
    clippy::unnecessary_literal_bound,
    clippy::unnecessary_wraps
)]

//! Client SDK for an LLM-driven NPC backend.
//!
//! Declare the tools an NPC may call, register them for a session, create
//! NPCs, then send per-tick world context and get back what the NPC said and
//! which tools it invoked:
//!
//! ```no_run
//! use llm_npc::client::NpcClient;
//! use llm_npc::context::ActInput;
//! use llm_npc::tools::{Callable, Param};
//!
//! # async fn run() -> llm_npc::Result<()> {
//! let speak = Callable::new("speak")
//!     .doc("Say something.\n\nArgs:\n    message: What to say")
//!     .param(Param::new("message").typed("str"))
//!     .tool();
//!
//! let client = NpcClient::new("http://localhost:8080");
//! let session = client.session("tavern");
//! session.register_tools(&[speak]).await?;
//!
//! let elara = session.create_npc("Elara", "Runs the Prancing Pony").await?;
//! let result = elara
//!     .act(ActInput::new(["Bar counter", "Crackling fire"]).with_events(["A stranger walks in"]))
//!     .await;
//! for call in result.tool_calls() {
//!     println!("{} {:?}", call.name, call.args);
//! }
//! # Ok(())
//! # }
//! ```

use clap::Subcommand;
use serde::{Deserialize, Serialize};

pub mod client;
pub mod config;
pub mod context;
pub mod error;
pub mod response;
pub mod tools;

pub use client::{Npc, NpcClient, Session};
pub use config::Config;
pub use context::{ActInput, ContextBuilder, KnowledgeGraph, Surroundings};
pub use error::{NpcError, Result};
pub use response::{ActionResult, Round, ToolCall};
pub use tools::{Callable, Param, ToolDescriptor};

/// NPC management subcommands
#[derive(Subcommand, Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub enum NpcCommands {
    /// List every NPC the backend knows
    List,
    /// Show one NPC
    Show {
        /// Backend-assigned NPC id
        id: String,
    },
    /// Register a new NPC
    Create {
        #[arg(long)]
        name: String,
        /// Background story given to the model
        #[arg(long)]
        background: String,
    },
    /// Delete an NPC
    Delete { id: String },
    /// Send one action tick and print the decoded result
    #[command(long_about = "\
Send one action tick to an NPC and print the decoded result.

Each --surrounding is used as both name and description; each --event \
is sent with event type \"event\".

Examples:
  llm-npc npc act 3f2a --surrounding \"Bar counter\" --event \"A stranger walks in\"
  llm-npc npc act 3f2a --surrounding Forest --surrounding \"Sword on ground\" --json")]
    Act {
        id: String,
        #[arg(long = "surrounding")]
        surroundings: Vec<String>,
        #[arg(long = "event")]
        events: Vec<String>,
        /// Print the raw backend payload as JSON
        #[arg(long)]
        json: bool,
    },
}

/// Tool session subcommands
#[derive(Subcommand, Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub enum ToolCommands {
    /// Show the tools registered for a session
    Show {
        /// Session id; defaults to session.default_session_id from config
        session: Option<String>,
    },
}

/// Configuration subcommands
#[derive(Subcommand, Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub enum ConfigCommands {
    /// Print the effective configuration as TOML
    Show,
    /// Dump the full configuration JSON Schema to stdout
    Schema,
}
