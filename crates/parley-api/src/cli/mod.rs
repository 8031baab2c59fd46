//! CLI command definitions for the `parley` binary.
//!
//! Uses clap derive macros for argument parsing.

pub mod chat;
pub mod kv;
pub mod say;
pub mod status;

use clap::{Parser, Subcommand};
use clap_complete::Shell;

/// Chat assistant with per-user memory over an OpenAI-compatible endpoint.
#[derive(Parser)]
#[command(name = "parley", version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Output machine-readable JSON instead of styled text.
    #[arg(long, global = true)]
    pub json: bool,

    /// Suppress all output except errors.
    #[arg(long, global = true)]
    pub quiet: bool,

    /// Detailed output (-v for verbose, -vv for debug/trace).
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Export tracing spans through OpenTelemetry (stdout exporter).
    #[arg(long, global = true, env = "PARLEY_OTEL")]
    pub otel: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Deliver one inbound message, exactly as a chat platform would.
    Say {
        /// Sender user id (e.g. "QQ:12345").
        #[arg(short, long)]
        user: String,

        /// Sender display name.
        #[arg(short, long, default_value = "")]
        nickname: String,

        /// Group id; omit for a private message.
        #[arg(short, long)]
        group: Option<String>,

        /// Message text.
        text: String,
    },

    /// Run one assistant command for a user (e.g. `parley cmd -u QQ:1 rounds`).
    Cmd {
        /// Target user id.
        #[arg(short, long)]
        user: String,

        /// Command name or alias (`reset`, `重置AI`, `set-temperature`, ...).
        name: String,

        /// Command argument, where the command takes one.
        arg: Option<String>,
    },

    /// Start an interactive chat session as one user.
    Chat {
        /// User id to chat as.
        #[arg(short, long, default_value = "cli:local")]
        user: String,

        /// Display name to chat as.
        #[arg(short, long, default_value = "me")]
        nickname: String,
    },

    /// Manage the raw key-value store (set, get, delete, list).
    Kv {
        #[command(subcommand)]
        action: kv::KvCommand,
    },

    /// System status dashboard.
    Status,

    /// Start the REST API server.
    Serve {
        /// Port to listen on.
        #[arg(short, long, default_value = "3000")]
        port: u16,

        /// Host to bind to.
        #[arg(long, default_value = "127.0.0.1")]
        host: String,
    },

    /// Generate shell completions.
    Completions {
        /// Shell to generate completions for.
        shell: Shell,
    },
}
