//! CLI command definitions for the `chatdocs` binary.
//!
//! Verb-after-noun layout: `chatdocs user add`, `chatdocs chatbot delete 4 --owner 2`.

pub mod chatbot;
pub mod user;

use clap::{Parser, Subcommand};

/// Document-grounded chatbot gateway.
#[derive(Parser)]
#[command(name = "chatdocs", version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Output machine-readable JSON instead of styled text.
    #[arg(long, global = true)]
    pub json: bool,

    /// More log output (-v info, -vv trace).
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Emit structured JSON log lines.
    #[arg(long, global = true)]
    pub log_json: bool,

    /// Export tracing spans through OpenTelemetry (stdout exporter).
    #[arg(long, global = true)]
    pub otel: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Start the REST API server.
    Serve {
        /// Port to listen on (overrides config and PORT).
        #[arg(short, long)]
        port: Option<u16>,

        /// Host to bind to (overrides config).
        #[arg(long)]
        host: Option<String>,
    },

    /// Manage user accounts.
    User {
        #[command(subcommand)]
        action: UserCommand,
    },

    /// Inspect and delete chatbots.
    Chatbot {
        #[command(subcommand)]
        action: ChatbotCommand,
    },
}

#[derive(Subcommand)]
pub enum UserCommand {
    /// Register a user.
    Add {
        #[arg(long)]
        username: String,

        #[arg(long)]
        email: String,

        #[arg(long, env = "CHATDOCS_USER_PASSWORD", hide_env_values = true)]
        password: String,

        /// Role string, e.g. "ADMIN" or "USER".
        #[arg(long)]
        role: Option<String>,
    },

    /// List all users.
    #[command(alias = "ls")]
    List,

    /// Delete a user and every chatbot they own.
    #[command(alias = "rm")]
    Delete {
        /// User id.
        id: i64,
    },
}

#[derive(Subcommand)]
pub enum ChatbotCommand {
    /// List chatbots of one owner.
    #[command(alias = "ls")]
    List {
        #[arg(long)]
        owner: i64,
    },

    /// Delete a chatbot (objects, processing data, then the record).
    #[command(alias = "rm")]
    Delete {
        /// Chatbot id.
        id: i64,

        #[arg(long)]
        owner: i64,
    },

    /// List the stored object keys of a chatbot.
    Objects {
        /// Chatbot id.
        id: i64,

        #[arg(long)]
        owner: i64,
    },
}
