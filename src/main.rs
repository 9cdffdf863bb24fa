//! imgrepo command-line interface.

use anyhow::Result;
use clap::{Parser, Subcommand};
use std::path::PathBuf;

use imgrepo::commands;

#[global_allocator]
static GLOBAL: mimalloc::MiMalloc = mimalloc::MiMalloc;

#[derive(Parser)]
#[command(name = "imgrepo")]
#[command(version, about = "Image repository backend with per-image access control")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the HTTP server
    Serve {
        /// Path to imgrepo.toml (default: ~/.imgrepo/imgrepo.toml)
        #[arg(short, long)]
        config: Option<PathBuf>,
        /// Port to listen on (overrides server.port)
        #[arg(short, long)]
        port: Option<u16>,
    },
    /// Print a session token for an existing user
    Token {
        /// User id (32 hex characters)
        user_id: String,
        #[arg(short, long)]
        config: Option<PathBuf>,
    },
    /// Manage user records
    User {
        #[command(subcommand)]
        action: UserAction,
    },
    /// List blobs with no image record
    Reconcile {
        /// Remove the orphaned blobs
        #[arg(long)]
        delete: bool,
        #[arg(short, long)]
        config: Option<PathBuf>,
    },
}

#[derive(Subcommand)]
enum UserAction {
    /// Add a user without a password
    Add {
        #[arg(long)]
        name: String,
        #[arg(long)]
        handle: String,
        #[arg(long)]
        email: String,
        #[arg(short, long)]
        config: Option<PathBuf>,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    match cli.command {
        Commands::Serve { config, port } => {
            commands::serve::execute(config.as_deref(), port).await?;
        },
        Commands::Token { user_id, config } => {
            commands::token::execute(config.as_deref(), &user_id).await?;
        },
        Commands::User { action } => match action {
            UserAction::Add {
                name,
                handle,
                email,
                config,
            } => {
                commands::user::add(config.as_deref(), &name, &handle, &email).await?;
            },
        },
        Commands::Reconcile { delete, config } => {
            commands::reconcile::execute(config.as_deref(), delete).await?;
        },
    }

    Ok(())
}
