//! Threadbare CLI - database migrations and management tools.
//!
//! # Usage
//!
//! ```bash
//! # Run database migrations
//! threadbare-cli migrate
//!
//! # Insert the sample catalog into an empty database
//! threadbare-cli seed
//!
//! # Show whether the admin seat has been claimed
//! threadbare-cli admin status
//! ```
//!
//! # Commands
//!
//! - `migrate` - Run database migrations
//! - `seed` - Seed the product catalog with sample data
//! - `admin status` - Inspect the single admin seat

#![cfg_attr(not(test), forbid(unsafe_code))]

use clap::{Parser, Subcommand};

mod commands;

#[derive(Parser)]
#[command(name = "threadbare-cli")]
#[command(author, version, about = "Threadbare CLI tools")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run database migrations
    Migrate,
    /// Seed the product catalog with sample data
    Seed,
    /// Manage the admin seat
    Admin {
        #[command(subcommand)]
        action: AdminAction,
    },
}

#[derive(Subcommand)]
enum AdminAction {
    /// Show whether the admin seat has been claimed, and by whom
    Status,
}

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt::init();

    if let Err(e) = run(Cli::parse()).await {
        tracing::error!("Command failed: {e}");
        std::process::exit(1);
    }
}

async fn run(cli: Cli) -> Result<(), Box<dyn std::error::Error>> {
    match cli.command {
        Commands::Migrate => commands::migrate::run().await?,
        Commands::Seed => commands::seed::sample_products().await?,
        Commands::Admin { action } => match action {
            AdminAction::Status => commands::admin::status().await?,
        },
    }
    Ok(())
}
