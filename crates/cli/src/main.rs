//! Recetario CLI - database migrations and management tools.
//!
//! # Usage
//!
//! ```bash
//! # Run database migrations
//! recetario migrate
//!
//! # Seed the database with demo data
//! recetario seed
//! recetario seed --email chef@example.com --password "longer than eight"
//! ```

#![cfg_attr(not(test), forbid(unsafe_code))]

use clap::{Parser, Subcommand};

mod commands;

#[derive(Parser)]
#[command(name = "recetario")]
#[command(author, version, about = "Recetario CLI tools")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run database migrations
    Migrate,
    /// Seed the database with a demo account and recipes
    Seed {
        /// Email for the demo account
        #[arg(long, default_value = "demo@recetario.example")]
        email: String,

        /// Password for the demo account
        #[arg(long, default_value = "demo-password")]
        password: String,
    },
}

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt::init();

    let cli = Cli::parse();

    let result: Result<(), Box<dyn std::error::Error>> = run(cli).await;

    if let Err(e) = result {
        tracing::error!("Command failed: {e}");
        std::process::exit(1);
    }
}

async fn run(cli: Cli) -> Result<(), Box<dyn std::error::Error>> {
    match cli.command {
        Commands::Migrate => commands::migrate::run().await?,
        Commands::Seed { email, password } => {
            commands::seed::run(&email, &password).await?;
        }
    }
    Ok(())
}
