//! contact-ledger: terminal driver for the contact-credit ledger
//!
//! Loads the ledger for a user from the configured store and backend, runs a
//! single operation, and waits for background sync before exiting.

mod commands;

use std::path::PathBuf;

use clap::Parser;
use tracing::info;

use commands::LedgerCommands;
use contact_ledger::{CreditEngine, LedgerConfig};

#[derive(Parser)]
#[command(name = "contact-ledger")]
#[command(about = "Track and spend contact credits")]
struct Cli {
    /// Path to configuration file
    #[arg(short, long, default_value = "contact-ledger.toml")]
    config: String,

    /// Signed-in user; omit for a local-only session
    #[arg(short, long, env = "CONTACT_LEDGER_USER_ID")]
    user_id: Option<String>,

    /// Store file (overrides config file)
    #[arg(long, env = "CONTACT_LEDGER_STORE")]
    store: Option<String>,

    #[command(subcommand)]
    command: LedgerCommands,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("contact_ledger=info".parse()?),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    info!("Config file: {}", cli.config);

    let mut config = LedgerConfig::load_or_default(&cli.config)?;

    // Apply CLI overrides
    if let Some(store) = cli.store {
        config.store.path = PathBuf::from(store);
    }
    info!("Store: {}", config.store.path.display());

    let engine = CreditEngine::from_config(&config)?;
    engine.load(cli.user_id.as_deref()).await;

    let result = commands::execute_command(&engine, cli.command).await;
    engine.settle().await;

    match result {
        Ok(output) => {
            println!("{}", output);
            Ok(())
        }
        Err(e) => {
            eprintln!("Error: {}", e);
            std::process::exit(1);
        }
    }
}
