//! Keycraft CLI - Database migrations and snapshot tools.
//!
//! # Usage
//!
//! ```bash
//! # Run storefront database migrations
//! kc-cli migrate
//!
//! # Print the stored cart snapshot
//! kc-cli snapshot show cart
//!
//! # Delete the stored wishlist snapshot from another data directory
//! kc-cli --data-dir /var/lib/keycraft snapshot clear wishlist
//! ```
//!
//! # Commands
//!
//! - `migrate` - Run database migrations
//! - `snapshot show` - Print a stored snapshot
//! - `snapshot clear` - Delete a stored snapshot

#![cfg_attr(not(test), forbid(unsafe_code))]

use std::path::PathBuf;

use clap::{Parser, Subcommand};
use keycraft_storefront::config::{ConfigError, StorefrontConfig};

mod commands;

use commands::snapshot::SnapshotKey;

#[derive(Parser)]
#[command(name = "kc-cli")]
#[command(author, version, about = "Keycraft CLI tools")]
struct Cli {
    /// Snapshot directory (overrides `KEYCRAFT_DATA_DIR`)
    #[arg(long, global = true)]
    data_dir: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run storefront database migrations
    Migrate,
    /// Inspect stored snapshots
    Snapshot {
        #[command(subcommand)]
        action: SnapshotAction,
    },
}

#[derive(Subcommand)]
enum SnapshotAction {
    /// Print a stored snapshot
    Show {
        #[arg(value_enum)]
        key: SnapshotKey,
    },
    /// Delete a stored snapshot
    Clear {
        #[arg(value_enum)]
        key: SnapshotKey,
    },
}

#[tokio::main]
async fn main() {
    // Initialize tracing
    tracing_subscriber::fmt::init();

    let cli = Cli::parse();

    let result: Result<(), Box<dyn std::error::Error>> = run(cli).await;

    if let Err(e) = result {
        tracing::error!("Command failed: {e}");
        std::process::exit(1);
    }
}

/// Snapshot directory from the flag, or the storefront's configured one.
fn data_dir(
    flag: Option<PathBuf>,
    lookup: impl Fn(&str) -> Option<String>,
) -> Result<PathBuf, ConfigError> {
    match flag {
        Some(dir) => Ok(dir),
        None => Ok(StorefrontConfig::from_lookup(lookup)?.data_dir),
    }
}

async fn run(cli: Cli) -> Result<(), Box<dyn std::error::Error>> {
    match cli.command {
        Commands::Migrate => commands::migrate::storefront().await?,
        Commands::Snapshot { action } => {
            let _ = dotenvy::dotenv();
            let dir = data_dir(cli.data_dir, |key| std::env::var(key).ok())?;
            match action {
                SnapshotAction::Show { key } => {
                    let snapshot = commands::snapshot::show(&dir, key).await?;
                    #[allow(clippy::print_stdout)]
                    {
                        match snapshot {
                            Some(snapshot) => println!("{snapshot}"),
                            None => println!("No {} snapshot in {}", key.storage_key(), dir.display()),
                        }
                    }
                }
                SnapshotAction::Clear { key } => commands::snapshot::clear(&dir, key).await?,
            }
        }
    }
    Ok(())
}
