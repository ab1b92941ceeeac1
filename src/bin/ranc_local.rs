//! Maintenance CLI for the local data layer

use anyhow::{bail, Result};
use clap::{Parser, Subcommand};
use dotenvy::dotenv;
use log::{error, info};
use ranc_local::core::Config;
use ranc_local::{LocalDataLayer, WriteOutcome};
use std::path::Path;

#[derive(Parser)]
#[command(name = "ranc-local")]
#[command(about = "Inspect and repair the offline health-entry store")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Show database location, whether it exists and the tombstone count
    Status,
    /// Manage the tombstone set
    Tombstones {
        #[command(subcommand)]
        action: TombstoneAction,
    },
    /// Delete the local database files; the app recreates them on restart
    ResetDb {
        /// Confirm the destructive reset
        #[arg(long)]
        yes: bool,
    },
}

#[derive(Subcommand)]
enum TombstoneAction {
    List,
    Add {
        id: String,
    },
    Remove {
        #[arg(required = true)]
        ids: Vec<String>,
    },
    Clear,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Load environment variables from .env file
    dotenv().ok();

    let config = Config::from_env()?;

    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(&config.log_level))
        .init();

    let layer = LocalDataLayer::open(&config)?;

    match cli.command {
        Command::Status => {
            let exists = layer.reset().does_db_exist().await;
            let count = layer.tombstones().list_tombstones().await.len();
            let primary = &layer.reset().files().primary;
            print!(
                "{}",
                status_report(&config.database_dir(), primary, exists, count)
            );
        }
        Command::Tombstones { action } => tombstones(&layer, action).await?,
        Command::ResetDb { yes } => {
            if !yes {
                bail!("Refusing to delete the local database without --yes");
            }
            if !layer.reset().reset_corrupted_database().await {
                error!("Database reset failed, see log for details");
                std::process::exit(1);
            }
            println!("Database reset. Restart the app to recreate it.");
        }
    }

    Ok(())
}

fn status_report(dir: &Path, primary: &Path, exists: bool, tombstones: usize) -> String {
    format!(
        "Directory:  {}\nDatabase:   {}\nExists:     {}\nTombstones: {}\n",
        dir.display(),
        primary.display(),
        if exists { "yes" } else { "no" },
        tombstones
    )
}

async fn tombstones(layer: &LocalDataLayer, action: TombstoneAction) -> Result<()> {
    let store = layer.tombstones();
    let outcome = match action {
        TombstoneAction::List => {
            let mut ids: Vec<String> = store.list_tombstones().await.into_iter().collect();
            ids.sort();
            for id in ids {
                println!("{id}");
            }
            return Ok(());
        }
        TombstoneAction::Add { id } => store.add_tombstone(&id).await,
        TombstoneAction::Remove { ids } => store.remove_tombstones(ids.as_slice()).await,
        TombstoneAction::Clear => store.clear_all_tombstones().await,
    };

    info!("Tombstone command finished: {outcome}");
    println!("{outcome}");
    if outcome == WriteOutcome::Degraded {
        std::process::exit(1);
    }
    Ok(())
}
