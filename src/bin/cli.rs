//! CaskDB CLI
//!
//! Command-line access to a CaskDB log file.

use clap::{Parser, Subcommand};
use caskdb::{Config, DiskStore, RecoveryMode, SyncStrategy};
use tracing_subscriber::{fmt, EnvFilter};

/// CaskDB CLI
#[derive(Parser, Debug)]
#[command(name = "caskdb-cli")]
#[command(about = "CLI for the CaskDB key-value store")]
#[command(version)]
struct Args {
    /// Log file
    #[arg(short, long, default_value = caskdb::config::DEFAULT_FILE_NAME)]
    file: String,

    /// fsync every write instead of only flushing
    #[arg(long)]
    sync: bool,

    /// Drop an incomplete trailing record instead of refusing to open
    #[arg(long)]
    repair: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Get a value by key
    Get {
        /// The key to get
        key: String,
    },

    /// Set a key-value pair
    Set {
        /// The key to set
        key: String,

        /// The value to set
        value: String,
    },

    /// List all keys
    Keys,

    /// Show startup scan statistics
    Stats,
}

fn main() {
    // Initialize tracing/logging
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("info,caskdb=debug"));

    fmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_writer(std::io::stderr)
        .init();

    let args = Args::parse();

    let config = Config::builder()
        .path(&args.file)
        .sync_strategy(if args.sync {
            SyncStrategy::EveryWrite
        } else {
            SyncStrategy::Flush
        })
        .recovery_mode(if args.repair {
            RecoveryMode::DiscardPartialTail
        } else {
            RecoveryMode::Strict
        })
        .build();

    let mut store = match DiskStore::open_with_config(config) {
        Ok(s) => s,
        Err(e) => {
            tracing::error!("Failed to open store: {}", e);
            std::process::exit(1);
        }
    };

    if let Err(e) = run(&mut store, args.command) {
        tracing::error!("Command failed: {}", e);
        std::process::exit(1);
    }

    if let Err(e) = store.close() {
        tracing::error!("Failed to close store: {}", e);
        std::process::exit(1);
    }
}

fn run(store: &mut DiskStore, command: Commands) -> caskdb::Result<()> {
    match command {
        Commands::Get { key } => match store.find(&key)? {
            Some(value) => println!("{}", value),
            None => println!("(nil)"),
        },
        Commands::Set { key, value } => {
            store.set(&key, &value)?;
            println!("OK");
        }
        Commands::Keys => {
            let mut keys: Vec<&str> = store.keys().collect();
            keys.sort_unstable();
            for key in keys {
                println!("{}", key);
            }
        }
        Commands::Stats => {
            let scan = store.scan_result();
            println!("path:            {}", store.path().display());
            println!("file size:       {}", store.file_size());
            println!("keys:            {}", store.len());
            println!("records scanned: {}", scan.records_scanned);
            println!("discarded bytes: {}", scan.discarded_bytes);
        }
    }
    Ok(())
}
