//! Command-line interface, clap-based.
//!
//! Defines the [`Cli`] struct with subcommands [`Command`] (apply, status,
//! demo) and global flags (--config, --min-bid, --verbose).

use clap::{Parser, Subcommand};

/// gigledger — ledger-ordered job marketplace state machine.
#[derive(Debug, Parser)]
#[command(name = "gigledger", version, about)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,

    /// Path to the configuration file (defaults to ./gigledger.toml).
    #[arg(long, global = true)]
    pub config: Option<String>,

    /// Override the configured minimum bid amount.
    #[arg(long, global = true)]
    pub min_bid: Option<u64>,

    /// Print applied entries as well as rejections.
    #[arg(long, short, global = true, default_value_t = false)]
    pub verbose: bool,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Apply a journal of ordered operations to a fresh market.
    Apply {
        /// Path to the journal JSON file.
        journal: String,

        /// Start from an existing snapshot instead of an empty market.
        #[arg(long)]
        resume: Option<String>,

        /// Write the post-replay store snapshot to this path.
        #[arg(long)]
        snapshot: Option<String>,

        /// Write the receipts report to this path.
        #[arg(long)]
        receipts: Option<String>,
    },

    /// Summarize a snapshotted market store.
    Status {
        /// Path to a snapshot JSON file.
        snapshot: String,
    },

    /// Run the built-in end-to-end marketplace walk.
    Demo,
}
