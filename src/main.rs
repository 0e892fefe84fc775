use std::path::Path;

use anyhow::Result;
use clap::Parser;

use gigledger::cli::{Cli, Command};
use gigledger::config::MarketConfig;
use gigledger::journal::{self, JournalEntry, Operation};
use gigledger::market::{AccountId, JobMarket};
use gigledger::ui;

fn main() -> Result<()> {
    let cli = Cli::parse();

    let config = match &cli.config {
        Some(path) => MarketConfig::load_from(Path::new(path))?,
        None => MarketConfig::load()?,
    };
    let min_bid = cli.min_bid.unwrap_or(config.min_bid_amount);

    match cli.command {
        Command::Apply {
            journal,
            resume,
            snapshot,
            receipts,
        } => run_apply(
            &config,
            min_bid,
            &journal,
            resume,
            snapshot,
            receipts,
            cli.verbose,
        ),
        Command::Status { snapshot } => run_status(&snapshot),
        Command::Demo => run_demo(min_bid),
    }
}

fn run_apply(
    config: &MarketConfig,
    min_bid: u64,
    journal_path: &str,
    resume: Option<String>,
    snapshot: Option<String>,
    receipts: Option<String>,
    verbose: bool,
) -> Result<()> {
    let entries = journal::load_journal(Path::new(journal_path))?;
    let mut market = match resume {
        Some(path) => {
            let store = journal::load_snapshot(Path::new(&path))?;
            JobMarket::from_store(store, min_bid)
        }
        None => JobMarket::new(config.admin_id()?, min_bid),
    };

    let progress = ui::ReplayProgress::start(entries.len() as u64);
    let report = journal::replay_with(&mut market, &entries, |r| progress.entry(r, verbose))?;
    progress.finish(&report);
    ui::print_market_summary(market.store());
    if verbose {
        ui::print_report_json(&report);
    }

    if let Some(path) = snapshot {
        journal::save_snapshot(market.store(), Path::new(&path))?;
        println!("  snapshot written to {path}");
    }
    if let Some(path) = receipts {
        std::fs::write(&path, serde_json::to_string_pretty(&report)?)?;
        println!("  receipts written to {path}");
    }
    Ok(())
}

fn run_status(snapshot_path: &str) -> Result<()> {
    let store = journal::load_snapshot(Path::new(snapshot_path))?;
    ui::print_market_summary(&store);
    Ok(())
}

/// Scripted end-to-end walk: one job through its whole lifecycle, with a
/// shut-out rival bidder and a pause round-trip along the way.
fn run_demo(min_bid: u64) -> Result<()> {
    let admin = AccountId::new();
    let client = AccountId::new();
    let worker = AccountId::new();
    let rival = AccountId::new();

    let entries = vec![
        JournalEntry {
            clock: 100,
            caller: client,
            op: Operation::CreateJob {
                title: "Build the landing page".into(),
                description: "Two sections, responsive, dark mode".into(),
                budget: 1000,
                deadline: 200,
                bid_deadline: 150,
            },
        },
        JournalEntry {
            clock: 100,
            caller: worker,
            op: Operation::PlaceBid {
                job_id: 1,
                amount: 800,
                proposed_time: 30,
            },
        },
        // single-live-bid rule: this one bounces with code 109
        JournalEntry {
            clock: 101,
            caller: rival,
            op: Operation::PlaceBid {
                job_id: 1,
                amount: 900,
                proposed_time: 10,
            },
        },
        JournalEntry {
            clock: 110,
            caller: client,
            op: Operation::AcceptBid {
                job_id: 1,
                bidder: worker,
            },
        },
        JournalEntry {
            clock: 120,
            caller: worker,
            op: Operation::StartProgress { job_id: 1 },
        },
        JournalEntry {
            clock: 180,
            caller: worker,
            op: Operation::MarkCompleted { job_id: 1 },
        },
        JournalEntry {
            clock: 190,
            caller: admin,
            op: Operation::SetPaused { value: true },
        },
        // rejected with 104 while the market is paused
        JournalEntry {
            clock: 190,
            caller: client,
            op: Operation::CreateJob {
                title: "Write the docs".into(),
                description: "User guide".into(),
                budget: 500,
                deadline: 400,
                bid_deadline: 300,
            },
        },
        JournalEntry {
            clock: 195,
            caller: admin,
            op: Operation::SetPaused { value: false },
        },
    ];

    let mut market = JobMarket::new(admin, min_bid);
    let progress = ui::ReplayProgress::start(entries.len() as u64);
    let report = journal::replay_with(&mut market, &entries, |r| progress.entry(r, true))?;
    progress.finish(&report);
    ui::print_market_summary(market.store());
    Ok(())
}
