//! Terminal output — replay progress and colored result lines.
//!
//! Uses `indicatif` for the journal progress bar and `console` for styling.
//! [`ReplayProgress`] tracks a journal replay visually: applied entries in
//! green, rejections in red with their numeric code.

use console::Style;
use indicatif::{ProgressBar, ProgressStyle};

use crate::journal::{Receipt, ReceiptResult, ReplayReport};
use crate::market::MarketStore;

/// Visual progress for a journal replay in the terminal.
pub struct ReplayProgress {
    pb: ProgressBar,
    green: Style,
    red: Style,
    dim: Style,
}

impl ReplayProgress {
    pub fn start(total: u64) -> Self {
        let pb = ProgressBar::new(total);
        pb.set_style(
            ProgressStyle::default_bar()
                .template("{bar:40.cyan/blue} {pos}/{len} {msg}")
                .expect("invalid template"),
        );

        Self {
            pb,
            green: Style::new().green().bold(),
            red: Style::new().red().bold(),
            dim: Style::new().dim(),
        }
    }

    /// Record one receipt. Rejections are always printed; applied entries
    /// only in verbose mode.
    pub fn entry(&self, receipt: &Receipt, verbose: bool) {
        match &receipt.result {
            ReceiptResult::Applied { outcome } => {
                if verbose {
                    self.pb.println(format!(
                        "  {} [{}] {outcome}",
                        self.green.apply_to("✓"),
                        self.dim.apply_to(receipt.index)
                    ));
                }
            }
            ReceiptResult::Rejected { code, message } => {
                self.pb.println(format!(
                    "  {} [{}] rejected ({code}): {message}",
                    self.red.apply_to("✗"),
                    self.dim.apply_to(receipt.index)
                ));
            }
        }
        self.pb.inc(1);
    }

    /// Finish the bar and print the applied/rejected totals.
    pub fn finish(&self, report: &ReplayReport) {
        self.pb.finish_and_clear();
        println!(
            "  {} {} applied, {} rejected ({}ms)",
            self.green.apply_to("✓"),
            report.applied,
            report.rejected,
            report.duration_ms
        );
    }
}

/// Print a one-line-per-job summary of the market store.
pub fn print_market_summary(store: &MarketStore) {
    let bold = Style::new().bold();
    println!();
    println!("{}", bold.apply_to("─── Market ───"));
    println!(
        "  jobs: {}   paused: {}   admin: {}",
        store.total_jobs(),
        store.is_paused(),
        store.admin()
    );
    let active = Style::new().cyan();
    let settled = Style::new().dim();
    for job in store.jobs() {
        let status_style = if job.status.is_terminal() {
            &settled
        } else {
            &active
        };
        let worker = match job.assigned_to {
            Some(w) => w.to_string(),
            None => "-".to_string(),
        };
        println!(
            "  #{} [{}] \"{}\" budget {} bids {} worker {}",
            job.id,
            status_style.apply_to(job.status),
            job.title,
            job.budget,
            store.bid_count(job.id),
            worker
        );
    }
}

/// Pretty-print the full replay report as JSON.
pub fn print_report_json(report: &ReplayReport) {
    let bold = Style::new().bold();
    println!();
    println!("{}", bold.apply_to("─── Replay Report ───"));
    println!(
        "{}",
        serde_json::to_string_pretty(report).unwrap_or_default()
    );
}
