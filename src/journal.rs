//! Ordered-operation journal: the concrete face of the append-only ledger.
//!
//! The host runtime totally orders state-changing requests; this module
//! models that stream as [`JournalEntry`] values applied one at a time
//! through a single dispatch point. Each application yields a [`Receipt`]
//! whose [`Outcome`] is the hook surface external collaborators react to —
//! escrow settles on `BidAccepted`/`JobCompleted`/`JobCancelled`, reputation
//! issues on `JobCompleted`, dispute voting opens on `JobDisputed`.

use std::fmt;
use std::path::Path;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::{AppError, MarketResult};
use crate::market::{AccountId, JobEdit, JobId, JobMarket, JobStatus, MarketStore};

/// One state-changing request, as recorded by the host ledger.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "op", rename_all = "snake_case")]
pub enum Operation {
    CreateJob {
        title: String,
        description: String,
        budget: u64,
        deadline: u64,
        bid_deadline: u64,
    },
    EditJob {
        job_id: JobId,
        #[serde(flatten)]
        edit: JobEdit,
    },
    PlaceBid {
        job_id: JobId,
        amount: u64,
        proposed_time: u64,
    },
    WithdrawBid {
        job_id: JobId,
    },
    AcceptBid {
        job_id: JobId,
        bidder: AccountId,
    },
    StartProgress {
        job_id: JobId,
    },
    MarkCompleted {
        job_id: JobId,
    },
    CancelJob {
        job_id: JobId,
    },
    MarkDisputed {
        job_id: JobId,
    },
    SetPaused {
        value: bool,
    },
}

/// An operation stamped with the verified caller and the logical clock value
/// the host assigned when ordering it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct JournalEntry {
    pub clock: u64,
    pub caller: AccountId,
    #[serde(flatten)]
    pub op: Operation,
}

/// What an applied operation did to the store. Collaborators key off these.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum Outcome {
    JobCreated { job_id: JobId },
    JobEdited { job_id: JobId },
    BidPlaced { job_id: JobId, bid_count: u32, status: JobStatus },
    BidWithdrawn { job_id: JobId, bid_count: u32, status: JobStatus },
    BidAccepted { job_id: JobId, worker: AccountId },
    ProgressStarted { job_id: JobId },
    JobCompleted { job_id: JobId, worker: Option<AccountId> },
    JobCancelled { job_id: JobId },
    JobDisputed { job_id: JobId, worker: Option<AccountId> },
    PauseSet { paused: bool },
}

impl fmt::Display for Outcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Outcome::JobCreated { job_id } => write!(f, "job {job_id} created"),
            Outcome::JobEdited { job_id } => write!(f, "job {job_id} edited"),
            Outcome::BidPlaced {
                job_id, bid_count, ..
            } => write!(f, "bid placed on job {job_id} ({bid_count} live)"),
            Outcome::BidWithdrawn {
                job_id, bid_count, ..
            } => write!(f, "bid withdrawn from job {job_id} ({bid_count} live)"),
            Outcome::BidAccepted { job_id, worker } => {
                write!(f, "job {job_id} assigned to {worker}")
            }
            Outcome::ProgressStarted { job_id } => write!(f, "job {job_id} in progress"),
            Outcome::JobCompleted { job_id, .. } => write!(f, "job {job_id} completed"),
            Outcome::JobCancelled { job_id } => write!(f, "job {job_id} cancelled"),
            Outcome::JobDisputed { job_id, .. } => write!(f, "job {job_id} disputed"),
            Outcome::PauseSet { paused } => {
                write!(f, "market {}", if *paused { "paused" } else { "resumed" })
            }
        }
    }
}

/// Result of applying one journal entry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "result", rename_all = "snake_case")]
pub enum ReceiptResult {
    Applied {
        #[serde(flatten)]
        outcome: Outcome,
    },
    Rejected {
        code: u16,
        message: String,
    },
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Receipt {
    pub index: usize,
    pub clock: u64,
    #[serde(flatten)]
    pub result: ReceiptResult,
}

impl Receipt {
    pub fn is_applied(&self) -> bool {
        matches!(self.result, ReceiptResult::Applied { .. })
    }
}

/// Summary of one full journal replay.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReplayReport {
    pub applied: usize,
    pub rejected: usize,
    pub receipts: Vec<Receipt>,
    pub started_at: DateTime<Utc>,
    pub finished_at: DateTime<Utc>,
    pub duration_ms: i64,
}

/// Dispatch a single entry into the lifecycle state machine.
pub fn apply_entry(market: &mut JobMarket, entry: &JournalEntry) -> MarketResult<Outcome> {
    let caller = entry.caller;
    let clock = entry.clock;
    match entry.op.clone() {
        Operation::CreateJob {
            title,
            description,
            budget,
            deadline,
            bid_deadline,
        } => {
            let job_id =
                market.create_job(caller, clock, title, description, budget, deadline, bid_deadline)?;
            Ok(Outcome::JobCreated { job_id })
        }
        Operation::EditJob { job_id, edit } => {
            market.edit_job(caller, clock, job_id, edit)?;
            Ok(Outcome::JobEdited { job_id })
        }
        Operation::PlaceBid {
            job_id,
            amount,
            proposed_time,
        } => {
            let bid_count = market.place_bid(caller, clock, job_id, amount, proposed_time)?;
            let status = market.status(job_id)?;
            Ok(Outcome::BidPlaced {
                job_id,
                bid_count,
                status,
            })
        }
        Operation::WithdrawBid { job_id } => {
            let bid_count = market.withdraw_bid(caller, job_id)?;
            let status = market.status(job_id)?;
            Ok(Outcome::BidWithdrawn {
                job_id,
                bid_count,
                status,
            })
        }
        Operation::AcceptBid { job_id, bidder } => {
            market.accept_bid(caller, job_id, bidder)?;
            Ok(Outcome::BidAccepted {
                job_id,
                worker: bidder,
            })
        }
        Operation::StartProgress { job_id } => {
            market.start_progress(caller, job_id)?;
            Ok(Outcome::ProgressStarted { job_id })
        }
        Operation::MarkCompleted { job_id } => {
            market.mark_completed(caller, clock, job_id)?;
            let worker = market.assigned_worker(job_id)?;
            Ok(Outcome::JobCompleted { job_id, worker })
        }
        Operation::CancelJob { job_id } => {
            market.cancel_job(caller, job_id)?;
            Ok(Outcome::JobCancelled { job_id })
        }
        Operation::MarkDisputed { job_id } => {
            market.mark_disputed(caller, job_id)?;
            let worker = market.assigned_worker(job_id)?;
            Ok(Outcome::JobDisputed { job_id, worker })
        }
        Operation::SetPaused { value } => {
            let paused = market.set_paused(caller, value)?;
            Ok(Outcome::PauseSet { paused })
        }
    }
}

/// Replay a journal in order, invoking `on_receipt` after each entry.
///
/// The host guarantees a non-decreasing clock; a journal that violates it is
/// rejected wholesale before anything is applied. Individual operation
/// rejections are normal — they become `Rejected` receipts and the replay
/// continues.
pub fn replay_with<F>(
    market: &mut JobMarket,
    entries: &[JournalEntry],
    mut on_receipt: F,
) -> Result<ReplayReport, AppError>
where
    F: FnMut(&Receipt),
{
    validate_clock_order(entries)?;

    let started_at = Utc::now();
    let mut receipts = Vec::with_capacity(entries.len());
    let mut applied = 0;
    let mut rejected = 0;

    for (index, entry) in entries.iter().enumerate() {
        let result = match apply_entry(market, entry) {
            Ok(outcome) => {
                applied += 1;
                ReceiptResult::Applied { outcome }
            }
            Err(err) => {
                rejected += 1;
                ReceiptResult::Rejected {
                    code: err.code(),
                    message: err.to_string(),
                }
            }
        };
        let receipt = Receipt {
            index,
            clock: entry.clock,
            result,
        };
        on_receipt(&receipt);
        receipts.push(receipt);
    }

    let finished_at = Utc::now();
    Ok(ReplayReport {
        applied,
        rejected,
        receipts,
        started_at,
        finished_at,
        duration_ms: (finished_at - started_at).num_milliseconds(),
    })
}

pub fn replay(
    market: &mut JobMarket,
    entries: &[JournalEntry],
) -> Result<ReplayReport, AppError> {
    replay_with(market, entries, |_| {})
}

/// Reject journals whose clock runs backwards.
pub fn validate_clock_order(entries: &[JournalEntry]) -> Result<(), AppError> {
    let mut last = 0u64;
    for (index, entry) in entries.iter().enumerate() {
        if entry.clock < last {
            return Err(AppError::Journal(format!(
                "clock regressed at entry {index}: {} < {last}",
                entry.clock
            )));
        }
        last = entry.clock;
    }
    Ok(())
}

pub fn load_journal(path: &Path) -> Result<Vec<JournalEntry>, AppError> {
    let contents = std::fs::read_to_string(path)?;
    Ok(serde_json::from_str(&contents)?)
}

pub fn save_snapshot(store: &MarketStore, path: &Path) -> Result<(), AppError> {
    let json = serde_json::to_string_pretty(store)?;
    std::fs::write(path, json)?;
    Ok(())
}

pub fn load_snapshot(path: &Path) -> Result<MarketStore, AppError> {
    let contents = std::fs::read_to_string(path)?;
    Ok(serde_json::from_str(&contents)?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn entry(clock: u64, caller: AccountId, op: Operation) -> JournalEntry {
        JournalEntry { clock, caller, op }
    }

    fn create_op() -> Operation {
        Operation::CreateJob {
            title: "Build the landing page".into(),
            description: "Two sections".into(),
            budget: 1000,
            deadline: 200,
            bid_deadline: 150,
        }
    }

    #[test]
    fn replay_walks_a_full_lifecycle() {
        let admin = AccountId::new();
        let client = AccountId::new();
        let worker = AccountId::new();
        let mut market = JobMarket::new(admin, 1);

        let entries = vec![
            entry(100, client, create_op()),
            entry(
                100,
                worker,
                Operation::PlaceBid {
                    job_id: 1,
                    amount: 800,
                    proposed_time: 30,
                },
            ),
            entry(
                110,
                client,
                Operation::AcceptBid {
                    job_id: 1,
                    bidder: worker,
                },
            ),
            entry(120, worker, Operation::StartProgress { job_id: 1 }),
            entry(180, worker, Operation::MarkCompleted { job_id: 1 }),
        ];

        let report = replay(&mut market, &entries).unwrap();
        assert_eq!(report.applied, 5);
        assert_eq!(report.rejected, 0);
        assert_eq!(market.status(1).unwrap(), JobStatus::Completed);
        assert_eq!(market.assigned_worker(1).unwrap(), Some(worker));

        assert_eq!(
            report.receipts[0].result,
            ReceiptResult::Applied {
                outcome: Outcome::JobCreated { job_id: 1 }
            }
        );
        assert_eq!(
            report.receipts[4].result,
            ReceiptResult::Applied {
                outcome: Outcome::JobCompleted {
                    job_id: 1,
                    worker: Some(worker)
                }
            }
        );
    }

    #[test]
    fn rejection_becomes_receipt_and_replay_continues() {
        let admin = AccountId::new();
        let client = AccountId::new();
        let mut market = JobMarket::new(admin, 1);

        let entries = vec![
            entry(100, client, create_op()),
            entry(
                100,
                AccountId::new(),
                Operation::PlaceBid {
                    job_id: 1,
                    amount: 800,
                    proposed_time: 30,
                },
            ),
            // second bid while the first is live: rejected with 109
            entry(
                101,
                AccountId::new(),
                Operation::PlaceBid {
                    job_id: 1,
                    amount: 900,
                    proposed_time: 10,
                },
            ),
            entry(102, client, Operation::CancelJob { job_id: 1 }),
        ];

        let report = replay(&mut market, &entries).unwrap();
        assert_eq!(report.applied, 3);
        assert_eq!(report.rejected, 1);
        match &report.receipts[2].result {
            ReceiptResult::Rejected { code, message } => {
                assert_eq!(*code, 109);
                assert!(message.contains("not open"));
            }
            other => panic!("expected rejection, got {other:?}"),
        }
        assert_eq!(market.status(1).unwrap(), JobStatus::Cancelled);
    }

    #[test]
    fn clock_regression_rejects_whole_journal() {
        let admin = AccountId::new();
        let client = AccountId::new();
        let mut market = JobMarket::new(admin, 1);

        let entries = vec![
            entry(100, client, create_op()),
            entry(90, client, Operation::CancelJob { job_id: 1 }),
        ];

        let err = replay(&mut market, &entries).unwrap_err();
        assert!(matches!(err, AppError::Journal(_)));
        // nothing was applied
        assert_eq!(market.total_jobs(), 0);
    }

    #[test]
    fn equal_clocks_are_allowed() {
        let entries = vec![
            entry(100, AccountId::new(), create_op()),
            entry(100, AccountId::new(), create_op()),
        ];
        assert!(validate_clock_order(&entries).is_ok());
    }

    #[test]
    fn journal_entry_json_shape() {
        let caller = AccountId::new();
        let e = entry(
            100,
            caller,
            Operation::PlaceBid {
                job_id: 1,
                amount: 800,
                proposed_time: 30,
            },
        );
        let json = serde_json::to_string(&e).unwrap();
        assert!(json.contains("\"op\":\"place_bid\""));
        assert!(json.contains("\"clock\":100"));

        let back: JournalEntry = serde_json::from_str(&json).unwrap();
        assert_eq!(back, e);
    }

    #[test]
    fn journal_parses_from_plain_json() {
        let caller = AccountId::new();
        let json = format!(
            r#"[
                {{"clock": 100, "caller": "{caller}", "op": "create_job",
                  "title": "t", "description": "d",
                  "budget": 1000, "deadline": 200, "bid_deadline": 150}},
                {{"clock": 110, "caller": "{caller}", "op": "set_paused", "value": true}}
            ]"#
        );
        let entries: Vec<JournalEntry> = serde_json::from_str(&json).unwrap();
        assert_eq!(entries.len(), 2);
        assert_eq!(
            entries[1].op,
            Operation::SetPaused { value: true }
        );
    }

    #[test]
    fn edit_job_entry_flattens_fields() {
        let caller = AccountId::new();
        let json = format!(
            r#"{{"clock": 100, "caller": "{caller}", "op": "edit_job",
                "job_id": 1, "budget": 2000}}"#
        );
        let e: JournalEntry = serde_json::from_str(&json).unwrap();
        match e.op {
            Operation::EditJob { job_id, edit } => {
                assert_eq!(job_id, 1);
                assert_eq!(edit.budget, Some(2000));
                assert_eq!(edit.title, None);
            }
            other => panic!("expected edit_job, got {other:?}"),
        }
    }

    #[test]
    fn receipt_json_shape() {
        let receipt = Receipt {
            index: 0,
            clock: 100,
            result: ReceiptResult::Applied {
                outcome: Outcome::JobCreated { job_id: 1 },
            },
        };
        let json = serde_json::to_string(&receipt).unwrap();
        assert!(json.contains("\"result\":\"applied\""));
        assert!(json.contains("\"event\":\"job_created\""));

        let rejected = Receipt {
            index: 1,
            clock: 100,
            result: ReceiptResult::Rejected {
                code: 109,
                message: "job is not open for bidding".into(),
            },
        };
        let json = serde_json::to_string(&rejected).unwrap();
        assert!(json.contains("\"result\":\"rejected\""));
        assert!(json.contains("\"code\":109"));
    }

    #[test]
    fn journal_file_roundtrip() {
        let caller = AccountId::new();
        let entries = vec![entry(100, caller, create_op())];
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, "{}", serde_json::to_string(&entries).unwrap()).unwrap();

        let loaded = load_journal(file.path()).unwrap();
        assert_eq!(loaded, entries);
    }

    #[test]
    fn snapshot_file_roundtrip() {
        let admin = AccountId::new();
        let client = AccountId::new();
        let mut market = JobMarket::new(admin, 1);
        let entries = vec![entry(100, client, create_op())];
        replay(&mut market, &entries).unwrap();

        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("snapshot.json");
        save_snapshot(market.store(), &path).unwrap();

        let store = load_snapshot(&path).unwrap();
        assert_eq!(store.total_jobs(), 1);
        assert_eq!(store.job(1).unwrap().title, "Build the landing page");

        // a reloaded store keeps allocating past the snapshotted counter
        let mut resumed = JobMarket::from_store(store, 1);
        let id = resumed
            .create_job(client, 120, "t".into(), "d".into(), 1000, 300, 250)
            .unwrap();
        assert_eq!(id, 2);
    }

    #[test]
    fn outcome_display() {
        assert_eq!(
            Outcome::JobCreated { job_id: 3 }.to_string(),
            "job 3 created"
        );
        assert_eq!(
            Outcome::PauseSet { paused: true }.to_string(),
            "market paused"
        );
    }
}
