use std::fmt;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Sequential job identifier, assigned from 1. Zero is structurally invalid.
pub type JobId = u64;

/// Maximum length of a job title, in characters.
pub const MAX_TITLE_LEN: usize = 100;

/// Maximum length of a job description, in characters.
pub const MAX_DESCRIPTION_LEN: usize = 500;

/// Verified caller identity, supplied by the host ledger with every request.
///
/// The nil UUID is the "zero identity" and is never a valid participant.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
pub struct AccountId(pub Uuid);

impl AccountId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    pub fn nil() -> Self {
        Self(Uuid::nil())
    }

    pub fn is_nil(&self) -> bool {
        self.0.is_nil()
    }
}

impl Default for AccountId {
    fn default() -> Self {
        Self::nil()
    }
}

impl fmt::Display for AccountId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// The seven statuses of the job lifecycle.
///
/// `Completed`, `Cancelled` and `Disputed` are terminal: no operation
/// transitions out of them. `Open` and `Bidding` are interchanged purely by
/// bid activity (see [`derive_bid_phase`]), never by a caller-driven
/// transition.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum JobStatus {
    Open,
    Bidding,
    Assigned,
    InProgress,
    Completed,
    Cancelled,
    Disputed,
}

impl JobStatus {
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            JobStatus::Completed | JobStatus::Cancelled | JobStatus::Disputed
        )
    }
}

impl fmt::Display for JobStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            JobStatus::Open => write!(f, "open"),
            JobStatus::Bidding => write!(f, "bidding"),
            JobStatus::Assigned => write!(f, "assigned"),
            JobStatus::InProgress => write!(f, "in-progress"),
            JobStatus::Completed => write!(f, "completed"),
            JobStatus::Cancelled => write!(f, "cancelled"),
            JobStatus::Disputed => write!(f, "disputed"),
        }
    }
}

/// Re-derive the bidding phase after a bid-store mutation.
///
/// The only source of the `Open ⇄ Bidding` moves: the first live bid flips an
/// open job to bidding, and a withdrawal that empties the bid store flips it
/// back. Any other status passes through unchanged.
pub fn derive_bid_phase(current: JobStatus, bid_count: u32) -> JobStatus {
    match current {
        JobStatus::Open if bid_count > 0 => JobStatus::Bidding,
        JobStatus::Bidding if bid_count == 0 => JobStatus::Open,
        other => other,
    }
}

/// One listed unit of work.
///
/// `assigned_to` is set exactly once, on bid acceptance, and retained for
/// audit through completion, dispute and beyond. Jobs are never deleted;
/// terminal statuses are kept in the store.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Job {
    pub id: JobId,
    pub client: AccountId,
    pub title: String,
    pub description: String,
    pub budget: u64,
    pub deadline: u64,
    pub bid_deadline: u64,
    pub status: JobStatus,
    pub assigned_to: Option<AccountId>,
    pub created_at: u64,
}

/// A freelancer's offer against one job. At most one live bid per
/// (job, bidder) pair.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Bid {
    pub job_id: JobId,
    pub bidder: AccountId,
    pub amount: u64,
    pub proposed_time: u64,
    pub bid_at: u64,
}

/// Fields of a job the client may change while it is still open.
/// `None` leaves the stored value untouched.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct JobEdit {
    pub title: Option<String>,
    pub description: Option<String>,
    pub budget: Option<u64>,
    pub deadline: Option<u64>,
    pub bid_deadline: Option<u64>,
}
