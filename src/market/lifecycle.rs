use crate::error::{MarketError, MarketResult};

use super::access;
use super::job::{
    derive_bid_phase, AccountId, Bid, Job, JobEdit, JobId, JobStatus, MAX_DESCRIPTION_LEN,
    MAX_TITLE_LEN,
};
use super::store::MarketStore;

/// The job lifecycle state machine.
///
/// Every public operation takes the verified caller identity and, where a
/// deadline gate applies, the logical clock value current at the moment the
/// operation is applied. The host runtime applies operations one at a time
/// in a total order, so no locking happens here.
///
/// Checks run before any mutation; the first failing check decides the
/// returned error, and the store is only touched once every check has
/// passed. There is no partial application.
pub struct JobMarket {
    store: MarketStore,
    min_bid: u64,
}

fn validate_text(title: &str, description: &str) -> MarketResult<()> {
    if title.is_empty() || description.is_empty() {
        return Err(MarketError::EmptyField);
    }
    if title.chars().count() > MAX_TITLE_LEN || description.chars().count() > MAX_DESCRIPTION_LEN {
        return Err(MarketError::TextTooLong);
    }
    Ok(())
}

// Both deadlines must sit strictly in the future, with bidding closing no
// later than delivery: clock < bid_deadline <= deadline.
fn validate_deadlines(clock: u64, bid_deadline: u64, deadline: u64) -> MarketResult<()> {
    if clock < bid_deadline && bid_deadline <= deadline {
        Ok(())
    } else {
        Err(MarketError::DeadlinePassed)
    }
}

impl JobMarket {
    pub fn new(admin: AccountId, min_bid: u64) -> Self {
        Self {
            store: MarketStore::new(admin),
            min_bid,
        }
    }

    /// Rebuild a market from a snapshotted store.
    pub fn from_store(store: MarketStore, min_bid: u64) -> Self {
        Self { store, min_bid }
    }

    pub fn min_bid(&self) -> u64 {
        self.min_bid
    }

    /// Read-only view of the underlying store, for collaborators that react
    /// to status changes (escrow, reputation, dispute voting).
    pub fn store(&self) -> &MarketStore {
        &self.store
    }

    fn ensure_not_paused(&self) -> MarketResult<()> {
        if self.store.is_paused() {
            Err(MarketError::Paused)
        } else {
            Ok(())
        }
    }

    fn lookup(&self, job_id: JobId) -> MarketResult<&Job> {
        if job_id == 0 {
            return Err(MarketError::InvalidJobId);
        }
        self.store.job(job_id).ok_or(MarketError::NotFound)
    }

    // --- mutating operations ---

    /// List a new job. Returns the assigned sequential id; the job starts
    /// at `open` with no bids.
    pub fn create_job(
        &mut self,
        caller: AccountId,
        clock: u64,
        title: String,
        description: String,
        budget: u64,
        deadline: u64,
        bid_deadline: u64,
    ) -> MarketResult<JobId> {
        self.ensure_not_paused()?;
        if caller.is_nil() {
            return Err(MarketError::ZeroIdentity);
        }
        validate_text(&title, &description)?;
        if budget < self.min_bid {
            return Err(MarketError::BudgetTooLow);
        }
        validate_deadlines(clock, bid_deadline, deadline)?;

        let id = self.store.allocate_job_id();
        self.store.insert_job(Job {
            id,
            client: caller,
            title,
            description,
            budget,
            deadline,
            bid_deadline,
            status: JobStatus::Open,
            assigned_to: None,
            created_at: clock,
        });
        Ok(id)
    }

    /// Place a bid on an open job. Returns the job's new live-bid count.
    ///
    /// The status gate demands `open`, and the first accepted bid advances
    /// the job to `bidding`: at most one bid can be outstanding at a time,
    /// and a second bidder is rejected with `JobNotOpen` until the first
    /// withdraws.
    pub fn place_bid(
        &mut self,
        caller: AccountId,
        clock: u64,
        job_id: JobId,
        amount: u64,
        proposed_time: u64,
    ) -> MarketResult<u32> {
        self.ensure_not_paused()?;
        if caller.is_nil() {
            return Err(MarketError::ZeroIdentity);
        }
        let (status, bid_deadline, budget) = {
            let job = self.lookup(job_id)?;
            (job.status, job.bid_deadline, job.budget)
        };
        if status != JobStatus::Open {
            return Err(MarketError::JobNotOpen);
        }
        if clock > bid_deadline {
            return Err(MarketError::DeadlinePassed);
        }
        if amount < self.min_bid || amount > budget {
            return Err(MarketError::InvalidBidAmount);
        }
        if proposed_time == 0 {
            return Err(MarketError::InvalidTime);
        }
        if self.store.bid(job_id, caller).is_some() {
            return Err(MarketError::DuplicateBid);
        }

        let count = self.store.insert_bid(Bid {
            job_id,
            bidder: caller,
            amount,
            proposed_time,
            bid_at: clock,
        });
        let job = self.store.job_mut(job_id).ok_or(MarketError::NotFound)?;
        job.status = derive_bid_phase(job.status, count);
        Ok(count)
    }

    /// Withdraw the caller's live bid. Returns the job's new bid count; when
    /// it reaches 0 the job reverts from `bidding` to `open`.
    pub fn withdraw_bid(&mut self, caller: AccountId, job_id: JobId) -> MarketResult<u32> {
        self.ensure_not_paused()?;
        let status = self.lookup(job_id)?.status;
        if !matches!(status, JobStatus::Open | JobStatus::Bidding) {
            return Err(MarketError::InvalidStatus);
        }
        let (_removed, count) = self
            .store
            .remove_bid(job_id, caller)
            .ok_or(MarketError::NotFound)?;
        let job = self.store.job_mut(job_id).ok_or(MarketError::NotFound)?;
        job.status = derive_bid_phase(job.status, count);
        Ok(count)
    }

    /// Accept a bid, assigning the job to its bidder. The winning bid record
    /// is retained in the store for audit rather than deleted.
    pub fn accept_bid(
        &mut self,
        caller: AccountId,
        job_id: JobId,
        bidder: AccountId,
    ) -> MarketResult<()> {
        self.ensure_not_paused()?;
        let status = self.lookup(job_id)?.status;
        if !access::is_client(&self.store, job_id, caller) {
            return Err(MarketError::NotClient);
        }
        if !matches!(status, JobStatus::Open | JobStatus::Bidding) {
            return Err(MarketError::InvalidStatus);
        }
        if self.store.bid(job_id, bidder).is_none() {
            return Err(MarketError::NotFound);
        }

        let job = self.store.job_mut(job_id).ok_or(MarketError::NotFound)?;
        job.status = JobStatus::Assigned;
        job.assigned_to = Some(bidder);
        Ok(())
    }

    /// Assigned worker starts work on an assigned job.
    pub fn start_progress(&mut self, caller: AccountId, job_id: JobId) -> MarketResult<()> {
        self.ensure_not_paused()?;
        let job = self.lookup(job_id)?;
        if job.status != JobStatus::Assigned {
            return Err(MarketError::InvalidStatus);
        }
        if job.assigned_to != Some(caller) {
            return Err(MarketError::NotAuthorized);
        }

        let job = self.store.job_mut(job_id).ok_or(MarketError::NotFound)?;
        job.status = JobStatus::InProgress;
        Ok(())
    }

    /// Mark an in-progress job completed, if the delivery deadline has not
    /// passed. Client and assigned worker are both allowed to call this.
    pub fn mark_completed(
        &mut self,
        caller: AccountId,
        clock: u64,
        job_id: JobId,
    ) -> MarketResult<()> {
        self.ensure_not_paused()?;
        let (status, client, assigned_to, deadline) = {
            let job = self.lookup(job_id)?;
            (job.status, job.client, job.assigned_to, job.deadline)
        };
        if status != JobStatus::InProgress {
            return Err(MarketError::InvalidStatus);
        }
        if caller != client && assigned_to != Some(caller) {
            return Err(MarketError::NotAuthorized);
        }
        if clock > deadline {
            return Err(MarketError::DeadlinePassed);
        }

        let job = self.store.job_mut(job_id).ok_or(MarketError::NotFound)?;
        job.status = JobStatus::Completed;
        Ok(())
    }

    /// Cancel a job that has not yet been assigned.
    pub fn cancel_job(&mut self, caller: AccountId, job_id: JobId) -> MarketResult<()> {
        self.ensure_not_paused()?;
        let status = self.lookup(job_id)?.status;
        if !access::is_client(&self.store, job_id, caller) {
            return Err(MarketError::NotClient);
        }
        if !matches!(status, JobStatus::Open | JobStatus::Bidding) {
            return Err(MarketError::CancelNotAllowed);
        }

        let job = self.store.job_mut(job_id).ok_or(MarketError::NotFound)?;
        job.status = JobStatus::Cancelled;
        Ok(())
    }

    /// Raise a dispute on an in-progress job. Terminal: resolution happens
    /// in the external dispute-voting collaborator.
    pub fn mark_disputed(&mut self, caller: AccountId, job_id: JobId) -> MarketResult<()> {
        self.ensure_not_paused()?;
        let job = self.lookup(job_id)?;
        if job.status != JobStatus::InProgress {
            return Err(MarketError::InvalidStatus);
        }
        if caller != job.client && job.assigned_to != Some(caller) {
            return Err(MarketError::NotAuthorized);
        }

        let job = self.store.job_mut(job_id).ok_or(MarketError::NotFound)?;
        job.status = JobStatus::Disputed;
        Ok(())
    }

    /// Edit an open job. Only supplied fields change; each is revalidated
    /// with the same rules as creation.
    pub fn edit_job(
        &mut self,
        caller: AccountId,
        clock: u64,
        job_id: JobId,
        edit: JobEdit,
    ) -> MarketResult<()> {
        self.ensure_not_paused()?;
        let (status, cur_deadline, cur_bid_deadline) = {
            let job = self.lookup(job_id)?;
            (job.status, job.deadline, job.bid_deadline)
        };
        if !access::is_client(&self.store, job_id, caller) {
            return Err(MarketError::NotClient);
        }
        if status != JobStatus::Open {
            return Err(MarketError::EditNotAllowed);
        }
        if edit.title.as_deref().is_some_and(str::is_empty)
            || edit.description.as_deref().is_some_and(str::is_empty)
        {
            return Err(MarketError::EmptyField);
        }
        if edit
            .title
            .as_deref()
            .is_some_and(|t| t.chars().count() > MAX_TITLE_LEN)
            || edit
                .description
                .as_deref()
                .is_some_and(|d| d.chars().count() > MAX_DESCRIPTION_LEN)
        {
            return Err(MarketError::TextTooLong);
        }
        if edit.budget.is_some_and(|b| b < self.min_bid) {
            return Err(MarketError::BudgetTooLow);
        }
        if edit.deadline.is_some() || edit.bid_deadline.is_some() {
            let deadline = edit.deadline.unwrap_or(cur_deadline);
            let bid_deadline = edit.bid_deadline.unwrap_or(cur_bid_deadline);
            validate_deadlines(clock, bid_deadline, deadline)?;
        }

        let job = self.store.job_mut(job_id).ok_or(MarketError::NotFound)?;
        if let Some(title) = edit.title {
            job.title = title;
        }
        if let Some(description) = edit.description {
            job.description = description;
        }
        if let Some(budget) = edit.budget {
            job.budget = budget;
        }
        if let Some(deadline) = edit.deadline {
            job.deadline = deadline;
        }
        if let Some(bid_deadline) = edit.bid_deadline {
            job.bid_deadline = bid_deadline;
        }
        Ok(())
    }

    /// Flip the marketplace-wide pause switch. Administrator only; the one
    /// mutating operation the pause gate itself does not block.
    pub fn set_paused(&mut self, caller: AccountId, value: bool) -> MarketResult<bool> {
        if !access::is_admin(&self.store, caller) {
            return Err(MarketError::NotAuthorized);
        }
        self.store.set_paused(value);
        Ok(value)
    }

    // --- read-only queries (unaffected by the pause switch) ---

    pub fn job(&self, job_id: JobId) -> MarketResult<&Job> {
        self.lookup(job_id)
    }

    pub fn bid(&self, job_id: JobId, bidder: AccountId) -> MarketResult<&Bid> {
        self.lookup(job_id)?;
        self.store.bid(job_id, bidder).ok_or(MarketError::NotFound)
    }

    /// Live-bid count. Unknown (but structurally valid) job ids read as 0.
    pub fn bid_count(&self, job_id: JobId) -> MarketResult<u32> {
        if job_id == 0 {
            return Err(MarketError::InvalidJobId);
        }
        Ok(self.store.bid_count(job_id))
    }

    pub fn total_jobs(&self) -> u64 {
        self.store.total_jobs()
    }

    pub fn admin(&self) -> AccountId {
        self.store.admin()
    }

    pub fn is_paused(&self) -> bool {
        self.store.is_paused()
    }

    pub fn status(&self, job_id: JobId) -> MarketResult<JobStatus> {
        Ok(self.lookup(job_id)?.status)
    }

    pub fn assigned_worker(&self, job_id: JobId) -> MarketResult<Option<AccountId>> {
        Ok(self.lookup(job_id)?.assigned_to)
    }
}
