use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use super::job::{AccountId, Bid, Job, JobId};

/// The authoritative marketplace state: three tables (jobs, bids, per-job bid
/// counts), two scalars (administrator, pause flag) and the monotonic job-id
/// counter. Nothing else is persisted.
///
/// Bid inserts and removals go through [`MarketStore::insert_bid`] and
/// [`MarketStore::remove_bid`], which update the count in the same step; the
/// count can therefore never drift from the bid table's cardinality.
///
/// `BTreeMap` keeps snapshot serialization and iteration deterministic.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MarketStore {
    admin: AccountId,
    paused: bool,
    next_job_id: JobId,
    jobs: BTreeMap<JobId, Job>,
    bids: BTreeMap<JobId, BTreeMap<AccountId, Bid>>,
    bid_counts: BTreeMap<JobId, u32>,
}

impl MarketStore {
    pub fn new(admin: AccountId) -> Self {
        Self {
            admin,
            paused: false,
            next_job_id: 1,
            jobs: BTreeMap::new(),
            bids: BTreeMap::new(),
            bid_counts: BTreeMap::new(),
        }
    }

    pub fn admin(&self) -> AccountId {
        self.admin
    }

    pub fn is_paused(&self) -> bool {
        self.paused
    }

    pub fn set_paused(&mut self, value: bool) {
        self.paused = value;
    }

    /// Hand out the next sequential job id. Ids start at 1 and are never
    /// reused or decremented.
    pub fn allocate_job_id(&mut self) -> JobId {
        let id = self.next_job_id;
        self.next_job_id += 1;
        id
    }

    pub fn insert_job(&mut self, job: Job) {
        self.jobs.insert(job.id, job);
    }

    pub fn job(&self, id: JobId) -> Option<&Job> {
        self.jobs.get(&id)
    }

    pub fn job_mut(&mut self, id: JobId) -> Option<&mut Job> {
        self.jobs.get_mut(&id)
    }

    /// Total number of jobs ever created. Jobs are never deleted, so this is
    /// simply the high-water mark of the id counter.
    pub fn total_jobs(&self) -> u64 {
        self.next_job_id - 1
    }

    pub fn bid(&self, job_id: JobId, bidder: AccountId) -> Option<&Bid> {
        self.bids.get(&job_id).and_then(|per_job| per_job.get(&bidder))
    }

    /// Insert a bid and bump the job's count in one step. Returns the new
    /// count. Replacing an existing bid is a lifecycle-layer bug, so the
    /// count only moves when the entry is new.
    pub fn insert_bid(&mut self, bid: Bid) -> u32 {
        let job_id = bid.job_id;
        let previous = self
            .bids
            .entry(job_id)
            .or_default()
            .insert(bid.bidder, bid);
        let count = self.bid_counts.entry(job_id).or_insert(0);
        if previous.is_none() {
            *count += 1;
        }
        *count
    }

    /// Remove a bid and decrement the job's count in the same step.
    /// Returns the removed bid and the new count.
    pub fn remove_bid(&mut self, job_id: JobId, bidder: AccountId) -> Option<(Bid, u32)> {
        let removed = self.bids.get_mut(&job_id)?.remove(&bidder)?;
        let count = self
            .bid_counts
            .entry(job_id)
            .or_insert(0);
        *count = count.saturating_sub(1);
        Some((removed, *count))
    }

    /// Live-bid count for a job. Unknown jobs read as 0: a job with no bids
    /// is indistinguishable from a job never queried.
    pub fn bid_count(&self, job_id: JobId) -> u32 {
        self.bid_counts.get(&job_id).copied().unwrap_or(0)
    }

    /// Iterate all jobs in id order.
    pub fn jobs(&self) -> impl Iterator<Item = &Job> {
        self.jobs.values()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::market::job::JobStatus;

    fn sample_job(id: JobId, client: AccountId) -> Job {
        Job {
            id,
            client,
            title: "title".into(),
            description: "description".into(),
            budget: 1000,
            deadline: 200,
            bid_deadline: 150,
            status: JobStatus::Open,
            assigned_to: None,
            created_at: 100,
        }
    }

    fn sample_bid(job_id: JobId, bidder: AccountId) -> Bid {
        Bid {
            job_id,
            bidder,
            amount: 500,
            proposed_time: 20,
            bid_at: 100,
        }
    }

    #[test]
    fn job_ids_are_sequential_from_one() {
        let mut store = MarketStore::new(AccountId::new());
        assert_eq!(store.allocate_job_id(), 1);
        assert_eq!(store.allocate_job_id(), 2);
        assert_eq!(store.allocate_job_id(), 3);
        assert_eq!(store.total_jobs(), 3);
    }

    #[test]
    fn absent_reads_return_none() {
        let store = MarketStore::new(AccountId::new());
        assert!(store.job(1).is_none());
        assert!(store.bid(1, AccountId::new()).is_none());
    }

    #[test]
    fn bid_count_defaults_to_zero() {
        let store = MarketStore::new(AccountId::new());
        assert_eq!(store.bid_count(42), 0);
    }

    #[test]
    fn insert_and_remove_bid_keep_count_in_step() {
        let mut store = MarketStore::new(AccountId::new());
        let client = AccountId::new();
        let bidder = AccountId::new();
        let id = store.allocate_job_id();
        store.insert_job(sample_job(id, client));

        assert_eq!(store.insert_bid(sample_bid(id, bidder)), 1);
        assert_eq!(store.bid_count(id), 1);
        assert!(store.bid(id, bidder).is_some());

        let (removed, count) = store.remove_bid(id, bidder).unwrap();
        assert_eq!(removed.bidder, bidder);
        assert_eq!(count, 0);
        assert_eq!(store.bid_count(id), 0);
        assert!(store.bid(id, bidder).is_none());
    }

    #[test]
    fn reinserting_same_bidder_does_not_double_count() {
        let mut store = MarketStore::new(AccountId::new());
        let bidder = AccountId::new();
        let id = store.allocate_job_id();
        store.insert_job(sample_job(id, AccountId::new()));

        store.insert_bid(sample_bid(id, bidder));
        store.insert_bid(sample_bid(id, bidder));
        assert_eq!(store.bid_count(id), 1);
    }

    #[test]
    fn remove_missing_bid_is_none() {
        let mut store = MarketStore::new(AccountId::new());
        assert!(store.remove_bid(1, AccountId::new()).is_none());
        assert_eq!(store.bid_count(1), 0);
    }

    #[test]
    fn pause_flag_toggles() {
        let mut store = MarketStore::new(AccountId::new());
        assert!(!store.is_paused());
        store.set_paused(true);
        assert!(store.is_paused());
        store.set_paused(false);
        assert!(!store.is_paused());
    }

    #[test]
    fn snapshot_roundtrip() {
        let mut store = MarketStore::new(AccountId::new());
        let client = AccountId::new();
        let bidder = AccountId::new();
        let id = store.allocate_job_id();
        store.insert_job(sample_job(id, client));
        store.insert_bid(sample_bid(id, bidder));
        store.set_paused(true);

        let json = serde_json::to_string(&store).unwrap();
        let back: MarketStore = serde_json::from_str(&json).unwrap();

        assert_eq!(back.admin(), store.admin());
        assert!(back.is_paused());
        assert_eq!(back.total_jobs(), 1);
        assert_eq!(back.bid_count(id), 1);
        assert_eq!(back.job(id), store.job(id));
        assert_eq!(back.bid(id, bidder), store.bid(id, bidder));
    }
}
