//! Authorization predicates over the market store.
//!
//! Pure derivations with no state of their own: the lifecycle layer calls
//! these to gate transitions, and external collaborators may use them for
//! read-side checks.

use super::job::{AccountId, JobId};
use super::store::MarketStore;

/// Is the caller the marketplace administrator?
pub fn is_admin(store: &MarketStore, caller: AccountId) -> bool {
    store.admin() == caller
}

/// Is the caller the client of this job? False when the job does not exist.
pub fn is_client(store: &MarketStore, job_id: JobId, caller: AccountId) -> bool {
    store.job(job_id).is_some_and(|job| job.client == caller)
}

/// Is the caller the worker assigned to this job? False when the job does
/// not exist or no worker has been assigned.
pub fn is_assigned_worker(store: &MarketStore, job_id: JobId, caller: AccountId) -> bool {
    store
        .job(job_id)
        .is_some_and(|job| job.assigned_to == Some(caller))
}
