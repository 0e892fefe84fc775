pub mod access;
mod job;
mod lifecycle;
mod store;

pub use job::{
    derive_bid_phase, AccountId, Bid, Job, JobEdit, JobId, JobStatus, MAX_DESCRIPTION_LEN,
    MAX_TITLE_LEN,
};
pub use lifecycle::JobMarket;
pub use store::MarketStore;
