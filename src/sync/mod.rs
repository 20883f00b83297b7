//! Keeping the local summary in step with the sheet: the refresh scheduler and the write path that
//! feeds it.

mod mutation;
mod scheduler;

pub use mutation::Mutations;
pub use scheduler::{RefreshHandle, Scheduler, SchedulerState, DEFAULT_REFRESH_INTERVAL};
