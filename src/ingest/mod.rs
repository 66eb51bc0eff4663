//! The ingestion pipeline: pick the feed most overdue for refresh, fetch
//! it, store its items as posts, mark it fetched, and repeat on a schedule.
//!
//! # Architecture
//!
//! - [`FeedStore`] - the three storage operations the pipeline needs
//! - [`run_once`] - one select/fetch/persist/mark pass
//! - [`Scheduler`] - fixed-period loop around [`run_once`], stopped by a
//!   `CancellationToken`
//! - [`parse_interval`] - duration strings like `1m` or `1h30m`

mod cycle;
mod interval;
mod scheduler;
mod store;

pub use cycle::{run_once, CycleError, CycleReport};
pub use interval::{parse_interval, IntervalError};
pub use scheduler::Scheduler;
pub use store::FeedStore;
