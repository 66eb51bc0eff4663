//! gator: a command-line RSS aggregator.
//!
//! Users follow RSS feeds; `gator agg` repeatedly picks the feed most
//! overdue for refresh, fetches it, and stores its items as posts in SQLite.

pub mod cli;
pub mod config;
pub mod feed;
pub mod ingest;
pub mod storage;
pub mod util;
