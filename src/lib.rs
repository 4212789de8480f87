//! Batch collector of historical football match URLs from a paginated
//! odds-comparison listing site.
//!
//! One unit of work is a (country, league, season) triple. The collection
//! loop walks the listing's pages in order, extracts match links, filters
//! them to the target league, dedups and persists per-season CSVs plus a
//! progress ledger and a summary report. Best effort: partial results are
//! kept and reported, never silently dropped.

pub mod cli;
pub mod collect;
pub mod config;
mod error;
pub mod fetch;
pub mod filter;
mod macros;
pub mod parse;
pub mod process;
pub mod store;

pub use error::{Error, Result};

/// A page gets `MAX_RETRIES + 1` attempts before the task gives up.
pub const MAX_RETRIES: usize = 2;
/// Fixed sleep between attempts at the same page.
pub const RETRY_BACKOFF_SECS: u64 = 3;
/// Sleep between successfully completed pages, to stay polite.
pub const PAGE_DELAY_SECS: u64 = 2;
/// Sleep between tasks in a batch run.
pub const TASK_DELAY_SECS: u64 = 2;
/// Per-request timeout for listing fetches.
pub const NAV_TIMEOUT_SECS: u64 = 30;
/// Error descriptions stored in outcomes are cut off here.
pub const MAX_ERROR_LEN: usize = 300;
