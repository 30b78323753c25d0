//! azx-scrape — one pull-triggered scrape cycle at a time.
//!
//! ```text
//! Idle → Listing → FetchingDetails → Aggregated → Idle
//! ```
//!
//! A failed list call ends the cycle early and marks `up` as 0; a failed
//! detail fetch only skips that connection. Detail fetches run
//! concurrently on a `JoinSet` and the whole cycle is bounded by a
//! deadline, after which outstanding fetches are aborted.

pub mod coordinator;
pub mod source;

pub use coordinator::{CycleReport, ScrapeCoordinator};
pub use source::ConnectionSource;
