#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Pure path search system answering shortest-route queries.
//!
//! Searches never read the live grid. They run on an owned
//! [`walkgrid_core::GridSnapshot`], which callers capture through the world's
//! query module once edge classification is fresh. Later refreshes of the
//! grid therefore cannot affect searches that are already running.

mod astar;
mod scheduler;

pub use astar::{GridPath, PathSearchEngine, SearchLimits, SearchOutcome};
pub use scheduler::{BatchSummary, PathSearchScheduler, SearchRequest};
