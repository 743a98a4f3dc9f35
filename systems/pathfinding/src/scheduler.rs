//! Fork-join execution of independent search batches.

use rayon::prelude::*;
use tracing::info;
use walkgrid_core::{CancelToken, CellCoord, GridError, GridSnapshot};

use crate::astar::{PathSearchEngine, SearchOutcome};

/// One `(start, goal)` query of a batch.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct SearchRequest {
    /// Cell the route leaves from.
    pub start: CellCoord,
    /// Cell the route must reach.
    pub goal: CellCoord,
}

impl SearchRequest {
    /// Creates a request between the two cells.
    #[must_use]
    pub const fn new(start: CellCoord, goal: CellCoord) -> Self {
        Self { start, goal }
    }
}

/// Tally of the outcomes of one batch.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct BatchSummary {
    /// Searches that produced a route.
    pub found: usize,
    /// Searches that exhausted their frontier.
    pub no_path: usize,
    /// Searches stopped by the expansion limit.
    pub limit_reached: usize,
    /// Searches abandoned through cancellation.
    pub cancelled: usize,
    /// Requests refused because an endpoint was out of bounds.
    pub rejected: usize,
}

impl BatchSummary {
    /// Counts the outcomes of a finished batch.
    #[must_use]
    pub fn from_results(results: &[Result<SearchOutcome, GridError>]) -> Self {
        results
            .iter()
            .fold(Self::default(), |mut summary, result| {
                match result {
                    Ok(SearchOutcome::Found(_)) => summary.found += 1,
                    Ok(SearchOutcome::NoPath) => summary.no_path += 1,
                    Ok(SearchOutcome::LimitReached { .. }) => summary.limit_reached += 1,
                    Ok(SearchOutcome::Cancelled) => summary.cancelled += 1,
                    Err(_) => summary.rejected += 1,
                }
                summary
            })
    }

    /// Total number of requests accounted for.
    #[must_use]
    pub const fn total(&self) -> usize {
        self.found + self.no_path + self.limit_reached + self.cancelled + self.rejected
    }
}

/// Runs batches of searches concurrently against one shared snapshot.
///
/// Every request is an independent engine invocation with its own scratch
/// state. The snapshot is never mutated, so searches share nothing mutable
/// and results can be returned in submission order.
#[derive(Clone, Copy, Debug, Default)]
pub struct PathSearchScheduler {
    engine: PathSearchEngine,
}

impl PathSearchScheduler {
    /// Creates a scheduler dispatching requests to `engine`.
    #[must_use]
    pub const fn new(engine: PathSearchEngine) -> Self {
        Self { engine }
    }

    /// Engine used for every request.
    #[must_use]
    pub const fn engine(&self) -> &PathSearchEngine {
        &self.engine
    }

    /// Runs every request and returns one result per request, in order.
    #[must_use]
    pub fn submit_batch(
        &self,
        snapshot: &GridSnapshot,
        requests: &[SearchRequest],
    ) -> Vec<Result<SearchOutcome, GridError>> {
        self.submit_batch_cancellable(snapshot, requests, &CancelToken::new())
    }

    /// Runs every request unless `cancel` is triggered first.
    ///
    /// Searches observing the cancelled token report
    /// [`SearchOutcome::Cancelled`]; requests with invalid endpoints are
    /// still rejected with their error.
    #[must_use]
    pub fn submit_batch_cancellable(
        &self,
        snapshot: &GridSnapshot,
        requests: &[SearchRequest],
        cancel: &CancelToken,
    ) -> Vec<Result<SearchOutcome, GridError>> {
        let results: Vec<_> = requests
            .par_iter()
            .map(|request| {
                self.engine
                    .find_path_cancellable(snapshot, request.start, request.goal, cancel)
            })
            .collect();

        let summary = BatchSummary::from_results(&results);
        info!(
            requests = requests.len(),
            found = summary.found,
            no_path = summary.no_path,
            limit_reached = summary.limit_reached,
            cancelled = summary.cancelled,
            rejected = summary.rejected,
            "search batch complete"
        );
        results
    }
}
