//! Eight-directional A* search over a walkability snapshot.

use std::{cmp::Reverse, collections::BinaryHeap};

use tracing::{debug, trace};
use walkgrid_core::{CancelToken, CellCoord, GridError, GridSnapshot, UNIFORM_WALK_WEIGHT};

/// Bounds applied to a single search.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct SearchLimits {
    /// Maximum number of nodes expanded before the search gives up.
    ///
    /// `None` leaves the search bounded only by the cell count.
    pub max_expansions: Option<usize>,
}

impl SearchLimits {
    /// Limits that never stop a search early.
    #[must_use]
    pub const fn unlimited() -> Self {
        Self {
            max_expansions: None,
        }
    }

    /// Limits that stop a search after `max_expansions` expanded nodes.
    #[must_use]
    pub const fn with_max_expansions(max_expansions: usize) -> Self {
        Self {
            max_expansions: Some(max_expansions),
        }
    }
}

/// Reconstructed route from start to goal, both inclusive.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct GridPath {
    cells: Vec<CellCoord>,
    cost: u64,
}

impl GridPath {
    /// Cells visited in travel order.
    #[must_use]
    pub fn cells(&self) -> &[CellCoord] {
        &self.cells
    }

    /// Sum of the step costs along the route.
    #[must_use]
    pub const fn cost(&self) -> u64 {
        self.cost
    }

    /// Number of cells in the route, endpoints included.
    #[must_use]
    pub fn len(&self) -> usize {
        self.cells.len()
    }

    /// Whether the route holds no cells. Reconstructed routes never are.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.cells.is_empty()
    }

    /// Consumes the route, returning its cells.
    #[must_use]
    pub fn into_cells(self) -> Vec<CellCoord> {
        self.cells
    }
}

/// Result of a search whose endpoints were valid.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum SearchOutcome {
    /// The goal was reached.
    Found(GridPath),
    /// The frontier was exhausted without reaching the goal.
    NoPath,
    /// The expansion limit was hit before the search concluded.
    LimitReached {
        /// Nodes expanded before giving up.
        expanded: usize,
    },
    /// The search observed a cancelled token.
    Cancelled,
}

impl SearchOutcome {
    /// Route found by the search, if any.
    #[must_use]
    pub fn path(&self) -> Option<&GridPath> {
        match self {
            Self::Found(path) => Some(path),
            _ => None,
        }
    }

    /// Whether the search reached the goal.
    #[must_use]
    pub fn is_found(&self) -> bool {
        matches!(self, Self::Found(_))
    }
}

/// Ephemeral per-cell record owned by one search.
#[derive(Clone, Copy, Debug)]
struct SearchNode {
    coord: CellCoord,
    g_cost: Option<u64>,
    h_cost: u64,
    walkable: bool,
    predecessor: Option<usize>,
}

/// Frontier entry ordered by `(f, h, index)`; wrapped in `Reverse` for a min-heap.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord)]
struct OpenEntry {
    f_cost: u64,
    h_cost: u64,
    index: usize,
}

/// Scratch state of one search, dropped on every exit path.
struct Scratch {
    nodes: Vec<SearchNode>,
    closed: Vec<bool>,
    open: BinaryHeap<Reverse<OpenEntry>>,
}

impl Scratch {
    fn new(snapshot: &GridSnapshot, goal: CellCoord) -> Self {
        let nodes = snapshot
            .cells()
            .iter()
            .enumerate()
            .map(|(index, &walkable)| {
                let coord = snapshot.coord_of(index);
                SearchNode {
                    coord,
                    g_cost: None,
                    h_cost: coord.octile_distance(goal),
                    walkable,
                    predecessor: None,
                }
            })
            .collect();

        Self {
            nodes,
            closed: vec![false; snapshot.cell_count()],
            open: BinaryHeap::new(),
        }
    }

    fn reach(&mut self, index: usize, g_cost: u64, predecessor: Option<usize>) {
        let node = &mut self.nodes[index];
        node.g_cost = Some(g_cost);
        node.predecessor = predecessor;
        self.open.push(Reverse(OpenEntry {
            f_cost: g_cost + node.h_cost,
            h_cost: node.h_cost,
            index,
        }));
    }

    fn reconstruct(&self, goal_index: usize) -> GridPath {
        let mut cells = Vec::new();
        let mut cursor = Some(goal_index);
        while let Some(index) = cursor {
            let node = &self.nodes[index];
            cells.push(node.coord);
            cursor = node.predecessor;
        }
        cells.reverse();

        let cost = self.nodes[goal_index].g_cost.unwrap_or_default();
        GridPath { cells, cost }
    }
}

/// A* engine computing least-cost routes between cells of a snapshot.
///
/// Orthogonal steps cost 10 and diagonal steps 14, scaled by the uniform
/// walk weight; the heuristic is the octile distance with the same weights.
/// Diagonal steps only require the destination to be walkable.
#[derive(Clone, Copy, Debug, Default)]
pub struct PathSearchEngine {
    limits: SearchLimits,
}

impl PathSearchEngine {
    /// Creates an engine enforcing the provided limits on every search.
    #[must_use]
    pub const fn new(limits: SearchLimits) -> Self {
        Self { limits }
    }

    /// Limits applied to every search.
    #[must_use]
    pub const fn limits(&self) -> SearchLimits {
        self.limits
    }

    /// Computes a least-cost route from `start` to `goal`.
    ///
    /// The start cell may be unwalkable since the caller already stands on it;
    /// an unwalkable goal yields [`SearchOutcome::NoPath`]. Ties between
    /// frontier nodes are broken by lower f-cost, then lower heuristic, then
    /// lower row-major index, so equal inputs always produce equal routes.
    ///
    /// # Errors
    ///
    /// Returns [`GridError::OutOfBounds`] when either endpoint lies outside
    /// the snapshot.
    pub fn find_path(
        &self,
        snapshot: &GridSnapshot,
        start: CellCoord,
        goal: CellCoord,
    ) -> Result<SearchOutcome, GridError> {
        self.search(snapshot, start, goal, None)
    }

    /// Computes a route, abandoning the search once `cancel` is triggered.
    ///
    /// The token is checked before every expansion.
    ///
    /// # Errors
    ///
    /// Returns [`GridError::OutOfBounds`] when either endpoint lies outside
    /// the snapshot.
    pub fn find_path_cancellable(
        &self,
        snapshot: &GridSnapshot,
        start: CellCoord,
        goal: CellCoord,
        cancel: &CancelToken,
    ) -> Result<SearchOutcome, GridError> {
        self.search(snapshot, start, goal, Some(cancel))
    }

    fn search(
        &self,
        snapshot: &GridSnapshot,
        start: CellCoord,
        goal: CellCoord,
        cancel: Option<&CancelToken>,
    ) -> Result<SearchOutcome, GridError> {
        let start_index = snapshot.ensure_within_bounds(start)?;
        let goal_index = snapshot.ensure_within_bounds(goal)?;

        if start_index == goal_index {
            return Ok(SearchOutcome::Found(GridPath {
                cells: vec![start],
                cost: 0,
            }));
        }
        if !snapshot.is_walkable(goal) {
            trace!(%start, %goal, "goal is not walkable");
            return Ok(SearchOutcome::NoPath);
        }

        let mut scratch = Scratch::new(snapshot, goal);
        scratch.reach(start_index, 0, None);
        let mut expanded = 0;

        while let Some(Reverse(entry)) = scratch.open.pop() {
            if scratch.closed[entry.index] {
                continue;
            }
            if entry.index == goal_index {
                let path = scratch.reconstruct(goal_index);
                debug!(%start, %goal, cost = path.cost(), expanded, "path found");
                return Ok(SearchOutcome::Found(path));
            }
            if cancel.is_some_and(CancelToken::is_cancelled) {
                debug!(%start, %goal, expanded, "search cancelled");
                return Ok(SearchOutcome::Cancelled);
            }
            if self
                .limits
                .max_expansions
                .is_some_and(|limit| expanded >= limit)
            {
                debug!(%start, %goal, expanded, "search hit expansion limit");
                return Ok(SearchOutcome::LimitReached { expanded });
            }

            scratch.closed[entry.index] = true;
            expanded += 1;

            let current = scratch.nodes[entry.index];
            let Some(g_cost) = current.g_cost else {
                continue;
            };

            for neighbor in current.coord.moore_neighbors() {
                let Some(index) = snapshot.index_of(neighbor) else {
                    continue;
                };
                let node = scratch.nodes[index];
                if scratch.closed[index] || !node.walkable {
                    continue;
                }

                let step = current.coord.step_cost(neighbor) * u64::from(UNIFORM_WALK_WEIGHT);
                let tentative = g_cost + step;
                if node.g_cost.map_or(true, |known| tentative < known) {
                    scratch.reach(index, tentative, Some(entry.index));
                }
            }
        }

        debug!(%start, %goal, expanded, "frontier exhausted without reaching goal");
        Ok(SearchOutcome::NoPath)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn open(width: usize, height: usize) -> GridSnapshot {
        let row = ".".repeat(width);
        let rows: Vec<&str> = (0..height).map(|_| row.as_str()).collect();
        GridSnapshot::from_rows(&rows).expect("snapshot")
    }

    fn cells(coords: &[(i32, i32)]) -> Vec<CellCoord> {
        coords.iter().map(|&(x, y)| CellCoord::new(x, y)).collect()
    }

    fn found(outcome: SearchOutcome) -> GridPath {
        match outcome {
            SearchOutcome::Found(path) => path,
            other => panic!("expected a path, got {other:?}"),
        }
    }

    #[test]
    fn open_grid_takes_the_diagonal() {
        let engine = PathSearchEngine::default();
        let path = found(
            engine
                .find_path(&open(5, 5), CellCoord::new(0, 0), CellCoord::new(4, 4))
                .expect("in bounds"),
        );
        assert_eq!(path.cost(), 56);
        assert_eq!(
            path.cells(),
            cells(&[(0, 0), (1, 1), (2, 2), (3, 3), (4, 4)]).as_slice()
        );
    }

    #[test]
    fn blocked_center_forces_a_detour() {
        let snapshot =
            GridSnapshot::from_rows(&[".....", ".....", "..#..", ".....", "....."]).expect("grid");
        let engine = PathSearchEngine::default();
        let path = found(
            engine
                .find_path(&snapshot, CellCoord::new(0, 0), CellCoord::new(4, 4))
                .expect("in bounds"),
        );
        assert_eq!(path.cost(), 62);
        assert!(!path.cells().contains(&CellCoord::new(2, 2)));
        assert!(path
            .cells()
            .windows(2)
            .all(|pair| pair[0].is_adjacent(pair[1])));
    }

    #[test]
    fn full_wall_leaves_no_path() {
        let snapshot =
            GridSnapshot::from_rows(&[".....", ".....", "#####", ".....", "....."]).expect("grid");
        let outcome = PathSearchEngine::default()
            .find_path(&snapshot, CellCoord::new(0, 0), CellCoord::new(4, 4))
            .expect("in bounds");
        assert_eq!(outcome, SearchOutcome::NoPath);
    }

    #[test]
    fn diagonal_moves_ignore_corner_cells() {
        let snapshot = GridSnapshot::from_rows(&[".#", "#."]).expect("grid");
        let path = found(
            PathSearchEngine::default()
                .find_path(&snapshot, CellCoord::new(0, 0), CellCoord::new(1, 1))
                .expect("in bounds"),
        );
        assert_eq!(path.cost(), 14);
    }

    #[test]
    fn out_of_bounds_endpoints_are_rejected() {
        let snapshot = open(3, 3);
        let engine = PathSearchEngine::default();
        assert_eq!(
            engine.find_path(&snapshot, CellCoord::new(-1, 0), CellCoord::new(1, 1)),
            Err(GridError::OutOfBounds {
                coord: CellCoord::new(-1, 0),
                width: 3,
                height: 3
            })
        );
        assert!(engine
            .find_path(&snapshot, CellCoord::new(0, 0), CellCoord::new(0, 3))
            .is_err());
    }

    #[test]
    fn start_equal_to_goal_is_a_single_cell() {
        let path = found(
            PathSearchEngine::default()
                .find_path(&open(2, 2), CellCoord::new(1, 0), CellCoord::new(1, 0))
                .expect("in bounds"),
        );
        assert_eq!(path.cells(), &[CellCoord::new(1, 0)]);
        assert_eq!(path.cost(), 0);
    }

    #[test]
    fn unwalkable_start_may_leave_but_goal_must_be_walkable() {
        let snapshot = GridSnapshot::from_rows(&["#..", "..#"]).expect("grid");
        let engine = PathSearchEngine::default();

        let path = found(
            engine
                .find_path(&snapshot, CellCoord::new(0, 0), CellCoord::new(2, 0))
                .expect("in bounds"),
        );
        assert_eq!(path.cost(), 20);

        let outcome = engine
            .find_path(&snapshot, CellCoord::new(0, 1), CellCoord::new(2, 1))
            .expect("in bounds");
        assert_eq!(outcome, SearchOutcome::NoPath);
    }

    #[test]
    fn expansion_limit_stops_the_search() {
        let engine = PathSearchEngine::new(SearchLimits::with_max_expansions(3));
        let snapshot =
            GridSnapshot::from_rows(&["........", "#######.", "........"]).expect("grid");
        let outcome = engine
            .find_path(&snapshot, CellCoord::new(0, 0), CellCoord::new(0, 2))
            .expect("in bounds");
        assert_eq!(outcome, SearchOutcome::LimitReached { expanded: 3 });
    }

    #[test]
    fn cancelled_token_stops_the_search() {
        let cancel = CancelToken::new();
        cancel.cancel();
        let outcome = PathSearchEngine::default()
            .find_path_cancellable(&open(4, 4), CellCoord::new(0, 0), CellCoord::new(3, 3), &cancel)
            .expect("in bounds");
        assert_eq!(outcome, SearchOutcome::Cancelled);
    }

    #[test]
    fn equal_cost_routes_are_resolved_deterministically() {
        let snapshot = open(6, 3);
        let engine = PathSearchEngine::default();
        let first = engine
            .find_path(&snapshot, CellCoord::new(0, 1), CellCoord::new(5, 1))
            .expect("in bounds");
        for _ in 0..8 {
            let again = engine
                .find_path(&snapshot, CellCoord::new(0, 1), CellCoord::new(5, 1))
                .expect("in bounds");
            assert_eq!(again, first);
        }
        assert_eq!(found(first).cost(), 50);
    }
}
