#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Pure classification system deriving edge flags from walkability.

use tracing::debug;
use walkgrid_core::{Command, EdgeClassification, EdgeFlags, GridSnapshot};

/// Recomputes walkable-edge and grid-edge flags for every cell.
#[derive(Debug, Default)]
pub struct CellClassifier;

impl CellClassifier {
    /// Derives edge flags from the provided walkability snapshot.
    ///
    /// A cell is a walkable edge when any of its eight Moore neighbours lies
    /// outside the lattice or is not walkable. A cell is a grid edge when it
    /// sits on the outer ring of the lattice. Flags are returned in row-major
    /// order, one entry per cell, tagged with the snapshot's revision.
    #[must_use]
    pub fn reclassify_edges(&self, snapshot: &GridSnapshot) -> EdgeClassification {
        let (width, height) = snapshot.dimensions();
        let last_x = i64::from(width) - 1;
        let last_y = i64::from(height) - 1;

        let flags: Vec<EdgeFlags> = (0..snapshot.cell_count())
            .map(|index| {
                let coord = snapshot.coord_of(index);
                let walkable_edge = coord
                    .moore_neighbors()
                    .any(|neighbor| !snapshot.is_walkable(neighbor));
                let (x, y) = (i64::from(coord.x()), i64::from(coord.y()));
                let grid_edge = x == 0 || y == 0 || x == last_x || y == last_y;
                EdgeFlags {
                    walkable_edge,
                    grid_edge,
                }
            })
            .collect();

        let walkable_edges = flags.iter().filter(|flags| flags.walkable_edge).count();
        debug!(width, height, walkable_edges, "edge flags recomputed");

        EdgeClassification::new(width, height, flags)
            .expect("one flag entry is produced per snapshot cell")
            .with_revision(snapshot.revision())
    }

    /// Wraps a fresh classification into the command that applies it.
    #[must_use]
    pub fn command_for(&self, snapshot: &GridSnapshot) -> Command {
        Command::ApplyEdgeClassification {
            classification: self.reclassify_edges(snapshot),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use walkgrid_core::CellCoord;

    fn classify(rows: &[&str]) -> EdgeClassification {
        let snapshot = GridSnapshot::from_rows(rows).expect("snapshot");
        CellClassifier.reclassify_edges(&snapshot)
    }

    #[test]
    fn open_lattice_marks_only_the_ring() {
        let classification = classify(&["....", "....", "....", "...."]);
        for y in 0..4 {
            for x in 0..4 {
                let flags = classification
                    .flags_at(CellCoord::new(x, y))
                    .expect("in bounds");
                let ring = x == 0 || y == 0 || x == 3 || y == 3;
                assert_eq!(flags.grid_edge, ring, "({x}, {y})");
                assert_eq!(flags.walkable_edge, ring, "({x}, {y})");
            }
        }
    }

    #[test]
    fn blocked_cell_marks_its_moore_neighbours() {
        let classification = classify(&[".....", ".....", "..#..", ".....", "....."]);
        let interior = |x, y| {
            classification
                .flags_at(CellCoord::new(x, y))
                .expect("in bounds")
                .walkable_edge
        };

        for (x, y) in [(1, 1), (2, 1), (3, 1), (1, 2), (3, 2), (1, 3), (2, 3), (3, 3)] {
            assert!(interior(x, y), "({x}, {y}) borders the blocked cell");
        }
        assert!(!interior(2, 2), "blocked cell has only walkable neighbours");
    }

    #[test]
    fn diagonal_obstacle_counts_as_neighbour() {
        let classification = classify(&["....", "....", "...#", "...."]);
        let flags = classification
            .flags_at(CellCoord::new(2, 1))
            .expect("in bounds");
        assert!(flags.walkable_edge);
        assert!(!flags.grid_edge);
    }

    #[test]
    fn classification_inherits_snapshot_revision() {
        let snapshot = GridSnapshot::from_rows(&["...", "..."])
            .expect("snapshot")
            .with_revision(7);
        assert_eq!(CellClassifier.reclassify_edges(&snapshot).revision(), 7);
    }

    #[test]
    fn single_cell_lattice_is_all_edge() {
        let classification = classify(&["."]);
        assert_eq!(
            classification.flags(),
            &[EdgeFlags {
                walkable_edge: true,
                grid_edge: true
            }]
        );
    }
}
