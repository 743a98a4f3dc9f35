#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Authoritative grid state management for walkgrid.
//!
//! The [`Grid`] owns every [`Cell`] of the lattice in a flat row-major buffer.
//! Mutations arrive exclusively through [`apply`], which broadcasts [`Event`]
//! values describing what changed. Read-only access lives in [`query`].

mod cell;

use glam::Vec3;
use tracing::debug;
use walkgrid_core::{CellCoord, Command, EdgeClassification, Event, GridError, GridLayout, Survey};

pub use cell::Cell;

/// Represents the authoritative lattice of cells.
#[derive(Clone, Debug)]
pub struct Grid {
    layout: GridLayout,
    cells: Vec<Cell>,
    revision: u64,
    classification_stale: bool,
}

impl Grid {
    /// Builds a grid for an already validated layout.
    ///
    /// Every cell starts walkable with weight one, no occupier and all derived,
    /// blocked and spawn flags cleared. Derived flags are considered stale
    /// until the first edge classification is applied.
    #[must_use]
    pub fn new(layout: GridLayout) -> Self {
        let cells = layout.coords().map(Cell::new).collect();
        Self {
            layout,
            cells,
            revision: 0,
            classification_stale: true,
        }
    }

    /// Validates the provided geometry and builds a grid for it.
    ///
    /// # Errors
    ///
    /// Propagates the layout validation errors: no grid exists when the
    /// dimensions or cell size are invalid.
    pub fn create(
        width: u32,
        height: u32,
        cell_width: f32,
        cell_height: f32,
        origin: Vec3,
    ) -> Result<Self, GridError> {
        let layout = GridLayout::new(width, height, cell_width, cell_height, origin)?;
        Ok(Self::new(layout))
    }

    /// Geometry of the lattice.
    #[must_use]
    pub const fn layout(&self) -> &GridLayout {
        &self.layout
    }

    /// Number of cells along the x axis.
    #[must_use]
    pub const fn width(&self) -> u32 {
        self.layout.width()
    }

    /// Number of cells along the y axis.
    #[must_use]
    pub const fn height(&self) -> u32 {
        self.layout.height()
    }

    /// Converts a world position to the coordinate of the cell containing it.
    ///
    /// The result may lie outside the lattice; guard with
    /// [`Grid::is_within_bounds`] before indexing.
    #[must_use]
    pub fn cell_coordinate_of(&self, world_position: Vec3) -> CellCoord {
        self.layout.cell_coordinate_of(world_position)
    }

    /// World position of the cell's minimum corner.
    #[must_use]
    pub fn world_origin_of(&self, coord: CellCoord) -> Vec3 {
        self.layout.world_origin_of(coord)
    }

    /// World position of the cell's center.
    #[must_use]
    pub fn world_center_of(&self, coord: CellCoord) -> Vec3 {
        self.layout.world_center_of(coord)
    }

    /// Reports whether the coordinate addresses a cell of this grid.
    #[must_use]
    pub fn is_within_bounds(&self, coord: CellCoord) -> bool {
        self.layout.is_within_bounds(coord)
    }

    /// Returns the cell stored at the coordinate.
    ///
    /// # Errors
    ///
    /// Returns [`GridError::OutOfBounds`] when the coordinate lies outside the
    /// lattice.
    pub fn cell_at(&self, coord: CellCoord) -> Result<&Cell, GridError> {
        let index = self.index_or_err(coord)?;
        Ok(&self.cells[index])
    }

    /// Returns the cell containing the provided world position.
    ///
    /// # Errors
    ///
    /// Returns [`GridError::OutOfBounds`] when the position lies outside the
    /// grid's footprint.
    pub fn cell_at_world(&self, world_position: Vec3) -> Result<&Cell, GridError> {
        self.cell_at(self.cell_coordinate_of(world_position))
    }

    /// All cells in row-major enumeration order.
    #[must_use]
    pub fn cells(&self) -> &[Cell] {
        &self.cells
    }

    /// Counter bumped by every survey that flips the walkability of a cell.
    #[must_use]
    pub const fn revision(&self) -> u64 {
        self.revision
    }

    /// Whether walkability changed since edge flags were last recomputed.
    #[must_use]
    pub const fn needs_reclassification(&self) -> bool {
        self.classification_stale
    }

    fn cell_at_mut(&mut self, coord: CellCoord) -> Result<&mut Cell, GridError> {
        let index = self.index_or_err(coord)?;
        Ok(&mut self.cells[index])
    }

    fn index_or_err(&self, coord: CellCoord) -> Result<usize, GridError> {
        self.layout.index_of(coord).ok_or(GridError::OutOfBounds {
            coord,
            width: self.width(),
            height: self.height(),
        })
    }

    fn ensure_dimensions(&self, actual: (u32, u32)) -> Result<(), GridError> {
        let expected = self.layout.dimensions();
        if expected == actual {
            Ok(())
        } else {
            Err(GridError::DimensionMismatch { expected, actual })
        }
    }

    fn apply_survey(&mut self, survey: &Survey) -> Result<Event, GridError> {
        self.ensure_dimensions(survey.dimensions())?;

        let mut changed = 0;
        for (cell, sample) in self.cells.iter_mut().zip(survey.samples()) {
            if cell.apply_sample(*sample) {
                changed += 1;
            }
        }

        if changed > 0 {
            self.revision = self.revision.wrapping_add(1);
            self.classification_stale = true;
        }

        let walkable = self.cells.iter().filter(|cell| cell.is_walkable()).count();
        Ok(Event::SurveyApplied {
            walkable,
            changed,
            failed_probes: survey.failed_probes(),
        })
    }

    fn apply_classification(
        &mut self,
        classification: &EdgeClassification,
    ) -> Result<Event, GridError> {
        self.ensure_dimensions(classification.dimensions())?;
        if classification.revision() != self.revision {
            return Err(GridError::StaleClassification);
        }

        let mut walkable_edges = 0;
        let mut grid_edges = 0;
        for (cell, flags) in self.cells.iter_mut().zip(classification.flags()) {
            cell.apply_edges(*flags);
            walkable_edges += usize::from(flags.walkable_edge);
            grid_edges += usize::from(flags.grid_edge);
        }
        self.classification_stale = false;

        Ok(Event::EdgesReclassified {
            walkable_edges,
            grid_edges,
        })
    }
}

/// Applies the provided command to the grid, mutating state deterministically.
pub fn apply(grid: &mut Grid, command: Command, out_events: &mut Vec<Event>) {
    match command {
        Command::ApplySurvey { survey } => match grid.apply_survey(&survey) {
            Ok(event) => {
                debug!(?event, "survey applied");
                out_events.push(event);
            }
            Err(reason) => out_events.push(Event::SurveyRejected { reason }),
        },
        Command::ApplyEdgeClassification { classification } => {
            match grid.apply_classification(&classification) {
                Ok(event) => {
                    debug!(?event, "edge flags applied");
                    out_events.push(event);
                }
                Err(reason) => out_events.push(Event::ClassificationRejected { reason }),
            }
        }
        Command::SetOccupier { cell, occupant } => match grid.cell_at_mut(cell) {
            Ok(target) => {
                let previous = target.replace_occupier(Some(occupant));
                out_events.push(Event::OccupierSet {
                    cell,
                    occupant,
                    previous,
                });
            }
            Err(reason) => out_events.push(Event::OccupancyRejected { cell, reason }),
        },
        Command::ClearOccupier { cell } => match grid.cell_at_mut(cell) {
            Ok(target) => {
                let previous = target.replace_occupier(None);
                out_events.push(Event::OccupierCleared { cell, previous });
            }
            Err(reason) => out_events.push(Event::OccupancyRejected { cell, reason }),
        },
    }
}

/// Query functions that provide read-only access to the grid state.
pub mod query {
    use super::{Cell, Grid};
    use walkgrid_core::{CellCoord, GridError, GridLayout, GridSnapshot, OccupantId};

    /// Provides read-only access to the grid's geometry.
    #[must_use]
    pub fn layout(grid: &Grid) -> &GridLayout {
        grid.layout()
    }

    /// Retrieves the cell stored at the coordinate.
    ///
    /// # Errors
    ///
    /// Returns [`GridError::OutOfBounds`] for coordinates outside the lattice.
    pub fn cell_at(grid: &Grid, coord: CellCoord) -> Result<&Cell, GridError> {
        grid.cell_at(coord)
    }

    /// Entity occupying the cell, if any.
    ///
    /// # Errors
    ///
    /// Returns [`GridError::OutOfBounds`] for coordinates outside the lattice.
    pub fn occupier(grid: &Grid, coord: CellCoord) -> Result<Option<OccupantId>, GridError> {
        grid.cell_at(coord).map(Cell::occupier)
    }

    /// Reports whether an entity occupies the cell.
    ///
    /// # Errors
    ///
    /// Returns [`GridError::OutOfBounds`] for coordinates outside the lattice.
    pub fn is_occupied(grid: &Grid, coord: CellCoord) -> Result<bool, GridError> {
        grid.cell_at(coord).map(Cell::is_occupied)
    }

    /// Number of cells currently classified as walkable.
    #[must_use]
    pub fn walkable_count(grid: &Grid) -> usize {
        grid.cells().iter().filter(|cell| cell.is_walkable()).count()
    }

    /// Number of cells that currently have an occupier.
    #[must_use]
    pub fn occupied_count(grid: &Grid) -> usize {
        grid.cells().iter().filter(|cell| cell.is_occupied()).count()
    }

    /// Cells where an enemy may appear right now.
    ///
    /// A candidate is walkable, flagged enemy-spawnable, not spawn-blocked and
    /// not occupied. Coordinates are returned in row-major order.
    #[must_use]
    pub fn enemy_spawn_cells(grid: &Grid) -> Vec<CellCoord> {
        grid.cells()
            .iter()
            .filter(|cell| {
                cell.is_walkable()
                    && cell.is_enemy_spawnable()
                    && !cell.is_spawn_blocked()
                    && !cell.is_occupied()
            })
            .map(Cell::coord)
            .collect()
    }

    /// Captures the current walkability regardless of derived flag freshness.
    ///
    /// This is the input of edge classification. The snapshot carries the
    /// grid's current [`Grid::revision`].
    #[must_use]
    pub fn walkability(grid: &Grid) -> GridSnapshot {
        let walkable = grid.cells().iter().map(Cell::is_walkable).collect();
        GridSnapshot::new(grid.width(), grid.height(), walkable)
            .expect("grid dimensions match the cell buffer")
            .with_revision(grid.revision())
    }

    /// Captures an immutable snapshot suitable for path searches.
    ///
    /// # Errors
    ///
    /// Returns [`GridError::StaleClassification`] while walkability changed
    /// since the derived edge flags were last recomputed.
    pub fn path_snapshot(grid: &Grid) -> Result<GridSnapshot, GridError> {
        if grid.needs_reclassification() {
            return Err(GridError::StaleClassification);
        }
        Ok(walkability(grid))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use walkgrid_core::{CellSample, EdgeFlags, GridSnapshot, OccupantId};

    fn grid(width: u32, height: u32) -> Grid {
        Grid::create(width, height, 1.0, 1.0, Vec3::ZERO).expect("valid grid")
    }

    fn survey_blocking(grid: &Grid, blocked: &[CellCoord]) -> Survey {
        let samples = grid
            .layout()
            .coords()
            .map(|coord| CellSample {
                walkable: !blocked.contains(&coord),
                ..CellSample::default()
            })
            .collect();
        Survey::new(grid.width(), grid.height(), samples).expect("survey")
    }

    #[test]
    fn create_initialises_every_cell() {
        let grid = grid(4, 3);
        assert_eq!(grid.cells().len(), 12);
        for (index, cell) in grid.cells().iter().enumerate() {
            assert_eq!(grid.layout().index_of(cell.coord()), Some(index));
            assert!(cell.is_walkable());
            assert!(!cell.is_walkable_edge());
            assert!(!cell.is_grid_edge());
            assert!(!cell.is_spawn_blocked());
            assert!(!cell.is_enemy_spawnable());
            assert_eq!(cell.walk_weight(), 1);
            assert_eq!(cell.occupier(), None);
        }
    }

    #[test]
    fn create_rejects_zero_dimensions() {
        let result = Grid::create(0, 3, 1.0, 1.0, Vec3::ZERO);
        assert!(matches!(result, Err(GridError::InvalidDimensions { .. })));
    }

    #[test]
    fn cell_at_reports_out_of_bounds() {
        let grid = grid(3, 3);
        for coord in [
            CellCoord::new(-1, 0),
            CellCoord::new(0, -1),
            CellCoord::new(3, 0),
            CellCoord::new(0, 3),
        ] {
            assert!(!grid.is_within_bounds(coord));
            assert_eq!(
                grid.cell_at(coord),
                Err(GridError::OutOfBounds {
                    coord,
                    width: 3,
                    height: 3
                })
            );
        }
    }

    #[test]
    fn cell_at_world_resolves_containing_cell() {
        let grid = Grid::create(4, 4, 2.0, 0.5, Vec3::new(10.0, 0.0, -1.0)).expect("grid");
        let cell = grid
            .cell_at_world(Vec3::new(13.9, 5.0, 0.2))
            .expect("inside grid");
        assert_eq!(cell.coord(), CellCoord::new(1, 2));
        assert!(grid.cell_at_world(Vec3::new(9.0, 0.0, 0.0)).is_err());
    }

    #[test]
    fn cell_at_world_rejects_nan_positions() {
        let grid = grid(3, 3);
        assert!(matches!(
            grid.cell_at_world(Vec3::new(f32::NAN, 0.0, f32::NAN)),
            Err(GridError::OutOfBounds { .. })
        ));
        assert!(grid.cell_at_world(Vec3::new(0.5, f32::NAN, 0.5)).is_ok());
    }

    #[test]
    fn survey_marks_classification_stale_only_on_change() {
        let mut grid = grid(3, 3);
        let mut events = Vec::new();
        let classification = EdgeClassification::new(3, 3, vec![EdgeFlags::default(); 9])
            .expect("classification");
        apply(
            &mut grid,
            Command::ApplyEdgeClassification { classification },
            &mut events,
        );
        assert!(!grid.needs_reclassification());

        let unchanged = survey_blocking(&grid, &[]);
        apply(&mut grid, Command::ApplySurvey { survey: unchanged }, &mut events);
        assert!(!grid.needs_reclassification());

        let blocked = survey_blocking(&grid, &[CellCoord::new(1, 1)]);
        apply(&mut grid, Command::ApplySurvey { survey: blocked }, &mut events);
        assert!(grid.needs_reclassification());
        assert_eq!(
            events.last(),
            Some(&Event::SurveyApplied {
                walkable: 8,
                changed: 1,
                failed_probes: 0
            })
        );
        assert_eq!(
            query::path_snapshot(&grid),
            Err(GridError::StaleClassification)
        );
    }

    #[test]
    fn survey_for_other_dimensions_is_rejected() {
        let mut grid = grid(3, 3);
        let mut events = Vec::new();
        let survey = Survey::new(2, 2, vec![CellSample::default(); 4]).expect("survey");
        apply(&mut grid, Command::ApplySurvey { survey }, &mut events);
        assert_eq!(
            events,
            vec![Event::SurveyRejected {
                reason: GridError::DimensionMismatch {
                    expected: (3, 3),
                    actual: (2, 2)
                }
            }]
        );
        assert!(grid.cells().iter().all(Cell::is_walkable));
    }

    #[test]
    fn occupancy_round_trip_reports_previous_occupant() {
        let mut grid = grid(2, 2);
        let mut events = Vec::new();
        let cell = CellCoord::new(1, 0);

        apply(
            &mut grid,
            Command::SetOccupier {
                cell,
                occupant: OccupantId::new(7),
            },
            &mut events,
        );
        apply(
            &mut grid,
            Command::SetOccupier {
                cell,
                occupant: OccupantId::new(9),
            },
            &mut events,
        );
        assert_eq!(query::occupier(&grid, cell), Ok(Some(OccupantId::new(9))));
        assert_eq!(query::occupied_count(&grid), 1);

        apply(&mut grid, Command::ClearOccupier { cell }, &mut events);
        assert_eq!(query::is_occupied(&grid, cell), Ok(false));
        assert_eq!(
            events,
            vec![
                Event::OccupierSet {
                    cell,
                    occupant: OccupantId::new(7),
                    previous: None
                },
                Event::OccupierSet {
                    cell,
                    occupant: OccupantId::new(9),
                    previous: Some(OccupantId::new(7))
                },
                Event::OccupierCleared {
                    cell,
                    previous: Some(OccupantId::new(9))
                },
            ]
        );
    }

    #[test]
    fn occupancy_outside_grid_is_rejected() {
        let mut grid = grid(2, 2);
        let mut events = Vec::new();
        let cell = CellCoord::new(2, 2);
        apply(
            &mut grid,
            Command::SetOccupier {
                cell,
                occupant: OccupantId::new(1),
            },
            &mut events,
        );
        assert_eq!(
            events,
            vec![Event::OccupancyRejected {
                cell,
                reason: GridError::OutOfBounds {
                    coord: cell,
                    width: 2,
                    height: 2
                }
            }]
        );
        assert_eq!(query::occupied_count(&grid), 0);
    }

    #[test]
    fn walkability_snapshot_mirrors_cells() {
        let mut grid = grid(3, 2);
        let mut events = Vec::new();
        let survey = survey_blocking(&grid, &[CellCoord::new(2, 0)]);
        apply(&mut grid, Command::ApplySurvey { survey }, &mut events);

        let snapshot = query::walkability(&grid);
        let expected = GridSnapshot::from_rows(&["..#", "..."])
            .expect("snapshot")
            .with_revision(1);
        assert_eq!(snapshot, expected);
    }

    #[test]
    fn classification_from_older_walkability_is_rejected() {
        let mut grid = grid(5, 5);
        let mut events = Vec::new();
        let outdated = EdgeClassification::new(5, 5, vec![EdgeFlags::default(); 25])
            .expect("classification")
            .with_revision(query::walkability(&grid).revision());

        let survey = survey_blocking(&grid, &[CellCoord::new(2, 2)]);
        apply(&mut grid, Command::ApplySurvey { survey }, &mut events);
        assert_eq!(grid.revision(), 1);
        events.clear();

        apply(
            &mut grid,
            Command::ApplyEdgeClassification {
                classification: outdated,
            },
            &mut events,
        );
        assert_eq!(
            events,
            vec![Event::ClassificationRejected {
                reason: GridError::StaleClassification
            }]
        );
        assert!(grid.needs_reclassification());
        assert_eq!(
            query::path_snapshot(&grid),
            Err(GridError::StaleClassification)
        );

        let current = EdgeClassification::new(5, 5, vec![EdgeFlags::default(); 25])
            .expect("classification")
            .with_revision(grid.revision());
        apply(
            &mut grid,
            Command::ApplyEdgeClassification {
                classification: current,
            },
            &mut events,
        );
        assert!(!grid.needs_reclassification());
        assert_eq!(query::path_snapshot(&grid).map(|s| s.revision()), Ok(1));
    }

    #[test]
    fn unchanged_survey_keeps_the_revision() {
        let mut grid = grid(2, 2);
        let mut events = Vec::new();
        let survey = survey_blocking(&grid, &[]);
        apply(&mut grid, Command::ApplySurvey { survey }, &mut events);
        assert_eq!(grid.revision(), 0);
    }

    #[test]
    fn enemy_spawn_cells_skip_blocked_and_occupied_cells() {
        let mut grid = grid(3, 1);
        let mut events = Vec::new();
        let samples = vec![
            CellSample {
                walkable: true,
                enemy_spawnable: true,
                ..CellSample::default()
            },
            CellSample {
                walkable: true,
                enemy_spawnable: true,
                spawn_blocked: true,
                ..CellSample::default()
            },
            CellSample {
                walkable: true,
                enemy_spawnable: true,
                ..CellSample::default()
            },
        ];
        let survey = Survey::new(3, 1, samples).expect("survey");
        apply(&mut grid, Command::ApplySurvey { survey }, &mut events);
        apply(
            &mut grid,
            Command::SetOccupier {
                cell: CellCoord::new(2, 0),
                occupant: OccupantId::new(3),
            },
            &mut events,
        );

        assert_eq!(query::enemy_spawn_cells(&grid), vec![CellCoord::new(0, 0)]);
    }
}
