#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Core contracts shared across the walkgrid workspace.
//!
//! This crate defines the vocabulary that connects the authoritative grid
//! owned by the world crate with the pure systems that sample, classify and
//! search it. Callers submit [`Command`] values describing desired mutations,
//! the world executes those commands via its `apply` entry point, and then
//! broadcasts [`Event`] values describing what changed. Systems never mutate
//! the grid directly: they read immutable [`GridSnapshot`] copies and respond
//! with new data such as a [`Survey`] or an [`EdgeClassification`].

use std::{
    fmt,
    sync::{
        atomic::{AtomicBool, Ordering},
        Arc,
    },
};

use glam::Vec3;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Cost of a single orthogonal step between adjacent cells.
pub const STRAIGHT_STEP_COST: u64 = 10;

/// Cost of a single diagonal step between adjacent cells.
pub const DIAGONAL_STEP_COST: u64 = 14;

/// Traversal weight assigned to every cell of the lattice.
pub const UNIFORM_WALK_WEIGHT: u32 = 1;

/// Offsets of the eight Moore neighbours around a cell.
pub const MOORE_OFFSETS: [(i32, i32); 8] = [
    (-1, 0),
    (1, 0),
    (0, 1),
    (0, -1),
    (-1, -1),
    (-1, 1),
    (1, -1),
    (1, 1),
];

/// Location of a single grid cell expressed as signed lattice coordinates.
///
/// Coordinates are signed because converting a world position that lies
/// before the grid origin yields negative values. Such coordinates are never
/// within bounds, but callers must be able to represent them in order to
/// reject them.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct CellCoord {
    x: i32,
    y: i32,
}

impl CellCoord {
    /// Creates a new grid cell coordinate.
    #[must_use]
    pub const fn new(x: i32, y: i32) -> Self {
        Self { x, y }
    }

    /// Zero-based column index of the cell.
    #[must_use]
    pub const fn x(&self) -> i32 {
        self.x
    }

    /// Zero-based row index of the cell.
    #[must_use]
    pub const fn y(&self) -> i32 {
        self.y
    }

    /// Returns the coordinate shifted by the provided offset, if representable.
    #[must_use]
    pub fn offset(self, dx: i32, dy: i32) -> Option<CellCoord> {
        Some(Self::new(self.x.checked_add(dx)?, self.y.checked_add(dy)?))
    }

    /// Iterates over the eight Moore neighbours, including out-of-range ones.
    pub fn moore_neighbors(self) -> impl Iterator<Item = CellCoord> {
        MOORE_OFFSETS
            .into_iter()
            .filter_map(move |(dx, dy)| self.offset(dx, dy))
    }

    /// Reports whether `other` is one of the eight Moore neighbours.
    #[must_use]
    pub fn is_adjacent(self, other: CellCoord) -> bool {
        let dx = self.x.abs_diff(other.x);
        let dy = self.y.abs_diff(other.y);
        dx <= 1 && dy <= 1 && (dx, dy) != (0, 0)
    }

    /// Octile distance using [`STRAIGHT_STEP_COST`] and [`DIAGONAL_STEP_COST`].
    ///
    /// This is the exact shortest travel cost between two cells on an
    /// obstacle-free 8-connected lattice.
    #[must_use]
    pub fn octile_distance(self, other: CellCoord) -> u64 {
        let dx = u64::from(self.x.abs_diff(other.x));
        let dy = u64::from(self.y.abs_diff(other.y));
        let diagonal = dx.min(dy);
        let straight = dx.max(dy) - diagonal;
        DIAGONAL_STEP_COST * diagonal + STRAIGHT_STEP_COST * straight
    }

    /// Cost of a single step towards an adjacent cell.
    #[must_use]
    pub fn step_cost(self, other: CellCoord) -> u64 {
        if self.x != other.x && self.y != other.y {
            DIAGONAL_STEP_COST
        } else {
            STRAIGHT_STEP_COST
        }
    }
}

impl fmt::Display for CellCoord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({}, {})", self.x, self.y)
    }
}

/// Opaque identifier of an external entity occupying a cell.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct OccupantId(u64);

impl OccupantId {
    /// Creates a new occupant identifier with the provided numeric value.
    #[must_use]
    pub const fn new(value: u64) -> Self {
        Self(value)
    }

    /// Retrieves the numeric representation of the identifier.
    #[must_use]
    pub const fn get(&self) -> u64 {
        self.0
    }
}

/// Bit mask naming the collision categories a probe reacts to.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CollisionFilter(u32);

impl CollisionFilter {
    /// Filter that matches nothing.
    pub const NONE: Self = Self(0);

    /// Filter that matches every category.
    pub const ALL: Self = Self(u32::MAX);

    /// Creates a filter from raw category bits.
    #[must_use]
    pub const fn from_bits(bits: u32) -> Self {
        Self(bits)
    }

    /// Raw category bits of the filter.
    #[must_use]
    pub const fn bits(&self) -> u32 {
        self.0
    }

    /// Combines two filters into one matching either set of categories.
    #[must_use]
    pub const fn union(self, other: Self) -> Self {
        Self(self.0 | other.0)
    }

    /// Reports whether the two filters share at least one category.
    #[must_use]
    pub const fn intersects(self, other: Self) -> bool {
        self.0 & other.0 != 0
    }

    /// Reports whether the filter matches no category at all.
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.0 == 0
    }
}

/// Geometry of the lattice: cell counts, cell size and world anchor.
///
/// The grid lies on the world XZ plane. Grid `x` follows world X and grid `y`
/// follows world Z; the world Y component of every derived position is taken
/// from the origin.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct GridLayout {
    width: u32,
    height: u32,
    cell_width: f32,
    cell_height: f32,
    origin: Vec3,
}

impl GridLayout {
    /// Validates and creates a layout.
    ///
    /// # Errors
    ///
    /// Returns [`GridError::InvalidDimensions`] when either cell count is zero
    /// or the total cell count does not fit in memory indices, and
    /// [`GridError::InvalidCellSize`] when a cell dimension is not a finite,
    /// strictly positive number.
    pub fn new(
        width: u32,
        height: u32,
        cell_width: f32,
        cell_height: f32,
        origin: Vec3,
    ) -> Result<Self, GridError> {
        let max_axis = u32::try_from(i32::MAX).unwrap_or(u32::MAX);
        let fits = usize::try_from(u64::from(width) * u64::from(height)).is_ok();
        if width == 0 || height == 0 || width > max_axis || height > max_axis || !fits {
            return Err(GridError::InvalidDimensions { width, height });
        }

        let valid = |value: f32| value.is_finite() && value > 0.0;
        if !valid(cell_width) || !valid(cell_height) {
            return Err(GridError::InvalidCellSize {
                cell_width,
                cell_height,
            });
        }

        Ok(Self {
            width,
            height,
            cell_width,
            cell_height,
            origin,
        })
    }

    /// Number of cells along the x axis.
    #[must_use]
    pub const fn width(&self) -> u32 {
        self.width
    }

    /// Number of cells along the y axis.
    #[must_use]
    pub const fn height(&self) -> u32 {
        self.height
    }

    /// Width and height packed together.
    #[must_use]
    pub const fn dimensions(&self) -> (u32, u32) {
        (self.width, self.height)
    }

    /// World-space extent of one cell along world X.
    #[must_use]
    pub const fn cell_width(&self) -> f32 {
        self.cell_width
    }

    /// World-space extent of one cell along world Z.
    #[must_use]
    pub const fn cell_height(&self) -> f32 {
        self.cell_height
    }

    /// World anchor of cell `(0, 0)`.
    #[must_use]
    pub const fn origin(&self) -> Vec3 {
        self.origin
    }

    /// Total number of cells in the lattice.
    #[must_use]
    pub fn cell_count(&self) -> usize {
        cell_count(self.width, self.height)
    }

    /// Reports whether the coordinate addresses a cell of this lattice.
    #[must_use]
    pub fn is_within_bounds(&self, coord: CellCoord) -> bool {
        within_bounds(self.width, self.height, coord)
    }

    /// Row-major index of the coordinate, if within bounds.
    #[must_use]
    pub fn index_of(&self, coord: CellCoord) -> Option<usize> {
        index_of(self.width, self.height, coord)
    }

    /// Coordinate stored at the provided row-major index.
    #[must_use]
    pub fn coord_of(&self, index: usize) -> CellCoord {
        coord_of(self.width, index)
    }

    /// Iterates every coordinate in row-major enumeration order.
    pub fn coords(&self) -> impl Iterator<Item = CellCoord> {
        let width = self.width;
        (0..self.cell_count()).map(move |index| coord_of(width, index))
    }

    /// Converts a world position to the coordinate of the cell containing it.
    ///
    /// No bounds are enforced: the result may lie outside the lattice. A NaN
    /// component maps to `i32::MIN`, which no lattice contains.
    #[must_use]
    pub fn cell_coordinate_of(&self, world_position: Vec3) -> CellCoord {
        let offset = world_position - self.origin;
        let axis = |value: f32| {
            if value.is_nan() {
                i32::MIN
            } else {
                value.floor() as i32
            }
        };
        CellCoord::new(
            axis(offset.x / self.cell_width),
            axis(offset.z / self.cell_height),
        )
    }

    /// World position of the cell's minimum corner.
    #[must_use]
    pub fn world_origin_of(&self, coord: CellCoord) -> Vec3 {
        self.origin
            + Vec3::new(
                coord.x() as f32 * self.cell_width,
                0.0,
                coord.y() as f32 * self.cell_height,
            )
    }

    /// World position of the cell's center.
    #[must_use]
    pub fn world_center_of(&self, coord: CellCoord) -> Vec3 {
        self.world_origin_of(coord)
            + Vec3::new(self.cell_width * 0.5, 0.0, self.cell_height * 0.5)
    }

    /// Reports whether the coordinate lies on the outer ring of the lattice.
    #[must_use]
    pub fn is_boundary(&self, coord: CellCoord) -> bool {
        is_boundary(self.width, self.height, coord)
    }
}

/// Errors reported by grid operations.
#[derive(Clone, Copy, Debug, PartialEq, Error)]
pub enum GridError {
    /// The coordinate does not address a cell of the lattice.
    #[error("cell {coord} lies outside the {width}x{height} grid")]
    OutOfBounds {
        /// Coordinate that was requested.
        coord: CellCoord,
        /// Width of the lattice the request targeted.
        width: u32,
        /// Height of the lattice the request targeted.
        height: u32,
    },
    /// The requested cell counts cannot form a lattice.
    #[error("grid dimensions {width}x{height} are invalid")]
    InvalidDimensions {
        /// Requested number of columns.
        width: u32,
        /// Requested number of rows.
        height: u32,
    },
    /// The requested cell size is not a finite positive extent.
    #[error("cell size {cell_width}x{cell_height} must be finite and positive")]
    InvalidCellSize {
        /// Requested cell extent along world X.
        cell_width: f32,
        /// Requested cell extent along world Z.
        cell_height: f32,
    },
    /// Per-cell data was produced for a lattice of different dimensions.
    #[error(
        "expected data for a {}x{} grid, received {}x{}",
        .expected.0,
        .expected.1,
        .actual.0,
        .actual.1
    )]
    DimensionMismatch {
        /// Dimensions of the grid receiving the data.
        expected: (u32, u32),
        /// Dimensions the data was produced for.
        actual: (u32, u32),
    },
    /// A per-cell buffer does not hold exactly one entry per cell.
    #[error("expected {expected} per-cell entries, received {actual}")]
    CellCountMismatch {
        /// Number of cells in the lattice.
        expected: usize,
        /// Number of entries supplied.
        actual: usize,
    },
    /// Walkability changed and derived edge flags have not been recomputed.
    #[error("edge classification is stale; reclassify before searching")]
    StaleClassification,
}

/// Probe classification of a single cell produced by one sampling refresh.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct CellSample {
    /// Whether agents may stand on the cell.
    pub walkable: bool,
    /// Whether spawning on the cell is forbidden.
    pub spawn_blocked: bool,
    /// Whether enemies may be spawned on the cell.
    pub enemy_spawnable: bool,
    /// Whether the probe for this cell failed and the sample is a fallback.
    pub probe_failed: bool,
}

impl CellSample {
    /// Fallback sample recorded when a probe could not be evaluated.
    pub const FAILED: Self = Self {
        walkable: false,
        spawn_blocked: false,
        enemy_spawnable: false,
        probe_failed: true,
    };
}

/// Result of one sampling refresh, one sample per cell in row-major order.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Survey {
    width: u32,
    height: u32,
    samples: Vec<CellSample>,
}

impl Survey {
    /// Wraps samples gathered for a lattice of the provided dimensions.
    ///
    /// # Errors
    ///
    /// Returns [`GridError::CellCountMismatch`] when the sample count differs
    /// from `width * height`.
    pub fn new(width: u32, height: u32, samples: Vec<CellSample>) -> Result<Self, GridError> {
        ensure_len(width, height, samples.len())?;
        Ok(Self {
            width,
            height,
            samples,
        })
    }

    /// Dimensions of the lattice the survey was taken for.
    #[must_use]
    pub const fn dimensions(&self) -> (u32, u32) {
        (self.width, self.height)
    }

    /// Samples in row-major enumeration order.
    #[must_use]
    pub fn samples(&self) -> &[CellSample] {
        &self.samples
    }

    /// Number of probes that failed during the refresh.
    #[must_use]
    pub fn failed_probes(&self) -> usize {
        self.samples.iter().filter(|sample| sample.probe_failed).count()
    }

    /// Number of cells classified as walkable.
    #[must_use]
    pub fn walkable_count(&self) -> usize {
        self.samples.iter().filter(|sample| sample.walkable).count()
    }
}

/// Derived boundary flags of a single cell.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct EdgeFlags {
    /// At least one Moore neighbour is out of bounds or not walkable.
    pub walkable_edge: bool,
    /// The cell lies on the outer ring of the lattice.
    pub grid_edge: bool,
}

/// Derived flags for every cell, in row-major order.
///
/// The classification carries the walkability revision of the snapshot it was
/// computed from; the world refuses it once walkability moved on.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct EdgeClassification {
    width: u32,
    height: u32,
    revision: u64,
    flags: Vec<EdgeFlags>,
}

impl EdgeClassification {
    /// Wraps flags computed for a lattice of the provided dimensions.
    ///
    /// # Errors
    ///
    /// Returns [`GridError::CellCountMismatch`] when the flag count differs
    /// from `width * height`.
    pub fn new(width: u32, height: u32, flags: Vec<EdgeFlags>) -> Result<Self, GridError> {
        ensure_len(width, height, flags.len())?;
        Ok(Self {
            width,
            height,
            revision: 0,
            flags,
        })
    }

    /// Tags the flags with the walkability revision they were derived from.
    #[must_use]
    pub fn with_revision(mut self, revision: u64) -> Self {
        self.revision = revision;
        self
    }

    /// Dimensions of the lattice the flags were computed for.
    #[must_use]
    pub const fn dimensions(&self) -> (u32, u32) {
        (self.width, self.height)
    }

    /// Walkability revision the flags were derived from.
    #[must_use]
    pub const fn revision(&self) -> u64 {
        self.revision
    }

    /// Flags in row-major enumeration order.
    #[must_use]
    pub fn flags(&self) -> &[EdgeFlags] {
        &self.flags
    }

    /// Flags recorded for the provided coordinate, if within bounds.
    #[must_use]
    pub fn flags_at(&self, coord: CellCoord) -> Option<EdgeFlags> {
        index_of(self.width, self.height, coord).and_then(|index| self.flags.get(index).copied())
    }
}

/// Immutable copy of the lattice's walkability used by classification and search.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct GridSnapshot {
    width: u32,
    height: u32,
    revision: u64,
    walkable: Vec<bool>,
}

impl GridSnapshot {
    /// Captures walkability for a lattice of the provided dimensions.
    ///
    /// # Errors
    ///
    /// Returns [`GridError::InvalidDimensions`] for an empty lattice and
    /// [`GridError::CellCountMismatch`] when the flag count differs from
    /// `width * height`.
    pub fn new(width: u32, height: u32, walkable: Vec<bool>) -> Result<Self, GridError> {
        if width == 0 || height == 0 {
            return Err(GridError::InvalidDimensions { width, height });
        }
        ensure_len(width, height, walkable.len())?;
        Ok(Self {
            width,
            height,
            revision: 0,
            walkable,
        })
    }

    /// Tags the snapshot with the walkability revision it was captured at.
    #[must_use]
    pub fn with_revision(mut self, revision: u64) -> Self {
        self.revision = revision;
        self
    }

    /// Builds a snapshot from rows of `'#'` (blocked) and any other character (open).
    ///
    /// The first string is row `y = 0`. Handy for tests and fixtures.
    ///
    /// # Errors
    ///
    /// Returns [`GridError::CellCountMismatch`] when a row differs in length
    /// from the first one and [`GridError::InvalidDimensions`] when no cells
    /// are described.
    pub fn from_rows(rows: &[&str]) -> Result<Self, GridError> {
        let height = u32::try_from(rows.len()).unwrap_or(u32::MAX);
        let row_len = rows.first().map_or(0, |row| row.chars().count());
        if let Some(ragged) = rows.iter().find(|row| row.chars().count() != row_len) {
            return Err(GridError::CellCountMismatch {
                expected: row_len,
                actual: ragged.chars().count(),
            });
        }
        let width = u32::try_from(row_len).unwrap_or(u32::MAX);
        let walkable: Vec<bool> = rows
            .iter()
            .flat_map(|row| row.chars().map(|symbol| symbol != '#'))
            .collect();
        Self::new(width, height, walkable)
    }

    /// Number of cells along the x axis.
    #[must_use]
    pub const fn width(&self) -> u32 {
        self.width
    }

    /// Number of cells along the y axis.
    #[must_use]
    pub const fn height(&self) -> u32 {
        self.height
    }

    /// Width and height packed together.
    #[must_use]
    pub const fn dimensions(&self) -> (u32, u32) {
        (self.width, self.height)
    }

    /// Walkability revision of the grid the snapshot was captured from.
    #[must_use]
    pub const fn revision(&self) -> u64 {
        self.revision
    }

    /// Total number of cells captured.
    #[must_use]
    pub fn cell_count(&self) -> usize {
        self.walkable.len()
    }

    /// Reports whether the coordinate addresses a captured cell.
    #[must_use]
    pub fn is_within_bounds(&self, coord: CellCoord) -> bool {
        within_bounds(self.width, self.height, coord)
    }

    /// Row-major index of the coordinate, if within bounds.
    #[must_use]
    pub fn index_of(&self, coord: CellCoord) -> Option<usize> {
        index_of(self.width, self.height, coord)
    }

    /// Coordinate stored at the provided row-major index.
    #[must_use]
    pub fn coord_of(&self, index: usize) -> CellCoord {
        coord_of(self.width, index)
    }

    /// Walkability of the cell; out-of-range coordinates are never walkable.
    #[must_use]
    pub fn is_walkable(&self, coord: CellCoord) -> bool {
        self.index_of(coord)
            .and_then(|index| self.walkable.get(index).copied())
            .unwrap_or(false)
    }

    /// Walkability flags in row-major order.
    #[must_use]
    pub fn cells(&self) -> &[bool] {
        &self.walkable
    }

    /// Checks that a coordinate is within bounds, reporting it otherwise.
    ///
    /// # Errors
    ///
    /// Returns [`GridError::OutOfBounds`] for coordinates outside the lattice.
    pub fn ensure_within_bounds(&self, coord: CellCoord) -> Result<usize, GridError> {
        self.index_of(coord).ok_or(GridError::OutOfBounds {
            coord,
            width: self.width,
            height: self.height,
        })
    }
}

/// Commands that express all permissible grid mutations.
#[derive(Clone, Debug, PartialEq)]
pub enum Command {
    /// Writes the walkability and spawn flags gathered by a sampling refresh.
    ApplySurvey {
        /// Samples for every cell in row-major order.
        survey: Survey,
    },
    /// Writes recomputed walkable-edge and grid-edge flags.
    ApplyEdgeClassification {
        /// Flags for every cell in row-major order.
        classification: EdgeClassification,
    },
    /// Records that an external entity occupies the cell.
    SetOccupier {
        /// Cell being occupied.
        cell: CellCoord,
        /// Entity occupying the cell.
        occupant: OccupantId,
    },
    /// Removes any occupier recorded for the cell.
    ClearOccupier {
        /// Cell being vacated.
        cell: CellCoord,
    },
}

/// Events broadcast by the world after processing commands.
#[derive(Clone, Debug, PartialEq)]
pub enum Event {
    /// Confirms that a survey was written to the grid.
    SurveyApplied {
        /// Number of walkable cells after the update.
        walkable: usize,
        /// Number of cells whose walkability flipped.
        changed: usize,
        /// Number of samples that came from failed probes.
        failed_probes: usize,
    },
    /// Reports that a survey could not be applied.
    SurveyRejected {
        /// Specific reason the survey was refused.
        reason: GridError,
    },
    /// Confirms that derived edge flags were rewritten.
    EdgesReclassified {
        /// Number of cells flagged as walkable edges.
        walkable_edges: usize,
        /// Number of cells flagged as grid edges.
        grid_edges: usize,
    },
    /// Reports that an edge classification could not be applied.
    ClassificationRejected {
        /// Specific reason the classification was refused.
        reason: GridError,
    },
    /// Confirms that an occupier was recorded for a cell.
    OccupierSet {
        /// Cell that became occupied.
        cell: CellCoord,
        /// Entity now occupying the cell.
        occupant: OccupantId,
        /// Entity that occupied the cell before, if any.
        previous: Option<OccupantId>,
    },
    /// Confirms that a cell's occupier was cleared.
    OccupierCleared {
        /// Cell that was vacated.
        cell: CellCoord,
        /// Entity that occupied the cell before, if any.
        previous: Option<OccupantId>,
    },
    /// Reports that an occupancy change was refused.
    OccupancyRejected {
        /// Cell named by the rejected command.
        cell: CellCoord,
        /// Specific reason the change failed.
        reason: GridError,
    },
}

/// Cooperative cancellation flag shared between a caller and running work.
///
/// Cloning the token shares the flag. Work that observes a cancelled token
/// stops at its next checkpoint and drops its scratch state.
#[derive(Clone, Debug, Default)]
pub struct CancelToken {
    cancelled: Arc<AtomicBool>,
}

impl CancelToken {
    /// Creates a token that has not been cancelled.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Requests cancellation of all work observing this token.
    pub fn cancel(&self) {
        self.cancelled.store(true, Ordering::Release);
    }

    /// Reports whether cancellation was requested.
    #[must_use]
    pub fn is_cancelled(&self) -> bool {
        self.cancelled.load(Ordering::Acquire)
    }
}

fn cell_count(width: u32, height: u32) -> usize {
    usize::try_from(u64::from(width) * u64::from(height)).unwrap_or(0)
}

fn within_bounds(width: u32, height: u32, coord: CellCoord) -> bool {
    u32::try_from(coord.x()).map_or(false, |x| x < width)
        && u32::try_from(coord.y()).map_or(false, |y| y < height)
}

fn index_of(width: u32, height: u32, coord: CellCoord) -> Option<usize> {
    if !within_bounds(width, height, coord) {
        return None;
    }
    let x = usize::try_from(coord.x()).ok()?;
    let y = usize::try_from(coord.y()).ok()?;
    let width = usize::try_from(width).ok()?;
    y.checked_mul(width)?.checked_add(x)
}

fn coord_of(width: u32, index: usize) -> CellCoord {
    let width = usize::try_from(width).unwrap_or(usize::MAX).max(1);
    let x = i32::try_from(index % width).unwrap_or(i32::MAX);
    let y = i32::try_from(index / width).unwrap_or(i32::MAX);
    CellCoord::new(x, y)
}

fn is_boundary(width: u32, height: u32, coord: CellCoord) -> bool {
    let last_x = i64::from(width) - 1;
    let last_y = i64::from(height) - 1;
    let x = i64::from(coord.x());
    let y = i64::from(coord.y());
    x == 0 || y == 0 || x == last_x || y == last_y
}

fn ensure_len(width: u32, height: u32, len: usize) -> Result<(), GridError> {
    let expected = cell_count(width, height);
    if expected == len {
        Ok(())
    } else {
        Err(GridError::CellCountMismatch {
            expected,
            actual: len,
        })
    }
}
