//! Per-cell state stored inside the authoritative grid.

use walkgrid_core::{CellCoord, CellSample, EdgeFlags, OccupantId, UNIFORM_WALK_WEIGHT};

/// One lattice unit of the grid.
///
/// A cell only knows its own coordinate. World-space positions are derived by
/// the owning [`crate::Grid`] from its layout, so cells never point back at
/// the grid that stores them.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Cell {
    coord: CellCoord,
    walk_weight: u32,
    walkable: bool,
    walkable_edge: bool,
    grid_edge: bool,
    spawn_blocked: bool,
    enemy_spawnable: bool,
    occupier: Option<OccupantId>,
}

impl Cell {
    pub(crate) fn new(coord: CellCoord) -> Self {
        Self {
            coord,
            walk_weight: UNIFORM_WALK_WEIGHT,
            walkable: true,
            walkable_edge: false,
            grid_edge: false,
            spawn_blocked: false,
            enemy_spawnable: false,
            occupier: None,
        }
    }

    /// Lattice coordinate of the cell, fixed for its lifetime.
    #[must_use]
    pub const fn coord(&self) -> CellCoord {
        self.coord
    }

    /// Traversal cost multiplier of the cell.
    #[must_use]
    pub const fn walk_weight(&self) -> u32 {
        self.walk_weight
    }

    /// Whether agents may stand on the cell.
    #[must_use]
    pub const fn is_walkable(&self) -> bool {
        self.walkable
    }

    /// Whether at least one Moore neighbour is out of bounds or not walkable.
    #[must_use]
    pub const fn is_walkable_edge(&self) -> bool {
        self.walkable_edge
    }

    /// Whether the cell lies on the outer ring of the lattice.
    #[must_use]
    pub const fn is_grid_edge(&self) -> bool {
        self.grid_edge
    }

    /// Whether spawning on the cell is forbidden.
    #[must_use]
    pub const fn is_spawn_blocked(&self) -> bool {
        self.spawn_blocked
    }

    /// Whether enemies may be spawned on the cell.
    #[must_use]
    pub const fn is_enemy_spawnable(&self) -> bool {
        self.enemy_spawnable
    }

    /// Entity currently occupying the cell, if any.
    #[must_use]
    pub const fn occupier(&self) -> Option<OccupantId> {
        self.occupier
    }

    /// Whether an entity currently occupies the cell.
    #[must_use]
    pub const fn is_occupied(&self) -> bool {
        self.occupier.is_some()
    }

    /// Writes sampled flags, reporting whether walkability flipped.
    pub(crate) fn apply_sample(&mut self, sample: CellSample) -> bool {
        let changed = self.walkable != sample.walkable;
        self.walkable = sample.walkable;
        self.spawn_blocked = sample.spawn_blocked;
        self.enemy_spawnable = sample.enemy_spawnable;
        changed
    }

    pub(crate) fn apply_edges(&mut self, flags: EdgeFlags) {
        self.walkable_edge = flags.walkable_edge;
        self.grid_edge = flags.grid_edge;
    }

    pub(crate) fn replace_occupier(&mut self, occupier: Option<OccupantId>) -> Option<OccupantId> {
        std::mem::replace(&mut self.occupier, occupier)
    }
}
