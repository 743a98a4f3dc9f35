//! Plain-text rendering of the classified grid.

use walkgrid_core::CellCoord;
use walkgrid_world::{Cell, Grid};

/// Renders one character per cell, row `y = 0` first.
///
/// Legend: `#` not walkable, `*` highlighted route cell, `O` occupied,
/// `B` grid edge or spawn blocked, `E` walkable edge or enemy spawnable,
/// `.` interior walkable.
pub(crate) fn render_grid(grid: &Grid, highlighted: &[CellCoord]) -> String {
    let width = usize::try_from(grid.width()).unwrap_or(1).max(1);
    let mut output = String::with_capacity(grid.cells().len() + grid.cells().len() / width);
    for row in grid.cells().chunks(width) {
        output.extend(row.iter().map(|cell| symbol(cell, highlighted)));
        output.push('\n');
    }
    output
}

fn symbol(cell: &Cell, highlighted: &[CellCoord]) -> char {
    if !cell.is_walkable() {
        '#'
    } else if highlighted.contains(&cell.coord()) {
        '*'
    } else if cell.is_occupied() {
        'O'
    } else if cell.is_grid_edge() || cell.is_spawn_blocked() {
        'B'
    } else if cell.is_walkable_edge() || cell.is_enemy_spawnable() {
        'E'
    } else {
        '.'
    }
}
