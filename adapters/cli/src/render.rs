//! Plain-text drawing of a grid with a path overlaid.

use std::collections::HashSet;

use waypath_core::CellCoord;
use waypath_grid::Grid;
use waypath_system_pathing::Path;

/// Draws one character per cell: `S`/`G` for the markers, `*` along the
/// path, `#` where terrain and filter together block the cell, the weight
/// digit for weights 2 to 9, `+` for heavier cells and `.` otherwise.
pub(crate) fn render(terrain: &Grid, filter: &Grid, path: Option<&Path>) -> String {
    let on_path: HashSet<CellCoord> = path.map(|path| path.cells().collect()).unwrap_or_default();
    let mut out = String::with_capacity(terrain.len() + terrain.rows());

    for node in terrain.iter() {
        let cell = node.coord();
        let glyph = if terrain.start() == Some(cell) {
            'S'
        } else if terrain.goal() == Some(cell) {
            'G'
        } else if on_path.contains(&cell) {
            '*'
        } else if !terrain.is_passable_with(cell, filter).unwrap_or(false) {
            '#'
        } else {
            match node.weight() {
                0 | 1 => '.',
                weight @ 2..=9 => char::from_digit(weight, 10).unwrap_or('+'),
                _ => '+',
            }
        };
        out.push(glyph);
        if cell.x() as usize + 1 == terrain.columns() {
            out.push('\n');
        }
    }

    out
}
