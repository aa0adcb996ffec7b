//! Cell graph construction from a lattice.

use crate::{
    grid::{Grid, GridCellId},
    pack::{CellId, PackCells},
};

/// Build one graph cell per lattice point, connected like the lattice.
///
/// Cell `n` is grid point `n`; every cell gets the lattice cell area
/// (`spacing²`) and inherits the point's elevation.
pub fn build_lattice_graph(grid: &Grid) -> PackCells {
    let len = grid.len();
    let area = grid.spacing * grid.spacing;
    let neighbors: Vec<Vec<CellId>> = (0..len)
        .map(|cell| grid.neighbors(cell).map(|n| n as CellId).collect())
        .collect();
    let border: Vec<bool> = (0..len).map(|cell| grid.is_border(cell)).collect();

    PackCells::from_geometry(
        grid.points.clone(),
        (0..len as GridCellId).collect(),
        neighbors,
        vec![area; len],
        border,
        grid.cells.h.clone(),
    )
}
