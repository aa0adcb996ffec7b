use crate::{grid::Grid, map::Map, projection::Projection};

/// Copy elevation, temperature and precipitation onto every point of the
/// new lattice from the parent grid point behind the nearest parent cell.
pub fn sample_primary_fields(grid: &mut Grid, parent: &Map, projection: &dyn Projection) {
    let index = parent.pack.cell_index();
    let parent_cells = &parent.pack.cells;
    let parent_grid = &parent.grid.cells;

    for (point_idx, &point) in grid.points.iter().enumerate() {
        let source = projection.inverse(point);
        let Some(parent_cell) = index.nearest_payload(source) else {
            continue;
        };
        let parent_point = parent_cells.g[parent_cell as usize] as usize;
        grid.cells.h[point_idx] = parent_grid.h[parent_point];
        grid.cells.temp[point_idx] = parent_grid.temp[parent_point];
        grid.cells.prec[point_idx] = parent_grid.prec[parent_point];
    }

    tracing::debug!(
        target: "atlas::resample",
        points = grid.len(),
        parent_cells = index.len(),
        "resample.fields.sampled"
    );
}
