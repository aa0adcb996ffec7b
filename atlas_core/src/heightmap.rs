//! Filters applied to the freshly sampled elevation field.

use crate::{
    grid::{is_land_height, Grid, SEA_LEVEL},
    map::Map,
    projection::Projection,
};

/// Replace each elevation with the mean of itself and its lattice
/// neighbours without moving any point across sea level: water stays at or
/// below `SEA_LEVEL - 1`, land at or above `SEA_LEVEL`.
///
/// Means are taken over the unsmoothed field.
pub fn smooth_heightmap(grid: &mut Grid) {
    let source = &grid.cells.h;
    let smoothed: Vec<u8> = (0..grid.len())
        .map(|cell| {
            let own = source[cell];
            let (sum, count) = grid
                .neighbors(cell)
                .fold((own as u32, 1u32), |(sum, count), n| {
                    (sum + source[n] as u32, count + 1)
                });
            let mean = (sum / count) as u8;
            if is_land_height(own) {
                mean.max(SEA_LEVEL)
            } else {
                mean.min(SEA_LEVEL - 1)
            }
        })
        .collect();
    grid.cells.h = smoothed;
}

/// Lower by one every land point above sea level whose nearest parent cell
/// carried a river, keeping resampled riverbeds below their banks.
///
/// Returns how many points were lowered.
pub fn depress_rivers(grid: &mut Grid, parent: &Map, projection: &dyn Projection) -> usize {
    let index = parent.pack.cell_index();
    let mut lowered = 0;
    for (point_idx, &point) in grid.points.iter().enumerate() {
        let height = grid.cells.h[point_idx];
        if height <= SEA_LEVEL {
            continue;
        }
        let Some(parent_cell) = index.nearest_payload(projection.inverse(point)) else {
            continue;
        };
        if parent.pack.cells.r[parent_cell as usize] != 0 {
            grid.cells.h[point_idx] = height - 1;
            lowered += 1;
        }
    }
    lowered
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geometry::Bounds;

    fn flat_grid(h: Vec<u8>) -> Grid {
        let mut grid = Grid::generate(Bounds::new(30.0, 30.0), 9, 0.0, 1);
        assert_eq!(grid.len(), h.len());
        grid.cells.h = h;
        grid
    }

    #[test]
    fn smoothing_keeps_lone_island_above_sea_level() {
        let mut grid = flat_grid(vec![10, 10, 10, 10, 21, 10, 10, 10, 10]);
        smooth_heightmap(&mut grid);
        assert_eq!(grid.cells.h[4], SEA_LEVEL);
        assert!(grid.cells.h.iter().enumerate().all(|(i, &h)| i == 4 || h < SEA_LEVEL));
    }

    #[test]
    fn smoothing_keeps_lake_below_sea_level() {
        let mut grid = flat_grid(vec![60, 60, 60, 60, 5, 60, 60, 60, 60]);
        smooth_heightmap(&mut grid);
        assert_eq!(grid.cells.h[4], SEA_LEVEL - 1);
        // corner: (60 * 3 + 5) / 4
        assert_eq!(grid.cells.h[0], 46);
    }

    #[test]
    fn river_cells_are_lowered_once() {
        use crate::{projection::IdentityProjection, restore::test_support::lattice_map};

        let mut parent = lattice_map(3, |cell| cell != 8);
        parent.pack.cells.r[4] = 1;
        parent.pack.cells.r[8] = 1;
        parent.pack.cells.r[2] = 1;
        let mut grid = parent.grid.clone();
        grid.cells.h[4] = 40;
        grid.cells.h[2] = SEA_LEVEL;

        let lowered = depress_rivers(&mut grid, &parent, &IdentityProjection);
        assert_eq!(lowered, 1);
        assert_eq!(grid.cells.h[4], 39);
        assert_eq!(grid.cells.h[8], 5);
        // A riverbed already at sea level would turn into water.
        assert_eq!(grid.cells.h[2], SEA_LEVEL);
    }
}
