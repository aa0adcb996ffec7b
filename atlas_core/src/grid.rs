use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use serde::{Deserialize, Serialize};

use crate::{
    features::Feature,
    geometry::{round_to, Bounds, Point},
};

/// Elevation at or above this value is land.
pub const SEA_LEVEL: u8 = 20;

pub type GridCellId = u32;

#[inline]
pub fn is_land_height(h: u8) -> bool {
    h >= SEA_LEVEL
}

/// Per-point scalar fields of a [`Grid`].
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct GridCells {
    pub h: Vec<u8>,
    pub temp: Vec<i8>,
    pub prec: Vec<u8>,
    /// Feature id per point, filled by feature markup.
    pub f: Vec<u16>,
    /// Signed distance to the coastline in lattice steps (`1` coastal land,
    /// `-1` coastal water).
    pub t: Vec<i8>,
}

/// Spacing and point counts of the lattice laid over some bounds.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LatticeShape {
    pub spacing: f64,
    pub cells_x: usize,
    pub cells_y: usize,
}

impl LatticeShape {
    /// Spacing is `sqrt(area / cells_desired)` rounded to 2 decimals, never
    /// below `0.01`.
    pub fn new(bounds: Bounds, cells_desired: usize) -> Self {
        let spacing = round_to((bounds.area() / cells_desired.max(1) as f64).sqrt(), 2).max(0.01);
        let cells_x = (((bounds.width + 0.5 * spacing - 1e-10) / spacing).floor() as usize).max(1);
        let cells_y = (((bounds.height + 0.5 * spacing - 1e-10) / spacing).floor() as usize).max(1);
        Self {
            spacing,
            cells_x,
            cells_y,
        }
    }

    /// Total lattice points, `None` when the count does not fit in `usize`.
    pub fn points(&self) -> Option<usize> {
        self.cells_x.checked_mul(self.cells_y)
    }
}

/// Jittered square lattice carrying the raw scalar fields.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Grid {
    pub bounds: Bounds,
    pub seed: u64,
    pub spacing: f64,
    pub cells_x: usize,
    pub cells_y: usize,
    pub points: Vec<Point>,
    pub cells: GridCells,
    pub features: Vec<Feature>,
}

impl Grid {
    /// Build a lattice of roughly `cells_desired` points over `bounds`.
    ///
    /// Each point is displaced by up to `jitter * spacing / 2` on both axes
    /// using a generator seeded from `seed`, so the same inputs always
    /// reproduce the same lattice.
    ///
    /// Callers taking sizes from untrusted input should check
    /// [`LatticeShape::points`] first; the point buffer is allocated up front.
    pub fn generate(bounds: Bounds, cells_desired: usize, jitter: f64, seed: u64) -> Self {
        let LatticeShape {
            spacing,
            cells_x,
            cells_y,
        } = LatticeShape::new(bounds, cells_desired);

        let radius = spacing / 2.0;
        let jittering = radius * jitter.clamp(0.0, 1.0);
        let mut rng = ChaCha8Rng::seed_from_u64(seed);
        let mut points = Vec::with_capacity(cells_x * cells_y);
        for row in 0..cells_y {
            for col in 0..cells_x {
                let x = radius + col as f64 * spacing;
                let y = radius + row as f64 * spacing;
                let jx = rng.gen::<f64>() * 2.0 * jittering - jittering;
                let jy = rng.gen::<f64>() * 2.0 * jittering - jittering;
                points.push(Point::new(
                    round_to(x + jx, 2).clamp(0.0, bounds.width),
                    round_to(y + jy, 2).clamp(0.0, bounds.height),
                ));
            }
        }

        let total = points.len();
        Self {
            bounds,
            seed,
            spacing,
            cells_x,
            cells_y,
            points,
            cells: GridCells {
                h: vec![0; total],
                temp: vec![0; total],
                prec: vec![0; total],
                f: vec![0; total],
                t: vec![0; total],
            },
            features: Vec::new(),
        }
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    pub fn is_land(&self, cell: usize) -> bool {
        is_land_height(self.cells.h[cell])
    }

    pub fn is_border(&self, cell: usize) -> bool {
        let col = cell % self.cells_x;
        let row = cell / self.cells_x;
        col == 0 || row == 0 || col + 1 == self.cells_x || row + 1 == self.cells_y
    }

    /// 8-connected lattice neighbours of `cell`.
    pub fn neighbors(&self, cell: usize) -> impl Iterator<Item = usize> + '_ {
        let col = (cell % self.cells_x) as isize;
        let row = (cell / self.cells_x) as isize;
        const OFFSETS: [(isize, isize); 8] = [
            (1, 0),
            (1, -1),
            (0, -1),
            (-1, -1),
            (-1, 0),
            (-1, 1),
            (0, 1),
            (1, 1),
        ];
        OFFSETS.iter().filter_map(move |(dx, dy)| {
            let nx = col + dx;
            let ny = row + dy;
            if nx < 0 || ny < 0 || nx >= self.cells_x as isize || ny >= self.cells_y as isize {
                None
            } else {
                Some(ny as usize * self.cells_x + nx as usize)
            }
        })
    }
}
