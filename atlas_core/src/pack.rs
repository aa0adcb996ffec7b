use serde::{Deserialize, Serialize};

use crate::{
    features::Feature,
    geometry::Point,
    grid::{is_land_height, GridCellId},
    spatial::SpatialIndex,
};

pub type CellId = u32;

/// Per-cell arrays of the polygonal cell graph.
///
/// Overlay ids (`culture`, `state`, `province`, `religion`, `burg`, `r`)
/// use `0` for "none".
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PackCells {
    pub p: Vec<Point>,
    pub g: Vec<GridCellId>,
    pub c: Vec<Vec<CellId>>,
    pub area: Vec<f64>,
    /// Cell touches the map edge.
    pub b: Vec<bool>,
    pub h: Vec<u8>,
    pub f: Vec<u16>,
    pub t: Vec<i8>,
    pub haven: Vec<Option<CellId>>,
    pub biome: Vec<u8>,
    pub fl: Vec<u16>,
    pub s: Vec<i16>,
    pub pop: Vec<f32>,
    pub culture: Vec<u16>,
    pub state: Vec<u16>,
    pub province: Vec<u16>,
    pub religion: Vec<u16>,
    pub burg: Vec<u16>,
    pub r: Vec<u16>,
    pub conf: Vec<u8>,
}

impl PackCells {
    /// Geometry-only cells; every derived and overlay array is zeroed.
    pub fn from_geometry(
        p: Vec<Point>,
        g: Vec<GridCellId>,
        c: Vec<Vec<CellId>>,
        area: Vec<f64>,
        b: Vec<bool>,
        h: Vec<u8>,
    ) -> Self {
        let len = p.len();
        Self {
            p,
            g,
            c,
            area,
            b,
            h,
            f: vec![0; len],
            t: vec![0; len],
            haven: vec![None; len],
            biome: vec![0; len],
            fl: vec![0; len],
            s: vec![0; len],
            pop: vec![0.0; len],
            culture: vec![0; len],
            state: vec![0; len],
            province: vec![0; len],
            religion: vec![0; len],
            burg: vec![0; len],
            r: vec![0; len],
            conf: vec![0; len],
        }
    }

    pub fn len(&self) -> usize {
        self.p.len()
    }

    pub fn is_empty(&self) -> bool {
        self.p.is_empty()
    }

    pub fn is_land(&self, cell: usize) -> bool {
        is_land_height(self.h[cell])
    }

    pub fn ids(&self) -> impl Iterator<Item = CellId> {
        0..self.len() as CellId
    }
}

/// Cell graph derived from a grid.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Pack {
    pub cells: PackCells,
    pub features: Vec<Feature>,
}

impl Pack {
    pub fn new(cells: PackCells) -> Self {
        Self {
            cells,
            features: Vec::new(),
        }
    }

    /// Index over every cell.
    pub fn cell_index(&self) -> SpatialIndex<CellId> {
        SpatialIndex::build(self.cells.p.iter().copied().zip(self.cells.ids()))
    }

    /// Index restricted to land cells.
    pub fn land_index(&self) -> SpatialIndex<CellId> {
        SpatialIndex::build(
            self.cells
                .p
                .iter()
                .copied()
                .zip(self.cells.ids())
                .filter(|&(_, cell)| self.cells.is_land(cell as usize)),
        )
    }

    pub fn feature(&self, id: u16) -> Option<&Feature> {
        if id == 0 {
            return None;
        }
        self.features.get(id as usize)
    }
}
