use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::{
    entities::{
        Burg, Culture, Entity, EntityList, Marker, Province, Religion, River, Route, State, Zone,
    },
    geometry::Bounds,
    grid::Grid,
    pack::Pack,
};

/// Overlay entity collections of a map.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Overlays {
    pub cultures: EntityList<Culture>,
    pub states: EntityList<State>,
    pub provinces: EntityList<Province>,
    pub religions: EntityList<Religion>,
    pub burgs: EntityList<Burg>,
    pub rivers: EntityList<River>,
    pub routes: EntityList<Route>,
    pub markers: Vec<Marker>,
    pub zones: Vec<Zone>,
}

/// A complete map: lattice, cell graph and overlays.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Map {
    pub bounds: Bounds,
    pub seed: u64,
    pub grid: Grid,
    pub pack: Pack,
    #[serde(default)]
    pub overlays: Overlays,
}

#[derive(Debug, Error, PartialEq)]
pub enum MapValidationError {
    #[error("map has no cells")]
    Empty,
    #[error("map extent {width}x{height} is degenerate")]
    DegenerateBounds { width: f64, height: f64 },
    #[error("cell array `{field}` has {actual} entries, expected {expected}")]
    LengthMismatch {
        field: &'static str,
        expected: usize,
        actual: usize,
    },
    #[error("cell {cell} references grid point {grid} outside a grid of {len} points")]
    DanglingGridReference { cell: usize, grid: u32, len: usize },
    #[error("cell {cell} lists neighbour {neighbor} outside the graph")]
    DanglingNeighbor { cell: usize, neighbor: u32 },
    #[error("{collection} slot {slot} holds entity {index}")]
    MisplacedEntity {
        collection: &'static str,
        slot: usize,
        index: u16,
    },
}

impl Map {
    /// Structural checks the resampler relies on.
    pub fn validate(&self) -> Result<(), MapValidationError> {
        if !(self.bounds.width > 0.0 && self.bounds.height > 0.0) {
            return Err(MapValidationError::DegenerateBounds {
                width: self.bounds.width,
                height: self.bounds.height,
            });
        }
        let cells = &self.pack.cells;
        if cells.is_empty() || self.grid.is_empty() {
            return Err(MapValidationError::Empty);
        }

        let expected = cells.len();
        let lengths = [
            ("g", cells.g.len()),
            ("c", cells.c.len()),
            ("area", cells.area.len()),
            ("b", cells.b.len()),
            ("h", cells.h.len()),
            ("culture", cells.culture.len()),
            ("state", cells.state.len()),
            ("province", cells.province.len()),
            ("religion", cells.religion.len()),
            ("burg", cells.burg.len()),
            ("r", cells.r.len()),
            ("f", cells.f.len()),
            ("biome", cells.biome.len()),
            ("fl", cells.fl.len()),
            ("s", cells.s.len()),
            ("pop", cells.pop.len()),
        ];
        for (field, actual) in lengths {
            if actual != expected {
                return Err(MapValidationError::LengthMismatch {
                    field,
                    expected,
                    actual,
                });
            }
        }

        let grid_len = self.grid.len();
        let grid_lengths = [
            ("grid.h", self.grid.cells.h.len()),
            ("grid.temp", self.grid.cells.temp.len()),
            ("grid.prec", self.grid.cells.prec.len()),
        ];
        for (field, actual) in grid_lengths {
            if actual != grid_len {
                return Err(MapValidationError::LengthMismatch {
                    field,
                    expected: grid_len,
                    actual,
                });
            }
        }

        if let Some((cell, &grid)) = cells
            .g
            .iter()
            .enumerate()
            .find(|&(_, &g)| g as usize >= grid_len)
        {
            return Err(MapValidationError::DanglingGridReference {
                cell,
                grid,
                len: grid_len,
            });
        }
        for (cell, neighbors) in cells.c.iter().enumerate() {
            if let Some(&neighbor) = neighbors.iter().find(|&&n| n as usize >= expected) {
                return Err(MapValidationError::DanglingNeighbor { cell, neighbor });
            }
        }

        let overlays = &self.overlays;
        check_slots("cultures", &overlays.cultures)?;
        check_slots("states", &overlays.states)?;
        check_slots("provinces", &overlays.provinces)?;
        check_slots("religions", &overlays.religions)?;
        check_slots("burgs", &overlays.burgs)?;
        check_slots("rivers", &overlays.rivers)?;
        check_slots("routes", &overlays.routes)?;
        Ok(())
    }
}

fn check_slots<T: Entity>(
    collection: &'static str,
    list: &EntityList<T>,
) -> Result<(), MapValidationError> {
    match list.misplaced() {
        Some((slot, index)) => Err(MapValidationError::MisplacedEntity {
            collection,
            slot,
            index,
        }),
        None => Ok(()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::restore::test_support::lattice_map;

    #[test]
    fn fresh_lattice_map_is_valid() {
        assert_eq!(lattice_map(3, |_| true).validate(), Ok(()));
    }

    #[test]
    fn short_overlay_array_is_reported() {
        let mut map = lattice_map(3, |_| true);
        map.pack.cells.religion.pop();
        assert_eq!(
            map.validate(),
            Err(MapValidationError::LengthMismatch {
                field: "religion",
                expected: 9,
                actual: 8,
            })
        );
    }

    #[test]
    fn dangling_neighbour_is_reported() {
        let mut map = lattice_map(2, |_| true);
        map.pack.cells.c[1].push(12);
        assert_eq!(
            map.validate(),
            Err(MapValidationError::DanglingNeighbor {
                cell: 1,
                neighbor: 12,
            })
        );
    }
}
