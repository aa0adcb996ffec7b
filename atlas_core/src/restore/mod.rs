//! Migration of overlays from the parent map onto the rebuilt cell graph.
//!
//! Every function here reads the parent through a [`ResampleContext`] and
//! returns the migrated collection; entities are carried over, recentred or
//! flagged `removed`, never created.

mod burgs;
mod cells;
mod markers;
mod provinces;
mod regions;
mod states;
mod zones;

use std::collections::HashSet;

use crate::entities::{Entity, EntityId, EntityList};

pub use burgs::restore_burgs;
pub use cells::{inherit_biomes, rank_cells, restore_cell_overlays};
pub use markers::restore_markers;
pub use provinces::restore_provinces;
pub use regions::{restore_cultures, restore_religions};
pub use states::restore_states;
pub use zones::restore_zones;

/// Overlay ids that occur on at least one cell.
pub(crate) fn present_ids(values: &[EntityId]) -> HashSet<EntityId> {
    values.iter().copied().filter(|&id| id != 0).collect()
}

/// Clone `parent`, flagging every active entity whose id no longer occurs on
/// any cell.
pub(crate) fn invalidate_missing<T: Entity + Clone>(
    parent: &EntityList<T>,
    present: &HashSet<EntityId>,
    category: &'static str,
) -> EntityList<T> {
    parent
        .iter()
        .map(|entity| {
            let mut entity = entity.clone();
            let id = entity.index();
            if id != 0 && !entity.is_removed() && !present.contains(&id) {
                tracing::debug!(
                    target: "atlas::restore",
                    category,
                    id,
                    "restore.region.vanished"
                );
                entity.mark_removed();
            }
            entity
        })
        .collect()
}

#[cfg(test)]
pub(crate) mod test_support {
    use std::sync::Arc;

    use crate::{
        config::ResampleConfig,
        entities::{Burg, Culture, EntityList, State},
        geometry::Bounds,
        graph::build_lattice_graph,
        grid::Grid,
        map::{Map, Overlays},
        pack::Pack,
    };

    /// `side × side` lattice map without jitter; `land` picks land cells.
    pub fn lattice_map(side: usize, land: impl Fn(usize) -> bool) -> Map {
        let extent = side as f64 * 10.0;
        let bounds = Bounds::new(extent, extent);
        let mut grid = Grid::generate(bounds, side * side, 0.0, 5);
        grid.cells.h = (0..grid.len())
            .map(|cell| if land(cell) { 40 } else { 5 })
            .collect();
        let mut pack = Pack::new(build_lattice_graph(&grid));
        crate::features::markup_pack(&mut pack, 10);
        Map {
            bounds,
            seed: 5,
            grid,
            pack,
            overlays: Overlays {
                cultures: vec![Culture::default()].into_iter().collect(),
                states: vec![State::default()].into_iter().collect(),
                burgs: vec![Burg::default()].into_iter().collect::<EntityList<Burg>>(),
                ..Default::default()
            },
        }
    }

    pub fn config() -> ResampleConfig {
        (*ResampleConfig::builtin()).clone()
    }

    /// Settings matching [`lattice_map`]: no jitter, small continents.
    pub fn flat_config() -> Arc<ResampleConfig> {
        Arc::new(
            ResampleConfig::from_json_str(
                r#"{"lattice": {"jitter": 0.0}, "features": {"continent_min_cells": 10}}"#,
            )
            .expect("flat config"),
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::entities::Culture;

    #[test]
    fn missing_regions_are_flagged() {
        let parent: EntityList<Culture> = (0..4)
            .map(|i| Culture {
                i,
                lock: true,
                removed: i == 3,
                ..Default::default()
            })
            .collect();
        let present = present_ids(&[0, 1, 1, 0]);
        let migrated = invalidate_missing(&parent, &present, "culture");

        assert!(!migrated.get(0).expect("sentinel").removed);
        assert!(!migrated.get(1).expect("present").removed);
        let vanished = migrated.get(2).expect("slot kept");
        assert!(vanished.removed && !vanished.lock);
        assert!(migrated.get(3).expect("slot kept").removed);
        assert_eq!(migrated.len(), parent.len());
    }
}
