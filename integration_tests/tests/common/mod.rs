#![allow(dead_code)]

use std::path::PathBuf;
use std::sync::{Arc, Once};

use atlas_core::{
    build_lattice_graph, load_resample_config_from_env, markup_grid, markup_pack, Bounds, Burg,
    Culture, Entity, EntityId, EntityList, Grid, Map, Overlays, Pack, Province, Religion,
    ResampleConfig, ResampleOptions, State, RESAMPLE_CONFIG_ENV,
};

static INIT: Once = Once::new();

pub const LAND: u8 = 40;
pub const WATER: u8 = 5;

pub fn ensure_test_config() {
    INIT.call_once(|| {
        let config_path = PathBuf::from(env!("CARGO_MANIFEST_DIR"))
            .join("tests")
            .join("fixtures")
            .join("test_resample_config.json");

        debug_assert!(
            config_path.exists(),
            "missing test resample config at {}",
            config_path.display()
        );

        std::env::set_var(RESAMPLE_CONFIG_ENV, &config_path);
    });
}

pub fn test_config() -> Arc<ResampleConfig> {
    ensure_test_config();
    load_resample_config_from_env()
}

/// Options that keep the parent's extent, resolution and seed.
pub fn options() -> ResampleOptions {
    ResampleOptions::default().with_config(test_config())
}

/// `side × side` unjittered lattice map with spacing 10; `height(col, row)`
/// picks each point's elevation. Overlay lists hold only their sentinel.
pub fn lattice_map(side: usize, height: impl Fn(usize, usize) -> u8) -> Map {
    let extent = side as f64 * 10.0;
    let bounds = Bounds::new(extent, extent);
    let seed = 7;
    let mut grid = Grid::generate(bounds, side * side, 0.0, seed);
    grid.cells.h = (0..grid.len())
        .map(|cell| height(cell % side, cell / side))
        .collect();
    markup_grid(&mut grid, 10);
    let mut pack = Pack::new(build_lattice_graph(&grid));
    markup_pack(&mut pack, 10);

    Map {
        bounds,
        seed,
        grid,
        pack,
        overlays: Overlays {
            cultures: sentinel(),
            states: sentinel(),
            provinces: sentinel(),
            religions: sentinel(),
            burgs: sentinel(),
            ..Default::default()
        },
    }
}

fn sentinel<T: Entity + Default>() -> EntityList<T> {
    vec![T::default()].into_iter().collect()
}

/// First cell carrying `id` in `values`.
pub fn first_cell(values: &[EntityId], id: EntityId) -> Option<u32> {
    values.iter().position(|&v| v == id).map(|cell| cell as u32)
}

/// Assign every land cell to a region via `region(cell)` across all four
/// overlay layers and create one entity per region id up to `count`.
pub fn paint_regions(map: &mut Map, count: u16, region: impl Fn(usize) -> EntityId) {
    let cells = &mut map.pack.cells;
    let values: Vec<EntityId> = (0..cells.len())
        .map(|cell| if cells.is_land(cell) { region(cell) } else { 0 })
        .collect();
    cells.culture = values.clone();
    cells.state = values.clone();
    cells.religion = values.clone();
    cells.province = values.clone();

    let overlays = &mut map.overlays;
    overlays.cultures = (0..=count)
        .map(|i| Culture {
            i,
            name: format!("Culture {i}"),
            center: first_cell(&values, i),
            ..Default::default()
        })
        .collect();
    overlays.states = (0..=count)
        .map(|i| State {
            i,
            name: format!("State {i}"),
            center: first_cell(&values, i),
            neighbors: (1..=count).filter(|&n| n != i).collect(),
            ..Default::default()
        })
        .collect();
    overlays.religions = (0..=count)
        .map(|i| Religion {
            i,
            name: format!("Faith {i}"),
            center: first_cell(&values, i),
            ..Default::default()
        })
        .collect();
    overlays.provinces = (0..=count)
        .map(|i| Province {
            i,
            name: format!("Province {i}"),
            state: i,
            center: first_cell(&values, i),
            ..Default::default()
        })
        .collect();
}

pub fn burg(i: EntityId, x: f64, y: f64) -> Burg {
    Burg {
        i,
        name: format!("Burg {i}"),
        x,
        y,
        population: 1.0,
        ..Default::default()
    }
}

pub fn burgs(list: Vec<Burg>) -> EntityList<Burg> {
    std::iter::once(Burg::default()).chain(list).collect()
}
