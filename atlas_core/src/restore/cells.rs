use crate::{context::ResampleContext, pack::Pack, spatial::SpatialIndex};

/// Nearest parent land cell behind every new land cell, `None` for water
/// cells (and for everything when the parent has no land).
fn parent_land_cells(ctx: &ResampleContext<'_>, pack: &Pack) -> Vec<Option<usize>> {
    let index: SpatialIndex<u32> = ctx.parent.pack.land_index();
    (0..pack.cells.len())
        .map(|cell| {
            if !pack.cells.is_land(cell) {
                return None;
            }
            index
                .nearest_payload(ctx.unproject(pack.cells.p[cell]))
                .map(|parent| parent as usize)
        })
        .collect()
}

/// Copy culture, state, religion and province ids from the nearest parent
/// land cell onto every new land cell. Water cells stay neutral.
pub fn restore_cell_overlays(ctx: &ResampleContext<'_>, pack: &mut Pack) {
    let sources = parent_land_cells(ctx, pack);
    let parent = &ctx.parent.pack.cells;
    let cells = &mut pack.cells;
    let len = cells.len();
    cells.culture = vec![0; len];
    cells.state = vec![0; len];
    cells.religion = vec![0; len];
    cells.province = vec![0; len];

    let mut assigned = 0usize;
    for (cell, source) in sources.into_iter().enumerate() {
        let Some(source) = source else {
            continue;
        };
        cells.culture[cell] = parent.culture[source];
        cells.state[cell] = parent.state[source];
        cells.religion[cell] = parent.religion[source];
        cells.province[cell] = parent.province[source];
        assigned += 1;
    }

    tracing::debug!(
        target: "atlas::restore",
        cells = len,
        land = assigned,
        "restore.cells.overlays"
    );
}

/// Carry suitability, population and flux from the nearest parent land
/// cell, rescaling suitability and population by the change in cell area
/// and by `scale`, the same factor applied to burg populations.
pub fn rank_cells(ctx: &ResampleContext<'_>, pack: &mut Pack) {
    let sources = parent_land_cells(ctx, pack);
    let parent = &ctx.parent.pack.cells;
    let cells = &mut pack.cells;
    let len = cells.len();
    cells.s = vec![0; len];
    cells.pop = vec![0.0; len];
    cells.fl = vec![0; len];

    for (cell, source) in sources.into_iter().enumerate() {
        let Some(source) = source else {
            continue;
        };
        let parent_area = parent.area[source];
        let ratio = if parent_area > 0.0 {
            cells.area[cell] / parent_area * ctx.scale
        } else {
            1.0
        };
        cells.s[cell] = (parent.s[source] as f64 * ratio) as i16;
        cells.pop[cell] = (parent.pop[source] as f64 * ratio) as f32;
        cells.fl[cell] = parent.fl[source];
    }
}

/// Biome of every new land cell taken from the nearest parent land cell;
/// water cells use biome `0`.
pub fn inherit_biomes(ctx: &ResampleContext<'_>, pack: &mut Pack) {
    let sources = parent_land_cells(ctx, pack);
    let parent = &ctx.parent.pack.cells;
    pack.cells.biome = sources
        .into_iter()
        .map(|source| source.map_or(0, |source| parent.biome[source]))
        .collect();
}
