//! Carry parent rivers onto the new cell graph.

use crate::{
    context::ResampleContext,
    entities::{Entity, EntityId, EntityList, River},
    geometry::{polyline_length, round_to, Point},
    pack::{CellId, Pack},
    spatial::SpatialIndex,
};

/// Project `points` into new-map space, keeping points inside the map plus
/// the first point after each exit so paths still reach the edge.
pub(crate) fn project_path(ctx: &ResampleContext<'_>, points: &[Point]) -> Vec<Point> {
    let mut was_in_map = true;
    let mut projected = Vec::with_capacity(points.len());
    for &point in points {
        let point = ctx.project(point);
        let in_map = ctx.bounds.contains(point);
        if in_map || was_in_map {
            projected.push(point);
        }
        was_in_map = in_map;
    }
    projected
}

/// Re-project every parent river, snap its path to new cells and rebuild
/// the per-cell river and confluence arrays.
///
/// Rivers left with fewer than two points are marked removed.
pub fn restore_rivers(ctx: &ResampleContext<'_>, pack: &mut Pack) -> EntityList<River> {
    let index = pack.cell_index();
    let len = pack.cells.len();
    pack.cells.r = vec![0; len];
    pack.cells.conf = vec![0; len];

    let mut removed = 0usize;
    let mut rivers: EntityList<River> = ctx
        .parent
        .overlays
        .rivers
        .iter()
        .map(|river| {
            if river.i == 0 || river.removed {
                return river.clone();
            }
            let points = project_path(ctx, &river.points);
            let cells = snap_path(&index, &points);
            if cells.len() < 2 {
                removed += 1;
                let mut gone = river.clone();
                gone.mark_removed();
                gone.cells.clear();
                gone.points.clear();
                return gone;
            }

            for &cell in &cells {
                let cell = cell as usize;
                let current = pack.cells.r[cell];
                if current != 0 && current != river.i {
                    pack.cells.conf[cell] = 1;
                }
                pack.cells.r[cell] = river.i;
            }

            // A trailing off-map point only marks where the river leaves.
            let leaves_map = points.last().is_some_and(|&p| !ctx.bounds.contains(p));
            let mouth = if leaves_map {
                cells[cells.len() - 2]
            } else {
                cells[cells.len() - 1]
            };
            River {
                source: cells[0],
                mouth,
                width_factor: river.width_factor * ctx.scale,
                length: round_to(polyline_length(&points), ctx.precision()),
                cells,
                points,
                ..river.clone()
            }
        })
        .collect();

    let basins: Vec<(EntityId, EntityId)> = rivers
        .active()
        .map(|river| (river.i, basin_of(&rivers, river.i)))
        .collect();
    for (id, basin) in basins {
        if let Some(river) = rivers.get_mut(id) {
            river.basin = basin;
        }
    }

    tracing::debug!(
        target: "atlas::restore",
        rivers = rivers.len(),
        removed,
        "restore.rivers.completed"
    );
    rivers
}

fn snap_path(index: &SpatialIndex<CellId>, points: &[Point]) -> Vec<CellId> {
    points
        .iter()
        .filter_map(|&point| index.nearest_payload(point))
        .collect()
}

/// Main stem a river ultimately drains into.
pub fn basin_of(rivers: &EntityList<River>, id: EntityId) -> EntityId {
    let mut current = id;
    // Bounded walk; malformed parent chains may loop.
    for _ in 0..rivers.len() {
        match rivers.get(current) {
            Some(river) if river.parent != 0 && river.parent != current => {
                current = river.parent;
            }
            _ => return current,
        }
    }
    current
}
