use crate::{
    context::ResampleContext,
    entities::{Burg, Entity, EntityList},
    geometry::Point,
    pack::{CellId, Pack},
};

/// Move every active parent burg onto a land cell of the new graph.
///
/// Burgs projected off the map, burgs with no reachable land cell and burgs
/// whose target cell is already taken are flagged removed; earlier burgs
/// win conflicts. Populations are multiplied by the context scale.
pub fn restore_burgs(ctx: &ResampleContext<'_>, pack: &mut Pack) -> EntityList<Burg> {
    let cell_index = pack.cell_index();
    let land_index = pack.land_index();
    let edge_offset = ctx.config.burgs().port_edge_offset();
    let precision = ctx.precision();
    pack.cells.burg = vec![0; pack.cells.len()];

    let mut placed = 0usize;
    let burgs: EntityList<Burg> = ctx
        .parent
        .overlays
        .burgs
        .iter()
        .map(|parent_burg| {
            let mut burg = parent_burg.clone();
            if burg.i == 0 || burg.removed {
                return burg;
            }
            burg.population *= ctx.scale;

            let Some(projected) = ctx.project_in_bounds(burg.position()) else {
                tracing::debug!(
                    target: "atlas::restore",
                    burg = burg.i,
                    name = %burg.name,
                    "restore.burg.out_of_bounds"
                );
                burg.mark_removed();
                return burg;
            };

            let closest = cell_index.nearest_payload(projected);
            let cell = match closest {
                Some(cell) if pack.cells.is_land(cell as usize) => Some(cell),
                _ => land_index.nearest_payload(projected),
            };
            let Some(cell) = cell else {
                tracing::error!(
                    target: "atlas::restore",
                    burg = burg.i,
                    name = %burg.name,
                    x = projected.x,
                    y = projected.y,
                    "restore.burg.placement_failed"
                );
                burg.mark_removed();
                return burg;
            };

            let occupant = pack.cells.burg[cell as usize];
            if occupant != 0 {
                tracing::warn!(
                    target: "atlas::restore",
                    burg = burg.i,
                    name = %burg.name,
                    cell,
                    occupant,
                    "restore.burg.conflict"
                );
                burg.mark_removed();
                return burg;
            }

            pack.cells.burg[cell as usize] = burg.i;
            let position = if burg.port != 0 {
                match pack.cells.haven[cell as usize] {
                    Some(haven) => {
                        burg.port = pack.cells.f[haven as usize];
                        coast_point(pack, cell, haven, edge_offset).rounded(precision)
                    }
                    None => {
                        burg.port = 0;
                        settle_point(pack, closest, cell, projected)
                    }
                }
            } else {
                settle_point(pack, closest, cell, projected)
            };
            burg.cell = cell;
            burg.x = position.x;
            burg.y = position.y;
            placed += 1;
            burg
        })
        .collect();

    tracing::debug!(
        target: "atlas::restore",
        burgs = burgs.len(),
        placed,
        "restore.burgs.completed"
    );
    burgs
}

/// Burgs moved off water sit on their new cell centre; others keep the
/// projected coordinate.
fn settle_point(pack: &Pack, closest: Option<CellId>, cell: CellId, projected: Point) -> Point {
    if closest == Some(cell) {
        projected
    } else {
        pack.cells.p[cell as usize]
    }
}

fn coast_point(pack: &Pack, cell: CellId, haven: CellId, offset: f64) -> Point {
    pack.cells.p[cell as usize].lerp(pack.cells.p[haven as usize], offset)
}
