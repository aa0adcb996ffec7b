use crate::{
    context::ResampleContext,
    entities::{Centered, Culture, Entity, EntityId, EntityList, Religion},
    pack::Pack,
    poles::poles_for,
};

use super::{invalidate_missing, present_ids};

pub fn restore_cultures(ctx: &ResampleContext<'_>, pack: &Pack) -> EntityList<Culture> {
    restore_centered(
        ctx,
        pack,
        &ctx.parent.overlays.cultures,
        &pack.cells.culture,
        "culture",
    )
}

pub fn restore_religions(ctx: &ResampleContext<'_>, pack: &Pack) -> EntityList<Religion> {
    restore_centered(
        ctx,
        pack,
        &ctx.parent.overlays.religions,
        &pack.cells.religion,
        "religion",
    )
}

/// Flag regions that lost every cell, then move each survivor's centre to
/// the new cell under its projected parent centre, or to the region's pole
/// when the projection leaves the map.
fn restore_centered<T: Centered + Clone>(
    ctx: &ResampleContext<'_>,
    pack: &Pack,
    parent: &EntityList<T>,
    values: &[EntityId],
    category: &'static str,
) -> EntityList<T> {
    let present = present_ids(values);
    let poles = poles_for(pack, |cell| values[cell]);
    let index = pack.cell_index();

    let mut list = invalidate_missing(parent, &present, category);
    let mut from_pole = 0usize;
    for entity in list.active_mut() {
        let projected = entity
            .center()
            .and_then(|center| ctx.parent_cell_point(center))
            .and_then(|point| ctx.project_in_bounds(point));
        let target = match projected {
            Some(point) => Some(point),
            None => {
                from_pole += 1;
                poles.get(&entity.index()).copied()
            }
        };
        if let Some(cell) = target.and_then(|point| index.nearest_payload(point)) {
            entity.set_center(cell);
        }
    }

    tracing::debug!(
        target: "atlas::restore",
        category,
        active = list.active().count(),
        from_pole,
        "restore.region.recentred"
    );
    list
}
