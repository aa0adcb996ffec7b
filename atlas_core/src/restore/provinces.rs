use crate::{
    context::ResampleContext,
    entities::{Burg, EntityList, Province},
    pack::Pack,
    poles::poles_for,
};

use super::{invalidate_missing, present_ids};

/// Flag provinces without cells and recentre the rest on their capital
/// burg's cell, or on their pole when the capital was lost.
pub fn restore_provinces(
    ctx: &ResampleContext<'_>,
    pack: &Pack,
    burgs: &EntityList<Burg>,
) -> EntityList<Province> {
    let present = present_ids(&pack.cells.province);
    let mut provinces = invalidate_missing(&ctx.parent.overlays.provinces, &present, "province");
    let poles = poles_for(pack, |cell| pack.cells.province[cell]);
    let index = pack.cell_index();

    for province in provinces.active_mut() {
        province.pole = poles.get(&province.i).copied();
        let capital_cell = burgs
            .is_active(province.burg)
            .then(|| burgs.get(province.burg).map(|burg| burg.cell))
            .flatten();
        let center =
            capital_cell.or_else(|| province.pole.and_then(|pole| index.nearest_payload(pole)));
        if center.is_some() {
            province.center = center;
        }
    }

    tracing::debug!(
        target: "atlas::restore",
        active = provinces.active().count(),
        "restore.provinces.completed"
    );
    provinces
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        projection::IdentityProjection,
        restore::test_support::{config, lattice_map},
    };

    #[test]
    fn provinces_follow_capital_or_pole() {
        let mut parent = lattice_map(3, |_| true);
        parent.pack.cells.province = vec![1, 1, 1, 2, 2, 2, 3, 3, 3];
        parent.overlays.provinces = (0..4)
            .map(|i| Province {
                i,
                burg: if i == 1 { 1 } else { 0 },
                ..Default::default()
            })
            .collect();
        let burgs: EntityList<Burg> = vec![
            Burg::default(),
            Burg {
                i: 1,
                cell: 2,
                ..Default::default()
            },
        ]
        .into_iter()
        .collect();

        let mut pack = parent.pack.clone();
        // Province 3 lost its row.
        pack.cells.province = vec![1, 1, 1, 2, 2, 2, 2, 2, 2];

        let config = config();
        let ctx = ResampleContext {
            parent: &parent,
            projection: &IdentityProjection,
            bounds: parent.bounds,
            scale: 1.0,
            config: &config,
        };
        let provinces = restore_provinces(&ctx, &pack, &burgs);

        assert_eq!(provinces.get(1).expect("slot").center, Some(2));
        let second = provinces.get(2).expect("slot");
        assert!(second.pole.is_some());
        assert!(second.center.is_some());
        assert!(provinces.get(3).expect("slot").removed);
        assert_eq!(provinces.len(), 4);
    }
}
