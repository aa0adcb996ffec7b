use std::collections::HashSet;
use std::f64::consts::PI;

use crate::{
    context::ResampleContext,
    entities::Zone,
    pack::{CellId, Pack},
};

/// Rebuild every zone's cell list from its parent cells: each parent cell
/// still on the map claims the new cells within the radius of a disc of the
/// same area, scaled. Order is first-seen, duplicates are dropped.
pub fn restore_zones(ctx: &ResampleContext<'_>, pack: &Pack) -> Vec<Zone> {
    let index = pack.cell_index();
    let parent = &ctx.parent.pack.cells;

    let zones: Vec<Zone> = ctx
        .parent
        .overlays
        .zones
        .iter()
        .map(|zone| {
            let mut seen = HashSet::new();
            let mut cells: Vec<CellId> = Vec::new();
            for &parent_cell in &zone.cells {
                let Some(point) = ctx.parent_cell_point(parent_cell) else {
                    continue;
                };
                let Some(projected) = ctx.project_in_bounds(point) else {
                    continue;
                };
                let area = parent.area.get(parent_cell as usize).copied().unwrap_or(0.0);
                let radius = (area / PI).sqrt() * ctx.scale;
                let mut claimed = index.within_radius(projected, radius);
                if claimed.is_empty() {
                    claimed.extend(index.nearest_payload(projected));
                }
                claimed.sort_unstable();
                for cell in claimed {
                    if seen.insert(cell) {
                        cells.push(cell);
                    }
                }
            }
            Zone {
                cells,
                ..zone.clone()
            }
        })
        .collect();

    tracing::debug!(
        target: "atlas::restore",
        zones = zones.len(),
        empty = zones.iter().filter(|zone| zone.cells.is_empty()).count(),
        "restore.zones.completed"
    );
    zones
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        projection::{AffineProjection, IdentityProjection},
        restore::test_support::{config, lattice_map},
    };

    fn zone(cells: Vec<CellId>) -> Zone {
        Zone {
            i: 0,
            name: "Flood".into(),
            kind: "disaster".into(),
            cells,
            hidden: false,
        }
    }

    #[test]
    fn identity_keeps_zone_cells_without_duplicates() {
        let mut parent = lattice_map(4, |_| true);
        parent.overlays.zones = vec![zone(vec![5, 6, 5])];
        let config = config();
        let ctx = ResampleContext {
            parent: &parent,
            projection: &IdentityProjection,
            bounds: parent.bounds,
            scale: 1.0,
            config: &config,
        };
        let zones = restore_zones(&ctx, &parent.pack);
        // Cell area 100 gives a radius of ~5.64: only the cell itself.
        assert_eq!(zones[0].cells, vec![5, 6]);
    }

    #[test]
    fn zone_shifted_off_map_is_emptied_but_kept() {
        let mut parent = lattice_map(3, |_| true);
        parent.overlays.zones = vec![zone(vec![0, 3, 6])];
        let projection = AffineProjection::translate(-10.0, 0.0);
        let config = config();
        let ctx = ResampleContext {
            parent: &parent,
            projection: &projection,
            bounds: parent.bounds,
            scale: 1.0,
            config: &config,
        };
        let zones = restore_zones(&ctx, &parent.pack);
        assert_eq!(zones.len(), 1);
        assert!(zones[0].cells.is_empty());
    }

    #[test]
    fn larger_scale_widens_the_claim() {
        let mut parent = lattice_map(3, |_| true);
        parent.overlays.zones = vec![zone(vec![4])];
        let config = config();
        let ctx = ResampleContext {
            parent: &parent,
            projection: &IdentityProjection,
            bounds: parent.bounds,
            scale: 2.0,
            config: &config,
        };
        let zones = restore_zones(&ctx, &parent.pack);
        // Radius ~11.28 reaches the four edge neighbours of the centre.
        assert_eq!(zones[0].cells, vec![1, 3, 4, 5, 7]);
    }
}
