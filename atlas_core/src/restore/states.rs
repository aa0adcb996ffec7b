use std::collections::HashMap;

use crate::{
    context::ResampleContext,
    entities::{Burg, EntityList, Regiment, State},
    geometry::Point,
    pack::{CellId, Pack},
    poles::poles_for,
    spatial::SpatialIndex,
};

use super::{invalidate_missing, present_ids};

/// Migrate states: flag those without cells, recentre survivors on their
/// capital (or their pole when the capital is gone), move their regiments
/// and drop neighbours that no longer exist.
///
/// Must run after burgs have been restored.
pub fn restore_states(
    ctx: &ResampleContext<'_>,
    pack: &Pack,
    burgs: &EntityList<Burg>,
) -> EntityList<State> {
    let present = present_ids(&pack.cells.state);
    let mut states = invalidate_missing(&ctx.parent.overlays.states, &present, "state");
    let poles = poles_for(pack, |cell| pack.cells.state[cell]);
    let index = pack.cell_index();

    let mut stacked: HashMap<CellId, u32> = HashMap::new();
    let mut relocated = 0usize;
    for state in states.active_mut() {
        state.pole = poles.get(&state.i).copied();
        let capital_cell = burgs
            .get(state.capital)
            .filter(|capital| capital.i != 0 && !capital.removed)
            .map(|capital| capital.cell);
        let center = capital_cell.or_else(|| {
            state
                .pole
                .and_then(|pole| index.nearest_payload(pole))
        });
        if center.is_some() {
            state.center = center;
        }

        let mut military = Vec::with_capacity(state.military.len());
        for regiment in &state.military {
            let (moved, was_relocated) =
                restore_regiment(ctx, pack, &index, regiment, state.center, &mut stacked);
            relocated += usize::from(was_relocated);
            military.push(moved);
        }
        state.military = military;
        state.neighbors.retain(|id| present.contains(id));
    }

    tracing::debug!(
        target: "atlas::restore",
        active = states.active().count(),
        relocated_regiments = relocated,
        "restore.states.completed"
    );
    states
}

/// Returns the moved regiment and whether its position fell off the map.
fn restore_regiment(
    ctx: &ResampleContext<'_>,
    pack: &Pack,
    index: &SpatialIndex<CellId>,
    regiment: &Regiment,
    state_center: Option<CellId>,
    stacked: &mut HashMap<CellId, u32>,
) -> (Regiment, bool) {
    let military = ctx.config.military();
    let position = ctx.project_in_bounds(Point::new(regiment.x, regiment.y));
    let base = ctx.project_in_bounds(Point::new(regiment.bx, regiment.by));

    let cell = position
        .or_else(|| {
            ctx.parent_cell_point(regiment.cell)
                .and_then(|point| ctx.project_in_bounds(point))
        })
        .and_then(|point| index.nearest_payload(point))
        .or(state_center)
        .unwrap_or(regiment.cell.min(pack.cells.len().saturating_sub(1) as CellId));
    let cell_point = pack.cells.p[cell as usize];

    let mut moved = Regiment {
        cell,
        ..regiment.clone()
    };

    match position {
        Some(point) => {
            moved.x = point.x;
            moved.y = point.y;
        }
        None => {
            let on_cell = stacked.entry(cell).or_insert(0);
            moved.x = cell_point.x;
            moved.y = cell_point.y + *on_cell as f64 * military.vertical_gap();
            *on_cell += 1;
            let prefix = military.relocated_prefix();
            if !moved.name.starts_with(prefix) {
                moved.name = format!("{prefix} {}", moved.name);
            }
        }
    }

    let base_point = match base {
        Some(point) => point,
        None => {
            let clamped = ctx.bounds.clamp(ctx.project(Point::new(regiment.bx, regiment.by)));
            index
                .nearest_payload(clamped)
                .map(|snap| pack.cells.p[snap as usize])
                .unwrap_or(cell_point)
        }
    };
    moved.bx = base_point.x;
    moved.by = base_point.y;

    (moved, position.is_none())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        projection::AffineProjection,
        restore::test_support::{config, lattice_map},
    };

    fn regiment(i: u16, x: f64, y: f64) -> Regiment {
        Regiment {
            i,
            name: format!("regiment {i}"),
            cell: 0,
            x,
            y,
            bx: x,
            by: y,
        }
    }

    #[test]
    fn state_recentres_on_pole_when_capital_removed() {
        let mut parent = lattice_map(5, |_| true);
        parent.pack.cells.state = (0..25).map(|cell| if cell % 5 < 3 { 1 } else { 2 }).collect();
        parent.overlays.states = vec![
            State::default(),
            State {
                i: 1,
                capital: 1,
                neighbors: vec![2, 3],
                military: vec![regiment(1, 48.0, 5.0), regiment(2, 45.0, 45.0)],
                ..Default::default()
            },
            State {
                i: 2,
                neighbors: vec![1],
                ..Default::default()
            },
            State {
                i: 3,
                ..Default::default()
            },
        ]
        .into_iter()
        .collect();

        // Shift left by 10: the parent's left column leaves the map.
        let projection = AffineProjection::translate(-10.0, 0.0);
        let mut pack = lattice_map(5, |_| true).pack;
        pack.cells.state = (0..25).map(|cell| if cell % 5 < 2 { 1 } else { 2 }).collect();
        let burgs: EntityList<Burg> = vec![
            Burg::default(),
            Burg {
                i: 1,
                removed: true,
                ..Default::default()
            },
        ]
        .into_iter()
        .collect();

        let config = config();
        let ctx = ResampleContext {
            parent: &parent,
            projection: &projection,
            bounds: parent.bounds,
            scale: 1.0,
            config: &config,
        };
        let states = restore_states(&ctx, &pack, &burgs);

        assert!(states.get(3).expect("slot").removed);
        let first = states.get(1).expect("slot");
        assert!(!first.removed);
        assert_eq!(first.neighbors, vec![2]);
        // Region 1 is two columns wide and touches the border: every cell is
        // depth 0, the pole is the one nearest the centroid (10, 25).
        assert_eq!(first.center, Some(10));
        assert_eq!(first.pole, Some(pack.cells.p[10]));

        // Regiment 1 lands on x=38; regiment 2 keeps its place too.
        assert_eq!(first.military[0].x, 38.0);
        assert_eq!(first.military[0].cell, 3);
        assert_eq!(first.military[1].x, 35.0);
        assert!(!first.military[0].name.starts_with("[relocated]"));
    }

    #[test]
    fn off_map_regiments_stack_on_state_centre() {
        let mut parent = lattice_map(3, |_| true);
        parent.pack.cells.state = vec![1; 9];
        parent.overlays.states = vec![
            State::default(),
            State {
                i: 1,
                military: vec![regiment(1, 2.0, 2.0), regiment(2, 3.0, 3.0)],
                ..Default::default()
            },
        ]
        .into_iter()
        .collect();
        let projection = AffineProjection::translate(-20.0, 0.0);
        let mut pack = lattice_map(3, |_| true).pack;
        pack.cells.state = vec![1; 9];

        let config = config();
        let ctx = ResampleContext {
            parent: &parent,
            projection: &projection,
            bounds: parent.bounds,
            scale: 1.0,
            config: &config,
        };
        let burgs: EntityList<Burg> = vec![Burg::default()].into_iter().collect();
        let states = restore_states(&ctx, &pack, &burgs);
        let state = states.get(1).expect("slot");
        assert_eq!(state.center, Some(4));

        let [a, b] = [&state.military[0], &state.military[1]];
        assert_eq!(a.cell, 4);
        assert_eq!(b.cell, 4);
        assert_eq!((a.x, a.y), (15.0, 15.0));
        assert_eq!((b.x, b.y), (15.0, 23.0));
        assert_eq!(a.name, "[relocated] regiment 1");
        // Bases snap to the cell nearest the clamped projection.
        assert_eq!((a.bx, a.by), (5.0, 5.0));
    }
}
