//! Land/water body classification over a cell graph.

use std::collections::VecDeque;

use serde::{Deserialize, Serialize};

use crate::{context::ResampleContext, grid::Grid, pack::Pack};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum FeatureKind {
    #[default]
    Unassigned,
    Ocean,
    Lake,
    Island,
}

/// Connected land or water body. Index `0` of a feature list is a
/// placeholder; cells reference features by `i >= 1`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Feature {
    pub i: u16,
    pub kind: FeatureKind,
    pub land: bool,
    pub border: bool,
    pub cells: usize,
    pub first_cell: u32,
    #[serde(default)]
    pub group: Option<String>,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub height: Option<f64>,
}

#[derive(Debug, Clone, Default)]
pub struct Markup {
    pub f: Vec<u16>,
    pub t: Vec<i8>,
    pub features: Vec<Feature>,
}

/// Flood-fill land and water components and measure the signed distance of
/// every cell to the coastline.
///
/// Water components touching the map border are oceans, other water is a
/// lake. Land components reaching `continent_min_cells` are grouped as
/// continents, the rest as islands.
pub fn markup<N, I>(
    len: usize,
    is_land: impl Fn(usize) -> bool,
    is_border: impl Fn(usize) -> bool,
    neighbors: N,
    continent_min_cells: usize,
) -> Markup
where
    N: Fn(usize) -> I,
    I: Iterator<Item = usize>,
{
    let mut f = vec![0u16; len];
    let mut features = vec![Feature::default()];
    let mut queue = VecDeque::new();

    for start in 0..len {
        if f[start] != 0 {
            continue;
        }
        let Ok(id) = u16::try_from(features.len()) else {
            tracing::warn!(
                target: "atlas::features",
                features = features.len(),
                unmarked = f.iter().filter(|&&id| id == 0).count(),
                "features.markup.overflow"
            );
            break;
        };
        let land = is_land(start);
        let mut border = false;
        let mut count = 0usize;
        f[start] = id;
        queue.push_back(start);
        while let Some(cell) = queue.pop_front() {
            count += 1;
            border |= is_border(cell);
            for n in neighbors(cell) {
                if f[n] == 0 && is_land(n) == land {
                    f[n] = id;
                    queue.push_back(n);
                }
            }
        }

        let (kind, group) = match (land, border) {
            (false, true) => (FeatureKind::Ocean, "ocean"),
            (false, false) => (FeatureKind::Lake, "freshwater"),
            (true, _) if count >= continent_min_cells => (FeatureKind::Island, "continent"),
            (true, _) => (FeatureKind::Island, "island"),
        };
        features.push(Feature {
            i: id,
            kind,
            land,
            border,
            cells: count,
            first_cell: start as u32,
            group: Some(group.to_string()),
            name: None,
            height: None,
        });
    }

    let t = coast_distance(len, &is_land, &neighbors);
    Markup { f, t, features }
}

fn coast_distance<N, I>(len: usize, is_land: &impl Fn(usize) -> bool, neighbors: &N) -> Vec<i8>
where
    N: Fn(usize) -> I,
    I: Iterator<Item = usize>,
{
    let mut t = vec![0i8; len];
    let mut queue = VecDeque::new();
    for cell in 0..len {
        let land = is_land(cell);
        if neighbors(cell).any(|n| is_land(n) != land) {
            t[cell] = if land { 1 } else { -1 };
            queue.push_back(cell);
        }
    }
    while let Some(cell) = queue.pop_front() {
        let current = t[cell];
        let next = if current > 0 {
            current.saturating_add(1)
        } else {
            current.saturating_sub(1)
        };
        for n in neighbors(cell) {
            if t[n] == 0 && (is_land(n) == (current > 0)) {
                t[n] = next;
                queue.push_back(n);
            }
        }
    }
    t
}

pub fn markup_grid(grid: &mut Grid, continent_min_cells: usize) {
    let markup = markup(
        grid.len(),
        |cell| grid.is_land(cell),
        |cell| grid.is_border(cell),
        |cell| grid.neighbors(cell),
        continent_min_cells,
    );
    grid.cells.f = markup.f;
    grid.cells.t = markup.t;
    grid.features = markup.features;
}

/// Feature markup for the cell graph, plus the haven (closest water
/// neighbour) of every coastal land cell.
pub fn markup_pack(pack: &mut Pack, continent_min_cells: usize) {
    let cells = &pack.cells;
    let markup = markup(
        cells.len(),
        |cell| cells.is_land(cell),
        |cell| cells.b[cell],
        |cell| cells.c[cell].iter().map(|&n| n as usize),
        continent_min_cells,
    );

    let mut haven = vec![None; cells.len()];
    for (cell, slot) in haven.iter_mut().enumerate() {
        if markup.t[cell] != 1 {
            continue;
        }
        let origin = cells.p[cell];
        *slot = cells.c[cell]
            .iter()
            .copied()
            .filter(|&n| !cells.is_land(n as usize))
            .min_by(|&a, &b| {
                origin
                    .distance_sq(cells.p[a as usize])
                    .total_cmp(&origin.distance_sq(cells.p[b as usize]))
            });
    }

    pack.cells.f = markup.f;
    pack.cells.t = markup.t;
    pack.cells.haven = haven;
    pack.features = markup.features;
}

/// Carry group, name and height over from the parent feature found under
/// the first cell of every new feature. Features whose parent is of the
/// other kind (land versus water) keep their fresh markup.
pub fn inherit_feature_details(ctx: &ResampleContext<'_>, pack: &mut Pack) {
    let index = ctx.parent.pack.cell_index();
    let parent = &ctx.parent.pack;
    let mut inherited = 0usize;
    for feature in pack.features.iter_mut().skip(1) {
        let Some(point) = pack.cells.p.get(feature.first_cell as usize) else {
            continue;
        };
        let Some(source) = index
            .nearest_payload(ctx.unproject(*point))
            .and_then(|cell| parent.cells.f.get(cell as usize))
            .and_then(|&f| parent.feature(f))
        else {
            continue;
        };
        if source.land != feature.land {
            continue;
        }
        if source.group.is_some() {
            feature.group.clone_from(&source.group);
        }
        feature.name.clone_from(&source.name);
        feature.height = source.height;
        inherited += 1;
    }
    tracing::debug!(
        target: "atlas::restore",
        features = pack.features.len().saturating_sub(1),
        inherited,
        "restore.features.details"
    );
}

#[cfg(test)]
mod tests {
    use super::*;

    fn path_neighbors(len: usize) -> impl Fn(usize) -> std::vec::IntoIter<usize> {
        move |cell| {
            let mut out = Vec::new();
            if cell > 0 {
                out.push(cell - 1);
            }
            if cell + 1 < len {
                out.push(cell + 1);
            }
            out.into_iter()
        }
    }

    #[test]
    fn components_and_coast_distance() {
        let land = [false, true, true, true, false, false];
        let len = land.len();
        let result = markup(
            len,
            |c| land[c],
            |c| c == 0,
            path_neighbors(len),
            3,
        );
        assert_eq!(result.f, vec![1, 2, 2, 2, 3, 3]);
        assert_eq!(result.features.len(), 4);
        assert_eq!(result.features[1].kind, FeatureKind::Ocean);
        assert_eq!(result.features[2].kind, FeatureKind::Island);
        assert_eq!(result.features[2].group.as_deref(), Some("continent"));
        assert_eq!(result.features[3].kind, FeatureKind::Lake);
        assert_eq!(result.t, vec![-1, 1, 2, 1, -1, -2]);
    }

    #[test]
    fn feature_ids_stop_at_u16_limit() {
        let len = u16::MAX as usize + 5;
        let markup = markup(len, |cell| cell % 2 == 0, |_| false, |_| std::iter::empty::<usize>(), 10);

        assert_eq!(markup.features.len(), u16::MAX as usize + 1);
        assert_eq!(markup.f[len - 6], u16::MAX);
        assert!(markup.f[len - 5..].iter().all(|&id| id == 0));
        let ids: std::collections::HashSet<u16> = markup.f[..len - 5].iter().copied().collect();
        assert_eq!(ids.len(), u16::MAX as usize);
    }

    #[test]
    fn feature_names_follow_parent() {
        use crate::{
            projection::IdentityProjection,
            restore::test_support::{config, lattice_map},
        };

        let mut parent = lattice_map(3, |cell| cell != 4);
        for feature in parent.pack.features.iter_mut().skip(1) {
            feature.name = Some(format!("feature {}", feature.i));
            feature.height = Some(feature.i as f64 * 10.0);
        }
        let config = config();
        let ctx = ResampleContext {
            parent: &parent,
            projection: &IdentityProjection,
            bounds: parent.bounds,
            scale: 1.0,
            config: &config,
        };
        let mut pack = parent.pack.clone();
        for feature in pack.features.iter_mut() {
            feature.name = None;
            feature.height = None;
        }
        inherit_feature_details(&ctx, &mut pack);
        assert_eq!(pack.features, parent.pack.features);
    }
}
