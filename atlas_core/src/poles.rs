//! Representative interior points ("poles of inaccessibility") of regions
//! on the cell graph.

use std::collections::{HashMap, VecDeque};

use crate::{entities::EntityId, geometry::Point, pack::Pack};

/// For every non-zero group key, the centre of the group cell that lies
/// farthest (in graph steps) from the group's boundary.
///
/// Boundary cells are those touching the map edge or a cell of another
/// group. Ties go to the cell closest to the group's centroid, then to the
/// lower cell id.
pub fn poles_for(pack: &Pack, key: impl Fn(usize) -> EntityId) -> HashMap<EntityId, Point> {
    let cells = &pack.cells;
    let len = cells.len();
    let keys: Vec<EntityId> = (0..len).map(&key).collect();

    let mut depth = vec![u32::MAX; len];
    let mut queue = VecDeque::new();
    let mut centroid: HashMap<EntityId, (f64, f64, usize)> = HashMap::new();
    for cell in 0..len {
        let group = keys[cell];
        if group == 0 {
            continue;
        }
        let entry = centroid.entry(group).or_insert((0.0, 0.0, 0));
        entry.0 += cells.p[cell].x;
        entry.1 += cells.p[cell].y;
        entry.2 += 1;

        let on_boundary =
            cells.b[cell] || cells.c[cell].iter().any(|&n| keys[n as usize] != group);
        if on_boundary {
            depth[cell] = 0;
            queue.push_back(cell);
        }
    }

    while let Some(cell) = queue.pop_front() {
        let next = depth[cell] + 1;
        for &n in &cells.c[cell] {
            let n = n as usize;
            if keys[n] == keys[cell] && depth[n] == u32::MAX {
                depth[n] = next;
                queue.push_back(n);
            }
        }
    }

    let centroid: HashMap<EntityId, Point> = centroid
        .into_iter()
        .map(|(group, (sx, sy, n))| (group, Point::new(sx / n as f64, sy / n as f64)))
        .collect();

    let mut best: HashMap<EntityId, (u32, f64, usize)> = HashMap::new();
    for cell in 0..len {
        let group = keys[cell];
        if group == 0 {
            continue;
        }
        // Cells of an enclosed group with no boundary stay unreached.
        let d = if depth[cell] == u32::MAX { 0 } else { depth[cell] };
        let spread = cells.p[cell].distance_sq(centroid[&group]);
        let candidate = (d, spread, cell);
        best.entry(group)
            .and_modify(|current| {
                if d > current.0 || (d == current.0 && spread < current.1) {
                    *current = candidate;
                }
            })
            .or_insert(candidate);
    }

    best.into_iter()
        .map(|(group, (_, _, cell))| (group, cells.p[cell]))
        .collect()
}
