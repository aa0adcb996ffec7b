//! Static 2D k-d tree used for nearest-cell lookups.
//!
//! Built once per pipeline phase from `(point, payload)` pairs and dropped
//! afterwards; there is no insertion or removal once built.

use crate::geometry::Point;

#[derive(Debug, Clone, Copy)]
struct Entry<T> {
    point: Point,
    payload: T,
}

#[derive(Debug, Clone)]
pub struct SpatialIndex<T> {
    // Implicit tree: the median of each slice is its root, split axis
    // alternates with depth (x first).
    entries: Vec<Entry<T>>,
}

impl<T: Copy> SpatialIndex<T> {
    pub fn build<I>(items: I) -> Self
    where
        I: IntoIterator<Item = (Point, T)>,
    {
        let mut entries: Vec<Entry<T>> = items
            .into_iter()
            .map(|(point, payload)| Entry { point, payload })
            .collect();
        build_recursive(&mut entries, 0);
        Self { entries }
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Nearest entry to `query`. Ties resolve to whichever entry the
    /// traversal reaches first.
    pub fn nearest(&self, query: Point) -> Option<(Point, T)> {
        if self.entries.is_empty() {
            return None;
        }
        let mut best: Option<(usize, f64)> = None;
        nearest_recursive(&self.entries, 0, 0, query, &mut best);
        best.map(|(idx, _)| {
            let entry = &self.entries[idx];
            (entry.point, entry.payload)
        })
    }

    pub fn nearest_payload(&self, query: Point) -> Option<T> {
        self.nearest(query).map(|(_, payload)| payload)
    }

    /// All entries within `radius` of `query` (inclusive), in tree order.
    pub fn within_radius(&self, query: Point, radius: f64) -> Vec<T> {
        let mut found = Vec::new();
        if radius.is_finite() && radius >= 0.0 {
            radius_recursive(&self.entries, 0, query, radius * radius, &mut found);
        }
        found
    }
}

fn axis_value(point: Point, depth: usize) -> f64 {
    if depth % 2 == 0 {
        point.x
    } else {
        point.y
    }
}

fn build_recursive<T>(entries: &mut [Entry<T>], depth: usize) {
    if entries.len() <= 1 {
        return;
    }
    let mid = entries.len() / 2;
    entries.select_nth_unstable_by(mid, |a, b| {
        axis_value(a.point, depth).total_cmp(&axis_value(b.point, depth))
    });
    let (left, right) = entries.split_at_mut(mid);
    build_recursive(left, depth + 1);
    build_recursive(&mut right[1..], depth + 1);
}

fn nearest_recursive<T>(
    entries: &[Entry<T>],
    offset: usize,
    depth: usize,
    query: Point,
    best: &mut Option<(usize, f64)>,
) {
    if entries.is_empty() {
        return;
    }
    let mid = entries.len() / 2;
    let node = &entries[mid];
    let dist = node.point.distance_sq(query);
    if best.map_or(true, |(_, best_dist)| dist < best_dist) {
        *best = Some((offset + mid, dist));
    }

    let delta = axis_value(query, depth) - axis_value(node.point, depth);
    let (near, near_offset, far, far_offset) = if delta < 0.0 {
        (&entries[..mid], offset, &entries[mid + 1..], offset + mid + 1)
    } else {
        (&entries[mid + 1..], offset + mid + 1, &entries[..mid], offset)
    };
    nearest_recursive(near, near_offset, depth + 1, query, best);
    if best.map_or(true, |(_, best_dist)| delta * delta < best_dist) {
        nearest_recursive(far, far_offset, depth + 1, query, best);
    }
}

fn radius_recursive<T: Copy>(
    entries: &[Entry<T>],
    depth: usize,
    query: Point,
    radius_sq: f64,
    found: &mut Vec<T>,
) {
    if entries.is_empty() {
        return;
    }
    let mid = entries.len() / 2;
    let node = &entries[mid];
    if node.point.distance_sq(query) <= radius_sq {
        found.push(node.payload);
    }
    let delta = axis_value(query, depth) - axis_value(node.point, depth);
    if delta <= 0.0 || delta * delta <= radius_sq {
        radius_recursive(&entries[..mid], depth + 1, query, radius_sq, found);
    }
    if delta >= 0.0 || delta * delta <= radius_sq {
        radius_recursive(&entries[mid + 1..], depth + 1, query, radius_sq, found);
    }
}
