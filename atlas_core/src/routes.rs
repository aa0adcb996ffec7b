//! Carry parent trade routes onto the new map.

use crate::{
    context::ResampleContext,
    entities::{Entity, EntityList, Route, RoutePoint},
    geometry::{Bounds, Point},
    pack::Pack,
    rivers::project_path,
};

/// Project each parent route, clip it to the map rectangle and snap its
/// points to new cells. Routes with no visible run of at least
/// `min_points` points are marked removed.
pub fn restore_routes(ctx: &ResampleContext<'_>, pack: &Pack) -> EntityList<Route> {
    let index = pack.cell_index();
    let min_points = ctx.config.routes().min_points();
    let precision = ctx.precision();

    let mut removed = 0usize;
    let routes: EntityList<Route> = ctx
        .parent
        .overlays
        .routes
        .iter()
        .map(|route| {
            if route.i == 0 || route.removed {
                return route.clone();
            }
            let parent_points: Vec<Point> = route.points.iter().map(|p| p.point).collect();
            let projected = project_path(ctx, &parent_points);
            let points: Vec<RoutePoint> = clip_to_bounds(ctx.bounds, &projected)
                .into_iter()
                .filter_map(|point| {
                    let point = point.rounded(precision);
                    index
                        .nearest_payload(point)
                        .map(|cell| RoutePoint { point, cell })
                })
                .collect();

            if points.len() < min_points {
                removed += 1;
                let mut gone = route.clone();
                gone.mark_removed();
                gone.points.clear();
                return gone;
            }

            let feature = pack.cells.f[points[0].cell as usize];
            Route {
                feature,
                points,
                ..route.clone()
            }
        })
        .collect();

    tracing::debug!(
        target: "atlas::restore",
        routes = routes.len(),
        removed,
        "restore.routes.completed"
    );
    routes
}

/// First contiguous visible run of the polyline after clipping every
/// segment to `bounds`.
fn clip_to_bounds(bounds: Bounds, points: &[Point]) -> Vec<Point> {
    let mut run: Vec<Point> = Vec::new();
    for pair in points.windows(2) {
        match bounds.clip_segment(pair[0], pair[1]) {
            Some((start, end)) => {
                match run.last() {
                    None => run.push(start),
                    Some(&last) if last != start => break,
                    Some(_) => {}
                }
                run.push(end);
            }
            None if !run.is_empty() => break,
            None => {}
        }
    }
    run
}
