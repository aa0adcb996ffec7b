use crate::{context::ResampleContext, entities::Marker, geometry::Point, pack::Pack};

/// Project markers into the new map and snap them to their nearest cell.
/// Markers leaving the map are dropped outright.
pub fn restore_markers(ctx: &ResampleContext<'_>, pack: &Pack) -> Vec<Marker> {
    let index = pack.cell_index();
    let parent = &ctx.parent.overlays.markers;
    let markers: Vec<Marker> = parent
        .iter()
        .filter_map(|marker| {
            let projected = ctx.project_in_bounds(Point::new(marker.x, marker.y))?;
            let cell = index.nearest_payload(projected)?;
            Some(Marker {
                x: projected.x,
                y: projected.y,
                cell,
                ..marker.clone()
            })
        })
        .collect();

    tracing::debug!(
        target: "atlas::restore",
        kept = markers.len(),
        deleted = parent.len() - markers.len(),
        "restore.markers.completed"
    );
    markers
}
