use crate::{
    config::ResampleConfig,
    geometry::{Bounds, Point},
    map::Map,
    projection::Projection,
};

/// Read-only inputs shared by every stage of one resample run.
#[derive(Clone, Copy)]
pub struct ResampleContext<'a> {
    pub parent: &'a Map,
    pub projection: &'a dyn Projection,
    /// Extent of the map being built.
    pub bounds: Bounds,
    /// Area/population factor between parent and new map.
    pub scale: f64,
    pub config: &'a ResampleConfig,
}

impl<'a> ResampleContext<'a> {
    /// Parent-space point mapped into new-map space, rounded to the
    /// configured precision.
    pub fn project(&self, point: Point) -> Point {
        self.projection
            .forward(point)
            .rounded(self.config.precision())
    }

    /// Like [`project`](Self::project) but `None` when the result falls
    /// outside the new map.
    pub fn project_in_bounds(&self, point: Point) -> Option<Point> {
        let projected = self.project(point);
        self.bounds.contains(projected).then_some(projected)
    }

    /// New-map point mapped back into parent space.
    pub fn unproject(&self, point: Point) -> Point {
        self.projection.inverse(point)
    }

    pub fn parent_cell_point(&self, cell: u32) -> Option<Point> {
        self.parent.pack.cells.p.get(cell as usize).copied()
    }

    pub fn precision(&self) -> u32 {
        self.config.precision()
    }
}
