//! Resampling orchestrator: rebuilds a map at a new resolution and/or
//! projection and migrates every overlay onto it.

use std::fmt;
use std::sync::Arc;

use thiserror::Error;

use crate::{
    collaborators::{DefaultCollaborators, MapCollaborators},
    config::ResampleConfig,
    context::ResampleContext,
    entities::{Entity, EntityList},
    geometry::{round_to, Bounds},
    grid::{Grid, LatticeShape},
    heightmap::{depress_rivers, smooth_heightmap},
    map::{Map, MapValidationError, Overlays},
    pack::Pack,
    projection::{check_invertible, IdentityProjection, Projection, ProjectionError},
    restore,
    sampler::sample_primary_fields,
};

#[derive(Debug, Error)]
pub enum ResampleError {
    #[error("invalid projection: {0}")]
    Projection(#[from] ProjectionError),
    #[error("invalid parent map: {0}")]
    InvalidParent(#[from] MapValidationError),
    #[error("invalid map dimensions {width}x{height}")]
    InvalidDimensions { width: f64, height: f64 },
    #[error("invalid scale {0}; expected a finite value above zero")]
    InvalidScale(f64),
    #[error("invalid cell count {0}")]
    InvalidCellCount(usize),
}

/// Inputs of one resample run.
///
/// Dimensions, resolution and seed default to the parent's, so
/// `ResampleOptions::default()` reproduces the parent lattice.
pub struct ResampleOptions {
    pub smooth_heightmap: bool,
    pub depress_rivers: bool,
    pub projection: Box<dyn Projection>,
    /// Area/population factor between parent and new map.
    pub scale: f64,
    pub width: Option<f64>,
    pub height: Option<f64>,
    pub cells_desired: Option<usize>,
    pub seed: Option<u64>,
    pub config: Arc<ResampleConfig>,
}

impl Default for ResampleOptions {
    fn default() -> Self {
        Self {
            smooth_heightmap: false,
            depress_rivers: false,
            projection: Box::new(IdentityProjection),
            scale: 1.0,
            width: None,
            height: None,
            cells_desired: None,
            seed: None,
            config: ResampleConfig::builtin(),
        }
    }
}

impl fmt::Debug for ResampleOptions {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ResampleOptions")
            .field("smooth_heightmap", &self.smooth_heightmap)
            .field("depress_rivers", &self.depress_rivers)
            .field("scale", &self.scale)
            .field("width", &self.width)
            .field("height", &self.height)
            .field("cells_desired", &self.cells_desired)
            .field("seed", &self.seed)
            .finish_non_exhaustive()
    }
}

impl ResampleOptions {
    pub fn with_projection(mut self, projection: impl Projection + 'static) -> Self {
        self.projection = Box::new(projection);
        self
    }

    pub fn with_scale(mut self, scale: f64) -> Self {
        self.scale = scale;
        self
    }

    pub fn with_size(mut self, width: f64, height: f64) -> Self {
        self.width = Some(width);
        self.height = Some(height);
        self
    }

    pub fn with_cells(mut self, cells_desired: usize) -> Self {
        self.cells_desired = Some(cells_desired);
        self
    }

    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }

    pub fn with_config(mut self, config: Arc<ResampleConfig>) -> Self {
        self.config = config;
        self
    }

    pub fn smoothing(mut self, enabled: bool) -> Self {
        self.smooth_heightmap = enabled;
        self
    }

    pub fn depressing_rivers(mut self, enabled: bool) -> Self {
        self.depress_rivers = enabled;
        self
    }
}

/// Entities lost during one resample, per category.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ResampleReport {
    pub cells: usize,
    pub cultures_removed: usize,
    pub states_removed: usize,
    pub provinces_removed: usize,
    pub religions_removed: usize,
    pub burgs_removed: usize,
    pub rivers_removed: usize,
    pub routes_removed: usize,
    pub markers_deleted: usize,
    pub empty_zones: usize,
}

impl ResampleReport {
    fn compare(parent: &Overlays, map: &Map) -> Self {
        let overlays = &map.overlays;
        Self {
            cells: map.pack.cells.len(),
            cultures_removed: newly_removed(&parent.cultures, &overlays.cultures),
            states_removed: newly_removed(&parent.states, &overlays.states),
            provinces_removed: newly_removed(&parent.provinces, &overlays.provinces),
            religions_removed: newly_removed(&parent.religions, &overlays.religions),
            burgs_removed: newly_removed(&parent.burgs, &overlays.burgs),
            rivers_removed: newly_removed(&parent.rivers, &overlays.rivers),
            routes_removed: newly_removed(&parent.routes, &overlays.routes),
            markers_deleted: parent.markers.len() - overlays.markers.len(),
            empty_zones: overlays
                .zones
                .iter()
                .filter(|zone| zone.cells.is_empty())
                .count(),
        }
    }
}

fn newly_removed<T: Entity>(before: &EntityList<T>, after: &EntityList<T>) -> usize {
    before
        .iter()
        .zip(after.iter())
        .filter(|(old, new)| old.index() != 0 && !old.is_removed() && new.is_removed())
        .count()
}

/// The map under construction. Owned by the orchestrator and handed out
/// only once every stage has run.
#[derive(Debug)]
pub struct MapBuilder {
    bounds: Bounds,
    seed: u64,
    grid: Grid,
    pack: Pack,
    overlays: Overlays,
}

impl MapBuilder {
    pub fn new(grid: Grid) -> Self {
        Self {
            bounds: grid.bounds,
            seed: grid.seed,
            grid,
            pack: Pack::default(),
            overlays: Overlays::default(),
        }
    }

    pub fn grid(&self) -> &Grid {
        &self.grid
    }

    pub fn pack(&self) -> &Pack {
        &self.pack
    }

    pub fn finish(self) -> Map {
        Map {
            bounds: self.bounds,
            seed: self.seed,
            grid: self.grid,
            pack: self.pack,
            overlays: self.overlays,
        }
    }
}

/// Resample `parent` with the built-in collaborators.
pub fn resample(parent: &Map, options: &ResampleOptions) -> Result<Map, ResampleError> {
    resample_with(parent, options, &DefaultCollaborators)
}

pub fn resample_with(
    parent: &Map,
    options: &ResampleOptions,
    collaborators: &dyn MapCollaborators,
) -> Result<Map, ResampleError> {
    resample_with_report(parent, options, collaborators).map(|(map, _)| map)
}

/// Resample `parent` and report how many entities each category lost.
///
/// The parent is never mutated. Every fatal condition is checked before
/// the first stage runs, so an error never leaves a partial map behind.
pub fn resample_with_report(
    parent: &Map,
    options: &ResampleOptions,
    collaborators: &dyn MapCollaborators,
) -> Result<(Map, ResampleReport), ResampleError> {
    parent.validate()?;
    let bounds = target_bounds(parent, options)?;
    if !(options.scale.is_finite() && options.scale > 0.0) {
        return Err(ResampleError::InvalidScale(options.scale));
    }
    let config = options.config.as_ref();
    let projection: &dyn Projection = options.projection.as_ref();
    let checks = config.projection();
    check_invertible(projection, bounds, checks.probes(), checks.tolerance())?;
    let cells_desired = cells_desired(parent, options, bounds)?;
    let seed = options.seed.unwrap_or(parent.seed);

    tracing::info!(
        target: "atlas::resample",
        width = bounds.width,
        height = bounds.height,
        cells_desired,
        seed,
        scale = options.scale,
        "resample.started"
    );

    let grid = Grid::generate(bounds, cells_desired, config.lattice().jitter(), seed);
    let mut builder = MapBuilder::new(grid);
    stage("lattice", builder.grid.len());

    sample_primary_fields(&mut builder.grid, parent, projection);
    stage("sample_fields", builder.grid.len());

    if options.smooth_heightmap {
        smooth_heightmap(&mut builder.grid);
        stage("smooth_heightmap", builder.grid.len());
    }
    if options.depress_rivers {
        let lowered = depress_rivers(&mut builder.grid, parent, projection);
        stage("depress_rivers", lowered);
    }

    collaborators.markup_grid(&mut builder.grid, config);
    stage("markup_grid", builder.grid.features.len());
    collaborators.derive_climate(&mut builder.grid);
    stage("derive_climate", builder.grid.len());

    builder.pack = Pack::new(collaborators.build_graph(&builder.grid));
    stage("build_graph", builder.pack.cells.len());
    collaborators.markup_pack(&mut builder.pack, config);
    stage("markup_pack", builder.pack.features.len());

    let ctx = ResampleContext {
        parent,
        projection,
        bounds,
        scale: options.scale,
        config,
    };
    let pack = &mut builder.pack;
    let overlays = &mut builder.overlays;

    overlays.rivers = collaborators.generate_rivers(&ctx, pack);
    stage("rivers", overlays.rivers.len());
    collaborators.define_biomes(&ctx, pack);
    stage("biomes", pack.cells.len());
    restore::rank_cells(&ctx, pack);
    stage("rank_cells", pack.cells.len());
    restore::restore_cell_overlays(&ctx, pack);
    stage("cell_overlays", pack.cells.len());

    overlays.cultures = restore::restore_cultures(&ctx, pack);
    stage("cultures", overlays.cultures.len());
    overlays.burgs = restore::restore_burgs(&ctx, pack);
    stage("burgs", overlays.burgs.len());
    overlays.states = restore::restore_states(&ctx, pack, &overlays.burgs);
    stage("states", overlays.states.len());
    overlays.religions = restore::restore_religions(&ctx, pack);
    stage("religions", overlays.religions.len());
    overlays.provinces = restore::restore_provinces(&ctx, pack, &overlays.burgs);
    stage("provinces", overlays.provinces.len());
    overlays.markers = restore::restore_markers(&ctx, pack);
    stage("markers", overlays.markers.len());
    overlays.zones = restore::restore_zones(&ctx, pack);
    stage("zones", overlays.zones.len());

    overlays.routes = collaborators.regenerate_routes(&ctx, pack);
    stage("routes", overlays.routes.len());
    collaborators.finalize_features(&ctx, pack);
    stage("finalize_features", pack.features.len());

    let map = builder.finish();
    let report = ResampleReport::compare(&parent.overlays, &map);
    tracing::info!(
        target: "atlas::resample",
        cells = report.cells,
        cultures_removed = report.cultures_removed,
        states_removed = report.states_removed,
        provinces_removed = report.provinces_removed,
        religions_removed = report.religions_removed,
        burgs_removed = report.burgs_removed,
        rivers_removed = report.rivers_removed,
        routes_removed = report.routes_removed,
        markers_deleted = report.markers_deleted,
        "resample.completed"
    );
    Ok((map, report))
}

fn stage(name: &'static str, count: usize) {
    tracing::debug!(target: "atlas::resample", stage = name, count, "resample.stage.completed");
}

fn target_bounds(parent: &Map, options: &ResampleOptions) -> Result<Bounds, ResampleError> {
    let width = options.width.unwrap_or(parent.bounds.width);
    let height = options.height.unwrap_or(parent.bounds.height);
    let valid = |value: f64| value.is_finite() && value > 0.0;
    if !(valid(width) && valid(height)) {
        return Err(ResampleError::InvalidDimensions { width, height });
    }
    Ok(Bounds::new(width, height))
}

/// Explicit count, else the count that keeps the parent's point spacing
/// over the new extent. Counts whose lattice would exceed the configured
/// `max_cells` are rejected before anything is allocated.
fn cells_desired(
    parent: &Map,
    options: &ResampleOptions,
    bounds: Bounds,
) -> Result<usize, ResampleError> {
    let max_cells = options.config.lattice().max_cells();
    let cells = match options.cells_desired {
        Some(cells) => cells,
        None if parent.grid.spacing > 0.0 => {
            let spacing = round_to(parent.grid.spacing, 2);
            if spacing <= 0.0 {
                return Err(ResampleError::InvalidCellCount(usize::MAX));
            }
            let cells = (bounds.area() / (spacing * spacing)).round();
            if !cells.is_finite() || cells > max_cells as f64 {
                return Err(ResampleError::InvalidCellCount(cells as usize));
            }
            cells as usize
        }
        None => options.config.lattice().cells_desired(),
    };
    if cells == 0 || cells > max_cells {
        return Err(ResampleError::InvalidCellCount(cells));
    }
    match LatticeShape::new(bounds, cells).points() {
        Some(points) if points <= max_cells => Ok(cells),
        _ => Err(ResampleError::InvalidCellCount(cells)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        entities::{Burg, Culture},
        projection::FnProjection,
        restore::test_support::{flat_config, lattice_map},
    };

    #[test]
    fn default_options_reproduce_parent_lattice() {
        let parent = lattice_map(6, |cell| cell % 6 != 0);
        let options = ResampleOptions::default().with_config(flat_config());
        let map = resample(&parent, &options).expect("resample");
        assert_eq!(map.grid.points, parent.grid.points);
        assert_eq!(map.pack.cells.h, parent.pack.cells.h);
        assert_eq!(map.bounds, parent.bounds);
    }

    #[test]
    fn empty_parent_is_fatal() {
        let mut parent = lattice_map(3, |_| true);
        parent.pack = Pack::default();
        let err = resample(&parent, &ResampleOptions::default()).expect_err("empty parent");
        assert!(matches!(
            err,
            ResampleError::InvalidParent(MapValidationError::Empty)
        ));
    }

    #[test]
    fn bad_scale_and_dimensions_are_fatal() {
        let parent = lattice_map(3, |_| true);
        let err = resample(&parent, &ResampleOptions::default().with_scale(0.0))
            .expect_err("zero scale");
        assert!(matches!(err, ResampleError::InvalidScale(_)));

        let err = resample(&parent, &ResampleOptions::default().with_size(f64::NAN, 10.0))
            .expect_err("nan width");
        assert!(matches!(err, ResampleError::InvalidDimensions { .. }));
    }

    #[test]
    fn one_way_projection_is_rejected() {
        let parent = lattice_map(3, |_| true);
        let projection = FnProjection::new(
            |p: crate::geometry::Point| p,
            |p: crate::geometry::Point| crate::geometry::Point::new(p.x * 0.5, p.y),
        );
        let err = resample(&parent, &ResampleOptions::default().with_projection(projection))
            .expect_err("non-invertible");
        assert!(matches!(
            err,
            ResampleError::Projection(ProjectionError::NotInvertible { .. })
        ));
    }

    #[test]
    fn report_counts_fresh_removals_only() {
        let mut parent = lattice_map(3, |_| true);
        parent.pack.cells.culture = vec![1; 9];
        parent.overlays.cultures = (0..3)
            .map(|i| Culture {
                i,
                removed: i == 2,
                center: Some(4),
                ..Default::default()
            })
            .collect();
        parent.overlays.burgs = vec![
            Burg::default(),
            Burg {
                i: 1,
                x: 15.0,
                y: 15.0,
                ..Default::default()
            },
            Burg {
                i: 2,
                x: 16.0,
                y: 16.0,
                ..Default::default()
            },
        ]
        .into_iter()
        .collect();

        let options = ResampleOptions::default().with_config(flat_config());
        let (map, report) =
            resample_with_report(&parent, &options, &DefaultCollaborators).expect("resample");
        assert_eq!(report.cultures_removed, 0);
        assert_eq!(report.burgs_removed, 1);
        assert_eq!(report.cells, 9);
        assert!(map.overlays.cultures.get(2).expect("slot").removed);
    }
}
