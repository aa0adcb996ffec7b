//! Generator steps the resampler invokes but does not own.
//!
//! Each hook has a working default so a plain [`DefaultCollaborators`] is
//! enough to resample a map; callers with their own terrain, river or graph
//! generators override the hooks they care about.

use crate::{
    config::ResampleConfig,
    context::ResampleContext,
    entities::{EntityList, River, Route},
    features,
    graph::build_lattice_graph,
    grid::Grid,
    pack::{Pack, PackCells},
    restore::inherit_biomes,
    rivers::restore_rivers,
    routes::restore_routes,
};

pub trait MapCollaborators {
    /// Land/water bodies and coast distance over the lattice.
    ///
    /// Requires `grid.cells.h`; produces `grid.cells.f`, `grid.cells.t` and
    /// `grid.features`.
    fn markup_grid(&self, grid: &mut Grid, config: &ResampleConfig) {
        features::markup_grid(grid, config.features().continent_min_cells());
    }

    /// Ocean layers and climate. Temperature and precipitation are already
    /// sampled from the parent, so the default leaves the grid untouched.
    fn derive_climate(&self, _grid: &mut Grid) {}

    /// Turn the lattice into a cell graph with `g`, neighbours, area,
    /// border flags and heights filled in.
    fn build_graph(&self, grid: &Grid) -> PackCells {
        build_lattice_graph(grid)
    }

    /// Feature ids, coast distance and havens over the cell graph.
    fn markup_pack(&self, pack: &mut Pack, config: &ResampleConfig) {
        features::markup_pack(pack, config.features().continent_min_cells());
    }

    /// River entities for the new graph; must also fill `pack.cells.r` and
    /// `pack.cells.conf`.
    fn generate_rivers(&self, ctx: &ResampleContext<'_>, pack: &mut Pack) -> EntityList<River> {
        restore_rivers(ctx, pack)
    }

    /// Fill `pack.cells.biome`.
    fn define_biomes(&self, ctx: &ResampleContext<'_>, pack: &mut Pack) {
        inherit_biomes(ctx, pack);
    }

    fn regenerate_routes(&self, ctx: &ResampleContext<'_>, pack: &Pack) -> EntityList<Route> {
        restore_routes(ctx, pack)
    }

    /// Last pass over feature metadata once every overlay is in place.
    fn finalize_features(&self, ctx: &ResampleContext<'_>, pack: &mut Pack) {
        features::inherit_feature_details(ctx, pack);
    }
}

/// Collaborators backed entirely by the built-in defaults.
#[derive(Debug, Clone, Copy, Default)]
pub struct DefaultCollaborators;

impl MapCollaborators for DefaultCollaborators {}
