//! Map resampling core for the Atlas map generator.
//!
//! Rebuilds a procedural map (jittered point lattice, polygonal cell graph
//! and overlay entities) at a new resolution and/or projection via
//! [`resample`], carrying political, cultural, religious, settlement and
//! zone data across while keeping every entity's index stable.

mod collaborators;
mod config;
mod context;
mod entities;
mod features;
mod geometry;
mod graph;
mod grid;
mod heightmap;
mod map;
mod pack;
mod pipeline;
mod poles;
mod projection;
pub mod restore;
mod rivers;
mod routes;
mod sampler;
mod spatial;

pub use collaborators::{DefaultCollaborators, MapCollaborators};
pub use config::{
    load_resample_config_from_env, BurgPlacementConfig, FeatureConfig, LatticeConfig,
    MilitaryConfig, ProjectionCheckConfig, ResampleConfig, ResampleConfigError, RouteConfig,
    BUILTIN_RESAMPLE_CONFIG, RESAMPLE_CONFIG_ENV,
};
pub use context::ResampleContext;
pub use entities::{
    Burg, Centered, Culture, Entity, EntityId, EntityList, Marker, Province, Regiment, Religion,
    River, Route, RoutePoint, State, Zone,
};
pub use features::{
    inherit_feature_details, markup, markup_grid, markup_pack, Feature, FeatureKind, Markup,
};
pub use geometry::{polyline_length, round_to, Bounds, Point};
pub use graph::build_lattice_graph;
pub use grid::{is_land_height, Grid, GridCellId, GridCells, LatticeShape, SEA_LEVEL};
pub use heightmap::{depress_rivers, smooth_heightmap};
pub use map::{Map, MapValidationError, Overlays};
pub use pack::{CellId, Pack, PackCells};
pub use pipeline::{
    resample, resample_with, resample_with_report, MapBuilder, ResampleError, ResampleOptions,
    ResampleReport,
};
pub use poles::poles_for;
pub use projection::{
    check_invertible, AffineProjection, FnProjection, IdentityProjection, Projection,
    ProjectionError,
};
pub use rivers::{basin_of, restore_rivers};
pub use routes::restore_routes;
pub use sampler::sample_primary_fields;
pub use spatial::SpatialIndex;
