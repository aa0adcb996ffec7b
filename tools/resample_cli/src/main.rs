use std::{
    fs,
    path::{Path, PathBuf},
    sync::Arc,
};

use anyhow::{ensure, Context, Result};
use atlas_core::{
    load_resample_config_from_env, resample_with_report, AffineProjection, DefaultCollaborators,
    Map, Point, ResampleConfig, ResampleOptions,
};
use clap::Parser;

#[derive(Parser, Debug)]
#[command(author, version, about = "Resample an Atlas map to a new size or projection", long_about = None)]
struct Args {
    /// Path to the parent map JSON
    #[arg(long)]
    input: PathBuf,

    /// Where to write the resampled map JSON
    #[arg(long)]
    output: PathBuf,

    /// Area/population factor between parent and new map
    #[arg(long, default_value_t = 1.0)]
    scale: f64,

    /// Parent-space x coordinate placed on the new map's left edge
    #[arg(long, default_value_t = 0.0)]
    offset_x: f64,

    /// Parent-space y coordinate placed on the new map's top edge
    #[arg(long, default_value_t = 0.0)]
    offset_y: f64,

    /// Magnification applied to parent coordinates
    #[arg(long, default_value_t = 1.0)]
    zoom: f64,

    /// New map width (defaults to the parent's)
    #[arg(long)]
    width: Option<f64>,

    /// New map height (defaults to the parent's)
    #[arg(long)]
    height: Option<f64>,

    /// Desired lattice points (defaults to the parent's spacing)
    #[arg(long)]
    cells: Option<usize>,

    /// Lattice seed (defaults to the parent's)
    #[arg(long)]
    seed: Option<u64>,

    /// Smooth the sampled heightmap
    #[arg(long)]
    smooth: bool,

    /// Lower land under parent rivers
    #[arg(long)]
    depress_rivers: bool,

    /// Resample config JSON (overrides RESAMPLE_CONFIG_PATH)
    #[arg(long)]
    config: Option<PathBuf>,

    /// Pretty-print the output JSON
    #[arg(long)]
    pretty: bool,
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    let args = Args::parse();
    ensure!(
        args.zoom.is_finite() && args.zoom > 0.0,
        "Zoom must be a positive number, got {}",
        args.zoom
    );

    let parent = read_map(&args.input)?;
    let config = match &args.config {
        Some(path) => Arc::new(
            ResampleConfig::from_file(path)
                .with_context(|| format!("Failed to load config {}", path.display()))?,
        ),
        None => load_resample_config_from_env(),
    };

    let projection = AffineProjection {
        origin: Point::new(args.offset_x, args.offset_y),
        zoom_x: args.zoom,
        zoom_y: args.zoom,
    };
    let mut options = ResampleOptions::default()
        .with_projection(projection)
        .with_scale(args.scale)
        .with_config(config)
        .smoothing(args.smooth)
        .depressing_rivers(args.depress_rivers);
    options.width = args.width;
    options.height = args.height;
    options.cells_desired = args.cells;
    options.seed = args.seed;

    let (map, report) = resample_with_report(&parent, &options, &DefaultCollaborators)
        .with_context(|| format!("Failed to resample {}", args.input.display()))?;

    let json = if args.pretty {
        serde_json::to_string_pretty(&map)?
    } else {
        serde_json::to_string(&map)?
    };
    fs::write(&args.output, json)
        .with_context(|| format!("Failed to write map to {}", args.output.display()))?;

    tracing::info!(
        target: "atlas::cli",
        output = %args.output.display(),
        cells = report.cells,
        "resample_cli.written"
    );
    println!(
        "{} cells; removed: {} cultures, {} states, {} provinces, {} religions, {} burgs, {} rivers, {} routes; {} markers deleted",
        report.cells,
        report.cultures_removed,
        report.states_removed,
        report.provinces_removed,
        report.religions_removed,
        report.burgs_removed,
        report.rivers_removed,
        report.routes_removed,
        report.markers_deleted,
    );
    Ok(())
}

fn read_map(path: &Path) -> Result<Map> {
    let data = fs::read_to_string(path)
        .with_context(|| format!("Failed to read map at {}", path.display()))?;
    serde_json::from_str(&data)
        .with_context(|| format!("Failed to parse map JSON at {}", path.display()))
}
