use std::{
    env, fs, io,
    path::{Path, PathBuf},
    sync::Arc,
};

use serde::Deserialize;
use thiserror::Error;

pub const BUILTIN_RESAMPLE_CONFIG: &str = include_str!("data/resample_config.json");

/// Environment variable naming an override config file.
pub const RESAMPLE_CONFIG_ENV: &str = "RESAMPLE_CONFIG_PATH";

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct ResampleConfig {
    lattice: LatticeConfig,
    coordinate_precision: CoordinatePrecision,
    projection: ProjectionCheckConfig,
    features: FeatureConfig,
    military: MilitaryConfig,
    burgs: BurgPlacementConfig,
    routes: RouteConfig,
}

impl ResampleConfig {
    pub fn builtin() -> Arc<Self> {
        Arc::new(
            serde_json::from_str(BUILTIN_RESAMPLE_CONFIG)
                .expect("builtin resample config should parse"),
        )
    }

    pub fn from_json_str(json: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(json)
    }

    pub fn from_file(path: &Path) -> Result<Self, ResampleConfigError> {
        let contents =
            fs::read_to_string(path).map_err(|source| ResampleConfigError::ReadFailed {
                path: path.to_path_buf(),
                source,
            })?;
        let config = ResampleConfig::from_json_str(&contents)?;
        Ok(config)
    }

    pub fn lattice(&self) -> &LatticeConfig {
        &self.lattice
    }

    /// Decimal places kept on projected coordinates.
    pub fn precision(&self) -> u32 {
        self.coordinate_precision.0
    }

    pub fn projection(&self) -> &ProjectionCheckConfig {
        &self.projection
    }

    pub fn features(&self) -> &FeatureConfig {
        &self.features
    }

    pub fn military(&self) -> &MilitaryConfig {
        &self.military
    }

    pub fn burgs(&self) -> &BurgPlacementConfig {
        &self.burgs
    }

    pub fn routes(&self) -> &RouteConfig {
        &self.routes
    }
}

#[derive(Debug, Error)]
pub enum ResampleConfigError {
    #[error("failed to parse resample config: {0}")]
    Parse(#[from] serde_json::Error),
    #[error("failed to read resample config from {path:?}: {source}")]
    ReadFailed {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
}

#[derive(Debug, Clone, Copy, Deserialize)]
#[serde(transparent)]
struct CoordinatePrecision(u32);

impl Default for CoordinatePrecision {
    fn default() -> Self {
        Self(2)
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct LatticeConfig {
    cells_desired: usize,
    jitter: f64,
    max_cells: usize,
}

impl LatticeConfig {
    pub fn cells_desired(&self) -> usize {
        self.cells_desired.max(1)
    }

    pub fn jitter(&self) -> f64 {
        self.jitter.clamp(0.0, 1.0)
    }

    /// Largest lattice a resample may allocate.
    pub fn max_cells(&self) -> usize {
        self.max_cells.max(1)
    }
}

impl Default for LatticeConfig {
    fn default() -> Self {
        Self {
            cells_desired: 10_000,
            jitter: 0.9,
            max_cells: 1_000_000,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ProjectionCheckConfig {
    tolerance: f64,
    probes: usize,
}

impl ProjectionCheckConfig {
    /// Largest accepted round-trip error.
    pub fn tolerance(&self) -> f64 {
        self.tolerance.abs()
    }

    /// Probe lattice edge length used by the invertibility check.
    pub fn probes(&self) -> usize {
        self.probes.max(2)
    }
}

impl Default for ProjectionCheckConfig {
    fn default() -> Self {
        Self {
            tolerance: 0.01,
            probes: 16,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct FeatureConfig {
    continent_min_cells: usize,
}

impl FeatureConfig {
    pub fn continent_min_cells(&self) -> usize {
        self.continent_min_cells
    }
}

impl Default for FeatureConfig {
    fn default() -> Self {
        Self {
            continent_min_cells: 500,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct MilitaryConfig {
    vertical_gap: f64,
    relocated_prefix: String,
}

impl MilitaryConfig {
    /// Offset between regiments stacked on the same fallback cell.
    pub fn vertical_gap(&self) -> f64 {
        self.vertical_gap
    }

    pub fn relocated_prefix(&self) -> &str {
        &self.relocated_prefix
    }
}

impl Default for MilitaryConfig {
    fn default() -> Self {
        Self {
            vertical_gap: 8.0,
            relocated_prefix: "[relocated]".to_string(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct BurgPlacementConfig {
    port_edge_offset: f64,
}

impl BurgPlacementConfig {
    /// Fraction of the way from a port's cell centre towards its haven.
    pub fn port_edge_offset(&self) -> f64 {
        self.port_edge_offset.clamp(0.0, 1.0)
    }
}

impl Default for BurgPlacementConfig {
    fn default() -> Self {
        Self {
            port_edge_offset: 0.45,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct RouteConfig {
    min_points: usize,
}

impl RouteConfig {
    pub fn min_points(&self) -> usize {
        self.min_points.max(2)
    }
}

impl Default for RouteConfig {
    fn default() -> Self {
        Self { min_points: 2 }
    }
}

/// Load the resample config named by `RESAMPLE_CONFIG_PATH`, falling back
/// to the builtin config when unset or unreadable.
pub fn load_resample_config_from_env() -> Arc<ResampleConfig> {
    if let Ok(path) = env::var(RESAMPLE_CONFIG_ENV) {
        let path = PathBuf::from(path);
        match ResampleConfig::from_file(&path) {
            Ok(config) => {
                tracing::info!(
                    target: "atlas::config",
                    path = %path.display(),
                    "resample_config.loaded=file"
                );
                return Arc::new(config);
            }
            Err(err) => {
                tracing::warn!(
                    target: "atlas::config",
                    path = %path.display(),
                    error = %err,
                    "resample_config.load_failed"
                );
            }
        }
    }

    tracing::info!(target: "atlas::config", "resample_config.loaded=builtin");
    ResampleConfig::builtin()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builtin_config_parses() {
        let config = ResampleConfig::builtin();
        assert_eq!(config.lattice().cells_desired(), 10_000);
        assert_eq!(config.lattice().max_cells(), 1_000_000);
        assert_eq!(config.precision(), 2);
        assert_eq!(config.projection().tolerance(), 0.01);
        assert_eq!(config.military().relocated_prefix(), "[relocated]");
    }

    #[test]
    fn partial_json_keeps_defaults() {
        let config = ResampleConfig::from_json_str(r#"{ "military": { "vertical_gap": 4.0 } }"#)
            .expect("partial config parses");
        assert_eq!(config.military().vertical_gap(), 4.0);
        assert_eq!(config.military().relocated_prefix(), "[relocated]");
        assert_eq!(config.lattice().jitter(), 0.9);
        assert_eq!(config.routes().min_points(), 2);
    }

    #[test]
    fn missing_file_reports_path() {
        let err = ResampleConfig::from_file(Path::new("/nonexistent/resample.json"))
            .expect_err("file does not exist");
        assert!(matches!(err, ResampleConfigError::ReadFailed { .. }));
    }
}
