use crate::domains::navigation::assignment::AssignmentSettings;
use crate::domains::navigation::builder::BuildLimits;
use crate::domains::navigation::geometry::GridBounds;
use anyhow::Result;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub grid: GridConfig,
    pub assignment: AssignmentSettings,
    pub correction: CorrectionConfig,
    pub logging: LoggingConfig,
    pub data: DataConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GridConfig {
    pub width: i32,
    pub height: i32,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct CorrectionConfig {
    /// Defaults to the grid cell count when unset.
    pub max_halfway_nodes: Option<usize>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    pub level: String,
    pub file: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DataConfig {
    pub dir: Option<PathBuf>,
    pub surface: String,
    /// Name of a cached network under `graphs/`; rebuilt and saved when missing.
    pub graph: Option<String>,
}

impl Config {
    pub async fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = tokio::fs::read_to_string(path).await?;
        Self::from_toml_str(&content)
    }

    pub fn from_toml_str(content: &str) -> Result<Self> {
        let config: Config = toml::from_str(content)?;
        Ok(config)
    }

    /// Optional file overlaid with `NODAL_NAV__SECTION__KEY` environment variables.
    pub fn load_layered(path: Option<&Path>) -> Result<Self> {
        let mut builder = config::Config::builder();
        if let Some(path) = path {
            builder = builder.add_source(config::File::from(path).required(false));
        }
        let settings = builder
            .add_source(
                config::Environment::with_prefix("NODAL_NAV")
                    .prefix_separator("__")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?;
        Ok(settings.try_deserialize()?)
    }

    pub fn bounds(&self) -> GridBounds {
        GridBounds::new(self.grid.width, self.grid.height)
    }

    pub fn build_limits(&self) -> BuildLimits {
        let limits = BuildLimits::for_bounds(self.bounds());
        BuildLimits {
            max_halfway_nodes: self.correction.max_halfway_nodes.unwrap_or(limits.max_halfway_nodes),
            ..limits
        }
    }
}

impl Default for GridConfig {
    fn default() -> Self {
        let bounds = GridBounds::default();
        Self {
            width: bounds.width,
            height: bounds.height,
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            file: None,
        }
    }
}

impl Default for DataConfig {
    fn default() -> Self {
        Self {
            dir: None,
            surface: "surface.geojson".to_string(),
            graph: None,
        }
    }
}
