use log::{debug, error, info};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

use crate::editor::zoom::Scale;
use crate::render::DEFAULT_CACHE_SIZE;

pub const CURRENT_VERSION: u32 = 1;

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("failed to read {path:?}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid configuration: {0}")]
    Yaml(#[from] serde_yaml::Error),
}

/// Look of the dashed crop outline
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct StrokeSettings {
    /// RGBA stroke color
    #[serde(default = "default_stroke_color")]
    pub color: [u8; 4],

    /// Line width in raster pixels
    #[serde(default = "default_line_width")]
    pub line_width: u32,

    /// Dash pattern as `[on, off]` pixel lengths
    #[serde(default = "default_dash")]
    pub dash: [u32; 2],
}

impl Default for StrokeSettings {
    fn default() -> Self {
        Self {
            color: default_stroke_color(),
            line_width: default_line_width(),
            dash: default_dash(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EditorConfig {
    #[serde(default = "default_version")]
    pub version: u32,

    /// Initial zoom factor; absent means fit to container width
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub initial_scale: Option<f32>,

    #[serde(default = "default_zoom_step")]
    pub zoom_step: f32,

    #[serde(default = "default_min_scale")]
    pub min_scale: f32,

    /// Drags with a side shorter than this (raster pixels) are discarded
    #[serde(default = "default_min_selection_px")]
    pub min_selection_px: f32,

    #[serde(default)]
    pub selection_stroke: StrokeSettings,

    /// Number of painted page rasters kept by the render worker
    #[serde(default = "default_cache_size")]
    pub cache_size: usize,

    /// How long notifications stay visible
    #[serde(default = "default_notification_secs")]
    pub notification_secs: u64,
}

fn default_version() -> u32 {
    CURRENT_VERSION
}

fn default_zoom_step() -> f32 {
    0.25
}

fn default_min_scale() -> f32 {
    0.25
}

fn default_min_selection_px() -> f32 {
    5.0
}

fn default_stroke_color() -> [u8; 4] {
    // rgba(79, 70, 229, 0.9)
    [79, 70, 229, 230]
}

fn default_line_width() -> u32 {
    2
}

fn default_dash() -> [u32; 2] {
    [8, 4]
}

fn default_cache_size() -> usize {
    DEFAULT_CACHE_SIZE
}

fn default_notification_secs() -> u64 {
    5
}

impl Default for EditorConfig {
    fn default() -> Self {
        Self {
            version: CURRENT_VERSION,
            initial_scale: None,
            zoom_step: default_zoom_step(),
            min_scale: default_min_scale(),
            min_selection_px: default_min_selection_px(),
            selection_stroke: StrokeSettings::default(),
            cache_size: default_cache_size(),
            notification_secs: default_notification_secs(),
        }
    }
}

impl EditorConfig {
    /// Parse a YAML document; missing keys take their defaults.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Yaml`] for malformed YAML or mistyped values.
    pub fn from_yaml_str(content: &str) -> Result<Self, ConfigError> {
        let mut config: Self = serde_yaml::from_str(content)?;
        config.sanitize();
        Ok(config)
    }

    /// Read and parse a YAML configuration file.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] if the file cannot be read or parsed.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let content = fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let config = Self::from_yaml_str(&content)?;
        debug!("Loaded editor config from {path:?}");
        Ok(config)
    }

    /// Load `path`, falling back to defaults (and logging why) on any error
    #[must_use]
    pub fn load_or_default(path: &Path) -> Self {
        match Self::load(path) {
            Ok(config) => config,
            Err(e) => {
                error!("{e}; using default editor settings");
                Self::default()
            }
        }
    }

    /// Scale a freshly opened session starts at
    #[must_use]
    pub fn initial_scale(&self) -> Scale {
        self.initial_scale.map_or(Scale::Fit, Scale::Factor)
    }

    fn sanitize(&mut self) {
        if !(self.min_scale.is_finite() && self.min_scale > 0.0) {
            info!("min_scale {} is not positive, using default", self.min_scale);
            self.min_scale = default_min_scale();
        }
        if !(self.zoom_step.is_finite() && self.zoom_step > 0.0) {
            info!("zoom_step {} is not positive, using default", self.zoom_step);
            self.zoom_step = default_zoom_step();
        }
        if let Some(scale) = self.initial_scale {
            if !scale.is_finite() || scale < self.min_scale {
                info!("initial_scale {scale} is below min_scale, using fit");
                self.initial_scale = None;
            }
        }
    }
}
