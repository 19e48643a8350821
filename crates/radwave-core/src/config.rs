//! Configuration loading and typed config structures for the driver.
//!
//! The canonical configuration lives in `radwave-config.yaml` at the
//! project root. This module defines strongly-typed structs that mirror
//! the YAML structure, and provides a loader that reads the file. Every
//! default matches the values the production animation ships with, so a
//! missing file (or any missing section) runs the canonical animation.

use std::path::{Path, PathBuf};

use chrono::{DateTime, TimeZone, Utc};
use radwave_types::{Color, DatasetKind};
use serde::Deserialize;

use crate::clock::{ClockError, TimeWindow};
use crate::dataset::DatasetSpec;
use crate::engine::SceneSettings;

/// Errors that can occur when loading configuration.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// Failed to read the configuration file from disk.
    #[error("failed to read config file: {source}")]
    Io {
        /// The underlying I/O error.
        #[from]
        source: std::io::Error,
    },

    /// Failed to parse YAML content.
    #[error("failed to parse config YAML: {source}")]
    Yaml {
        /// The underlying YAML parse error.
        source: serde_yml::Error,
    },

    /// A layer color string is not valid hex.
    #[error("invalid layer color: {value}")]
    InvalidColor {
        /// The offending color string.
        value: String,
    },
}

impl From<serde_yml::Error> for ConfigError {
    fn from(source: serde_yml::Error) -> Self {
        Self::Yaml { source }
    }
}

/// Top-level driver configuration.
///
/// Mirrors the structure of `radwave-config.yaml`. All fields default to
/// the production animation's values.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct VisualizationConfig {
    /// Simulated time window and clock rate.
    #[serde(default)]
    pub time: TimeConfig,

    /// Startup camera target.
    #[serde(default)]
    pub camera: CameraConfig,

    /// Startup scene toggles and imagery.
    #[serde(default)]
    pub scene: SceneConfig,

    /// Dataset file locations.
    #[serde(default)]
    pub data: DataConfig,

    /// Per-dataset layer presentation.
    #[serde(default)]
    pub layers: LayerStylesConfig,

    /// Frame loop pacing and bounds.
    #[serde(default)]
    pub frame: FrameConfig,

    /// Logging configuration.
    #[serde(default)]
    pub logging: LoggingConfig,
}

impl VisualizationConfig {
    /// Load configuration from a YAML file at the given path.
    ///
    /// The `RADWAVE_DATA_DIR` environment variable overrides
    /// `data.dir`, so deployments can point at a dataset directory
    /// without editing the file.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Io`] if the file cannot be read, or
    /// [`ConfigError::Yaml`] if the content is not valid YAML.
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let contents = std::fs::read_to_string(path)?;
        let mut config: Self = serde_yml::from_str(&contents)?;
        config.data.apply_env_overrides();
        Ok(config)
    }

    /// Parse configuration from a YAML string.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Yaml`] if the string is not valid YAML.
    pub fn parse(yaml: &str) -> Result<Self, ConfigError> {
        let mut config: Self = serde_yml::from_str(yaml)?;
        config.data.apply_env_overrides();
        Ok(config)
    }

    /// Build the animation's time window from the configured bounds.
    ///
    /// # Errors
    ///
    /// Returns [`ClockError::InvalidWindow`] when the bounds are not
    /// strictly ordered.
    pub fn window(&self) -> Result<TimeWindow, ClockError> {
        TimeWindow::new(self.time.start, self.time.end)
    }

    /// Resolve the four dataset descriptors from file and style config.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::InvalidColor`] when a layer color string
    /// does not parse.
    pub fn dataset_specs(&self) -> Result<Vec<DatasetSpec>, ConfigError> {
        DatasetKind::all()
            .into_iter()
            .map(|kind| {
                let style = self.layers.style_for(kind);
                let color =
                    Color::from_hex(&style.color).ok_or_else(|| ConfigError::InvalidColor {
                        value: style.color.clone(),
                    })?;
                Ok(DatasetSpec::new(
                    kind,
                    self.data.file_for(kind).to_owned(),
                    color,
                    style.scale_factor,
                ))
            })
            .collect()
    }
}

/// Simulated time window and clock rate.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct TimeConfig {
    /// Start of the repeat interval.
    #[serde(default = "default_window_start")]
    pub start: DateTime<Utc>,

    /// End of the repeat interval.
    #[serde(default = "default_window_end")]
    pub end: DateTime<Utc>,

    /// Clock rate in simulated seconds per wall-clock second.
    /// The default advances 120 simulated days per wall second.
    #[serde(default = "default_rate_seconds_per_second")]
    pub rate_seconds_per_second: f64,
}

impl Default for TimeConfig {
    fn default() -> Self {
        Self {
            start: default_window_start(),
            end: default_window_end(),
            rate_seconds_per_second: default_rate_seconds_per_second(),
        }
    }
}

/// Startup camera target.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct CameraConfig {
    /// Right ascension of the view center, in hours.
    #[serde(default = "default_camera_ra_hours")]
    pub ra_hours: f64,

    /// Declination of the view center, in degrees.
    #[serde(default = "default_camera_dec_degrees")]
    pub dec_degrees: f64,

    /// Zoom level of the view.
    #[serde(default = "default_camera_zoom")]
    pub zoom: f64,

    /// Whether the camera jumps instantly instead of animating.
    #[serde(default = "default_true")]
    pub instant: bool,
}

impl Default for CameraConfig {
    fn default() -> Self {
        Self {
            ra_hours: default_camera_ra_hours(),
            dec_degrees: default_camera_dec_degrees(),
            zoom: default_camera_zoom(),
            instant: true,
        }
    }
}

/// Startup scene toggles and imagery.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct SceneConfig {
    /// Background imagery set name.
    #[serde(default = "default_imagery")]
    pub background_imagery: String,

    /// Foreground imagery set name.
    #[serde(default = "default_imagery")]
    pub foreground_imagery: String,

    /// Whether background stars are drawn in solar-system mode.
    #[serde(default)]
    pub solar_system_stars: bool,

    /// Whether planets render at their true scale.
    #[serde(default = "default_true")]
    pub actual_planet_scale: bool,

    /// Whether constellation figures are drawn.
    #[serde(default)]
    pub constellation_figures: bool,

    /// Whether the view crosshair is drawn.
    #[serde(default)]
    pub crosshairs: bool,
}

impl SceneConfig {
    /// The engine-facing view toggles.
    pub const fn engine_settings(&self) -> SceneSettings {
        SceneSettings {
            solar_system_stars: self.solar_system_stars,
            actual_planet_scale: self.actual_planet_scale,
            constellation_figures: self.constellation_figures,
            crosshairs: self.crosshairs,
        }
    }
}

impl Default for SceneConfig {
    fn default() -> Self {
        Self {
            background_imagery: default_imagery(),
            foreground_imagery: default_imagery(),
            solar_system_stars: false,
            actual_planet_scale: true,
            constellation_figures: false,
            crosshairs: false,
        }
    }
}

/// Dataset file locations.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct DataConfig {
    /// Directory the dataset files live in.
    #[serde(default = "default_data_dir")]
    pub dir: String,

    /// Dust dataset file name.
    #[serde(default = "default_dust_file")]
    pub dust_file: String,

    /// Cluster dataset file name.
    #[serde(default = "default_cluster_file")]
    pub cluster_file: String,

    /// Sun dataset file name.
    #[serde(default = "default_sun_file")]
    pub sun_file: String,

    /// Best-fit dataset file name.
    #[serde(default = "default_best_fit_file")]
    pub best_fit_file: String,
}

impl DataConfig {
    /// Override the data directory with `RADWAVE_DATA_DIR` when set.
    pub fn apply_env_overrides(&mut self) {
        if let Ok(val) = std::env::var("RADWAVE_DATA_DIR") {
            self.dir = val;
        }
    }

    /// The configured file name for a dataset.
    pub fn file_for(&self, kind: DatasetKind) -> &str {
        match kind {
            DatasetKind::Dust => &self.dust_file,
            DatasetKind::Cluster => &self.cluster_file,
            DatasetKind::Sun => &self.sun_file,
            DatasetKind::BestFit => &self.best_fit_file,
        }
    }

    /// Full path to a dataset file.
    pub fn path_for(&self, kind: DatasetKind) -> PathBuf {
        Path::new(&self.dir).join(self.file_for(kind))
    }
}

impl Default for DataConfig {
    fn default() -> Self {
        Self {
            dir: default_data_dir(),
            dust_file: default_dust_file(),
            cluster_file: default_cluster_file(),
            sun_file: default_sun_file(),
            best_fit_file: default_best_fit_file(),
        }
    }
}

/// Presentation settings for one layer.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct LayerStyleConfig {
    /// Marker / line color as a `#rrggbb` hex string.
    pub color: String,

    /// Marker size multiplier.
    pub scale_factor: f64,
}

/// Per-dataset layer presentation.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct LayerStylesConfig {
    /// Dust layer style.
    #[serde(default = "default_dust_style")]
    pub dust: LayerStyleConfig,

    /// Cluster layer style.
    #[serde(default = "default_cluster_style")]
    pub cluster: LayerStyleConfig,

    /// Sun layer style.
    #[serde(default = "default_sun_style")]
    pub sun: LayerStyleConfig,

    /// Best-fit layer style.
    #[serde(default = "default_best_fit_style")]
    pub best_fit: LayerStyleConfig,
}

impl LayerStylesConfig {
    /// The configured style for a dataset.
    pub const fn style_for(&self, kind: DatasetKind) -> &LayerStyleConfig {
        match kind {
            DatasetKind::Dust => &self.dust,
            DatasetKind::Cluster => &self.cluster,
            DatasetKind::Sun => &self.sun,
            DatasetKind::BestFit => &self.best_fit,
        }
    }
}

impl Default for LayerStylesConfig {
    fn default() -> Self {
        Self {
            dust: default_dust_style(),
            cluster: default_cluster_style(),
            sun: default_sun_style(),
            best_fit: default_best_fit_style(),
        }
    }
}

/// Frame loop pacing and bounds.
///
/// Both limits default to 0 (unlimited): the production animation cycles
/// until the process is torn down.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct FrameConfig {
    /// Real-time milliseconds between frames.
    #[serde(default = "default_frame_interval_ms")]
    pub interval_ms: u64,

    /// Maximum number of frames before the run ends (0 = unlimited).
    #[serde(default)]
    pub max_frames: u64,

    /// Maximum wall-clock seconds before the run ends (0 = unlimited).
    #[serde(default)]
    pub max_real_time_seconds: u64,
}

impl Default for FrameConfig {
    fn default() -> Self {
        Self {
            interval_ms: default_frame_interval_ms(),
            max_frames: 0,
            max_real_time_seconds: 0,
        }
    }
}

/// Logging configuration.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct LoggingConfig {
    /// Log level (trace, debug, info, warn, error).
    #[serde(default = "default_log_level")]
    pub level: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
        }
    }
}

// ---------------------------------------------------------------------------
// Default value functions (serde default requires named functions)
// ---------------------------------------------------------------------------

fn default_window_start() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2023, 10, 17, 11, 55, 55)
        .single()
        .unwrap_or(DateTime::UNIX_EPOCH)
}

fn default_window_end() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2025, 10, 6, 11, 55, 55)
        .single()
        .unwrap_or(DateTime::UNIX_EPOCH)
}

const fn default_rate_seconds_per_second() -> f64 {
    // 120 days of simulated time per wall second.
    120.0 * 86_400.0
}

const fn default_camera_ra_hours() -> f64 {
    22.368_014_971_926_89
}

const fn default_camera_dec_degrees() -> f64 {
    22.68
}

const fn default_camera_zoom() -> f64 {
    2_189_465_275.403_066_6
}

fn default_imagery() -> String {
    "Solar System".to_owned()
}

fn default_data_dir() -> String {
    "data".to_owned()
}

fn default_dust_file() -> String {
    "RW_dust_oscillation_phase_updated_radec.csv".to_owned()
}

fn default_cluster_file() -> String {
    "RW_cluster_oscillation_phase_updated_radec.csv".to_owned()
}

fn default_sun_file() -> String {
    "Sun_radec_C.csv".to_owned()
}

fn default_best_fit_file() -> String {
    "RW_best_fit_oscillation_phase_radec.csv".to_owned()
}

fn default_dust_style() -> LayerStyleConfig {
    LayerStyleConfig {
        color: "#ec0018".to_owned(),
        scale_factor: 25.0,
    }
}

fn default_cluster_style() -> LayerStyleConfig {
    LayerStyleConfig {
        color: "#1f3cf1".to_owned(),
        scale_factor: 30.0,
    }
}

fn default_sun_style() -> LayerStyleConfig {
    LayerStyleConfig {
        color: "#ffff0a".to_owned(),
        scale_factor: 50.0,
    }
}

fn default_best_fit_style() -> LayerStyleConfig {
    LayerStyleConfig {
        color: "#83befb".to_owned(),
        scale_factor: 50.0,
    }
}

const fn default_frame_interval_ms() -> u64 {
    16
}

fn default_log_level() -> String {
    "info".to_owned()
}

const fn default_true() -> bool {
    true
}
