//! Configuration file support.
//!
//! Editor tunables and review thresholds are kept in a small versioned JSON
//! file so a deployment can change them without rebuilding.

use serde::{Deserialize, Serialize};

use crate::constants::{
    CONFIDENCE_SLIDER_MAX, CONFIDENCE_SLIDER_MIN, DEFAULT_CIOU_THRESHOLD, DEFAULT_CONFIDENCE,
    DEFAULT_REMOVAL_CONFIDENCE, MIN_DRAW_SIZE,
};

/// Log level setting for the application.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum LogLevel {
    /// Show only errors
    Error,
    /// Show errors and warnings
    Warn,
    /// Show errors, warnings, and info messages
    #[default]
    Info,
    /// Show debug-level logging
    Debug,
    /// Show all log messages including trace
    Trace,
}

impl LogLevel {
    pub fn name(&self) -> &'static str {
        match self {
            LogLevel::Error => "Error",
            LogLevel::Warn => "Warn",
            LogLevel::Info => "Info",
            LogLevel::Debug => "Debug",
            LogLevel::Trace => "Trace",
        }
    }

    /// Convert to log crate's LevelFilter.
    pub fn to_level_filter(&self) -> log::LevelFilter {
        match self {
            LogLevel::Error => log::LevelFilter::Error,
            LogLevel::Warn => log::LevelFilter::Warn,
            LogLevel::Info => log::LevelFilter::Info,
            LogLevel::Debug => log::LevelFilter::Debug,
            LogLevel::Trace => log::LevelFilter::Trace,
        }
    }
}

/// Current configuration file format version.
/// Increment this when making breaking changes to the config format.
pub const CONFIG_VERSION: u32 = 1;

/// Editor configuration as stored on disk.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EditorConfig {
    /// Version of the configuration file format
    pub version: u32,

    #[serde(default)]
    pub preferences: Preferences,

    #[serde(default)]
    pub editor: EditorSettings,

    #[serde(default)]
    pub review: ReviewSettings,
}

/// General preferences.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct Preferences {
    /// Log verbosity level
    #[serde(default)]
    pub log_level: LogLevel,
}

/// Tunables of the interactive editor.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EditorSettings {
    /// Minimum screen-space width and height of a draw gesture
    #[serde(default = "default_min_draw_size")]
    pub min_draw_size: f64,

    /// Confidence given to user-drawn regions
    #[serde(default = "default_confidence")]
    pub default_confidence: f64,

    #[serde(default = "default_slider_min")]
    pub confidence_slider_min: f64,

    #[serde(default = "default_slider_max")]
    pub confidence_slider_max: f64,
}

fn default_min_draw_size() -> f64 {
    MIN_DRAW_SIZE
}

fn default_confidence() -> f64 {
    DEFAULT_CONFIDENCE
}

fn default_slider_min() -> f64 {
    CONFIDENCE_SLIDER_MIN
}

fn default_slider_max() -> f64 {
    CONFIDENCE_SLIDER_MAX
}

impl Default for EditorSettings {
    fn default() -> Self {
        Self {
            min_draw_size: default_min_draw_size(),
            default_confidence: default_confidence(),
            confidence_slider_min: default_slider_min(),
            confidence_slider_max: default_slider_max(),
        }
    }
}

/// Thresholds used when flagging a case for second review.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReviewSettings {
    /// Matched pairs whose CIoU falls below this are significant differences
    #[serde(default = "default_ciou_threshold")]
    pub ciou_threshold: f64,

    /// Removed predictions at or above this confidence are flagged
    #[serde(default = "default_confidence_threshold")]
    pub confidence_threshold: f64,
}

fn default_ciou_threshold() -> f64 {
    DEFAULT_CIOU_THRESHOLD
}

fn default_confidence_threshold() -> f64 {
    DEFAULT_REMOVAL_CONFIDENCE
}

impl Default for ReviewSettings {
    fn default() -> Self {
        Self {
            ciou_threshold: default_ciou_threshold(),
            confidence_threshold: default_confidence_threshold(),
        }
    }
}

impl EditorConfig {
    pub fn new() -> Self {
        Self {
            version: CONFIG_VERSION,
            preferences: Preferences::default(),
            editor: EditorSettings::default(),
            review: ReviewSettings::default(),
        }
    }

    /// Serialize the configuration to JSON.
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }

    /// Deserialize configuration from JSON.
    pub fn from_json(json: &str) -> Result<Self, ConfigError> {
        let config: Self = serde_json::from_str(json)?;

        if config.version > CONFIG_VERSION {
            return Err(ConfigError::VersionTooNew {
                file_version: config.version,
                supported_version: CONFIG_VERSION,
            });
        }

        Ok(config)
    }

    /// Read and parse a configuration file.
    pub fn load(path: &std::path::Path) -> Result<Self, ConfigError> {
        let json = std::fs::read_to_string(path)?;
        let config = Self::from_json(&json)?;
        log::info!("Loaded configuration from {:?}", path);
        Ok(config)
    }

    pub fn default_filename() -> &'static str {
        "dermannot-config.json"
    }

    /// Get the default config file path for auto-load/save.
    pub fn default_path() -> Option<std::path::PathBuf> {
        if let Some(config_dir) = dirs::config_dir() {
            Some(config_dir.join("dermannot").join(Self::default_filename()))
        } else {
            dirs::home_dir().map(|home_dir| {
                home_dir
                    .join(".config")
                    .join("dermannot")
                    .join(Self::default_filename())
            })
        }
    }

    /// Try to load configuration from the default path.
    /// Returns None if the file doesn't exist or can't be read.
    pub fn load_from_default_path() -> Option<Self> {
        let path = Self::default_path()?;
        if !path.exists() {
            log::debug!("No config file found at {:?}", path);
            return None;
        }

        match Self::load(&path) {
            Ok(config) => Some(config),
            Err(e) => {
                log::warn!("Failed to load config file {:?}: {}", path, e);
                None
            }
        }
    }

    /// Save configuration to the default path.
    pub fn save_to_default_path(&self) -> Result<(), ConfigError> {
        let path = Self::default_path().ok_or_else(|| {
            ConfigError::IoError(std::io::Error::new(
                std::io::ErrorKind::NotFound,
                "Could not determine config directory",
            ))
        })?;
        self.save(&path)
    }

    /// Write the configuration, creating parent directories if needed.
    pub fn save(&self, path: &std::path::Path) -> Result<(), ConfigError> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let json = self.to_json()?;
        std::fs::write(path, json)?;
        log::info!("Saved configuration to {:?}", path);
        Ok(())
    }
}

impl Default for EditorConfig {
    fn default() -> Self {
        Self::new()
    }
}

/// Errors that can occur when loading configuration.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// JSON parsing error
    #[error("Failed to parse configuration: {0}")]
    ParseError(#[from] serde_json::Error),

    /// Configuration version is newer than supported
    #[error(
        "Configuration file version {file_version} is newer than supported version {supported_version}"
    )]
    VersionTooNew {
        file_version: u32,
        supported_version: u32,
    },

    /// I/O error when reading/writing config
    #[error("I/O error: {0}")]
    IoError(#[from] std::io::Error),
}
