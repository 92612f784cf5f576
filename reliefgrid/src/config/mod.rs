//! Configuration file handling.
//!
//! Settings live in an INI file at `<config_dir>/reliefgrid/config.ini`:
//!
//! ```ini
//! [tiles]
//! base_url = https://s3.amazonaws.com/elevation-tiles-prod/terrarium
//! timeout_secs = 30
//! max_concurrent = 16
//! ; max_zoom = 18
//!
//! [output]
//! zoom = 12
//! output_px = 200
//! area_km = 20
//! ```
//!
//! Missing keys fall back to defaults; a missing file is the same as an
//! empty one. Without `max_zoom` the public bucket is limited to zoom 15 and
//! any other endpoint may be asked for zoom 0 through 20.

use std::path::{Path, PathBuf};
use std::str::FromStr;

use ini::Ini;
use thiserror::Error;

use crate::orchestrator::DEFAULT_MAX_CONCURRENT_FETCHES;
use crate::provider::{DEFAULT_TERRARIUM_URL, DEFAULT_TIMEOUT_SECS};

/// Application directory name under the platform config dir.
const APP_DIR: &str = "reliefgrid";

/// Config file name.
const CONFIG_FILE: &str = "config.ini";

const SECTION_TILES: &str = "tiles";
const SECTION_OUTPUT: &str = "output";

/// Default zoom level for generated heightmaps.
pub const DEFAULT_ZOOM: u8 = 12;

/// Default output edge length in pixels.
pub const DEFAULT_OUTPUT_PX: u32 = 200;

/// Default area side length in kilometers.
pub const DEFAULT_AREA_KM: f64 = 20.0;

/// Errors that can occur while loading or saving configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to parse config file: {0}")]
    Parse(String),

    #[error("Invalid value '{value}' for {section}.{key}")]
    InvalidValue {
        section: String,
        key: String,
        value: String,
    },

    #[error("Could not determine the platform configuration directory")]
    NoConfigDir,
}

/// `[tiles]` section: where and how tiles are fetched.
#[derive(Debug, Clone, PartialEq)]
pub struct TilesConfig {
    /// Endpoint serving `{z}/{x}/{y}.png` Terrarium tiles
    pub base_url: String,
    /// Per-request timeout
    pub timeout_secs: u64,
    /// Tile requests in flight at once
    pub max_concurrent: usize,
    /// Highest zoom the endpoint serves, overriding the endpoint default
    pub max_zoom: Option<u8>,
}

impl Default for TilesConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_TERRARIUM_URL.to_string(),
            timeout_secs: DEFAULT_TIMEOUT_SECS,
            max_concurrent: DEFAULT_MAX_CONCURRENT_FETCHES,
            max_zoom: None,
        }
    }
}

/// `[output]` section: defaults for generated heightmaps.
#[derive(Debug, Clone, PartialEq)]
pub struct OutputConfig {
    pub zoom: u8,
    pub output_px: u32,
    pub area_km: f64,
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            zoom: DEFAULT_ZOOM,
            output_px: DEFAULT_OUTPUT_PX,
            area_km: DEFAULT_AREA_KM,
        }
    }
}

/// Parsed configuration file.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ConfigFile {
    pub tiles: TilesConfig,
    pub output: OutputConfig,
}

/// Directory holding the config file.
pub fn config_directory() -> Option<PathBuf> {
    dirs::config_dir().map(|d| d.join(APP_DIR))
}

/// Full path of the config file.
pub fn config_file_path() -> Option<PathBuf> {
    config_directory().map(|d| d.join(CONFIG_FILE))
}

impl ConfigFile {
    /// Loads the config file from its default location.
    pub fn load() -> Result<Self, ConfigError> {
        let path = config_file_path().ok_or(ConfigError::NoConfigDir)?;
        Self::load_from(&path)
    }

    /// Loads a config file, returning defaults if it does not exist.
    pub fn load_from(path: &Path) -> Result<Self, ConfigError> {
        if !path.exists() {
            return Ok(Self::default());
        }
        let contents = std::fs::read_to_string(path)?;
        Self::from_ini_str(&contents)
    }

    /// Parses INI text.
    pub fn from_ini_str(contents: &str) -> Result<Self, ConfigError> {
        let ini = Ini::load_from_str(contents).map_err(|e| ConfigError::Parse(e.to_string()))?;
        let mut config = Self::default();

        if let Some(section) = ini.section(Some(SECTION_TILES)) {
            if let Some(url) = section.get("base_url") {
                config.tiles.base_url = url.trim().to_string();
            }
            if let Some(v) = section.get("timeout_secs") {
                config.tiles.timeout_secs = parse_value(SECTION_TILES, "timeout_secs", v)?;
            }
            if let Some(v) = section.get("max_concurrent") {
                config.tiles.max_concurrent = parse_value(SECTION_TILES, "max_concurrent", v)?;
            }
            if let Some(v) = section.get("max_zoom") {
                config.tiles.max_zoom = Some(parse_value(SECTION_TILES, "max_zoom", v)?);
            }
        }

        if let Some(section) = ini.section(Some(SECTION_OUTPUT)) {
            if let Some(v) = section.get("zoom") {
                config.output.zoom = parse_value(SECTION_OUTPUT, "zoom", v)?;
            }
            if let Some(v) = section.get("output_px") {
                config.output.output_px = parse_value(SECTION_OUTPUT, "output_px", v)?;
            }
            if let Some(v) = section.get("area_km") {
                config.output.area_km = parse_value(SECTION_OUTPUT, "area_km", v)?;
            }
        }

        Ok(config)
    }

    /// Builds the INI document for this configuration.
    pub fn to_ini(&self) -> Ini {
        let mut ini = Ini::new();
        ini.with_section(Some(SECTION_TILES))
            .set("base_url", self.tiles.base_url.as_str())
            .set("timeout_secs", self.tiles.timeout_secs.to_string())
            .set("max_concurrent", self.tiles.max_concurrent.to_string());
        if let Some(max_zoom) = self.tiles.max_zoom {
            ini.with_section(Some(SECTION_TILES))
                .set("max_zoom", max_zoom.to_string());
        }
        ini.with_section(Some(SECTION_OUTPUT))
            .set("zoom", self.output.zoom.to_string())
            .set("output_px", self.output.output_px.to_string())
            .set("area_km", self.output.area_km.to_string());
        ini
    }

    /// Writes the config to `path`, creating parent directories.
    pub fn save_to(&self, path: &Path) -> Result<(), ConfigError> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        self.to_ini().write_to_file(path)?;
        Ok(())
    }

    /// Writes the config to its default location.
    pub fn save(&self) -> Result<PathBuf, ConfigError> {
        let path = config_file_path().ok_or(ConfigError::NoConfigDir)?;
        self.save_to(&path)?;
        Ok(path)
    }
}

fn parse_value<T: FromStr>(section: &str, key: &str, value: &str) -> Result<T, ConfigError> {
    value
        .trim()
        .parse()
        .map_err(|_| ConfigError::InvalidValue {
            section: section.to_string(),
            key: key.to_string(),
            value: value.to_string(),
        })
}
