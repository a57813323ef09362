//! `tableau.toml`: data locations, display canvas, flash timing and logging.

use serde::{Deserialize, Serialize};
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tableau_combat::{DisplayConfig, GridCanvas, OverlaySettings, DEFAULT_OVERFLOW};
use tracing::{info, warn};

/// Configuration file name.
const CONFIG_FILE: &str = "tableau.toml";

/// Environment variable overriding the config file location.
const CONFIG_ENV: &str = "TABLEAU_CONFIG";

/// Session state file name inside the data directory.
const STATE_FILE: &str = "state.json";

/// Application configuration parameters.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TableauConfig {
    // === Storage ===
    /// Root of the chapter and entity store
    pub data_dir: PathBuf,
    /// Directory receiving rendered grid overlays
    pub overlay_dir: PathBuf,

    // === Display ===
    /// Display container width in pixels
    pub container_width: u32,
    /// Display container height in pixels
    pub container_height: u32,
    /// Extra hex rings computed past the container edge
    pub overflow: u32,
    /// Grid size for combats created from the command line
    pub default_grid_size: u32,

    // === Damage flash ===
    /// How long a token flashes after a hit point change
    pub flash_duration_ms: u64,
    /// Length of one flash phase
    pub flash_phase_ms: u64,

    // === Sync ===
    /// Per-direction capacity of the constructor/display channel
    pub channel_capacity: usize,

    // === Debug ===
    /// Default tracing filter (`RUST_LOG` still takes precedence)
    pub log_filter: String,
}

impl Default for TableauConfig {
    fn default() -> Self {
        Self {
            data_dir: PathBuf::from("data"),
            overlay_dir: PathBuf::from("data").join("overlays"),
            container_width: 1667,
            container_height: 953,
            overflow: DEFAULT_OVERFLOW,
            default_grid_size: 100,
            flash_duration_ms: 3000,
            flash_phase_ms: 750,
            channel_capacity: tableau_combat::DEFAULT_CHANNEL_CAPACITY,
            log_filter: "tableau=info".to_string(),
        }
    }
}

impl TableauConfig {
    /// Reads a config file. Missing or invalid files give the defaults.
    pub fn load_from<P: AsRef<Path>>(path: P) -> Self {
        let path = path.as_ref();
        let contents = match fs::read_to_string(path) {
            Ok(contents) => contents,
            Err(e) if e.kind() == io::ErrorKind::NotFound => {
                info!("No config at {}, using defaults", path.display());
                return Self::default();
            },
            Err(e) => {
                warn!("Cannot read config {}: {e}", path.display());
                return Self::default();
            },
        };

        toml::from_str(&contents).unwrap_or_else(|e| {
            warn!("Invalid config {}, using defaults: {e}", path.display());
            Self::default()
        })
    }

    /// Writes the config as pretty TOML, replacing the file atomically.
    pub fn save_to<P: AsRef<Path>>(&self, path: P) -> io::Result<()> {
        let path = path.as_ref();
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }

        let contents = toml::to_string_pretty(self)
            .map_err(|e| io::Error::new(io::ErrorKind::InvalidData, e))?;
        let temp_path = path.with_extension("toml.tmp");
        fs::write(&temp_path, contents)?;
        fs::rename(&temp_path, path)?;

        info!("Saved config to {}", path.display());
        Ok(())
    }

    /// `$TABLEAU_CONFIG`, else `tableau/tableau.toml` in the platform
    /// config directory, else `tableau.toml` in the working directory.
    pub fn config_path() -> PathBuf {
        if let Some(path) = std::env::var_os(CONFIG_ENV) {
            return PathBuf::from(path);
        }
        platform_config_dir().map_or_else(
            || PathBuf::from(CONFIG_FILE),
            |dir| dir.join("tableau").join(CONFIG_FILE),
        )
    }

    /// Validate and clamp configuration values to sensible ranges.
    pub fn validate(&mut self) {
        // Display
        self.container_width = self.container_width.clamp(320, 7680);
        self.container_height = self.container_height.clamp(240, 4320);
        self.overflow = self.overflow.min(16);
        self.default_grid_size = self.default_grid_size.clamp(10, 1000);

        // Flash
        self.flash_duration_ms = self.flash_duration_ms.min(60_000);
        self.flash_phase_ms = self.flash_phase_ms.clamp(50, 10_000);

        // Sync
        self.channel_capacity = self.channel_capacity.clamp(16, 65_536);
    }

    /// Where the session state is written through.
    #[must_use]
    pub fn state_path(&self) -> PathBuf {
        self.data_dir.join(STATE_FILE)
    }

    /// Display surface settings.
    #[must_use]
    pub fn display_config(&self) -> DisplayConfig {
        DisplayConfig {
            canvas: GridCanvas {
                width: f64::from(self.container_width),
                height: f64::from(self.container_height),
                overflow: self.overflow,
            },
            flash_duration: Duration::from_millis(self.flash_duration_ms),
            flash_phase: Duration::from_millis(self.flash_phase_ms),
        }
    }

    /// Overlay rendering settings.
    #[must_use]
    pub fn overlay_settings(&self) -> OverlaySettings {
        OverlaySettings {
            dir: self.overlay_dir.clone(),
            container_width: self.container_width,
            container_height: self.container_height,
            overflow: self.overflow,
        }
    }
}

/// Per-user configuration directory for the current platform.
fn platform_config_dir() -> Option<PathBuf> {
    let var = |name: &str| std::env::var_os(name).map(PathBuf::from);
    if cfg!(target_os = "windows") {
        var("APPDATA")
    } else if cfg!(target_os = "macos") {
        var("HOME").map(|home| home.join("Library").join("Application Support"))
    } else {
        var("XDG_CONFIG_HOME").or_else(|| var("HOME").map(|home| home.join(".config")))
    }
}
