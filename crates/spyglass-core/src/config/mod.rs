mod loader;
pub mod template;

use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use crate::highlight::Color;
use crate::log::{Level, LogConfig};

pub use loader::{config_dir, config_path, load, try_load};

/// Companion library loaded into foreign processes when none is configured.
pub const DEFAULT_LIBRARY: &str = "spyglass_probe.dll";

/// Top-level configuration for Spyglass.
///
/// Loaded from `~/.config/spyglass/config.toml`. Missing sections
/// fall back to defaults thanks to `#[serde(default)]`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Highlight border appearance.
    pub highlight: HighlightConfig,
    /// Foreign-process probing.
    pub inject: InjectConfig,
    /// File logging.
    pub logging: LogConfig,
}

/// Highlight border settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct HighlightConfig {
    /// Hex pen color (e.g. "#000000").
    pub color: String,
}

/// Settings for the load/unload probe run in foreign processes.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct InjectConfig {
    /// Whether to probe foreign processes while capturing.
    pub enabled: bool,
    /// Companion library to load. Relative paths resolve against the
    /// directory of the spyglass executable.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub library: Option<PathBuf>,
}

impl Default for HighlightConfig {
    fn default() -> Self {
        Self {
            color: "#000000".into(),
        }
    }
}

impl Default for InjectConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            library: None,
        }
    }
}

impl HighlightConfig {
    /// The parsed pen color. Falls back to black.
    pub fn pen_color(&self) -> Color {
        Color::from_hex(&self.color).unwrap_or(Color::BLACK)
    }
}

impl InjectConfig {
    /// Resolves the companion library path.
    ///
    /// Absolute paths are used as-is; relative ones (including the default
    /// [`DEFAULT_LIBRARY`]) are joined to `exe_dir`.
    pub fn library_path(&self, exe_dir: &std::path::Path) -> PathBuf {
        let library = self
            .library
            .clone()
            .unwrap_or_else(|| PathBuf::from(DEFAULT_LIBRARY));
        if library.is_absolute() {
            library
        } else {
            exe_dir.join(library)
        }
    }
}

impl Config {
    /// Replaces invalid values with their defaults, warning on stderr.
    ///
    /// Runs before the logger exists, so warnings cannot go to the log.
    pub fn validate(&mut self) {
        if Color::from_hex(&self.highlight.color).is_none() {
            eprintln!(
                "Warning: invalid highlight color {:?}, using default",
                self.highlight.color
            );
            self.highlight.color = HighlightConfig::default().color;
        }
        if let Err(e) = self.logging.level.parse::<Level>() {
            eprintln!("Warning: {e}, using \"info\"");
            self.logging.level = LogConfig::default().level;
        }
        if self
            .inject
            .library
            .as_ref()
            .is_some_and(|p| p.as_os_str().is_empty())
        {
            self.inject.library = None;
        }
        self.logging.max_file_mb = self.logging.max_file_mb.clamp(1, 1024);
    }
}

#[cfg(test)]
mod tests;
