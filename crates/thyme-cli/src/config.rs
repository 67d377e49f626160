//! Configuration loading and management.

use std::path::{Path, PathBuf};

use figment::Figment;
use figment::providers::{Env, Format, Serialized, Toml};
use serde::{Deserialize, Serialize};
use thyme_core::{DEFAULT_MIN_MINUTES, SqueezeMode};

/// Application configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Config {
    /// Shortest length, in minutes, an item may be squeezed to.
    pub min_minutes: f64,
    /// How a block's length is shared among its items.
    pub squeeze_mode: SqueezeMode,
    /// `strftime` pattern used when printing times.
    pub time_format: String,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            min_minutes: DEFAULT_MIN_MINUTES,
            squeeze_mode: SqueezeMode::Proportional,
            time_format: "%H:%M".to_string(),
        }
    }
}

impl Config {
    /// Loads configuration, optionally from a specific file.
    #[expect(
        clippy::result_large_err,
        reason = "figment::Error is large but only returned at startup"
    )]
    pub fn load_from(config_path: Option<&Path>) -> Result<Self, figment::Error> {
        let mut figment = Figment::from(Serialized::defaults(Self::default()));

        if let Some(config_dir) = dirs_config_path() {
            figment = figment.merge(Toml::file(config_dir.join("config.toml")));
        }

        if let Some(path) = config_path {
            figment = figment.merge(Toml::file(path));
        }

        // THYME_MIN_MINUTES, THYME_SQUEEZE_MODE, ...
        figment = figment.merge(Env::prefixed("THYME_"));

        figment.extract()
    }
}

/// Returns the platform-specific config directory for thyme.
///
/// On Linux: `~/.config/thyme`
pub fn dirs_config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|p| p.join("thyme"))
}
