use std::path::{Path, PathBuf};

use super::Config;
use crate::log_warn;

/// Returns the config directory: `~/.config/tether/`.
pub fn config_dir() -> Option<PathBuf> {
    dirs::home_dir().map(|h| h.join(".config").join("tether"))
}

/// Returns the config file path: `~/.config/tether/config.toml`.
pub fn config_path() -> Option<PathBuf> {
    config_dir().map(|d| d.join("config.toml"))
}

/// Tries to load and parse a config file.
///
/// Returns the validated `Config` on success, or an error string
/// describing what went wrong (IO error, parse error, etc.).
pub fn try_load_from(path: &Path) -> Result<Config, String> {
    let content = std::fs::read_to_string(path).map_err(|e| format!("{}: {e}", path.display()))?;
    let mut config: Config =
        toml::from_str(&content).map_err(|e| format!("{}: {e}", path.display()))?;
    config.validate();
    Ok(config)
}

/// Loads the configuration from disk, falling back to defaults.
///
/// A missing file silently returns defaults; an unreadable or invalid
/// one prints a warning and returns defaults.
pub fn load() -> Config {
    let Some(path) = config_path() else {
        return Config::default();
    };
    if !path.exists() {
        return Config::default();
    }

    match try_load_from(&path) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("Warning: {e}");
            log_warn!("config ignored: {e}");
            Config::default()
        }
    }
}
