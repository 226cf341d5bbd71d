use serde::{Deserialize, Serialize};
use std::fs;
use std::path::PathBuf;
use lazy_static::lazy_static;

/// Engine configuration, loadable from an optional config.toml in the
/// platform app data directory. Currently only the data directory is
/// configurable; everything else is fixed engine behavior.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct EngineConfig {
    pub data_dir: Option<PathBuf>,
}

fn app_data_dir() -> PathBuf {
    // Use platform-specific app data directory
    #[cfg(target_os = "macos")]
    {
        if let Some(home) = std::env::var_os("HOME") {
            let mut dir = PathBuf::from(home);
            dir.push("Library/Application Support/com.mentor.core");
            return dir;
        }
    }

    #[cfg(target_os = "windows")]
    {
        if let Some(appdata) = std::env::var_os("APPDATA") {
            let mut dir = PathBuf::from(appdata);
            dir.push("com.mentor.core");
            return dir;
        }
    }

    #[cfg(target_os = "linux")]
    {
        if let Some(home) = std::env::var_os("HOME") {
            let mut dir = PathBuf::from(home);
            dir.push(".local/share/com.mentor.core");
            return dir;
        }
    }

    // Fallback
    PathBuf::from(".")
}

fn get_config_path() -> PathBuf {
    let mut path = app_data_dir();
    path.push("config.toml");
    path
}

fn load_config_internal() -> EngineConfig {
    let config_path = get_config_path();

    // Try to load from config file
    if let Ok(content) = fs::read_to_string(&config_path) {
        if let Ok(config) = toml::from_str::<EngineConfig>(&content) {
            tracing::info!(path = ?config_path, "Loaded engine config");
            return config;
        } else {
            tracing::warn!(path = ?config_path, "Failed to parse config.toml, using defaults");
        }
    }

    // Return defaults if file doesn't exist or parsing fails
    EngineConfig::default()
}

lazy_static! {
    static ref ENGINE_CONFIG: EngineConfig = load_config_internal();
}

/// Get the loaded engine configuration
pub fn get_config() -> &'static EngineConfig {
    &ENGINE_CONFIG
}

/// Resolve the data directory: config override first, then the
/// platform default under the app data directory.
pub fn data_dir() -> PathBuf {
    if let Some(dir) = &ENGINE_CONFIG.data_dir {
        return dir.clone();
    }
    let mut dir = app_data_dir();
    dir.push("data");
    dir
}
