// User preferences, read once per scan

use serde::{Deserialize, Serialize};
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::{debug, info};

pub const DEFAULT_SETTINGS_PATH: &str = "~/.config/linkward/settings.json";

#[derive(Debug, Error)]
pub enum SettingsError {
    #[error("Failed to access settings file {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("Invalid settings file {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("Settings file already exists: {0} (use --force to overwrite)")]
    AlreadyExists(PathBuf),
}

/// Which link categories are listed. Absent keys are enabled.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LinkTypes {
    pub teams: bool,
    pub onedrive: bool,
    pub external: bool,
    pub email: bool,
}

impl Default for LinkTypes {
    fn default() -> Self {
        Self {
            teams: true,
            onedrive: true,
            external: true,
            email: true,
        }
    }
}

/// Which external status groups are shown. Absent keys are enabled.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct StatusFilters {
    #[serde(rename = "2xx")]
    pub success: bool,
    #[serde(rename = "3xx")]
    pub redirects: bool,
    #[serde(rename = "4xx")]
    pub client_errors: bool,
    #[serde(rename = "5xx")]
    pub server_errors: bool,
    pub network: bool,
}

impl Default for StatusFilters {
    fn default() -> Self {
        Self {
            success: true,
            redirects: true,
            client_errors: true,
            server_errors: true,
            network: true,
        }
    }
}

impl StatusFilters {
    /// Keep only the given groups, by key (`2xx`, `3xx`, `4xx`, `5xx`, `network`)
    pub fn only(keys: &[&str]) -> Self {
        let has = |key: &str| keys.iter().any(|k| k.eq_ignore_ascii_case(key));
        Self {
            success: has("2xx"),
            redirects: has("3xx"),
            client_errors: has("4xx"),
            server_errors: has("5xx"),
            network: has("network"),
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct Settings {
    pub link_types: LinkTypes,
    pub external_status_codes: StatusFilters,
}

impl Settings {
    /// Read settings from `path`; a missing file yields the defaults
    pub fn load(path: &Path) -> Result<Self, SettingsError> {
        if !path.exists() {
            debug!("No settings at {}, using defaults", path.display());
            return Ok(Self::default());
        }

        let content = fs::read_to_string(path).map_err(|source| SettingsError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let settings = serde_json::from_str(&content).map_err(|source| SettingsError::Parse {
            path: path.to_path_buf(),
            source,
        })?;

        info!("Loaded settings from {}", path.display());
        Ok(settings)
    }

    pub fn save(&self, path: &Path, force: bool) -> Result<(), SettingsError> {
        if path.exists() && !force {
            return Err(SettingsError::AlreadyExists(path.to_path_buf()));
        }

        let io_err = |source| SettingsError::Io {
            path: path.to_path_buf(),
            source,
        };

        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent).map_err(io_err)?;
        }

        // Serializing plain booleans cannot fail
        let content = serde_json::to_string_pretty(self).unwrap_or_default();
        fs::write(path, content).map_err(io_err)?;

        info!("Wrote settings to {}", path.display());
        Ok(())
    }
}

/// Default settings location with `~` expanded
pub fn default_path() -> PathBuf {
    PathBuf::from(shellexpand::tilde(DEFAULT_SETTINGS_PATH).to_string())
}
