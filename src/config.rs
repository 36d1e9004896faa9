/// User settings
///
/// Stored as camelCase JSON at `<config_dir>/talon-search/settings.json`.
/// A missing file means defaults.

use crate::core::scanner;
use crate::core::searcher::DEFAULT_MAX_RESULTS;
use crate::error::{Result, SearchError};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

const APP_DIR: &str = "talon-search";
const SETTINGS_FILE: &str = "settings.json";
const DATA_FILE: &str = "talon-commands.json";
const MAX_DEBOUNCE_MS: u64 = 10_000;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Settings {
    /// Talon user folder; detected when not set
    pub user_folder_path: Option<PathBuf>,
    /// Index on first use when the store is empty
    pub enable_auto_indexing: bool,
    /// For interactive hosts; the search itself never waits
    pub search_debounce_ms: u64,
    pub max_results: usize,
    pub preferred_applications: Vec<String>,
    pub excluded_operating_systems: Vec<String>,
    /// Where the index snapshot lives
    pub data_path: Option<PathBuf>,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            user_folder_path: None,
            enable_auto_indexing: true,
            search_debounce_ms: 300,
            max_results: DEFAULT_MAX_RESULTS,
            preferred_applications: Vec::new(),
            excluded_operating_systems: Vec::new(),
            data_path: None,
        }
    }
}

impl Settings {
    /// Default settings file location
    pub fn default_path() -> Result<PathBuf> {
        let config_dir = dirs::config_dir()
            .ok_or_else(|| SearchError::Config("could not find config directory".to_string()))?;
        Ok(config_dir.join(APP_DIR).join(SETTINGS_FILE))
    }

    /// Load settings from `path`, or defaults if the file doesn't exist
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        if !path.exists() {
            tracing::debug!(path = %path.display(), "no settings file, using defaults");
            return Ok(Self::default());
        }

        let raw = std::fs::read_to_string(path)?;
        let settings: Settings = serde_json::from_str(&raw)?;
        settings.validate()?;
        Ok(settings)
    }

    pub fn save<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let path = path.as_ref();
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        std::fs::write(path, serde_json::to_string_pretty(self)?)?;
        tracing::info!(path = %path.display(), "settings saved");
        Ok(())
    }

    pub fn validate(&self) -> Result<()> {
        if self.max_results == 0 {
            return Err(SearchError::Config("maxResults must be at least 1".to_string()));
        }
        if self.search_debounce_ms > MAX_DEBOUNCE_MS {
            return Err(SearchError::Config(format!(
                "searchDebounceMs must be at most {}",
                MAX_DEBOUNCE_MS
            )));
        }
        Ok(())
    }

    /// Snapshot location, configured or default
    pub fn data_path(&self) -> Result<PathBuf> {
        if let Some(path) = &self.data_path {
            return Ok(path.clone());
        }
        let data_dir = dirs::data_dir()
            .ok_or_else(|| SearchError::Config("could not find data directory".to_string()))?;
        Ok(data_dir.join(APP_DIR).join(DATA_FILE))
    }

    /// Configured user folder, else the first standard location that exists
    pub fn resolve_user_folder(&self) -> Option<PathBuf> {
        match &self.user_folder_path {
            Some(path) if !path.as_os_str().is_empty() => Some(path.clone()),
            _ => scanner::detect_user_folder(),
        }
    }
}
