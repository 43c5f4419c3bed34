use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use crate::Config;

/// TOML configuration as it appears on disk.
/// Every field is optional; unset values fall back to the defaults.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ConfigFile {
    pub api: Option<ApiConfig>,
    pub search: Option<SearchConfig>,
    pub storage: Option<StorageConfig>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ApiConfig {
    pub api_key: Option<String>,
    pub base_url: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SearchConfig {
    pub timeout_secs: Option<u64>,
    /// Query loaded on startup before the user types anything.
    pub default_query: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct StorageConfig {
    pub favorites_path: Option<String>,
}

/// Platform config directory path: `<config_dir>/marquee/config.toml`.
pub fn config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|d| d.join("marquee").join("config.toml"))
}

/// Default favorites database path: `<data_dir>/marquee/favorites.db`.
pub fn default_favorites_path() -> Option<PathBuf> {
    dirs::data_dir().map(|d| d.join("marquee").join("favorites.db"))
}

/// Load config, layering a CWD `.marquee.toml` over the platform file so
/// per-project settings win.
pub fn load_config() -> ConfigFile {
    let platform = config_path().and_then(|p| load_from_path(&p));
    let cwd = load_from_path(&PathBuf::from(".marquee.toml"));

    match (platform, cwd) {
        (None, None) => ConfigFile::default(),
        (Some(p), None) => p,
        (None, Some(c)) => c,
        (Some(p), Some(c)) => merge(p, c),
    }
}

/// Read one config file. `None` when the file is missing or unparseable.
pub fn load_from_path(path: &PathBuf) -> Option<ConfigFile> {
    let content = std::fs::read_to_string(path).ok()?;
    toml::from_str(&content).ok()
}

/// Combine two configs, preferring `overlay` wherever it has a value.
pub fn merge(base: ConfigFile, overlay: ConfigFile) -> ConfigFile {
    ConfigFile {
        api: Some(ApiConfig {
            api_key: overlay
                .api
                .as_ref()
                .and_then(|a| a.api_key.clone())
                .or_else(|| base.api.as_ref().and_then(|a| a.api_key.clone())),
            base_url: overlay
                .api
                .as_ref()
                .and_then(|a| a.base_url.clone())
                .or_else(|| base.api.as_ref().and_then(|a| a.base_url.clone())),
        }),
        search: Some(SearchConfig {
            timeout_secs: overlay
                .search
                .as_ref()
                .and_then(|s| s.timeout_secs)
                .or_else(|| base.search.as_ref().and_then(|s| s.timeout_secs)),
            default_query: overlay
                .search
                .as_ref()
                .and_then(|s| s.default_query.clone())
                .or_else(|| base.search.as_ref().and_then(|s| s.default_query.clone())),
        }),
        storage: Some(StorageConfig {
            favorites_path: overlay
                .storage
                .as_ref()
                .and_then(|s| s.favorites_path.clone())
                .or_else(|| base.storage.as_ref().and_then(|s| s.favorites_path.clone())),
        }),
    }
}

impl ConfigFile {
    pub fn api_key(&self) -> Option<String> {
        self.api.as_ref().and_then(|a| a.api_key.clone())
    }

    pub fn default_query(&self) -> Option<String> {
        self.search.as_ref().and_then(|s| s.default_query.clone())
    }

    /// Build a runtime [`Config`], applying file values over the defaults.
    pub fn to_config(&self) -> Config {
        let mut config = Config::default();
        if let Some(api) = &self.api {
            if let Some(key) = &api.api_key {
                config.api_key = key.clone();
            }
            if let Some(url) = &api.base_url {
                config.base_url = url.clone();
            }
        }
        if let Some(search) = &self.search
            && let Some(timeout) = search.timeout_secs
        {
            config.timeout_secs = timeout;
        }
        config.favorites_path = self
            .storage
            .as_ref()
            .and_then(|s| s.favorites_path.clone())
            .map(PathBuf::from)
            .or_else(default_favorites_path);
        config
    }
}
