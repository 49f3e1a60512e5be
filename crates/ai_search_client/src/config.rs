//! Client config load/save for `~/.ai-search/config.yaml`.
//! Sections: `server` (service address), `search` (request defaults), `ui`.

use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::error::ConfigError;
use crate::messages::Provider;
use crate::session::Selection;
use crate::sources::DEFAULT_ICON_SERVICE;

pub const DEFAULT_SERVER_URL: &str = "ws://127.0.0.1:8000/ws";
pub const DEFAULT_COMPLETION_GRACE_MS: u64 = 1000;
pub const DEFAULT_SUGGESTION_WAIT_MS: u64 = 10_000;

/// Env var naming a config file; overridden by `--config`.
pub const CONFIG_ENV: &str = "AI_SEARCH_CONFIG";

/// Server section (WebSocket endpoint of the search service).
#[derive(Debug, Clone, Default, serde::Serialize, serde::Deserialize)]
pub struct ServerSection {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
}

/// Search section (what every request asks for unless the CLI overrides it).
#[derive(Debug, Clone, Default, serde::Serialize, serde::Deserialize)]
pub struct SearchSection {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub provider: Option<Provider>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub use_cache: Option<bool>,
}

/// UI section (progress grace delay, how long a cached answer waits for its
/// suggestions, favicon service template).
#[derive(Debug, Clone, Default, serde::Serialize, serde::Deserialize)]
pub struct UiSection {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub completion_grace_ms: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub suggestion_wait_ms: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub icon_service: Option<String>,
}

#[derive(Debug, Clone, Default, serde::Serialize, serde::Deserialize)]
pub struct Config {
    #[serde(default)]
    pub server: ServerSection,
    #[serde(default)]
    pub search: SearchSection,
    #[serde(default)]
    pub ui: UiSection,
}

impl Config {
    pub fn server_url(&self) -> &str {
        self.server.url.as_deref().unwrap_or(DEFAULT_SERVER_URL)
    }

    pub fn selection(&self) -> Selection {
        Selection {
            provider: self.search.provider.unwrap_or_default(),
            use_cache: self.search.use_cache.unwrap_or(true),
        }
    }

    pub fn completion_grace(&self) -> Duration {
        Duration::from_millis(
            self.ui
                .completion_grace_ms
                .unwrap_or(DEFAULT_COMPLETION_GRACE_MS),
        )
    }

    pub fn suggestion_wait(&self) -> Duration {
        Duration::from_millis(
            self.ui
                .suggestion_wait_ms
                .unwrap_or(DEFAULT_SUGGESTION_WAIT_MS),
        )
    }

    pub fn icon_service(&self) -> &str {
        self.ui.icon_service.as_deref().unwrap_or(DEFAULT_ICON_SERVICE)
    }
}

/// Returns the default config file path: `~/.ai-search/config.yaml` (platform-specific).
pub fn default_config_path() -> Option<PathBuf> {
    let home = home_dir()?;
    Some(home.join(".ai-search").join("config.yaml"))
}

#[cfg(unix)]
fn home_dir() -> Option<PathBuf> {
    std::env::var_os("HOME").map(PathBuf::from)
}

#[cfg(windows)]
fn home_dir() -> Option<PathBuf> {
    std::env::var_os("USERPROFILE").map(PathBuf::from)
}

#[cfg(not(any(unix, windows)))]
fn home_dir() -> Option<PathBuf> {
    None
}

/// Load config from a YAML file.
pub fn load(path: &Path) -> Result<Config, ConfigError> {
    let contents = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    serde_yaml::from_str(&contents).map_err(|source| ConfigError::Yaml {
        path: path.to_path_buf(),
        source,
    })
}

/// Save config to a YAML file. Creates parent directory if missing.
pub fn save(path: &Path, config: &Config) -> Result<(), ConfigError> {
    let io_err = |source| ConfigError::Io {
        path: path.to_path_buf(),
        source,
    };
    if let Some(parent) = path.parent() {
        if !parent.exists() {
            std::fs::create_dir_all(parent).map_err(io_err)?;
        }
    }
    let contents = serde_yaml::to_string(config).map_err(|source| ConfigError::Yaml {
        path: path.to_path_buf(),
        source,
    })?;
    std::fs::write(path, contents).map_err(io_err)
}

/// Resolve and load the config: an explicit path (flag, then env var) must
/// exist; the default path falls back to built-in defaults when absent.
pub fn resolve(explicit: Option<&Path>) -> Result<Config, ConfigError> {
    if let Some(path) = explicit {
        return load(path);
    }
    if let Some(val) = std::env::var_os(CONFIG_ENV) {
        return load(Path::new(&val));
    }
    let path = default_config_path().ok_or(ConfigError::NoHome)?;
    if path.exists() {
        load(&path)
    } else {
        Ok(Config::default())
    }
}
