use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

use crate::optimizer::Strategy;

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub remote: RemoteConfig,
    #[serde(default)]
    pub optimizer: OptimizerConfig,
    #[serde(default)]
    pub catalog: CatalogConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    #[serde(default = "default_host")]
    pub host: String,
    #[serde(default = "default_port")]
    pub port: u16,
}

/// Location of the external forecasting optimizer. An empty `base_url`
/// means the remote strategy is unavailable.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RemoteConfig {
    #[serde(default)]
    pub base_url: String,
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
    #[serde(default = "default_connect_timeout_secs")]
    pub connect_timeout_secs: u64,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct OptimizerConfig {
    #[serde(default)]
    pub default_strategy: Strategy,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CatalogConfig {
    #[serde(default = "default_catalog_path")]
    pub path: String,
}

#[derive(Debug, Clone, Default)]
pub struct ConfigOverrides {
    pub remote_url: Option<String>,
    pub catalog_path: Option<String>,
    pub default_strategy: Option<Strategy>,
}

impl Config {
    pub fn default_path() -> PathBuf {
        let home = dirs::home_dir().unwrap_or_else(|| PathBuf::from("."));
        home.join(".config/kol-optimizer/config.toml")
    }

    pub fn load(path: Option<&Path>) -> Result<Self> {
        let path = path
            .map(|p| p.to_path_buf())
            .unwrap_or_else(Self::default_path);
        if !path.exists() {
            return Ok(Self::default());
        }
        let data = fs::read_to_string(&path)
            .with_context(|| format!("failed reading config: {}", path.display()))?;
        Self::from_toml(&data)
            .with_context(|| format!("failed parsing TOML config: {}", path.display()))
    }

    pub fn from_toml(data: &str) -> Result<Self> {
        Ok(toml::from_str(data)?)
    }

    pub fn apply_overrides(&mut self, overrides: ConfigOverrides) {
        if let Some(remote_url) = overrides.remote_url {
            self.remote.base_url = remote_url;
        }
        if let Some(catalog_path) = overrides.catalog_path {
            self.catalog.path = catalog_path;
        }
        if let Some(strategy) = overrides.default_strategy {
            self.optimizer.default_strategy = strategy;
        }
    }

    pub fn write_template(path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).with_context(|| {
                format!("failed creating config directory: {}", parent.display())
            })?;
        }
        fs::write(path, Self::default_template())
            .with_context(|| format!("failed writing config template: {}", path.display()))
    }

    pub fn resolved_catalog_path(&self) -> PathBuf {
        expand_tilde(&self.catalog.path)
    }

    pub fn remote_configured(&self) -> bool {
        !self.remote.base_url.trim().is_empty()
    }

    pub fn default_template() -> String {
        let template = r#"[server]
host = "127.0.0.1"
port = 3001

[remote]
# Base URL of the forecasting optimizer; requests go to <base_url>/optimize
base_url = ""
timeout_secs = 30
connect_timeout_secs = 10

[optimizer]
default_strategy = "local"

[catalog]
path = "~/.local/share/kol-optimizer/kols.json"
"#;
        template.to_string()
    }
}

pub fn expand_tilde(path: &str) -> PathBuf {
    if let Some(stripped) = path.strip_prefix("~/") {
        if let Some(home) = dirs::home_dir() {
            return home.join(stripped);
        }
    }
    PathBuf::from(path)
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
        }
    }
}

impl Default for RemoteConfig {
    fn default() -> Self {
        Self {
            base_url: String::new(),
            timeout_secs: default_timeout_secs(),
            connect_timeout_secs: default_connect_timeout_secs(),
        }
    }
}

impl Default for CatalogConfig {
    fn default() -> Self {
        Self {
            path: default_catalog_path(),
        }
    }
}

fn default_host() -> String {
    "127.0.0.1".to_string()
}

fn default_port() -> u16 {
    3001
}

fn default_timeout_secs() -> u64 {
    30
}

fn default_connect_timeout_secs() -> u64 {
    10
}

fn default_catalog_path() -> String {
    "~/.local/share/kol-optimizer/kols.json".to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn template_parses_to_defaults() {
        let parsed = Config::from_toml(&Config::default_template()).expect("template parses");
        let defaults = Config::default();
        assert_eq!(parsed.server.port, defaults.server.port);
        assert_eq!(parsed.remote.timeout_secs, defaults.remote.timeout_secs);
        assert_eq!(parsed.optimizer.default_strategy, Strategy::Local);
        assert!(!parsed.remote_configured());
    }

    #[test]
    fn partial_file_keeps_defaults() {
        let parsed = Config::from_toml(
            r#"
[remote]
base_url = "https://forecast.internal/"

[optimizer]
default_strategy = "remote"
"#,
        )
        .expect("partial config");
        assert!(parsed.remote_configured());
        assert_eq!(parsed.remote.connect_timeout_secs, 10);
        assert_eq!(parsed.optimizer.default_strategy, Strategy::Remote);
        assert_eq!(parsed.server.host, "127.0.0.1");
    }

    #[test]
    fn overrides_replace_file_values() {
        let mut config = Config::default();
        config.apply_overrides(ConfigOverrides {
            remote_url: Some("http://localhost:8000".to_string()),
            catalog_path: Some("/tmp/kols.json".to_string()),
            default_strategy: Some(Strategy::Remote),
        });
        assert_eq!(config.remote.base_url, "http://localhost:8000");
        assert_eq!(config.resolved_catalog_path(), PathBuf::from("/tmp/kols.json"));
        assert_eq!(config.optimizer.default_strategy, Strategy::Remote);
    }

    #[test]
    fn missing_file_loads_defaults() {
        let path = std::env::temp_dir().join("kol-optimizer-missing-config.toml");
        let config = Config::load(Some(&path)).expect("defaults");
        assert_eq!(config.server.port, 3001);
    }
}
