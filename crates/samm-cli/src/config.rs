//! CLI settings: optional TOML file plus `SAMM__`-prefixed env overrides.

use std::path::{Path, PathBuf};

use anyhow::Context;
use config::{Config, Environment, File};
use directories::ProjectDirs;
use serde::Deserialize;
use samm_crypto::authorization::DEFAULT_AUTHORIZATION_VERSION;

pub const APP_QUALIFIER: &str = "org";
pub const APP_ORG: &str = "samm";
pub const APP_NAME: &str = "samm";

#[derive(Debug, Clone, Deserialize)]
pub struct Settings {
    pub rpc_url: String,
    pub api_url: String,
    /// Checked against the node when set.
    #[serde(default)]
    pub chain_id: Option<u64>,
    #[serde(default)]
    pub module_address: Option<String>,
    #[serde(default)]
    pub safe_address: Option<String>,
    #[serde(default = "default_authorization_version")]
    pub authorization_version: String,
    #[serde(default = "default_request_timeout_ms")]
    pub request_timeout_ms: u64,
    #[serde(default = "default_log_level")]
    pub log_level: String,
    #[serde(default)]
    pub session_file: Option<PathBuf>,
}

fn default_authorization_version() -> String {
    DEFAULT_AUTHORIZATION_VERSION.to_string()
}

fn default_request_timeout_ms() -> u64 {
    20_000
}

fn default_log_level() -> String {
    "info".to_string()
}

pub fn data_dir() -> anyhow::Result<PathBuf> {
    let dirs = ProjectDirs::from(APP_QUALIFIER, APP_ORG, APP_NAME)
        .ok_or_else(|| anyhow::anyhow!("cannot determine data directory"))?;
    Ok(dirs.data_dir().to_path_buf())
}

pub fn default_config_file() -> anyhow::Result<PathBuf> {
    Ok(data_dir()?.join("samm.toml"))
}

impl Settings {
    /// Load `path` (may be absent) and apply environment overrides.
    pub fn load(path: &Path) -> anyhow::Result<Self> {
        let env_override = Environment::with_prefix("SAMM").separator("__");

        let config = Config::builder()
            .add_source(File::from(path).required(false))
            .add_source(env_override)
            .build()
            .with_context(|| format!("failed to read config {}", path.display()))?;

        config
            .try_deserialize()
            .with_context(|| format!("invalid config {}", path.display()))
    }

    pub fn session_file(&self) -> anyhow::Result<PathBuf> {
        match &self.session_file {
            Some(path) => Ok(path.clone()),
            None => Ok(data_dir()?.join("session.json")),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_load_file_with_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("samm.toml");
        std::fs::write(
            &path,
            r#"
rpc_url = "http://localhost:8545"
api_url = "http://localhost:8000"
chain_id = 11155111
module_address = "0x5aaeb6053f3e94c9b9a09f33669435e7ef1beaed"
"#,
        )
        .unwrap();

        let settings = Settings::load(&path).unwrap();
        assert_eq!(settings.rpc_url, "http://localhost:8545");
        assert_eq!(settings.chain_id, Some(11155111));
        assert_eq!(settings.authorization_version, "1");
        assert_eq!(settings.request_timeout_ms, 20_000);
        assert_eq!(settings.log_level, "info");
    }

    #[test]
    fn test_missing_required_field_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("samm.toml");
        std::fs::write(&path, "api_url = \"http://localhost:8000\"\n").unwrap();
        assert!(Settings::load(&path).is_err());
    }
}
