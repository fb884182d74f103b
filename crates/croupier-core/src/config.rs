//! Configuration resolution for Croupier.
//!
//! Implements hierarchical config resolution:
//! 1. Built-in defaults
//! 2. Settings file (`--config`, else ~/.config/croupier/registry.json)
//! 3. Environment variables (`CROUPIER_*`)
//! 4. CLI arguments (highest priority, applied by the binary)

use serde::{Deserialize, Serialize};
use std::net::SocketAddr;
use std::path::{Path, PathBuf};

use crate::error::{Error, Result};

/// Complete registry configuration.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct Config {
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub registry: RegistryConfig,
    #[serde(default)]
    pub sweeper: SweeperConfig,
}

/// HTTP server and storage configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    pub addr: SocketAddr,
    pub database_path: Option<PathBuf>,
    /// Keep all state in memory instead of `SQLite`.
    pub in_memory: bool,
    pub log_json: bool,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            addr: SocketAddr::from(([0, 0, 0, 0], 8080)),
            database_path: None,
            in_memory: false,
            log_json: false,
        }
    }
}

/// Protocol-level knobs reported to or enforced on clients.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RegistryConfig {
    /// Advisory interval returned in every heartbeat acknowledgement.
    pub heartbeat_interval_secs: u64,
    pub default_page_size: u32,
    pub max_page_size: u32,
}

impl Default for RegistryConfig {
    fn default() -> Self {
        Self {
            heartbeat_interval_secs: 60,
            default_page_size: 20,
            max_page_size: 100,
        }
    }
}

/// Inactivity sweeper configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SweeperConfig {
    pub enabled: bool,
    /// How often the sweep runs (seconds).
    pub interval_secs: u64,
    /// A casino not seen for this long is moved to `offline` (seconds).
    pub inactivity_timeout_secs: u64,
}

impl Default for SweeperConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            interval_secs: 60,
            inactivity_timeout_secs: 10 * 60,
        }
    }
}

/// Load configuration with hierarchical resolution.
///
/// An explicitly given `path` must exist; the global settings file is only
/// read when present.
pub fn load_config(path: Option<&Path>) -> Result<Config> {
    let mut config = match path {
        Some(path) => load_config_file(path)?,
        None => match global_config_path() {
            Some(global) if global.exists() => load_config_file(&global)?,
            _ => Config::default(),
        },
    };

    apply_env_overrides(&mut config, |key| std::env::var(key).ok());

    Ok(config)
}

/// Get the global config file path.
pub fn global_config_path() -> Option<PathBuf> {
    std::env::var("XDG_CONFIG_HOME")
        .ok()
        .map(PathBuf::from)
        .or_else(|| std::env::var("HOME").ok().map(|h| PathBuf::from(h).join(".config")))
        .map(|p| p.join("croupier").join("registry.json"))
}

/// Default location of the registry database.
pub fn default_database_path() -> Option<PathBuf> {
    std::env::var("HOME")
        .ok()
        .map(|h| PathBuf::from(h).join(".croupier").join("registry.db"))
}

fn load_config_file(path: &Path) -> Result<Config> {
    let content = std::fs::read_to_string(path).map_err(|e| {
        Error::Config(format!("Failed to read config file {}: {}", path.display(), e))
    })?;
    serde_json::from_str(&content).map_err(|e| {
        Error::Config(format!("Failed to parse config file {}: {}", path.display(), e))
    })
}

/// Apply `CROUPIER_*` overrides read through `lookup`.
///
/// Values that fail to parse are ignored and the previous value is kept.
pub fn apply_env_overrides<F>(config: &mut Config, lookup: F)
where
    F: Fn(&str) -> Option<String>,
{
    if let Some(addr) = lookup("CROUPIER_ADDR").and_then(|v| v.parse().ok()) {
        config.server.addr = addr;
    }
    if let Some(path) = lookup("CROUPIER_DATABASE_PATH") {
        config.server.database_path = Some(PathBuf::from(path));
    }
    if let Some(flag) = lookup("CROUPIER_LOG_JSON").and_then(|v| parse_bool(&v)) {
        config.server.log_json = flag;
    }
    if let Some(n) = lookup("CROUPIER_HEARTBEAT_INTERVAL_SECS").and_then(|v| v.parse().ok()) {
        config.registry.heartbeat_interval_secs = n;
    }
    if let Some(flag) = lookup("CROUPIER_SWEEPER_ENABLED").and_then(|v| parse_bool(&v)) {
        config.sweeper.enabled = flag;
    }
    if let Some(n) = lookup("CROUPIER_SWEEP_INTERVAL_SECS").and_then(|v| v.parse().ok()) {
        config.sweeper.interval_secs = n;
    }
    if let Some(n) = lookup("CROUPIER_INACTIVITY_TIMEOUT_SECS").and_then(|v| v.parse().ok()) {
        config.sweeper.inactivity_timeout_secs = n;
    }
}

fn parse_bool(value: &str) -> Option<bool> {
    match value.to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Some(true),
        "0" | "false" | "no" | "off" => Some(false),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup_from(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| ((*k).to_string(), (*v).to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn defaults_match_protocol_constants() {
        let config = Config::default();
        assert_eq!(config.registry.heartbeat_interval_secs, 60);
        assert_eq!(config.registry.default_page_size, 20);
        assert_eq!(config.registry.max_page_size, 100);
        assert_eq!(config.sweeper.inactivity_timeout_secs, 600);
        assert_eq!(config.sweeper.interval_secs, 60);
        assert!(config.sweeper.enabled);
    }

    #[test]
    fn env_overrides_apply() {
        let mut config = Config::default();
        apply_env_overrides(
            &mut config,
            lookup_from(&[
                ("CROUPIER_ADDR", "127.0.0.1:9000"),
                ("CROUPIER_INACTIVITY_TIMEOUT_SECS", "120"),
                ("CROUPIER_SWEEPER_ENABLED", "false"),
                ("CROUPIER_LOG_JSON", "1"),
            ]),
        );
        assert_eq!(config.server.addr.port(), 9000);
        assert_eq!(config.sweeper.inactivity_timeout_secs, 120);
        assert!(!config.sweeper.enabled);
        assert!(config.server.log_json);
    }

    #[test]
    fn unparsable_env_values_are_ignored() {
        let mut config = Config::default();
        apply_env_overrides(
            &mut config,
            lookup_from(&[
                ("CROUPIER_SWEEP_INTERVAL_SECS", "soon"),
                ("CROUPIER_SWEEPER_ENABLED", "maybe"),
            ]),
        );
        assert_eq!(config.sweeper.interval_secs, 60);
        assert!(config.sweeper.enabled);
    }

    #[test]
    fn partial_file_keeps_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("registry.json");
        std::fs::write(&path, r#"{"sweeper": {"inactivity_timeout_secs": 30}}"#).unwrap();

        let config = load_config_file(&path).unwrap();
        assert_eq!(config.sweeper.inactivity_timeout_secs, 30);
        assert_eq!(config.sweeper.interval_secs, 60);
        assert_eq!(config.registry.max_page_size, 100);
    }

    #[test]
    fn missing_explicit_file_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let result = load_config(Some(&dir.path().join("absent.json")));
        assert!(matches!(result, Err(Error::Config(_))));
    }
}
