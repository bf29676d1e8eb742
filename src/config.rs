//! Configuration management for the SuperConductor bridge

use anyhow::{bail, Context, Result};
use directories::ProjectDirs;
use serde::{Deserialize, Deserializer, Serialize};
use std::net::Ipv4Addr;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::debug;

/// Accepted structural poll interval, in seconds
const RUNDOWN_POLL_RANGE: std::ops::RangeInclusive<i64> = 10..=300;
const RUNDOWN_POLL_FALLBACK: i64 = 30;

/// Accepted subscription poll interval, in seconds
const GROUP_POLL_RANGE: std::ops::RangeInclusive<i64> = 1..=30;
const GROUP_POLL_FALLBACK: i64 = 10;

/// Main configuration structure
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Where SuperConductor is listening
    #[serde(default)]
    pub server: ServerConfig,

    /// Poll schedules
    #[serde(default)]
    pub polling: PollingConfig,

    /// Path to config file (not serialized)
    #[serde(skip)]
    config_path: Option<PathBuf>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ServerConfig {
    /// IPv4 address of the SuperConductor host
    #[serde(default = "default_host")]
    pub host: String,

    /// TCP port, 1 to 5 digits. Accepts a TOML string or integer.
    #[serde(default = "default_port", deserialize_with = "deserialize_port")]
    pub port: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PollingConfig {
    /// Seconds between structural refreshes (10-300)
    #[serde(default = "default_rundown_poll_interval")]
    pub rundown_poll_interval_secs: i64,

    /// Seconds between playing-state probes of watched groups (1-30)
    #[serde(default = "default_group_poll_interval")]
    pub group_poll_interval_secs: i64,
}

/// Per-user directories for config and logs
pub fn project_dirs() -> Result<ProjectDirs> {
    ProjectDirs::from("dev", "superconductor", "bridge")
        .context("Failed to determine project directories")
}

// Default value functions
fn default_host() -> String {
    "127.0.0.1".to_string()
}

fn default_port() -> String {
    "5500".to_string()
}

fn default_rundown_poll_interval() -> i64 {
    30
}

fn default_group_poll_interval() -> i64 {
    5
}

#[derive(Deserialize)]
#[serde(untagged)]
enum PortValue {
    Text(String),
    Number(u64),
}

fn deserialize_port<'de, D>(deserializer: D) -> std::result::Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(match PortValue::deserialize(deserializer)? {
        PortValue::Text(text) => text,
        PortValue::Number(number) => number.to_string(),
    })
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
        }
    }
}

impl Default for PollingConfig {
    fn default() -> Self {
        Self {
            rundown_poll_interval_secs: default_rundown_poll_interval(),
            group_poll_interval_secs: default_group_poll_interval(),
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            server: ServerConfig::default(),
            polling: PollingConfig::default(),
            config_path: None,
        }
    }
}

impl Config {
    /// Load configuration from default location or create default
    pub fn load() -> Result<Self> {
        Self::load_from(&Self::default_config_path()?)
    }

    /// Load configuration from a file, creating it with defaults if missing
    pub fn load_from(config_path: &Path) -> Result<Self> {
        if config_path.exists() {
            let contents = std::fs::read_to_string(config_path)
                .with_context(|| format!("Failed to read config file: {:?}", config_path))?;

            let mut config: Config = toml::from_str(&contents)
                .with_context(|| format!("Failed to parse config file: {:?}", config_path))?;

            config.config_path = Some(config_path.to_path_buf());
            Ok(config)
        } else {
            let config = Config {
                config_path: Some(config_path.to_path_buf()),
                ..Config::default()
            };
            config.save()?;
            Ok(config)
        }
    }

    /// Save configuration to file
    pub fn save(&self) -> Result<()> {
        let config_path = self.config_path()?;

        // Ensure parent directory exists
        if let Some(parent) = config_path.parent() {
            std::fs::create_dir_all(parent)
                .with_context(|| format!("Failed to create config directory: {:?}", parent))?;
        }

        let contents = toml::to_string_pretty(self).context("Failed to serialize config")?;

        std::fs::write(&config_path, contents)
            .with_context(|| format!("Failed to write config file: {:?}", config_path))?;

        Ok(())
    }

    /// Get the config file path
    pub fn config_path(&self) -> Result<PathBuf> {
        match &self.config_path {
            Some(path) => Ok(path.clone()),
            None => Self::default_config_path(),
        }
    }

    /// Get default config path
    fn default_config_path() -> Result<PathBuf> {
        Ok(project_dirs()?.config_dir().join("config.toml"))
    }

    /// Check the target address and clamp the poll intervals
    ///
    /// An out-of-range interval is replaced by its fallback rather than
    /// rejected.
    pub fn validate(&mut self) -> Result<()> {
        if self.server.host.parse::<Ipv4Addr>().is_err() {
            bail!("Host must be an IPv4 address, got {:?}", self.server.host);
        }

        let port = &self.server.port;
        if port.is_empty() || port.len() > 5 || !port.bytes().all(|b| b.is_ascii_digit()) {
            bail!("Port must be 1 to 5 digits, got {:?}", port);
        }

        self.polling.rundown_poll_interval_secs = clamp_interval(
            "rundown_poll_interval_secs",
            self.polling.rundown_poll_interval_secs,
            RUNDOWN_POLL_RANGE,
            RUNDOWN_POLL_FALLBACK,
        );
        self.polling.group_poll_interval_secs = clamp_interval(
            "group_poll_interval_secs",
            self.polling.group_poll_interval_secs,
            GROUP_POLL_RANGE,
            GROUP_POLL_FALLBACK,
        );

        Ok(())
    }

    /// Period of the structural refresh
    pub fn rundown_poll_interval(&self) -> Duration {
        Duration::from_secs(self.polling.rundown_poll_interval_secs.max(1) as u64)
    }

    /// Period of the subscription tick
    pub fn group_poll_interval(&self) -> Duration {
        Duration::from_secs(self.polling.group_poll_interval_secs.max(1) as u64)
    }
}

fn clamp_interval(name: &str, value: i64, range: std::ops::RangeInclusive<i64>, fallback: i64) -> i64 {
    if range.contains(&value) {
        value
    } else {
        debug!("{} = {} is outside {:?}, using {}", name, value, range, fallback);
        fallback
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config(rundown: i64, group: i64) -> Config {
        Config {
            polling: PollingConfig {
                rundown_poll_interval_secs: rundown,
                group_poll_interval_secs: group,
            },
            ..Config::default()
        }
    }

    #[test]
    fn test_defaults() {
        let config = Config::default();
        assert_eq!(config.server.host, "127.0.0.1");
        assert_eq!(config.server.port, "5500");
        assert_eq!(config.rundown_poll_interval(), Duration::from_secs(30));
        assert_eq!(config.group_poll_interval(), Duration::from_secs(5));
    }

    #[test]
    fn test_out_of_range_intervals_fall_back() {
        let mut cfg = config(500, 0);
        cfg.validate().unwrap();
        assert_eq!(cfg.polling.rundown_poll_interval_secs, 30);
        assert_eq!(cfg.polling.group_poll_interval_secs, 10);

        let mut cfg = config(9, 31);
        cfg.validate().unwrap();
        assert_eq!(cfg.polling.rundown_poll_interval_secs, 30);
        assert_eq!(cfg.polling.group_poll_interval_secs, 10);

        let mut cfg = config(-5, -1);
        cfg.validate().unwrap();
        assert_eq!(cfg.rundown_poll_interval(), Duration::from_secs(30));
        assert_eq!(cfg.group_poll_interval(), Duration::from_secs(10));
    }

    #[test]
    fn test_in_range_intervals_are_kept() {
        for (rundown, group) in [(10, 1), (300, 30), (45, 7)] {
            let mut cfg = config(rundown, group);
            cfg.validate().unwrap();
            assert_eq!(cfg.polling.rundown_poll_interval_secs, rundown);
            assert_eq!(cfg.polling.group_poll_interval_secs, group);
        }
    }

    #[test]
    fn test_rejects_bad_host_and_port() {
        let mut cfg = Config::default();
        cfg.server.host = "superconductor.local".to_string();
        assert!(cfg.validate().is_err());

        let mut cfg = Config::default();
        cfg.server.host = "256.1.1.1".to_string();
        assert!(cfg.validate().is_err());

        for port in ["", "123456", "55a0", "-1"] {
            let mut cfg = Config::default();
            cfg.server.port = port.to_string();
            assert!(cfg.validate().is_err(), "port {:?} should be rejected", port);
        }

        let mut cfg = Config::default();
        cfg.server.host = "10.0.0.12".to_string();
        cfg.server.port = "8".to_string();
        assert!(cfg.validate().is_ok());
    }

    #[test]
    fn test_parses_port_as_string_or_number() {
        let cfg: Config = toml::from_str("[server]\nhost = \"10.1.1.1\"\nport = 5600\n").unwrap();
        assert_eq!(cfg.server.port, "5600");

        let cfg: Config = toml::from_str("[server]\nport = \"5700\"\n").unwrap();
        assert_eq!(cfg.server.port, "5700");
        assert_eq!(cfg.server.host, "127.0.0.1");
        assert_eq!(cfg.polling, PollingConfig::default());
    }

    #[test]
    fn test_load_creates_default_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("config.toml");

        let config = Config::load_from(&path).unwrap();
        assert!(path.exists());
        assert_eq!(config.config_path().unwrap(), path);

        let mut edited = config.clone();
        edited.polling.group_poll_interval_secs = 2;
        edited.save().unwrap();

        let reloaded = Config::load_from(&path).unwrap();
        assert_eq!(reloaded.polling.group_poll_interval_secs, 2);
        assert_eq!(reloaded.server, ServerConfig::default());
    }
}
