//! Continuum configuration management.
//!
//! Handles the user configuration file at:
//! - Linux: ~/.config/continuum/config.toml
//! - macOS: ~/Library/Application Support/continuum/config.toml
//! - Windows: %APPDATA%\continuum\config.toml
//!
//! This is per-user tool configuration. Per-project settings live in the
//! project descriptor (see `project::descriptor`).

use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

use crate::error::{ContinuumError, Result};
use crate::fs_utils;

/// Continuum configuration
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct ContinuumConfig {
    /// Logging settings
    #[serde(default)]
    pub logging: LoggingConfig,

    /// Sync hub connection settings
    #[serde(default)]
    pub hub: HubConfig,

    /// Coordinator behaviour
    #[serde(default)]
    pub sync: SyncConfig,

    /// Out-of-line analysis pass run on project creation
    #[serde(default)]
    pub analysis: AnalysisConfig,

    /// Analysis database naming
    #[serde(default)]
    pub database: DatabaseConfig,
}

/// Logging configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Log level (error, warn, info, debug, trace)
    #[serde(default = "default_log_level")]
    pub level: String,
}

fn default_log_level() -> String {
    "info".to_string()
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
        }
    }
}

/// Hub connection configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HubConfig {
    #[serde(default = "default_hub_host")]
    pub host: String,

    #[serde(default = "default_hub_port")]
    pub port: u16,

    /// Connect to the hub as soon as a project is opened
    #[serde(default = "default_true")]
    pub connect_on_open: bool,
}

fn default_hub_host() -> String {
    "127.0.0.1".to_string()
}

fn default_hub_port() -> u16 {
    9850
}

fn default_true() -> bool {
    true
}

impl Default for HubConfig {
    fn default() -> Self {
        Self {
            host: default_hub_host(),
            port: default_hub_port(),
            connect_on_open: true,
        }
    }
}

impl HubConfig {
    /// WebSocket URL of the hub
    pub fn url(&self) -> String {
        format!("ws://{}:{}", self.host, self.port)
    }
}

/// Coordinator configuration
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct SyncConfig {
    /// Push the full local type set whenever the client (re)connects.
    ///
    /// Off by default: the first push happens on the next local change.
    #[serde(default)]
    pub push_on_connect: bool,
}

/// Analysis launcher configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AnalysisConfig {
    /// Headless analyzer executable. The pass is skipped when unset.
    #[serde(default)]
    pub program: Option<PathBuf>,

    /// Script handed to the analyzer with `-S`
    #[serde(default)]
    pub script: Option<PathBuf>,

    /// Skip binaries whose analysis database already exists
    #[serde(default = "default_true")]
    pub skip_existing: bool,
}

impl Default for AnalysisConfig {
    fn default() -> Self {
        Self {
            program: None,
            script: None,
            skip_existing: true,
        }
    }
}

/// Analysis database flavour, which determines the file extension
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum DatabaseFormat {
    /// 64-bit database (`.i64`)
    #[default]
    I64,
    /// 32-bit database (`.idb`)
    Idb,
}

impl DatabaseFormat {
    pub fn extension(self) -> &'static str {
        match self {
            Self::I64 => "i64",
            Self::Idb => "idb",
        }
    }
}

/// Database naming configuration
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct DatabaseConfig {
    #[serde(default)]
    pub format: DatabaseFormat,
}

impl ContinuumConfig {
    /// Path of the user configuration file
    pub fn default_path() -> PathBuf {
        fs_utils::get_config_base_dir().join("config.toml")
    }

    /// Load configuration from the default path
    pub fn load() -> Result<Self> {
        Self::load_from(&Self::default_path())
    }

    /// Load configuration from a specific path, falling back to defaults when absent
    pub fn load_from(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Ok(Self::default());
        }

        let content = fs::read_to_string(path)?;
        toml::from_str(&content).map_err(|e| ContinuumError::Config {
            message: format!("Failed to parse {}: {}", path.display(), e),
        })
    }

    #[cfg(test)]
    fn save_to(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }

        let content = toml::to_string_pretty(self).map_err(|e| ContinuumError::Config {
            message: format!("Failed to serialize config: {}", e),
        })?;
        fs_utils::write_atomic(path, content.as_bytes())?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_default_config() {
        let config = ContinuumConfig::default();
        assert_eq!(config.logging.level, "info");
        assert_eq!(config.hub.url(), "ws://127.0.0.1:9850");
        assert!(config.hub.connect_on_open);
        assert!(!config.sync.push_on_connect);
        assert!(config.analysis.program.is_none());
        assert!(config.analysis.skip_existing);
        assert_eq!(config.database.format, DatabaseFormat::I64);
    }

    #[test]
    fn test_missing_file_yields_defaults() {
        let dir = tempdir().unwrap();
        let config = ContinuumConfig::load_from(&dir.path().join("absent.toml")).unwrap();
        assert_eq!(config.hub.port, 9850);
    }

    #[test]
    fn test_partial_file_keeps_other_defaults() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("config.toml");
        fs::write(
            &path,
            "[hub]\nport = 7000\n\n[database]\nformat = \"idb\"\n\n[sync]\npush_on_connect = true\n",
        )
        .unwrap();

        let config = ContinuumConfig::load_from(&path).unwrap();
        assert_eq!(config.hub.port, 7000);
        assert_eq!(config.hub.host, "127.0.0.1");
        assert_eq!(config.database.format.extension(), "idb");
        assert!(config.sync.push_on_connect);
        assert_eq!(config.logging.level, "info");
    }

    #[test]
    fn test_save_and_reload() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("nested").join("config.toml");

        let mut config = ContinuumConfig::default();
        config.analysis.program = Some(PathBuf::from("/opt/ida/idat64"));
        config.save_to(&path).unwrap();

        let loaded = ContinuumConfig::load_from(&path).unwrap();
        assert_eq!(
            loaded.analysis.program,
            Some(PathBuf::from("/opt/ida/idat64"))
        );
    }

    #[test]
    fn test_invalid_toml_is_config_error() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("config.toml");
        fs::write(&path, "[hub\nport = ").unwrap();

        let err = ContinuumConfig::load_from(&path).unwrap_err();
        assert!(matches!(err, ContinuumError::Config { .. }));
    }
}
