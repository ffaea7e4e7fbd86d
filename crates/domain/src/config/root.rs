use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use super::daemon::DaemonConfig;
use super::dns::DnsConfig;
use super::errors::ConfigError;
use super::logging::LoggingConfig;
use super::server::ServerConfig;

/// Main configuration structure, built once at process start and shared
/// read-only with the listener, the engine and the supervisor.
#[derive(Debug, Clone, Deserialize, Serialize, Default)]
pub struct Config {
    #[serde(default)]
    pub server: ServerConfig,

    #[serde(default)]
    pub dns: DnsConfig,

    #[serde(default)]
    pub daemon: DaemonConfig,

    #[serde(default)]
    pub logging: LoggingConfig,
}

impl Config {
    /// Load configuration for a working directory.
    ///
    /// Priority order:
    /// 1. Explicitly provided path
    /// 2. `config.toml` inside the working directory
    /// 3. Default configuration
    ///
    /// Command-line overrides are applied last.
    pub fn load(
        working_dir: impl Into<PathBuf>,
        path: Option<&Path>,
        cli_overrides: CliOverrides,
    ) -> Result<Self, ConfigError> {
        let working_dir = working_dir.into();
        let default_path = working_dir.join("config.toml");

        let mut config = if let Some(path) = path {
            Self::from_file(path)?
        } else if default_path.exists() {
            Self::from_file(&default_path)?
        } else {
            Self::default()
        };

        config.daemon.working_dir = working_dir;
        config.apply_cli_overrides(cli_overrides);
        config.validate()?;
        Ok(config)
    }

    fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let contents = std::fs::read_to_string(path)
            .map_err(|e| ConfigError::FileRead(path.display().to_string(), e.to_string()))?;
        Self::from_toml(&contents)
    }

    pub fn from_toml(contents: &str) -> Result<Self, ConfigError> {
        toml::from_str(contents).map_err(|e| ConfigError::Parse(e.to_string()))
    }

    fn apply_cli_overrides(&mut self, overrides: CliOverrides) {
        if let Some(port) = overrides.dns_port {
            self.server.port = port;
        }
        if let Some(bind) = overrides.bind_address {
            self.server.bind_address = bind;
        }
        if let Some(level) = overrides.log_level {
            self.logging.level = level;
        }
        if !overrides.upstream.is_empty() {
            self.dns.upstream = overrides.upstream;
        }
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.server.port == 0 {
            return Err(ConfigError::Validation("DNS port cannot be 0".to_string()));
        }

        if self.dns.upstream.is_empty() {
            return Err(ConfigError::Validation(
                "No upstream servers configured".to_string(),
            ));
        }

        if let Some(target) = self.dns.upstream.iter().find(|t| t.host.is_empty()) {
            return Err(ConfigError::Validation(format!(
                "Upstream entry {} has an empty host",
                target
            )));
        }

        if self.dns.query_timeout_ms == 0 {
            return Err(ConfigError::Validation(
                "query_timeout_ms must be greater than 0".to_string(),
            ));
        }

        if self.daemon.name.is_empty() || self.daemon.name.contains('/') {
            return Err(ConfigError::Validation(format!(
                "Invalid daemon name '{}'",
                self.daemon.name
            )));
        }

        Ok(())
    }
}

/// Command-line overrides for configuration
#[derive(Debug, Default)]
pub struct CliOverrides {
    pub dns_port: Option<u16>,
    pub bind_address: Option<String>,
    pub log_level: Option<String>,
    pub upstream: Vec<super::upstream::UpstreamTarget>,
}
