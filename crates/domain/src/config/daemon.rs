use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

pub const DEFAULT_DAEMON_NAME: &str = "hostrelay";

/// Where the daemon keeps its pid file, log and host table.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct DaemonConfig {
    #[serde(default = "default_name")]
    pub name: String,

    /// Not read from the config file: the file itself lives here.
    #[serde(skip)]
    pub working_dir: PathBuf,
}

impl DaemonConfig {
    pub fn new(working_dir: impl Into<PathBuf>) -> Self {
        Self {
            name: default_name(),
            working_dir: working_dir.into(),
        }
    }

    pub fn working_dir(&self) -> &Path {
        &self.working_dir
    }

    pub fn pid_file(&self) -> PathBuf {
        self.working_dir.join("run").join(format!("{}.pid", self.name))
    }

    pub fn log_file(&self) -> PathBuf {
        self.working_dir.join("log").join(format!("{}.log", self.name))
    }

    pub fn hosts_file(&self) -> PathBuf {
        self.working_dir.join("hosts.json")
    }

    pub fn config_file(&self) -> PathBuf {
        self.working_dir.join("config.toml")
    }

    /// `$HOME/.local/share/hostrelay`, or `./.hostrelay` when `HOME` is unset.
    pub fn default_working_dir() -> PathBuf {
        match std::env::var_os("HOME") {
            Some(home) if !home.is_empty() => PathBuf::from(home)
                .join(".local")
                .join("share")
                .join(DEFAULT_DAEMON_NAME),
            _ => PathBuf::from(format!(".{}", DEFAULT_DAEMON_NAME)),
        }
    }
}

impl Default for DaemonConfig {
    fn default() -> Self {
        Self::new(Self::default_working_dir())
    }
}

fn default_name() -> String {
    DEFAULT_DAEMON_NAME.to_string()
}
