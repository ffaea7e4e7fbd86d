//! Lifecycle state of the background resolver process.

use std::fmt;
use std::path::PathBuf;

/// What the pid file records about a launched daemon.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DaemonState {
    pub pid: i32,
    pub pid_file: PathBuf,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DaemonStatus {
    Stopped,
    Running { pid: i32 },
    /// Pid file present but its process group is gone, most likely a crash.
    Unknown { pid: i32 },
}

impl DaemonStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Stopped => "stopped",
            Self::Running { .. } => "running",
            Self::Unknown { .. } => "unknown",
        }
    }

    pub fn pid(&self) -> Option<i32> {
        match self {
            Self::Stopped => None,
            Self::Running { pid } | Self::Unknown { pid } => Some(*pid),
        }
    }

    pub fn is_running(&self) -> bool {
        matches!(self, Self::Running { .. })
    }
}

impl fmt::Display for DaemonStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.pid() {
            Some(pid) => write!(f, "{} pid={}", self.as_str(), pid),
            None => f.write_str(self.as_str()),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StopOutcome {
    /// No pid file, or the recorded process group had already exited.
    AlreadyStopped,
    StoppedCleanly { pid: i32 },
    /// Every signal in the escalation was delivered and the group survived.
    StillRunning { pid: i32 },
}
