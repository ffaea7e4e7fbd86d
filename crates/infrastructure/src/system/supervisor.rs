//! Runs the resolver as a detached child in its own process group and
//! tracks it through a pid file under the working directory.

use super::process::{is_group_alive, signal_group, Signal};
use hostrelay_domain::{DaemonConfig, DaemonState, DaemonStatus, DomainError, StopOutcome};
use std::ffi::OsString;
use std::fs::{self, File};
use std::os::unix::process::CommandExt;
use std::path::{Path, PathBuf};
use std::process::{Command, Stdio};
use std::thread;
use std::time::Duration;
use tracing::{debug, info, warn};

/// Lines of the daemon log shown when it died without a clean stop.
pub const CRASH_LOG_LINES: usize = 20;

/// How `stop` escalates: INT, a settle pause, an extra grace period if the
/// group survived, then each escalation signal `interval` apart.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StopPolicy {
    pub settle: Duration,
    pub grace: Duration,
    pub escalation: Vec<Signal>,
    pub interval: Duration,
}

impl Default for StopPolicy {
    fn default() -> Self {
        Self {
            settle: Duration::from_millis(100),
            grace: Duration::from_secs(1),
            escalation: vec![
                Signal::Kill,
                Signal::Kill,
                Signal::Kill,
                Signal::Terminate,
                Signal::Terminate,
            ],
            interval: Duration::from_secs(1),
        }
    }
}

pub struct DaemonSupervisor {
    daemon: DaemonConfig,
    program: PathBuf,
    args: Vec<OsString>,
    policy: StopPolicy,
}

impl DaemonSupervisor {
    /// `program` is launched as `program [args…] <port> <working_dir>`.
    pub fn new(daemon: DaemonConfig, program: impl Into<PathBuf>) -> Self {
        Self {
            daemon,
            program: program.into(),
            args: Vec::new(),
            policy: StopPolicy::default(),
        }
    }

    pub fn with_args<I, S>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<OsString>,
    {
        self.args = args.into_iter().map(Into::into).collect();
        self
    }

    pub fn with_policy(mut self, policy: StopPolicy) -> Self {
        self.policy = policy;
        self
    }

    pub fn pid_file(&self) -> PathBuf {
        self.daemon.pid_file()
    }

    pub fn log_file(&self) -> PathBuf {
        self.daemon.log_file()
    }

    pub fn status(&self) -> Result<DaemonStatus, DomainError> {
        Ok(match self.read_pid()? {
            None => DaemonStatus::Stopped,
            Some(pid) if is_group_alive(pid) => DaemonStatus::Running { pid },
            Some(pid) => DaemonStatus::Unknown { pid },
        })
    }

    /// Launches the daemon and returns as soon as it is spawned.
    pub fn start(&self, port: u16) -> Result<DaemonState, DomainError> {
        match self.status()? {
            DaemonStatus::Running { pid } => return Err(DomainError::DaemonAlreadyRunning { pid }),
            DaemonStatus::Unknown { pid } => {
                warn!(pid, "Overwriting pid file left by a crashed daemon");
            }
            DaemonStatus::Stopped => {}
        }

        let working_dir = self.daemon.working_dir();
        fs::create_dir_all(working_dir).map_err(|e| DomainError::supervisor_io(working_dir.display(), e))?;

        let log_path = self.log_file();
        let log = create_with_parents(&log_path)?;
        let log_err = log
            .try_clone()
            .map_err(|e| DomainError::supervisor_io(log_path.display(), e))?;

        let mut child = Command::new(&self.program)
            .args(&self.args)
            .arg(port.to_string())
            .arg(working_dir)
            .current_dir(working_dir)
            .stdin(Stdio::null())
            .stdout(log)
            .stderr(log_err)
            .process_group(0)
            .spawn()
            .map_err(|e| DomainError::SpawnFailed(format!("{}: {}", self.program.display(), e)))?;

        let pid = child.id() as i32;
        let pid_file = self.pid_file();
        if let Err(e) = write_pid(&pid_file, pid) {
            signal_group(pid, Signal::Kill);
            let _ = child.wait();
            return Err(e);
        }

        // Reap the child if it exits while this process is still around.
        let reaper = thread::Builder::new()
            .name("daemon-reaper".into())
            .spawn(move || {
                let _ = child.wait();
            });
        if let Err(e) = reaper {
            debug!(error = %e, "Could not start reaper thread");
        }

        info!(pid, port, log = %log_path.display(), "Daemon started");
        Ok(DaemonState { pid, pid_file })
    }

    pub fn stop(&self) -> Result<StopOutcome, DomainError> {
        let Some(pid) = self.read_pid()? else {
            info!(pid_file = %self.pid_file().display(), "Pid file not found, daemon not running");
            return Ok(StopOutcome::AlreadyStopped);
        };

        if !is_group_alive(pid) {
            warn!(pid, "Daemon process group is gone, has it crashed?");
            self.delete_pid_file()?;
            return Ok(StopOutcome::AlreadyStopped);
        }

        info!(pid, "Stopping daemon");
        signal_group(pid, Signal::Interrupt);
        thread::sleep(self.policy.settle);
        if is_group_alive(pid) {
            thread::sleep(self.policy.grace);
        }

        for signal in &self.policy.escalation {
            if !is_group_alive(pid) {
                break;
            }
            warn!(pid, signal = signal.name(), "Daemon still alive, signalling process group");
            signal_group(pid, *signal);
            thread::sleep(self.policy.interval);
        }

        if is_group_alive(pid) {
            warn!(pid, "Daemon appears to be still running");
            return Ok(StopOutcome::StillRunning { pid });
        }

        self.delete_pid_file()?;
        info!(pid, "Daemon stopped");
        Ok(StopOutcome::StoppedCleanly { pid })
    }

    /// Stop then start. Refuses to start over a daemon that survived `stop`.
    pub fn restart(&self, port: u16) -> Result<DaemonState, DomainError> {
        match self.stop()? {
            StopOutcome::StillRunning { pid } => Err(DomainError::DaemonStillRunning { pid }),
            _ => self.start(port),
        }
    }

    /// The last `lines` lines of the daemon log; empty when there is no log.
    pub fn tail_log(&self, lines: usize) -> Result<Vec<String>, DomainError> {
        let path = self.log_file();
        let contents = match fs::read_to_string(&path) {
            Ok(contents) => contents,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => return Err(DomainError::supervisor_io(path.display(), e)),
        };

        let all: Vec<&str> = contents.lines().collect();
        let start = all.len().saturating_sub(lines);
        Ok(all[start..].iter().map(|l| l.to_string()).collect())
    }

    fn read_pid(&self) -> Result<Option<i32>, DomainError> {
        let path = self.pid_file();
        let contents = match fs::read_to_string(&path) {
            Ok(contents) => contents,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(DomainError::supervisor_io(path.display(), e)),
        };

        let pid = contents
            .trim()
            .parse::<i32>()
            .map_err(|e| DomainError::supervisor_io(path.display(), format!("invalid pid: {}", e)))?;
        // 1 and below would turn the group signal into a broadcast.
        if pid <= 1 {
            return Err(DomainError::supervisor_io(
                path.display(),
                format!("invalid pid: {}", pid),
            ));
        }
        Ok(Some(pid))
    }

    fn delete_pid_file(&self) -> Result<(), DomainError> {
        let path = self.pid_file();
        match fs::remove_file(&path) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(DomainError::supervisor_io(path.display(), e)),
        }
    }
}

fn ensure_parent(path: &Path) -> Result<(), DomainError> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).map_err(|e| DomainError::supervisor_io(parent.display(), e))?;
    }
    Ok(())
}

fn create_with_parents(path: &Path) -> Result<File, DomainError> {
    ensure_parent(path)?;
    File::create(path).map_err(|e| DomainError::supervisor_io(path.display(), e))
}

fn write_pid(path: &Path, pid: i32) -> Result<(), DomainError> {
    ensure_parent(path)?;
    fs::write(path, pid.to_string()).map_err(|e| DomainError::supervisor_io(path.display(), e))
}
