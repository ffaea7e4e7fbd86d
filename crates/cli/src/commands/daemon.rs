use anyhow::Context;
use hostrelay_domain::{Config, DaemonStatus, DomainError, StopOutcome, UpstreamTarget};
use hostrelay_infrastructure::system::supervisor::CRASH_LOG_LINES;
use hostrelay_infrastructure::system::DaemonSupervisor;
use std::ffi::OsString;
use std::path::Path;

/// Supervisor that relaunches this binary as `<exe> [forwarded flags] run
/// <port> <dir>`.
pub fn supervisor(config: &Config, forwarded: Vec<OsString>) -> anyhow::Result<DaemonSupervisor> {
    let exe = std::env::current_exe().context("cannot locate the hostrelay executable")?;
    let mut args = forwarded;
    args.push("run".into());
    Ok(DaemonSupervisor::new(config.daemon.clone(), exe).with_args(args))
}

pub fn start(supervisor: &DaemonSupervisor, config: &Config) -> anyhow::Result<()> {
    let state = supervisor.start(config.server.port)?;
    println!(
        "Daemon started: pid={} port={} log={}",
        state.pid,
        config.server.port,
        supervisor.log_file().display()
    );
    Ok(())
}

pub fn stop(supervisor: &DaemonSupervisor) -> anyhow::Result<()> {
    match supervisor.stop()? {
        StopOutcome::AlreadyStopped => println!("Daemon is not running"),
        StopOutcome::StoppedCleanly { pid } => println!("Daemon stopped (pid {})", pid),
        StopOutcome::StillRunning { pid } => {
            return Err(DomainError::DaemonStillRunning { pid }.into());
        }
    }
    Ok(())
}

pub fn restart(supervisor: &DaemonSupervisor, config: &Config) -> anyhow::Result<()> {
    let state = supervisor.restart(config.server.port)?;
    println!("Daemon restarted: pid={} port={}", state.pid, config.server.port);
    Ok(())
}

pub fn status(supervisor: &DaemonSupervisor) -> anyhow::Result<()> {
    let status = supervisor.status()?;
    println!("Daemon status: {}", status);

    if let DaemonStatus::Unknown { .. } = status {
        let tail = supervisor.tail_log(CRASH_LOG_LINES)?;
        if !tail.is_empty() {
            eprintln!("Daemon appears to have crashed, last log lines:");
            for line in tail {
                eprintln!("  {}", line);
            }
        }
    }
    Ok(())
}

/// Flags a `run` child needs to see the same configuration as its parent.
pub fn forwarded_flags(
    config_path: Option<&Path>,
    bind: Option<&str>,
    log_level: Option<&str>,
    upstream: &[UpstreamTarget],
) -> Vec<OsString> {
    let mut flags = Vec::new();
    if let Some(path) = config_path {
        flags.push("--config".into());
        flags.push(path.as_os_str().to_owned());
    }
    if let Some(bind) = bind {
        flags.push("--bind".into());
        flags.push(bind.into());
    }
    if let Some(level) = log_level {
        flags.push("--log-level".into());
        flags.push(level.into());
    }
    for target in upstream {
        flags.push("--upstream".into());
        flags.push(target.to_string().into());
    }
    flags
}
