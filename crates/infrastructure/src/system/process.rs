//! Thin wrappers around `kill(2)` addressed to whole process groups.

use tracing::debug;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Signal {
    Interrupt,
    Kill,
    Terminate,
}

impl Signal {
    pub fn as_raw(&self) -> libc::c_int {
        match self {
            Self::Interrupt => libc::SIGINT,
            Self::Kill => libc::SIGKILL,
            Self::Terminate => libc::SIGTERM,
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            Self::Interrupt => "INT",
            Self::Kill => "KILL",
            Self::Terminate => "TERM",
        }
    }
}

/// Only ids above 1 name a single group: `kill(-1, ..)` reaches every
/// process the caller may signal, `kill(0, ..)` the caller's own group.
fn is_addressable(pgid: i32) -> bool {
    pgid > 1
}

/// Whether any process is left in the group led by `pgid`. A group owned by
/// another user (EPERM) still counts as alive.
pub fn is_group_alive(pgid: i32) -> bool {
    if !is_addressable(pgid) {
        return false;
    }
    // SAFETY: signal 0 only performs the existence and permission check.
    let rc = unsafe { libc::kill(-pgid, 0) };
    probe_means_alive(rc, std::io::Error::last_os_error().raw_os_error())
}

fn probe_means_alive(rc: libc::c_int, errno: Option<i32>) -> bool {
    rc == 0 || errno == Some(libc::EPERM)
}

/// Delivers `signal` to every process in the group. Delivery failures
/// (the group is already gone) are not errors for the caller.
pub fn signal_group(pgid: i32, signal: Signal) {
    if !is_addressable(pgid) {
        return;
    }
    // SAFETY: plain kill(2) on a negative pid, no memory is shared.
    let rc = unsafe { libc::kill(-pgid, signal.as_raw()) };
    if rc != 0 {
        debug!(
            pgid,
            signal = signal.name(),
            error = %std::io::Error::last_os_error(),
            "Signal not delivered"
        );
    }
}
