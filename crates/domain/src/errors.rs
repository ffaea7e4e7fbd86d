use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum DomainError {
    #[error("Invalid domain name: {0}")]
    InvalidDomainName(String),

    #[error("Invalid DNS message: {0}")]
    InvalidDnsMessage(String),

    #[error("Invalid DNS response: {0}")]
    InvalidDnsResponse(String),

    #[error("Host store lookup failed: {0}")]
    StoreLookup(String),

    #[error("Host store write failed: {0}")]
    StoreWrite(String),

    #[error("Alias chain loops back to {name}")]
    ResolutionCycle { name: String },

    #[error("Transport timeout talking to {server}")]
    TransportTimeout { server: String },

    #[error("Transport connection refused by {server}")]
    TransportConnectionRefused { server: String },

    #[error("Transport error with {server}: {reason}")]
    TransportIo { server: String, reason: String },

    #[error("No upstream servers configured")]
    TransportNoUpstreams,

    #[error("All upstream servers are unreachable")]
    TransportAllServersUnreachable,

    #[error("Daemon already running with pid {pid}")]
    DaemonAlreadyRunning { pid: i32 },

    #[error("Daemon still running with pid {pid} after stop attempts")]
    DaemonStillRunning { pid: i32 },

    #[error("Supervisor I/O error on {path}: {reason}")]
    SupervisorIo { path: String, reason: String },

    #[error("Failed to spawn daemon: {0}")]
    SpawnFailed(String),
}

impl DomainError {
    /// Errors that mean "no upstream answered"; the listener drops the query
    /// instead of replying.
    pub fn is_upstream_unavailable(&self) -> bool {
        matches!(
            self,
            Self::TransportTimeout { .. }
                | Self::TransportConnectionRefused { .. }
                | Self::TransportIo { .. }
                | Self::TransportNoUpstreams
                | Self::TransportAllServersUnreachable
        )
    }

    pub fn supervisor_io(path: impl std::fmt::Display, err: impl std::fmt::Display) -> Self {
        Self::SupervisorIo {
            path: path.to_string(),
            reason: err.to_string(),
        }
    }
}
