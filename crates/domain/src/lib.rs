//! hostrelay domain layer
pub mod config;
pub mod daemon;
pub mod dns_query;
pub mod dns_record;
pub mod errors;
pub mod resolution;

pub use config::{
    CliOverrides, Config, ConfigError, DaemonConfig, DnsConfig, LoggingConfig, ServerConfig,
    UpstreamProtocol, UpstreamTarget,
};
pub use daemon::{DaemonState, DaemonStatus, StopOutcome};
pub use dns_query::DnsQuery;
pub use dns_record::RecordType;
pub use errors::DomainError;
pub use resolution::{LocalAnswer, Resolution};
