pub mod daemon;
pub mod dns;
pub mod errors;
pub mod logging;
pub mod root;
pub mod server;
pub mod upstream;

pub use daemon::DaemonConfig;
pub use dns::DnsConfig;
pub use errors::ConfigError;
pub use logging::LoggingConfig;
pub use root::{CliOverrides, Config};
pub use server::ServerConfig;
pub use upstream::{UpstreamProtocol, UpstreamTarget};
