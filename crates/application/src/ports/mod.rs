mod host_store;
mod upstream_resolver;

pub use host_store::HostStore;
pub use upstream_resolver::UpstreamResolver;

// Re-export for convenience
pub use hostrelay_domain::DnsQuery;
