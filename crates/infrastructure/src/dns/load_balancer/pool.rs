use super::failover::FailoverStrategy;
use crate::dns::forwarding::MessageBuilder;
use crate::dns::transport::resolver;
use async_trait::async_trait;
use hostrelay_application::ports::UpstreamResolver;
use hostrelay_domain::{DnsQuery, DomainError, UpstreamProtocol, UpstreamTarget};
use std::fmt;
use std::net::SocketAddr;
use std::time::Duration;
use tracing::{debug, info, warn};

const HOSTNAME_RESOLUTION_TIMEOUT: Duration = Duration::from_secs(5);

/// One upstream endpoint with its host already resolved.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UpstreamServer {
    pub protocol: UpstreamProtocol,
    pub addr: SocketAddr,
}

impl UpstreamServer {
    pub fn new(protocol: UpstreamProtocol, addr: SocketAddr) -> Self {
        Self { protocol, addr }
    }
}

impl fmt::Display for UpstreamServer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}://{}", self.protocol.as_str(), self.addr)
    }
}

/// The ordered set of upstream resolvers, built once at startup.
pub struct UpstreamPool {
    servers: Vec<UpstreamServer>,
    strategy: FailoverStrategy,
    timeout: Duration,
}

impl UpstreamPool {
    /// Resolves every target's host. Targets whose host cannot be resolved
    /// are skipped; the pool fails only when none is left.
    pub async fn new(targets: &[UpstreamTarget], timeout: Duration) -> Result<Self, DomainError> {
        let mut servers = Vec::new();

        for target in targets {
            match resolver::resolve_all(&target.host, target.port, HOSTNAME_RESOLUTION_TIMEOUT)
                .await
            {
                Ok(addrs) => {
                    for addr in addrs {
                        debug!(target = %target, resolved = %addr, "Upstream resolved");
                        servers.push(UpstreamServer::new(target.protocol, addr));
                    }
                }
                Err(e) => {
                    warn!(target = %target, error = %e, "Skipping unresolvable upstream");
                }
            }
        }

        if servers.is_empty() {
            return Err(DomainError::TransportNoUpstreams);
        }

        info!(
            servers = servers.len(),
            timeout_ms = timeout.as_millis() as u64,
            "Upstream pool ready"
        );

        Ok(Self::from_servers(servers, timeout))
    }

    pub fn from_servers(servers: Vec<UpstreamServer>, timeout: Duration) -> Self {
        Self {
            servers,
            strategy: FailoverStrategy::new(),
            timeout,
        }
    }

    pub fn servers(&self) -> &[UpstreamServer] {
        &self.servers
    }
}

#[async_trait]
impl UpstreamResolver for UpstreamPool {
    async fn forward(&self, request: &[u8]) -> Result<Vec<u8>, DomainError> {
        self.strategy
            .query(&self.servers, request, self.timeout)
            .await
    }

    async fn resolve(&self, query: &DnsQuery) -> Result<Vec<u8>, DomainError> {
        let request = MessageBuilder::build_query(&query.domain, &query.record_type)?;
        self.strategy
            .query(&self.servers, &request, self.timeout)
            .await
    }
}
