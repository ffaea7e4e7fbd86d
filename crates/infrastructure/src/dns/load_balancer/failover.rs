use super::pool::UpstreamServer;
use super::query::query_server;
use hostrelay_domain::DomainError;
use std::time::Duration;
use tracing::{debug, warn};

/// Tries upstreams in configuration order; the first one to answer wins.
pub struct FailoverStrategy;

impl FailoverStrategy {
    pub fn new() -> Self {
        Self
    }

    pub async fn query(
        &self,
        servers: &[UpstreamServer],
        request: &[u8],
        timeout: Duration,
    ) -> Result<Vec<u8>, DomainError> {
        if servers.is_empty() {
            return Err(DomainError::TransportNoUpstreams);
        }
        debug!(strategy = "failover", servers = servers.len(), "Trying sequentially");

        for (index, server) in servers.iter().enumerate() {
            match query_server(server, request, timeout).await {
                Ok(r) => {
                    debug!(
                        server = %server,
                        protocol = r.protocol_used,
                        latency_ms = r.latency_ms,
                        position = index,
                        "Server responded"
                    );
                    return Ok(r.bytes);
                }
                Err(e) => {
                    warn!(server = %server, error = %e, position = index, "Failing over");
                }
            }
        }
        Err(DomainError::TransportAllServersUnreachable)
    }
}

impl Default for FailoverStrategy {
    fn default() -> Self {
        Self::new()
    }
}
