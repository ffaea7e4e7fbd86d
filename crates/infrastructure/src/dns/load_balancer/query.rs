use super::pool::UpstreamServer;
use crate::dns::forwarding::ResponseParser;
use crate::dns::transport;
use hostrelay_domain::{DomainError, UpstreamProtocol};
use std::time::{Duration, Instant};
use tracing::debug;

/// Result of a single-server query attempt
pub struct QueryAttemptResult {
    pub bytes: Vec<u8>,
    pub protocol_used: &'static str,
    pub latency_ms: u64,
}

/// Send a wire-format query to one upstream and return its raw answer.
///
/// The whole attempt, including a TCP retry after a truncated UDP answer,
/// is bounded by `timeout`.
pub async fn query_server(
    server: &UpstreamServer,
    request: &[u8],
    timeout: Duration,
) -> Result<QueryAttemptResult, DomainError> {
    tokio::time::timeout(timeout, attempt(server, request, timeout))
        .await
        .map_err(|_| DomainError::TransportTimeout {
            server: server.to_string(),
        })?
}

async fn attempt(
    server: &UpstreamServer,
    request: &[u8],
    timeout: Duration,
) -> Result<QueryAttemptResult, DomainError> {
    let start = Instant::now();

    let dns_transport = transport::create_transport(server.protocol, server.addr);
    let response = dns_transport.send(request, timeout).await?;
    check_id(server, request, &response.bytes)?;

    if server.protocol == UpstreamProtocol::Udp && ResponseParser::is_truncated(&response.bytes) {
        debug!(server = %server, "Response truncated (TC bit), retrying via TCP");

        let tcp_transport = transport::create_transport(UpstreamProtocol::Tcp, server.addr);
        let remaining = timeout
            .checked_sub(start.elapsed())
            .unwrap_or(Duration::from_millis(500));

        let tcp_response = tcp_transport.send(request, remaining).await?;
        check_id(server, request, &tcp_response.bytes)?;

        return Ok(QueryAttemptResult {
            bytes: tcp_response.bytes,
            protocol_used: tcp_response.protocol_used,
            latency_ms: start.elapsed().as_millis() as u64,
        });
    }

    Ok(QueryAttemptResult {
        bytes: response.bytes,
        protocol_used: response.protocol_used,
        latency_ms: start.elapsed().as_millis() as u64,
    })
}

fn check_id(server: &UpstreamServer, request: &[u8], response: &[u8]) -> Result<(), DomainError> {
    let expected = ResponseParser::message_id(request);
    let received = ResponseParser::message_id(response);
    if response.len() < 12 || expected != received {
        return Err(DomainError::TransportIo {
            server: server.to_string(),
            reason: format!(
                "response does not match query (id {:?}, got {:?})",
                expected, received
            ),
        });
    }
    Ok(())
}
