use hostrelay_domain::DomainError;
use std::net::{IpAddr, SocketAddr};
use std::time::Duration;

/// Resolves an upstream host to all its socket addresses. IP literals are
/// returned as-is without touching the system resolver.
pub async fn resolve_all(
    hostname: &str,
    port: u16,
    timeout: Duration,
) -> Result<Vec<SocketAddr>, DomainError> {
    if let Ok(ip) = hostname.trim_matches(|c| c == '[' || c == ']').parse::<IpAddr>() {
        return Ok(vec![SocketAddr::new(ip, port)]);
    }

    let target = format!("{}:{}", hostname, port);

    let addrs_iter = tokio::time::timeout(timeout, tokio::net::lookup_host(&target))
        .await
        .map_err(|_| DomainError::TransportTimeout {
            server: target.clone(),
        })?
        .map_err(|e| DomainError::TransportIo {
            server: target.clone(),
            reason: format!("DNS resolution failed: {}", e),
        })?;

    let addrs: Vec<SocketAddr> = addrs_iter.collect();

    if addrs.is_empty() {
        return Err(DomainError::TransportIo {
            server: target,
            reason: "no addresses found".into(),
        });
    }

    Ok(addrs)
}
