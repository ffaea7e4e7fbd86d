//! UDP Transport for DNS queries (RFC 1035 §4.2.1)
//!
//! Messages are sent as-is (no framing). If the response has the TC bit set,
//! the caller retries via TCP.

use super::{DnsTransport, TransportResponse};
use async_trait::async_trait;
use hostrelay_domain::DomainError;
use std::net::{Ipv4Addr, Ipv6Addr, SocketAddr};
use std::time::Duration;
use tokio::net::UdpSocket;
use tracing::{debug, warn};

/// Maximum UDP DNS response size with EDNS(0)
const MAX_UDP_RESPONSE_SIZE: usize = 4096;

/// DNS over UDP transport
pub struct UdpTransport {
    server_addr: SocketAddr,
}

impl UdpTransport {
    pub fn new(server_addr: SocketAddr) -> Self {
        Self { server_addr }
    }

    fn io_error(&self, e: std::io::Error) -> DomainError {
        if e.kind() == std::io::ErrorKind::ConnectionRefused {
            DomainError::TransportConnectionRefused {
                server: self.server_addr.to_string(),
            }
        } else {
            DomainError::TransportIo {
                server: self.server_addr.to_string(),
                reason: e.to_string(),
            }
        }
    }

    fn timeout_error(&self) -> DomainError {
        DomainError::TransportTimeout {
            server: self.server_addr.to_string(),
        }
    }
}

#[async_trait]
impl DnsTransport for UdpTransport {
    async fn send(
        &self,
        message_bytes: &[u8],
        timeout: Duration,
    ) -> Result<TransportResponse, DomainError> {
        // Ephemeral port in the server's address family
        let bind_addr: SocketAddr = if self.server_addr.is_ipv4() {
            SocketAddr::from((Ipv4Addr::UNSPECIFIED, 0))
        } else {
            SocketAddr::from((Ipv6Addr::UNSPECIFIED, 0))
        };

        let socket = UdpSocket::bind(bind_addr)
            .await
            .map_err(|e| self.io_error(e))?;

        let bytes_sent =
            tokio::time::timeout(timeout, socket.send_to(message_bytes, self.server_addr))
                .await
                .map_err(|_| self.timeout_error())?
                .map_err(|e| self.io_error(e))?;

        debug!(server = %self.server_addr, bytes_sent = bytes_sent, "UDP query sent");

        let mut recv_buf = vec![0u8; MAX_UDP_RESPONSE_SIZE];

        let (bytes_received, from_addr) =
            tokio::time::timeout(timeout, socket.recv_from(&mut recv_buf))
                .await
                .map_err(|_| self.timeout_error())?
                .map_err(|e| self.io_error(e))?;

        if from_addr.ip() != self.server_addr.ip() {
            warn!(
                expected = %self.server_addr,
                received_from = %from_addr,
                "UDP response from unexpected source"
            );
        }

        recv_buf.truncate(bytes_received);

        debug!(server = %self.server_addr, bytes_received = bytes_received, "UDP response received");

        Ok(TransportResponse {
            bytes: recv_buf,
            protocol_used: "UDP",
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_udp_transport_creation() {
        let addr: SocketAddr = "8.8.8.8:53".parse().unwrap();
        let transport = UdpTransport::new(addr);
        assert_eq!(transport.server_addr, addr);
    }

    #[tokio::test]
    async fn test_silent_server_times_out() {
        let silent = UdpSocket::bind("127.0.0.1:0").await.unwrap();
        let transport = UdpTransport::new(silent.local_addr().unwrap());

        let result = transport
            .send(&[0u8; 12], Duration::from_millis(100))
            .await;

        assert!(matches!(result, Err(DomainError::TransportTimeout { .. })));
    }
}
