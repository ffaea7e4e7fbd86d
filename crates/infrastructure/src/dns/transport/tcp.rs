//! TCP Transport for DNS queries (RFC 1035 §4.2.2): every message is
//! preceded by its length as a big-endian u16.

use super::{DnsTransport, TransportResponse};
use async_trait::async_trait;
use hostrelay_domain::DomainError;
use std::net::SocketAddr;
use std::time::Duration;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpStream;
use tracing::debug;

pub struct TcpTransport {
    server_addr: SocketAddr,
}

impl TcpTransport {
    pub fn new(server_addr: SocketAddr) -> Self {
        Self { server_addr }
    }

    fn server(&self) -> String {
        self.server_addr.to_string()
    }

    async fn connect(&self, timeout: Duration) -> Result<TcpStream, DomainError> {
        let stream = tokio::time::timeout(timeout, TcpStream::connect(self.server_addr))
            .await
            .map_err(|_| DomainError::TransportTimeout {
                server: self.server(),
            })?
            .map_err(|e| {
                if e.kind() == std::io::ErrorKind::ConnectionRefused {
                    DomainError::TransportConnectionRefused {
                        server: self.server(),
                    }
                } else {
                    DomainError::TransportIo {
                        server: self.server(),
                        reason: e.to_string(),
                    }
                }
            })?;

        stream.set_nodelay(true).map_err(|e| DomainError::TransportIo {
            server: self.server(),
            reason: format!("Failed to set TCP_NODELAY: {}", e),
        })?;

        Ok(stream)
    }
}

#[async_trait]
impl DnsTransport for TcpTransport {
    async fn send(
        &self,
        message_bytes: &[u8],
        timeout: Duration,
    ) -> Result<TransportResponse, DomainError> {
        let mut stream = self.connect(timeout).await?;

        tokio::time::timeout(timeout, send_with_length_prefix(&mut stream, message_bytes))
            .await
            .map_err(|_| DomainError::TransportTimeout {
                server: self.server(),
            })?
            .map_err(|e| self.with_server(e))?;

        debug!(server = %self.server_addr, message_len = message_bytes.len(), "TCP query sent");

        let response_bytes = tokio::time::timeout(timeout, read_with_length_prefix(&mut stream))
            .await
            .map_err(|_| DomainError::TransportTimeout {
                server: self.server(),
            })?
            .map_err(|e| self.with_server(e))?;

        debug!(server = %self.server_addr, response_len = response_bytes.len(), "TCP response received");

        Ok(TransportResponse {
            bytes: response_bytes,
            protocol_used: "TCP",
        })
    }
}

impl TcpTransport {
    fn with_server(&self, e: std::io::Error) -> DomainError {
        DomainError::TransportIo {
            server: self.server(),
            reason: e.to_string(),
        }
    }
}

/// Writes one length-prefixed DNS message.
pub(crate) async fn send_with_length_prefix<S>(
    stream: &mut S,
    message_bytes: &[u8],
) -> std::io::Result<()>
where
    S: AsyncWriteExt + Unpin,
{
    let length = u16::try_from(message_bytes.len()).map_err(|_| {
        std::io::Error::new(
            std::io::ErrorKind::InvalidInput,
            format!("DNS message too large: {} bytes", message_bytes.len()),
        )
    })?;

    let mut framed = Vec::with_capacity(message_bytes.len() + 2);
    framed.extend_from_slice(&length.to_be_bytes());
    framed.extend_from_slice(message_bytes);

    stream.write_all(&framed).await?;
    stream.flush().await
}

/// Reads one length-prefixed DNS message. A clean EOF before the prefix
/// surfaces as `UnexpectedEof`.
pub(crate) async fn read_with_length_prefix<S>(stream: &mut S) -> std::io::Result<Vec<u8>>
where
    S: AsyncReadExt + Unpin,
{
    let mut len_buf = [0u8; 2];
    stream.read_exact(&mut len_buf).await?;

    let message_len = u16::from_be_bytes(len_buf) as usize;

    let mut message = vec![0u8; message_len];
    stream.read_exact(&mut message).await?;

    Ok(message)
}
