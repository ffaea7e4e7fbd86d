#![allow(dead_code)]
use std::net::{Ipv4Addr, SocketAddr};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::{TcpListener, UdpSocket};
use tokio::sync::oneshot;

/// Address every mock answer carries.
pub const MOCK_ANSWER: Ipv4Addr = Ipv4Addr::new(93, 184, 216, 34);

#[derive(Clone, Copy, PartialEq, Eq)]
enum Mode {
    Answer,
    /// UDP replies carry only the TC bit; the full answer is on TCP.
    Truncate,
    /// Never replies.
    Silent,
}

/// Loopback upstream on an ephemeral port, UDP and TCP on the same port.
pub struct MockDnsServer {
    addr: SocketAddr,
    udp_queries: Arc<AtomicUsize>,
    tcp_queries: Arc<AtomicUsize>,
    shutdown_tx: Option<oneshot::Sender<()>>,
}

impl MockDnsServer {
    pub async fn start() -> Result<Self, std::io::Error> {
        Self::start_with(Mode::Answer).await
    }

    pub async fn start_truncating() -> Result<Self, std::io::Error> {
        Self::start_with(Mode::Truncate).await
    }

    pub async fn start_silent() -> Result<Self, std::io::Error> {
        Self::start_with(Mode::Silent).await
    }

    async fn start_with(mode: Mode) -> Result<Self, std::io::Error> {
        let socket = UdpSocket::bind(SocketAddr::from(([127, 0, 0, 1], 0))).await?;
        let addr = socket.local_addr()?;
        let tcp = TcpListener::bind(addr).await?;

        let udp_queries = Arc::new(AtomicUsize::new(0));
        let tcp_queries = Arc::new(AtomicUsize::new(0));
        let (shutdown_tx, mut shutdown_rx) = oneshot::channel();

        let udp_count = Arc::clone(&udp_queries);
        let tcp_count = Arc::clone(&tcp_queries);
        tokio::spawn(async move {
            let mut buf = vec![0u8; 512];

            loop {
                tokio::select! {
                    _ = &mut shutdown_rx => break,
                    result = socket.recv_from(&mut buf) => {
                        if let Ok((len, peer)) = result {
                            udp_count.fetch_add(1, Ordering::SeqCst);
                            let response = match mode {
                                Mode::Answer => Self::build_mock_response(&buf[..len]),
                                Mode::Truncate => Self::build_truncated_response(&buf[..len]),
                                Mode::Silent => continue,
                            };
                            let _ = socket.send_to(&response, peer).await;
                        }
                    }
                    accepted = tcp.accept() => {
                        if let Ok((mut stream, _)) = accepted {
                            let tcp_count = Arc::clone(&tcp_count);
                            tokio::spawn(async move {
                                let mut len_buf = [0u8; 2];
                                if stream.read_exact(&mut len_buf).await.is_err() {
                                    return;
                                }
                                let mut query = vec![0u8; u16::from_be_bytes(len_buf) as usize];
                                if stream.read_exact(&mut query).await.is_err() {
                                    return;
                                }
                                tcp_count.fetch_add(1, Ordering::SeqCst);
                                if mode == Mode::Silent {
                                    return;
                                }
                                let response = Self::build_mock_response(&query);
                                let mut framed = (response.len() as u16).to_be_bytes().to_vec();
                                framed.extend_from_slice(&response);
                                let _ = stream.write_all(&framed).await;
                            });
                        }
                    }
                }
            }
        });

        Ok(Self {
            addr,
            udp_queries,
            tcp_queries,
            shutdown_tx: Some(shutdown_tx),
        })
    }

    pub fn addr(&self) -> SocketAddr {
        self.addr
    }

    pub fn udp_queries(&self) -> usize {
        self.udp_queries.load(Ordering::SeqCst)
    }

    pub fn tcp_queries(&self) -> usize {
        self.tcp_queries.load(Ordering::SeqCst)
    }

    /// Echoes the question and answers it with one A record, ttl 60.
    pub fn build_mock_response(query: &[u8]) -> Vec<u8> {
        if query.len() < 12 {
            return vec![];
        }

        let mut response = Vec::with_capacity(512);
        response.extend_from_slice(&query[0..2]);
        response.push(0x81);
        response.push(0x80);
        response.extend_from_slice(&query[4..6]);
        response.extend_from_slice(&[0x00, 0x01]);
        response.extend_from_slice(&[0x00, 0x00]);
        response.extend_from_slice(&[0x00, 0x00]);
        response.extend_from_slice(&query[12..]);

        response.extend_from_slice(&[
            0xc0, 0x0c,
            0x00, 0x01,
            0x00, 0x01,
            0x00, 0x00, 0x00, 0x3c,
            0x00, 0x04,
        ]);
        response.extend_from_slice(&MOCK_ANSWER.octets());

        response
    }

    fn build_truncated_response(query: &[u8]) -> Vec<u8> {
        if query.len() < 12 {
            return vec![];
        }

        let mut response = Vec::with_capacity(512);
        response.extend_from_slice(&query[0..2]);
        response.push(0x83);
        response.push(0x80);
        response.extend_from_slice(&query[4..6]);
        response.extend_from_slice(&[0x00, 0x00, 0x00, 0x00, 0x00, 0x00]);
        response.extend_from_slice(&query[12..]);
        response
    }

    pub fn shutdown(mut self) {
        if let Some(tx) = self.shutdown_tx.take() {
            let _ = tx.send(());
        }
    }
}

impl Drop for MockDnsServer {
    fn drop(&mut self) {
        if let Some(tx) = self.shutdown_tx.take() {
            let _ = tx.send(());
        }
    }
}
