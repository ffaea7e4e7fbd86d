//! UDP and TCP front end. Every datagram and every accepted connection is
//! served by its own task; replies leave over the transport the query
//! arrived on.

use crate::dns::server::DnsServerHandler;
use crate::dns::transport::tcp::{read_with_length_prefix, send_with_length_prefix};
use hostrelay_domain::DomainError;
use socket2::{Domain, Protocol, Socket, Type};
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;
use tokio::net::{TcpListener, TcpStream, UdpSocket};
use tokio::task::JoinSet;
use tracing::{debug, info, warn};

const MAX_UDP_QUERY_SIZE: usize = 4096;

pub struct DnsListener {
    udp: Arc<UdpSocket>,
    tcp: TcpListener,
    handler: Arc<DnsServerHandler>,
    tcp_idle_timeout: Duration,
}

impl DnsListener {
    /// Binds UDP and TCP on the same address. With port 0 the TCP listener
    /// takes whatever port the UDP socket was given.
    pub async fn bind(
        addr: SocketAddr,
        handler: Arc<DnsServerHandler>,
        tcp_idle_timeout: Duration,
    ) -> Result<Self, DomainError> {
        let udp = create_udp_socket(addr).map_err(|e| bind_error(addr, e))?;
        let bound = udp.local_addr().map_err(|e| bind_error(addr, e))?;
        let tcp = create_tcp_listener(bound).map_err(|e| bind_error(bound, e))?;

        info!(bind_address = %bound, "DNS listener bound (UDP+TCP)");

        Ok(Self {
            udp: Arc::new(udp),
            tcp,
            handler,
            tcp_idle_timeout,
        })
    }

    pub fn local_addr(&self) -> Result<SocketAddr, DomainError> {
        self.udp
            .local_addr()
            .map_err(|e| DomainError::TransportIo {
                server: "listener".into(),
                reason: e.to_string(),
            })
    }

    /// Serves until both loops end, which only happens on runtime shutdown.
    pub async fn run(self) {
        let mut join_set: JoinSet<()> = JoinSet::new();

        join_set.spawn(serve_udp(Arc::clone(&self.udp), Arc::clone(&self.handler)));
        join_set.spawn(serve_tcp(self.tcp, self.handler, self.tcp_idle_timeout));

        while join_set.join_next().await.is_some() {}
    }
}

async fn serve_udp(socket: Arc<UdpSocket>, handler: Arc<DnsServerHandler>) {
    let mut recv_buf = [0u8; MAX_UDP_QUERY_SIZE];

    loop {
        let (len, peer) = match socket.recv_from(&mut recv_buf).await {
            Ok(received) => received,
            Err(e) => {
                warn!(error = %e, "UDP recv error");
                continue;
            }
        };

        let request = recv_buf[..len].to_vec();
        let handler = Arc::clone(&handler);
        let socket = Arc::clone(&socket);

        tokio::spawn(async move {
            if let Some(response) = handler.handle_raw(&request).await {
                if let Err(e) = socket.send_to(&response, peer).await {
                    debug!(client = %peer, error = %e, "Failed to send UDP reply");
                }
            }
        });
    }
}

async fn serve_tcp(listener: TcpListener, handler: Arc<DnsServerHandler>, idle_timeout: Duration) {
    loop {
        match listener.accept().await {
            Ok((stream, peer)) => {
                let handler = Arc::clone(&handler);
                tokio::spawn(async move {
                    serve_connection(stream, peer, handler, idle_timeout).await;
                });
            }
            Err(e) => warn!(error = %e, "TCP accept error"),
        }
    }
}

/// Answers length-prefixed queries until the peer closes or stays idle
/// past `idle_timeout`.
async fn serve_connection(
    mut stream: TcpStream,
    peer: SocketAddr,
    handler: Arc<DnsServerHandler>,
    idle_timeout: Duration,
) {
    loop {
        let request = match tokio::time::timeout(idle_timeout, read_with_length_prefix(&mut stream)).await {
            Ok(Ok(request)) => request,
            Ok(Err(e)) => {
                debug!(client = %peer, error = %e, "TCP connection closed");
                return;
            }
            Err(_) => {
                debug!(client = %peer, "TCP connection idle, closing");
                return;
            }
        };

        let Some(response) = handler.handle_raw(&request).await else {
            continue;
        };

        if let Err(e) = send_with_length_prefix(&mut stream, &response).await {
            debug!(client = %peer, error = %e, "Failed to send TCP reply");
            return;
        }
    }
}

fn socket_domain(addr: SocketAddr) -> Domain {
    if addr.is_ipv4() {
        Domain::IPV4
    } else {
        Domain::IPV6
    }
}

fn create_udp_socket(addr: SocketAddr) -> std::io::Result<UdpSocket> {
    let socket = Socket::new(socket_domain(addr), Type::DGRAM, Some(Protocol::UDP))?;
    if addr.is_ipv6() {
        socket.set_only_v6(false)?;
    }
    socket.set_reuse_address(true)?;
    socket.bind(&addr.into())?;
    socket.set_nonblocking(true)?;
    let std_socket: std::net::UdpSocket = socket.into();
    UdpSocket::from_std(std_socket)
}

fn create_tcp_listener(addr: SocketAddr) -> std::io::Result<TcpListener> {
    let socket = Socket::new(socket_domain(addr), Type::STREAM, Some(Protocol::TCP))?;
    if addr.is_ipv6() {
        socket.set_only_v6(false)?;
    }
    socket.set_reuse_address(true)?;
    socket.bind(&addr.into())?;
    socket.listen(1024)?;
    socket.set_nonblocking(true)?;
    let std_listener: std::net::TcpListener = socket.into();
    TcpListener::from_std(std_listener)
}

fn bind_error(addr: SocketAddr, e: std::io::Error) -> DomainError {
    DomainError::TransportIo {
        server: addr.to_string(),
        reason: format!("failed to bind listener: {}", e),
    }
}
