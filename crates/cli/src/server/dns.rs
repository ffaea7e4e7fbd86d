use hostrelay_domain::Config;
use hostrelay_infrastructure::dns::{DnsListener, DnsServerHandler};
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;
use tokio::signal::unix::{signal, SignalKind};
use tracing::info;

/// Serves DNS until INT or TERM arrives.
pub async fn start_dns_server(config: &Config, handler: Arc<DnsServerHandler>) -> anyhow::Result<()> {
    let listen_addr = config.server.listen_addr();
    let socket_addr: SocketAddr = listen_addr
        .parse()
        .map_err(|e| anyhow::anyhow!("Invalid bind address {}: {}", listen_addr, e))?;

    let listener = DnsListener::bind(
        socket_addr,
        handler,
        Duration::from_millis(config.dns.tcp_idle_timeout_ms),
    )
    .await?;

    let mut interrupt = signal(SignalKind::interrupt())?;
    let mut terminate = signal(SignalKind::terminate())?;

    info!(bind_address = %listener.local_addr()?, "DNS server ready");

    tokio::select! {
        _ = listener.run() => {}
        _ = interrupt.recv() => info!(signal = "INT", "Shutting down"),
        _ = terminate.recv() => info!(signal = "TERM", "Shutting down"),
    }

    Ok(())
}
