use super::upstream::UpstreamTarget;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct DnsConfig {
    #[serde(default = "default_upstream")]
    pub upstream: Vec<UpstreamTarget>,

    /// Per-attempt upstream timeout.
    #[serde(default = "default_query_timeout_ms")]
    pub query_timeout_ms: u64,

    /// Idle timeout for client TCP connections on the listener.
    #[serde(default = "default_tcp_idle_timeout_ms")]
    pub tcp_idle_timeout_ms: u64,
}

impl Default for DnsConfig {
    fn default() -> Self {
        Self {
            upstream: default_upstream(),
            query_timeout_ms: default_query_timeout_ms(),
            tcp_idle_timeout_ms: default_tcp_idle_timeout_ms(),
        }
    }
}

fn default_upstream() -> Vec<UpstreamTarget> {
    vec![
        UpstreamTarget::udp("8.8.8.8", 53),
        UpstreamTarget::tcp("8.8.8.8", 53),
    ]
}

fn default_query_timeout_ms() -> u64 {
    2000
}

fn default_tcp_idle_timeout_ms() -> u64 {
    10_000
}
