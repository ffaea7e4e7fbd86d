use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

#[derive(Debug, Clone, Copy, Deserialize, Serialize, PartialEq, Eq, Hash, Default)]
#[serde(rename_all = "lowercase")]
pub enum UpstreamProtocol {
    #[default]
    Udp,

    Tcp,
}

impl UpstreamProtocol {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Udp => "udp",
            Self::Tcp => "tcp",
        }
    }
}

/// One upstream resolver, tried in configuration order.
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq, Eq, Hash)]
pub struct UpstreamTarget {
    #[serde(default)]
    pub protocol: UpstreamProtocol,

    pub host: String,

    #[serde(default = "default_port")]
    pub port: u16,
}

impl UpstreamTarget {
    pub fn new(protocol: UpstreamProtocol, host: impl Into<String>, port: u16) -> Self {
        Self {
            protocol,
            host: host.into(),
            port,
        }
    }

    pub fn udp(host: impl Into<String>, port: u16) -> Self {
        Self::new(UpstreamProtocol::Udp, host, port)
    }

    pub fn tcp(host: impl Into<String>, port: u16) -> Self {
        Self::new(UpstreamProtocol::Tcp, host, port)
    }

    /// `host:port`, bracketing IPv6 literals.
    pub fn endpoint(&self) -> String {
        if self.host.contains(':') && !self.host.starts_with('[') {
            format!("[{}]:{}", self.host, self.port)
        } else {
            format!("{}:{}", self.host, self.port)
        }
    }
}

impl fmt::Display for UpstreamTarget {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}://{}", self.protocol.as_str(), self.endpoint())
    }
}

/// Parses `udp://8.8.8.8:53`, `tcp://dns.example:5353` or a bare `1.1.1.1`
/// (UDP, port 53).
impl FromStr for UpstreamTarget {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        let (protocol, rest) = if let Some(rest) = s.strip_prefix("udp://") {
            (UpstreamProtocol::Udp, rest)
        } else if let Some(rest) = s.strip_prefix("tcp://") {
            (UpstreamProtocol::Tcp, rest)
        } else if s.contains("://") {
            return Err(format!("Unsupported upstream scheme: {}", s));
        } else {
            (UpstreamProtocol::Udp, s)
        };

        if rest.is_empty() {
            return Err(format!("Missing upstream host: {}", s));
        }

        let (host, port) = if let Some(bracketed) = rest.strip_prefix('[') {
            let (host, tail) = bracketed
                .split_once(']')
                .ok_or_else(|| format!("Unterminated IPv6 literal: {}", s))?;
            let port = match tail.strip_prefix(':') {
                Some(p) => p.parse().map_err(|_| format!("Invalid port in {}", s))?,
                None => default_port(),
            };
            (host.to_string(), port)
        } else if rest.matches(':').count() == 1 {
            let (host, port) = rest.split_once(':').unwrap_or((rest, ""));
            let port = port.parse().map_err(|_| format!("Invalid port in {}", s))?;
            (host.to_string(), port)
        } else {
            (rest.to_string(), default_port())
        };

        Ok(Self::new(protocol, host, port))
    }
}

fn default_port() -> u16 {
    53
}
