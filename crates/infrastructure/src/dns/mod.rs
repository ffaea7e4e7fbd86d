pub mod forwarding;
pub mod listener;
pub mod load_balancer;
pub mod server;
pub mod transport;

pub use listener::DnsListener;
pub use load_balancer::{FailoverStrategy, UpstreamPool, UpstreamServer};
pub use server::DnsServerHandler;
