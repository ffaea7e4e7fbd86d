pub mod failover;
pub mod pool;
pub mod query;

pub use failover::FailoverStrategy;
pub use pool::{UpstreamPool, UpstreamServer};
pub use query::QueryAttemptResult;
