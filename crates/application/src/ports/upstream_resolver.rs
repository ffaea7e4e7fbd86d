use async_trait::async_trait;
use hostrelay_domain::{DnsQuery, DomainError};

#[async_trait]
pub trait UpstreamResolver: Send + Sync {
    /// Sends a client's wire-format query upstream unchanged and returns the
    /// first upstream's wire-format response.
    async fn forward(&self, request: &[u8]) -> Result<Vec<u8>, DomainError>;

    /// Builds a fresh query for `query` and returns the raw upstream response.
    async fn resolve(&self, query: &DnsQuery) -> Result<Vec<u8>, DomainError>;
}
