use async_trait::async_trait;
use hostrelay_domain::DomainError;

/// Key-value table of local hostnames.
///
/// Values are either an address literal or another hostname (an alias);
/// nothing in the store tags which one it is.
#[async_trait]
pub trait HostStore: Send + Sync {
    /// Returns the key that answers for `name`, if any. Implementations may
    /// match more than exact keys (wildcard subdomains, short names).
    async fn find(&self, name: &str) -> Result<Option<String>, DomainError>;

    async fn get(&self, key: &str) -> Result<Option<String>, DomainError>;
}
