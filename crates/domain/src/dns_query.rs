use super::RecordType;
use std::sync::Arc;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DnsQuery {
    pub domain: Arc<str>,
    pub record_type: RecordType,
}

impl DnsQuery {
    /// Builds a query, dropping the trailing root label dot so names compare
    /// the same way the host table stores them.
    pub fn new(domain: impl AsRef<str>, record_type: RecordType) -> Self {
        Self {
            domain: Arc::from(normalize_domain(domain.as_ref())),
            record_type,
        }
    }
}

pub fn normalize_domain(domain: &str) -> &str {
    let trimmed = domain.trim();
    if trimmed == "." {
        trimmed
    } else {
        trimmed.trim_end_matches('.')
    }
}
