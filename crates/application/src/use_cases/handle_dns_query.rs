use super::resolve_local::ResolveLocalUseCase;
use crate::ports::{HostStore, UpstreamResolver};
use hostrelay_domain::{DnsQuery, DomainError, LocalAnswer, RecordType, Resolution};
use std::sync::Arc;
use std::time::Instant;
use tracing::{debug, warn};

/// What the listener has to encode for one query.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum QueryOutcome {
    /// Answered entirely from the host table.
    Local(Vec<LocalAnswer>),

    /// Upstream's wire-format response to the unchanged client query.
    Forwarded(Vec<u8>),

    /// Local CNAMEs followed by upstream's wire-format response for the
    /// last alias target.
    Chained {
        answers: Vec<LocalAnswer>,
        upstream: Vec<u8>,
    },
}

pub struct HandleDnsQueryUseCase {
    local: ResolveLocalUseCase,
    upstream: Arc<dyn UpstreamResolver>,
}

impl HandleDnsQueryUseCase {
    pub fn new(store: Arc<dyn HostStore>, upstream: Arc<dyn UpstreamResolver>) -> Self {
        Self {
            local: ResolveLocalUseCase::new(store),
            upstream,
        }
    }

    /// Resolves `query`, forwarding `raw_request` when nothing local applies.
    ///
    /// Errors are scoped to this query: `ResolutionCycle` for looping alias
    /// chains, transport errors when no upstream answered a passthrough.
    pub async fn execute(
        &self,
        query: &DnsQuery,
        raw_request: &[u8],
    ) -> Result<QueryOutcome, DomainError> {
        let start = Instant::now();

        let outcome = match self.local.execute(query).await? {
            Resolution::Answered(answers) => QueryOutcome::Local(answers),
            Resolution::Passthrough => {
                debug!(domain = %query.domain, record_type = %query.record_type, "Passing query upstream");
                QueryOutcome::Forwarded(self.upstream.forward(raw_request).await?)
            }
            Resolution::AliasOut { answers, target } => {
                let tail = DnsQuery::new(&*target, RecordType::A);
                match self.upstream.resolve(&tail).await {
                    Ok(upstream) => QueryOutcome::Chained { answers, upstream },
                    Err(e) => {
                        warn!(
                            domain = %query.domain,
                            target = %target,
                            error = %e,
                            "Upstream lookup for alias target failed, answering with local chain only"
                        );
                        QueryOutcome::Local(answers)
                    }
                }
            }
        };

        debug!(
            domain = %query.domain,
            elapsed_us = start.elapsed().as_micros() as u64,
            "Query handled"
        );

        Ok(outcome)
    }
}
