//! Local host-table resolution: direct addresses, alias chains and reverse
//! pointers. Anything the table cannot answer becomes a passthrough.

use crate::ports::HostStore;
use hostrelay_domain::dns_query::normalize_domain;
use hostrelay_domain::{DnsQuery, DomainError, LocalAnswer, RecordType, Resolution};
use std::collections::HashSet;
use std::net::IpAddr;
use std::sync::Arc;
use tracing::{debug, warn};

/// Per-query context: the question, the answers gathered so far and the
/// host-table keys already followed.
#[derive(Debug)]
pub struct Transaction {
    query: DnsQuery,
    answers: Vec<LocalAnswer>,
    visited: HashSet<String>,
}

impl Transaction {
    pub fn new(query: DnsQuery) -> Self {
        Self {
            query,
            answers: Vec::new(),
            visited: HashSet::new(),
        }
    }

    pub fn query(&self) -> &DnsQuery {
        &self.query
    }

    pub fn answers(&self) -> &[LocalAnswer] {
        &self.answers
    }

    /// Records that `key` is being followed; a key seen twice means the alias
    /// chain loops.
    pub fn visit(&mut self, key: &str) -> Result<(), DomainError> {
        if self.visited.insert(key.to_ascii_lowercase()) {
            Ok(())
        } else {
            Err(DomainError::ResolutionCycle {
                name: key.to_string(),
            })
        }
    }

    pub fn respond(&mut self, answer: LocalAnswer) {
        self.answers.push(answer);
    }

    pub fn finish(self) -> Resolution {
        if self.answers.is_empty() {
            Resolution::Passthrough
        } else {
            Resolution::Answered(self.answers)
        }
    }

    /// Ends the transaction on a name the host table does not know.
    pub fn leave_table(self, target: Arc<str>) -> Resolution {
        if self.answers.is_empty() {
            Resolution::Passthrough
        } else {
            Resolution::AliasOut {
                answers: self.answers,
                target,
            }
        }
    }
}

pub struct ResolveLocalUseCase {
    store: Arc<dyn HostStore>,
}

impl ResolveLocalUseCase {
    pub fn new(store: Arc<dyn HostStore>) -> Self {
        Self { store }
    }

    pub async fn execute(&self, query: &DnsQuery) -> Result<Resolution, DomainError> {
        match query.record_type {
            RecordType::A => self.resolve_address(query).await,
            RecordType::PTR => self.resolve_pointer(query).await,
            _ => Ok(Resolution::Passthrough),
        }
    }

    async fn resolve_address(&self, query: &DnsQuery) -> Result<Resolution, DomainError> {
        let mut transaction = Transaction::new(query.clone());
        let mut current = Arc::clone(&query.domain);

        loop {
            let Some((key, value)) = self.lookup(&current).await else {
                return Ok(transaction.leave_table(current));
            };

            transaction.visit(&key)?;

            match value.parse::<IpAddr>() {
                Ok(address) => {
                    let name = answer_name(&current, &key);
                    debug!(domain = %query.domain, name = %name, address = %address, "Local address record");
                    transaction.respond(LocalAnswer::address(name, address));
                    return Ok(transaction.finish());
                }
                Err(_) => {
                    let target: Arc<str> = Arc::from(normalize_domain(&value));
                    debug!(from = %current, to = %target, "Following local alias");
                    transaction.respond(LocalAnswer::alias(Arc::clone(&current), Arc::clone(&target)));
                    current = target;
                }
            }
        }
    }

    async fn resolve_pointer(&self, query: &DnsQuery) -> Result<Resolution, DomainError> {
        match self.lookup(&query.domain).await {
            Some((_, value)) => {
                debug!(domain = %query.domain, target = %value, "Local pointer record");
                Ok(Resolution::Answered(vec![LocalAnswer::pointer(
                    Arc::clone(&query.domain),
                    normalize_domain(&value),
                )]))
            }
            None => Ok(Resolution::Passthrough),
        }
    }

    /// `find` then `get`. Store failures read as "no local record" so the
    /// query still gets an upstream answer.
    async fn lookup(&self, name: &str) -> Option<(String, String)> {
        let key = match self.store.find(name).await {
            Ok(Some(key)) => key,
            Ok(None) => return None,
            Err(e) => {
                warn!(domain = %name, error = %e, "Host store find failed, passing through");
                return None;
            }
        };

        match self.store.get(&key).await {
            Ok(Some(value)) if !value.trim().is_empty() => Some((key, value.trim().to_string())),
            Ok(_) => {
                debug!(key = %key, "Host store key has no value");
                None
            }
            Err(e) => {
                warn!(key = %key, error = %e, "Host store get failed, passing through");
                None
            }
        }
    }
}

/// The address record keeps the name being resolved when it contains the
/// matched key (wildcard hits such as `app.foo.vm` for key `foo.vm`);
/// otherwise it is named after the key itself.
fn answer_name(current: &Arc<str>, key: &str) -> Arc<str> {
    if current
        .to_ascii_lowercase()
        .contains(&key.to_ascii_lowercase())
    {
        Arc::clone(current)
    } else {
        Arc::from(key)
    }
}
