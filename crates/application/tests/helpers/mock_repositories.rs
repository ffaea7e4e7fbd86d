#![allow(dead_code)]

use async_trait::async_trait;
use hostrelay_application::ports::{HostStore, UpstreamResolver};
use hostrelay_domain::{DnsQuery, DomainError};
use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, RwLock};

/// In-memory host table. `find` matches keys exactly (ignoring case) or as a
/// dotted suffix of the queried name.
#[derive(Clone, Default)]
pub struct MockHostStore {
    hosts: Arc<RwLock<Vec<(String, String)>>>,
    fail_find: Arc<RwLock<bool>>,
    fail_get: Arc<RwLock<bool>>,
    find_calls: Arc<AtomicUsize>,
}

impl MockHostStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_hosts(hosts: &[(&str, &str)]) -> Self {
        let store = Self::new();
        for (key, value) in hosts {
            store.set(key, value);
        }
        store
    }

    pub fn set(&self, key: &str, value: &str) {
        let mut hosts = self.hosts.write().unwrap();
        hosts.retain(|(k, _)| k != key);
        hosts.push((key.to_string(), value.to_string()));
    }

    pub fn set_fail_find(&self, fail: bool) {
        *self.fail_find.write().unwrap() = fail;
    }

    pub fn set_fail_get(&self, fail: bool) {
        *self.fail_get.write().unwrap() = fail;
    }

    pub fn find_calls(&self) -> usize {
        self.find_calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl HostStore for MockHostStore {
    async fn find(&self, name: &str) -> Result<Option<String>, DomainError> {
        self.find_calls.fetch_add(1, Ordering::SeqCst);
        if *self.fail_find.read().unwrap() {
            return Err(DomainError::StoreLookup("mock find failure".into()));
        }

        let name = name.to_ascii_lowercase();
        let hosts = self.hosts.read().unwrap();
        let found = hosts
            .iter()
            .find(|(k, _)| k.eq_ignore_ascii_case(&name))
            .or_else(|| {
                hosts
                    .iter()
                    .find(|(k, _)| name.ends_with(&format!(".{}", k.to_ascii_lowercase())))
            })
            .map(|(k, _)| k.clone());
        Ok(found)
    }

    async fn get(&self, key: &str) -> Result<Option<String>, DomainError> {
        if *self.fail_get.read().unwrap() {
            return Err(DomainError::StoreLookup("mock get failure".into()));
        }

        Ok(self
            .hosts
            .read()
            .unwrap()
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.clone()))
    }
}

/// Upstream stub: echoes canned bytes and records what it was asked.
#[derive(Clone, Default)]
pub struct MockUpstreamResolver {
    forward_response: Arc<RwLock<Option<Vec<u8>>>>,
    resolve_responses: Arc<RwLock<HashMap<String, Vec<u8>>>>,
    forwarded: Arc<RwLock<Vec<Vec<u8>>>>,
    resolved: Arc<RwLock<Vec<DnsQuery>>>,
}

impl MockUpstreamResolver {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set_forward_response(&self, bytes: &[u8]) {
        *self.forward_response.write().unwrap() = Some(bytes.to_vec());
    }

    pub fn set_resolve_response(&self, domain: &str, bytes: &[u8]) {
        self.resolve_responses
            .write()
            .unwrap()
            .insert(domain.to_string(), bytes.to_vec());
    }

    pub fn forwarded(&self) -> Vec<Vec<u8>> {
        self.forwarded.read().unwrap().clone()
    }

    pub fn resolved(&self) -> Vec<DnsQuery> {
        self.resolved.read().unwrap().clone()
    }
}

#[async_trait]
impl UpstreamResolver for MockUpstreamResolver {
    async fn forward(&self, request: &[u8]) -> Result<Vec<u8>, DomainError> {
        self.forwarded.write().unwrap().push(request.to_vec());
        self.forward_response
            .read()
            .unwrap()
            .clone()
            .ok_or(DomainError::TransportAllServersUnreachable)
    }

    async fn resolve(&self, query: &DnsQuery) -> Result<Vec<u8>, DomainError> {
        self.resolved.write().unwrap().push(query.clone());
        self.resolve_responses
            .read()
            .unwrap()
            .get(&*query.domain)
            .cloned()
            .ok_or(DomainError::TransportAllServersUnreachable)
    }
}
