//! Host table persisted as a flat JSON object (`{"foo.vm": "10.0.2.15"}`).
//!
//! The file is re-read on every call so that `hosts set` from another
//! process is visible to a running daemon without a restart.

use async_trait::async_trait;
use hostrelay_application::ports::HostStore;
use hostrelay_domain::dns_query::normalize_domain;
use hostrelay_domain::DomainError;
use std::collections::BTreeMap;
use std::net::IpAddr;
use std::path::{Path, PathBuf};
use tokio::fs;
use tracing::{debug, info};

type HostTable = BTreeMap<String, String>;

pub struct JsonHostStore {
    path: PathBuf,
}

impl JsonHostStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// All entries, sorted by key. A missing file is an empty table.
    pub async fn list(&self) -> Result<Vec<(String, String)>, DomainError> {
        Ok(self.load().await?.into_iter().collect())
    }

    /// Stores `key → value`. When `value` is an IP literal the reverse
    /// pointer name for it is stored as well, mapping back to `key`.
    pub async fn set(&self, key: &str, value: &str) -> Result<(), DomainError> {
        let key = normalize_key(key)?;
        let value = value.trim();
        if value.is_empty() {
            return Err(DomainError::StoreWrite(format!("empty value for {}", key)));
        }

        let mut table = self.load().await?;
        if let Ok(ip) = value.parse::<IpAddr>() {
            table.insert(reverse_name(&ip), key.clone());
        }
        table.insert(key.clone(), value.to_string());
        self.save(&table).await?;

        info!(key = %key, value = %value, "Host entry saved");
        Ok(())
    }

    /// Removes `key` and the reverse pointer that was created for it.
    /// Returns whether the key existed.
    pub async fn delete(&self, key: &str) -> Result<bool, DomainError> {
        let key = normalize_key(key)?;
        let mut table = self.load().await?;

        let Some(value) = table.remove(&key) else {
            return Ok(false);
        };
        if let Ok(ip) = value.parse::<IpAddr>() {
            let reverse = reverse_name(&ip);
            if table.get(&reverse) == Some(&key) {
                table.remove(&reverse);
            }
        }
        self.save(&table).await?;

        info!(key = %key, "Host entry removed");
        Ok(true)
    }

    async fn load(&self) -> Result<HostTable, DomainError> {
        let contents = match fs::read_to_string(&self.path).await {
            Ok(contents) => contents,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(HostTable::new()),
            Err(e) => {
                return Err(DomainError::StoreLookup(format!(
                    "failed to read {}: {}",
                    self.path.display(),
                    e
                )))
            }
        };

        if contents.trim().is_empty() {
            return Ok(HostTable::new());
        }

        serde_json::from_str(&contents).map_err(|e| {
            DomainError::StoreLookup(format!("invalid host table {}: {}", self.path.display(), e))
        })
    }

    /// Writes through a sibling temp file and a rename.
    async fn save(&self, table: &HostTable) -> Result<(), DomainError> {
        let write_err =
            |e: std::io::Error| DomainError::StoreWrite(format!("{}: {}", self.path.display(), e));

        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent).await.map_err(write_err)?;
        }

        let json = serde_json::to_string_pretty(table)
            .map_err(|e| DomainError::StoreWrite(e.to_string()))?;

        let tmp = self.path.with_extension("json.tmp");
        fs::write(&tmp, json).await.map_err(write_err)?;
        fs::rename(&tmp, &self.path).await.map_err(write_err)?;
        Ok(())
    }
}

#[async_trait]
impl HostStore for JsonHostStore {
    async fn find(&self, name: &str) -> Result<Option<String>, DomainError> {
        let table = self.load().await?;
        let found = find_key(&table, normalize_domain(name)).map(str::to_string);
        debug!(name = %name, key = ?found, "Host table lookup");
        Ok(found)
    }

    async fn get(&self, key: &str) -> Result<Option<String>, DomainError> {
        Ok(self.load().await?.remove(key))
    }
}

/// Matching precedence: exact name, then a key the name ends in
/// (`app.foo.vm` → `foo.vm`), then a key the name is the first label of
/// (`foo` → `foo.vm`). Comparisons ignore case.
fn find_key<'a>(table: &'a HostTable, name: &str) -> Option<&'a str> {
    let name = name.to_ascii_lowercase();
    if name.is_empty() {
        return None;
    }

    let keys = || table.keys().map(String::as_str);

    keys()
        .find(|key| key.eq_ignore_ascii_case(&name))
        .or_else(|| {
            keys().find(|key| {
                let key = key.to_ascii_lowercase();
                name.strip_suffix(&key)
                    .is_some_and(|prefix| prefix.ends_with('.'))
            })
        })
        .or_else(|| {
            keys().find(|key| {
                key.to_ascii_lowercase()
                    .strip_prefix(&name)
                    .is_some_and(|rest| rest.starts_with('.'))
            })
        })
}

fn normalize_key(key: &str) -> Result<String, DomainError> {
    let key = normalize_domain(key);
    if key.is_empty() || key == "." {
        return Err(DomainError::InvalidDomainName(format!("invalid host key '{}'", key)));
    }
    Ok(key.to_ascii_lowercase())
}

/// The in-addr.arpa / ip6.arpa name for `ip`.
pub fn reverse_name(ip: &IpAddr) -> String {
    match ip {
        IpAddr::V4(ipv4) => {
            let octets = ipv4.octets();
            format!(
                "{}.{}.{}.{}.in-addr.arpa",
                octets[3], octets[2], octets[1], octets[0]
            )
        }
        IpAddr::V6(ipv6) => {
            let mut nibbles = Vec::with_capacity(32);
            for byte in ipv6.octets().iter().rev() {
                nibbles.push(format!("{:x}", byte & 0x0f));
                nibbles.push(format!("{:x}", (byte >> 4) & 0x0f));
            }
            format!("{}.ip6.arpa", nibbles.join("."))
        }
    }
}
