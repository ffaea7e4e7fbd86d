//! Outcome of matching one query against the local host table.

use std::net::IpAddr;
use std::sync::Arc;

/// Locally synthesized answers never get cached by clients.
pub const LOCAL_TTL: u32 = 0;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LocalAnswer {
    Address {
        name: Arc<str>,
        address: IpAddr,
        ttl: u32,
    },
    Alias {
        name: Arc<str>,
        target: Arc<str>,
        ttl: u32,
    },
    Pointer {
        name: Arc<str>,
        target: Arc<str>,
        ttl: u32,
    },
}

impl LocalAnswer {
    pub fn address(name: impl Into<Arc<str>>, address: IpAddr) -> Self {
        Self::Address {
            name: name.into(),
            address,
            ttl: LOCAL_TTL,
        }
    }

    pub fn alias(name: impl Into<Arc<str>>, target: impl Into<Arc<str>>) -> Self {
        Self::Alias {
            name: name.into(),
            target: target.into(),
            ttl: LOCAL_TTL,
        }
    }

    pub fn pointer(name: impl Into<Arc<str>>, target: impl Into<Arc<str>>) -> Self {
        Self::Pointer {
            name: name.into(),
            target: target.into(),
            ttl: LOCAL_TTL,
        }
    }

    pub fn name(&self) -> &str {
        match self {
            Self::Address { name, .. } | Self::Alias { name, .. } | Self::Pointer { name, .. } => {
                &**name
            }
        }
    }

    pub fn ttl(&self) -> u32 {
        match self {
            Self::Address { ttl, .. } | Self::Alias { ttl, .. } | Self::Pointer { ttl, .. } => {
                *ttl
            }
        }
    }

    pub fn is_alias(&self) -> bool {
        matches!(self, Self::Alias { .. })
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Resolution {
    /// The host table fully answered the query.
    Answered(Vec<LocalAnswer>),

    /// A local alias chain ended on a name the host table does not know;
    /// `target` has to be resolved upstream and appended after `answers`.
    AliasOut {
        answers: Vec<LocalAnswer>,
        target: Arc<str>,
    },

    /// No local record: forward the original query unchanged.
    Passthrough,
}

impl Resolution {
    pub fn is_passthrough(&self) -> bool {
        matches!(self, Self::Passthrough)
    }

    pub fn answers(&self) -> &[LocalAnswer] {
        match self {
            Self::Answered(answers) | Self::AliasOut { answers, .. } => answers,
            Self::Passthrough => &[],
        }
    }

    pub fn alias_hops(&self) -> usize {
        self.answers().iter().filter(|a| a.is_alias()).count()
    }
}
