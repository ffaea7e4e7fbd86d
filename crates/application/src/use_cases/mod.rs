pub mod handle_dns_query;
pub mod resolve_local;

pub use handle_dns_query::{HandleDnsQueryUseCase, QueryOutcome};
pub use resolve_local::{ResolveLocalUseCase, Transaction};
