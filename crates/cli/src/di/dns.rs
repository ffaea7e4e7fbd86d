use hostrelay_application::use_cases::HandleDnsQueryUseCase;
use hostrelay_domain::Config;
use hostrelay_infrastructure::dns::{DnsServerHandler, UpstreamPool};
use hostrelay_infrastructure::store::JsonHostStore;
use std::sync::Arc;
use std::time::Duration;
use tracing::info;

pub struct DnsServices {
    pub handler: Arc<DnsServerHandler>,
}

impl DnsServices {
    pub async fn new(config: &Config) -> anyhow::Result<Self> {
        let store = Arc::new(JsonHostStore::new(config.daemon.hosts_file()));
        info!(hosts = %store.path().display(), "Using host table");

        let pool = UpstreamPool::new(
            &config.dns.upstream,
            Duration::from_millis(config.dns.query_timeout_ms),
        )
        .await?;

        let use_case = Arc::new(HandleDnsQueryUseCase::new(store, Arc::new(pool)));
        let handler = Arc::new(DnsServerHandler::new(use_case));

        Ok(Self { handler })
    }
}
