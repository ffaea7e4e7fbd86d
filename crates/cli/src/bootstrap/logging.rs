use hostrelay_domain::Config;
use tracing_subscriber::EnvFilter;

/// `RUST_LOG` wins over `logging.level`. Output goes to stderr, which the
/// supervisor points at the daemon log.
pub fn init_logging(config: &Config) {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new(&config.logging.level)),
        )
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}
