use hostrelay_domain::{CliOverrides, Config};
use std::path::Path;
use tracing::debug;

pub fn load_config(
    working_dir: &Path,
    config_path: Option<&Path>,
    cli_overrides: CliOverrides,
) -> anyhow::Result<Config> {
    let config = Config::load(working_dir, config_path, cli_overrides)?;
    debug!(
        working_dir = %config.daemon.working_dir().display(),
        port = config.server.port,
        upstreams = config.dns.upstream.len(),
        "Configuration loaded"
    );
    Ok(config)
}
